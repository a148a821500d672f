//! Well keywords: WELSPECS, COMPDAT, COMPORD, WPIMULT and WELPI

use crate::connection::{peaceman_r0, Connection, CtfKind, CtfProperties, Direction, Order, State};
use crate::context::HandlerContext;
use crate::deck::DeckRecord;
use crate::error::{HandlerError, InputError};
use crate::events::ScheduleEvents;
use crate::handlers::{explicit_int, explicit_si};
use crate::properties::GroupTree;
use crate::traits::{HandlerFn, KeywordDomain};
use crate::well::Well;

/// Domain dispatcher for well definition and completion keywords
#[derive(Debug, Clone, Copy, Default)]
pub struct WellDomain;

impl KeywordDomain for WellDomain {
    fn name(&self) -> &'static str {
        "well"
    }

    fn handler(&self, keyword: &str) -> Option<HandlerFn> {
        match keyword {
            "WELSPECS" => Some(handle_welspecs),
            "COMPDAT" => Some(handle_compdat),
            "COMPORD" => Some(handle_compord),
            "WPIMULT" => Some(handle_wpimult),
            "WELPI" => Some(handle_welpi),
            _ => None,
        }
    }
}

/// Match a well name against a pattern where `*` stands for any text
pub fn name_matches(pattern: &str, name: &str) -> bool {
    match pattern.split_once('*') {
        None => pattern == name,
        Some((head, rest)) => {
            let Some(tail) = name.strip_prefix(head) else {
                return false;
            };
            if rest.is_empty() {
                return true;
            }
            (0..=tail.len())
                .filter(|start| tail.is_char_boundary(*start))
                .any(|start| name_matches(rest, &tail[start..]))
        }
    }
}

/// Names of the wells selected by `pattern`
///
/// A plain name must refer to an existing well.
pub(crate) fn matching_wells(ctx: &mut HandlerContext<'_>, pattern: &str) -> Result<Vec<String>, InputError> {
    let names: Vec<String> = ctx
        .state()
        .well_names()
        .into_iter()
        .filter(|name| name_matches(pattern, name))
        .collect();
    if names.is_empty() && !pattern.contains('*') {
        return Err(InputError::new(
            format!("Well {} is not defined by WELSPECS", pattern),
            ctx.location().clone(),
        ));
    }
    Ok(names)
}

/// One based grid index from a record, converted to zero based
fn grid_index(record: &DeckRecord, name: &str, ctx: &HandlerContext<'_>) -> Result<Option<usize>, HandlerError> {
    match explicit_int(record, name)? {
        None => Ok(None),
        Some(value) if value >= 1 => Ok(Some(value as usize - 1)),
        Some(value) => Err(InputError::new(
            format!("Item {} must be a positive grid index, got {}", name, value),
            ctx.location().clone(),
        )
        .into()),
    }
}

fn optional_string(record: &DeckRecord, name: &str) -> Result<Option<String>, HandlerError> {
    if !record.has_item(name) {
        return Ok(None);
    }
    let item = record.item(name)?;
    if !item.has_value(0) {
        return Ok(None);
    }
    Ok(Some(item.get_string(0)?))
}

fn handle_welspecs(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let name = record.item("WELL")?.get_string(0)?;
        let group = record.item("GROUP")?.get_string(0)?;
        let head_i = grid_index(record, "HEAD_I", ctx)?;
        let head_j = grid_index(record, "HEAD_J", ctx)?;
        let (Some(head_i), Some(head_j)) = (head_i, head_j) else {
            return Err(InputError::new(
                format!("Well {} needs an explicit well head location", name),
                ctx.location().clone(),
            )
            .into());
        };
        let ref_depth = explicit_si(record, "REF_DEPTH")?;
        let phase = optional_string(record, "PHASE")?.unwrap_or_default();

        if !ctx.state().group_tree().has_group(&group) {
            let state = ctx.state();
            state.group_tree_mut().set_parent(&group, GroupTree::FIELD);
            state.add_event(ScheduleEvents::NewGroup);
        }

        if ctx.state().has_well(&name) {
            let changed = ctx
                .state()
                .well_mut(&name)
                .map(|well| well.update_welspecs(&group, head_i, head_j, ref_depth, &phase))
                .unwrap_or(false);
            if changed {
                ctx.state().add_event(ScheduleEvents::WellWelspecsUpdate);
                ctx.affected_well(&name);
            }
        } else {
            let insert_index = ctx.state().well_names().len();
            let well = Well::new(name.as_str(), group.as_str(), head_i, head_j, ref_depth, phase, insert_index);
            let state = ctx.state();
            state.insert_well(well);
            state.add_event(ScheduleEvents::NewWell);
            ctx.well_structure_changed();
            ctx.affected_well(&name);
        }
    }
    Ok(())
}

/// Transmissibility parameters of one COMPDAT connection
///
/// An explicit connection factor is used as given; otherwise it follows
/// from the Peaceman formula with the cell geometry and permeability.
fn connection_factor(
    record: &DeckRecord,
    ctx: &HandlerContext<'_>,
    ijk: [usize; 3],
    direction: Direction,
) -> Result<(CtfProperties, CtfKind), HandlerError> {
    let [i, j, k] = ijk;
    let size = ctx.grid.cell_size(i, j, k)?;
    let perm = ctx.grid.permeability(i, j, k)?;
    let skin_factor = explicit_si(record, "SKIN")?.unwrap_or(0.0);
    let d_factor = explicit_si(record, "D_FACTOR")?.unwrap_or(0.0);
    let diameter = explicit_si(record, "DIAMETER")?;

    let (length, k1, k2) = match direction {
        Direction::X => (size[0], perm[1], perm[2]),
        Direction::Y => (size[1], perm[0], perm[2]),
        Direction::Z => (size[2], perm[0], perm[1]),
    };
    let kh = explicit_si(record, "Kh")?
        .filter(|kh| *kh > 0.0)
        .unwrap_or_else(|| (k1 * k2).sqrt() * length);
    let r0 = peaceman_r0(direction, size, perm);

    let mut ctf = CtfProperties {
        CF: 0.0,
        Kh: kh,
        rw: diameter.map(|d| d / 2.0).unwrap_or(0.0),
        r0,
        re: r0,
        connection_length: length,
        skin_factor,
        d_factor,
        Ke: (k1 * k2).sqrt(),
    };

    match explicit_si(record, "CONNECTION_TRANSMISSIBILITY_FACTOR")?.filter(|cf| *cf > 0.0) {
        Some(cf) => {
            ctf.CF = cf;
            Ok((ctf, CtfKind::DeckValue))
        }
        None => {
            if diameter.is_none() {
                return Err(InputError::new(
                    "A defaulted connection factor requires the well bore diameter",
                    ctx.location().clone(),
                )
                .into());
            }
            ctf.CF = ctf.peaceman_cf();
            Ok((ctf, CtfKind::Defaulted))
        }
    }
}

fn handle_compdat(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let name = record.item("WELL")?.get_string(0)?;
        let (head_i, head_j) = match ctx.state().well(&name) {
            Some(well) => well.head(),
            None => {
                return Err(InputError::new(
                    format!("Well {} is not defined by WELSPECS", name),
                    ctx.location().clone(),
                )
                .into())
            }
        };

        let i = grid_index(record, "I", ctx)?.unwrap_or(head_i);
        let j = grid_index(record, "J", ctx)?.unwrap_or(head_j);
        let (Some(k1), Some(k2)) = (grid_index(record, "K1", ctx)?, grid_index(record, "K2", ctx)?) else {
            return Err(InputError::new(
                format!("COMPDAT for well {} needs explicit K1 and K2", name),
                ctx.location().clone(),
            )
            .into());
        };
        if k2 < k1 {
            return Err(InputError::new(
                format!("COMPDAT for well {} has K2 = {} above K1 = {}", name, k2 + 1, k1 + 1),
                ctx.location().clone(),
            )
            .into());
        }
        let state: State = optional_string(record, "STATE")?
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or(State::Open);
        let direction: Direction = optional_string(record, "DIR")?
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_default();
        let sat_table = explicit_int(record, "SAT_TABLE")?.filter(|t| *t > 0);

        let mut connections = Vec::new();
        for k in k1..=k2 {
            let active_index = match ctx.grid.active_index(i, j, k) {
                Ok(index) => index,
                Err(_) => {
                    tracing::debug!(well = %name, i, j, k, "skipping connection in inactive cell");
                    continue;
                }
            };
            let global_index = ctx.grid.global_index(i, j, k)?;
            let depth = ctx.grid.depth(i, j, k)?;
            let (sat_table_id, default_sat_table) = match sat_table {
                Some(table) => (table, false),
                None => (ctx.grid.satnum(active_index)?, true),
            };
            let (ctf, ctf_kind) = connection_factor(record, ctx, [i, j, k], direction)?;
            connections.push((
                [i, j, k],
                global_index,
                depth,
                ctf,
                sat_table_id,
                ctf_kind,
                default_sat_table,
            ));
        }

        if let Some(well) = ctx.state().well_mut(&name) {
            let well_connections = well.connections_mut();
            for (ijk, global_index, depth, ctf, sat_table_id, ctf_kind, default_sat_table) in connections {
                let insert_index = well_connections.next_insert_index();
                well_connections.add(Connection::new(
                    ijk,
                    global_index,
                    insert_index as i32 + 1,
                    depth,
                    state,
                    ctf,
                    sat_table_id,
                    direction,
                    ctf_kind,
                    insert_index,
                    default_sat_table,
                ));
            }
            well_connections.order();
        }
        ctx.state().add_event(ScheduleEvents::CompletionChange);
        ctx.affected_well(&name);
    }
    Ok(())
}

fn handle_compord(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let pattern = record.item("WELL")?.get_string(0)?;
        let ordering: Order = optional_string(record, "ORDER_TYPE")?
            .map(|s| s.parse())
            .transpose()?
            .unwrap_or_default();
        for name in matching_wells(ctx, &pattern)? {
            if let Some(well) = ctx.state().well_mut(&name) {
                let connections = well.connections_mut();
                connections.set_ordering(ordering);
                connections.order();
            }
        }
    }
    Ok(())
}

fn handle_wpimult(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let pattern = record.item("WELL")?.get_string(0)?;
        let factor = record.item("WELLPI")?.get_double(0)?;
        let i = grid_index(record, "I", ctx)?;
        let j = grid_index(record, "J", ctx)?;
        let k = grid_index(record, "K", ctx)?;
        let first = explicit_int(record, "FIRST")?;
        let last = explicit_int(record, "LAST")?;

        for name in matching_wells(ctx, &pattern)? {
            let Some(well) = ctx.state().well_mut(&name) else {
                continue;
            };
            let selected = well.connections_mut().iter_mut().filter(|c| {
                i.map_or(true, |i| c.i() == i)
                    && j.map_or(true, |j| c.j() == j)
                    && k.map_or(true, |k| c.k() == k)
                    && first.map_or(true, |first| c.complnum() >= first)
                    && last.map_or(true, |last| c.complnum() <= last)
            });
            for connection in selected {
                connection.scale_well_pi(factor);
            }
            ctx.state().add_event(ScheduleEvents::CompletionChange);
            ctx.affected_well(&name);
        }
    }
    Ok(())
}

fn handle_welpi(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let pattern = record.item("WELL_NAME")?.get_string(0)?;
        let target = record
            .item("STEADY_STATE_PRODUCTIVITY_OR_INJECTIVITY_INDEX_VALUE")?
            .get_si_double(0)?;

        for name in matching_wells(ctx, &pattern)? {
            if let Some(well) = ctx.state().well_mut(&name) {
                well.set_productivity_index(target);
                well.connections_mut().prepare_well_pi_scaling();
            }
            ctx.state().add_event(ScheduleEvents::WellProductivityIndex);
            ctx.welpi_well(&name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_patterns() {
        assert!(name_matches("OP1", "OP1"));
        assert!(!name_matches("OP1", "OP10"));
        assert!(name_matches("OP*", "OP10"));
        assert!(name_matches("*", "INJ"));
        assert!(name_matches("O*1", "OP_1"));
        assert!(!name_matches("O*1", "OP_2"));
        assert!(name_matches("*P*", "OPX"));
    }

    #[test]
    fn test_domain_claims_only_well_keywords() {
        let domain = WellDomain;
        assert!(domain.handler("COMPDAT").is_some());
        assert!(domain.handler("GRUPTREE").is_none());
    }
}
