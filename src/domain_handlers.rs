//! Group, multi-segment well, network and user defined quantity keywords

use crate::context::HandlerContext;
use crate::error::{HandlerError, InputError};
use crate::events::ScheduleEvents;
use crate::handlers::{explicit_int, explicit_si};
use crate::properties::{Branch, GroupTree, Network};
use crate::traits::{HandlerFn, KeywordDomain};
use crate::udt::UdtDefinition;

#[derive(Debug, Clone, Copy, Default)]
pub struct GroupDomain;

impl KeywordDomain for GroupDomain {
    fn name(&self) -> &'static str {
        "group"
    }

    fn handler(&self, keyword: &str) -> Option<HandlerFn> {
        match keyword {
            "GRUPTREE" => Some(handle_gruptree),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MswDomain;

impl KeywordDomain for MswDomain {
    fn name(&self) -> &'static str {
        "multi-segment well"
    }

    fn handler(&self, keyword: &str) -> Option<HandlerFn> {
        match keyword {
            "COMPSEGS" => Some(handle_compsegs),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkDomain;

impl KeywordDomain for NetworkDomain {
    fn name(&self) -> &'static str {
        "network"
    }

    fn handler(&self, keyword: &str) -> Option<HandlerFn> {
        match keyword {
            "BRANPROP" => Some(handle_branprop),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UdqDomain;

impl KeywordDomain for UdqDomain {
    fn name(&self) -> &'static str {
        "udq"
    }

    fn handler(&self, keyword: &str) -> Option<HandlerFn> {
        match keyword {
            "UDT" => Some(handle_udt),
            _ => None,
        }
    }
}

fn handle_gruptree(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let child = record.item("CHILD_GROUP")?.get_string(0)?;
        let parent_item = record.item("PARENT_GROUP")?;
        let parent = if parent_item.has_value(0) {
            parent_item.get_string(0)?
        } else {
            GroupTree::FIELD.to_string()
        };

        let state = ctx.state();
        if !state.group_tree().has_group(&parent) {
            state.group_tree_mut().set_parent(&parent, GroupTree::FIELD);
            state.add_event(ScheduleEvents::NewGroup);
        }
        let is_new = !state.group_tree().has_group(&child);
        if state.group_tree().parent(&child) == Some(parent.as_str()) {
            continue;
        }
        state.group_tree_mut().set_parent(&child, &parent);
        state.add_event(if is_new {
            ScheduleEvents::NewGroup
        } else {
            ScheduleEvents::GroupChange
        });
    }
    Ok(())
}

/// Attach the connections of a well to segments
///
/// The first record names the well; every following record names one
/// connection and its segment. Connections take the record order as their
/// sort value, which makes it the simulation and restart order.
fn handle_compsegs(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    let well_name = keyword.record(0)?.item("WELL")?.get_string(0)?;
    if !ctx.state().has_well(&well_name) {
        return Err(InputError::new(
            format!("Well {} is not defined by WELSPECS", well_name),
            ctx.location().clone(),
        )
        .into());
    }

    let mut attachments = Vec::new();
    for (insertion_index, record) in keyword.records().iter().skip(1).enumerate() {
        let ijk = ["I", "J", "K"]
            .into_iter()
            .map(|name| match explicit_int(record, name)? {
                Some(value) if value >= 1 => Ok(value as usize - 1),
                _ => Err(HandlerError::from(InputError::new(
                    format!("COMPSEGS item {} must be a positive grid index", name),
                    ctx.location().clone(),
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let segment = explicit_int(record, "SEGMENT_NUMBER")?.ok_or_else(|| {
            InputError::new(
                format!("COMPSEGS record {} has no segment number", insertion_index + 2),
                ctx.location().clone(),
            )
        })?;
        let start = explicit_si(record, "DISTANCE_START")?.unwrap_or(0.0);
        let end = explicit_si(record, "DISTANCE_END")?.unwrap_or(start);
        let depth = explicit_si(record, "CENTER_DEPTH")?;
        attachments.push(([ijk[0], ijk[1], ijk[2]], segment, depth, insertion_index, (start, end)));
    }

    let location = ctx.location().clone();
    if let Some(well) = ctx.state().well_mut(&well_name) {
        let connections = well.connections_mut();
        for ([i, j, k], segment, depth, insertion_index, perf_range) in attachments {
            let connection = connections.get_mut(i, j, k).ok_or_else(|| {
                InputError::new(
                    format!(
                        "COMPSEGS refers to ({},{},{}) which is not a connection of well {}",
                        i + 1,
                        j + 1,
                        k + 1,
                        well_name
                    ),
                    location.clone(),
                )
            })?;
            let depth = depth.unwrap_or_else(|| connection.depth());
            connection.attach_to_segment(segment, depth, insertion_index, perf_range);
        }
        if let Some(loose) = connections.iter().find(|c| !c.attached_to_segment()) {
            return Err(InputError::new(
                format!(
                    "COMPSEGS leaves connection ({},{},{}) of well {} without a segment",
                    loose.i() + 1,
                    loose.j() + 1,
                    loose.k() + 1,
                    well_name
                ),
                location,
            )
            .into());
        }
        connections.order();
    }
    ctx.state().add_event(ScheduleEvents::CompletionChange);
    ctx.affected_well(&well_name);
    ctx.well_structure_changed();
    Ok(())
}

fn handle_branprop(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let downtree_node = record.item("DOWNTREE_NODE")?.get_string(0)?;
        let uptree_node = record.item("UPTREE_NODE")?.get_string(0)?;
        let vfp_table = record.item("VFP_TABLE")?.get_int(0)?;
        let alq_value = explicit_si(record, "ALQ")?;

        let network = ctx.state().network_mut();
        if vfp_table == Network::REMOVE_BRANCH {
            network.drop_branch(&downtree_node);
        } else {
            network.add_branch(Branch {
                downtree_node,
                uptree_node,
                vfp_table,
                alq_value,
            });
        }
    }
    ctx.state().add_event(ScheduleEvents::NetworkChange);
    Ok(())
}

fn handle_udt(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let definition = UdtDefinition::from_keyword(ctx.keyword)?;
    let state = ctx.state();
    state.insert_udt(definition.name, definition.table);
    state.add_event(ScheduleEvents::UdqUpdate);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domains_are_disjoint() {
        let domains: [&dyn KeywordDomain; 4] = [&GroupDomain, &MswDomain, &NetworkDomain, &UdqDomain];
        for keyword in ["GRUPTREE", "COMPSEGS", "BRANPROP", "UDT"] {
            let claims = domains.iter().filter(|d| d.handler(keyword).is_some()).count();
            assert_eq!(claims, 1, "{}", keyword);
        }
        assert!(domains.iter().all(|d| d.handler("TUNING").is_none()));
    }
}
