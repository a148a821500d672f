//! Handlers for the single purpose keywords of the flat table

use std::collections::HashMap;

use crate::context::HandlerContext;
use crate::deck::DeckRecord;
use crate::error::{DeckError, HandlerError, InputError};
use crate::events::ScheduleEvents;
use crate::properties::{AquiferFlux, NextStep, VfpKind, VfpTable};
use crate::rst_config::RptConfig;
use crate::state::DEFAULT_NUPCOL;
use crate::traits::HandlerFn;

/// Name to handler table for keywords outside the domain dispatchers
pub fn flat_table() -> HashMap<&'static str, HandlerFn> {
    let entries: &[(&'static str, HandlerFn)] = &[
        ("AQUCT", handle_aquct),
        ("AQUFETP", handle_aqufetp),
        ("AQUFLUX", handle_aquflux),
        ("BOX", handle_geo_keyword),
        ("DRSDT", handle_drsdt),
        ("DRSDTCON", handle_drsdtcon),
        ("DRSDTR", handle_drsdtr),
        ("DRVDT", handle_drvdt),
        ("DRVDTR", handle_drvdtr),
        ("ENDBOX", handle_geo_keyword),
        ("EXIT", handle_exit),
        ("LIFTOPT", handle_liftopt),
        ("MESSAGES", handle_messages),
        ("MULTFLT", handle_geo_keyword),
        ("MULTPV", handle_unsupported_modifier),
        ("MULTR", handle_unsupported_modifier),
        ("MULTR-", handle_unsupported_modifier),
        ("MULTREGT", handle_unsupported_modifier),
        ("MULTSIG", handle_unsupported_modifier),
        ("MULTSIGV", handle_unsupported_modifier),
        ("MULTTHT", handle_unsupported_modifier),
        ("MULTTHT-", handle_unsupported_modifier),
        ("MULTX", handle_geo_keyword),
        ("MULTX-", handle_geo_keyword),
        ("MULTY", handle_geo_keyword),
        ("MULTY-", handle_geo_keyword),
        ("MULTZ", handle_geo_keyword),
        ("MULTZ-", handle_geo_keyword),
        ("NEXT", handle_nextstep),
        ("NEXTSTEP", handle_nextstep),
        ("NUPCOL", handle_nupcol),
        ("RPTONLY", handle_rptonly),
        ("RPTONLYO", handle_rptonlyo),
        ("RPTRST", handle_rptrst),
        ("RPTSCHED", handle_rptsched),
        ("SAVE", handle_save),
        ("SUMTHIN", handle_sumthin),
        ("TUNING", handle_tuning),
        ("VAPPARS", handle_vappars),
        ("VFPINJ", handle_vfpinj),
        ("VFPPROD", handle_vfpprod),
    ];
    entries.iter().copied().collect()
}

/// Value of an item written explicitly in the record
///
/// Items that are missing, defaulted or without value give `None`.
pub(crate) fn explicit_si(record: &DeckRecord, name: &str) -> Result<Option<f64>, DeckError> {
    if !record.has_item(name) {
        return Ok(None);
    }
    let item = record.item(name)?;
    if item.default_applied(0) || !item.has_value(0) {
        return Ok(None);
    }
    item.get_si_double(0).map(Some)
}

pub(crate) fn explicit_int(record: &DeckRecord, name: &str) -> Result<Option<i32>, DeckError> {
    if !record.has_item(name) {
        return Ok(None);
    }
    let item = record.item(name)?;
    if item.default_applied(0) || !item.has_value(0) {
        return Ok(None);
    }
    item.get_int(0).map(Some)
}

/// Explicit value or the previous one, without unit conversion
fn explicit_or_double(record: &DeckRecord, name: &str, previous: f64) -> Result<f64, DeckError> {
    if !record.has_item(name) {
        return Ok(previous);
    }
    let item = record.item(name)?;
    if item.default_applied(0) {
        Ok(previous)
    } else {
        item.get_double(0)
    }
}

fn explicit_or_si(record: &DeckRecord, name: &str, previous: f64) -> Result<f64, DeckError> {
    Ok(explicit_si(record, name)?.unwrap_or(previous))
}

fn explicit_or_int(record: &DeckRecord, name: &str, previous: i32) -> Result<i32, DeckError> {
    Ok(explicit_int(record, name)?.unwrap_or(previous))
}

fn has_value(record: &DeckRecord, name: &str) -> bool {
    record
        .item(name)
        .map(|item| item.has_value(0))
        .unwrap_or(false)
}

fn handle_aquct(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    Err(InputError::new("AQUCT is not supported as SCHEDULE keyword", ctx.location().clone()).into())
}

fn handle_aqufetp(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    Err(InputError::new("AQUFETP is not supported as SCHEDULE keyword", ctx.location().clone()).into())
}

fn handle_aquflux(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let flux = AquiferFlux::from_record(record)?;
        ctx.state().insert_aquifer_flux(flux);
    }
    ctx.state().add_event(ScheduleEvents::AquiferUpdate);
    Ok(())
}

fn handle_geo_keyword(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword.clone();
    let state = ctx.state();
    state.add_geo_keyword(keyword);
    state.add_event(ScheduleEvents::GeoModifier);
    ctx.tran_update();
    Ok(())
}

fn handle_unsupported_modifier(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let template = format!(
        "Problem with keyword {{keyword}} at report step {}\n\
         In {{file}} line {{line}}\n\
         Grid property modifier {} is not supported in the Schedule section",
        ctx.current_step,
        ctx.keyword.name()
    );
    let message = InputError::format(&template, ctx.location());
    ctx.warning(message);
    Ok(())
}

fn num_pvt_regions(ctx: &HandlerContext<'_>) -> usize {
    ctx.runspec.num_pvt_regions
}

fn handle_drsdt(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let regions = num_pvt_regions(ctx);
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let max = record.item("DRSDT_MAX")?.get_si_double(0)?;
        let option = record.item("OPTION")?.get_string(0)?;
        ctx.state()
            .oilvap_mut()
            .update_drsdt(&vec![max; regions], &vec![option; regions])?;
    }
    ctx.state().add_event(ScheduleEvents::OilVaporizationChange);
    Ok(())
}

fn handle_drsdtcon(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let regions = num_pvt_regions(ctx);
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let max = record.item("DRSDT_MAX")?.get_si_double(0)?;
        let option = record.item("OPTION")?.get_string(0)?;
        ctx.state()
            .oilvap_mut()
            .update_drsdtcon(&vec![max; regions], &vec![option; regions])?;
    }
    ctx.state().add_event(ScheduleEvents::OilVaporizationChange);
    Ok(())
}

fn handle_drvdt(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let regions = num_pvt_regions(ctx);
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let max = record.item("DRVDT_MAX")?.get_si_double(0)?;
        ctx.state().oilvap_mut().update_drvdt(&vec![max; regions])?;
    }
    ctx.state().add_event(ScheduleEvents::OilVaporizationChange);
    Ok(())
}

/// Region indexed keywords need one record per PVT region
fn check_region_records(ctx: &HandlerContext<'_>) -> Result<(), HandlerError> {
    let regions = num_pvt_regions(ctx);
    let records = ctx.keyword.size();
    if records > regions {
        return Err(HandlerError::internal(format!(
            "{} has {} records but only {} PVT regions are defined",
            ctx.keyword.name(),
            records,
            regions
        )));
    }
    if records < regions {
        return Err(InputError::new(
            format!(
                "{} needs one record per PVT region, {} records given for {} regions",
                ctx.keyword.name(),
                records,
                regions
            ),
            ctx.location().clone(),
        )
        .into());
    }
    Ok(())
}

fn handle_drsdtr(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    check_region_records(ctx)?;
    let keyword = ctx.keyword;
    let mut maximums = Vec::with_capacity(keyword.size());
    let mut options = Vec::with_capacity(keyword.size());
    for record in keyword.records() {
        maximums.push(record.item("DRSDT_MAX")?.get_si_double(0)?);
        options.push(record.item("OPTION")?.get_string(0)?);
    }
    let state = ctx.state();
    state.oilvap_mut().update_drsdt(&maximums, &options)?;
    state.add_event(ScheduleEvents::OilVaporizationChange);
    Ok(())
}

fn handle_drvdtr(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    check_region_records(ctx)?;
    let maximums = ctx
        .keyword
        .records()
        .iter()
        .map(|record| record.item("DRVDT_MAX")?.get_si_double(0))
        .collect::<Result<Vec<_>, _>>()?;
    let state = ctx.state();
    state.oilvap_mut().update_drvdt(&maximums)?;
    state.add_event(ScheduleEvents::OilVaporizationChange);
    Ok(())
}

fn handle_vappars(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    for record in keyword.records() {
        let vap1 = record.item("OIL_VAP_PROPENSITY")?.get_double(0)?;
        let vap2 = record.item("OIL_DENSITY_PROPENSITY")?.get_double(0)?;
        ctx.state().oilvap_mut().update_vappars(vap1, vap2);
    }
    ctx.state().add_event(ScheduleEvents::OilVaporizationChange);
    Ok(())
}

fn handle_exit(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    if !ctx.actionx_mode {
        return Ok(());
    }
    let status = ctx.keyword.record(0)?.item("STATUS_CODE")?.get_int(0)?;
    let message = format!(
        "Simulation exit with status: {} requested as part of ACTIONX at report_step: {}",
        status, ctx.current_step
    );
    ctx.info(message);
    ctx.set_exit_code(status);
    Ok(())
}

fn handle_liftopt(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let record = ctx.keyword.record(0)?;
    let gaslift_increment = record.item("INCREMENT_SIZE")?.get_si_double(0)?;
    let min_eco_gradient = record.item("MIN_ECONOMIC_GRADIENT")?.get_si_double(0)?;
    let min_wait = record
        .item("MIN_INTERVAL_BETWEEN_GAS_LIFT_OPTIMIZATIONS")?
        .get_si_double(0)?;
    let all_newton = record.item("OPTIMISE_ALL_ITERATIONS")?.to_bool(0)?;

    let state = ctx.state();
    let glo = state.glo_mut();
    glo.gaslift_increment = gaslift_increment;
    glo.min_eco_gradient = min_eco_gradient;
    glo.min_wait = min_wait;
    glo.all_newton = all_newton;
    state.add_event(ScheduleEvents::GasLiftChange);
    Ok(())
}

fn handle_messages(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    ctx.state().message_limits_mut().update(keyword)?;
    Ok(())
}

fn handle_nextstep(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let record = ctx.keyword.record(0)?;
    let value = record.item("MAX_STEP")?.get_si_double(0)?;
    let every_report = record.item("APPLY_TO_ALL")?.to_bool(0)?;

    let state = ctx.state();
    state.set_next_tstep(NextStep { value, every_report });
    state.add_event(ScheduleEvents::TuningChange);
    Ok(())
}

fn handle_nupcol(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let item = ctx.keyword.record(0)?.item("NUM_ITER")?;
    let nupcol = if item.has_value(0) {
        item.get_int(0)?
    } else {
        DEFAULT_NUPCOL
    };
    if item.default_applied(0) {
        ctx.note(format!("Schedule processing uses {} as default NUPCOL value", DEFAULT_NUPCOL));
    }
    ctx.state().set_nupcol(nupcol);
    Ok(())
}

fn handle_rptonly(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    ctx.state().set_rptonly(true);
    Ok(())
}

fn handle_rptonlyo(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    ctx.state().set_rptonly(false);
    Ok(())
}

fn update_rst_config(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    // Work on a copy so a rejected keyword leaves the shared config untouched
    let mut rst_config = ctx.state().rst_config().clone();
    rst_config.update(ctx.keyword, ctx.parse_context, ctx.errors)?;
    *ctx.state().rst_config_mut() = rst_config;
    Ok(())
}

fn handle_rptrst(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    update_rst_config(ctx)
}

fn handle_rptsched(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    update_rst_config(ctx)?;
    let rpt_config = RptConfig::from_keyword(ctx.keyword)?;
    ctx.state().set_rpt_config(rpt_config);
    Ok(())
}

// SAVE only requests a normal restart file at this step.
fn handle_save(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    ctx.state().set_save();
    Ok(())
}

fn handle_sumthin(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let value = ctx.keyword.record(0)?.item("TIME")?.get_si_double(0)?;
    ctx.state().set_sumthin(value);
    Ok(())
}

fn handle_tuning(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let keyword = ctx.keyword;
    let mut tuning = ctx.state().tuning().clone();

    // TSINIT only applies to the step that sets it
    tuning.TSINIT = None;

    if let Some(record) = keyword.records().first() {
        tuning.TSINIT = explicit_si(record, "TSINIT")?;
        tuning.TSMAXZ = explicit_or_si(record, "TSMAXZ", tuning.TSMAXZ)?;
        tuning.TSMINZ = explicit_or_si(record, "TSMINZ", tuning.TSMINZ)?;
        tuning.TSMCHP = explicit_or_si(record, "TSMCHP", tuning.TSMCHP)?;
        tuning.TSFMAX = explicit_or_double(record, "TSFMAX", tuning.TSFMAX)?;
        tuning.TSFMIN = explicit_or_double(record, "TSFMIN", tuning.TSFMIN)?;
        tuning.TSFCNV = explicit_or_double(record, "TSFCNV", tuning.TSFCNV)?;
        tuning.TFDIFF = explicit_or_double(record, "TFDIFF", tuning.TFDIFF)?;
        tuning.THRUPT = explicit_or_double(record, "THRUPT", tuning.THRUPT)?;
        if has_value(record, "TMAXWC") {
            tuning.TMAXWC_has_value = true;
            tuning.TMAXWC = explicit_or_si(record, "TMAXWC", tuning.TMAXWC)?;
        }
    }

    if let Some(record) = keyword.records().get(1) {
        tuning.TRGTTE = explicit_or_double(record, "TRGTTE", tuning.TRGTTE)?;
        tuning.TRGCNV = explicit_or_double(record, "TRGCNV", tuning.TRGCNV)?;
        tuning.TRGMBE = explicit_or_double(record, "TRGMBE", tuning.TRGMBE)?;
        tuning.TRGLCV = explicit_or_double(record, "TRGLCV", tuning.TRGLCV)?;
        tuning.XXXTTE = explicit_or_double(record, "XXXTTE", tuning.XXXTTE)?;
        tuning.XXXCNV = explicit_or_double(record, "XXXCNV", tuning.XXXCNV)?;
        tuning.XXXMBE = explicit_or_double(record, "XXXMBE", tuning.XXXMBE)?;
        tuning.XXXLCV = explicit_or_double(record, "XXXLCV", tuning.XXXLCV)?;
        tuning.XXXWFL = explicit_or_double(record, "XXXWFL", tuning.XXXWFL)?;
        tuning.TRGFIP = explicit_or_double(record, "TRGFIP", tuning.TRGFIP)?;
        if has_value(record, "TRGSFT") {
            tuning.TRGSFT_has_value = true;
            tuning.TRGSFT = explicit_or_double(record, "TRGSFT", tuning.TRGSFT)?;
        }
        tuning.THIONX = explicit_or_double(record, "THIONX", tuning.THIONX)?;
        tuning.TRWGHT = explicit_or_int(record, "TRWGHT", tuning.TRWGHT)?;
    }

    if let Some(record) = keyword.records().get(2) {
        tuning.NEWTMX = explicit_or_int(record, "NEWTMX", tuning.NEWTMX)?;
        tuning.NEWTMN = explicit_or_int(record, "NEWTMN", tuning.NEWTMN)?;
        tuning.LITMAX = explicit_or_int(record, "LITMAX", tuning.LITMAX)?;
        tuning.LITMIN = explicit_or_int(record, "LITMIN", tuning.LITMIN)?;
        tuning.MXWSIT = explicit_or_int(record, "MXWSIT", tuning.MXWSIT)?;
        tuning.MXWPIT = explicit_or_int(record, "MXWPIT", tuning.MXWPIT)?;
        tuning.DDPLIM = explicit_or_si(record, "DDPLIM", tuning.DDPLIM)?;
        tuning.DDSLIM = explicit_or_double(record, "DDSLIM", tuning.DDSLIM)?;
        tuning.TRGDPR = explicit_or_si(record, "TRGDPR", tuning.TRGDPR)?;
        if has_value(record, "XXXDPR") {
            tuning.XXXDPR_has_value = true;
            tuning.XXXDPR = explicit_or_si(record, "XXXDPR", tuning.XXXDPR)?;
        }
    }

    let state = ctx.state();
    *state.tuning_mut() = tuning;
    state.add_event(ScheduleEvents::TuningChange);
    Ok(())
}

fn handle_vfpinj(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let table = VfpTable::from_keyword(ctx.keyword, VfpKind::Injection, false, ctx.unit_system())?;
    let state = ctx.state();
    state.add_event(ScheduleEvents::VfpinjUpdate);
    state.insert_vfpinj(table);
    Ok(())
}

fn handle_vfpprod(ctx: &mut HandlerContext<'_>) -> Result<(), HandlerError> {
    let gaslift_active = ctx.state().glo().active();
    let table = VfpTable::from_keyword(
        ctx.keyword,
        VfpKind::Production,
        gaslift_active,
        ctx.unit_system(),
    )?;
    let state = ctx.state();
    state.add_event(ScheduleEvents::VfpprodUpdate);
    state.insert_vfpprod(table);
    Ok(())
}
