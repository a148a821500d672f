//! Simulation control state of a single report step
//!
//! Large sub-objects are reference counted and shared with the previous
//! step until a handler asks for mutable access, at which point only that
//! object is copied.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::checksum::{bitwise_eq, Persist};
use crate::deck::DeckKeyword;
use crate::events::{Events, ScheduleEvents};
use crate::properties::{
    AquiferFlux, GasLiftOpt, GroupTree, MessageLimits, Network, NextStep, OilVaporizationProperties,
    Tuning, VfpTable,
};
use crate::rst_config::{RptConfig, RstConfig};
use crate::udt::Udt;
use crate::well::Well;

/// Default number of Newton iterations that update well controls
pub const DEFAULT_NUPCOL: i32 = 12;

/// Hints for the simulator about what a set of keywords changed
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulatorUpdate {
    /// Transmissibilities must be recomputed
    pub tran_update: bool,
    pub well_structure_changed: bool,
    pub affected_wells: BTreeSet<String>,
    /// Wells whose productivity index must be reported back
    pub welpi_wells: BTreeSet<String>,
}

impl SimulatorUpdate {
    pub fn is_empty(&self) -> bool {
        !self.tran_update
            && !self.well_structure_changed
            && self.affected_wells.is_empty()
            && self.welpi_wells.is_empty()
    }

    /// Merge the hints of `other` into this update
    pub fn append(&mut self, other: SimulatorUpdate) {
        self.tran_update |= other.tran_update;
        self.well_structure_changed |= other.well_structure_changed;
        self.affected_wells.extend(other.affected_wells);
        self.welpi_wells.extend(other.welpi_wells);
    }
}

/// Independently tracked part of a step state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StateSection {
    StartTime,
    Tuning,
    GasLiftOpt,
    OilVaporization,
    MessageLimits,
    RstConfig,
    RptConfig,
    GroupTree,
    Network,
    VfpProd,
    VfpInj,
    Wells,
    Udts,
    AquiferFlux,
    GeoKeywords,
    Nupcol,
    Sumthin,
    Rptonly,
    Save,
    NextStep,
    Events,
}

impl fmt::Display for StateSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Everything the simulator needs to know for one report step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepState {
    start_time: DateTime<Utc>,
    tuning: Arc<Tuning>,
    glo: Arc<GasLiftOpt>,
    oilvap: Arc<OilVaporizationProperties>,
    message_limits: Arc<MessageLimits>,
    rst_config: Arc<RstConfig>,
    rpt_config: Arc<RptConfig>,
    group_tree: Arc<GroupTree>,
    network: Arc<Network>,
    vfpprod: BTreeMap<i32, Arc<VfpTable>>,
    vfpinj: BTreeMap<i32, Arc<VfpTable>>,
    wells: BTreeMap<String, Arc<Well>>,
    udts: BTreeMap<String, Arc<Udt>>,
    aqufluxs: BTreeMap<i32, AquiferFlux>,
    geo_keywords: Vec<DeckKeyword>,
    nupcol: i32,
    sumthin: Option<f64>,
    rptonly: bool,
    save: bool,
    next_tstep: Option<NextStep>,
    events: Events,
}

crate::persist_fields!(StepState {
    start_time,
    tuning,
    glo,
    oilvap,
    message_limits,
    rst_config,
    rpt_config,
    group_tree,
    network,
    vfpprod,
    vfpinj,
    wells,
    udts,
    aqufluxs,
    geo_keywords,
    nupcol,
    sumthin,
    rptonly,
    save,
    next_tstep,
    events,
});

impl StepState {
    /// Create the state of the first report step
    pub fn new(start_time: DateTime<Utc>, num_pvt_regions: usize) -> Self {
        Self {
            start_time,
            tuning: Arc::new(Tuning::default()),
            glo: Arc::new(GasLiftOpt::default()),
            oilvap: Arc::new(OilVaporizationProperties::new(num_pvt_regions)),
            message_limits: Arc::new(MessageLimits::default()),
            rst_config: Arc::new(RstConfig::default()),
            rpt_config: Arc::new(RptConfig::default()),
            group_tree: Arc::new(GroupTree::default()),
            network: Arc::new(Network::default()),
            vfpprod: BTreeMap::new(),
            vfpinj: BTreeMap::new(),
            wells: BTreeMap::new(),
            udts: BTreeMap::new(),
            aqufluxs: BTreeMap::new(),
            geo_keywords: Vec::new(),
            nupcol: DEFAULT_NUPCOL,
            sumthin: None,
            rptonly: false,
            save: false,
            next_tstep: None,
            events: Events::new(),
        }
    }

    /// Set the restart configuration of the first step
    pub fn with_rst_config(mut self, rst_config: RstConfig) -> Self {
        self.rst_config = Arc::new(rst_config);
        self
    }

    /// Derive the state of the following report step
    ///
    /// Shared objects stay shared. Events, geo modifiers and the SAVE request
    /// belong to a single step, and a next step override only survives when
    /// it applies to every report step.
    pub fn next_step(&self, start_time: DateTime<Utc>) -> Self {
        let mut next = self.clone();
        next.start_time = start_time;
        next.events = Events::new();
        next.geo_keywords.clear();
        next.save = false;
        if !next.next_tstep.map(|n| n.every_report).unwrap_or(false) {
            next.next_tstep = None;
        }
        next
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn tuning_mut(&mut self) -> &mut Tuning {
        Arc::make_mut(&mut self.tuning)
    }

    pub fn glo(&self) -> &GasLiftOpt {
        &self.glo
    }

    pub fn glo_mut(&mut self) -> &mut GasLiftOpt {
        Arc::make_mut(&mut self.glo)
    }

    pub fn oilvap(&self) -> &OilVaporizationProperties {
        &self.oilvap
    }

    pub fn oilvap_mut(&mut self) -> &mut OilVaporizationProperties {
        Arc::make_mut(&mut self.oilvap)
    }

    pub fn message_limits(&self) -> &MessageLimits {
        &self.message_limits
    }

    pub fn message_limits_mut(&mut self) -> &mut MessageLimits {
        Arc::make_mut(&mut self.message_limits)
    }

    pub fn rst_config(&self) -> &RstConfig {
        &self.rst_config
    }

    pub fn rst_config_mut(&mut self) -> &mut RstConfig {
        Arc::make_mut(&mut self.rst_config)
    }

    pub fn rpt_config(&self) -> &RptConfig {
        &self.rpt_config
    }

    pub fn set_rpt_config(&mut self, rpt_config: RptConfig) {
        self.rpt_config = Arc::new(rpt_config);
    }

    pub fn group_tree(&self) -> &GroupTree {
        &self.group_tree
    }

    pub fn group_tree_mut(&mut self) -> &mut GroupTree {
        Arc::make_mut(&mut self.group_tree)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut Network {
        Arc::make_mut(&mut self.network)
    }

    pub fn vfpprod(&self, table_id: i32) -> Option<&VfpTable> {
        self.vfpprod.get(&table_id).map(Arc::as_ref)
    }

    pub fn vfpinj(&self, table_id: i32) -> Option<&VfpTable> {
        self.vfpinj.get(&table_id).map(Arc::as_ref)
    }

    pub fn vfpprod_tables(&self) -> impl Iterator<Item = &VfpTable> {
        self.vfpprod.values().map(Arc::as_ref)
    }

    pub fn vfpinj_tables(&self) -> impl Iterator<Item = &VfpTable> {
        self.vfpinj.values().map(Arc::as_ref)
    }

    pub fn insert_vfpprod(&mut self, table: VfpTable) {
        self.vfpprod.insert(table.table_id, Arc::new(table));
    }

    pub fn insert_vfpinj(&mut self, table: VfpTable) {
        self.vfpinj.insert(table.table_id, Arc::new(table));
    }

    pub fn has_well(&self, name: &str) -> bool {
        self.wells.contains_key(name)
    }

    pub fn well(&self, name: &str) -> Option<&Well> {
        self.wells.get(name).map(Arc::as_ref)
    }

    /// Mutable access to a well, unsharing it from the previous step
    pub fn well_mut(&mut self, name: &str) -> Option<&mut Well> {
        self.wells.get_mut(name).map(Arc::make_mut)
    }

    pub fn insert_well(&mut self, well: Well) {
        self.wells.insert(well.name().to_string(), Arc::new(well));
    }

    pub fn wells(&self) -> impl Iterator<Item = &Well> {
        self.wells.values().map(Arc::as_ref)
    }

    pub fn well_names(&self) -> Vec<String> {
        self.wells.keys().cloned().collect()
    }

    pub fn udt(&self, name: &str) -> Option<&Udt> {
        self.udts.get(name).map(Arc::as_ref)
    }

    pub fn insert_udt(&mut self, name: impl Into<String>, udt: Udt) {
        self.udts.insert(name.into(), Arc::new(udt));
    }

    pub fn aquifer_flux(&self, id: i32) -> Option<&AquiferFlux> {
        self.aqufluxs.get(&id)
    }

    pub fn insert_aquifer_flux(&mut self, flux: AquiferFlux) {
        self.aqufluxs.insert(flux.id, flux);
    }

    pub fn geo_keywords(&self) -> &[DeckKeyword] {
        &self.geo_keywords
    }

    pub fn add_geo_keyword(&mut self, keyword: DeckKeyword) {
        self.geo_keywords.push(keyword);
    }

    pub fn nupcol(&self) -> i32 {
        self.nupcol
    }

    pub fn set_nupcol(&mut self, nupcol: i32) {
        self.nupcol = nupcol;
    }

    pub fn sumthin(&self) -> Option<f64> {
        self.sumthin
    }

    pub fn set_sumthin(&mut self, sumthin: f64) {
        self.sumthin = Some(sumthin);
    }

    pub fn rptonly(&self) -> bool {
        self.rptonly
    }

    pub fn set_rptonly(&mut self, rptonly: bool) {
        self.rptonly = rptonly;
    }

    pub fn save(&self) -> bool {
        self.save
    }

    pub fn set_save(&mut self) {
        self.save = true;
    }

    pub fn next_tstep(&self) -> Option<NextStep> {
        self.next_tstep
    }

    pub fn set_next_tstep(&mut self, next: NextStep) {
        self.next_tstep = Some(next);
    }

    pub fn events(&self) -> &Events {
        &self.events
    }

    pub fn add_event(&mut self, event: ScheduleEvents) {
        self.events.add_event(event);
    }

    /// Sections that differ from `other`
    ///
    /// Shared objects are recognised by pointer before falling back to a
    /// bitwise comparison.
    pub fn changed_sections(&self, other: &StepState) -> Vec<StateSection> {
        fn shared<T: Persist>(a: &Arc<T>, b: &Arc<T>) -> bool {
            Arc::ptr_eq(a, b) || bitwise_eq(a.as_ref(), b.as_ref())
        }

        let checks = [
            (StateSection::StartTime, self.start_time == other.start_time),
            (StateSection::Tuning, shared(&self.tuning, &other.tuning)),
            (StateSection::GasLiftOpt, shared(&self.glo, &other.glo)),
            (StateSection::OilVaporization, shared(&self.oilvap, &other.oilvap)),
            (StateSection::MessageLimits, shared(&self.message_limits, &other.message_limits)),
            (StateSection::RstConfig, shared(&self.rst_config, &other.rst_config)),
            (StateSection::RptConfig, shared(&self.rpt_config, &other.rpt_config)),
            (StateSection::GroupTree, shared(&self.group_tree, &other.group_tree)),
            (StateSection::Network, shared(&self.network, &other.network)),
            (StateSection::VfpProd, bitwise_eq(&self.vfpprod, &other.vfpprod)),
            (StateSection::VfpInj, bitwise_eq(&self.vfpinj, &other.vfpinj)),
            (StateSection::Wells, bitwise_eq(&self.wells, &other.wells)),
            (StateSection::Udts, bitwise_eq(&self.udts, &other.udts)),
            (StateSection::AquiferFlux, bitwise_eq(&self.aqufluxs, &other.aqufluxs)),
            (StateSection::GeoKeywords, bitwise_eq(&self.geo_keywords, &other.geo_keywords)),
            (StateSection::Nupcol, self.nupcol == other.nupcol),
            (StateSection::Sumthin, bitwise_eq(&self.sumthin, &other.sumthin)),
            (StateSection::Rptonly, self.rptonly == other.rptonly),
            (StateSection::Save, self.save == other.save),
            (StateSection::NextStep, bitwise_eq(&self.next_tstep, &other.next_tstep)),
            (StateSection::Events, self.events == other.events),
        ];

        checks
            .into_iter()
            .filter(|(_, same)| !same)
            .map(|(section, _)| section)
            .collect()
    }

    /// Whether a sub-object is still shared with `other`
    pub fn shares_tuning_with(&self, other: &StepState) -> bool {
        Arc::ptr_eq(&self.tuning, &other.tuning)
    }

    pub fn shares_well_with(&self, other: &StepState, name: &str) -> bool {
        match (self.wells.get(name), other.wells.get(name)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
