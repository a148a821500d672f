//! Carry-forward control objects held by each report step

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::deck::{DeckKeyword, DeckRecord};
use crate::error::{DeckError, HandlerError, InputError, ValueError};
use crate::types::UnitSystem;

const DAY: f64 = 86400.0;

/// Time stepping and convergence controls set by TUNING
///
/// Field names follow the keyword items. Time values are held in seconds.
#[allow(non_snake_case)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tuning {
    // Record 1
    pub TSINIT: Option<f64>,
    pub TSMAXZ: f64,
    pub TSMINZ: f64,
    pub TSMCHP: f64,
    pub TSFMAX: f64,
    pub TSFMIN: f64,
    pub TSFCNV: f64,
    pub TFDIFF: f64,
    pub THRUPT: f64,
    pub TMAXWC: f64,
    pub TMAXWC_has_value: bool,

    // Record 2
    pub TRGTTE: f64,
    pub TRGCNV: f64,
    pub TRGMBE: f64,
    pub TRGLCV: f64,
    pub XXXTTE: f64,
    pub XXXCNV: f64,
    pub XXXMBE: f64,
    pub XXXLCV: f64,
    pub XXXWFL: f64,
    pub TRGFIP: f64,
    pub TRGSFT: f64,
    pub TRGSFT_has_value: bool,
    pub THIONX: f64,
    pub TRWGHT: i32,

    // Record 3
    pub NEWTMX: i32,
    pub NEWTMN: i32,
    pub LITMAX: i32,
    pub LITMIN: i32,
    pub MXWSIT: i32,
    pub MXWPIT: i32,
    pub DDPLIM: f64,
    pub DDSLIM: f64,
    pub TRGDPR: f64,
    pub XXXDPR: f64,
    pub XXXDPR_has_value: bool,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            TSINIT: Some(DAY),
            TSMAXZ: 365.0 * DAY,
            TSMINZ: 0.1 * DAY,
            TSMCHP: 0.15 * DAY,
            TSFMAX: 3.0,
            TSFMIN: 0.3,
            TSFCNV: 0.1,
            TFDIFF: 1.25,
            THRUPT: 1.0e20,
            TMAXWC: 0.0,
            TMAXWC_has_value: false,
            TRGTTE: 0.1,
            TRGCNV: 0.001,
            TRGMBE: 1.0e-7,
            TRGLCV: 0.0001,
            XXXTTE: 10.0,
            XXXCNV: 0.01,
            XXXMBE: 1.0e-6,
            XXXLCV: 0.001,
            XXXWFL: 0.001,
            TRGFIP: 0.025,
            TRGSFT: 0.0,
            TRGSFT_has_value: false,
            THIONX: 0.01,
            TRWGHT: 1,
            NEWTMX: 12,
            NEWTMN: 1,
            LITMAX: 25,
            LITMIN: 1,
            MXWSIT: 8,
            MXWPIT: 8,
            DDPLIM: 1.0e6,
            DDSLIM: 1.0e6,
            TRGDPR: 1.0e6,
            XXXDPR: 0.0,
            XXXDPR_has_value: false,
        }
    }
}

crate::persist_fields!(Tuning {
    TSINIT, TSMAXZ, TSMINZ, TSMCHP, TSFMAX, TSFMIN, TSFCNV, TFDIFF, THRUPT, TMAXWC,
    TMAXWC_has_value, TRGTTE, TRGCNV, TRGMBE, TRGLCV, XXXTTE, XXXCNV, XXXMBE, XXXLCV,
    XXXWFL, TRGFIP, TRGSFT, TRGSFT_has_value, THIONX, TRWGHT, NEWTMX, NEWTMN, LITMAX,
    LITMIN, MXWSIT, MXWPIT, DDPLIM, DDSLIM, TRGDPR, XXXDPR, XXXDPR_has_value,
});

/// Gas lift optimisation settings from LIFTOPT
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GasLiftOpt {
    pub gaslift_increment: f64,
    pub min_eco_gradient: f64,
    pub min_wait: f64,
    pub all_newton: bool,
}

impl GasLiftOpt {
    /// Optimisation runs only with a positive lift gas increment
    pub fn active(&self) -> bool {
        self.gaslift_increment > 0.0
    }
}

crate::persist_fields!(GasLiftOpt {
    gaslift_increment,
    min_eco_gradient,
    min_wait,
    all_newton,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OilVaporization {
    #[default]
    Undefined,
    Drdt,
    Vappars,
}

crate::persist_enum!(OilVaporization {
    Undefined = 0,
    Drdt = 1,
    Vappars = 2,
});

/// Dissolution and vaporization rate limits per PVT region
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OilVaporizationProperties {
    kind: OilVaporization,
    vap1: f64,
    vap2: f64,
    max_drsdt: Vec<Option<f64>>,
    max_drsdt_all_cells: Vec<bool>,
    drsdtcon: Vec<bool>,
    max_drvdt: Vec<Option<f64>>,
}

crate::persist_fields!(OilVaporizationProperties {
    kind,
    vap1,
    vap2,
    max_drsdt,
    max_drsdt_all_cells,
    drsdtcon,
    max_drvdt,
});

impl OilVaporizationProperties {
    /// Create unlimited properties for `num_pvt_regions` regions
    pub fn new(num_pvt_regions: usize) -> Self {
        Self {
            kind: OilVaporization::Undefined,
            vap1: 0.0,
            vap2: 0.0,
            max_drsdt: vec![None; num_pvt_regions],
            max_drsdt_all_cells: vec![true; num_pvt_regions],
            drsdtcon: vec![false; num_pvt_regions],
            max_drvdt: vec![None; num_pvt_regions],
        }
    }

    fn parse_option(option: &str) -> Result<bool, ValueError> {
        match option {
            "ALL" => Ok(true),
            "FREE" => Ok(false),
            other => Err(ValueError::new("DRSDT option", other)),
        }
    }

    fn check_regions(&self, len: usize) -> Result<(), HandlerError> {
        if len != self.max_drsdt.len() {
            return Err(HandlerError::internal(format!(
                "rate limits given for {} regions, {} PVT regions defined",
                len,
                self.max_drsdt.len()
            )));
        }
        Ok(())
    }

    pub fn update_drsdt(&mut self, maximums: &[f64], options: &[String]) -> Result<(), HandlerError> {
        self.check_regions(maximums.len())?;
        for (region, (max, option)) in maximums.iter().zip(options).enumerate() {
            self.max_drsdt[region] = Some(*max);
            self.max_drsdt_all_cells[region] = Self::parse_option(option)?;
            self.drsdtcon[region] = false;
        }
        self.kind = OilVaporization::Drdt;
        Ok(())
    }

    pub fn update_drsdtcon(
        &mut self,
        maximums: &[f64],
        options: &[String],
    ) -> Result<(), HandlerError> {
        self.update_drsdt(maximums, options)?;
        self.drsdtcon.iter_mut().for_each(|flag| *flag = true);
        Ok(())
    }

    pub fn update_drvdt(&mut self, maximums: &[f64]) -> Result<(), HandlerError> {
        self.check_regions(maximums.len())?;
        for (region, max) in maximums.iter().enumerate() {
            self.max_drvdt[region] = Some(*max);
        }
        self.kind = OilVaporization::Drdt;
        Ok(())
    }

    pub fn update_vappars(&mut self, vap1: f64, vap2: f64) {
        self.vap1 = vap1;
        self.vap2 = vap2;
        self.kind = OilVaporization::Vappars;
    }

    pub fn kind(&self) -> OilVaporization {
        self.kind
    }

    pub fn num_pvt_regions(&self) -> usize {
        self.max_drsdt.len()
    }

    pub fn max_drsdt(&self, region: usize) -> Option<f64> {
        self.max_drsdt.get(region).copied().flatten()
    }

    pub fn max_drvdt(&self, region: usize) -> Option<f64> {
        self.max_drvdt.get(region).copied().flatten()
    }

    pub fn drsdt_all_cells(&self, region: usize) -> bool {
        self.max_drsdt_all_cells.get(region).copied().unwrap_or(true)
    }

    pub fn drsdt_convective(&self, region: usize) -> bool {
        self.drsdtcon.get(region).copied().unwrap_or(false)
    }

    pub fn vap1(&self) -> f64 {
        self.vap1
    }

    pub fn vap2(&self) -> f64 {
        self.vap2
    }
}

/// Print and stop limits per message class from MESSAGES
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageLimits {
    limits: [i32; 12],
}

crate::persist_fields!(MessageLimits { limits });

impl MessageLimits {
    pub const ITEMS: [&'static str; 12] = [
        "MESSAGE_PRINT_LIMIT",
        "COMMENT_PRINT_LIMIT",
        "WARNING_PRINT_LIMIT",
        "PROBLEM_PRINT_LIMIT",
        "ERROR_PRINT_LIMIT",
        "BUG_PRINT_LIMIT",
        "MESSAGE_STOP_LIMIT",
        "COMMENT_STOP_LIMIT",
        "WARNING_STOP_LIMIT",
        "PROBLEM_STOP_LIMIT",
        "ERROR_STOP_LIMIT",
        "BUG_STOP_LIMIT",
    ];

    /// Apply the explicit items of a MESSAGES keyword
    pub fn update(&mut self, keyword: &DeckKeyword) -> Result<(), DeckError> {
        let record = keyword.record(0)?;
        for (slot, name) in Self::ITEMS.iter().enumerate() {
            if !record.has_item(name) {
                continue;
            }
            let item = record.item(name)?;
            if !item.default_applied(0) {
                self.limits[slot] = item.get_int(0)?;
            }
        }
        Ok(())
    }

    /// Limit for a named item, `None` for an unknown name
    pub fn limit(&self, name: &str) -> Option<i32> {
        Self::ITEMS
            .iter()
            .position(|item| *item == name)
            .map(|slot| self.limits[slot])
    }

    pub fn message_print_limit(&self) -> i32 {
        self.limits[0]
    }

    pub fn warning_print_limit(&self) -> i32 {
        self.limits[2]
    }

    pub fn error_stop_limit(&self) -> i32 {
        self.limits[10]
    }

    pub fn bug_stop_limit(&self) -> i32 {
        self.limits[11]
    }
}

impl Default for MessageLimits {
    fn default() -> Self {
        Self {
            limits: [
                1_000_000, 1_000_000, 10_000, 100, 100, 100, 1_000_000, 1_000_000, 1_000_000,
                1_000_000, 10, 1,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VfpKind {
    Production,
    Injection,
}

crate::persist_enum!(VfpKind {
    Production = 1,
    Injection = 2,
});

/// Lift curve table from VFPPROD or VFPINJ
///
/// Record layout: table header (`TABLE`, `DATUM_DEPTH`), flow values, THP
/// values, ALQ values (production only), then one `VALUES` record per THP/ALQ
/// combination holding one value per flow point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VfpTable {
    pub table_id: i32,
    pub kind: VfpKind,
    pub datum_depth: f64,
    pub unit_system: UnitSystem,
    pub flow_values: Vec<f64>,
    pub thp_values: Vec<f64>,
    pub alq_values: Vec<f64>,
    pub gaslift_opt_active: bool,
    pub data: Vec<Vec<f64>>,
}

crate::persist_fields!(VfpTable {
    table_id,
    kind,
    datum_depth,
    unit_system,
    flow_values,
    thp_values,
    alq_values,
    gaslift_opt_active,
    data,
});

impl VfpTable {
    /// Build a table from its keyword
    pub fn from_keyword(
        keyword: &DeckKeyword,
        kind: VfpKind,
        gaslift_opt_active: bool,
        unit_system: UnitSystem,
    ) -> Result<Self, HandlerError> {
        let header = keyword.record(0)?;
        let table_id = header.item("TABLE")?.get_int(0)?;
        let datum_depth = header.item("DATUM_DEPTH")?.get_si_double(0)?;
        let flow_values = keyword.record(1)?.item("FLOW_VALUES")?.get_si_double_data()?;
        let thp_values = keyword.record(2)?.item("THP_VALUES")?.get_si_double_data()?;

        let (alq_values, first_data) = match kind {
            VfpKind::Production => (
                keyword.record(3)?.item("ALQ_VALUES")?.get_si_double_data()?,
                4,
            ),
            VfpKind::Injection => (Vec::new(), 3),
        };

        let data = keyword.records()[first_data.min(keyword.size())..]
            .iter()
            .map(|record: &DeckRecord| record.item("VALUES")?.get_si_double_data())
            .collect::<Result<Vec<_>, _>>()?;

        let expected_rows = thp_values.len() * alq_values.len().max(1);
        if data.len() != expected_rows {
            return Err(InputError::new(
                InputError::format(
                    &format!(
                        "VFP table {} in {{keyword}} has {} data records, expected {}",
                        table_id,
                        data.len(),
                        expected_rows
                    ),
                    keyword.location(),
                ),
                keyword.location().clone(),
            )
            .into());
        }
        if let Some(row) = data.iter().position(|row| row.len() != flow_values.len()) {
            return Err(InputError::new(
                format!(
                    "VFP table {} data record {} does not match the {} flow values",
                    table_id,
                    row + 1,
                    flow_values.len()
                ),
                keyword.location().clone(),
            )
            .into());
        }

        Ok(Self {
            table_id,
            kind,
            datum_depth,
            unit_system,
            flow_values,
            thp_values,
            alq_values,
            gaslift_opt_active,
            data,
        })
    }
}

/// Next time step override from NEXTSTEP
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NextStep {
    pub value: f64,
    pub every_report: bool,
}

crate::persist_fields!(NextStep {
    value,
    every_report,
});

/// Flux aquifer definition from AQUFLUX
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AquiferFlux {
    pub id: i32,
    pub flux: f64,
    pub salt_concentration: f64,
    pub temperature: Option<f64>,
    pub active: bool,
}

crate::persist_fields!(AquiferFlux {
    id,
    flux,
    salt_concentration,
    temperature,
    active,
});

impl AquiferFlux {
    pub fn from_record(record: &DeckRecord) -> Result<Self, DeckError> {
        let temperature = record.item("TEMP")?;
        Ok(Self {
            id: record.item("AQUIFER_ID")?.get_int(0)?,
            flux: record.item("FLUX")?.get_si_double(0)?,
            salt_concentration: record.item("SC_0")?.get_si_double(0)?,
            temperature: if temperature.has_value(0) {
                Some(temperature.get_si_double(0)?)
            } else {
                None
            },
            active: true,
        })
    }
}

/// Pipeline branch between two network nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub downtree_node: String,
    pub uptree_node: String,
    pub vfp_table: i32,
    pub alq_value: Option<f64>,
}

crate::persist_fields!(Branch {
    downtree_node,
    uptree_node,
    vfp_table,
    alq_value,
});

/// Extended production network keyed by downtree node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Network {
    branches: BTreeMap<String, Branch>,
}

crate::persist_fields!(Network { branches });

impl Network {
    /// Table number that removes a branch instead of defining one
    pub const REMOVE_BRANCH: i32 = 9999;

    pub fn add_branch(&mut self, branch: Branch) {
        self.branches.insert(branch.downtree_node.clone(), branch);
    }

    pub fn drop_branch(&mut self, downtree_node: &str) -> Option<Branch> {
        self.branches.remove(downtree_node)
    }

    pub fn uptree_branch(&self, node: &str) -> Option<&Branch> {
        self.branches.get(node)
    }

    pub fn active(&self) -> bool {
        !self.branches.is_empty()
    }

    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.values()
    }
}

/// Group hierarchy as child to parent links
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupTree {
    parents: BTreeMap<String, String>,
}

crate::persist_fields!(GroupTree { parents });

impl GroupTree {
    pub const FIELD: &'static str = "FIELD";

    pub fn has_group(&self, name: &str) -> bool {
        name == Self::FIELD || self.parents.contains_key(name)
    }

    /// Set the parent of `child`, returning the previous parent
    pub fn set_parent(&mut self, child: &str, parent: &str) -> Option<String> {
        self.parents.insert(child.to_string(), parent.to_string())
    }

    pub fn parent(&self, child: &str) -> Option<&str> {
        self.parents.get(child).map(String::as_str)
    }

    pub fn children<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.parents
            .iter()
            .filter(move |(_, p)| p.as_str() == parent)
            .map(|(child, _)| child.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::checksum_octets;
    use crate::deck::DeckItem;

    #[test]
    fn test_tuning_defaults_have_tsinit() {
        let tuning = Tuning::default();
        assert_eq!(tuning.TSINIT, Some(86400.0));
        assert_eq!(tuning.NEWTMX, 12);
    }

    #[test]
    fn test_tuning_checksum_sees_every_field() {
        let base = Tuning::default();
        let mut changed = base.clone();
        changed.XXXDPR_has_value = true;
        assert_ne!(checksum_octets(&base), checksum_octets(&changed));
    }

    #[test]
    fn test_drsdt_options() {
        let mut ovp = OilVaporizationProperties::new(2);
        ovp.update_drsdt(&[0.1, 0.2], &["ALL".into(), "FREE".into()])
            .unwrap();
        assert_eq!(ovp.kind(), OilVaporization::Drdt);
        assert_eq!(ovp.max_drsdt(1), Some(0.2));
        assert!(ovp.drsdt_all_cells(0));
        assert!(!ovp.drsdt_all_cells(1));
        assert!(!ovp.drsdt_convective(0));

        let bad = ovp.update_drsdt(&[0.1, 0.2], &["ALL".into(), "SOME".into()]);
        assert!(matches!(bad, Err(HandlerError::Value(_))));
    }

    #[test]
    fn test_region_count_mismatch_is_internal() {
        let mut ovp = OilVaporizationProperties::new(2);
        assert!(matches!(
            ovp.update_drvdt(&[1.0]),
            Err(HandlerError::Internal(_))
        ));
    }

    #[test]
    fn test_message_limits_only_explicit_items() {
        let mut limits = MessageLimits::default();
        let keyword = DeckKeyword::new(
            "MESSAGES",
            vec![DeckRecord::default()
                .with(DeckItem::int("MESSAGE_PRINT_LIMIT", 5))
                .with(DeckItem::defaulted(
                    "WARNING_PRINT_LIMIT",
                    Some(crate::deck::DeckValue::Int(10_000)),
                ))],
        );
        limits.update(&keyword).unwrap();
        assert_eq!(limits.message_print_limit(), 5);
        assert_eq!(limits.warning_print_limit(), 10_000);
        assert_eq!(limits.limit("BUG_STOP_LIMIT"), Some(1));
    }

    #[test]
    fn test_network_branches() {
        let mut network = Network::default();
        network.add_branch(Branch {
            downtree_node: "B1".into(),
            uptree_node: "PLAT".into(),
            vfp_table: 3,
            alq_value: None,
        });
        assert!(network.active());
        assert_eq!(network.uptree_branch("B1").unwrap().uptree_node, "PLAT");
        assert!(network.drop_branch("B1").is_some());
        assert!(!network.active());
    }

    #[test]
    fn test_group_tree() {
        let mut tree = GroupTree::default();
        assert!(tree.has_group("FIELD"));
        assert_eq!(tree.set_parent("G1", "FIELD"), None);
        tree.set_parent("G2", "FIELD");
        assert_eq!(tree.children("FIELD").count(), 2);
        assert_eq!(tree.set_parent("G2", "G1"), Some("FIELD".to_string()));
        assert_eq!(tree.parent("G2"), Some("G1"));
    }
}
