//! Restart and report output configuration from RPTRST, RPTSCHED and RPTSOL
//!
//! Both keywords accept either a list of mnemonics (`BASIC=2 FREQ=3 FIP`) or
//! the older positional list of integers. Mixing the two styles is governed by
//! the [`ErrorClass::RptMixedStyle`] policy and unknown mnemonics by
//! [`ErrorClass::RptUnknownMnemonic`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::context::{ErrorClass, ErrorGuard, ParseContext};
use crate::deck::DeckKeyword;
use crate::error::{HandlerError, InputError, ValueError};

const SCHED_INTEGER_KEYWORDS: [&str; 79] = [
    "PRES", "SOIL", "SWAT", "SGAS", "RS", "RV", "RESTART", "FIP", "WELLS", "VFPPROD", "SUMMARY",
    "CPU", "AQUCT", "WELSPECS", "NEWTON", "POILD", "PWAT", "PWATD", "PGAS", "PGASD", "FIPVE",
    "WOC", "GOC", "WOCDIFF", "GOCDIFF", "WOCGOC", "ODGAS", "ODWAT", "GDOWAT", "WDOGAS", "OILAPI",
    "FIPITR", "TBLK", "PBLK", "SALT", "PLYADS", "RK", "FIPSALT", "TUNING", "GI", "ROCKC",
    "SPENWAT", "FIPSOL", "SURFBLK", "SURFADS", "FIPSURF", "TRADS", "VOIL", "VWAT", "VGAS", "DENO",
    "DENW", "DENG", "GASCONC", "PB", "PD", "KRW", "KRO", "KRG", "MULT", "UNKNOWN", "UNKNOWN",
    "FOAM", "FIPFOAM", "TEMP", "FIPTEMP", "POTC", "FOAMADS", "FOAMDCY", "FOAMMOB", "RECOV",
    "FLOOIL", "FLOWAT", "FLOGAS", "SGTRAP", "FIPRESV", "FLOSOL", "KRN", "GRAD",
];

// Positions 22 and 27 are blank; 27 sets both PCOW and PCOG.
const RST_INTEGER_KEYWORDS: [&str; 31] = [
    "BASIC", "FLOWS", "FIP", "POT", "PBPD", "FREQ", "PRES", "VISC", "DEN", "DRAIN", "KRO", "KRW",
    "KRG", "PORO", "NOGRAD", "NORST", "SAVE", "SFREQ", "ALLPROPS", "ROCKC", "SGTRAP", "", "RSSAT",
    "RVSAT", "GIMULT", "SURFBLK", "", "STREAM", "RK", "VELOCITY", "COMPRESS",
];

const PCO_INDEX: usize = 26;

const RPTRST_MNEMONICS: &[&str] = &[
    "ACIP", "ACIS", "ALLPROPS", "BASIC", "BG", "BO", "BW", "CELLINDX", "COMPRESS", "CONV", "DEN",
    "DENG", "DENO", "DENW", "DRAIN", "DRAINAGE", "DYNREG", "FIP", "FLORES", "FLORES-", "FLOWS",
    "FLOWS-", "FREQ", "GIMULT", "HYDH", "HYDHFW", "KRG", "KRO", "KRW", "NOGRAD", "NORST", "NPMREB",
    "PBPD", "PCGW", "PCOG", "PCOW", "PERMREDN", "POIS", "PORO", "PORV", "POT", "PRES", "RESIDUAL",
    "RFIP", "RK", "ROCKC", "RPORV", "RSSAT", "RSWSAT", "RVSAT", "RVWSAT", "SAVE", "SDENO", "SFIP",
    "SFREQ", "SGTRAP", "SIGM_MOD", "STREAM", "SURFBLK", "TEMP", "TRAS", "VELGAS", "VELOCITY",
    "VELOIL", "VELWAT", "VGAS", "VISC", "VOIL", "VWAT",
];

const RPTRST_COMPOSITIONAL_MNEMONICS: &[&str] = &[
    "AIM", "ALSURF", "ALSTML", "AMF", "AQSP", "AQPH", "AREAC", "ASPADS", "ASPDOT", "ASPENT",
    "ASPFLO", "ASPFLT", "ASPFRD", "ASPKDM", "ASPLIM", "ASPLUG", "ASPRET", "ASPREW", "ASPVEL",
    "ASPVOM", "BASIC", "BFORO", "BG", "BGAS", "BO", "BOIL", "BSOL", "BTFORG", "BTFORO", "BW",
    "BWAT", "CELLINDX", "CFL", "CGAS", "COLR", "COILR", "CONV", "DENG", "DENO", "DENS", "DENW",
    "DYNREG", "ENERGY", "ESALTS", "ESALTP", "FFACTG", "FFACTO", "FFORO", "FIP", "FLOE", "FLOGAS",
    "FLOOIL", "FLOWAT", "FLORES", "FLORES-", "FMISC", "FOAM", "FOAMST", "FOAMCNM", "FOAMMOB", "FPC",
    "FREQ", "FUGG", "FUGO", "GASPOT", "HGAS", "HOIL", "HSOL", "HWAT", "JV", "KRG", "KRO", "KRW",
    "KRGDM", "KRODM", "KRWDM", "LGLCWAT", "LGLCHC", "MLSC", "MWAT", "NCNG", "NCNO", "NPMREB",
    "OILPOT", "PART", "PCGW", "PCOG", "PCOW", "PERM_MDX", "PERM_MDY", "PERM_MDZ", "PERM_MOD",
    "PGAS", "PKRG", "PKRGR", "PKRO", "PKRORG", "PKRORW", "PKRW", "PKRWR", "POIL", "POLY", "POLYVM",
    "PORV", "PORV_MOD", "PPCG", "PPCW", "PRES_EFF", "PRES", "PRESMIN", "PRESSURE", "PSAT", "PSGCR",
    "PSGL", "PSGU", "PSOGCR", "PSOWCR", "PSWCR", "PSWL", "PSWU", "PVDPH", "PWAT", "RATP", "RATS",
    "RATT", "REAC", "RESTART", "RFIP", "ROCKC", "ROMLS", "RPORV", "RS", "RSSAT", "RSW", "RV",
    "RVSAT", "SFIP", "SFIPGAS", "SFIPOIL", "SFIPWAT", "SFOIL", "SFSOL", "SGAS", "SGASMAX", "SGCRH",
    "SGTRH", "SGTRAP", "SIGM_MOD", "SMF", "SMMULT", "SOIL", "SOILM", "SOILMAX", "SOILR", "SOLADS",
    "SOLADW", "SOLWET", "SSFRAC", "SSOLID", "STATE", "STEN", "SUBG", "SURF", "SURFCNM", "SURFKR",
    "SURFCP", "SURFST", "SWAT", "SWATMIN", "TCBULK", "TCMULT", "TEMP", "TOTCOMP", "TREACM", "TSUB",
    "VGAS", "VOIL", "VMF", "VWAT", "WATPOT", "XFW", "XGAS", "XMF", "XWAT", "YFW", "YMF", "ZMF",
];

const RPTSCHED_MNEMONICS: &[&str] = &[
    "ALKALINE", "ANIONS", "AQUCT", "AQUFET", "AQUFETP", "BFORG", "CATIONS", "CPU", "DENG", "DENO",
    "DENW", "ESALPLY", "ESALSUR", "FFORG", "FIP", "FIPFOAM", "FIPHEAT", "FIPRESV", "FIPSALT",
    "FIPSOL", "FIPSURF", "FIPTEMP", "FIPTR", "FIPVE", "FLOGAS", "FLOOIL", "FLOSOL", "FLOWAT",
    "FMISC", "FOAM", "FOAMADS", "FOAMCNM", "FOAMDCY", "FOAMMOB", "GASCONC", "GASSATC", "GDOWAT",
    "GI", "GOC", "GOCDIFF", "GRAD", "KRG", "KRN", "KRO", "KRW", "MULT", "NEWTON", "NOTHING",
    "NPMREB", "ODGAS", "ODWAT", "OILAPI", "PB", "PBLK", "PBU", "PD", "PDEW", "PGAS", "PGASD",
    "PLYADS", "POIL", "POILD", "POLYMER", "POTC", "POTG", "POTO", "POTW", "PRES", "PRESSURE",
    "PWAT", "PWATD", "RECOV", "RESTART", "ROCKC", "RS", "RSSAT", "RV", "RVSAT", "SALT", "SGAS",
    "SGTRAP", "SIGM_MOD", "SOIL", "SSOL", "SUMMARY", "SURFADS", "SURFBLK", "SWAT", "TBLK", "TEMP",
    "TRACER", "TRADS", "TRDCY", "TUNING", "VFPPROD", "VGAS", "VOIL", "VWAT", "WDOGAS", "WELLS",
    "WELSPECL", "WELSPECS", "WOC", "WOCDIFF", "WOCGOC",
];

const ALLPROPS_EXPANSION: [&str; 10] = [
    "BG", "BO", "BW", "KRG", "KRO", "KRW", "VOIL", "VGAS", "VWAT", "DEN",
];

type Mnemonics = BTreeMap<String, i32>;

fn is_int(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) if first == '-' || first.is_ascii_digit() => chars.all(|c| c.is_ascii_digit()),
        _ => false,
    }
}

fn parse_int(token: &str) -> Result<i32, ValueError> {
    token
        .trim()
        .parse()
        .map_err(|_| ValueError::new("mnemonic value", token))
}

fn rptsched_integer(ints: &[i32]) -> Mnemonics {
    SCHED_INTEGER_KEYWORDS
        .iter()
        .zip(ints)
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}

fn rptrst_integer(ints: &[i32]) -> Mnemonics {
    let mut mnemonics = Mnemonics::new();
    let size = ints.len().min(RST_INTEGER_KEYWORDS.len());

    // BASIC=0 in the integer form means "leave unchanged" unless the list is long.
    let first = if size >= PCO_INDEX || ints.first().is_some_and(|basic| *basic != 0) {
        0
    } else {
        1
    };
    for index in first..size.min(PCO_INDEX) {
        mnemonics.insert(RST_INTEGER_KEYWORDS[index].to_string(), ints[index]);
    }
    for index in PCO_INDEX + 1..size {
        mnemonics.insert(RST_INTEGER_KEYWORDS[index].to_string(), ints[index]);
    }
    if ints.len() > PCO_INDEX {
        mnemonics.insert("PCOW".to_string(), ints[PCO_INDEX]);
        mnemonics.insert("PCOG".to_string(), ints[PCO_INDEX]);
    }
    mnemonics.remove("");
    mnemonics
}

/// Parse the token list of a report keyword into mnemonic values
fn parse_mnemonics(
    keyword: &DeckKeyword,
    parse_context: &ParseContext,
    errors: &mut ErrorGuard,
    is_mnemonic: impl Fn(&str) -> bool,
    integer_mnemonics: impl Fn(&[i32]) -> Mnemonics,
) -> Result<Mnemonics, HandlerError> {
    let tokens = keyword.string_data()?;
    let any_int = tokens.iter().any(|t| is_int(t));
    let all_int = tokens.iter().all(|t| is_int(t));

    if all_int {
        let ints = tokens
            .iter()
            .map(|t| parse_int(t))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(integer_mnemonics(&ints));
    }

    let mut items: Vec<String> = Vec::new();
    if any_int {
        let location = keyword.location();
        parse_context.handle_error(
            ErrorClass::RptMixedStyle,
            "Error in keyword {keyword}--mixing mnemonics and integers is not permitted\nIn {file} line {line}.",
            location,
            errors,
        )?;

        // Reassemble "NAME", "=", "3" triples into NAME=3.
        let problem = || {
            InputError::new(
                InputError::format("Problem processing {keyword}\nIn {file} line {line}.", location),
                location.clone(),
            )
        };
        let mut stack: Vec<String> = Vec::new();
        for token in &tokens {
            if !is_int(token) {
                stack.push(token.clone());
                continue;
            }
            if stack.len() < 2 || stack.last().map(String::as_str) != Some("=") {
                return Err(problem().into());
            }
            stack.pop();
            let mnemonic = stack.pop().ok_or_else(problem)?;
            let mut merged = std::mem::take(&mut stack);
            merged.append(&mut items);
            items = merged;
            items.push(format!("{}={}", mnemonic, token));
        }
        stack.append(&mut items);
        items = stack;
    } else {
        items = tokens;
    }

    let mut mnemonics = Mnemonics::new();
    for mnemonic in &items {
        let sep = mnemonic.find(|c| c == '=' || c == ' ');
        let base = &mnemonic[..sep.unwrap_or(mnemonic.len())];
        if !is_mnemonic(base) {
            let template = format!(
                "Error in keyword {{keyword}}, unrecognized mnemonic {}\nIn {{file}} line {{line}}.",
                base
            );
            parse_context.handle_error(
                ErrorClass::RptUnknownMnemonic,
                &template,
                keyword.location(),
                errors,
            )?;
            continue;
        }

        let value = match sep {
            Some(pos) => {
                let rest = mnemonic[pos..].trim_start_matches(|c| c == '=' || c == ' ');
                if rest.is_empty() {
                    1
                } else {
                    parse_int(rest)?
                }
            }
            None => 1,
        };
        mnemonics.entry(base.to_string()).or_insert(value);
    }
    Ok(mnemonics)
}

/// Restart file output controls carried from step to step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RstConfig {
    /// `None` means the decision depends on the output frequency
    pub write_rst_file: Option<bool>,
    pub keywords: BTreeMap<String, i32>,
    pub basic: Option<i32>,
    pub freq: Option<i32>,
    pub save: bool,
    pub compositional: bool,
    pub solution_only_keywords: BTreeSet<String>,
}

crate::persist_fields!(RstConfig {
    write_rst_file,
    keywords,
    basic,
    freq,
    save,
    compositional,
    solution_only_keywords,
});

impl Default for RstConfig {
    fn default() -> Self {
        Self {
            write_rst_file: Some(false),
            keywords: BTreeMap::new(),
            basic: None,
            freq: None,
            save: false,
            compositional: false,
            solution_only_keywords: BTreeSet::new(),
        }
    }
}

impl RstConfig {
    /// Build the configuration from the RPTRST and RPTSOL keywords of the
    /// SOLUTION section
    pub fn from_solution(
        keywords: &[DeckKeyword],
        compositional: bool,
        parse_context: &ParseContext,
        errors: &mut ErrorGuard,
    ) -> Result<Self, HandlerError> {
        let mut config = Self {
            write_rst_file: Some(true),
            compositional,
            ..Self::default()
        };
        for keyword in keywords {
            match keyword.name() {
                "RPTRST" => {
                    config.handle_rptrst(keyword, parse_context, errors, true)?;
                    if config.basic == Some(0) {
                        config.write_rst_file = Some(false);
                    }
                }
                "RPTSOL" => config.handle_rptsol(keyword, parse_context, errors)?,
                _ => {}
            }
        }
        Ok(config)
    }

    /// Derive the first SCHEDULE section configuration from the SOLUTION one
    pub fn first(solution: &RstConfig) -> Self {
        let mut config = solution.clone();
        config.solution_only_keywords.clear();
        for keyword in &solution.solution_only_keywords {
            config.keywords.remove(keyword);
        }
        config.write_rst_file = match config.basic {
            None => Some(false),
            Some(basic) => Self::write_for_basic(basic),
        };
        config
    }

    /// Apply an RPTRST or RPTSCHED keyword
    pub fn update(
        &mut self,
        keyword: &DeckKeyword,
        parse_context: &ParseContext,
        errors: &mut ErrorGuard,
    ) -> Result<(), HandlerError> {
        match keyword.name() {
            "RPTRST" => self.handle_rptrst(keyword, parse_context, errors, false),
            "RPTSCHED" => self.handle_rptsched(keyword, parse_context, errors),
            other => Err(HandlerError::internal(format!(
                "restart configuration cannot be updated from {}",
                other
            ))),
        }
    }

    fn write_for_basic(basic: i32) -> Option<bool> {
        match basic {
            0 => Some(false),
            1 | 2 => Some(true),
            _ => None,
        }
    }

    fn update_schedule(&mut self, basic: Option<i32>, freq: Option<i32>) {
        if basic.is_some() {
            self.basic = basic;
        }
        if freq.is_some() {
            self.freq = freq;
        }
        if let Some(basic) = self.basic {
            self.write_rst_file = Self::write_for_basic(basic);
        }
    }

    fn handle_rptrst(
        &mut self,
        keyword: &DeckKeyword,
        parse_context: &ParseContext,
        errors: &mut ErrorGuard,
        in_solution: bool,
    ) -> Result<(), HandlerError> {
        let known: &[&str] = if self.compositional {
            RPTRST_COMPOSITIONAL_MNEMONICS
        } else {
            RPTRST_MNEMONICS
        };
        let mut mnemonics = parse_mnemonics(
            keyword,
            parse_context,
            errors,
            |m| known.contains(&m),
            rptrst_integer,
        )?;

        let basic = mnemonics.remove("BASIC");
        let freq = mnemonics.remove("FREQ");
        if let Some(value) = mnemonics.remove("ALLPROPS") {
            for name in ALLPROPS_EXPANSION {
                mnemonics.insert(name.to_string(), value);
            }
        }

        self.update_schedule(basic, freq);
        for (name, value) in &mnemonics {
            self.keywords.insert(name.clone(), *value);
        }
        if in_solution {
            for name in mnemonics.keys() {
                self.solution_only_keywords.remove(name);
            }
        }
        Ok(())
    }

    fn handle_rptsched(
        &mut self,
        keyword: &DeckKeyword,
        parse_context: &ParseContext,
        errors: &mut ErrorGuard,
    ) -> Result<(), HandlerError> {
        let mut mnemonics = parse_mnemonics(
            keyword,
            parse_context,
            errors,
            |m| RPTSCHED_MNEMONICS.contains(&m),
            rptsched_integer,
        )?;

        if mnemonics.remove("NOTHING").is_some() {
            self.basic = None;
            self.keywords.clear();
        }

        if self.basic.unwrap_or(2) <= 2 {
            if let Some(restart) = mnemonics.remove("RESTART") {
                self.update_schedule(Some(restart.min(2)), Some(1));
            }
        }

        for (name, value) in mnemonics {
            self.keywords.insert(name, value);
        }
        Ok(())
    }

    fn handle_rptsol(
        &mut self,
        keyword: &DeckKeyword,
        parse_context: &ParseContext,
        errors: &mut ErrorGuard,
    ) -> Result<(), HandlerError> {
        let mut mnemonics = parse_mnemonics(
            keyword,
            parse_context,
            errors,
            |m| RPTSCHED_MNEMONICS.contains(&m),
            rptsched_integer,
        )?;

        let request_restart = mnemonics.remove("RESTART").is_some_and(|r| r > 1);
        self.write_rst_file = Some(self.write_rst_file == Some(true) || request_restart);

        if request_restart {
            // Solution mnemonics win over anything already present.
            for (name, value) in mnemonics {
                self.solution_only_keywords.insert(name.clone());
                self.keywords.insert(name, value);
            }
        }
        Ok(())
    }

    /// Value of a restart mnemonic, zero when not requested
    pub fn keyword(&self, name: &str) -> i32 {
        self.keywords.get(name).copied().unwrap_or(0)
    }
}

/// Report output mnemonics from RPTSCHED
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RptConfig {
    mnemonics: BTreeMap<String, i32>,
}

crate::persist_fields!(RptConfig { mnemonics });

impl RptConfig {
    /// Build the report configuration from a RPTSCHED keyword
    ///
    /// Policy checks already happened when the restart configuration consumed
    /// the same keyword, so this pass is lenient.
    pub fn from_keyword(keyword: &DeckKeyword) -> Result<Self, HandlerError> {
        let lenient = ParseContext::permissive();
        let mut errors = ErrorGuard::default();
        let mnemonics = parse_mnemonics(
            keyword,
            &lenient,
            &mut errors,
            |m| RPTSCHED_MNEMONICS.contains(&m),
            rptsched_integer,
        )?;
        Ok(Self {
            mnemonics: mnemonics.into_iter().filter(|(_, v)| *v != 0).collect(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.mnemonics.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.mnemonics.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.mnemonics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mnemonics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Action;
    use crate::deck::{DeckItem, DeckRecord};

    fn rpt(name: &str, tokens: &[&str]) -> DeckKeyword {
        DeckKeyword::new(
            name,
            vec![DeckRecord::default().with(DeckItem::strings("MNEMONIC_LIST", tokens))],
        )
    }

    fn update(config: &mut RstConfig, keyword: &DeckKeyword) -> Result<(), HandlerError> {
        config.update(keyword, &ParseContext::default(), &mut ErrorGuard::default())
    }

    #[test]
    fn test_basic_and_freq() {
        let mut config = RstConfig::default();
        update(&mut config, &rpt("RPTRST", &["BASIC=3", "FREQ=2", "FIP"])).unwrap();
        assert_eq!(config.basic, Some(3));
        assert_eq!(config.freq, Some(2));
        assert_eq!(config.write_rst_file, None);
        assert_eq!(config.keyword("FIP"), 1);
        assert!(!config.keywords.contains_key("BASIC"));
    }

    #[test]
    fn test_basic_zero_disables_output() {
        let mut config = RstConfig::default();
        update(&mut config, &rpt("RPTRST", &["BASIC=2"])).unwrap();
        assert_eq!(config.write_rst_file, Some(true));
        update(&mut config, &rpt("RPTRST", &["BASIC=0"])).unwrap();
        assert_eq!(config.write_rst_file, Some(false));
    }

    #[test]
    fn test_integer_style_skips_zero_basic() {
        let mut config = RstConfig::default();
        update(&mut config, &rpt("RPTRST", &["0", "1", "0", "1"])).unwrap();
        assert_eq!(config.basic, None);
        assert_eq!(config.keyword("FLOWS"), 1);
        assert_eq!(config.keyword("POT"), 1);
    }

    #[test]
    fn test_allprops_expands() {
        let mut config = RstConfig::default();
        update(&mut config, &rpt("RPTRST", &["ALLPROPS=2"])).unwrap();
        assert!(!config.keywords.contains_key("ALLPROPS"));
        assert_eq!(config.keyword("VOIL"), 2);
        assert_eq!(config.keyword("DEN"), 2);
    }

    #[test]
    fn test_rptsched_restart_maps_to_basic() {
        let mut config = RstConfig::default();
        update(&mut config, &rpt("RPTSCHED", &["RESTART=3", "FIP"])).unwrap();
        assert_eq!(config.basic, Some(2));
        assert_eq!(config.freq, Some(1));
        assert_eq!(config.write_rst_file, Some(true));

        update(&mut config, &rpt("RPTSCHED", &["NOTHING"])).unwrap();
        assert_eq!(config.basic, None);
        assert!(config.keywords.is_empty());
    }

    #[test]
    fn test_mixed_style_reassembles_assignments() {
        let permissive = ParseContext::permissive();
        let mut errors = ErrorGuard::default();
        let mut config = RstConfig::default();
        config
            .update(&rpt("RPTRST", &["BASIC", "=", "2", "FIP"]), &permissive, &mut errors)
            .unwrap();
        assert_eq!(config.basic, Some(2));
        assert_eq!(config.keyword("FIP"), 1);
        assert_eq!(errors.warnings().len(), 1);
    }

    #[test]
    fn test_mixed_style_rejected_by_strict_policy() {
        let strict = ParseContext::builder()
            .with_action(ErrorClass::RptMixedStyle, Action::Throw)
            .build();
        let mut config = RstConfig::default();
        let result = config.update(
            &rpt("RPTRST", &["BASIC", "=", "2"]),
            &strict,
            &mut ErrorGuard::default(),
        );
        assert!(matches!(result, Err(HandlerError::Input(_))));
    }

    #[test]
    fn test_unknown_mnemonic_is_skipped_when_permitted() {
        let permissive = ParseContext::permissive();
        let mut errors = ErrorGuard::default();
        let mut config = RstConfig::default();
        config
            .update(&rpt("RPTRST", &["BOGUS", "FIP"]), &permissive, &mut errors)
            .unwrap();
        assert!(!config.keywords.contains_key("BOGUS"));
        assert_eq!(config.keyword("FIP"), 1);
    }

    #[test]
    fn test_first_drops_solution_only_keywords() {
        let mut errors = ErrorGuard::default();
        let solution = RstConfig::from_solution(
            &[rpt("RPTSOL", &["RESTART=2", "FIP"]), rpt("RPTRST", &["BASIC=1"])],
            false,
            &ParseContext::default(),
            &mut errors,
        )
        .unwrap();
        assert!(solution.solution_only_keywords.contains("FIP"));

        let first = RstConfig::first(&solution);
        assert!(!first.keywords.contains_key("FIP"));
        assert_eq!(first.write_rst_file, Some(true));
    }

    #[test]
    fn test_wrong_keyword_is_internal() {
        let mut config = RstConfig::default();
        assert!(matches!(
            update(&mut config, &rpt("RPTSOL", &["FIP"])),
            Err(HandlerError::Internal(_))
        ));
    }

    #[test]
    fn test_rpt_config() {
        let config = RptConfig::from_keyword(&rpt("RPTSCHED", &["FIP=2", "WELLS=0", "CPU"])).unwrap();
        assert_eq!(config.get("FIP"), Some(2));
        assert!(!config.contains("WELLS"));
        assert!(config.contains("CPU"));
    }
}
