//! Core data types shared across the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source location of a keyword in the input deck
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct KeywordLocation {
    pub keyword: String,
    pub filename: String,
    pub lineno: usize,
}

impl KeywordLocation {
    /// Create a new keyword location
    pub fn new(keyword: impl Into<String>, filename: impl Into<String>, lineno: usize) -> Self {
        Self {
            keyword: keyword.into(),
            filename: filename.into(),
            lineno,
        }
    }
}

impl fmt::Display for KeywordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} line {})", self.keyword, self.filename, self.lineno)
    }
}

/// Cryptographic hash of a step state or any other checksummed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateHash(pub [u8; 32]);

impl fmt::Display for StateHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// Unit system the deck was written in
///
/// Conversion itself happens in the tokenizer; the engine only carries the tag
/// so that tables which keep input units know what they hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    Metric,
    Field,
    Lab,
    PvtM,
    Input,
}

impl UnitSystem {
    /// Name used in the control language
    pub fn name(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "METRIC",
            UnitSystem::Field => "FIELD",
            UnitSystem::Lab => "LAB",
            UnitSystem::PvtM => "PVT-M",
            UnitSystem::Input => "INPUT",
        }
    }
}

crate::persist_enum!(UnitSystem {
    Metric = 1,
    Field = 2,
    Lab = 3,
    PvtM = 4,
    Input = 5,
});

crate::persist_fields!(KeywordLocation {
    keyword,
    filename,
    lineno,
});
