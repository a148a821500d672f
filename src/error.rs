//! Error types for the schedule engine

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

use crate::types::KeywordLocation;

/// Marker placed in front of the message when an engine invariant failure is
/// re-raised as an input error.
pub const INTERNAL_ERROR_PREFIX: &str = "Internal error: ";

/// Boxed cause attached to wrapped errors.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Timeline error: {0}")]
    Timeline(#[from] TimelineError),

    #[error("Table error: {0}")]
    Table(#[from] TableError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Malformed or unsupported keyword usage.
///
/// Always carries the location of the offending keyword. When the error was
/// produced by wrapping another failure at the dispatcher boundary, the
/// original failure is available through [`std::error::Error::source`].
#[derive(Debug)]
pub struct InputError {
    message: String,
    location: KeywordLocation,
    source: Option<BoxError>,
}

impl InputError {
    /// Create a new input error for a keyword location
    pub fn new(message: impl Into<String>, location: KeywordLocation) -> Self {
        Self {
            message: message.into(),
            location,
            source: None,
        }
    }

    /// Create an input error that keeps `source` as its nested cause
    pub fn with_source(
        message: impl Into<String>,
        location: KeywordLocation,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            message: message.into(),
            location,
            source: Some(source.into()),
        }
    }

    /// Expand the `{keyword}`, `{file}` and `{line}` placeholders of a message template
    pub fn format(template: &str, location: &KeywordLocation) -> String {
        template
            .replace("{keyword}", &location.keyword)
            .replace("{file}", &location.filename)
            .replace("{line}", &location.lineno.to_string())
    }

    /// The message without location decoration
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Location of the keyword that caused the error
    pub fn location(&self) -> &KeywordLocation {
        &self.location
    }

    /// Whether this error wraps a violated engine invariant
    pub fn is_internal(&self) -> bool {
        self.message.starts_with(INTERNAL_ERROR_PREFIX)
    }
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Problem with keyword {}\nIn {} line {}\n{}",
            self.location.keyword, self.location.filename, self.location.lineno, self.message
        )
    }
}

impl StdError for InputError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// Failure raised inside a keyword handler, classified at the dispatcher boundary.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Input(#[from] InputError),

    /// A violated engine invariant such as an index out of range
    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Deck(#[from] DeckError),

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Table(#[from] TableError),
}

impl HandlerError {
    /// Convenience constructor for invariant violations
    pub fn internal(reason: impl Into<String>) -> Self {
        HandlerError::Internal(reason.into())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeckError {
    #[error("Record has no item named {item}")]
    MissingItem { item: String },

    #[error("Keyword {keyword} has no record {index} (size {size})")]
    MissingRecord { keyword: String, index: usize, size: usize },

    #[error("Item {item} has no value at index {index}")]
    NoValue { item: String, index: usize },

    #[error("Item {item} holds {found}, expected {expected}")]
    TypeMismatch {
        item: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Item {item}: cannot interpret '{value}' as a boolean")]
    NotBool { item: String, value: String },
}

/// Unrecognised text for an enumerated value
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Unknown {kind} string: {value}")]
pub struct ValueError {
    pub kind: &'static str,
    pub value: String,
}

impl ValueError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// A named object that does not exist
#[derive(Debug, Clone, PartialEq, Error)]
#[error("No such {kind}: {name}")]
pub struct LookupError {
    pub kind: &'static str,
    pub name: String,
}

impl LookupError {
    pub fn new(kind: &'static str, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error("Report step {index} out of range, timeline has {len} steps")]
    OutOfRange { index: usize, len: usize },

    #[error("Report step {requested} is not the current step {current}")]
    NotCurrent { requested: usize, current: usize },

    #[error("Checkpoint hash mismatch at step {step}: expected {expected}, got {actual}")]
    HashMismatch {
        step: usize,
        expected: String,
        actual: String,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("A table needs at least two points, got {count}")]
    TooFewPoints { count: usize },

    #[error("Independent and dependent values differ in length: {xs} vs {ys}")]
    LengthMismatch { xs: usize, ys: usize },

    #[error("Independent values must be strictly ascending, violated at position {index}")]
    NotAscending { index: usize },

    #[error("Unknown interpolation type: {0}")]
    UnknownInterpolation(String),

    #[error("Only 1D user defined tables are supported, got {0} dimensions")]
    UnsupportedDimensions(i32),
}

#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("Serialization failed: {reason}")]
    SerializationFailed { reason: String },

    #[error("Deserialization failed: {reason}")]
    DeserializationFailed { reason: String },

    #[error("Unexpected end of buffer: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },

    #[error("Invalid {kind} tag {value}")]
    InvalidTag { kind: &'static str, value: i64 },

    #[error("{0} trailing bytes after unpacking")]
    TrailingBytes(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {what}")]
    Missing { what: &'static str },

    #[error("Invalid configuration: {reason}")]
    Invalid { reason: String },
}
