//! Structured keyword records handed over by the tokenizer
//!
//! The engine never parses text. It receives keywords already split into
//! records of named items, where every value knows whether it was written
//! explicitly or filled in by the language default.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::checksum::{ChecksumSink, Persist, Unpacker};
use crate::error::{DeckError, SerializationError};
use crate::types::KeywordLocation;

/// A single value of an item
///
/// Human readable formats carry the bare value (`3`, `2.5`, `"OPEN"`), binary
/// formats carry the variant tag so they never need to guess the type.
#[derive(Debug, Clone, PartialEq)]
pub enum DeckValue {
    Int(i32),
    Double(f64),
    Str(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BareValue {
    Int(i32),
    Double(f64),
    Str(String),
}

#[derive(Deserialize)]
#[serde(rename = "DeckValue")]
enum TaggedValue {
    Int(i32),
    Double(f64),
    Str(String),
}

impl Serialize for DeckValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            return match self {
                DeckValue::Int(v) => serializer.serialize_i32(*v),
                DeckValue::Double(v) => serializer.serialize_f64(*v),
                DeckValue::Str(v) => serializer.serialize_str(v),
            };
        }
        match self {
            DeckValue::Int(v) => serializer.serialize_newtype_variant("DeckValue", 0, "Int", v),
            DeckValue::Double(v) => serializer.serialize_newtype_variant("DeckValue", 1, "Double", v),
            DeckValue::Str(v) => serializer.serialize_newtype_variant("DeckValue", 2, "Str", v),
        }
    }
}

impl<'de> Deserialize<'de> for DeckValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            return Ok(match BareValue::deserialize(deserializer)? {
                BareValue::Int(v) => DeckValue::Int(v),
                BareValue::Double(v) => DeckValue::Double(v),
                BareValue::Str(v) => DeckValue::Str(v),
            });
        }
        Ok(match TaggedValue::deserialize(deserializer)? {
            TaggedValue::Int(v) => DeckValue::Int(v),
            TaggedValue::Double(v) => DeckValue::Double(v),
            TaggedValue::Str(v) => DeckValue::Str(v),
        })
    }
}

impl DeckValue {
    fn type_name(&self) -> &'static str {
        match self {
            DeckValue::Int(_) => "int",
            DeckValue::Double(_) => "double",
            DeckValue::Str(_) => "string",
        }
    }
}

/// Named item of a record, possibly holding several values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckItem {
    name: String,
    values: Vec<Option<DeckValue>>,
    defaulted: Vec<bool>,
    #[serde(default = "unit_factor")]
    si_factor: f64,
}

fn unit_factor() -> f64 {
    1.0
}

impl DeckItem {
    fn single(name: impl Into<String>, value: Option<DeckValue>, defaulted: bool) -> Self {
        Self {
            name: name.into(),
            values: vec![value],
            defaulted: vec![defaulted],
            si_factor: 1.0,
        }
    }

    /// Create an item with one explicit integer
    pub fn int(name: impl Into<String>, value: i32) -> Self {
        Self::single(name, Some(DeckValue::Int(value)), false)
    }

    /// Create an item with one explicit double
    pub fn double(name: impl Into<String>, value: f64) -> Self {
        Self::single(name, Some(DeckValue::Double(value)), false)
    }

    /// Create an item with one explicit string
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::single(name, Some(DeckValue::Str(value.into())), false)
    }

    /// Create a defaulted item, with the language default if there is one
    pub fn defaulted(name: impl Into<String>, default: Option<DeckValue>) -> Self {
        Self::single(name, default, true)
    }

    /// Create an item with several explicit integers
    pub fn ints(name: impl Into<String>, values: &[i32]) -> Self {
        Self {
            name: name.into(),
            values: values.iter().map(|v| Some(DeckValue::Int(*v))).collect(),
            defaulted: vec![false; values.len()],
            si_factor: 1.0,
        }
    }

    /// Create an item with several explicit doubles
    pub fn doubles(name: impl Into<String>, values: &[f64]) -> Self {
        Self {
            name: name.into(),
            values: values.iter().map(|v| Some(DeckValue::Double(*v))).collect(),
            defaulted: vec![false; values.len()],
            si_factor: 1.0,
        }
    }

    /// Create an item with several explicit strings
    pub fn strings(name: impl Into<String>, values: &[&str]) -> Self {
        Self {
            name: name.into(),
            values: values
                .iter()
                .map(|v| Some(DeckValue::Str((*v).to_string())))
                .collect(),
            defaulted: vec![false; values.len()],
            si_factor: 1.0,
        }
    }

    /// Set the factor converting input units to SI
    pub fn with_si_factor(mut self, factor: f64) -> Self {
        self.si_factor = factor;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of values held by the item
    pub fn size(&self) -> usize {
        self.values.len()
    }

    /// Whether value `index` came from the language default
    pub fn default_applied(&self, index: usize) -> bool {
        self.defaulted.get(index).copied().unwrap_or(true)
    }

    /// Whether value `index` exists at all, explicit or defaulted
    pub fn has_value(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(Some(_)))
    }

    fn value(&self, index: usize) -> Result<&DeckValue, DeckError> {
        match self.values.get(index) {
            Some(Some(value)) => Ok(value),
            _ => Err(DeckError::NoValue {
                item: self.name.clone(),
                index,
            }),
        }
    }

    pub fn get_int(&self, index: usize) -> Result<i32, DeckError> {
        match self.value(index)? {
            DeckValue::Int(v) => Ok(*v),
            other => Err(self.mismatch("int", other)),
        }
    }

    /// Raw value in input units; integers widen to doubles
    pub fn get_double(&self, index: usize) -> Result<f64, DeckError> {
        match self.value(index)? {
            DeckValue::Double(v) => Ok(*v),
            DeckValue::Int(v) => Ok(f64::from(*v)),
            other => Err(self.mismatch("double", other)),
        }
    }

    /// Value converted to SI units
    pub fn get_si_double(&self, index: usize) -> Result<f64, DeckError> {
        Ok(self.get_double(index)? * self.si_factor)
    }

    /// String value with surrounding blanks and quotes removed
    pub fn get_string(&self, index: usize) -> Result<String, DeckError> {
        match self.value(index)? {
            DeckValue::Str(s) => Ok(s.trim().trim_matches('\'').trim().to_string()),
            other => Err(self.mismatch("string", other)),
        }
    }

    /// Any value rendered as text, for keywords that take free-form token lists
    pub fn get_raw_string(&self, index: usize) -> Result<String, DeckError> {
        Ok(match self.value(index)? {
            DeckValue::Int(v) => v.to_string(),
            DeckValue::Double(v) => v.to_string(),
            DeckValue::Str(s) => s.trim().trim_matches('\'').trim().to_string(),
        })
    }

    /// All values converted to SI units
    pub fn get_si_double_data(&self) -> Result<Vec<f64>, DeckError> {
        (0..self.size()).map(|i| self.get_si_double(i)).collect()
    }

    /// All string values
    pub fn get_string_data(&self) -> Result<Vec<String>, DeckError> {
        (0..self.size()).map(|i| self.get_string(i)).collect()
    }

    /// Interpret a yes/no style string value
    pub fn to_bool(&self, index: usize) -> Result<bool, DeckError> {
        let text = self.get_string(index)?.to_uppercase();
        match text.as_str() {
            "Y" | "YES" | "T" | "TRUE" | "1" => Ok(true),
            "N" | "NO" | "F" | "FALSE" | "0" => Ok(false),
            _ => Err(DeckError::NotBool {
                item: self.name.clone(),
                value: text,
            }),
        }
    }

    fn mismatch(&self, expected: &'static str, found: &DeckValue) -> DeckError {
        DeckError::TypeMismatch {
            item: self.name.clone(),
            expected,
            found: found.type_name(),
        }
    }
}

/// Ordered list of named items
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DeckRecord {
    items: Vec<DeckItem>,
}

impl DeckRecord {
    /// Create a new record from its items
    pub fn new(items: Vec<DeckItem>) -> Self {
        Self { items }
    }

    /// Append an item
    pub fn with(mut self, item: DeckItem) -> Self {
        self.items.push(item);
        self
    }

    /// Look up an item by name
    pub fn item(&self, name: &str) -> Result<&DeckItem, DeckError> {
        self.items
            .iter()
            .find(|item| item.name == name)
            .ok_or_else(|| DeckError::MissingItem {
                item: name.to_string(),
            })
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }

    pub fn items(&self) -> &[DeckItem] {
        &self.items
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }
}

/// A keyword occurrence with its records and source location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckKeyword {
    location: KeywordLocation,
    records: Vec<DeckRecord>,
}

impl DeckKeyword {
    /// Create a new keyword at an unspecified location
    pub fn new(name: impl Into<String>, records: Vec<DeckRecord>) -> Self {
        Self {
            location: KeywordLocation::new(name, "<deck>", 0),
            records,
        }
    }

    /// Set the source position of the keyword
    pub fn at(mut self, filename: impl Into<String>, lineno: usize) -> Self {
        self.location.filename = filename.into();
        self.location.lineno = lineno;
        self
    }

    pub fn name(&self) -> &str {
        &self.location.keyword
    }

    pub fn location(&self) -> &KeywordLocation {
        &self.location
    }

    pub fn records(&self) -> &[DeckRecord] {
        &self.records
    }

    /// Fetch record `index`
    pub fn record(&self, index: usize) -> Result<&DeckRecord, DeckError> {
        self.records.get(index).ok_or_else(|| DeckError::MissingRecord {
            keyword: self.name().to_string(),
            index,
            size: self.records.len(),
        })
    }

    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every value of every item as text, in record order
    pub fn string_data(&self) -> Result<Vec<String>, DeckError> {
        let mut data = Vec::new();
        for record in &self.records {
            for item in record.items() {
                for index in 0..item.size() {
                    if item.has_value(index) {
                        data.push(item.get_raw_string(index)?);
                    }
                }
            }
        }
        Ok(data)
    }
}

/// Ordered keyword stream of one schedule section
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Deck {
    keywords: Vec<DeckKeyword>,
}

impl Deck {
    pub fn new(keywords: Vec<DeckKeyword>) -> Self {
        Self { keywords }
    }

    /// Load a tokenized deck from its JSON form
    pub fn from_json(text: &str) -> Result<Self, SerializationError> {
        serde_json::from_str(text).map_err(|e| SerializationError::DeserializationFailed {
            reason: format!("Deck JSON parse failed: {}", e),
        })
    }

    pub fn push(&mut self, keyword: DeckKeyword) {
        self.keywords.push(keyword);
    }

    pub fn keywords(&self) -> &[DeckKeyword] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl FromIterator<DeckKeyword> for Deck {
    fn from_iter<I: IntoIterator<Item = DeckKeyword>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Persist for DeckValue {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        match self {
            DeckValue::Int(v) => {
                sink.put(0);
                v.checksum(sink);
            }
            DeckValue::Double(v) => {
                sink.put(1);
                v.checksum(sink);
            }
            DeckValue::Str(v) => {
                sink.put(2);
                v.checksum(sink);
            }
        }
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        match self {
            DeckValue::Int(v) => {
                buf.push(0);
                v.pack(buf);
            }
            DeckValue::Double(v) => {
                buf.push(1);
                v.pack(buf);
            }
            DeckValue::Str(v) => {
                buf.push(2);
                v.pack(buf);
            }
        }
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        match reader.plain::<u8>()? {
            0 => Ok(DeckValue::Int(i32::unpack(reader)?)),
            1 => Ok(DeckValue::Double(f64::unpack(reader)?)),
            2 => Ok(DeckValue::Str(String::unpack(reader)?)),
            other => Err(SerializationError::InvalidTag {
                kind: "deck value",
                value: i64::from(other),
            }),
        }
    }
}

crate::persist_fields!(DeckItem {
    name,
    values,
    defaulted,
    si_factor,
});

crate::persist_fields!(DeckRecord { items });

crate::persist_fields!(DeckKeyword { location, records });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flags() {
        let explicit = DeckItem::double("TSINIT", 2.0);
        let with_default = DeckItem::defaulted("TSMAXZ", Some(DeckValue::Double(365.0)));
        let without_default = DeckItem::defaulted("TMAXWC", None);

        assert!(!explicit.default_applied(0));
        assert!(with_default.default_applied(0));
        assert!(with_default.has_value(0));
        assert!(without_default.default_applied(0));
        assert!(!without_default.has_value(0));
        assert!(without_default.get_double(0).is_err());
    }

    #[test]
    fn test_si_conversion() {
        let item = DeckItem::double("STEP", 10.0).with_si_factor(86400.0);
        assert_eq!(item.get_double(0).unwrap(), 10.0);
        assert_eq!(item.get_si_double(0).unwrap(), 864000.0);
    }

    #[test]
    fn test_int_widens_to_double() {
        let item = DeckItem::int("N", 3);
        assert_eq!(item.get_double(0).unwrap(), 3.0);
        assert!(matches!(
            DeckItem::double("X", 1.0).get_int(0),
            Err(DeckError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_string_trimming_and_bool() {
        let item = DeckItem::string("FLAG", " 'YES' ");
        assert_eq!(item.get_string(0).unwrap(), "YES");
        assert!(item.to_bool(0).unwrap());
        assert!(DeckItem::string("FLAG", "maybe").to_bool(0).is_err());
    }

    #[test]
    fn test_record_lookup() {
        let record = DeckRecord::default().with(DeckItem::int("A", 1));
        assert!(record.item("A").is_ok());
        assert!(matches!(
            record.item("B"),
            Err(DeckError::MissingItem { .. })
        ));
    }

    #[test]
    fn test_keyword_location() {
        let kw = DeckKeyword::new("TUNING", vec![]).at("CASE.DATA", 42);
        assert_eq!(kw.name(), "TUNING");
        assert_eq!(kw.location().lineno, 42);
        assert!(kw.record(0).is_err());
    }

    #[test]
    fn test_string_data_spans_records() {
        let kw = DeckKeyword::new(
            "RPTRST",
            vec![DeckRecord::default().with(DeckItem::strings("MNEMONIC_LIST", &["BASIC=2", "FREQ=3"]))],
        );
        assert_eq!(kw.string_data().unwrap(), vec!["BASIC=2", "FREQ=3"]);

        let ints = DeckKeyword::new(
            "RPTRST",
            vec![DeckRecord::default().with(DeckItem::ints("MNEMONIC_LIST", &[1, 0, 2]))],
        );
        assert_eq!(ints.string_data().unwrap(), vec!["1", "0", "2"]);
    }

    #[test]
    fn test_deck_from_json() {
        let text = r#"{"keywords":[{"location":{"keyword":"NUPCOL","filename":"A.DATA","lineno":3},
            "records":[{"items":[{"name":"NUM_ITER","values":[4],"defaulted":[false]}]}]}]}"#;
        let deck = Deck::from_json(text).unwrap();
        assert_eq!(deck.len(), 1);
        let item = deck.keywords()[0].record(0).unwrap().item("NUM_ITER").unwrap();
        assert_eq!(item.get_int(0).unwrap(), 4);
        assert!(Deck::from_json("{").is_err());
    }
}
