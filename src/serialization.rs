//! Pluggable serialization support for step snapshots
//!
//! Two paths exist. [`pack`] and [`unpack`] use the field traversal of
//! [`Persist`] and are what restart checkpoints and hashing rely on. The
//! [`StateSerializer`] backends go through serde and are meant for exporting
//! snapshots to other tools.

use serde::{de::DeserializeOwned, Serialize};

use crate::checksum::{Persist, Unpacker};
use crate::error::SerializationError;

/// Pack a value with its declared field traversal
pub fn pack<T: Persist>(value: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    value.pack(&mut buf);
    buf
}

/// Unpack a value, rejecting trailing bytes
pub fn unpack<T: Persist>(bytes: &[u8]) -> Result<T, SerializationError> {
    let mut reader = Unpacker::new(bytes);
    let value = T::unpack(&mut reader)?;
    reader.finish()?;
    Ok(value)
}

/// Trait for pluggable serde serialization
pub trait StateSerializer: Send + Sync {
    /// Serialize a value to bytes
    fn serialize<S: Serialize>(&self, value: &S) -> Result<Vec<u8>, SerializationError>;

    /// Deserialize a value from bytes
    fn deserialize<S: DeserializeOwned>(&self, bytes: &[u8]) -> Result<S, SerializationError>;

    /// Get the name of this serialization method
    fn name(&self) -> &str;

    /// Get the version of this serialization method
    fn version(&self) -> &str;
}

/// Bincode serialization backend
#[derive(Debug, Clone, Default)]
pub struct BincodeSerializer;

impl BincodeSerializer {
    /// Create a new bincode serializer
    pub fn new() -> Self {
        Self
    }
}

impl StateSerializer for BincodeSerializer {
    fn serialize<S: Serialize>(&self, value: &S) -> Result<Vec<u8>, SerializationError> {
        bincode::serialize(value).map_err(|e| SerializationError::SerializationFailed {
            reason: format!("Bincode serialization failed: {}", e),
        })
    }

    fn deserialize<S: DeserializeOwned>(&self, bytes: &[u8]) -> Result<S, SerializationError> {
        bincode::deserialize(bytes).map_err(|e| SerializationError::DeserializationFailed {
            reason: format!("Bincode deserialization failed: {}", e),
        })
    }

    fn name(&self) -> &str {
        "bincode"
    }

    fn version(&self) -> &str {
        "1.3"
    }
}

/// JSON serialization backend
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Create a new JSON serializer
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Create a new JSON serializer with pretty printing
    pub fn new_pretty() -> Self {
        Self { pretty: true }
    }
}

impl StateSerializer for JsonSerializer {
    fn serialize<S: Serialize>(&self, value: &S) -> Result<Vec<u8>, SerializationError> {
        let result = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };

        result.map_err(|e| SerializationError::SerializationFailed {
            reason: format!("JSON serialization failed: {}", e),
        })
    }

    fn deserialize<S: DeserializeOwned>(&self, bytes: &[u8]) -> Result<S, SerializationError> {
        serde_json::from_slice(bytes).map_err(|e| SerializationError::DeserializationFailed {
            reason: format!("JSON deserialization failed: {}", e),
        })
    }

    fn name(&self) -> &str {
        "json"
    }

    fn version(&self) -> &str {
        "1.0"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        nupcol: i32,
        name: String,
    }

    crate::persist_fields!(Sample { nupcol, name });

    fn sample() -> Sample {
        Sample {
            nupcol: 12,
            name: "OP_1".to_string(),
        }
    }

    #[test]
    fn test_pack_unpack() {
        let bytes = pack(&sample());
        assert_eq!(unpack::<Sample>(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_unpack_rejects_trailing_bytes() {
        let mut bytes = pack(&sample());
        bytes.push(0);
        assert!(matches!(
            unpack::<Sample>(&bytes),
            Err(SerializationError::TrailingBytes(1))
        ));
    }

    #[test]
    fn test_bincode_serializer() {
        let serializer = BincodeSerializer::new();
        let bytes = serializer.serialize(&sample()).unwrap();
        let back: Sample = serializer.deserialize(&bytes).unwrap();
        assert_eq!(back, sample());
    }

    fn step_with_geo_keyword() -> crate::state::StepState {
        use chrono::{TimeZone, Utc};

        use crate::deck::{DeckItem, DeckKeyword, DeckRecord, DeckValue};

        let mut state = crate::state::StepState::new(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(), 2);
        state.add_geo_keyword(
            DeckKeyword::new(
                "MULTX",
                vec![DeckRecord::new(vec![
                    DeckItem::doubles("MULTX", &[0.5, 2.0]),
                    DeckItem::int("I1", 3),
                    DeckItem::string("NAME", "FLT1"),
                    DeckItem::defaulted("I2", None),
                    DeckItem::defaulted("J1", Some(DeckValue::Int(1))),
                ])],
            )
            .at("GRID.INC", 4),
        );
        state
    }

    #[test]
    fn test_step_snapshot_round_trips_through_both_backends() {
        let state = step_with_geo_keyword();

        let bincode = BincodeSerializer::new();
        let bytes = bincode.serialize(&state).unwrap();
        let back: crate::state::StepState = bincode.deserialize(&bytes).unwrap();
        assert_eq!(back, state);

        let json = JsonSerializer::new();
        let bytes = json.serialize(&state).unwrap();
        let back: crate::state::StepState = json.deserialize(&bytes).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_json_deck_values_stay_bare() {
        let json = JsonSerializer::new();
        let item = crate::deck::DeckItem::doubles("MULTX", &[0.5]);
        let text = String::from_utf8(json.serialize(&item).unwrap()).unwrap();
        assert!(text.contains("[0.5]"));
    }

    #[test]
    fn test_json_pretty_serializer() {
        let serializer = JsonSerializer::new_pretty();
        let bytes = serializer.serialize(&sample()).unwrap();
        assert!(String::from_utf8(bytes.clone()).unwrap().contains('\n'));
        let back: Sample = serializer.deserialize(&bytes).unwrap();
        assert_eq!(back, sample());
        assert_eq!(serializer.name(), "json");
    }
}
