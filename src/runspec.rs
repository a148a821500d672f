//! Run level settings fixed before the schedule section

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::UnitSystem;
use crate::udt::UdtParams;

/// Dimensions and switches from the RUNSPEC section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Runspec {
    pub num_pvt_regions: usize,
    pub unit_system: UnitSystem,
    pub compositional: bool,
    pub udt_params: UdtParams,
}

impl Default for Runspec {
    fn default() -> Self {
        Self {
            num_pvt_regions: 1,
            unit_system: UnitSystem::Metric,
            compositional: false,
            udt_params: UdtParams::default(),
        }
    }
}

impl Runspec {
    /// Load run settings from JSON, validating the dimensions
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let runspec: Runspec = serde_json::from_str(text).map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })?;
        runspec.validate()?;
        Ok(runspec)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_pvt_regions == 0 {
            return Err(ConfigError::Invalid {
                reason: "at least one PVT region is required".to_string(),
            });
        }
        UdtParams::new(self.udt_params.max_dimensions()).map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let runspec = Runspec::default();
        assert_eq!(runspec.num_pvt_regions, 1);
        assert_eq!(runspec.udt_params.max_dimensions(), 1);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let runspec = Runspec::from_json(r#"{"num_pvt_regions": 3, "unit_system": "Field"}"#).unwrap();
        assert_eq!(runspec.num_pvt_regions, 3);
        assert_eq!(runspec.unit_system, UnitSystem::Field);
        assert!(!runspec.compositional);
    }

    #[test]
    fn test_zero_regions_rejected() {
        assert!(matches!(
            Runspec::from_json(r#"{"num_pvt_regions": 0}"#),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_multi_dimensional_udt_rejected() {
        assert!(Runspec::from_json(r#"{"udt_params": {"max_dimensions": 2}}"#).is_err());
    }
}
