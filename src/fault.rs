//! Named faults and their transmissibility multipliers

use serde::{Deserialize, Serialize};

use crate::deck::DeckKeyword;
use crate::error::{HandlerError, LookupError};

/// Input section a MULTFLT keyword appeared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Section {
    Grid,
    Edit,
    Schedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    name: String,
    trans_mult: f64,
    // Multiplier accumulated by earlier sections
    section_base: f64,
}

crate::persist_fields!(Fault {
    name,
    trans_mult,
    section_base,
});

impl Fault {
    /// Create a new fault with unit multiplier
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            trans_mult: 1.0,
            section_base: 1.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn trans_mult(&self) -> f64 {
        self.trans_mult
    }
}

/// Faults in definition order
///
/// Within one section later MULTFLT records replace earlier ones. When a new
/// section starts the multipliers reached so far are kept and further values
/// multiply onto them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FaultCollection {
    faults: Vec<Fault>,
    current_section: Option<Section>,
}

impl FaultCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fault, ignoring names already present
    pub fn add_fault(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.has_fault(&name) {
            self.faults.push(Fault::new(name));
        }
    }

    pub fn has_fault(&self, name: &str) -> bool {
        self.faults.iter().any(|f| f.name == name)
    }

    pub fn get_fault(&self, name: &str) -> Result<&Fault, LookupError> {
        self.faults
            .iter()
            .find(|f| f.name == name)
            .ok_or_else(|| LookupError::new("fault", name))
    }

    pub fn fault_at(&self, index: usize) -> Option<&Fault> {
        self.faults.get(index)
    }

    pub fn len(&self) -> usize {
        self.faults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fault> {
        self.faults.iter()
    }

    /// Apply the records of a MULTFLT keyword found in `section`
    pub fn apply_multflt(&mut self, keyword: &DeckKeyword, section: Section) -> Result<(), HandlerError> {
        if self.current_section != Some(section) {
            for fault in &mut self.faults {
                fault.section_base = fault.trans_mult;
            }
            self.current_section = Some(section);
        }

        for record in keyword.records() {
            let pattern = record.item("fault")?.get_string(0)?;
            let factor = record.item("factor")?.get_double(0)?;
            self.set_multiplier(&pattern, factor)?;
        }
        Ok(())
    }

    fn set_multiplier(&mut self, pattern: &str, factor: f64) -> Result<(), LookupError> {
        match pattern.find('*') {
            Some(star) => {
                let prefix = &pattern[..star];
                for fault in self.faults.iter_mut().filter(|f| f.name.starts_with(prefix)) {
                    fault.trans_mult = fault.section_base * factor;
                }
                Ok(())
            }
            None => {
                let fault = self
                    .faults
                    .iter_mut()
                    .find(|f| f.name == pattern)
                    .ok_or_else(|| LookupError::new("fault", pattern))?;
                fault.trans_mult = fault.section_base * factor;
                Ok(())
            }
        }
    }
}
