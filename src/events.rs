//! Per-step change flags

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::checksum::{checksum_plain, pack_plain, ChecksumSink, Persist, Unpacker};
use crate::error::SerializationError;

/// Something that changed during a report step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u64)]
pub enum ScheduleEvents {
    NewWell = 1 << 0,
    WellWelspecsUpdate = 1 << 1,
    CompletionChange = 1 << 2,
    WellStatusChange = 1 << 3,
    GeoModifier = 1 << 4,
    TuningChange = 1 << 5,
    VfpinjUpdate = 1 << 6,
    VfpprodUpdate = 1 << 7,
    NewGroup = 1 << 8,
    GroupChange = 1 << 9,
    WellProductivityIndex = 1 << 10,
    UdqUpdate = 1 << 11,
    NetworkChange = 1 << 12,
    AquiferUpdate = 1 << 13,
    GasLiftChange = 1 << 14,
    OilVaporizationChange = 1 << 15,
}

impl ScheduleEvents {
    pub const ALL: [ScheduleEvents; 16] = [
        ScheduleEvents::NewWell,
        ScheduleEvents::WellWelspecsUpdate,
        ScheduleEvents::CompletionChange,
        ScheduleEvents::WellStatusChange,
        ScheduleEvents::GeoModifier,
        ScheduleEvents::TuningChange,
        ScheduleEvents::VfpinjUpdate,
        ScheduleEvents::VfpprodUpdate,
        ScheduleEvents::NewGroup,
        ScheduleEvents::GroupChange,
        ScheduleEvents::WellProductivityIndex,
        ScheduleEvents::UdqUpdate,
        ScheduleEvents::NetworkChange,
        ScheduleEvents::AquiferUpdate,
        ScheduleEvents::GasLiftChange,
        ScheduleEvents::OilVaporizationChange,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ScheduleEvents::NewWell => "NEW_WELL",
            ScheduleEvents::WellWelspecsUpdate => "WELL_WELSPECS_UPDATE",
            ScheduleEvents::CompletionChange => "COMPLETION_CHANGE",
            ScheduleEvents::WellStatusChange => "WELL_STATUS_CHANGE",
            ScheduleEvents::GeoModifier => "GEO_MODIFIER",
            ScheduleEvents::TuningChange => "TUNING_CHANGE",
            ScheduleEvents::VfpinjUpdate => "VFPINJ_UPDATE",
            ScheduleEvents::VfpprodUpdate => "VFPPROD_UPDATE",
            ScheduleEvents::NewGroup => "NEW_GROUP",
            ScheduleEvents::GroupChange => "GROUP_CHANGE",
            ScheduleEvents::WellProductivityIndex => "WELL_PRODUCTIVITY_INDEX",
            ScheduleEvents::UdqUpdate => "UDQ_UPDATE",
            ScheduleEvents::NetworkChange => "NETWORK_CHANGE",
            ScheduleEvents::AquiferUpdate => "AQUIFER_UPDATE",
            ScheduleEvents::GasLiftChange => "GAS_LIFT_CHANGE",
            ScheduleEvents::OilVaporizationChange => "OIL_VAPORIZATION_CHANGE",
        }
    }
}

/// Set of events raised during one step
///
/// Flags only accumulate. They are dropped when the next step begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Events(u64);

impl Events {
    pub fn new() -> Self {
        Self(0)
    }

    pub fn add_event(&mut self, event: ScheduleEvents) {
        self.0 |= event as u64;
    }

    pub fn has_event(&self, event: ScheduleEvents) -> bool {
        self.0 & event as u64 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Raw bit pattern
    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = ScheduleEvents> + '_ {
        ScheduleEvents::ALL
            .into_iter()
            .filter(move |event| self.has_event(*event))
    }
}

impl fmt::Display for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|e| e.name()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

// A bit vector persists as its integer value.
impl Persist for Events {
    fn checksum<C: ChecksumSink + ?Sized>(&self, sink: &mut C) {
        checksum_plain(&self.0, sink);
    }

    fn pack(&self, buf: &mut Vec<u8>) {
        pack_plain(&self.0, buf);
    }

    fn unpack(reader: &mut Unpacker<'_>) -> Result<Self, SerializationError> {
        Ok(Self(reader.plain()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::checksum_octets;

    #[test]
    fn test_accumulate() {
        let mut events = Events::new();
        assert!(events.is_empty());
        events.add_event(ScheduleEvents::TuningChange);
        events.add_event(ScheduleEvents::TuningChange);
        events.add_event(ScheduleEvents::NewWell);
        assert!(events.has_event(ScheduleEvents::TuningChange));
        assert!(events.has_event(ScheduleEvents::NewWell));
        assert!(!events.has_event(ScheduleEvents::GeoModifier));
        assert_eq!(events.iter().count(), 2);
        assert_eq!(events.to_string(), "[NEW_WELL, TUNING_CHANGE]");
    }

    #[test]
    fn test_checksum_is_integer_value() {
        let mut events = Events::new();
        events.add_event(ScheduleEvents::GeoModifier);
        assert_eq!(checksum_octets(&events), 16u64.to_ne_bytes().to_vec());
    }
}
