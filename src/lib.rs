//! Reservoir Simulation Schedule Engine (rsched)
//!
//! A library that interprets the keywords of a simulation deck's SCHEDULE
//! section into a timeline of per report step states, with checksummed
//! persistence of every state object.

pub mod checksum;
pub mod comparison;
pub mod connection;
pub mod context;
pub mod deck;
pub mod dispatch;
pub mod domain_handlers;
pub mod error;
pub mod events;
pub mod fault;
pub mod grid;
pub mod handlers;
pub mod hasher;
pub mod logging;
pub mod properties;
pub mod rst_config;
pub mod runspec;
pub mod schedule;
pub mod serialization;
pub mod state;
pub mod timeline;
pub mod traits;
pub mod types;
pub mod udt;
pub mod well;
pub mod well_handlers;

// Re-export core types and traits
pub use checksum::{bitwise_eq, checksum_octets, ChecksumSink, Persist};
pub use comparison::{StepDifference, TimelineComparator, TimelineComparison};
pub use connection::{Connection, CtfKind, CtfProperties, Direction, Order, RstConnection, State as ConnectionState};
pub use context::{Action, ErrorClass, ErrorGuard, HandlerContext, ParseContext};
pub use deck::{Deck, DeckItem, DeckKeyword, DeckRecord, DeckValue};
pub use dispatch::{Dispatch, KeywordDispatcher};
pub use error::{
    ConfigError, DeckError, HandlerError, InputError, LookupError, ScheduleError, SerializationError, TableError,
    TimelineError, ValueError,
};
pub use events::{Events, ScheduleEvents};
pub use fault::{Fault, FaultCollection};
pub use grid::{CartesianGrid, CellLookup};
pub use hasher::StateHasher;
pub use logging::{LogEntry, LogLevel, MessageLog};
pub use properties::{GasLiftOpt, MessageLimits, OilVaporizationProperties, Tuning, VfpTable};
pub use rst_config::{RptConfig, RstConfig};
pub use runspec::Runspec;
pub use schedule::{Schedule, ScheduleBuilder};
pub use serialization::{pack, unpack, BincodeSerializer, JsonSerializer, StateSerializer};
pub use state::{SimulatorUpdate, StateSection, StepState};
pub use timeline::{Checkpoint, StepDiff, Timeline};
pub use traits::{HandlerFn, KeywordDomain};
pub use types::{KeywordLocation, StateHash, UnitSystem};
pub use udt::{InterpolationType, Udt, UdtDefinition, UdtParams};
pub use well::{Well, WellConnections};
