//! Shared record types for the precarity simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for all other crates in the workspace.

pub mod decision;
pub mod event;
pub mod tier;
pub mod timestamp;

#[cfg(feature = "test-fixtures")]
pub mod fixtures;

// Re-export timestamp types
pub use timestamp::{WorldClock, MINUTES_PER_DAY, WORK_END_HOUR, WORK_START_HOUR};

// Re-export tier types
pub use tier::{EconomicTier, ParseTierError};

// Re-export decision types
pub use decision::{Decision, DecisionSource, Urgency};

// Re-export event types
pub use event::{generate_encounter_id, EncounterRecord, EncounterType, TelemetryEvent};
