//! Simulation Systems
//!
//! Per-tick steps that read or mutate the simulation state: the resource
//! ledger, perception, needs drift and the encounter phase.

pub mod encounter;
pub mod ledger;
pub mod needs;
pub mod perception;

pub use encounter::{classify_encounter, sample_pairs, EncounterEngine};
pub use ledger::{Ledger, LedgerField};
pub use needs::update_needs;
pub use perception::{perceive, GlobalNotice, Perception, VisibleAgent};
