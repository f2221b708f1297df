//! Precarity Simulation Engine Library
//!
//! Turn-based multi-agent simulation of economic precarity: agents with
//! money and needs perceive a tier-filtered world, decide through an
//! inference provider or a weighted fallback, and meet each other in
//! shared locations.

use rand::rngs::SmallRng;
use rand::SeedableRng;

pub mod actions;
pub mod components;
pub mod config;
pub mod decision;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod state;
pub mod systems;

pub use components::*;

pub use config::{ConfigError, SimConfig};
pub use setup::{create_world_map, world_to_json};
pub use simulation::{bootstrap, build_provider, open_store, Simulation, TickReport, TurnError};
pub use state::{MoveError, SimulationState};

/// Seeded random number generator shared by tests and tools.
pub struct SimRng(pub SmallRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(SmallRng::seed_from_u64(seed))
    }
}
