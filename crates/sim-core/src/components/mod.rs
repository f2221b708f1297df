//! Simulation state components.

pub mod agent;
pub mod social;
pub mod world;

pub use agent::{Agent, MemoryEntry, MemoryLog, NeedKind, Needs, SocialCounters};
pub use social::{Relationship, RelationshipGraph, RelationshipKey, RelationshipType};
pub use world::{
    AccessRule, GlobalEvents, Location, LocationRegistry, LocationView, Occupancy, SecurityLevel,
    UnknownLocationError, WorldState,
};
