//! World Setup
//!
//! World initialization and agent seeding.

pub mod agents;
pub mod world;

pub use agents::*;
pub use world::*;
