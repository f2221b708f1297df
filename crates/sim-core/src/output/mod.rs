//! Output
//!
//! Everything that leaves the engine: persisted records, telemetry and
//! content artifacts.

pub mod content;
pub mod store;
pub mod telemetry;

pub use content::{ContentPublisher, PlaceholderPublisher};
pub use store::{load_state, save_state, JsonFileStore, MemoryStore, PersistenceError, StateStore};
pub use telemetry::{JsonlTelemetrySink, MemorySink, TelemetrySink};
