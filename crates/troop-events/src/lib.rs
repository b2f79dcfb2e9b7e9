//! Shared event and snapshot types for the primate troop simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! Renderers and statistics sinks depend on it instead of the engine.

pub mod event;
pub mod snapshot;
pub mod stats;

// Re-export event types
pub use event::{DeathCause, EventKind, SimEvent};

// Re-export snapshot types
pub use snapshot::{AgentSnapshot, AgentTallies, ResourceSnapshot, WorldSnapshot};

// Re-export statistics types
pub use stats::{SpeciesStrategyStats, StrategyDistribution};
