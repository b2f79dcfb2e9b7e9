//! Output Generation
//!
//! Strategy statistics and world snapshots in the `troop-events` formats.

pub mod snapshot;
pub mod stats;

pub use snapshot::*;
pub use stats::*;
