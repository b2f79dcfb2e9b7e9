//! World Setup
//!
//! Obstacle placement, initial food and population spawning.

pub mod agents;
pub mod world;

pub use agents::*;
pub use world::*;
