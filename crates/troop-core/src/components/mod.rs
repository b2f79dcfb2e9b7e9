//! ECS Components
//!
//! Agent components, the learned repertoire, and the shared world store.

pub mod agent;
pub mod repertoire;
pub mod world;

pub use agent::*;
pub use repertoire::*;
pub use world::*;
