//! Primate Troop Simulation Engine
//!
//! Agents of three primate species forage, fight and flee in a shared 2D
//! world, choosing among strategies by weighted draw and imitating fitter
//! neighbours. The engine runs headless on `bevy_ecs`; renderers and
//! statistics sinks read it through [`Simulation`] and the `troop-events`
//! contracts.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;

pub mod components;
pub mod config;
pub mod events;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod strategy;
pub mod systems;

pub use components::*;
pub use config::{ConfigError, SimConfig};
pub use simulation::{AgentSpec, AgentView, Simulation, SimulationError};
pub use strategy::{
    CombatStrategy, FleeStrategy, ForagingStrategy, ProbabilityTable, StrategyContext, StrategyName, Variant,
};

/// Seeded random number generator resource
#[derive(Resource)]
pub struct SimRng(pub SmallRng);

/// Current logical tick
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimClock {
    pub tick: u64,
}
