//! Snapshot Generation
//!
//! Converts live agents and resources into serializable `troop-events`
//! snapshots.

use troop_events::{AgentSnapshot, ResourceSnapshot};

use crate::components::{AgentId, AgentStats, Behavior, FoodResource, Kinematics, LifeState, Repertoire, Species, Vitals};

/// Borrowed view of one agent's components
pub struct AgentParts<'a> {
    pub id: AgentId,
    pub species: Species,
    pub kinematics: &'a Kinematics,
    pub vitals: &'a Vitals,
    pub state: LifeState,
    pub behavior: &'a Behavior,
    pub repertoire: &'a Repertoire,
    pub stats: &'a AgentStats,
}

pub fn agent_snapshot(parts: AgentParts<'_>) -> AgentSnapshot {
    AgentSnapshot {
        agent_id: parts.id.0,
        species: parts.species.name().to_string(),
        position: parts.kinematics.position.as_tuple(),
        state: parts.state.name().to_string(),
        active_strategy: parts.behavior.active_for(parts.state).map(|s| s.name().to_string()),
        health_fraction: parts.vitals.health_fraction(),
        energy_fraction: parts.vitals.energy_fraction(),
        age: parts.vitals.age,
        hunger_threshold: parts.repertoire.hunger_threshold,
        strategy_tables: parts.repertoire.table_weights(),
        tallies: (*parts.stats).into(),
    }
}

pub fn resource_snapshot(resource: &FoodResource) -> ResourceSnapshot {
    ResourceSnapshot {
        resource_id: resource.id.0,
        kind: resource.kind.name().to_string(),
        position: resource.position.as_tuple(),
        amount: resource.amount,
    }
}
