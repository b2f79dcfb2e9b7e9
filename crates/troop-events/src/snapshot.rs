//! Snapshot Types
//!
//! Read-only views of the world handed to renderers and statistics sinks.
//! Nothing in here flows back into the engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifetime counters for one agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentTallies {
    pub meals: u32,
    pub strikes: u32,
    pub escapes: u32,
    pub lessons: u32,
}

/// One agent as seen from outside the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: u64,
    pub species: String,
    pub position: (f32, f32),
    pub state: String,
    /// Strategy driving the current state, if the state has one
    #[serde(default)]
    pub active_strategy: Option<String>,
    pub health_fraction: f32,
    pub energy_fraction: f32,
    pub age: f32,
    pub hunger_threshold: f64,
    /// context name -> (strategy name -> weight)
    #[serde(default)]
    pub strategy_tables: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub tallies: AgentTallies,
}

/// One food resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub resource_id: u64,
    pub kind: String,
    pub position: (f32, f32),
    pub amount: f32,
}

/// Complete world state at a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub seed: u64,
    pub agents: Vec<AgentSnapshot>,
    pub resources: Vec<ResourceSnapshot>,
}

impl WorldSnapshot {
    /// Living agents per species name
    pub fn population(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for agent in &self.agents {
            *counts.entry(agent.species.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn agent(&self, agent_id: u64) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }

    /// Total food left in the world
    pub fn total_food(&self) -> f32 {
        self.resources.iter().map(|r| r.amount).sum()
    }

    /// Serializes the snapshot to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Serializes the snapshot to compact JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
