//! Spatial Query Service
//!
//! A tick-start copy of every agent, bucketed into a uniform grid. All
//! decisions of a tick read this copy, so no agent observes another's
//! mutations from earlier in the same tick.

use bevy_ecs::prelude::*;
use std::collections::{BTreeMap, HashMap};

use crate::components::{
    Agent, AgentId, Behavior, Kinematics, LifeState, Repertoire, ResourceId, Species, Vec2, Vitals,
};
use crate::config::SimConfig;
use crate::strategy::{CombatStrategy, ForagingStrategy, Neighbor};

/// Grid cell edge length in world units
pub const DEFAULT_CELL_SIZE: f32 = 64.0;

/// One agent as it was at tick start
#[derive(Debug, Clone)]
pub struct AgentRecord {
    pub id: AgentId,
    pub entity: Entity,
    pub species: Species,
    pub position: Vec2,
    pub vision: f32,
    pub state: LifeState,
    pub fitness: f32,
    pub health_fraction: f32,
    pub energy_fraction: f32,
    pub foraging: Option<ForagingStrategy>,
    pub combat: Option<CombatStrategy>,
    pub opponent: Option<AgentId>,
    pub target_resource: Option<ResourceId>,
    pub repertoire: Repertoire,
}

impl AgentRecord {
    pub fn is_alive(&self) -> bool {
        !self.state.is_dead()
    }

    /// This record as seen from `origin`
    pub fn as_neighbor(&self, origin: Vec2) -> Neighbor {
        Neighbor {
            id: self.id,
            species: self.species,
            position: self.position,
            distance: origin.distance(self.position),
            fitness: self.fitness,
            state: self.state,
        }
    }
}

/// Resource holding the tick-start agent snapshot
#[derive(Resource, Debug)]
pub struct SpatialSnapshot {
    cell_size: f32,
    records: Vec<AgentRecord>,
    by_id: BTreeMap<AgentId, usize>,
    grid: HashMap<(i32, i32), Vec<usize>>,
}

impl Default for SpatialSnapshot {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialSnapshot {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            records: Vec::new(),
            by_id: BTreeMap::new(),
            grid: HashMap::new(),
        }
    }

    /// Replace the contents; records end up sorted by id
    pub fn rebuild(&mut self, mut records: Vec<AgentRecord>) {
        records.sort_by_key(|r| r.id);
        self.by_id.clear();
        self.grid.clear();
        for (index, record) in records.iter().enumerate() {
            self.by_id.insert(record.id, index);
            self.grid.entry(self.cell_of(record.position)).or_default().push(index);
        }
        self.records = records;
    }

    fn cell_of(&self, position: Vec2) -> (i32, i32) {
        (
            (position.x / self.cell_size).floor() as i32,
            (position.y / self.cell_size).floor() as i32,
        )
    }

    pub fn get(&self, id: AgentId) -> Option<&AgentRecord> {
        self.by_id.get(&id).map(|&index| &self.records[index])
    }

    /// Every record in ascending id order, dead ones included
    pub fn iter(&self) -> impl Iterator<Item = &AgentRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Living agents within `radius` of `position`, nearest first, ties by id
    pub fn agents_near(&self, position: Vec2, radius: f32) -> Vec<(&AgentRecord, f32)> {
        if radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        let (min_x, min_y) = self.cell_of(Vec2::new(position.x - radius, position.y - radius));
        let (max_x, max_y) = self.cell_of(Vec2::new(position.x + radius, position.y + radius));

        // Wide queries scan the occupied cells instead of the whole cell range
        let span = (max_x as i64 - min_x as i64 + 1).saturating_mul(max_y as i64 - min_y as i64 + 1);
        let buckets: Vec<&Vec<usize>> = if span > self.grid.len() as i64 {
            self.grid.values().collect()
        } else {
            (min_x..=max_x)
                .flat_map(|cx| (min_y..=max_y).map(move |cy| (cx, cy)))
                .filter_map(|cell| self.grid.get(&cell))
                .collect()
        };

        let mut found = Vec::new();
        for &index in buckets.into_iter().flatten() {
            let record = &self.records[index];
            if !record.is_alive() {
                continue;
            }
            let distance = position.distance(record.position);
            if distance <= radius {
                found.push((record, distance));
            }
        }
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.id.cmp(&b.0.id)));
        found
    }
}

/// System: copy every agent into the spatial snapshot
pub fn build_spatial_snapshot(
    config: Res<SimConfig>,
    mut snapshot: ResMut<SpatialSnapshot>,
    query: Query<
        (Entity, &AgentId, &Species, &Kinematics, &Vitals, &LifeState, &Behavior, &Repertoire),
        With<Agent>,
    >,
) {
    let records = query
        .iter()
        .map(|(entity, id, species, kinematics, vitals, state, behavior, repertoire)| AgentRecord {
            id: *id,
            entity,
            species: *species,
            position: kinematics.position,
            vision: config.species.profile(*species).vision_radius,
            state: *state,
            fitness: vitals.fitness(),
            health_fraction: vitals.health_fraction(),
            energy_fraction: vitals.energy_fraction(),
            foraging: behavior.foraging,
            combat: behavior.combat,
            opponent: behavior.opponent,
            target_resource: behavior.target_resource,
            repertoire: repertoire.clone(),
        })
        .collect();
    snapshot.rebuild(records);
}
