//! Tick Driver
//!
//! Owns the ECS world and the chained per-tick schedule. Each call to
//! [`Simulation::step`] advances the whole world by one logical tick:
//! environment, metabolism, snapshot, decide, act, combat, learning, sweep.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::ExecutorKind;
use bevy_ecs::world::EntityRef;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use thiserror::Error;
use troop_events::{SimEvent, StrategyDistribution, WorldSnapshot};

use crate::components::{
    Agent, AgentId, AgentStats, Behavior, Bounds, Kinematics, LifeState, Repertoire, ResourceField, Species, Vec2,
    Vitals,
};
use crate::config::{ConfigError, SimConfig};
use crate::events::TickEvents;
use crate::output::{agent_snapshot, resource_snapshot, strategy_distribution, AgentParts};
use crate::setup::{create_resource_field, random_repertoire, spawn_agent, spawn_population, AgentIdAllocator};
use crate::strategy::StrategyName;
use crate::systems::{
    advance_clock, apply_metabolism, build_spatial_snapshot, decide_intents, execute_intents, resolve_combat,
    social_learning, sweep_dead, update_environment, DamageLedger, PendingIntents, SpatialSnapshot,
};
use crate::{SimClock, SimRng};

pub use crate::setup::AgentSpec;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Read-only view of one living agent
#[derive(Debug, Clone, PartialEq)]
pub struct AgentView {
    pub id: AgentId,
    pub species: Species,
    pub position: Vec2,
    pub velocity: Vec2,
    pub state: LifeState,
    pub active_strategy: Option<StrategyName>,
    pub energy: f32,
    pub health: f32,
    pub health_fraction: f32,
    pub energy_fraction: f32,
    pub age: f32,
    pub repertoire: Repertoire,
    pub stats: AgentStats,
}

impl AgentView {
    fn from_entity(entity: EntityRef<'_>) -> Option<Self> {
        let kinematics = entity.get::<Kinematics>()?;
        let vitals = entity.get::<Vitals>()?;
        let state = *entity.get::<LifeState>()?;
        let behavior = entity.get::<Behavior>()?;
        Some(Self {
            id: *entity.get::<AgentId>()?,
            species: *entity.get::<Species>()?,
            position: kinematics.position,
            velocity: kinematics.velocity,
            state,
            active_strategy: behavior.active_for(state),
            energy: vitals.energy(),
            health: vitals.health(),
            health_fraction: vitals.health_fraction(),
            energy_fraction: vitals.energy_fraction(),
            age: vitals.age,
            repertoire: entity.get::<Repertoire>()?.clone(),
            stats: *entity.get::<AgentStats>()?,
        })
    }
}

pub struct Simulation {
    world: World,
    schedule: Schedule,
    seed: u64,
}

impl Simulation {
    /// Build a seeded world with obstacles, initial food and the configured population
    pub fn new(config: SimConfig, seed: u64) -> Result<Self, SimulationError> {
        config.validate()?;
        let mut rng = SmallRng::seed_from_u64(seed);
        let field = create_resource_field(&config.world, &mut rng);

        let mut world = World::new();
        let mut allocator = AgentIdAllocator::default();
        let spawned = spawn_population(&mut world, &config, &field, &mut allocator, &mut rng);
        tracing::info!("Simulation ready: seed {}, {} agents", seed, spawned);

        Ok(Self::assemble(world, config, field, allocator, rng, seed))
    }

    /// A world with bounds only: no obstacles, food or agents
    pub fn empty(config: SimConfig, seed: u64) -> Result<Self, SimulationError> {
        config.validate()?;
        let field = ResourceField::new(Bounds::new(config.world.width, config.world.height));
        Ok(Self::assemble(
            World::new(),
            config,
            field,
            AgentIdAllocator::default(),
            SmallRng::seed_from_u64(seed),
            seed,
        ))
    }

    fn assemble(
        mut world: World,
        config: SimConfig,
        field: ResourceField,
        allocator: AgentIdAllocator,
        rng: SmallRng,
        seed: u64,
    ) -> Self {
        world.insert_resource(config);
        world.insert_resource(SimRng(rng));
        world.insert_resource(SimClock::default());
        world.insert_resource(field);
        world.insert_resource(allocator);
        world.insert_resource(SpatialSnapshot::default());
        world.insert_resource(PendingIntents::default());
        world.insert_resource(DamageLedger::default());
        world.insert_resource(TickEvents::new());

        Self {
            world,
            schedule: build_schedule(),
            seed,
        }
    }

    /// Add an agent. Missing repertoires are drawn from the species priors
    pub fn spawn_agent(&mut self, mut spec: AgentSpec) -> AgentId {
        let config = self.world.resource::<SimConfig>().clone();
        let profile = config.species.profile(spec.species);
        spec.position = self.world.resource::<ResourceField>().bounds().clamp(spec.position);
        if spec.repertoire.is_none() {
            let mut rng = self.world.resource_mut::<SimRng>();
            spec.repertoire = Some(random_repertoire(
                profile,
                &config.strategies,
                config.population.prior_jitter,
                &mut rng.0,
            ));
        }
        let id = self.world.resource_mut::<AgentIdAllocator>().next_id();
        spawn_agent(&mut self.world, id, spec, profile);
        id
    }

    /// Advance one tick
    pub fn step(&mut self) {
        self.schedule.run(&mut self.world);
    }

    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.step();
        }
    }

    /// Events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.world.resource_mut::<TickEvents>().drain()
    }

    /// Number of completed ticks
    pub fn tick(&self) -> u64 {
        self.world.resource::<SimClock>().tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    pub fn resources(&self) -> &ResourceField {
        self.world.resource::<ResourceField>()
    }

    pub fn resources_mut(&mut self) -> Mut<'_, ResourceField> {
        self.world.resource_mut::<ResourceField>()
    }

    /// Living agents in ascending id order
    pub fn agents(&self) -> Vec<AgentView> {
        let mut agents: Vec<AgentView> = self
            .world
            .iter_entities()
            .filter(|entity| entity.contains::<Agent>())
            .filter_map(AgentView::from_entity)
            .collect();
        agents.sort_by_key(|agent| agent.id);
        agents
    }

    pub fn agent(&self, id: AgentId) -> Option<AgentView> {
        self.world
            .iter_entities()
            .filter(|entity| entity.get::<AgentId>() == Some(&id))
            .find_map(AgentView::from_entity)
    }

    pub fn population(&self) -> usize {
        self.world.iter_entities().filter(|entity| entity.contains::<Agent>()).count()
    }

    /// Per-species strategy means over the living population
    pub fn statistics(&self) -> StrategyDistribution {
        let agents = self.agents();
        strategy_distribution(
            self.tick(),
            agents
                .iter()
                .filter(|agent| !agent.state.is_dead())
                .map(|agent| (agent.species, &agent.repertoire)),
        )
    }

    /// Full serializable view of the current tick
    pub fn snapshot(&self) -> WorldSnapshot {
        let mut entities: Vec<EntityRef<'_>> = self
            .world
            .iter_entities()
            .filter(|entity| entity.contains::<Agent>())
            .collect();
        entities.sort_by_key(|entity| entity.get::<AgentId>().copied());

        let agents = entities
            .into_iter()
            .filter_map(|entity| {
                Some(agent_snapshot(AgentParts {
                    id: *entity.get::<AgentId>()?,
                    species: *entity.get::<Species>()?,
                    kinematics: entity.get::<Kinematics>()?,
                    vitals: entity.get::<Vitals>()?,
                    state: *entity.get::<LifeState>()?,
                    behavior: entity.get::<Behavior>()?,
                    repertoire: entity.get::<Repertoire>()?,
                    stats: entity.get::<AgentStats>()?,
                }))
            })
            .collect();

        WorldSnapshot {
            tick: self.tick(),
            seed: self.seed,
            agents,
            resources: self.resources().iter().map(resource_snapshot).collect(),
        }
    }
}

fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            advance_clock,
            update_environment,
            apply_metabolism,
            build_spatial_snapshot,
            decide_intents,
            execute_intents,
            resolve_combat,
            social_learning,
            sweep_dead,
        )
            .chain(),
    );
    schedule
}
