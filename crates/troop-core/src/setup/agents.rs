//! Agent Spawning
//!
//! Spawns primates with a randomized hunger threshold and jittered strategy
//! priors.

use bevy_ecs::prelude::*;
use rand::Rng;

use crate::components::{
    Agent, AgentId, AgentStats, Behavior, Kinematics, LifeState, Repertoire, ResourceField, Species, Vec2, Vitals,
};
use crate::config::{SimConfig, SpeciesProfile, StrategyPriors};
use crate::strategy::ProbabilityTable;

/// Agents spawn at least this far from the world edge
pub const SPAWN_MARGIN: f32 = 20.0;

/// Hands out agent ids in spawn order
#[derive(Resource, Debug, Default)]
pub struct AgentIdAllocator {
    next: u64,
}

impl AgentIdAllocator {
    pub fn next_id(&mut self) -> AgentId {
        let id = AgentId(self.next);
        self.next += 1;
        id
    }
}

/// Description of one agent to spawn. Unset fields take species defaults
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub species: Species,
    pub position: Vec2,
    pub energy: Option<f32>,
    pub health: Option<f32>,
    pub repertoire: Option<Repertoire>,
}

impl AgentSpec {
    pub fn new(species: Species, position: Vec2) -> Self {
        Self {
            species,
            position,
            energy: None,
            health: None,
            repertoire: None,
        }
    }

    pub fn with_energy(mut self, energy: f32) -> Self {
        self.energy = Some(energy);
        self
    }

    pub fn with_health(mut self, health: f32) -> Self {
        self.health = Some(health);
        self
    }

    pub fn with_repertoire(mut self, repertoire: Repertoire) -> Self {
        self.repertoire = Some(repertoire);
        self
    }
}

/// Multiply each prior by a uniform factor in [1 - jitter, 1 + jitter]
fn jittered<R: Rng>(priors: &[f64], jitter: f64, rng: &mut R) -> Vec<f64> {
    priors
        .iter()
        .map(|p| p * (1.0 + jitter * (2.0 * rng.gen::<f64>() - 1.0)))
        .collect()
}

/// A fresh repertoire: threshold drawn from the species range, near-prior tables
pub fn random_repertoire<R: Rng>(
    profile: &SpeciesProfile,
    priors: &StrategyPriors,
    jitter: f64,
    rng: &mut R,
) -> Repertoire {
    let (low, high) = profile.hunger_threshold_range;
    let threshold = if high > low { rng.gen_range(low..=high) } else { low };
    let jitter = jitter.clamp(0.0, 1.0);
    Repertoire::new(
        threshold,
        ProbabilityTable::from_weights(&jittered(&priors.foraging.weights(), jitter, rng)),
        ProbabilityTable::from_weights(&jittered(&priors.combat.weights(), jitter, rng)),
        ProbabilityTable::from_weights(&jittered(&priors.flee.weights(), jitter, rng)),
    )
}

/// Spawn one agent. A spec without a repertoire gets uniform tables
pub fn spawn_agent(world: &mut World, id: AgentId, spec: AgentSpec, profile: &SpeciesProfile) -> Entity {
    let mut vitals = Vitals::new(profile.max_energy, profile.max_health);
    if let Some(energy) = spec.energy {
        vitals.set_energy(energy);
    }
    if let Some(health) = spec.health {
        vitals.set_health(health);
    }
    world
        .spawn((
            Agent,
            id,
            spec.species,
            Kinematics::at(spec.position),
            vitals,
            LifeState::Idle,
            Behavior::default(),
            spec.repertoire.unwrap_or_default(),
            AgentStats::default(),
        ))
        .id()
}

/// Spawn the configured initial population, species by species
pub fn spawn_population<R: Rng>(
    world: &mut World,
    config: &SimConfig,
    field: &ResourceField,
    allocator: &mut AgentIdAllocator,
    rng: &mut R,
) -> usize {
    let mut spawned = 0;
    for &species in Species::all() {
        let profile = config.species.profile(species);
        for _ in 0..config.population.count(species) {
            let position = field.open_point(rng, SPAWN_MARGIN);
            let repertoire = random_repertoire(profile, &config.strategies, config.population.prior_jitter, rng);
            let spec = AgentSpec::new(species, position).with_repertoire(repertoire);
            spawn_agent(world, allocator.next_id(), spec, profile);
            spawned += 1;
        }
        tracing::info!("Spawned {} {}s", config.population.count(species), species.name());
    }
    spawned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Bounds;
    use crate::strategy::ForagingStrategy;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_allocator_is_sequential() {
        let mut allocator = AgentIdAllocator::default();
        assert_eq!(allocator.next_id(), AgentId(0));
        assert_eq!(allocator.next_id(), AgentId(1));
    }

    #[test]
    fn test_random_repertoire_respects_range_and_simplex() {
        let config = SimConfig::default();
        let mut rng = SmallRng::seed_from_u64(4);
        for &species in Species::all() {
            let profile = config.species.profile(species);
            let (low, high) = profile.hunger_threshold_range;
            for _ in 0..50 {
                let r = random_repertoire(profile, &config.strategies, 0.2, &mut rng);
                assert!(r.hunger_threshold >= low && r.hunger_threshold <= high);
                assert!(r.is_valid(1e-9));
            }
        }
    }

    #[test]
    fn test_zero_prior_stays_zero() {
        let mut config = SimConfig::default();
        config.strategies.foraging.ambush = 0.0;
        let mut rng = SmallRng::seed_from_u64(4);
        let r = random_repertoire(&config.species.chimp, &config.strategies, 0.5, &mut rng);
        assert_eq!(r.foraging.weight(ForagingStrategy::Ambush), 0.0);
    }

    #[test]
    fn test_spawn_population_counts() {
        let mut config = SimConfig::default();
        config.population.gorilla = 2;
        config.population.chimp = 3;
        config.population.bonobo = 0;

        let mut world = World::new();
        let field = ResourceField::new(Bounds::new(800.0, 800.0));
        let mut allocator = AgentIdAllocator::default();
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(spawn_population(&mut world, &config, &field, &mut allocator, &mut rng), 5);

        let mut species: Vec<Species> = world.query::<&Species>().iter(&world).copied().collect();
        species.sort();
        assert_eq!(species, vec![Species::Gorilla, Species::Gorilla, Species::Chimp, Species::Chimp, Species::Chimp]);
    }

    #[test]
    fn test_spec_overrides_vitals() {
        let config = SimConfig::default();
        let mut world = World::new();
        let profile = &config.species.gorilla;
        let spec = AgentSpec::new(Species::Gorilla, Vec2::new(5.0, 5.0)).with_energy(40.0).with_health(500.0);
        let entity = spawn_agent(&mut world, AgentId(0), spec, profile);

        let vitals = world.get::<Vitals>(entity).unwrap();
        assert_eq!(vitals.energy(), 40.0);
        assert_eq!(vitals.health(), profile.max_health);
        assert_eq!(world.get::<Repertoire>(entity), Some(&Repertoire::default()));
        assert_eq!(world.get::<LifeState>(entity), Some(&LifeState::Idle));
    }
}
