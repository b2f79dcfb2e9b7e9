//! Metabolism System
//!
//! Per-tick upkeep for every living agent: aging, energy drain, starvation
//! damage and the death checks that follow from them.

use bevy_ecs::prelude::*;
use troop_events::DeathCause;

use crate::components::{Agent, AgentId, Behavior, LifeState, Species, Vitals};
use crate::config::{MetabolismConfig, SimConfig};

/// Energy drain multiplier for a lifecycle state
pub fn state_multiplier(state: LifeState, metabolism: &MetabolismConfig) -> f32 {
    match state {
        LifeState::Idle | LifeState::Eating | LifeState::Dead => metabolism.idle_multiplier,
        LifeState::Foraging => metabolism.foraging_multiplier,
        LifeState::Fighting => metabolism.fighting_multiplier,
        LifeState::Fleeing => metabolism.fleeing_multiplier,
    }
}

/// Why an agent with these vitals must die now, if it must
pub fn death_check(vitals: &Vitals, max_age: f32) -> Option<DeathCause> {
    if vitals.health() <= 0.0 {
        Some(DeathCause::Injury)
    } else if vitals.energy() <= 0.0 {
        Some(DeathCause::Starvation)
    } else if vitals.age >= max_age {
        Some(DeathCause::OldAge)
    } else {
        None
    }
}

/// Mark an agent dead, keeping the first recorded cause
pub fn mark_dead(state: &mut LifeState, behavior: &mut Behavior, cause: DeathCause) {
    *state = LifeState::Dead;
    behavior.death_cause.get_or_insert(cause);
    behavior.clear_except(None);
}

/// System: age, drain and starve every living agent
pub fn apply_metabolism(
    config: Res<SimConfig>,
    mut query: Query<(&AgentId, &Species, &mut Vitals, &mut LifeState, &mut Behavior), With<Agent>>,
) {
    let metabolism = &config.metabolism;
    for (id, species, mut vitals, mut state, mut behavior) in query.iter_mut() {
        if state.is_dead() {
            continue;
        }
        let profile = config.species.profile(*species);

        vitals.age += metabolism.age_increment;
        vitals.drain_energy(profile.metabolic_rate * state_multiplier(*state, metabolism));
        if vitals.energy_fraction() < metabolism.starvation_fraction {
            vitals.apply_damage(metabolism.starvation_damage);
        }

        if let Some(cause) = death_check(&vitals, profile.max_age) {
            tracing::debug!("Agent {} ({}) died of {:?}", id, species.name(), cause);
            mark_dead(&mut state, &mut behavior, cause);
        }
    }
}
