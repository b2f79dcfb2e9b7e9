//! Interaction System
//!
//! The act half of a tick. Intents are executed in ascending agent id order:
//! movement first, then eating against the live resource store so two agents
//! can never eat the same food twice. Strikes only record damage; the damage
//! of the whole tick is applied together afterwards.

use bevy_ecs::prelude::*;
use std::collections::BTreeMap;
use troop_events::{DeathCause, EventKind};

use crate::components::{
    Agent, AgentId, AgentStats, Behavior, Bounds, Kinematics, LifeState, ResourceField, ResourceId, Species, Vec2,
    Vitals,
};
use crate::config::{SimConfig, SpeciesProfile};
use crate::events::TickEvents;
use crate::strategy::combat::incoming_factor;
use crate::strategy::{Intent, Variant};
use crate::systems::behavior::PendingIntents;
use crate::systems::metabolism::mark_dead;
use crate::systems::spatial::SpatialSnapshot;
use crate::SimClock;

/// A hiding agent stops once this close to its spot
pub const COVER_ARRIVAL: f32 = 15.0;

/// Damage owed to one agent at the end of the tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingDamage {
    pub amount: f32,
    /// Strikers in the order their blows were recorded
    pub attackers: Vec<AgentId>,
}

/// Resource accumulating this tick's combat damage
#[derive(Resource, Debug, Default)]
pub struct DamageLedger {
    entries: BTreeMap<AgentId, PendingDamage>,
}

impl DamageLedger {
    /// Record damage against `target`; `attacker` is None for retaliation
    pub fn add(&mut self, target: AgentId, amount: f32, attacker: Option<AgentId>) {
        let entry = self.entries.entry(target).or_default();
        entry.amount += amount.max(0.0);
        if let Some(attacker) = attacker {
            entry.attackers.push(attacker);
        }
    }

    pub fn get(&self, target: AgentId) -> Option<&PendingDamage> {
        self.entries.get(&target)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Take every entry in ascending target id order
    pub fn drain(&mut self) -> Vec<(AgentId, PendingDamage)> {
        std::mem::take(&mut self.entries).into_iter().collect()
    }
}

/// Velocity toward `target` at `speed`, never overshooting it
fn toward(from: Vec2, target: Vec2, speed: f32) -> Vec2 {
    let offset = target - from;
    let distance = offset.length();
    offset.normalized() * speed.min(distance)
}

/// Integrate one step of movement and damp the velocity
pub fn step_motion(kinematics: &mut Kinematics, bounds: Bounds, damping: f32) {
    kinematics.position = bounds.clamp(kinematics.position + kinematics.velocity);
    kinematics.velocity = kinematics.velocity * damping;
}

/// Result of a meal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Meal {
    pub resource: ResourceId,
    pub consumed: f32,
    pub energy_gained: f32,
    pub depleted: bool,
}

/// Eat from a specific resource.
///
/// Fails (returns None) when the resource is gone, out of reach, inedible
/// for the species, or the agent has no room for more energy.
pub fn eat(
    vitals: &mut Vitals,
    position: Vec2,
    profile: &SpeciesProfile,
    field: &mut ResourceField,
    resource: ResourceId,
    config: &SimConfig,
) -> Option<Meal> {
    let food = field.get(resource)?;
    if !profile.eats(food.kind) || food.amount <= 0.0 {
        return None;
    }
    if position.distance(food.position) > config.world.consumption_radius {
        return None;
    }
    let conversion = profile.energy_conversion.max(f32::EPSILON);
    let room = vitals.max_energy() - vitals.energy();
    if room <= 0.0 {
        return None;
    }

    let wanted = config.metabolism.bite_size.min(room / conversion);
    let consumed = field.consume_resource(resource, wanted);
    if consumed <= 0.0 {
        return None;
    }
    let energy_gained = vitals.gain_energy(consumed * conversion);
    vitals.heal(energy_gained * config.metabolism.meal_health_gain);
    Some(Meal {
        resource,
        consumed,
        energy_gained,
        depleted: field.get(resource).is_none(),
    })
}

/// Nearest edible resource within eating reach, ties by id
pub fn reachable_food(field: &ResourceField, position: Vec2, profile: &SpeciesProfile, reach: f32) -> Option<ResourceId> {
    field
        .resources_near(position, reach)
        .into_iter()
        .filter(|r| profile.eats(r.kind))
        .map(|r| (r.id, position.distance(r.position)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
        .map(|(id, _)| id)
}

/// System: carry out every pending intent
#[allow(clippy::type_complexity)]
pub fn execute_intents(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    snapshot: Res<SpatialSnapshot>,
    mut field: ResMut<ResourceField>,
    mut pending: ResMut<PendingIntents>,
    mut ledger: ResMut<DamageLedger>,
    mut events: ResMut<TickEvents>,
    mut query: Query<
        (
            &Species,
            &mut Kinematics,
            &mut Vitals,
            &mut LifeState,
            &mut Behavior,
            &mut AgentStats,
        ),
        With<Agent>,
    >,
) {
    let bounds = field.bounds();
    for planned in pending.drain() {
        let Ok((species, mut kinematics, mut vitals, mut state, mut behavior, mut stats)) =
            query.get_mut(planned.entity)
        else {
            continue;
        };
        if state.is_dead() {
            continue;
        }
        let profile = config.species.profile(*species);
        let speed = profile.base_speed;
        let position = kinematics.position;

        match planned.intent {
            Intent::Hold | Intent::Retreat => {}
            Intent::Wander { heading, speed: factor } | Intent::Evade { heading, speed: factor } => {
                kinematics.velocity = heading.normalized() * (speed * factor);
            }
            Intent::Seek {
                resource,
                position: target,
                speed: factor,
            } => {
                if field.get(resource).is_some() {
                    kinematics.velocity = toward(position, target, speed * factor);
                } else {
                    tracing::debug!("Agent {} dropped vanished resource {}", planned.agent, resource.0);
                    behavior.target_resource = None;
                }
            }
            Intent::Engage {
                opponent,
                position: target,
                speed: factor,
            } => {
                if snapshot.get(opponent).is_some_and(|r| r.is_alive()) {
                    kinematics.velocity = toward(position, target, speed * factor);
                } else {
                    tracing::debug!("Agent {} lost opponent {}", planned.agent, opponent);
                }
            }
            Intent::TakeCover { spot, speed: factor } => {
                kinematics.velocity = if position.distance(spot) < COVER_ARRIVAL {
                    Vec2::ZERO
                } else {
                    toward(position, spot, speed * factor)
                };
            }
            Intent::Strike { opponent, stance } => {
                kinematics.velocity = Vec2::ZERO;
                match snapshot.get(opponent).filter(|r| r.is_alive()) {
                    Some(defender) => {
                        let defender_profile = config.species.profile(defender.species);
                        let damage = stance.damage * incoming_factor(defender.combat);
                        let counter = defender_profile.attack_power * stance.counter_factor;

                        ledger.add(opponent, damage, Some(planned.agent));
                        ledger.add(planned.agent, counter, None);
                        vitals.drain_energy(stance.energy_cost);
                        stats.strikes += 1;

                        tracing::debug!(
                            "Tick {}: agent {} strikes {} ({}) for {:.1}, takes {:.1}",
                            clock.tick,
                            planned.agent,
                            opponent,
                            stance.strategy.name(),
                            damage,
                            counter
                        );
                        events.push(
                            clock.tick,
                            EventKind::Strike {
                                attacker_id: planned.agent.0,
                                defender_id: opponent.0,
                                stance: stance.strategy.name().to_string(),
                                damage,
                                counter_damage: counter,
                            },
                        );
                    }
                    None => tracing::debug!("Agent {} struck at missing opponent {}", planned.agent, opponent),
                }
            }
        }

        step_motion(&mut kinematics, bounds, config.metabolism.velocity_damping);

        if *state != LifeState::Foraging {
            continue;
        }
        let Some(resource) = reachable_food(&field, kinematics.position, profile, config.world.consumption_radius)
        else {
            continue;
        };
        let position = kinematics.position;
        if let Some(meal) = eat(&mut vitals, position, profile, &mut field, resource, &config) {
            stats.meals += 1;
            *state = LifeState::Eating;
            behavior.target_resource = None;
            tracing::debug!(
                "Tick {}: agent {} ate {:.1} from resource {} (+{:.1} energy)",
                clock.tick,
                planned.agent,
                meal.consumed,
                meal.resource.0,
                meal.energy_gained
            );
            events.push(
                clock.tick,
                EventKind::Meal {
                    agent_id: planned.agent.0,
                    resource_id: meal.resource.0,
                    consumed: meal.consumed,
                    energy_gained: meal.energy_gained,
                    depleted: meal.depleted,
                },
            );
            events.push(
                clock.tick,
                EventKind::StateChange {
                    agent_id: planned.agent.0,
                    from: LifeState::Foraging.name().to_string(),
                    to: LifeState::Eating.name().to_string(),
                    strategy: behavior.active_for(LifeState::Eating).map(|s| s.name().to_string()),
                },
            );
        }
    }
}

/// System: apply the tick's accumulated combat damage all at once.
///
/// Afterwards every agent left without health or energy dies, including
/// attackers exhausted by the cost of their own strikes.
pub fn resolve_combat(
    clock: Res<SimClock>,
    snapshot: Res<SpatialSnapshot>,
    mut ledger: ResMut<DamageLedger>,
    mut query: Query<(&AgentId, &mut Vitals, &mut LifeState, &mut Behavior), With<Agent>>,
) {
    for (target, damage) in ledger.drain() {
        let Some(record) = snapshot.get(target) else {
            continue;
        };
        let Ok((_, mut vitals, state, mut behavior)) = query.get_mut(record.entity) else {
            continue;
        };
        if state.is_dead() {
            continue;
        }
        vitals.apply_damage(damage.amount);
        if let Some(attacker) = damage.attackers.first() {
            behavior.register_attack(*attacker);
        }
    }

    for (id, vitals, mut state, mut behavior) in query.iter_mut() {
        if state.is_dead() || !vitals.is_depleted() {
            continue;
        }
        let cause = if vitals.health() <= 0.0 {
            DeathCause::Injury
        } else {
            DeathCause::Starvation
        };
        tracing::debug!("Tick {}: agent {} died in combat ({:?})", clock.tick, id, cause);
        mark_dead(&mut state, &mut behavior, cause);
    }
}
