//! Behaviour System
//!
//! The decide half of a tick. For each living agent, in ascending id order:
//! pick the next lifecycle state from the tick-start snapshot, keep or redraw
//! the active strategy of that state's context, and ask the strategy for an
//! intent. Nothing outside the agent's own components is mutated here.

use bevy_ecs::prelude::*;
use rand::Rng;
use troop_events::EventKind;

use crate::components::{
    Agent, AgentId, AgentStats, Behavior, Kinematics, LifeState, Repertoire, ResourceField, Species, Vec2, Vitals,
};
use crate::config::{SimConfig, SpeciesProfile};
use crate::events::TickEvents;
use crate::strategy::foraging::foraging_constants::MAX_RANGE;
use crate::strategy::{
    combat, flee, foraging, select_variant, ForagingStrategy, Intent, LocalView, Noise, ProbabilityTable,
    ResourceSighting, StrategyContext, Variant,
};
use crate::systems::spatial::{AgentRecord, SpatialSnapshot};
use crate::{SimClock, SimRng};

/// Speed multiplier for idle wandering
pub const IDLE_SPEED: f32 = 0.3;

/// An intent waiting for the act phase
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedIntent {
    pub agent: AgentId,
    pub entity: Entity,
    pub intent: Intent,
}

/// Resource holding this tick's intents in ascending agent id order
#[derive(Resource, Debug, Default)]
pub struct PendingIntents {
    pub intents: Vec<PlannedIntent>,
}

impl PendingIntents {
    pub fn drain(&mut self) -> Vec<PlannedIntent> {
        std::mem::take(&mut self.intents)
    }
}

/// The agent's own state at decision time
#[derive(Debug, Clone)]
pub struct Situation<'a> {
    pub id: AgentId,
    pub species: Species,
    pub position: Vec2,
    pub vision: f32,
    pub state: LifeState,
    pub health_fraction: f32,
    pub energy_fraction: f32,
    pub fitness: f32,
    pub hunger_threshold: f64,
    pub behavior: &'a Behavior,
}

/// Outcome of the transition policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub state: LifeState,
    pub threat: Option<AgentId>,
    pub opponent: Option<AgentId>,
}

impl Transition {
    fn to(state: LifeState) -> Self {
        Self {
            state,
            threat: None,
            opponent: None,
        }
    }

    fn fight(opponent: AgentId) -> Self {
        Self {
            state: LifeState::Fighting,
            threat: None,
            opponent: Some(opponent),
        }
    }

    fn flee(threat: AgentId) -> Self {
        Self {
            state: LifeState::Fleeing,
            threat: Some(threat),
            opponent: None,
        }
    }
}

/// Distance at which rivals are checked for hostility
pub fn threat_radius(me: &Situation, config: &SimConfig) -> f32 {
    let mut radius = me.vision * config.radii.threat_factor;
    if me.behavior.foraging == Some(ForagingStrategy::Ambush) {
        radius *= config.radii.ambush_threat_bonus;
    }
    radius
}

/// Transition policy, highest priority first
pub fn next_state(
    me: &Situation,
    snapshot: &SpatialSnapshot,
    field: &ResourceField,
    config: &SimConfig,
) -> Transition {
    if me.state.is_dead() {
        return Transition::to(LifeState::Dead);
    }
    let living = |id: AgentId| snapshot.get(id).filter(|r| r.is_alive());
    let is_rival = |record: &AgentRecord| record.id != me.id && record.species != me.species;

    // An engaged fight is only ended by its own resolution
    if me.state == LifeState::Fighting {
        if let Some(opponent) = me.behavior.opponent.and_then(living) {
            if me.position.distance(opponent.position) <= config.combat.disengage_distance {
                return Transition::fight(opponent.id);
            }
        }
    }

    // Struck last tick: fight back unless already too hurt
    if let Some(attacker) = me.behavior.attacked_by.and_then(living) {
        if me.health_fraction >= config.combat.flee_health_fraction {
            return Transition::fight(attacker.id);
        }
    }

    let weak = me.health_fraction < config.combat.flee_health_fraction;
    let hostile = snapshot
        .agents_near(me.position, threat_radius(me, config))
        .into_iter()
        .map(|(record, _)| record)
        .filter(|record| is_rival(record))
        .find(|record| {
            weak || record.fitness > me.fitness * config.combat.hostility_margin
                || me.behavior.last_attacker == Some(record.id)
        });
    if let Some(threat) = hostile {
        return Transition::flee(threat.id);
    }

    if me.state == LifeState::Fleeing {
        if let Some(threat) = me.behavior.threat.and_then(living) {
            if me.position.distance(threat.position) <= me.vision * config.radii.safe_factor {
                return Transition::flee(threat.id);
            }
        }
    }

    // Another species heading for the same food
    if let Some(target) = me.behavior.target_resource.and_then(|id| field.get(id)) {
        let contest = config.radii.contest;
        if me.position.distance(target.position) <= contest {
            let contender = snapshot
                .agents_near(target.position, contest)
                .into_iter()
                .map(|(record, _)| record)
                .find(|record| is_rival(record) && record.target_resource == Some(target.id));
            if let Some(rival) = contender {
                return Transition::fight(rival.id);
            }
        }
    }

    if me.energy_fraction >= config.combat.fight_energy_fraction {
        let nearest_rival = snapshot
            .agents_near(me.position, me.vision)
            .into_iter()
            .map(|(record, _)| record)
            .find(|record| is_rival(record));
        if let Some(rival) = nearest_rival {
            if me.fitness > rival.fitness * config.combat.aggression_margin {
                return Transition::fight(rival.id);
            }
        }
    }

    if f64::from(me.energy_fraction) < me.hunger_threshold {
        return Transition::to(LifeState::Foraging);
    }

    Transition::to(LifeState::Idle)
}

/// Keep the active variant, or draw a new one on entry or by reselect chance
fn refresh<V: Variant, R: Rng + ?Sized>(
    slot: &mut Option<V>,
    entering: bool,
    table: &ProbabilityTable<V>,
    reselect_chance: f32,
    rng: &mut R,
) {
    let redraw = entering || slot.is_none() || rng.gen::<f32>() < reselect_chance;
    if redraw {
        *slot = Some(select_variant(table, rng).variant);
    }
}

/// Make the strategy fields agree with the state the agent is entering
fn enter_state<R: Rng + ?Sized>(
    behavior: &mut Behavior,
    previous: LifeState,
    transition: Transition,
    repertoire: &Repertoire,
    config: &SimConfig,
    rng: &mut R,
) {
    let context = transition.state.context();
    let entering = previous.context() != context;
    behavior.clear_except(context);

    let selection = &config.selection;
    match context {
        Some(StrategyContext::Foraging) => refresh(
            &mut behavior.foraging,
            entering,
            &repertoire.foraging,
            selection.foraging_reselect_chance,
            rng,
        ),
        Some(StrategyContext::Combat) => {
            // A new opponent is a new fight
            let fresh = entering || behavior.opponent != transition.opponent;
            behavior.opponent = transition.opponent;
            refresh(&mut behavior.combat, fresh, &repertoire.combat, selection.combat_reselect_chance, rng);
        }
        Some(StrategyContext::Flee) => {
            behavior.threat = transition.threat;
            refresh(&mut behavior.flee, entering, &repertoire.flee, selection.flee_reselect_chance, rng);
        }
        None => {}
    }
}

/// Edible resources in the farthest foraging range, nearest first
fn sight_food(field: &ResourceField, position: Vec2, profile: &SpeciesProfile) -> Vec<ResourceSighting> {
    let mut sightings: Vec<ResourceSighting> = field
        .resources_near(position, profile.vision_radius * MAX_RANGE)
        .into_iter()
        .filter(|r| profile.eats(r.kind))
        .map(|r| ResourceSighting {
            id: r.id,
            kind: r.kind,
            position: r.position,
            amount: r.amount,
            distance: position.distance(r.position),
        })
        .collect();
    sightings.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
    sightings
}

/// Build what the agent can see for the context it is acting in
fn local_view(
    me: &Situation,
    kinematics: &Kinematics,
    profile: &SpeciesProfile,
    behavior: &Behavior,
    snapshot: &SpatialSnapshot,
    field: &ResourceField,
    config: &SimConfig,
) -> LocalView {
    let neighbor = |id: Option<AgentId>| {
        id.and_then(|id| snapshot.get(id))
            .filter(|r| r.is_alive())
            .map(|r| r.as_neighbor(me.position))
    };
    let mut view = LocalView {
        position: me.position,
        velocity: kinematics.velocity,
        vision: profile.vision_radius,
        health_fraction: me.health_fraction,
        attack_power: profile.attack_power,
        defense: profile.defense,
        threat: neighbor(behavior.threat),
        opponent: neighbor(behavior.opponent),
        ..Default::default()
    };
    match me.state.context() {
        Some(StrategyContext::Foraging) => {
            view.resources = sight_food(field, me.position, profile);
        }
        Some(StrategyContext::Combat) => {
            view.allies = snapshot
                .agents_near(me.position, config.radii.support)
                .iter()
                .filter(|(record, _)| record.id != me.id && record.species == me.species)
                .count();
        }
        Some(StrategyContext::Flee) => {
            view.obstacles = field
                .obstacles_near(me.position, profile.vision_radius)
                .into_iter()
                .copied()
                .collect();
        }
        None => {}
    }
    view
}

/// Intent for the state the agent is in, given its active strategies
fn decide(state: LifeState, behavior: &Behavior, view: &LocalView, noise: Noise, config: &SimConfig) -> Intent {
    match state {
        LifeState::Idle => Intent::Wander {
            heading: view.wander_heading(noise),
            speed: IDLE_SPEED,
        },
        LifeState::Foraging => match behavior.foraging {
            Some(strategy) => foraging::decide(strategy, view, noise),
            None => Intent::Hold,
        },
        LifeState::Fighting => match behavior.combat {
            Some(strategy) => combat::decide(strategy, view, &config.radii, &config.combat),
            None => Intent::Hold,
        },
        LifeState::Fleeing => match behavior.flee {
            Some(strategy) => flee::decide(strategy, view, noise),
            None => Intent::Hold,
        },
        LifeState::Eating | LifeState::Dead => Intent::Hold,
    }
}

/// System: choose every living agent's state, strategy and intent
#[allow(clippy::type_complexity)]
pub fn decide_intents(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    snapshot: Res<SpatialSnapshot>,
    field: Res<ResourceField>,
    mut rng: ResMut<SimRng>,
    mut events: ResMut<TickEvents>,
    mut pending: ResMut<PendingIntents>,
    mut query: Query<
        (
            &AgentId,
            &Species,
            &Kinematics,
            &Vitals,
            &Repertoire,
            &mut LifeState,
            &mut Behavior,
            &mut AgentStats,
        ),
        With<Agent>,
    >,
) {
    pending.intents.clear();

    let mut order: Vec<(AgentId, Entity)> = snapshot.iter().map(|r| (r.id, r.entity)).collect();
    order.sort_by_key(|(id, _)| *id);

    for (agent_id, entity) in order {
        let Ok((id, species, kinematics, vitals, repertoire, mut state, mut behavior, mut stats)) =
            query.get_mut(entity)
        else {
            continue;
        };
        if state.is_dead() {
            continue;
        }
        let profile = config.species.profile(*species);
        let previous = *state;

        let transition = {
            let me = Situation {
                id: *id,
                species: *species,
                position: kinematics.position,
                vision: profile.vision_radius,
                state: previous,
                health_fraction: vitals.health_fraction(),
                energy_fraction: vitals.energy_fraction(),
                fitness: vitals.fitness(),
                hunger_threshold: repertoire.hunger_threshold,
                behavior: &behavior,
            };
            next_state(&me, &snapshot, &field, &config)
        };
        behavior.attacked_by = None;
        enter_state(&mut behavior, previous, transition, repertoire, &config, &mut rng.0);
        *state = transition.state;

        let noise = Noise::draw(&mut rng.0);
        let me = Situation {
            id: *id,
            species: *species,
            position: kinematics.position,
            vision: profile.vision_radius,
            state: *state,
            health_fraction: vitals.health_fraction(),
            energy_fraction: vitals.energy_fraction(),
            fitness: vitals.fitness(),
            hunger_threshold: repertoire.hunger_threshold,
            behavior: &behavior,
        };
        let view = local_view(&me, kinematics, profile, &behavior, &snapshot, &field, &config);
        let mut intent = decide(*state, &behavior, &view, noise, &config);

        if intent == Intent::Retreat {
            // The stance refused the fight: run from the opponent this same tick
            let threat = behavior.opponent;
            let retreat = Transition {
                state: LifeState::Fleeing,
                threat,
                opponent: None,
            };
            enter_state(&mut behavior, LifeState::Fighting, retreat, repertoire, &config, &mut rng.0);
            *state = LifeState::Fleeing;
            let flee_view = LocalView {
                obstacles: field
                    .obstacles_near(kinematics.position, profile.vision_radius)
                    .into_iter()
                    .copied()
                    .collect(),
                threat: view.opponent,
                opponent: None,
                ..view
            };
            intent = decide(LifeState::Fleeing, &behavior, &flee_view, noise, &config);
        }

        match intent {
            Intent::Seek { resource, .. } => behavior.target_resource = Some(resource),
            _ if *state == LifeState::Foraging => behavior.target_resource = None,
            _ => {}
        }

        if *state != previous {
            if *state == LifeState::Fleeing {
                stats.escapes += 1;
            }
            let strategy = behavior.active_for(*state).map(|s| s.name().to_string());
            tracing::debug!(
                "Tick {}: agent {} {} -> {} ({})",
                clock.tick,
                agent_id,
                previous.name(),
                state.name(),
                strategy.as_deref().unwrap_or("-")
            );
            events.push(
                clock.tick,
                EventKind::StateChange {
                    agent_id: agent_id.0,
                    from: previous.name().to_string(),
                    to: state.name().to_string(),
                    strategy,
                },
            );
        }

        pending.intents.push(PlannedIntent {
            agent: agent_id,
            entity,
            intent,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Bounds, FoodKind};
    use crate::strategy::{CombatStrategy, FleeStrategy};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn record(id: u64, species: Species, position: Vec2, fitness: f32) -> AgentRecord {
        AgentRecord {
            id: AgentId(id),
            entity: Entity::from_raw(id as u32),
            species,
            position,
            vision: 120.0,
            state: LifeState::Idle,
            fitness,
            health_fraction: fitness / 2.0,
            energy_fraction: fitness / 2.0,
            foraging: None,
            combat: None,
            opponent: None,
            target_resource: None,
            repertoire: Repertoire::default(),
        }
    }

    fn situation(behavior: &Behavior, state: LifeState, health: f32, energy: f32) -> Situation<'_> {
        Situation {
            id: AgentId(1),
            species: Species::Gorilla,
            position: Vec2::new(100.0, 100.0),
            vision: 120.0,
            state,
            health_fraction: health,
            energy_fraction: energy,
            fitness: health + energy,
            hunger_threshold: 0.5,
            behavior,
        }
    }

    fn snapshot(records: Vec<AgentRecord>) -> SpatialSnapshot {
        let mut snapshot = SpatialSnapshot::default();
        snapshot.rebuild(records);
        snapshot
    }

    fn field() -> ResourceField {
        ResourceField::new(Bounds::new(800.0, 800.0))
    }

    #[test]
    fn test_hungry_agent_forages() {
        let behavior = Behavior::default();
        let me = situation(&behavior, LifeState::Idle, 1.0, 0.4);
        let snap = snapshot(vec![record(1, Species::Gorilla, Vec2::new(100.0, 100.0), 1.4)]);
        let t = next_state(&me, &snap, &field(), &SimConfig::default());
        assert_eq!(t.state, LifeState::Foraging);
    }

    #[test]
    fn test_sated_agent_idles() {
        let behavior = Behavior::default();
        let me = situation(&behavior, LifeState::Foraging, 1.0, 0.9);
        let t = next_state(&me, &snapshot(Vec::new()), &field(), &SimConfig::default());
        assert_eq!(t, Transition::to(LifeState::Idle));
    }

    #[test]
    fn test_fitter_rival_in_threat_radius_triggers_flight() {
        let behavior = Behavior::default();
        let me = situation(&behavior, LifeState::Foraging, 0.5, 0.3);
        // 150 away: outside vision, inside 1.5x vision
        let snap = snapshot(vec![record(7, Species::Chimp, Vec2::new(250.0, 100.0), 1.9)]);
        let t = next_state(&me, &snap, &field(), &SimConfig::default());
        assert_eq!(t, Transition::flee(AgentId(7)));
    }

    #[test]
    fn test_same_species_is_never_a_threat() {
        let behavior = Behavior::default();
        let me = situation(&behavior, LifeState::Idle, 0.1, 0.9);
        let snap = snapshot(vec![record(7, Species::Gorilla, Vec2::new(110.0, 100.0), 2.0)]);
        let t = next_state(&me, &snap, &field(), &SimConfig::default());
        assert_eq!(t.state, LifeState::Idle);
    }

    #[test]
    fn test_ambush_widens_threat_radius() {
        let config = SimConfig::default();
        let plain = Behavior::default();
        let ambushing = Behavior {
            foraging: Some(ForagingStrategy::Ambush),
            ..Default::default()
        };
        let base = threat_radius(&situation(&plain, LifeState::Foraging, 1.0, 0.3), &config);
        let wide = threat_radius(&situation(&ambushing, LifeState::Foraging, 1.0, 0.3), &config);
        assert!((base - 180.0).abs() < 1e-4);
        assert!((wide - 234.0).abs() < 1e-3);
    }

    #[test]
    fn test_engaged_fight_continues_while_opponent_near() {
        let behavior = Behavior {
            combat: Some(CombatStrategy::Aggressive),
            opponent: Some(AgentId(7)),
            ..Default::default()
        };
        // Weak, and a much fitter rival: the fight still takes precedence
        let me = situation(&behavior, LifeState::Fighting, 0.1, 0.1);
        let snap = snapshot(vec![record(7, Species::Chimp, Vec2::new(130.0, 100.0), 2.0)]);
        let t = next_state(&me, &snap, &field(), &SimConfig::default());
        assert_eq!(t, Transition::fight(AgentId(7)));
    }

    #[test]
    fn test_fight_breaks_off_beyond_disengage_distance() {
        let behavior = Behavior {
            opponent: Some(AgentId(7)),
            ..Default::default()
        };
        let me = situation(&behavior, LifeState::Fighting, 1.0, 0.9);
        let snap = snapshot(vec![record(7, Species::Chimp, Vec2::new(700.0, 100.0), 1.0)]);
        let t = next_state(&me, &snap, &field(), &SimConfig::default());
        assert_eq!(t.state, LifeState::Idle);
    }

    #[test]
    fn test_attacked_agent_fights_back() {
        let behavior = Behavior {
            attacked_by: Some(AgentId(7)),
            last_attacker: Some(AgentId(7)),
            ..Default::default()
        };
        let me = situation(&behavior, LifeState::Idle, 0.8, 0.8);
        let snap = snapshot(vec![record(7, Species::Chimp, Vec2::new(110.0, 100.0), 1.0)]);
        let t = next_state(&me, &snap, &field(), &SimConfig::default());
        assert_eq!(t, Transition::fight(AgentId(7)));
    }

    #[test]
    fn test_badly_hurt_agent_flees_attacker() {
        let behavior = Behavior {
            attacked_by: Some(AgentId(7)),
            last_attacker: Some(AgentId(7)),
            ..Default::default()
        };
        let me = situation(&behavior, LifeState::Idle, 0.2, 0.8);
        let snap = snapshot(vec![record(7, Species::Chimp, Vec2::new(110.0, 100.0), 1.0)]);
        let t = next_state(&me, &snap, &field(), &SimConfig::default());
        assert_eq!(t, Transition::flee(AgentId(7)));
    }

    #[test]
    fn test_fleeing_continues_until_safe() {
        let behavior = Behavior {
            flee: Some(FleeStrategy::Speed),
            threat: Some(AgentId(7)),
            ..Default::default()
        };
        let me = situation(&behavior, LifeState::Fleeing, 1.0, 0.9);
        // Not hostile (equal fitness), beyond threat radius, within 2x vision
        let near = snapshot(vec![record(7, Species::Chimp, Vec2::new(300.0, 100.0), 1.9)]);
        assert_eq!(next_state(&me, &near, &field(), &SimConfig::default()).state, LifeState::Fleeing);

        let far = snapshot(vec![record(7, Species::Chimp, Vec2::new(400.0, 100.0), 1.9)]);
        assert_eq!(next_state(&me, &far, &field(), &SimConfig::default()).state, LifeState::Idle);
    }

    #[test]
    fn test_stronger_agent_picks_a_fight() {
        let behavior = Behavior::default();
        let me = situation(&behavior, LifeState::Idle, 1.0, 0.9);
        let snap = snapshot(vec![record(7, Species::Bonobo, Vec2::new(150.0, 100.0), 1.0)]);
        let t = next_state(&me, &snap, &field(), &SimConfig::default());
        assert_eq!(t, Transition::fight(AgentId(7)));
    }

    #[test]
    fn test_contested_resource_starts_fight() {
        let mut food = field();
        let target = food.insert(FoodKind::Plant, Vec2::new(110.0, 100.0), 30.0).unwrap();
        let behavior = Behavior {
            foraging: Some(ForagingStrategy::FastMove),
            target_resource: Some(target),
            ..Default::default()
        };
        // Hungry and evenly matched, so neither hostility nor aggression fires
        let me = situation(&behavior, LifeState::Foraging, 0.5, 0.3);
        let mut rival = record(7, Species::Chimp, Vec2::new(120.0, 100.0), 0.8);
        rival.target_resource = Some(target);
        let t = next_state(&me, &snapshot(vec![rival]), &food, &SimConfig::default());
        assert_eq!(t, Transition::fight(AgentId(7)));
    }

    #[test]
    fn test_dead_stays_dead() {
        let behavior = Behavior::default();
        let me = situation(&behavior, LifeState::Dead, 0.0, 0.0);
        let t = next_state(&me, &snapshot(Vec::new()), &field(), &SimConfig::default());
        assert_eq!(t.state, LifeState::Dead);
    }

    #[test]
    fn test_strategy_drawn_on_entry_and_cleared_on_exit() {
        let config = SimConfig::default();
        let repertoire = Repertoire::default();
        let mut rng = SmallRng::seed_from_u64(1);
        let mut behavior = Behavior::default();

        enter_state(&mut behavior, LifeState::Idle, Transition::to(LifeState::Foraging), &repertoire, &config, &mut rng);
        assert!(behavior.foraging.is_some());

        enter_state(&mut behavior, LifeState::Foraging, Transition::flee(AgentId(4)), &repertoire, &config, &mut rng);
        assert_eq!(behavior.foraging, None);
        assert!(behavior.flee.is_some());
        assert_eq!(behavior.threat, Some(AgentId(4)));

        enter_state(&mut behavior, LifeState::Fleeing, Transition::to(LifeState::Idle), &repertoire, &config, &mut rng);
        assert_eq!(behavior, Behavior::default());
    }

    #[test]
    fn test_strategy_persists_without_reselect() {
        let mut config = SimConfig::default();
        config.selection.foraging_reselect_chance = 0.0;
        let repertoire = Repertoire::default();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut behavior = Behavior {
            foraging: Some(ForagingStrategy::Ambush),
            ..Default::default()
        };
        for _ in 0..50 {
            enter_state(
                &mut behavior,
                LifeState::Foraging,
                Transition::to(LifeState::Foraging),
                &repertoire,
                &config,
                &mut rng,
            );
            assert_eq!(behavior.foraging, Some(ForagingStrategy::Ambush));
        }
    }

    #[test]
    fn test_sight_food_filters_diet_and_sorts() {
        let mut food = field();
        food.insert(FoodKind::Meat, Vec2::new(105.0, 100.0), 60.0);
        let far = food.insert(FoodKind::Plant, Vec2::new(150.0, 100.0), 30.0).unwrap();
        let near = food.insert(FoodKind::Plant, Vec2::new(120.0, 100.0), 30.0).unwrap();

        let gorilla = SimConfig::default().species.gorilla;
        let sightings = sight_food(&food, Vec2::new(100.0, 100.0), &gorilla);
        let ids: Vec<_> = sightings.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![near, far]);
    }
}
