//! Agent Components
//!
//! Components for individual primates: identity, body, lifecycle and the
//! per-context strategy bookkeeping.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use troop_events::{AgentTallies, DeathCause};

use super::world::{ResourceId, Vec2};
use crate::strategy::{CombatStrategy, FleeStrategy, ForagingStrategy, StrategyContext, StrategyName};

/// Marker component identifying an entity as an agent
#[derive(Component, Debug, Clone, Default)]
pub struct Agent;

/// Stable unique identifier, assigned in spawn order
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u64);

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Species {
    Gorilla,
    Chimp,
    Bonobo,
}

impl Species {
    pub fn all() -> &'static [Species] {
        &[Species::Gorilla, Species::Chimp, Species::Bonobo]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Species::Gorilla => "Gorilla",
            Species::Chimp => "Chimp",
            Species::Bonobo => "Bonobo",
        }
    }
}

/// Lifecycle state
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LifeState {
    #[default]
    Idle,
    Foraging,
    /// Held for the tick right after a meal
    Eating,
    Fighting,
    Fleeing,
    /// Absorbing; swept from the world at the end of the tick
    Dead,
}

impl LifeState {
    /// The strategy context acted on in this state, if any
    pub fn context(&self) -> Option<StrategyContext> {
        match self {
            LifeState::Foraging | LifeState::Eating => Some(StrategyContext::Foraging),
            LifeState::Fighting => Some(StrategyContext::Combat),
            LifeState::Fleeing => Some(StrategyContext::Flee),
            LifeState::Idle | LifeState::Dead => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LifeState::Idle => "idle",
            LifeState::Foraging => "foraging",
            LifeState::Eating => "eating",
            LifeState::Fighting => "fighting",
            LifeState::Fleeing => "fleeing",
            LifeState::Dead => "dead",
        }
    }

    pub fn is_dead(&self) -> bool {
        matches!(self, LifeState::Dead)
    }
}

/// Position and velocity in world units per tick
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Kinematics {
    pub position: Vec2,
    pub velocity: Vec2,
}

impl Kinematics {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
        }
    }
}

/// Energy, health and age
///
/// Energy and health are kept within [0, max] by every mutator.
#[derive(Component, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    energy: f32,
    health: f32,
    pub age: f32,
    max_energy: f32,
    max_health: f32,
}

impl Vitals {
    pub fn new(max_energy: f32, max_health: f32) -> Self {
        Self {
            energy: max_energy,
            health: max_health,
            age: 0.0,
            max_energy,
            max_health,
        }
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_energy(&self) -> f32 {
        self.max_energy
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn energy_fraction(&self) -> f32 {
        if self.max_energy > 0.0 {
            self.energy / self.max_energy
        } else {
            0.0
        }
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            self.health / self.max_health
        } else {
            0.0
        }
    }

    /// Health fraction plus energy fraction, in [0, 2]
    pub fn fitness(&self) -> f32 {
        self.health_fraction() + self.energy_fraction()
    }

    pub fn set_energy(&mut self, value: f32) {
        self.energy = clamp_finite(value, self.max_energy);
    }

    pub fn set_health(&mut self, value: f32) {
        self.health = clamp_finite(value, self.max_health);
    }

    /// Add energy, returning the amount actually gained after clamping
    pub fn gain_energy(&mut self, amount: f32) -> f32 {
        let before = self.energy;
        self.set_energy(before + amount.max(0.0));
        self.energy - before
    }

    pub fn drain_energy(&mut self, amount: f32) {
        self.set_energy(self.energy - amount.max(0.0));
    }

    pub fn heal(&mut self, amount: f32) {
        self.set_health(self.health + amount.max(0.0));
    }

    pub fn apply_damage(&mut self, amount: f32) {
        self.set_health(self.health - amount.max(0.0));
    }

    pub fn is_depleted(&self) -> bool {
        self.energy <= 0.0 || self.health <= 0.0
    }
}

fn clamp_finite(value: f32, max: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, max)
    }
}

/// Per-agent behavioural bookkeeping
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct Behavior {
    pub foraging: Option<ForagingStrategy>,
    pub combat: Option<CombatStrategy>,
    pub flee: Option<FleeStrategy>,
    /// Agent being fled from
    pub threat: Option<AgentId>,
    /// Agent currently being fought
    pub opponent: Option<AgentId>,
    /// Most recent attacker, remembered after the fight ends
    pub last_attacker: Option<AgentId>,
    /// Attacker that landed a strike during the previous tick
    pub attacked_by: Option<AgentId>,
    /// Resource the foraging strategy is heading for
    pub target_resource: Option<ResourceId>,
    pub death_cause: Option<DeathCause>,
}

impl Behavior {
    /// Active variant of a context, if one has been drawn
    pub fn active(&self, context: StrategyContext) -> Option<StrategyName> {
        match context {
            StrategyContext::Foraging => self.foraging.map(StrategyName::Foraging),
            StrategyContext::Combat => self.combat.map(StrategyName::Combat),
            StrategyContext::Flee => self.flee.map(StrategyName::Flee),
        }
    }

    /// Active variant for the context of `state`
    pub fn active_for(&self, state: LifeState) -> Option<StrategyName> {
        state.context().and_then(|context| self.active(context))
    }

    /// Forget the active variant and targets of every context except `keep`
    pub fn clear_except(&mut self, keep: Option<StrategyContext>) {
        if keep != Some(StrategyContext::Foraging) {
            self.foraging = None;
            self.target_resource = None;
        }
        if keep != Some(StrategyContext::Combat) {
            self.combat = None;
            self.opponent = None;
        }
        if keep != Some(StrategyContext::Flee) {
            self.flee = None;
            self.threat = None;
        }
    }

    pub fn register_attack(&mut self, attacker: AgentId) {
        self.attacked_by = Some(attacker);
        self.last_attacker = Some(attacker);
    }
}

/// Lifetime tallies
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentStats {
    pub meals: u32,
    pub strikes: u32,
    pub escapes: u32,
    pub lessons: u32,
}

impl From<AgentStats> for AgentTallies {
    fn from(stats: AgentStats) -> Self {
        AgentTallies {
            meals: stats.meals,
            strikes: stats.strikes,
            escapes: stats.escapes,
            lessons: stats.lessons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vitals_clamp_on_every_mutation() {
        let mut vitals = Vitals::new(100.0, 80.0);
        assert_eq!(vitals.gain_energy(50.0), 0.0);
        assert_eq!(vitals.energy(), 100.0);

        vitals.apply_damage(500.0);
        assert_eq!(vitals.health(), 0.0);
        assert!(vitals.is_depleted());

        vitals.heal(1000.0);
        assert_eq!(vitals.health(), 80.0);

        vitals.set_energy(f32::NAN);
        assert_eq!(vitals.energy(), 0.0);
    }

    #[test]
    fn test_gain_energy_reports_clamped_gain() {
        let mut vitals = Vitals::new(100.0, 100.0);
        vitals.set_energy(90.0);
        assert_eq!(vitals.gain_energy(25.0), 10.0);
    }

    #[test]
    fn test_negative_amounts_are_ignored() {
        let mut vitals = Vitals::new(100.0, 100.0);
        vitals.set_energy(50.0);
        vitals.gain_energy(-20.0);
        vitals.apply_damage(-20.0);
        assert_eq!(vitals.energy(), 50.0);
        assert_eq!(vitals.health(), 100.0);
    }

    #[test]
    fn test_fitness_is_sum_of_fractions() {
        let mut vitals = Vitals::new(200.0, 100.0);
        vitals.set_energy(100.0);
        vitals.set_health(25.0);
        assert!((vitals.fitness() - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_state_contexts() {
        assert_eq!(LifeState::Eating.context(), Some(StrategyContext::Foraging));
        assert_eq!(LifeState::Fighting.context(), Some(StrategyContext::Combat));
        assert_eq!(LifeState::Idle.context(), None);
        assert!(LifeState::Dead.is_dead());
    }

    #[test]
    fn test_clear_except_keeps_one_context() {
        let mut behavior = Behavior {
            foraging: Some(ForagingStrategy::Ambush),
            combat: Some(CombatStrategy::Group),
            flee: Some(FleeStrategy::Hide),
            threat: Some(AgentId(3)),
            opponent: Some(AgentId(4)),
            target_resource: Some(ResourceId(9)),
            ..Default::default()
        };
        behavior.clear_except(Some(StrategyContext::Flee));

        assert_eq!(behavior.foraging, None);
        assert_eq!(behavior.target_resource, None);
        assert_eq!(behavior.combat, None);
        assert_eq!(behavior.opponent, None);
        assert_eq!(behavior.flee, Some(FleeStrategy::Hide));
        assert_eq!(behavior.threat, Some(AgentId(3)));
        assert_eq!(behavior.active_for(LifeState::Fleeing), Some(StrategyName::Flee(FleeStrategy::Hide)));
    }

    #[test]
    fn test_register_attack_remembers_attacker() {
        let mut behavior = Behavior::default();
        behavior.register_attack(AgentId(7));
        assert_eq!(behavior.attacked_by, Some(AgentId(7)));
        assert_eq!(behavior.last_attacker, Some(AgentId(7)));
    }
}
