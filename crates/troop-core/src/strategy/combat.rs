//! Combat Variants
//!
//! Whether to keep fighting, and how hard each strike lands.

use super::intent::{Intent, LocalView, Neighbor};
use super::CombatStrategy;
use crate::config::{CombatConfig, RadiiConfig};

pub mod combat_constants {
    pub const AGGRESSIVE_DAMAGE: f32 = 1.5;
    pub const AGGRESSIVE_COUNTER: f32 = 0.5;
    pub const AGGRESSIVE_COST: f32 = 2.0;
    pub const AGGRESSIVE_SPEED: f32 = 1.5;

    pub const DEFENSIVE_DAMAGE: f32 = 0.8;
    pub const DEFENSIVE_COUNTER: f32 = 0.2;
    pub const DEFENSIVE_COST: f32 = 1.0;
    pub const DEFENSIVE_SPEED: f32 = 1.0;
    /// Incoming damage multiplier while Defensive is the active stance
    pub const DEFENSIVE_ABSORB: f32 = 0.6;

    pub const GROUP_BONUS_PER_ALLY: f32 = 0.3;
    pub const GROUP_MAX_ALLIES: usize = 5;
    pub const GROUP_COUNTER: f32 = 0.3;
    pub const GROUP_COST: f32 = 1.5;
    pub const GROUP_SPEED: f32 = 1.2;
}

use combat_constants::*;

/// Resolved strike parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombatStance {
    pub strategy: CombatStrategy,
    /// Damage dealt before the defender's own mitigation
    pub damage: f32,
    /// Fraction of the defender's attack power returned to the attacker
    pub counter_factor: f32,
    /// Energy the attacker spends on the strike
    pub energy_cost: f32,
}

impl CombatStance {
    pub fn resolve(strategy: CombatStrategy, attack_power: f32, defense: f32, allies: usize) -> Self {
        match strategy {
            CombatStrategy::Aggressive => Self {
                strategy,
                damage: attack_power * AGGRESSIVE_DAMAGE,
                counter_factor: AGGRESSIVE_COUNTER,
                energy_cost: AGGRESSIVE_COST,
            },
            CombatStrategy::Defensive => Self {
                strategy,
                damage: attack_power * DEFENSIVE_DAMAGE + defense,
                counter_factor: DEFENSIVE_COUNTER,
                energy_cost: DEFENSIVE_COST,
            },
            CombatStrategy::Group => Self {
                strategy,
                damage: attack_power * (1.0 + GROUP_BONUS_PER_ALLY * allies.min(GROUP_MAX_ALLIES) as f32),
                counter_factor: GROUP_COUNTER,
                energy_cost: GROUP_COST,
            },
        }
    }
}

/// Multiplier on damage received by a defender holding `stance`
pub fn incoming_factor(stance: Option<CombatStrategy>) -> f32 {
    match stance {
        Some(CombatStrategy::Defensive) => DEFENSIVE_ABSORB,
        _ => 1.0,
    }
}

fn approach_speed(strategy: CombatStrategy) -> f32 {
    match strategy {
        CombatStrategy::Aggressive => AGGRESSIVE_SPEED,
        CombatStrategy::Defensive => DEFENSIVE_SPEED,
        CombatStrategy::Group => GROUP_SPEED,
    }
}

/// Whether the stance is willing to fight given the agent's situation
pub fn will_engage(strategy: CombatStrategy, view: &LocalView, combat: &CombatConfig) -> bool {
    match strategy {
        CombatStrategy::Aggressive => true,
        CombatStrategy::Defensive => view.health_fraction > combat.defensive_safety_margin,
        CombatStrategy::Group => view.allies >= 1,
    }
}

/// Combat decision for one agent against its current opponent
pub fn decide(strategy: CombatStrategy, view: &LocalView, radii: &RadiiConfig, combat: &CombatConfig) -> Intent {
    let Some(opponent) = view.opponent else {
        return Intent::Hold;
    };
    if !will_engage(strategy, view, combat) {
        return Intent::Retreat;
    }
    attack(strategy, view, &opponent, radii)
}

fn attack(strategy: CombatStrategy, view: &LocalView, opponent: &Neighbor, radii: &RadiiConfig) -> Intent {
    if opponent.distance <= radii.strike_range {
        Intent::Strike {
            opponent: opponent.id,
            stance: CombatStance::resolve(strategy, view.attack_power, view.defense, view.allies),
        }
    } else {
        Intent::Engage {
            opponent: opponent.id,
            position: opponent.position,
            speed: approach_speed(strategy),
        }
    }
}
