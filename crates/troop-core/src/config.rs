//! Configuration System
//!
//! Loads tuning parameters from tuning.toml for easy adjustment without recompiling.
//! Every section is optional; missing sections and fields fall back to defaults.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::components::agent::Species;
use crate::components::world::FoodKind;

/// Default tuning file path
pub const DEFAULT_TUNING_PATH: &str = "tuning.toml";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Top-level configuration structure
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub simulation: SimulationConfig,
    pub world: WorldConfig,
    pub population: PopulationConfig,
    pub metabolism: MetabolismConfig,
    pub species: SpeciesTable,
    pub radii: RadiiConfig,
    pub combat: CombatConfig,
    pub learning: LearningConfig,
    pub selection: SelectionConfig,
    pub strategies: StrategyPriors,
}

/// Run-level parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub default_ticks: u64,
    /// Logical ticks per simulated second (independent of any frame rate)
    pub ticks_per_second: u32,
    /// Ticks between statistics summaries
    pub stats_interval: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            default_ticks: 3000,
            ticks_per_second: 60,
            stats_interval: 300,
        }
    }
}

/// World geometry and the default food spawn policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    pub obstacle_count: usize,
    pub obstacle_min_size: f32,
    pub obstacle_max_size: f32,
    pub max_plants: usize,
    pub max_meat: usize,
    pub plant_nutrition: f32,
    pub meat_nutrition: f32,
    /// Ticks between spawn attempts; 0 disables spawning
    pub spawn_interval: u64,
    pub plant_spawn_chance: f32,
    /// Maximum distance at which an agent can eat a resource
    pub consumption_radius: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 800.0,
            obstacle_count: 5,
            obstacle_min_size: 30.0,
            obstacle_max_size: 60.0,
            max_plants: 50,
            max_meat: 20,
            plant_nutrition: 30.0,
            meat_nutrition: 60.0,
            spawn_interval: 120,
            plant_spawn_chance: 0.7,
            consumption_radius: 15.0,
        }
    }
}

impl WorldConfig {
    pub fn nutrition(&self, kind: FoodKind) -> f32 {
        match kind {
            FoodKind::Plant => self.plant_nutrition,
            FoodKind::Meat => self.meat_nutrition,
        }
    }

    pub fn cap(&self, kind: FoodKind) -> usize {
        match kind {
            FoodKind::Plant => self.max_plants,
            FoodKind::Meat => self.max_meat,
        }
    }
}

/// Initial population per species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub gorilla: usize,
    pub chimp: usize,
    pub bonobo: usize,
    /// Relative jitter applied to strategy priors at spawn (0 = exact priors)
    pub prior_jitter: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            gorilla: 10,
            chimp: 10,
            bonobo: 10,
            prior_jitter: 0.2,
        }
    }
}

impl PopulationConfig {
    pub fn count(&self, species: Species) -> usize {
        match species {
            Species::Gorilla => self.gorilla,
            Species::Chimp => self.chimp,
            Species::Bonobo => self.bonobo,
        }
    }
}

/// Per-tick upkeep shared by all species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetabolismConfig {
    pub idle_multiplier: f32,
    pub foraging_multiplier: f32,
    pub fighting_multiplier: f32,
    pub fleeing_multiplier: f32,
    /// Energy fraction below which starvation damages health
    pub starvation_fraction: f32,
    pub starvation_damage: f32,
    pub age_increment: f32,
    /// Largest amount of a resource eaten in one tick
    pub bite_size: f32,
    /// Health restored per unit of energy gained from a meal
    pub meal_health_gain: f32,
    pub velocity_damping: f32,
}

impl Default for MetabolismConfig {
    fn default() -> Self {
        Self {
            idle_multiplier: 1.0,
            foraging_multiplier: 1.2,
            fighting_multiplier: 2.0,
            fleeing_multiplier: 1.5,
            starvation_fraction: 0.2,
            starvation_damage: 0.2,
            age_increment: 0.01,
            bite_size: 30.0,
            meal_health_gain: 0.5,
            velocity_damping: 0.9,
        }
    }
}

/// Static per-species profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProfile {
    pub base_speed: f32,
    pub vision_radius: f32,
    pub max_energy: f32,
    pub max_health: f32,
    pub attack_power: f32,
    pub defense: f32,
    /// Energy drained per tick before state multipliers
    pub metabolic_rate: f32,
    /// Range the individual hunger threshold is drawn from at spawn
    pub hunger_threshold_range: (f64, f64),
    pub max_age: f32,
    pub diet: Vec<FoodKind>,
    /// Energy gained per unit of food eaten
    pub energy_conversion: f32,
}

impl SpeciesProfile {
    pub fn gorilla() -> Self {
        Self {
            base_speed: 1.5,
            vision_radius: 120.0,
            max_energy: 100.0,
            max_health: 150.0,
            attack_power: 30.0,
            defense: 20.0,
            metabolic_rate: 0.13,
            hunger_threshold_range: (0.2, 0.8),
            max_age: 1000.0,
            diet: vec![FoodKind::Plant],
            energy_conversion: 0.8,
        }
    }

    pub fn chimp() -> Self {
        Self {
            base_speed: 3.0,
            vision_radius: 110.0,
            max_energy: 120.0,
            max_health: 100.0,
            attack_power: 25.0,
            defense: 10.0,
            metabolic_rate: 0.10,
            hunger_threshold_range: (0.2, 0.8),
            max_age: 800.0,
            diet: vec![FoodKind::Plant, FoodKind::Meat],
            energy_conversion: 1.0,
        }
    }

    pub fn bonobo() -> Self {
        Self {
            base_speed: 2.5,
            vision_radius: 140.0,
            max_energy: 110.0,
            max_health: 80.0,
            attack_power: 15.0,
            defense: 15.0,
            metabolic_rate: 0.08,
            hunger_threshold_range: (0.2, 0.8),
            max_age: 900.0,
            diet: vec![FoodKind::Plant],
            energy_conversion: 1.2,
        }
    }

    pub fn eats(&self, kind: FoodKind) -> bool {
        self.diet.contains(&kind)
    }
}

/// Profiles for the three species
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesTable {
    pub gorilla: SpeciesProfile,
    pub chimp: SpeciesProfile,
    pub bonobo: SpeciesProfile,
}

impl Default for SpeciesTable {
    fn default() -> Self {
        Self {
            gorilla: SpeciesProfile::gorilla(),
            chimp: SpeciesProfile::chimp(),
            bonobo: SpeciesProfile::bonobo(),
        }
    }
}

impl SpeciesTable {
    pub fn profile(&self, species: Species) -> &SpeciesProfile {
        match species {
            Species::Gorilla => &self.gorilla,
            Species::Chimp => &self.chimp,
            Species::Bonobo => &self.bonobo,
        }
    }

    pub fn profile_mut(&mut self, species: Species) -> &mut SpeciesProfile {
        match species {
            Species::Gorilla => &mut self.gorilla,
            Species::Chimp => &mut self.chimp,
            Species::Bonobo => &mut self.bonobo,
        }
    }
}

/// Interaction and detection distances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiiConfig {
    /// Distance within which agents can learn from each other
    pub interaction: f32,
    /// Threat radius as a multiple of vision
    pub threat_factor: f32,
    /// Extra threat-radius multiplier while the Ambush forager is active
    pub ambush_threat_bonus: f32,
    /// Fleeing ends once the threat is this many visions away
    pub safe_factor: f32,
    /// Allies within this distance count as support for Group combat
    pub support: f32,
    /// Distance at which a strike lands
    pub strike_range: f32,
    /// Two agents contest a resource when both are this close to it
    pub contest: f32,
}

impl Default for RadiiConfig {
    fn default() -> Self {
        Self {
            interaction: 80.0,
            threat_factor: 1.5,
            ambush_threat_bonus: 1.3,
            safe_factor: 2.0,
            support: 150.0,
            strike_range: 20.0,
            contest: 40.0,
        }
    }
}

/// Fight and flight triggers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Minimum energy fraction to pick a fight
    pub fight_energy_fraction: f32,
    /// Own fitness must exceed a rival's by this factor to pick a fight
    pub aggression_margin: f32,
    /// A rival this much fitter than the agent is a threat
    pub hostility_margin: f32,
    /// Below this health fraction any rival in range is a threat
    pub flee_health_fraction: f32,
    /// Defensive fighters disengage below this health fraction
    pub defensive_safety_margin: f32,
    /// Fights break off when the opponent is farther than this
    pub disengage_distance: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            fight_energy_fraction: 0.4,
            aggression_margin: 1.2,
            hostility_margin: 1.2,
            flee_health_fraction: 0.3,
            defensive_safety_margin: 0.5,
            disengage_distance: 100.0,
        }
    }
}

/// Social learning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// Blend factor in (0, 1]
    pub rate: f64,
    /// Ticks between learning rounds
    pub interval: u64,
    pub same_species_only: bool,
    /// Only imitate neighbours that are fitter than oneself
    pub fitter_teachers_only: bool,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            rate: 0.1,
            interval: 30,
            same_species_only: true,
            fitter_teachers_only: true,
        }
    }
}

/// Chance per tick of re-drawing the active strategy while staying in a context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub foraging_reselect_chance: f32,
    pub combat_reselect_chance: f32,
    pub flee_reselect_chance: f32,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            foraging_reselect_chance: 0.1,
            combat_reselect_chance: 0.05,
            flee_reselect_chance: 0.05,
        }
    }
}

/// Starting weight priors per strategy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyPriors {
    pub foraging: ForagingPriors,
    pub combat: CombatPriors,
    pub flee: FleePriors,
}

impl Default for StrategyPriors {
    fn default() -> Self {
        Self {
            foraging: ForagingPriors {
                wide_view: 1.0,
                fast_move: 1.0,
                random_walk: 1.0,
                ambush: 1.0,
            },
            combat: CombatPriors {
                aggressive: 1.0,
                defensive: 1.0,
                group: 1.0,
            },
            flee: FleePriors {
                speed: 1.0,
                hide: 1.0,
                scatter: 1.0,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForagingPriors {
    pub wide_view: f64,
    pub fast_move: f64,
    pub random_walk: f64,
    pub ambush: f64,
}

impl ForagingPriors {
    /// Priors in catalog order
    pub fn weights(&self) -> Vec<f64> {
        vec![self.wide_view, self.fast_move, self.random_walk, self.ambush]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatPriors {
    pub aggressive: f64,
    pub defensive: f64,
    pub group: f64,
}

impl CombatPriors {
    pub fn weights(&self) -> Vec<f64> {
        vec![self.aggressive, self.defensive, self.group]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleePriors {
    pub speed: f64,
    pub hide: f64,
    pub scatter: f64,
}

impl FleePriors {
    pub fn weights(&self) -> Vec<f64> {
        vec![self.speed, self.hide, self.scatter]
    }
}

impl SimConfig {
    /// Load configuration from a TOML file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string and validate it
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value the engine relies on being in range
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.learning.rate;
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(ConfigError::invalid("learning.rate", format!("{} is outside (0, 1]", rate)));
        }

        if !(self.world.width > 0.0 && self.world.height > 0.0) {
            return Err(ConfigError::invalid("world", "width and height must be positive"));
        }
        if self.world.consumption_radius <= 0.0 {
            return Err(ConfigError::invalid("world.consumption_radius", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.world.plant_spawn_chance) {
            return Err(ConfigError::invalid("world.plant_spawn_chance", "must be within [0, 1]"));
        }
        if self.world.obstacle_min_size > self.world.obstacle_max_size {
            return Err(ConfigError::invalid("world.obstacle_min_size", "exceeds obstacle_max_size"));
        }

        let radii = [
            ("radii.interaction", self.radii.interaction),
            ("radii.threat_factor", self.radii.threat_factor),
            ("radii.safe_factor", self.radii.safe_factor),
            ("radii.support", self.radii.support),
            ("radii.strike_range", self.radii.strike_range),
            ("radii.contest", self.radii.contest),
        ];
        for (field, value) in radii {
            if !(value > 0.0 && value.is_finite()) {
                return Err(ConfigError::invalid(field, format!("{} must be positive", value)));
            }
        }

        for species in Species::all() {
            let profile = self.species.profile(*species);
            if !(profile.max_energy > 0.0 && profile.max_health > 0.0) {
                return Err(ConfigError::invalid(
                    "species",
                    format!("{} needs positive max_energy and max_health", species.name()),
                ));
            }
            for (field, value) in [
                ("species.base_speed", profile.base_speed),
                ("species.vision_radius", profile.vision_radius),
            ] {
                if !(value > 0.0 && value.is_finite()) {
                    return Err(ConfigError::invalid(
                        field,
                        format!("{} has {}, must be positive", species.name(), value),
                    ));
                }
            }
            let (low, high) = profile.hunger_threshold_range;
            if !(0.0..=1.0).contains(&low) || !(0.0..=1.0).contains(&high) || low > high {
                return Err(ConfigError::invalid(
                    "species.hunger_threshold_range",
                    format!("{} has ({}, {})", species.name(), low, high),
                ));
            }
        }

        let priors = self
            .strategies
            .foraging
            .weights()
            .into_iter()
            .chain(self.strategies.combat.weights())
            .chain(self.strategies.flee.weights());
        for weight in priors {
            if !(weight >= 0.0 && weight.is_finite()) {
                return Err(ConfigError::invalid("strategies", format!("prior {} is not a finite non-negative number", weight)));
            }
        }

        Ok(())
    }

    /// Serialize this configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
