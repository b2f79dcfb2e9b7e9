//! Learned Repertoire
//!
//! The part of an agent that social learning reads and writes: the
//! hunger threshold and one probability table per strategy context.

use std::collections::BTreeMap;

use bevy_ecs::prelude::*;

use crate::strategy::{
    CombatStrategy, FleeStrategy, ForagingStrategy, ProbabilityTable, StrategyContext, Variant,
};

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Repertoire {
    /// Energy fraction below which the agent goes foraging, in [0, 1]
    pub hunger_threshold: f64,
    pub foraging: ProbabilityTable<ForagingStrategy>,
    pub combat: ProbabilityTable<CombatStrategy>,
    pub flee: ProbabilityTable<FleeStrategy>,
}

impl Default for Repertoire {
    fn default() -> Self {
        Self {
            hunger_threshold: 0.5,
            foraging: ProbabilityTable::uniform(),
            combat: ProbabilityTable::uniform(),
            flee: ProbabilityTable::uniform(),
        }
    }
}

impl Repertoire {
    pub fn new(
        hunger_threshold: f64,
        foraging: ProbabilityTable<ForagingStrategy>,
        combat: ProbabilityTable<CombatStrategy>,
        flee: ProbabilityTable<FleeStrategy>,
    ) -> Self {
        Self {
            hunger_threshold: clamp_threshold(hunger_threshold),
            foraging,
            combat,
            flee,
        }
    }

    /// Blend every table and the threshold toward `teacher`.
    ///
    /// The teacher is only read. A rate of 1 makes this repertoire an exact
    /// copy; a rate of 0 (or less) leaves it unchanged.
    pub fn learn(&mut self, teacher: &Repertoire, rate: f64) {
        let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        if rate <= 0.0 {
            return;
        }
        self.foraging.blend_toward(&teacher.foraging, rate);
        self.combat.blend_toward(&teacher.combat, rate);
        self.flee.blend_toward(&teacher.flee, rate);

        self.hunger_threshold = if rate >= 1.0 {
            teacher.hunger_threshold
        } else {
            self.hunger_threshold + rate * (teacher.hunger_threshold - self.hunger_threshold)
        };
        self.hunger_threshold = clamp_threshold(self.hunger_threshold);
    }

    /// True when every table is a simplex and the threshold is in range
    pub fn is_valid(&self, tolerance: f64) -> bool {
        self.foraging.is_simplex(tolerance)
            && self.combat.is_simplex(tolerance)
            && self.flee.is_simplex(tolerance)
            && (0.0..=1.0).contains(&self.hunger_threshold)
    }

    /// Largest weight or threshold difference to another repertoire
    pub fn distance(&self, other: &Repertoire) -> f64 {
        self.foraging
            .distance(&other.foraging)
            .max(self.combat.distance(&other.combat))
            .max(self.flee.distance(&other.flee))
            .max((self.hunger_threshold - other.hunger_threshold).abs())
    }

    /// Tables keyed by context name then variant name
    pub fn table_weights(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        let mut tables = BTreeMap::new();
        tables.insert(StrategyContext::Foraging.name().to_string(), named(&self.foraging));
        tables.insert(StrategyContext::Combat.name().to_string(), named(&self.combat));
        tables.insert(StrategyContext::Flee.name().to_string(), named(&self.flee));
        tables
    }
}

fn named<V: Variant>(table: &ProbabilityTable<V>) -> BTreeMap<String, f64> {
    table.iter().map(|(variant, weight)| (variant.name().to_string(), weight)).collect()
}

fn clamp_threshold(value: f64) -> f64 {
    if value.is_nan() {
        0.5
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skewed() -> Repertoire {
        Repertoire::new(
            0.8,
            ProbabilityTable::from_weights(&[0.7, 0.1, 0.1, 0.1]),
            ProbabilityTable::from_weights(&[0.1, 0.1, 0.8]),
            ProbabilityTable::from_weights(&[0.2, 0.5, 0.3]),
        )
    }

    #[test]
    fn test_full_rate_copies_teacher() {
        let mut learner = Repertoire::default();
        let teacher = skewed();
        learner.learn(&teacher, 1.0);
        assert_eq!(learner, teacher);
    }

    #[test]
    fn test_self_teaching_is_idempotent() {
        let original = skewed();
        for rate in [0.05, 0.3, 0.75, 1.0] {
            let mut copy = original.clone();
            let teacher = original.clone();
            copy.learn(&teacher, rate);
            assert_eq!(copy, original, "rate {}", rate);
        }
    }

    #[test]
    fn test_repeated_learning_converges_monotonically() {
        let mut learner = Repertoire::default();
        let teacher = skewed();
        let mut previous = learner.distance(&teacher);
        for _ in 0..200 {
            learner.learn(&teacher, 0.1);
            let current = learner.distance(&teacher);
            assert!(current <= previous + 1e-12);
            assert!(learner.is_valid(1e-9));
            previous = current;
        }
        assert!(previous < 1e-6);
    }

    #[test]
    fn test_threshold_blend() {
        let mut learner = Repertoire::default();
        let teacher = skewed();
        learner.learn(&teacher, 0.5);
        assert!((learner.hunger_threshold - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_threshold_clamped_on_construction() {
        let repertoire = Repertoire::new(
            1.7,
            ProbabilityTable::uniform(),
            ProbabilityTable::uniform(),
            ProbabilityTable::uniform(),
        );
        assert_eq!(repertoire.hunger_threshold, 1.0);
    }

    #[test]
    fn test_table_weights_names() {
        let tables = skewed().table_weights();
        assert_eq!(tables.len(), 3);
        assert_eq!(tables["foraging"].len(), 4);
        assert!((tables["combat"]["Group"] - 0.8).abs() < 1e-12);
    }
}
