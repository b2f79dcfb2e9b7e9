//! Strategy Statistics
//!
//! Periodic aggregate of agents' strategy-probability tables, grouped by species.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mean strategy preferences of one species' living members
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesStrategyStats {
    pub population: usize,
    pub mean_hunger_threshold: f64,
    /// context name -> (strategy name -> mean weight)
    pub contexts: BTreeMap<String, BTreeMap<String, f64>>,
}

impl SpeciesStrategyStats {
    /// Mean weight of a strategy, if the context and strategy are present
    pub fn mean_weight(&self, context: &str, strategy: &str) -> Option<f64> {
        self.contexts.get(context)?.get(strategy).copied()
    }

    /// Highest-weighted strategy in a context
    pub fn dominant(&self, context: &str) -> Option<(&str, f64)> {
        self.contexts
            .get(context)?
            .iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(name, weight)| (name.as_str(), *weight))
    }
}

/// Snapshot of strategy adoption across all species
///
/// Extinct species are absent from `species`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyDistribution {
    pub tick: u64,
    pub species: BTreeMap<String, SpeciesStrategyStats>,
}

impl StrategyDistribution {
    pub fn new(tick: u64) -> Self {
        Self {
            tick,
            species: BTreeMap::new(),
        }
    }

    pub fn get(&self, species: &str) -> Option<&SpeciesStrategyStats> {
        self.species.get(species)
    }

    pub fn total_population(&self) -> usize {
        self.species.values().map(|s| s.population).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats() -> SpeciesStrategyStats {
        let mut foraging = BTreeMap::new();
        foraging.insert("WideView".to_string(), 0.1);
        foraging.insert("FastMove".to_string(), 0.6);
        foraging.insert("RandomWalk".to_string(), 0.2);
        foraging.insert("Ambush".to_string(), 0.1);

        let mut contexts = BTreeMap::new();
        contexts.insert("foraging".to_string(), foraging);

        SpeciesStrategyStats {
            population: 4,
            mean_hunger_threshold: 0.5,
            contexts,
        }
    }

    #[test]
    fn test_dominant_strategy() {
        let stats = stats();
        assert_eq!(stats.dominant("foraging"), Some(("FastMove", 0.6)));
        assert_eq!(stats.dominant("combat"), None);
        assert_eq!(stats.mean_weight("foraging", "Ambush"), Some(0.1));
        assert_eq!(stats.mean_weight("foraging", "Hide"), None);
    }

    #[test]
    fn test_distribution_totals() {
        let mut distribution = StrategyDistribution::new(30);
        distribution.species.insert("Chimp".into(), stats());
        assert_eq!(distribution.total_population(), 4);
        assert!(distribution.get("Gorilla").is_none());

        let json = serde_json::to_string(&distribution).unwrap();
        let parsed: StrategyDistribution = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, distribution);
    }
}
