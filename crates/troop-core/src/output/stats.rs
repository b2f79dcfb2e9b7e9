//! Strategy Statistics
//!
//! Per-species means of the strategy tables and hunger thresholds over the
//! living population.

use std::collections::BTreeMap;
use troop_events::{SpeciesStrategyStats, StrategyDistribution};

use crate::components::{Repertoire, Species};

#[derive(Default)]
struct Accumulator {
    population: usize,
    threshold_sum: f64,
    sums: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Accumulator {
    fn add(&mut self, repertoire: &Repertoire) {
        self.population += 1;
        self.threshold_sum += repertoire.hunger_threshold;
        for (context, weights) in repertoire.table_weights() {
            let sums = self.sums.entry(context).or_default();
            for (strategy, weight) in weights {
                *sums.entry(strategy).or_insert(0.0) += weight;
            }
        }
    }

    fn finish(self) -> SpeciesStrategyStats {
        let n = self.population as f64;
        let contexts = self
            .sums
            .into_iter()
            .map(|(context, sums)| (context, sums.into_iter().map(|(s, sum)| (s, sum / n)).collect()))
            .collect();
        SpeciesStrategyStats {
            population: self.population,
            mean_hunger_threshold: self.threshold_sum / n,
            contexts,
        }
    }
}

/// Summarize the given living agents. Species with no members are absent
pub fn strategy_distribution<'a>(
    tick: u64,
    agents: impl IntoIterator<Item = (Species, &'a Repertoire)>,
) -> StrategyDistribution {
    let mut accumulators: BTreeMap<Species, Accumulator> = BTreeMap::new();
    for (species, repertoire) in agents {
        accumulators.entry(species).or_default().add(repertoire);
    }

    let mut distribution = StrategyDistribution::new(tick);
    for (species, accumulator) in accumulators {
        distribution.species.insert(species.name().to_string(), accumulator.finish());
    }
    distribution
}
