//! Selection Policy
//!
//! Weighted-random choice of one variant from a probability table.

use rand::Rng;

use super::table::ProbabilityTable;
use super::Variant;

/// Outcome of a weighted draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection<V: Variant> {
    pub variant: V,
    /// The table had no usable weight and a uniform draw was made instead
    pub fallback: bool,
}

/// Draw a variant with probability proportional to its weight.
///
/// Zero-weight variants are never chosen. A table whose weights are all zero
/// or not finite falls back to a uniform draw and logs a warning.
pub fn select_variant<V: Variant, R: Rng + ?Sized>(table: &ProbabilityTable<V>, rng: &mut R) -> Selection<V> {
    let usable = table.weights().iter().all(|w| w.is_finite() && *w >= 0.0);
    let total = table.total();

    if !usable || total <= 0.0 || !total.is_finite() {
        tracing::warn!(
            "Degenerate {} table {:?}, selecting uniformly",
            V::CONTEXT.name(),
            table.weights()
        );
        let variant = V::ALL[rng.gen_range(0..V::ALL.len())];
        return Selection { variant, fallback: true };
    }

    let roll = rng.gen::<f64>() * total;
    let mut cumulative = 0.0;
    let mut last_positive = None;
    for (variant, weight) in table.iter() {
        if weight <= 0.0 {
            continue;
        }
        cumulative += weight;
        last_positive = Some(variant);
        if roll < cumulative {
            return Selection { variant, fallback: false };
        }
    }

    // Rounding can leave the roll a hair above the final cumulative sum
    Selection {
        variant: last_positive.unwrap_or(V::ALL[0]),
        fallback: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{CombatStrategy, ForagingStrategy, FleeStrategy};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_certain_variant_always_chosen() {
        let table = ProbabilityTable::<ForagingStrategy>::from_weights(&[0.0, 0.0, 1.0, 0.0]);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..500 {
            let selection = select_variant(&table, &mut rng);
            assert_eq!(selection.variant, ForagingStrategy::RandomWalk);
            assert!(!selection.fallback);
        }
    }

    #[test]
    fn test_zero_weight_never_chosen() {
        let table = ProbabilityTable::<CombatStrategy>::from_weights(&[0.5, 0.0, 0.5]);
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..2000 {
            assert_ne!(select_variant(&table, &mut rng).variant, CombatStrategy::Defensive);
        }
    }

    #[test]
    fn test_frequencies_follow_weights() {
        let table = ProbabilityTable::<FleeStrategy>::from_weights(&[0.6, 0.3, 0.1]);
        let mut rng = SmallRng::seed_from_u64(42);
        let draws = 20_000;
        let mut counts = [0usize; 3];
        for _ in 0..draws {
            counts[select_variant(&table, &mut rng).variant.index()] += 1;
        }
        let expected = [0.6, 0.3, 0.1];
        for (count, p) in counts.iter().zip(expected) {
            let observed = *count as f64 / draws as f64;
            assert!((observed - p).abs() < 0.02, "observed {} expected {}", observed, p);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let table = ProbabilityTable::<ForagingStrategy>::uniform();
        let mut a = SmallRng::seed_from_u64(3);
        let mut b = SmallRng::seed_from_u64(3);
        for _ in 0..100 {
            assert_eq!(select_variant(&table, &mut a), select_variant(&table, &mut b));
        }
    }
}
