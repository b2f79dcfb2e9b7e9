//! Probability Tables
//!
//! Per-agent, per-context weights over a context's variants. A table is a
//! probability simplex: every weight is finite and non-negative and the
//! weights sum to 1. Every mutating operation restores that invariant.

use std::fmt;
use std::marker::PhantomData;

use super::Variant;

/// Tolerance used when deciding whether a table still sums to one
pub const SIMPLEX_TOLERANCE: f64 = 1e-12;

/// Selection weights over the variants of one context, in catalog order
#[derive(Clone, PartialEq)]
pub struct ProbabilityTable<V: Variant> {
    weights: Vec<f64>,
    _variant: PhantomData<V>,
}

impl<V: Variant> fmt::Debug for ProbabilityTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(V::ALL.iter().map(|v| (v.name(), self.weight(*v))))
            .finish()
    }
}

impl<V: Variant> Default for ProbabilityTable<V> {
    fn default() -> Self {
        Self::uniform()
    }
}

impl<V: Variant> ProbabilityTable<V> {
    /// Equal weight on every variant
    pub fn uniform() -> Self {
        let n = V::ALL.len();
        Self {
            weights: vec![1.0 / n as f64; n],
            _variant: PhantomData,
        }
    }

    /// Build from raw weights in catalog order.
    ///
    /// Missing entries count as zero, negative or non-finite entries are
    /// clamped to zero, and a table with no positive weight becomes uniform.
    pub fn from_weights(raw: &[f64]) -> Self {
        let weights = V::ALL
            .iter()
            .enumerate()
            .map(|(i, _)| raw.get(i).copied().filter(|w| w.is_finite()).unwrap_or(0.0).max(0.0))
            .collect();
        let mut table = Self {
            weights,
            _variant: PhantomData,
        };
        table.normalize();
        table
    }

    pub fn weight(&self, variant: V) -> f64 {
        self.weights.get(variant.index()).copied().unwrap_or(0.0)
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn total(&self) -> f64 {
        self.weights.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (V, f64)> + '_ {
        V::ALL.iter().map(move |v| (*v, self.weight(*v)))
    }

    /// The highest-weighted variant; earlier catalog entries win ties
    pub fn dominant(&self) -> V {
        let mut best = V::ALL[0];
        for (variant, weight) in self.iter() {
            if weight > self.weight(best) {
                best = variant;
            }
        }
        best
    }

    /// True when all weights are non-negative and sum to one within `tolerance`
    pub fn is_simplex(&self, tolerance: f64) -> bool {
        self.weights.iter().all(|w| w.is_finite() && *w >= 0.0) && (self.total() - 1.0).abs() <= tolerance
    }

    /// Rescale so the weights sum to one; a degenerate table becomes uniform
    pub fn normalize(&mut self) {
        for w in &mut self.weights {
            if !w.is_finite() || *w < 0.0 {
                *w = 0.0;
            }
        }
        let total = self.total();
        if total <= 0.0 || !total.is_finite() {
            *self = Self::uniform();
            return;
        }
        if (total - 1.0).abs() > SIMPLEX_TOLERANCE {
            for w in &mut self.weights {
                *w /= total;
            }
        }
    }

    /// Move each weight toward `teacher` by `rate`, then renormalize.
    ///
    /// `rate` is clamped to [0, 1]. At 0 the table is untouched; at 1 it
    /// becomes an exact copy of the teacher's.
    pub fn blend_toward(&mut self, teacher: &ProbabilityTable<V>, rate: f64) {
        let rate = if rate.is_finite() { rate.clamp(0.0, 1.0) } else { 0.0 };
        if rate <= 0.0 {
            return;
        }
        if rate >= 1.0 {
            self.weights.clone_from(&teacher.weights);
            return;
        }
        for (own, theirs) in self.weights.iter_mut().zip(&teacher.weights) {
            *own += rate * (theirs - *own);
        }
        self.normalize();
    }

    /// Largest absolute weight difference to another table
    pub fn distance(&self, other: &ProbabilityTable<V>) -> f64 {
        self.weights
            .iter()
            .zip(&other.weights)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}
