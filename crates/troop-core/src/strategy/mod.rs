//! Strategy Catalog
//!
//! The closed set of behavioural variants, grouped into three contexts, plus
//! the per-agent probability tables over them and the selection policy.
//! Variants are plain enums; their decision logic lives in the per-context
//! modules as pure functions.

pub mod combat;
pub mod flee;
pub mod foraging;
pub mod intent;
pub mod select;
pub mod table;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use intent::{Intent, LocalView, Neighbor, Noise, ResourceSighting};
pub use select::{select_variant, Selection};
pub use table::ProbabilityTable;

/// A behavioural domain with its own strategy set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyContext {
    Foraging,
    Combat,
    Flee,
}

impl StrategyContext {
    pub fn all() -> &'static [StrategyContext] {
        &[StrategyContext::Foraging, StrategyContext::Combat, StrategyContext::Flee]
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyContext::Foraging => "foraging",
            StrategyContext::Combat => "combat",
            StrategyContext::Flee => "flee",
        }
    }
}

/// A strategy variant belonging to exactly one context
///
/// `ALL` fixes the catalog order, which is also the order the selection
/// policy walks when accumulating weight.
pub trait Variant: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    const CONTEXT: StrategyContext;
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    /// Position in `ALL`
    fn index(self) -> usize;
}

/// Foraging variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForagingStrategy {
    /// Sees far, moves slowly, goes for the richest patch in sight
    WideView,
    /// Sees little, moves fast, goes for the nearest patch
    FastMove,
    /// Ignores food it sees and roams on a random heading
    RandomWalk,
    /// Waits in place until food comes within a short trigger radius
    Ambush,
}

impl Variant for ForagingStrategy {
    const CONTEXT: StrategyContext = StrategyContext::Foraging;
    const ALL: &'static [Self] = &[
        ForagingStrategy::WideView,
        ForagingStrategy::FastMove,
        ForagingStrategy::RandomWalk,
        ForagingStrategy::Ambush,
    ];

    fn name(self) -> &'static str {
        match self {
            ForagingStrategy::WideView => "WideView",
            ForagingStrategy::FastMove => "FastMove",
            ForagingStrategy::RandomWalk => "RandomWalk",
            ForagingStrategy::Ambush => "Ambush",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Combat variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatStrategy {
    /// Always engages, hits hard, takes heavy retaliation
    Aggressive,
    /// Engages only while healthy, hits with a defense bonus and absorbs damage
    Defensive,
    /// Engages only with same-species support nearby
    Group,
}

impl Variant for CombatStrategy {
    const CONTEXT: StrategyContext = StrategyContext::Combat;
    const ALL: &'static [Self] = &[CombatStrategy::Aggressive, CombatStrategy::Defensive, CombatStrategy::Group];

    fn name(self) -> &'static str {
        match self {
            CombatStrategy::Aggressive => "Aggressive",
            CombatStrategy::Defensive => "Defensive",
            CombatStrategy::Group => "Group",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Flee variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FleeStrategy {
    /// Straight away from the threat at full speed
    Speed,
    /// Behind the nearest obstacle, or Speed when there is none
    Hide,
    /// Away from the threat at a randomized angle offset
    Scatter,
}

impl Variant for FleeStrategy {
    const CONTEXT: StrategyContext = StrategyContext::Flee;
    const ALL: &'static [Self] = &[FleeStrategy::Speed, FleeStrategy::Hide, FleeStrategy::Scatter];

    fn name(self) -> &'static str {
        match self {
            FleeStrategy::Speed => "Speed",
            FleeStrategy::Hide => "Hide",
            FleeStrategy::Scatter => "Scatter",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Any variant, tagged with its context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyName {
    Foraging(ForagingStrategy),
    Combat(CombatStrategy),
    Flee(FleeStrategy),
}

impl StrategyName {
    pub fn context(&self) -> StrategyContext {
        match self {
            StrategyName::Foraging(_) => StrategyContext::Foraging,
            StrategyName::Combat(_) => StrategyContext::Combat,
            StrategyName::Flee(_) => StrategyContext::Flee,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StrategyName::Foraging(s) => s.name(),
            StrategyName::Combat(s) => s.name(),
            StrategyName::Flee(s) => s.name(),
        }
    }

    /// Every variant in the catalog, context by context
    pub fn all() -> Vec<StrategyName> {
        ForagingStrategy::ALL
            .iter()
            .map(|s| StrategyName::Foraging(*s))
            .chain(CombatStrategy::ALL.iter().map(|s| StrategyName::Combat(*s)))
            .chain(FleeStrategy::ALL.iter().map(|s| StrategyName::Flee(*s)))
            .collect()
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
