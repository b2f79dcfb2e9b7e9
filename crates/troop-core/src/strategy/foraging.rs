//! Foraging Variants
//!
//! Where to look for food and how fast to go after it.

use super::intent::{Intent, LocalView, Noise, ResourceSighting};
use super::ForagingStrategy;

/// Vision multipliers and speeds for each foraging variant
pub mod foraging_constants {
    pub const WIDE_VIEW_RANGE: f32 = 1.5;
    pub const WIDE_VIEW_SPEED: f32 = 0.7;
    pub const FAST_MOVE_RANGE: f32 = 0.6;
    pub const FAST_MOVE_SPEED: f32 = 1.5;
    pub const RANDOM_WALK_SPEED: f32 = 1.0;
    /// Ambushers only react to food within this fraction of their vision
    pub const AMBUSH_TRIGGER_RANGE: f32 = 0.4;
    pub const AMBUSH_SPEED: f32 = 0.5;
    /// Speed factor while searching with nothing in sight
    pub const SEARCH_FACTOR: f32 = 0.5;
    /// Farthest any foraging variant looks, as a vision multiplier
    pub const MAX_RANGE: f32 = WIDE_VIEW_RANGE;
}

use foraging_constants::*;

/// How far a variant can see, as a multiple of vision radius
pub fn detection_range(strategy: ForagingStrategy) -> f32 {
    match strategy {
        ForagingStrategy::WideView => WIDE_VIEW_RANGE,
        ForagingStrategy::FastMove => FAST_MOVE_RANGE,
        ForagingStrategy::RandomWalk => 0.0,
        ForagingStrategy::Ambush => AMBUSH_TRIGGER_RANGE,
    }
}

/// Foraging decision for one agent
pub fn decide(strategy: ForagingStrategy, view: &LocalView, noise: Noise) -> Intent {
    let range = view.vision * detection_range(strategy);
    match strategy {
        ForagingStrategy::WideView => match richest(view, range) {
            Some(target) => seek(target, WIDE_VIEW_SPEED),
            None => search(view, noise, WIDE_VIEW_SPEED),
        },
        ForagingStrategy::FastMove => match view.resources_within(range).next() {
            Some(target) => seek(target, FAST_MOVE_SPEED),
            None => search(view, noise, FAST_MOVE_SPEED),
        },
        ForagingStrategy::RandomWalk => Intent::Wander {
            heading: view.wander_heading(noise),
            speed: RANDOM_WALK_SPEED,
        },
        ForagingStrategy::Ambush => match view.resources_within(range).next() {
            Some(target) => seek(target, AMBUSH_SPEED),
            None => Intent::Hold,
        },
    }
}

/// Highest amount wins; nearer then lower id breaks ties
fn richest(view: &LocalView, range: f32) -> Option<&ResourceSighting> {
    let mut best: Option<&ResourceSighting> = None;
    for sighting in view.resources_within(range) {
        // Sightings arrive nearest first, so only a strictly larger amount replaces
        if best.map_or(true, |b| sighting.amount > b.amount) {
            best = Some(sighting);
        }
    }
    best
}

fn seek(target: &ResourceSighting, speed: f32) -> Intent {
    Intent::Seek {
        resource: target.id,
        position: target.position,
        speed,
    }
}

fn search(view: &LocalView, noise: Noise, speed: f32) -> Intent {
    Intent::Wander {
        heading: view.wander_heading(noise),
        speed: speed * SEARCH_FACTOR,
    }
}
