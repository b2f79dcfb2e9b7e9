//! Decision Inputs and Outputs
//!
//! Strategy decision functions read a [`LocalView`] built from the tick-start
//! snapshot and return an [`Intent`]. They never touch the world directly.

use rand::Rng;
use std::f32::consts::{FRAC_PI_2, TAU};

use super::combat::CombatStance;
use crate::components::{AgentId, FoodKind, LifeState, Obstacle, ResourceId, Species, Vec2};

/// What an agent means to do this tick.
///
/// Speeds are multipliers of the species base speed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Keep drifting on the current (damped) velocity
    Hold,
    Wander { heading: Vec2, speed: f32 },
    /// Head for a food resource
    Seek { resource: ResourceId, position: Vec2, speed: f32 },
    /// Close in on an opponent that is out of strike range
    Engage { opponent: AgentId, position: Vec2, speed: f32 },
    Strike { opponent: AgentId, stance: CombatStance },
    /// Abandon the fight and switch to fleeing
    Retreat,
    Evade { heading: Vec2, speed: f32 },
    TakeCover { spot: Vec2, speed: f32 },
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Hold => "hold",
            Intent::Wander { .. } => "wander",
            Intent::Seek { .. } => "seek",
            Intent::Engage { .. } => "engage",
            Intent::Strike { .. } => "strike",
            Intent::Retreat => "retreat",
            Intent::Evade { .. } => "evade",
            Intent::TakeCover { .. } => "take_cover",
        }
    }
}

/// Two uniform samples in [0, 1), drawn during selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Noise {
    pub heading: f32,
    pub offset: f32,
}

impl Noise {
    pub fn new(heading: f32, offset: f32) -> Self {
        Self { heading, offset }
    }

    pub fn draw<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            heading: rng.gen::<f32>(),
            offset: rng.gen::<f32>(),
        }
    }

    /// Unit vector for a random heading
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.heading * TAU)
    }

    /// Centred offset in [-0.5, 0.5)
    pub fn centered(&self) -> f32 {
        self.offset - 0.5
    }
}

/// Another living agent as seen from the snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub id: AgentId,
    pub species: Species,
    pub position: Vec2,
    pub distance: f32,
    pub fitness: f32,
    pub state: LifeState,
}

/// An edible resource in sight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSighting {
    pub id: ResourceId,
    pub kind: FoodKind,
    pub position: Vec2,
    pub amount: f32,
    pub distance: f32,
}

/// Largest turn, in radians, a wandering agent makes in one tick
pub const WANDER_TURN: f32 = FRAC_PI_2;

/// Everything a decision function may look at
#[derive(Debug, Clone, Default)]
pub struct LocalView {
    pub position: Vec2,
    pub velocity: Vec2,
    pub vision: f32,
    pub health_fraction: f32,
    pub attack_power: f32,
    pub defense: f32,
    /// Edible resources, nearest first (ties by id)
    pub resources: Vec<ResourceSighting>,
    pub obstacles: Vec<Obstacle>,
    pub threat: Option<Neighbor>,
    pub opponent: Option<Neighbor>,
    /// Living same-species agents within support radius
    pub allies: usize,
}

impl LocalView {
    /// Sightings within `radius`, nearest first
    pub fn resources_within(&self, radius: f32) -> impl Iterator<Item = &ResourceSighting> {
        self.resources.iter().filter(move |r| r.distance <= radius)
    }

    /// Heading for an aimless walk: the current course turned by at most
    /// half of [`WANDER_TURN`] either way, or a fresh heading when standing still
    pub fn wander_heading(&self, noise: Noise) -> Vec2 {
        let course = self.velocity.normalized();
        if course.is_zero() {
            noise.direction()
        } else {
            course.rotated(noise.centered() * WANDER_TURN)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn test_noise_in_unit_range() {
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..200 {
            let noise = Noise::draw(&mut rng);
            assert!((0.0..1.0).contains(&noise.heading));
            assert!((-0.5..0.5).contains(&noise.centered()));
            assert!((noise.direction().length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_resources_within_filters_by_distance() {
        let sighting = |id, distance| ResourceSighting {
            id: ResourceId(id),
            kind: FoodKind::Plant,
            position: Vec2::ZERO,
            amount: 10.0,
            distance,
        };
        let view = LocalView {
            resources: vec![sighting(1, 5.0), sighting(2, 50.0)],
            ..Default::default()
        };
        let ids: Vec<_> = view.resources_within(10.0).map(|r| r.id).collect();
        assert_eq!(ids, vec![ResourceId(1)]);
    }

    #[test]
    fn test_wander_keeps_rough_course() {
        let moving = LocalView {
            velocity: Vec2::new(2.0, 0.0),
            ..Default::default()
        };
        let heading = moving.wander_heading(Noise::new(0.9, 0.5));
        assert!((heading.x - 1.0).abs() < 1e-6);

        let still = LocalView::default();
        let fresh = still.wander_heading(Noise::new(0.5, 0.5));
        assert!((fresh.x + 1.0).abs() < 1e-5);
    }
}
