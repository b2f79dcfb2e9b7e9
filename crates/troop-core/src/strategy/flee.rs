//! Flee Variants
//!
//! Which way to run once a threat has been sensed.

use super::intent::{Intent, LocalView, Neighbor, Noise};
use super::FleeStrategy;
use crate::components::{Obstacle, Vec2};

pub mod flee_constants {
    pub const SPEED_MULTIPLIER: f32 = 2.0;
    pub const HIDE_SPEED: f32 = 1.5;
    /// Clearance kept between the obstacle's corner radius and the hiding spot
    pub const HIDE_OFFSET: f32 = 15.0;
    pub const SCATTER_SPEED: f32 = 1.5;
    /// Full width of the random angle band around the direct-away heading
    pub const SCATTER_SPREAD: f32 = std::f32::consts::FRAC_PI_2;
}

use flee_constants::*;

/// Flee decision for one agent
pub fn decide(strategy: FleeStrategy, view: &LocalView, noise: Noise) -> Intent {
    let Some(threat) = view.threat else {
        return Intent::Hold;
    };
    match strategy {
        FleeStrategy::Speed => outrun(view, &threat, noise),
        FleeStrategy::Hide => match nearest_cover(view) {
            Some(cover) => Intent::TakeCover {
                spot: hiding_spot(cover, threat.position, view.position),
                speed: HIDE_SPEED,
            },
            None => outrun(view, &threat, noise),
        },
        FleeStrategy::Scatter => Intent::Evade {
            heading: away_from(view.position, threat.position, noise).rotated(noise.centered() * SCATTER_SPREAD),
            speed: SCATTER_SPEED,
        },
    }
}

fn outrun(view: &LocalView, threat: &Neighbor, noise: Noise) -> Intent {
    Intent::Evade {
        heading: away_from(view.position, threat.position, noise),
        speed: SPEED_MULTIPLIER,
    }
}

/// Unit vector pointing away from `threat`; a random heading if on top of it
fn away_from(position: Vec2, threat: Vec2, noise: Noise) -> Vec2 {
    let away = (position - threat).normalized();
    if away.is_zero() {
        noise.direction()
    } else {
        away
    }
}

/// Obstacle closest to the agent; earlier obstacles win ties
fn nearest_cover(view: &LocalView) -> Option<&Obstacle> {
    let mut best: Option<(&Obstacle, f32)> = None;
    for obstacle in &view.obstacles {
        let distance = obstacle.distance_to(view.position);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((obstacle, distance));
        }
    }
    best.map(|(obstacle, _)| obstacle)
}

/// Point on the far side of `cover` as seen from the threat
pub fn hiding_spot(cover: &Obstacle, threat: Vec2, position: Vec2) -> Vec2 {
    let center = cover.center();
    let mut direction = (center - threat).normalized();
    if direction.is_zero() {
        direction = (center - position).normalized();
    }
    center + direction * (cover.reach() + HIDE_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{AgentId, LifeState, Species};

    fn threat_at(position: Vec2) -> Neighbor {
        Neighbor {
            id: AgentId(2),
            species: Species::Gorilla,
            position,
            distance: 0.0,
            fitness: 2.0,
            state: LifeState::Fighting,
        }
    }

    fn view(obstacles: Vec<Obstacle>) -> LocalView {
        LocalView {
            position: Vec2::new(100.0, 100.0),
            vision: 120.0,
            threat: Some(threat_at(Vec2::new(50.0, 100.0))),
            obstacles,
            ..Default::default()
        }
    }

    const NOISE: Noise = Noise { heading: 0.0, offset: 0.5 };

    #[test]
    fn test_speed_runs_directly_away() {
        match decide(FleeStrategy::Speed, &view(Vec::new()), NOISE) {
            Intent::Evade { heading, speed } => {
                assert!((heading.x - 1.0).abs() < 1e-6 && heading.y.abs() < 1e-6);
                assert_eq!(speed, SPEED_MULTIPLIER);
            }
            other => panic!("expected evade, got {:?}", other),
        }
    }

    #[test]
    fn test_hide_goes_behind_cover() {
        let cover = Obstacle::new(140.0, 90.0, 20.0, 20.0);
        match decide(FleeStrategy::Hide, &view(vec![cover]), NOISE) {
            Intent::TakeCover { spot, .. } => {
                // Far side of the obstacle, on the line from the threat through its center
                assert!(spot.x > 160.0);
                assert!((spot.y - 100.0).abs() < 1e-4);
            }
            other => panic!("expected cover, got {:?}", other),
        }
    }

    #[test]
    fn test_hide_without_cover_falls_back_to_speed() {
        let speed = decide(FleeStrategy::Speed, &view(Vec::new()), NOISE);
        assert_eq!(decide(FleeStrategy::Hide, &view(Vec::new()), NOISE), speed);
    }

    #[test]
    fn test_scatter_offsets_within_spread() {
        let away = Vec2::new(1.0, 0.0);
        for offset in [0.0, 0.25, 0.5, 0.75, 0.999] {
            match decide(FleeStrategy::Scatter, &view(Vec::new()), Noise::new(0.0, offset)) {
                Intent::Evade { heading, speed } => {
                    let angle = (heading.x * away.x + heading.y * away.y).clamp(-1.0, 1.0).acos();
                    assert!(angle <= SCATTER_SPREAD / 2.0 + 1e-4);
                    assert_eq!(speed, SCATTER_SPEED);
                }
                other => panic!("expected evade, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_no_threat_holds() {
        let mut v = view(Vec::new());
        v.threat = None;
        for strategy in [FleeStrategy::Speed, FleeStrategy::Hide, FleeStrategy::Scatter] {
            assert_eq!(decide(strategy, &v, NOISE), Intent::Hold);
        }
    }
}
