//! World Components
//!
//! 2D geometry, food resources, obstacles, and the resource store that the
//! engine queries read-only except for consumption.

use bevy_ecs::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::{Add, Mul, Sub};

/// A 2D vector / point in world space
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector at the given angle (radians)
    pub fn from_angle(angle: f32) -> Self {
        Self::new(angle.cos(), angle.sin())
    }

    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or zero for a zero vector
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len > f32::EPSILON {
            Vec2::new(self.x / len, self.y / len)
        } else {
            Vec2::ZERO
        }
    }

    /// Rotate counter-clockwise by `angle` radians
    pub fn rotated(self, angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    pub fn is_zero(self) -> bool {
        self.length() <= f32::EPSILON
    }

    pub fn as_tuple(self) -> (f32, f32) {
        (self.x, self.y)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// The rectangular extent of the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Clamp a point into the world
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2::new(point.x.clamp(0.0, self.width), point.y.clamp(0.0, self.height))
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }

    /// Uniform random point at least `margin` away from every edge
    pub fn random_point<R: Rng>(&self, rng: &mut R, margin: f32) -> Vec2 {
        let margin_x = margin.min(self.width / 2.0);
        let margin_y = margin.min(self.height / 2.0);
        let x = margin_x + rng.gen::<f32>() * (self.width - 2.0 * margin_x);
        let y = margin_y + rng.gen::<f32>() * (self.height - 2.0 * margin_y);
        Vec2::new(x, y)
    }
}

/// An axis-aligned rectangle agents can hide behind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub min: Vec2,
    pub max: Vec2,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.min.x + self.max.x) / 2.0, (self.min.y + self.max.y) / 2.0)
    }

    /// Half the diagonal: distance from the center to a corner
    pub fn reach(&self) -> f32 {
        self.center().distance(self.max)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Distance from a point to the nearest point of the rectangle
    pub fn distance_to(&self, point: Vec2) -> f32 {
        let nearest = Vec2::new(point.x.clamp(self.min.x, self.max.x), point.y.clamp(self.min.y, self.max.y));
        point.distance(nearest)
    }
}

/// Category of food
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodKind {
    Plant,
    Meat,
}

impl FoodKind {
    pub fn name(&self) -> &'static str {
        match self {
            FoodKind::Plant => "plant",
            FoodKind::Meat => "meat",
        }
    }
}

/// Stable identifier of a food resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceId(pub u64);

/// A depletable patch of food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodResource {
    pub id: ResourceId,
    pub kind: FoodKind,
    pub position: Vec2,
    pub amount: f32,
}

/// The world's food and obstacles
///
/// Resources are keyed by id so iteration order is stable. Only
/// [`ResourceField::consume_resource`] depletes or removes food from inside a tick.
#[derive(Resource, Debug, Clone)]
pub struct ResourceField {
    bounds: Bounds,
    resources: BTreeMap<ResourceId, FoodResource>,
    obstacles: Vec<Obstacle>,
    next_id: u64,
}

impl ResourceField {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            resources: BTreeMap::new(),
            obstacles: Vec::new(),
            next_id: 0,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    /// Place a resource and return its id; non-positive amounts are ignored
    pub fn insert(&mut self, kind: FoodKind, position: Vec2, amount: f32) -> Option<ResourceId> {
        if !(amount > 0.0) {
            return None;
        }
        let id = ResourceId(self.next_id);
        self.next_id += 1;
        self.resources.insert(
            id,
            FoodResource {
                id,
                kind,
                position: self.bounds.clamp(position),
                amount,
            },
        );
        Some(id)
    }

    pub fn get(&self, id: ResourceId) -> Option<&FoodResource> {
        self.resources.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FoodResource> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn count_of(&self, kind: FoodKind) -> usize {
        self.resources.values().filter(|r| r.kind == kind).count()
    }

    pub fn total_amount(&self) -> f32 {
        self.resources.values().map(|r| r.amount).sum()
    }

    /// Resources within `radius` of `position`, in id order
    pub fn resources_near(&self, position: Vec2, radius: f32) -> Vec<&FoodResource> {
        self.resources
            .values()
            .filter(|r| r.position.distance(position) <= radius)
            .collect()
    }

    /// Obstacles whose nearest edge lies within `radius` of `position`
    pub fn obstacles_near(&self, position: Vec2, radius: f32) -> Vec<&Obstacle> {
        self.obstacles
            .iter()
            .filter(|o| o.distance_to(position) <= radius)
            .collect()
    }

    /// Take up to `amount` from a resource, removing it once empty.
    ///
    /// Returns the quantity actually taken. Unknown ids (already consumed or
    /// never present) take nothing.
    pub fn consume_resource(&mut self, id: ResourceId, amount: f32) -> f32 {
        let Some(resource) = self.resources.get_mut(&id) else {
            return 0.0;
        };
        let taken = amount.max(0.0).min(resource.amount);
        resource.amount -= taken;
        if resource.amount <= 0.0 {
            self.resources.remove(&id);
        }
        taken
    }

    /// Remove a resource outright; removing an absent one is a no-op
    pub fn remove(&mut self, id: ResourceId) -> Option<FoodResource> {
        self.resources.remove(&id)
    }

    /// Random point that avoids obstacles, falling back to any point after ten tries
    pub fn open_point<R: Rng>(&self, rng: &mut R, margin: f32) -> Vec2 {
        for _ in 0..10 {
            let candidate = self.bounds.random_point(rng, margin);
            if !self.obstacles.iter().any(|o| o.contains(candidate)) {
                return candidate;
            }
        }
        self.bounds.random_point(rng, margin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn field() -> ResourceField {
        ResourceField::new(Bounds::new(100.0, 100.0))
    }

    #[test]
    fn test_vector_math() {
        let v = Vec2::new(3.0, 4.0);
        assert_eq!(v.length(), 5.0);
        let n = v.normalized();
        assert!((n.x - 0.6).abs() < 1e-6);
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);

        let r = Vec2::new(1.0, 0.0).rotated(std::f32::consts::FRAC_PI_2);
        assert!(r.x.abs() < 1e-6 && (r.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounds_clamp() {
        let bounds = Bounds::new(50.0, 20.0);
        assert_eq!(bounds.clamp(Vec2::new(-5.0, 30.0)), Vec2::new(0.0, 20.0));
        assert!(bounds.contains(Vec2::new(50.0, 0.0)));
        assert!(!bounds.contains(Vec2::new(50.1, 0.0)));
    }

    #[test]
    fn test_consume_depletes_and_removes() {
        let mut field = field();
        let id = field.insert(FoodKind::Plant, Vec2::new(10.0, 10.0), 30.0).unwrap();

        assert_eq!(field.consume_resource(id, 12.0), 12.0);
        assert_eq!(field.get(id).unwrap().amount, 18.0);

        // Asking for more than is left only takes what remains
        assert_eq!(field.consume_resource(id, 100.0), 18.0);
        assert!(field.get(id).is_none());
        assert!(field.resources_near(Vec2::new(10.0, 10.0), 5.0).is_empty());

        // Consuming a removed resource is a no-op
        assert_eq!(field.consume_resource(id, 5.0), 0.0);
        assert!(field.remove(id).is_none());
    }

    #[test]
    fn test_insert_rejects_empty_food() {
        let mut field = field();
        assert!(field.insert(FoodKind::Meat, Vec2::new(1.0, 1.0), 0.0).is_none());
        assert!(field.is_empty());
    }

    #[test]
    fn test_resources_near() {
        let mut field = field();
        field.insert(FoodKind::Plant, Vec2::new(0.0, 0.0), 10.0);
        field.insert(FoodKind::Meat, Vec2::new(30.0, 40.0), 10.0);

        assert_eq!(field.resources_near(Vec2::ZERO, 49.0).len(), 1);
        assert_eq!(field.resources_near(Vec2::ZERO, 50.0).len(), 2);
        assert_eq!(field.count_of(FoodKind::Meat), 1);
    }

    #[test]
    fn test_obstacles_near_uses_edges() {
        let mut field = field();
        field.add_obstacle(Obstacle::new(40.0, 40.0, 20.0, 20.0));

        assert_eq!(field.obstacles_near(Vec2::new(30.0, 50.0), 10.0).len(), 1);
        assert!(field.obstacles_near(Vec2::new(10.0, 50.0), 10.0).is_empty());
        assert_eq!(field.obstacles()[0].center(), Vec2::new(50.0, 50.0));
    }

    #[test]
    fn test_open_point_avoids_obstacles() {
        let mut field = field();
        field.add_obstacle(Obstacle::new(0.0, 0.0, 50.0, 100.0));
        let mut rng = SmallRng::seed_from_u64(7);

        let mut clear = 0;
        for _ in 0..50 {
            let point = field.open_point(&mut rng, 0.0);
            assert!(field.bounds().contains(point));
            if !field.obstacles()[0].contains(point) {
                clear += 1;
            }
        }
        assert!(clear >= 45);
    }
}
