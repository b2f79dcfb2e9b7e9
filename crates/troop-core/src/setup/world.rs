//! World Creation
//!
//! Builds the resource store: obstacles first, then food at half of each
//! kind's cap.

use rand::Rng;

use crate::components::{Bounds, FoodKind, Obstacle, ResourceField};
use crate::config::WorldConfig;
use crate::systems::environment::spawn_food;

/// Obstacles keep at least this far from the world edge
pub const OBSTACLE_MARGIN: f32 = 50.0;

/// A randomly sized and placed obstacle that fits inside the world
fn random_obstacle<R: Rng>(config: &WorldConfig, rng: &mut R) -> Obstacle {
    let (low, high) = (config.obstacle_min_size, config.obstacle_max_size.max(config.obstacle_min_size));
    let width = rng.gen_range(low..=high).min(config.width);
    let height = rng.gen_range(low..=high).min(config.height);

    let span = |extent: f32, size: f32| (extent - 2.0 * OBSTACLE_MARGIN - size).max(0.0);
    let margin_x = if span(config.width, width) > 0.0 { OBSTACLE_MARGIN } else { 0.0 };
    let margin_y = if span(config.height, height) > 0.0 { OBSTACLE_MARGIN } else { 0.0 };
    let x = margin_x + rng.gen::<f32>() * span(config.width, width);
    let y = margin_y + rng.gen::<f32>() * span(config.height, height);
    Obstacle::new(x, y, width, height)
}

/// Create the resource store with obstacles and the initial food
pub fn create_resource_field<R: Rng>(config: &WorldConfig, rng: &mut R) -> ResourceField {
    let mut field = ResourceField::new(Bounds::new(config.width, config.height));
    for _ in 0..config.obstacle_count {
        field.add_obstacle(random_obstacle(config, rng));
    }
    for kind in [FoodKind::Plant, FoodKind::Meat] {
        for _ in 0..config.cap(kind) / 2 {
            spawn_food(&mut field, kind, config, rng);
        }
    }
    tracing::info!(
        "Created world {}x{} with {} obstacles, {} plants, {} meat",
        config.width,
        config.height,
        field.obstacles().len(),
        field.count_of(FoodKind::Plant),
        field.count_of(FoodKind::Meat)
    );
    field
}
