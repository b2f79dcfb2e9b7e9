//! Environment System
//!
//! The default spawn policy for food: top each kind up toward its cap on a
//! fixed cadence, avoiding obstacles.

use bevy_ecs::prelude::*;
use rand::Rng;

use crate::components::{FoodKind, ResourceField, ResourceId};
use crate::config::{SimConfig, WorldConfig};
use crate::{SimClock, SimRng};

/// Minimum distance between spawned food and the world edge
pub const SPAWN_MARGIN: f32 = 20.0;

/// Place one resource of `kind` if that kind is below its cap
pub fn spawn_food<R: Rng>(
    field: &mut ResourceField,
    kind: FoodKind,
    world: &WorldConfig,
    rng: &mut R,
) -> Option<ResourceId> {
    if field.count_of(kind) >= world.cap(kind) {
        return None;
    }
    let position = field.open_point(rng, SPAWN_MARGIN);
    field.insert(kind, position, world.nutrition(kind))
}

/// System: advance the logical clock
pub fn advance_clock(mut clock: ResMut<SimClock>) {
    clock.tick += 1;
}

/// System: periodic food spawning
pub fn update_environment(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    mut rng: ResMut<SimRng>,
    mut field: ResMut<ResourceField>,
) {
    let interval = config.world.spawn_interval;
    if interval == 0 || clock.tick % interval != 0 {
        return;
    }

    let kind = if rng.0.gen::<f32>() < config.world.plant_spawn_chance {
        FoodKind::Plant
    } else {
        FoodKind::Meat
    };
    if let Some(id) = spawn_food(&mut field, kind, &config.world, &mut rng.0) {
        tracing::debug!("Tick {}: spawned {} resource {}", clock.tick, kind.name(), id.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Bounds;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn world_with(config: SimConfig, tick: u64) -> World {
        let mut world = World::new();
        let bounds = Bounds::new(config.world.width, config.world.height);
        world.insert_resource(ResourceField::new(bounds));
        world.insert_resource(config);
        world.insert_resource(SimClock { tick });
        world.insert_resource(SimRng(SmallRng::seed_from_u64(1)));
        world
    }

    #[test]
    fn test_spawn_respects_cap() {
        let mut config = WorldConfig::default();
        config.max_meat = 2;
        let mut field = ResourceField::new(Bounds::new(200.0, 200.0));
        let mut rng = SmallRng::seed_from_u64(3);

        assert!(spawn_food(&mut field, FoodKind::Meat, &config, &mut rng).is_some());
        assert!(spawn_food(&mut field, FoodKind::Meat, &config, &mut rng).is_some());
        assert!(spawn_food(&mut field, FoodKind::Meat, &config, &mut rng).is_none());
        assert_eq!(field.count_of(FoodKind::Meat), 2);
        assert_eq!(field.total_amount(), 2.0 * config.meat_nutrition);
    }

    #[test]
    fn test_spawns_only_on_interval() {
        let mut config = SimConfig::default();
        config.world.spawn_interval = 10;

        let mut off_beat = world_with(config.clone(), 7);
        let mut schedule = Schedule::default();
        schedule.add_systems(update_environment);
        schedule.run(&mut off_beat);
        assert!(off_beat.resource::<ResourceField>().is_empty());

        let mut on_beat = world_with(config, 20);
        let mut schedule = Schedule::default();
        schedule.add_systems(update_environment);
        schedule.run(&mut on_beat);
        assert_eq!(on_beat.resource::<ResourceField>().len(), 1);
    }

    #[test]
    fn test_zero_interval_disables_spawning() {
        let mut config = SimConfig::default();
        config.world.spawn_interval = 0;
        let mut world = world_with(config, 120);
        let mut schedule = Schedule::default();
        schedule.add_systems(update_environment);
        schedule.run(&mut world);
        assert!(world.resource::<ResourceField>().is_empty());
    }

    #[test]
    fn test_clock_advances() {
        let mut world = World::new();
        world.insert_resource(SimClock::default());
        let mut schedule = Schedule::default();
        schedule.add_systems(advance_clock);
        schedule.run(&mut world);
        schedule.run(&mut world);
        assert_eq!(world.resource::<SimClock>().tick, 2);
    }
}
