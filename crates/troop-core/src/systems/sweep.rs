//! Death Sweep
//!
//! Removes dead agents from the world at the end of the tick.

use bevy_ecs::prelude::*;
use troop_events::{DeathCause, EventKind};

use crate::components::{Agent, AgentId, Behavior, LifeState, Species, Vitals};
use crate::events::TickEvents;
use crate::SimClock;

/// System: despawn every dead agent and report its death
pub fn sweep_dead(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut events: ResMut<TickEvents>,
    query: Query<(Entity, &AgentId, &Species, &Vitals, &LifeState, &Behavior), With<Agent>>,
) {
    let mut dead: Vec<_> = query.iter().filter(|(_, _, _, _, state, _)| state.is_dead()).collect();
    dead.sort_by_key(|(_, id, _, _, _, _)| **id);

    for (entity, id, species, vitals, _, behavior) in dead {
        let cause = behavior.death_cause.unwrap_or(DeathCause::Injury);
        tracing::info!(
            "Tick {}: {} {} died ({:?}) at age {:.2}",
            clock.tick,
            species.name(),
            id,
            cause,
            vitals.age
        );
        events.push(
            clock.tick,
            EventKind::Death {
                agent_id: id.0,
                species: species.name().to_string(),
                cause,
                age: vitals.age,
            },
        );
        commands.entity(entity).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sweep_removes_only_dead() {
        let mut world = World::new();
        world.insert_resource(SimClock { tick: 4 });
        world.insert_resource(TickEvents::new());
        let behavior = Behavior {
            death_cause: Some(DeathCause::Starvation),
            ..Default::default()
        };
        world.spawn((Agent, AgentId(1), Species::Chimp, Vitals::new(1.0, 1.0), LifeState::Dead, behavior));
        world.spawn((Agent, AgentId(2), Species::Chimp, Vitals::new(1.0, 1.0), LifeState::Idle, Behavior::default()));

        let mut schedule = Schedule::default();
        schedule.add_systems(sweep_dead);
        schedule.run(&mut world);

        let remaining: Vec<u64> = world.query::<&AgentId>().iter(&world).map(|id| id.0).collect();
        assert_eq!(remaining, vec![2]);

        let events = world.resource_mut::<TickEvents>().drain();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_death());
        assert_eq!(events[0].subject(), 1);
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let mut world = World::new();
        world.insert_resource(SimClock::default());
        world.insert_resource(TickEvents::new());
        world.spawn((Agent, AgentId(1), Species::Gorilla, Vitals::new(1.0, 1.0), LifeState::Dead, Behavior::default()));

        let mut schedule = Schedule::default();
        schedule.add_systems(sweep_dead);
        schedule.run(&mut world);
        schedule.run(&mut world);

        assert_eq!(world.resource::<TickEvents>().len(), 1);
    }
}
