//! Social Learning System
//!
//! On every learning round each living agent may imitate one neighbour:
//! the nearest eligible one, ties broken by lower id. Teachers are read from
//! the tick-start snapshot, so the outcome does not depend on the order in
//! which learners are processed and a teacher is never changed by teaching.

use bevy_ecs::prelude::*;
use troop_events::EventKind;

use crate::components::{Agent, AgentStats, LifeState, Repertoire};
use crate::config::{LearningConfig, SimConfig};
use crate::events::TickEvents;
use crate::systems::spatial::{AgentRecord, SpatialSnapshot};
use crate::SimClock;

/// Whether this tick is a learning round
pub fn is_learning_tick(tick: u64, learning: &LearningConfig) -> bool {
    learning.interval > 0 && tick % learning.interval == 0
}

/// The neighbour `learner` would imitate, if any
pub fn choose_teacher<'a>(
    learner: &AgentRecord,
    snapshot: &'a SpatialSnapshot,
    radius: f32,
    learning: &LearningConfig,
) -> Option<&'a AgentRecord> {
    snapshot
        .agents_near(learner.position, radius)
        .into_iter()
        .map(|(record, _)| record)
        .filter(|candidate| candidate.id != learner.id)
        .filter(|candidate| !learning.same_species_only || candidate.species == learner.species)
        .find(|candidate| !learning.fitter_teachers_only || candidate.fitness > learner.fitness)
}

/// System: one learning round
pub fn social_learning(
    clock: Res<SimClock>,
    config: Res<SimConfig>,
    snapshot: Res<SpatialSnapshot>,
    mut events: ResMut<TickEvents>,
    mut query: Query<(&LifeState, &mut Repertoire, &mut AgentStats), With<Agent>>,
) {
    let learning = &config.learning;
    if !is_learning_tick(clock.tick, learning) {
        return;
    }

    let mut lessons = 0usize;
    for learner in snapshot.iter().filter(|r| r.is_alive()) {
        let Some(teacher) = choose_teacher(learner, &snapshot, config.radii.interaction, learning) else {
            continue;
        };
        let Ok((state, mut repertoire, mut stats)) = query.get_mut(learner.entity) else {
            continue;
        };
        // Killed earlier this tick
        if state.is_dead() {
            continue;
        }
        repertoire.learn(&teacher.repertoire, learning.rate);
        stats.lessons += 1;
        lessons += 1;

        tracing::debug!(
            "Tick {}: agent {} learned from {} (rate {})",
            clock.tick,
            learner.id,
            teacher.id,
            learning.rate
        );
        events.push(
            clock.tick,
            EventKind::Lesson {
                learner_id: learner.id.0,
                teacher_id: teacher.id.0,
                rate: learning.rate,
            },
        );
    }

    if lessons > 0 {
        tracing::debug!("Tick {}: {} lessons", clock.tick, lessons);
    }
}
