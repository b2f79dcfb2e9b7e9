//! Tick Events
//!
//! Buffer for the events emitted while a tick runs. The driver's caller
//! drains it between ticks.

use bevy_ecs::prelude::*;
use troop_events::{EventKind, SimEvent};

#[derive(Resource, Debug, Default)]
pub struct TickEvents {
    pub events: Vec<SimEvent>,
}

impl TickEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tick: u64, kind: EventKind) {
        self.events.push(SimEvent::new(tick, kind));
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
