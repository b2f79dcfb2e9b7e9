//! Event Types
//!
//! Per-tick records emitted by the engine. Agents and resources are referenced
//! by their numeric ids; species, states and strategies by their display names.

use serde::{Deserialize, Serialize};

/// Why an agent died
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    /// Energy ran out
    Starvation,
    /// Health ran out (combat or starvation damage)
    Injury,
    /// Reached the species' maximum age
    OldAge,
}

impl DeathCause {
    /// Returns all death causes.
    pub fn all() -> &'static [DeathCause] {
        &[DeathCause::Starvation, DeathCause::Injury, DeathCause::OldAge]
    }
}

/// What happened
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventKind {
    /// An agent moved from one lifecycle state to another
    StateChange {
        agent_id: u64,
        from: String,
        to: String,
        /// Strategy that became active with the new state, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        strategy: Option<String>,
    },
    /// An agent ate part (or all) of a resource
    Meal {
        agent_id: u64,
        resource_id: u64,
        /// Amount removed from the resource
        consumed: f32,
        /// Energy the agent actually gained
        energy_gained: f32,
        /// True when the meal depleted the resource
        depleted: bool,
    },
    /// One strike in a fight
    Strike {
        attacker_id: u64,
        defender_id: u64,
        stance: String,
        damage: f32,
        counter_damage: f32,
    },
    /// An agent imitated a neighbour
    Lesson { learner_id: u64, teacher_id: u64, rate: f64 },
    /// An agent died and was removed from the world
    Death {
        agent_id: u64,
        species: String,
        cause: DeathCause,
        age: f32,
    },
}

/// A single simulation event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimEvent {
    pub tick: u64,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl SimEvent {
    pub fn new(tick: u64, kind: EventKind) -> Self {
        Self { tick, kind }
    }

    /// The agent the event is primarily about
    pub fn subject(&self) -> u64 {
        match &self.kind {
            EventKind::StateChange { agent_id, .. }
            | EventKind::Meal { agent_id, .. }
            | EventKind::Death { agent_id, .. } => *agent_id,
            EventKind::Strike { attacker_id, .. } => *attacker_id,
            EventKind::Lesson { learner_id, .. } => *learner_id,
        }
    }

    pub fn is_death(&self) -> bool {
        matches!(self.kind, EventKind::Death { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_death_cause_serialization() {
        assert_eq!(serde_json::to_string(&DeathCause::Starvation).unwrap(), r#""starvation""#);
        assert_eq!(serde_json::to_string(&DeathCause::Injury).unwrap(), r#""injury""#);
        assert_eq!(serde_json::to_string(&DeathCause::OldAge).unwrap(), r#""old_age""#);
    }

    #[test]
    fn test_event_is_tagged_and_flat() {
        let event = SimEvent::new(
            12,
            EventKind::Lesson { learner_id: 3, teacher_id: 7, rate: 0.1 },
        );
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["tick"], 12);
        assert_eq!(json["kind"], "lesson");
        assert_eq!(json["learner_id"], 3);
        assert_eq!(json["teacher_id"], 7);
    }

    #[test]
    fn test_state_change_omits_missing_strategy() {
        let event = SimEvent::new(
            1,
            EventKind::StateChange {
                agent_id: 4,
                from: "idle".into(),
                to: "fleeing".into(),
                strategy: None,
            },
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("strategy"));

        let parsed: SimEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_subject() {
        let strike = SimEvent::new(
            5,
            EventKind::Strike {
                attacker_id: 9,
                defender_id: 2,
                stance: "Aggressive".into(),
                damage: 45.0,
                counter_damage: 7.5,
            },
        );
        assert_eq!(strike.subject(), 9);
        assert!(!strike.is_death());

        let death = SimEvent::new(
            6,
            EventKind::Death { agent_id: 2, species: "Bonobo".into(), cause: DeathCause::Injury, age: 1.5 },
        );
        assert_eq!(death.subject(), 2);
        assert!(death.is_death());
    }
}
