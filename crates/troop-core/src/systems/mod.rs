//! ECS Systems
//!
//! One system per tick phase, run in this order: clock, environment,
//! metabolism, spatial snapshot, decide, act, combat resolution, learning,
//! death sweep.

pub mod behavior;
pub mod environment;
pub mod interaction;
pub mod learning;
pub mod metabolism;
pub mod spatial;
pub mod sweep;

pub use behavior::{decide_intents, next_state, PendingIntents, PlannedIntent, Situation, Transition};
pub use environment::{advance_clock, spawn_food, update_environment};
pub use interaction::{eat, execute_intents, resolve_combat, DamageLedger, Meal};
pub use learning::{choose_teacher, is_learning_tick, social_learning};
pub use metabolism::{apply_metabolism, death_check};
pub use spatial::{build_spatial_snapshot, AgentRecord, SpatialSnapshot};
pub use sweep::sweep_dead;
