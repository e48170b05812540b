//! Model-level sync configuration, change tracking and action planning.
//!
//! A `ModelType` carries the sync declarations of one model. Around each
//! record transition a `Transition` captures the before state, plans the
//! resulting `Action`s with the `ActionPlanner` and holds them until the
//! write has committed.

mod planner;
mod registry;
mod session;
mod tracking;
mod types;

pub use planner::{Action, ActionPlanner};
pub use registry::ModelRegistry;
pub use session::Transition;
pub use tracking::{ChangeSnapshot, ChangeTracker, ScopeDiff};
pub use types::{ModelType, SyncActions};
