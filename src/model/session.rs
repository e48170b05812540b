//! Pending sync state of one record transition.

use super::planner::{Action, ActionPlanner};
use super::tracking::ChangeTracker;
use super::types::ModelType;
use crate::types::{LifecycleEvent, Record, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A record transition between its before hook and its commit.
///
/// Actions are queued here and only leave through the after-commit hook.
/// Dropping a transition without committing it is a rollback: nothing is
/// published.
#[derive(Debug)]
pub struct Transition {
    model: Arc<ModelType>,
    event: LifecycleEvent,
    tracker: Option<ChangeTracker>,
    queued: Vec<Action>,
    prepared: bool,
}

impl Transition {
    pub(crate) fn new(model: Arc<ModelType>, event: LifecycleEvent) -> Self {
        Self {
            model,
            event,
            tracker: None,
            queued: Vec::new(),
            prepared: false,
        }
    }

    /// Transition of an update, with scope membership captured from the
    /// record's original values.
    pub(crate) fn update(
        model: Arc<ModelType>,
        record: &Record,
        original_values: &BTreeMap<String, Value>,
    ) -> Self {
        let tracker = ChangeTracker::capture_before(&model, record, original_values);
        Self {
            tracker: Some(tracker),
            ..Self::new(model, LifecycleEvent::Update)
        }
    }

    pub fn event(&self) -> LifecycleEvent {
        self.event
    }

    pub fn model(&self) -> &Arc<ModelType> {
        &self.model
    }

    pub fn tracker(&self) -> Option<&ChangeTracker> {
        self.tracker.as_ref()
    }

    /// Plan the actions of this transition and queue them.
    ///
    /// Planning happens once; later calls return the queue unchanged.
    pub fn prepare(&mut self, record: &Record) -> &[Action] {
        if !self.prepared {
            let planner = ActionPlanner::new(&self.model);
            let actions = planner.plan(self.event, record, self.tracker.as_ref());
            self.queued.extend(actions);
            self.prepared = true;
        }
        &self.queued
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn queued(&self) -> &[Action] {
        &self.queued
    }

    /// Hand out the queued actions, leaving the transition empty.
    pub(crate) fn take_queued(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.queued)
    }

    /// Drop the transition without publishing.
    pub fn discard(self) {
        debug!(
            model = %self.model.name(),
            event = ?self.event,
            discarded = self.queued.len(),
            "rolled back sync transition"
        );
    }
}
