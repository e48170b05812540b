//! Scope membership tracking across an update.

use super::types::ModelType;
use crate::scopes::{Scope, ScopeDefinition};
use crate::types::{Record, RecordId, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::trace;

/// Pre-update state of a record: the original values of the changed
/// attributes plus the primary key.
#[derive(Clone, Debug, PartialEq)]
pub struct ChangeSnapshot {
    pub attributes_before: BTreeMap<String, Value>,
    pub primary_key: Option<RecordId>,
}

#[derive(Debug)]
struct ScopeState {
    scope: Scope,
    contained_record: bool,
}

/// Scope membership of a record immediately before an update.
///
/// Captured in the before-update hook while the data store still holds
/// the old row, then compared against the committed record.
#[derive(Debug)]
pub struct ChangeTracker {
    snapshot: ChangeSnapshot,
    record_before: Record,
    scopes_before: HashMap<String, ScopeState>,
}

/// Scope changes of a record for one scope definition.
#[derive(Debug, Default)]
pub struct ScopeDiff {
    /// The old scope the record has left.
    pub left: Option<Scope>,
    /// The new scope the record has entered.
    pub entered: Option<Scope>,
}

impl ChangeTracker {
    /// Snapshot `record` as it was before its pending changes.
    ///
    /// `original_values` holds the persisted value of every attribute that
    /// is about to change.
    pub fn capture_before(
        model: &ModelType,
        record: &Record,
        original_values: &BTreeMap<String, Value>,
    ) -> Self {
        let mut record_before = record.clone();
        for (name, value) in original_values {
            record_before.attributes.insert(name.clone(), value.clone());
        }
        record_before.id = record.id;

        let scopes_before = model
            .scope_definitions()
            .map(|definition| {
                let scope = Scope::from_entity(definition, &record_before);
                let contained_record = is_member(&scope, &record_before);
                let state = ScopeState {
                    scope,
                    contained_record,
                };
                (definition.name().to_string(), state)
            })
            .collect();

        Self {
            snapshot: ChangeSnapshot {
                attributes_before: original_values.clone(),
                primary_key: record.id,
            },
            record_before,
            scopes_before,
        }
    }

    pub fn snapshot(&self) -> &ChangeSnapshot {
        &self.snapshot
    }

    /// The record as it was immediately before the update.
    pub fn record_before(&self) -> &Record {
        &self.record_before
    }

    pub fn scope_before(&self, definition: &ScopeDefinition) -> Option<&Scope> {
        self.scopes_before
            .get(definition.name())
            .map(|state| &state.scope)
    }

    fn old_record_in_old_scope(&self, definition: &ScopeDefinition) -> bool {
        self.scopes_before
            .get(definition.name())
            .map(|state| state.contained_record)
            .unwrap_or(false)
    }

    /// The record was in the old scope and no longer is.
    pub fn left_old_scope(&self, definition: &ScopeDefinition, record_after: &Record) -> bool {
        let Some(scope_before) = self.scope_before(definition) else {
            return false;
        };
        scope_before.valid()
            && self.old_record_in_old_scope(definition)
            && !is_member(scope_before, record_after)
    }

    /// The record is in the new scope and did not simply remain in the
    /// old one.
    pub fn entered_new_scope(
        &self,
        definition: &ScopeDefinition,
        scope_after: &Scope,
        record_after: &Record,
    ) -> bool {
        scope_after.valid()
            && is_member(scope_after, record_after)
            && !self.remained_in_old_scope(definition, record_after)
    }

    fn remained_in_old_scope(&self, definition: &ScopeDefinition, record_after: &Record) -> bool {
        self.old_record_in_old_scope(definition)
            && self
                .scope_before(definition)
                .map(|scope| is_member(scope, record_after))
                .unwrap_or(false)
    }

    /// Compare membership before and after the update for one definition.
    pub fn diff(&self, definition: &Arc<ScopeDefinition>, record_after: &Record) -> ScopeDiff {
        let scope_after = Scope::from_entity(definition, record_after);

        let left = if self.left_old_scope(definition, record_after) {
            self.scope_before(definition).cloned()
        } else {
            None
        };
        let entered = if self.entered_new_scope(definition, &scope_after, record_after) {
            Some(scope_after)
        } else {
            None
        };

        trace!(
            scope = definition.name(),
            left = left.is_some(),
            entered = entered.is_some(),
            "scope diff"
        );
        ScopeDiff { left, entered }
    }
}

/// Membership with the fail-closed policy applied: a scope that cannot be
/// evaluated never claims the record.
pub(crate) fn is_member(scope: &Scope, record: &Record) -> bool {
    match scope.contains(record) {
        Ok(found) => found,
        Err(_) => false,
    }
}
