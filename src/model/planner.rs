//! Turns record transitions into channel-scoped actions.

use super::tracking::{is_member, ChangeTracker};
use super::types::ModelType;
use crate::resource::{Resource, ScopeRef};
use crate::scopes::Scope;
use crate::types::{EntityRef, LifecycleEvent, Record, SyncAction};
use tracing::debug;

/// A new/update/destroy directive for one channel.
#[derive(Clone, Debug)]
pub struct Action {
    pub record: EntityRef,
    pub kind: SyncAction,
    /// Rendered left to right into the channel path; empty means the
    /// resource's root channel.
    pub scope_chain: Vec<ScopeRef>,
}

impl Action {
    pub fn new(record: EntityRef, kind: SyncAction) -> Self {
        Self {
            record,
            kind,
            scope_chain: Vec::new(),
        }
    }

    /// Action under an optional owner and an optional sync scope.
    pub fn scoped(
        record: EntityRef,
        kind: SyncAction,
        owner: Option<&EntityRef>,
        scope: Option<Scope>,
    ) -> Self {
        let mut scope_chain = Vec::new();
        if let Some(owner) = owner {
            scope_chain.push(ScopeRef::Owner(owner.clone()));
        }
        if let Some(scope) = scope {
            scope_chain.push(ScopeRef::Scope(scope));
        }
        Self {
            record,
            kind,
            scope_chain,
        }
    }

    pub fn resource(&self) -> Resource {
        Resource::scoped(self.record.clone(), self.scope_chain.clone())
    }

    /// Scoped path of the action's resource, e.g. `/in_group/group/1/users/3`.
    pub fn test_path(&self) -> String {
        self.resource().polymorphic_path()
    }
}

/// Plans the actions of one record transition.
pub struct ActionPlanner<'a> {
    model: &'a ModelType,
}

impl<'a> ActionPlanner<'a> {
    pub fn new(model: &'a ModelType) -> Self {
        Self { model }
    }

    /// All actions for a committed transition, touches last.
    ///
    /// `tracker` carries the pre-update snapshot and is only consulted for
    /// updates.
    pub fn plan(
        &self,
        event: LifecycleEvent,
        record: &Record,
        tracker: Option<&ChangeTracker>,
    ) -> Vec<Action> {
        let mut actions = Vec::new();

        if self.model.syncs(event) {
            match event {
                LifecycleEvent::Create => actions.extend(self.plan_create(record)),
                LifecycleEvent::Update => match tracker {
                    Some(tracker) => actions.extend(self.plan_update(record, tracker)),
                    None => actions.push(Action::new(record.entity_ref(), SyncAction::Update)),
                },
                LifecycleEvent::Destroy => actions.extend(self.plan_destroy(record)),
            }
        }

        actions.extend(self.plan_touches(record, tracker.map(ChangeTracker::record_before)));

        debug!(
            model = %self.model.name(),
            ?event,
            actions = actions.len(),
            "planned sync actions"
        );
        actions
    }

    /// Root `New`, a scoped `New` per scope containing the record, and an
    /// `Update` of the owner.
    pub fn plan_create(&self, record: &Record) -> Vec<Action> {
        let entity = record.entity_ref();
        let owner = self.model.default_owner(record);
        let mut actions = vec![Action::scoped(
            entity.clone(),
            SyncAction::New,
            owner.as_ref(),
            None,
        )];

        for definition in self.model.scope_definitions() {
            let scope = Scope::from_entity(definition, record);
            if is_member(&scope, record) {
                actions.push(Action::scoped(
                    entity.clone(),
                    SyncAction::New,
                    owner.as_ref(),
                    Some(scope),
                ));
            }
        }

        actions.extend(owner_update(owner));
        actions
    }

    /// Root `Update`, then a `Destroy` for every scope left and a `New`
    /// for every scope entered.
    pub fn plan_update(&self, record: &Record, tracker: &ChangeTracker) -> Vec<Action> {
        let owner = self.model.default_owner(record);
        let mut actions = vec![Action::new(record.entity_ref(), SyncAction::Update)];

        for definition in self.model.scope_definitions() {
            let diff = tracker.diff(definition, record);
            if let Some(scope) = diff.left {
                actions.push(Action::scoped(
                    tracker.record_before().entity_ref(),
                    SyncAction::Destroy,
                    owner.as_ref(),
                    Some(scope),
                ));
            }
            if let Some(scope) = diff.entered {
                actions.push(Action::scoped(
                    record.entity_ref(),
                    SyncAction::New,
                    owner.as_ref(),
                    Some(scope),
                ));
            }
        }

        actions
    }

    /// Root `Destroy` plus a scoped `Destroy` for every scope that is
    /// currently valid, whether or not it still contains the record.
    pub fn plan_destroy(&self, record: &Record) -> Vec<Action> {
        let entity = record.entity_ref();
        let owner = self.model.default_owner(record);
        let mut actions = vec![Action::scoped(
            entity.clone(),
            SyncAction::Destroy,
            owner.as_ref(),
            None,
        )];

        for definition in self.model.scope_definitions() {
            let scope = Scope::from_entity(definition, record);
            if scope.valid() {
                actions.push(Action::scoped(
                    entity.clone(),
                    SyncAction::Destroy,
                    owner.as_ref(),
                    Some(scope),
                ));
            }
        }

        actions.extend(owner_update(owner));
        actions
    }

    /// `Update` for the current and, if it changed, the previous value of
    /// every touched association.
    pub fn plan_touches(&self, record: &Record, record_before: Option<&Record>) -> Vec<Action> {
        let mut targets: Vec<EntityRef> = Vec::new();

        for association in self.model.touches() {
            let current = self.model.read(record, association);
            let previous = record_before.map(|before| self.model.read(before, association));

            for value in std::iter::once(current).chain(previous) {
                if let Some(entity) = value.as_entity() {
                    if entity.is_persisted() && !targets.contains(entity) {
                        targets.push(entity.clone());
                    }
                }
            }
        }

        targets
            .into_iter()
            .map(|target| Action::new(target, SyncAction::Update))
            .collect()
    }
}

fn owner_update(owner: Option<EntityRef>) -> Option<Action> {
    owner
        .filter(EntityRef::is_persisted)
        .map(|owner| Action::new(owner, SyncAction::Update))
}
