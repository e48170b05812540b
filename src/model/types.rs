//! Type-level sync configuration of a model.

use crate::error::{EvaluationError, Result, SyncError};
use crate::scopes::{Method, ParamSource, Relation, Scope, ScopeDefinition};
use crate::types::{EntityRef, LifecycleEvent, ModelName, Record, Value};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Which lifecycle events publish the record itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncActions {
    pub create: bool,
    pub update: bool,
    pub destroy: bool,
}

impl SyncActions {
    /// Sync create, update and destroy.
    pub fn all() -> Self {
        Self {
            create: true,
            update: true,
            destroy: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn only(events: &[LifecycleEvent]) -> Self {
        let mut actions = Self::none();
        for event in events {
            match event {
                LifecycleEvent::Create => actions.create = true,
                LifecycleEvent::Update => actions.update = true,
                LifecycleEvent::Destroy => actions.destroy = true,
            }
        }
        actions
    }

    pub fn includes(&self, event: LifecycleEvent) -> bool {
        match event {
            LifecycleEvent::Create => self.create,
            LifecycleEvent::Update => self.update,
            LifecycleEvent::Destroy => self.destroy,
        }
    }

    pub fn any(&self) -> bool {
        self.create || self.update || self.destroy
    }
}

/// Sync registry of one model: scopes, default scope and touches.
///
/// Built once at model-definition time:
///
/// ```ignore
/// let todo = ModelType::new(ModelName::new("todo"))
///     .attributes(&["project", "user", "complete"])
///     .sync(SyncActions::all())
///     .default_scope("project")
///     .sync_scope("complete", &[], move |_| Ok(todos.filter(is_complete)))?
///     .sync_touch(&["user"]);
/// ```
pub struct ModelType {
    name: ModelName,
    attributes: BTreeSet<String>,
    methods: HashMap<String, Method>,
    scopes: IndexMap<String, Arc<ScopeDefinition>>,
    actions: SyncActions,
    default_scope: Option<String>,
    touches: Vec<String>,
}

impl ModelType {
    pub fn new(name: ModelName) -> Self {
        Self {
            name,
            attributes: BTreeSet::new(),
            methods: HashMap::new(),
            scopes: IndexMap::new(),
            actions: SyncActions::none(),
            default_scope: None,
            touches: Vec::new(),
        }
    }

    /// Declare a column or association.
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.insert(name.into());
        self
    }

    pub fn attributes(mut self, names: &[&str]) -> Self {
        self.attributes.extend(names.iter().map(|name| name.to_string()));
        self
    }

    /// Declare a zero-argument instance method.
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    /// Publish the record on the given lifecycle events.
    pub fn sync(mut self, actions: SyncActions) -> Self {
        self.actions = actions;
        self
    }

    /// Scope create/destroy channels under the given owner association.
    pub fn default_scope(mut self, association: impl Into<String>) -> Self {
        self.default_scope = Some(association.into());
        self
    }

    /// Register a sync scope.
    ///
    /// Every parameter must name an attribute or method of this model; the
    /// scope name must not clash with an existing scope or method.
    pub fn sync_scope<F>(mut self, name: &str, parameters: &[&str], predicate: F) -> Result<Self>
    where
        F: Fn(&[Value]) -> std::result::Result<Box<dyn Relation>, EvaluationError>
            + Send
            + Sync
            + 'static,
    {
        if self.scopes.contains_key(name) || self.methods.contains_key(name) {
            return Err(SyncError::DuplicateScope {
                model: self.name.to_string(),
                name: name.to_string(),
            });
        }

        let mut sources = Vec::with_capacity(parameters.len());
        let mut invalid = Vec::new();
        for param in parameters {
            match self.resolve(param) {
                Some(source) => sources.push(source),
                None => invalid.push(param.to_string()),
            }
        }
        if !invalid.is_empty() {
            return Err(SyncError::InvalidParameters {
                model: self.name.to_string(),
                scope: name.to_string(),
                params: invalid,
            });
        }

        let definition = ScopeDefinition::new(
            self.name.clone(),
            name.to_string(),
            parameters.iter().map(|p| p.to_string()).collect(),
            sources,
            Arc::new(predicate),
        );
        debug!(model = %self.name, scope = name, "registered sync scope");
        self.scopes.insert(name.to_string(), Arc::new(definition));
        Ok(self)
    }

    /// Publish updates to these associations whenever this record changes.
    pub fn sync_touch(mut self, associations: &[&str]) -> Self {
        self.touches
            .extend(associations.iter().map(|name| name.to_string()));
        self
    }

    // --- Accessors ---

    pub fn name(&self) -> &ModelName {
        &self.name
    }

    pub fn actions(&self) -> SyncActions {
        self.actions
    }

    pub fn syncs(&self, event: LifecycleEvent) -> bool {
        self.actions.includes(event)
    }

    pub fn touches(&self) -> &[String] {
        &self.touches
    }

    pub fn scope_definition(&self, name: &str) -> Option<&Arc<ScopeDefinition>> {
        self.scopes.get(name)
    }

    /// Scope definitions in declaration order.
    pub fn scope_definitions(&self) -> impl Iterator<Item = &Arc<ScopeDefinition>> {
        self.scopes.values()
    }

    /// Bind a registered scope to explicit arguments.
    pub fn bind(&self, name: &str, args: Vec<Value>) -> Result<Scope> {
        let definition = self
            .scopes
            .get(name)
            .ok_or_else(|| SyncError::ScopeNotFound(format!("{}.{}", self.name, name)))?;
        Scope::from_args(definition, args)
    }

    /// Value of an attribute or method on an instance of this model.
    pub fn read(&self, record: &Record, name: &str) -> Value {
        match self.methods.get(name) {
            Some(method) => method(record),
            None => record.get(name).clone(),
        }
    }

    /// Owner entity named by the default scope, when set and present.
    pub fn default_owner(&self, record: &Record) -> Option<EntityRef> {
        let association = self.default_scope.as_deref()?;
        self.read(record, association).as_entity().cloned()
    }

    fn resolve(&self, param: &str) -> Option<ParamSource> {
        if self.attributes.contains(param) {
            Some(ParamSource::Attribute(param.to_string()))
        } else {
            self.methods
                .get(param)
                .map(|method| ParamSource::Method(Arc::clone(method)))
        }
    }
}

impl fmt::Debug for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelType")
            .field("name", &self.name)
            .field("attributes", &self.attributes)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("scopes", &self.scopes.keys().collect::<Vec<_>>())
            .field("actions", &self.actions)
            .field("default_scope", &self.default_scope)
            .field("touches", &self.touches)
            .finish()
    }
}
