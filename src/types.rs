//! Core types shared by scopes, planning and dispatch.

use crate::error::EvaluationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Primary key of a persisted record.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(pub u64);

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Underscored model name, e.g. `user` / `users`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelName {
    singular: String,
    plural: String,
}

impl ModelName {
    /// Name with a regular plural (`todo` -> `todos`).
    pub fn new(singular: impl Into<String>) -> Self {
        let singular = singular.into();
        let plural = format!("{}s", singular);
        Self { singular, plural }
    }

    /// Name with an explicit plural (`person` -> `people`).
    pub fn with_plural(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
        }
    }

    pub fn singular(&self) -> &str {
        &self.singular
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    /// Last segment of a namespaced name (`admin/user` -> `user`).
    pub fn base_name(&self) -> &str {
        self.singular.rsplit('/').next().unwrap_or(&self.singular)
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.singular)
    }
}

/// Reference to an entity of some model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub model: ModelName,
    /// `None` while the entity is not yet persisted.
    pub id: Option<RecordId>,
}

impl EntityRef {
    pub fn new(model: ModelName, id: u64) -> Self {
        Self {
            model,
            id: Some(RecordId(id)),
        }
    }

    pub fn unsaved(model: ModelName) -> Self {
        Self { model, id: None }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Primary key as a path segment (empty while unsaved).
    pub fn id_segment(&self) -> String {
        self.id.map(|id| id.to_string()).unwrap_or_default()
    }
}

/// Attribute value of a record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Entity(EntityRef),
}

static NULL: Value = Value::Null;

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "nil",
            Value::Bool(_) => "bool",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Entity(_) => "entity",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Value::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Whether this value may be bound as a scope argument.
    pub fn is_scope_argument(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Entity(_))
    }

    /// Read a scope argument as an entity, for use inside predicates.
    pub fn entity_arg(&self, param: &str) -> Result<&EntityRef, EvaluationError> {
        match self {
            Value::Entity(entity) => Ok(entity),
            Value::Null => Err(EvaluationError::MissingArgument(param.to_string())),
            other => Err(EvaluationError::UnexpectedType {
                param: param.to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Read a scope argument as an integer, for use inside predicates.
    pub fn integer_arg(&self, param: &str) -> Result<i64, EvaluationError> {
        match self {
            Value::Integer(i) => Ok(*i),
            Value::Null => Err(EvaluationError::MissingArgument(param.to_string())),
            other => Err(EvaluationError::UnexpectedType {
                param: param.to_string(),
                found: other.type_name().to_string(),
            }),
        }
    }

    /// Rendering of this value inside a channel path.
    pub fn path_segment(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => s.clone(),
            Value::Entity(entity) => entity.id_segment(),
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<EntityRef> for Value {
    fn from(entity: EntityRef) -> Self {
        Value::Entity(entity)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Locals handed to the renderer, keyed by local name.
pub type Locals = BTreeMap<String, Value>;

/// An entity as seen by the lifecycle hooks.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub model: ModelName,
    pub id: Option<RecordId>,
    pub attributes: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(model: ModelName) -> Self {
        Self {
            model,
            id: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(RecordId(id));
        self
    }

    /// Builder-style attribute assignment.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Attribute value, `Null` when absent.
    pub fn get(&self, name: &str) -> &Value {
        self.attributes.get(name).unwrap_or(&NULL)
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            model: self.model.clone(),
            id: self.id,
        }
    }
}

/// Lifecycle action published to subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    New,
    Update,
    Destroy,
}

impl SyncAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncAction::New => "new",
            SyncAction::Update => "update",
            SyncAction::Destroy => "destroy",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record transition reported by the ORM collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    Create,
    Update,
    Destroy,
}
