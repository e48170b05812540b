//! Scopes bound to concrete arguments.

use super::definition::ScopeDefinition;
use super::relation::Relation;
use crate::error::{EvaluationError, Result, SyncError};
use crate::types::{Record, Value};
use std::cell::Cell;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// A scope definition bound to arguments.
///
/// Scopes live for one evaluation. The validity probe is cached: `None`
/// until the scope has been evaluated once.
#[derive(Clone)]
pub struct Scope {
    definition: Arc<ScopeDefinition>,
    args: Vec<Value>,
    valid: Cell<Option<bool>>,
}

impl Scope {
    /// Bind explicit arguments (e.g. `User.in_group(group)`).
    ///
    /// Fails when the arity does not match or an argument is neither an
    /// integer nor an entity.
    pub fn from_args(definition: &Arc<ScopeDefinition>, args: Vec<Value>) -> Result<Self> {
        let expected = definition.parameters().len();
        if args.len() != expected {
            return Err(SyncError::ArgumentCount {
                expected,
                got: args.len(),
            });
        }

        for (param, arg) in definition.parameters().iter().zip(&args) {
            if !arg.is_scope_argument() {
                return Err(SyncError::ArgumentType {
                    param: param.clone(),
                    found: arg.type_name().to_string(),
                });
            }
        }

        Ok(Self::bind(definition, args))
    }

    /// Bind the arguments named by the definition's parameters from a
    /// model instance. Type problems only surface on evaluation.
    pub fn from_entity(definition: &Arc<ScopeDefinition>, record: &Record) -> Self {
        Self::bind(definition, definition.extract_args(record))
    }

    fn bind(definition: &Arc<ScopeDefinition>, args: Vec<Value>) -> Self {
        Self {
            definition: Arc::clone(definition),
            args,
            valid: Cell::new(None),
        }
    }

    pub fn definition(&self) -> &Arc<ScopeDefinition> {
        &self.definition
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Materialize the predicate against the data store.
    pub fn evaluate(&self) -> std::result::Result<Box<dyn Relation>, EvaluationError> {
        self.definition.relation(&self.args)
    }

    /// Whether the scope can currently be evaluated at all.
    pub fn valid(&self) -> bool {
        if let Some(valid) = self.valid.get() {
            return valid;
        }

        let valid = match self.evaluate().and_then(|relation| relation.exists()) {
            Ok(_) => true,
            Err(err) => {
                debug!(scope = self.name(), error = %err, "scope is not applicable");
                false
            }
        };
        self.valid.set(Some(valid));
        valid
    }

    /// Whether the record's primary key is part of the scope.
    ///
    /// An evaluation failure is returned to the caller and marks the scope
    /// invalid unless validity was already computed. A successful lookup
    /// leaves the cached validity untouched. Unsaved records are never
    /// members.
    pub fn contains(&self, record: &Record) -> std::result::Result<bool, EvaluationError> {
        let Some(id) = record.id else {
            return Ok(false);
        };

        let found = self.evaluate().and_then(|relation| relation.contains(id));
        if found.is_err() && self.valid.get().is_none() {
            self.valid.set(Some(false));
        }
        found
    }

    /// `[name, param1, value1, param2, value2, ...]`.
    pub fn path_segments(&self) -> Vec<String> {
        let mut segments = Vec::with_capacity(1 + self.args.len() * 2);
        segments.push(self.definition.name().to_string());
        for (param, arg) in self.definition.parameters().iter().zip(&self.args) {
            segments.push(param.clone());
            segments.push(arg.path_segment());
        }
        segments
    }

    /// Path of the scope, e.g. `/in_group/group/1`.
    pub fn polymorphic_path(&self) -> String {
        format!("/{}", self.path_segments().join("/"))
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.definition.name())
            .field("args", &self.args)
            .field("valid", &self.valid.get())
            .finish()
    }
}
