//! Named, parameterized sync scope definitions.

use super::relation::Relation;
use crate::error::EvaluationError;
use crate::types::{ModelName, Record, Value};
use std::fmt;
use std::sync::Arc;

/// Scope predicate: binds arguments into a relation.
pub type Predicate =
    Arc<dyn Fn(&[Value]) -> Result<Box<dyn Relation>, EvaluationError> + Send + Sync>;

/// Zero-argument derived value of a model instance.
pub type Method = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// Where a scope parameter reads its value from on a model instance.
#[derive(Clone)]
pub enum ParamSource {
    /// A column or association.
    Attribute(String),
    /// A zero-argument instance method.
    Method(Method),
}

impl ParamSource {
    pub fn read(&self, record: &Record) -> Value {
        match self {
            ParamSource::Attribute(name) => record.get(name).clone(),
            ParamSource::Method(method) => method(record),
        }
    }
}

impl fmt::Debug for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamSource::Attribute(name) => f.debug_tuple("Attribute").field(name).finish(),
            ParamSource::Method(_) => f.write_str("Method(..)"),
        }
    }
}

/// Immutable descriptor of a sync scope registered on a model.
///
/// Parameter names double as the names of the attributes (or methods) the
/// arguments are read from when a scope is bound to a model instance.
pub struct ScopeDefinition {
    model: ModelName,
    name: String,
    parameters: Vec<String>,
    sources: Vec<ParamSource>,
    predicate: Predicate,
}

impl ScopeDefinition {
    /// Parameters must already be resolved against the owning model.
    pub(crate) fn new(
        model: ModelName,
        name: String,
        parameters: Vec<String>,
        sources: Vec<ParamSource>,
        predicate: Predicate,
    ) -> Self {
        debug_assert_eq!(parameters.len(), sources.len());
        Self {
            model,
            name,
            parameters,
            sources,
            predicate,
        }
    }

    pub fn model(&self) -> &ModelName {
        &self.model
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Read one argument per parameter from a model instance.
    pub fn extract_args(&self, record: &Record) -> Vec<Value> {
        self.sources.iter().map(|source| source.read(record)).collect()
    }

    /// Run the predicate with the given arguments.
    pub fn relation(&self, args: &[Value]) -> Result<Box<dyn Relation>, EvaluationError> {
        (self.predicate)(args)
    }
}

impl fmt::Debug for ScopeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopeDefinition")
            .field("model", &self.model)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish()
    }
}
