//! Error types for sync operations.

use thiserror::Error;

/// Main error type for sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameters {params:?}: parameter names of sync scope '{scope}' may only name attributes or methods of {model}")]
    InvalidParameters {
        model: String,
        scope: String,
        params: Vec<String>,
    },

    #[error("Invalid scope name '{name}': already defined on {model}")]
    DuplicateScope { model: String, name: String },

    #[error("Scope not found: {0}")]
    ScopeNotFound(String),

    #[error("Model not registered: {0}")]
    UnknownModel(String),

    #[error("Wrong number of arguments ({got} for {expected})")]
    ArgumentCount { expected: usize, got: usize },

    #[error("Invalid argument '{param}' ({found}): only integers and entities are supported")]
    ArgumentType { param: String, found: String },

    #[error("Scope evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("auth_token missing")]
    MissingAuthToken,

    #[error("Missing setting: {0}")]
    MissingSetting(&'static str),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Reactor is not accepting work")]
    ReactorStopped,
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        SyncError::Network(e.to_string())
    }
}

/// A scope predicate could not be evaluated against the current data.
///
/// This is an expected outcome (for example a required association is
/// nil) and means the scope is currently inapplicable.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("argument '{0}' is missing")]
    MissingArgument(String),

    #[error("argument '{param}' has unexpected type {found}")]
    UnexpectedType { param: String, found: String },

    #[error("relation failed: {0}")]
    Relation(String),
}

/// Reasons a refetch request is refused.
///
/// The HTTP collaborator answers all of these with a bad request.
#[derive(Debug, Error)]
pub enum RefetchError {
    #[error("Bad request: {0}")]
    BadRequest(&'static str),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unauthorized refetch of {0}")]
    Unauthorized(String),

    #[error("Render error: {0}")]
    Render(String),
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
