//! Registry of synced model types.

use super::types::ModelType;
use crate::error::{Result, SyncError};
use crate::types::ModelName;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Registered model types, keyed by singular model name.
pub struct ModelRegistry {
    models: RwLock<HashMap<String, Arc<ModelType>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            models: RwLock::new(HashMap::new()),
        }
    }

    /// Register a model type, replacing any previous registration.
    pub fn register(&self, model: ModelType) -> Arc<ModelType> {
        let model = Arc::new(model);
        let name = model.name().singular().to_string();
        info!(model = %name, scopes = model.scope_definitions().count(), "registered synced model");
        self.models.write().insert(name, Arc::clone(&model));
        model
    }

    pub fn get(&self, name: &str) -> Option<Arc<ModelType>> {
        self.models.read().get(name).cloned()
    }

    /// Look up the model type of a record.
    pub fn require(&self, model: &ModelName) -> Result<Arc<ModelType>> {
        self.get(model.singular())
            .ok_or_else(|| SyncError::UnknownModel(model.to_string()))
    }

    pub fn len(&self) -> usize {
        self.models.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.read().is_empty()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
