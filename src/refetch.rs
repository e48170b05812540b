//! Pull-based refetch of a single refetch partial.
//!
//! A browser holding a refetch partial gets `{refetch: true}` instead of
//! HTML and asks for fresh content with the scope-free token it was given
//! when the partial was rendered.

use crate::channel::ChannelSigner;
use crate::error::RefetchError;
use crate::model::ModelRegistry;
use crate::partials::{PartialCatalog, Renderer};
use crate::resource::Resource;
use crate::scopes::MemoryTable;
use crate::types::{ModelName, Record, RecordId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Parameters of a refetch request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefetchRequest {
    pub resource_name: String,
    pub resource_id: Option<u64>,
    pub partial_name: String,
    pub auth_token: String,
}

/// Body of a successful refetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefetchResponse {
    pub html: String,
}

/// Data-store lookup used to load the refetched record.
pub trait RecordLoader {
    fn find(&self, model: &ModelName, id: RecordId) -> Option<Record>;
}

impl<F> RecordLoader for F
where
    F: Fn(&ModelName, RecordId) -> Option<Record>,
{
    fn find(&self, model: &ModelName, id: RecordId) -> Option<Record> {
        self(model, id)
    }
}

impl RecordLoader for MemoryTable {
    fn find(&self, model: &ModelName, id: RecordId) -> Option<Record> {
        if self.model() == model {
            self.get(id)
        } else {
            None
        }
    }
}

/// Serves refetch requests for models that have refetch partials.
pub struct Refetcher {
    registry: Arc<ModelRegistry>,
    catalog: PartialCatalog,
    signer: ChannelSigner,
}

impl Refetcher {
    pub fn new(registry: Arc<ModelRegistry>, catalog: PartialCatalog, signer: ChannelSigner) -> Self {
        Self {
            registry,
            catalog,
            signer,
        }
    }

    /// Validate `request` and render the requested refetch partial.
    pub fn refetch(
        &self,
        request: &RefetchRequest,
        loader: &dyn RecordLoader,
        renderer: &dyn Renderer,
    ) -> Result<RefetchResponse, RefetchError> {
        let result = self.serve(request, loader, renderer);
        if let Err(err) = &result {
            warn!(
                resource = %request.resource_name,
                partial = %request.partial_name,
                error = %err,
                "refused refetch"
            );
        }
        result
    }

    fn serve(
        &self,
        request: &RefetchRequest,
        loader: &dyn RecordLoader,
        renderer: &dyn Renderer,
    ) -> Result<RefetchResponse, RefetchError> {
        if request.resource_name.is_empty()
            || request.partial_name.is_empty()
            || request.auth_token.is_empty()
        {
            return Err(RefetchError::BadRequest(
                "resource_name, partial_name and auth_token are required",
            ));
        }

        let model = self
            .registry
            .get(&request.resource_name)
            .ok_or_else(|| RefetchError::NotFound(request.resource_name.clone()))?;
        let model_name = model.name();
        let supported = self
            .catalog
            .refetch_models()
            .map_err(|e| RefetchError::NotFound(format!("{}: {}", model_name, e)))?;
        if !supported.iter().any(|plural| plural == model_name.plural()) {
            return Err(RefetchError::NotFound(format!("{} has no refetch partials", model_name)));
        }

        let id = request
            .resource_id
            .map(RecordId)
            .ok_or_else(|| RefetchError::NotFound(format!("{} without id", model_name)))?;
        let record = loader
            .find(model_name, id)
            .ok_or_else(|| RefetchError::NotFound(format!("{} {}", model_name, id)))?;

        let resource = Resource::new(record.entity_ref());
        let partial = self
            .catalog
            .find_refetch(&resource, &request.partial_name)
            .map_err(|e| RefetchError::NotFound(e.to_string()))?
            .ok_or_else(|| {
                RefetchError::NotFound(format!("{}/refetch/{}", model_name.plural(), request.partial_name))
            })?;

        if !partial.authorize(&self.signer, &request.auth_token) {
            return Err(RefetchError::Unauthorized(partial.refetch_identity()));
        }

        let html = partial
            .render(renderer)
            .map_err(|e| RefetchError::Render(e.to_string()))?;
        debug!(partial = %partial.path(), id = %id, "served refetch");
        Ok(RefetchResponse { html })
    }
}
