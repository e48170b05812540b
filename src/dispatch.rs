//! Rendering and publishing of planned actions.

use crate::channel::ChannelSigner;
use crate::clients::{Client, Message};
use crate::error::Result;
use crate::model::Action;
use crate::partials::{Partial, PartialCatalog, Renderer};
use crate::resource::Resource;
use crate::types::SyncAction;
use std::sync::Arc;
use tracing::debug;

/// Turns actions into messages and hands them to the broker client.
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<Client>,
    catalog: PartialCatalog,
    renderer: Arc<dyn Renderer>,
}

impl Dispatcher {
    pub fn new(client: Client, catalog: PartialCatalog, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            client: Arc::new(client),
            catalog,
            renderer,
        }
    }

    /// The same dispatcher rendering through `renderer`.
    pub fn with_renderer(&self, renderer: Arc<dyn Renderer>) -> Self {
        Self {
            client: Arc::clone(&self.client),
            catalog: self.catalog.clone(),
            renderer,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn catalog(&self) -> &PartialCatalog {
        &self.catalog
    }

    pub fn signer(&self) -> &ChannelSigner {
        self.client.signer()
    }

    /// Publish a newly created resource to its `new` channels.
    pub fn sync_new(&self, resource: &Resource, partial: Option<&str>) -> Result<usize> {
        self.sync(resource, SyncAction::New, partial)
    }

    pub fn sync_update(&self, resource: &Resource, partial: Option<&str>) -> Result<usize> {
        self.sync(resource, SyncAction::Update, partial)
    }

    pub fn sync_destroy(&self, resource: &Resource, partial: Option<&str>) -> Result<usize> {
        self.sync(resource, SyncAction::Destroy, partial)
    }

    /// Publish `action` for every partial of `resource`, or only the
    /// partials named `partial`, as one batch.
    ///
    /// Returns the number of messages in the batch.
    pub fn sync(&self, resource: &Resource, action: SyncAction, partial: Option<&str>) -> Result<usize> {
        let messages = self.messages(resource, action, partial)?;
        debug!(
            resource = %resource.polymorphic_path(),
            %action,
            messages = messages.len(),
            "publishing sync batch"
        );
        self.client.batch_publish(&messages)?;
        Ok(messages.len())
    }

    /// Messages `sync` would publish.
    pub fn messages(
        &self,
        resource: &Resource,
        action: SyncAction,
        partial: Option<&str>,
    ) -> Result<Vec<Message>> {
        let partials = match partial {
            Some(name) => self.catalog.named(resource, name)?,
            None => self.catalog.partials(resource)?,
        };
        partials
            .iter()
            .map(|partial| self.message(partial, action))
            .collect()
    }

    fn message(&self, partial: &Partial, action: SyncAction) -> Result<Message> {
        let signer = self.signer();
        let renderer = self.renderer.as_ref();
        match action {
            SyncAction::New => {
                let creator = partial.creator();
                let payload = creator.payload(signer, renderer)?;
                Ok(self.client.build_message(creator.channel(signer), payload))
            }
            _ => {
                let payload = partial.payload(action, renderer)?;
                Ok(self
                    .client
                    .build_message(partial.channel_for_action(signer, action), payload))
            }
        }
    }

    /// Publish one planned action.
    pub fn perform(&self, action: &Action) -> Result<usize> {
        self.sync(&action.resource(), action.kind, None)
    }
}
