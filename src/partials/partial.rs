//! Synced partials and their channels.

use super::subscription::{CreatorSubscription, PartialSubscription};
use super::Renderer;
use crate::channel::ChannelSigner;
use crate::error::Result;
use crate::resource::Resource;
use crate::types::{Locals, SyncAction, Value};
use serde_json::{json, Map, Value as Json};

/// A partial template bound to a resource.
///
/// Plain partials ship rendered HTML with every message; refetch partials
/// only tell the browser to pull fresh content through the refetch
/// endpoint.
#[derive(Clone, Debug)]
pub struct Partial {
    name: String,
    resource: Resource,
    refetch: bool,
}

impl Partial {
    pub fn new(name: impl Into<String>, resource: Resource) -> Self {
        Self {
            name: name.into(),
            resource,
            refetch: false,
        }
    }

    pub fn refetch(name: impl Into<String>, resource: Resource) -> Self {
        Self {
            name: name.into(),
            resource,
            refetch: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub fn is_refetch(&self) -> bool {
        self.refetch
    }

    /// Template path handed to the renderer.
    pub fn path(&self) -> String {
        if self.refetch {
            format!("sync/{}/refetch/{}", self.resource.plural_name(), self.name)
        } else {
            format!("sync/{}/{}", self.resource.plural_name(), self.name)
        }
    }

    /// The resource under its base name.
    pub fn locals(&self) -> Locals {
        let mut locals = Locals::new();
        locals.insert(
            self.resource.base_name().to_string(),
            Value::Entity(self.resource.entity.clone()),
        );
        locals
    }

    /// Scoped identity, `"{polymorphic_path}-_{name}"`.
    pub fn identity(&self) -> String {
        format!("{}-_{}", self.resource.polymorphic_path(), self.name)
    }

    /// Scope-free identity, `"{model_path}-_{name}"`.
    ///
    /// A refetch request only knows the record and the partial name.
    pub fn refetch_identity(&self) -> String {
        format!("{}-_{}", self.resource.model_path(), self.name)
    }

    pub fn auth_token(&self, signer: &ChannelSigner) -> String {
        signer.channel(&self.identity())
    }

    pub fn refetch_auth_token(&self, signer: &ChannelSigner) -> String {
        signer.channel(&self.refetch_identity())
    }

    /// Channel of `action` on this partial.
    ///
    /// Updates go out on the scope-free identity so that every subscriber
    /// of the record sees them, whatever scope it rendered the record in.
    pub fn channel_for_action(&self, signer: &ChannelSigner, action: SyncAction) -> String {
        match action {
            SyncAction::Update => signer.channel_for(&self.refetch_identity(), action),
            _ => signer.channel_for(&self.identity(), action),
        }
    }

    pub fn selector_start(&self, signer: &ChannelSigner) -> String {
        format!("{}-start", self.auth_token(signer))
    }

    pub fn selector_end(&self, signer: &ChannelSigner) -> String {
        format!("{}-end", self.auth_token(signer))
    }

    /// Whether `token` authorizes a refetch of this partial.
    pub fn authorize(&self, signer: &ChannelSigner, token: &str) -> bool {
        signer.authorize(token, &self.refetch_identity())
    }

    pub fn render(&self, renderer: &dyn Renderer) -> Result<String> {
        renderer.render_to_string(&self.path(), &self.locals())
    }

    /// Message payload for `action`.
    ///
    /// Destroys carry no HTML, and refetch partials are never rendered.
    pub fn payload(&self, action: SyncAction, renderer: &dyn Renderer) -> Result<Json> {
        if self.refetch {
            return Ok(json!({ "refetch": true }));
        }
        let html = match action {
            SyncAction::Destroy => None,
            _ => Some(self.render(renderer)?),
        };
        Ok(json!({ "html": html }))
    }

    /// What a page embeds to follow this partial.
    pub fn subscription(&self, signer: &ChannelSigner) -> PartialSubscription {
        PartialSubscription {
            name: self.name.clone(),
            resource_name: self.resource.name().to_string(),
            resource_id: self.resource.id(),
            auth_token: self.refetch_auth_token(signer),
            channel_update: self.channel_for_action(signer, SyncAction::Update),
            channel_destroy: self.channel_for_action(signer, SyncAction::Destroy),
            selector_start: self.selector_start(signer),
            selector_end: self.selector_end(signer),
            refetch: self.refetch,
        }
    }

    pub fn creator(&self) -> PartialCreator {
        PartialCreator {
            partial: self.clone(),
        }
    }
}

/// Publishes newly created records onto the `new` path of a scope chain.
#[derive(Clone, Debug)]
pub struct PartialCreator {
    partial: Partial,
}

impl PartialCreator {
    pub fn partial(&self) -> &Partial {
        &self.partial
    }

    /// `"{polymorphic_new_path}-_{name}"`.
    pub fn identity(&self) -> String {
        format!(
            "{}-_{}",
            self.partial.resource.polymorphic_new_path(),
            self.partial.name
        )
    }

    pub fn channel(&self, signer: &ChannelSigner) -> String {
        signer.channel_for(&self.identity(), SyncAction::New)
    }

    /// Rendered record plus everything the browser needs to follow it.
    pub fn payload(&self, signer: &ChannelSigner, renderer: &dyn Renderer) -> Result<Json> {
        let partial = &self.partial;
        let mut payload = Map::new();
        if partial.refetch {
            payload.insert("refetch".into(), Json::Bool(true));
        } else {
            payload.insert("html".into(), Json::String(partial.render(renderer)?));
        }
        payload.insert("resourceId".into(), json!(partial.resource.id()));
        payload.insert("authToken".into(), json!(partial.refetch_auth_token(signer)));
        payload.insert(
            "channelUpdate".into(),
            json!(partial.channel_for_action(signer, SyncAction::Update)),
        );
        payload.insert(
            "channelDestroy".into(),
            json!(partial.channel_for_action(signer, SyncAction::Destroy)),
        );
        payload.insert("selectorStart".into(), json!(partial.selector_start(signer)));
        payload.insert("selectorEnd".into(), json!(partial.selector_end(signer)));
        Ok(Json::Object(payload))
    }

    pub fn subscription(&self, signer: &ChannelSigner) -> CreatorSubscription {
        let channel = self.channel(signer);
        CreatorSubscription {
            name: self.partial.name.clone(),
            resource_name: self.partial.resource.name().to_string(),
            selector: channel.clone(),
            channel,
            refetch: self.partial.refetch,
        }
    }
}
