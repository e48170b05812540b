//! Polling broker (Faye) client.

use super::message::{batch_envelope, Message};
use super::transport::HttpTransport;
use super::Delivery;
use crate::channel::{ChannelSigner, Normalization};
use crate::error::Result;
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::debug;

/// Publishes to a Faye server by posting a `message` form field.
#[derive(Clone)]
pub struct FayeClient {
    server: String,
    auth_token: String,
    signer: ChannelSigner,
    transport: Arc<dyn HttpTransport>,
    delivery: Delivery,
}

impl FayeClient {
    pub fn new(
        server: impl Into<String>,
        auth_token: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        delivery: Delivery,
    ) -> Self {
        let auth_token = auth_token.into();
        Self {
            server: server.into(),
            signer: ChannelSigner::new(&auth_token, Normalization::LeadingSlash),
            auth_token,
            transport,
            delivery,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn signer(&self) -> &ChannelSigner {
        &self.signer
    }

    pub fn build_message(&self, channel: impl Into<String>, data: Json) -> Message {
        Message::new(channel, data, self.auth_token.clone())
    }

    pub fn publish(&self, message: &Message) -> Result<()> {
        let body = message.envelope().to_string();
        debug!(channel = %message.channel, "publishing to faye");
        self.post(body)
    }

    /// Publish every message in a single request.
    pub fn batch_publish(&self, messages: &[Message]) -> Result<()> {
        if messages.is_empty() {
            return Ok(());
        }
        let body = batch_envelope(messages, &self.auth_token).to_string();
        debug!(messages = messages.len(), "batch publishing to faye");
        self.post(body)
    }

    fn post(&self, body: String) -> Result<()> {
        let transport = Arc::clone(&self.transport);
        let server = self.server.clone();
        self.delivery
            .run(move || transport.post_form(&server, &[("message", body.as_str())]))
    }
}
