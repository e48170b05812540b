//! Authorization filter for a Faye server relaying sync messages.
//!
//! Publishing is reserved for holders of the shared auth token; clients may
//! only subscribe. The token never reaches subscribers.

use crate::channel::tokens_match;
use crate::clients::BATCH_CHANNEL;
use serde_json::{Map, Value as Json};
use tracing::warn;

/// Error attached to messages that fail authentication.
pub const INVALID_TOKEN: &str = "Invalid authentication token";

const META_PREFIX: &str = "/meta/";

/// Server-side extension applied to every message crossing the broker.
#[derive(Clone)]
pub struct FayeExtension {
    auth_token: String,
}

impl FayeExtension {
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
        }
    }

    /// Filter a message arriving at the broker.
    ///
    /// A rejected message still reaches `callback`, carrying an `error`
    /// field that makes the broker refuse it. Batches are unpacked and each
    /// inner message is filtered on its own.
    pub fn incoming<F>(&self, mut message: Json, callback: &mut F)
    where
        F: FnMut(Json),
    {
        if !self.authenticated(&message) {
            warn!(channel = ?channel(&message), "rejected unauthenticated message");
            if let Some(fields) = message.as_object_mut() {
                fields.insert("error".into(), Json::String(INVALID_TOKEN.into()));
            }
            callback(message);
            return;
        }

        if channel(&message) == Some(BATCH_CHANNEL) {
            let inner = match message.get_mut("data").map(Json::take) {
                Some(Json::Array(messages)) => messages,
                _ => Vec::new(),
            };
            for message in inner {
                self.incoming(message, callback);
            }
        } else {
            callback(message);
        }
    }

    /// Strip the auth token from a message leaving the broker.
    pub fn outgoing<F>(&self, mut message: Json, callback: &mut F)
    where
        F: FnMut(Json),
    {
        let carries_token = message
            .get("ext")
            .and_then(|ext| ext.get("auth_token"))
            .is_some();
        if carries_token {
            if let Some(fields) = message.as_object_mut() {
                fields.insert("ext".into(), Json::Object(Map::new()));
            }
        }
        callback(message);
    }

    fn authenticated(&self, message: &Json) -> bool {
        if channel(message).is_some_and(|c| c.starts_with(META_PREFIX)) {
            return true;
        }
        message
            .get("ext")
            .and_then(|ext| ext.get("auth_token"))
            .and_then(Json::as_str)
            .is_some_and(|token| tokens_match(token, &self.auth_token))
    }
}

fn channel(message: &Json) -> Option<&str> {
    message.get("channel").and_then(Json::as_str)
}
