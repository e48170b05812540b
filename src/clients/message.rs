//! Wire messages.

use serde_json::{json, Value as Json};

/// Reserved channel under which a batch of messages is published.
pub const BATCH_CHANNEL: &str = "/batch_publish";

/// A payload addressed to one channel.
///
/// The auth token travels beside the payload and is never part of it.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub channel: String,
    pub data: Json,
    auth_token: String,
}

impl Message {
    pub fn new(channel: impl Into<String>, data: Json, auth_token: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            data,
            auth_token: auth_token.into(),
        }
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// `{"channel", "data", "ext": {"auth_token"}}`.
    pub fn envelope(&self) -> Json {
        json!({
            "channel": self.channel,
            "data": self.data,
            "ext": { "auth_token": self.auth_token },
        })
    }
}

/// One envelope carrying every message under [`BATCH_CHANNEL`].
pub fn batch_envelope(messages: &[Message], auth_token: &str) -> Json {
    json!({
        "channel": BATCH_CHANNEL,
        "data": messages.iter().map(Message::envelope).collect::<Vec<_>>(),
        "ext": { "auth_token": auth_token },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope() {
        let message = Message::new("/abc-update", json!({ "html": "<p/>" }), "secret");
        let envelope = message.envelope();
        assert_eq!(envelope["channel"], "/abc-update");
        assert_eq!(envelope["data"]["html"], "<p/>");
        assert_eq!(envelope["ext"]["auth_token"], "secret");
    }

    #[test]
    fn test_batch_envelope() {
        let messages = vec![
            Message::new("/a", json!({}), "secret"),
            Message::new("/b", json!({}), "secret"),
        ];
        let batch = batch_envelope(&messages, "secret");
        assert_eq!(batch["channel"], BATCH_CHANNEL);
        assert_eq!(batch["data"].as_array().unwrap().len(), 2);
        assert_eq!(batch["data"][1]["channel"], "/b");
    }
}
