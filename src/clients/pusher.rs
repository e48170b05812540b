//! Push broker (Pusher) client over its REST trigger API.

use super::message::Message;
use super::transport::HttpTransport;
use super::Delivery;
use crate::channel::{ChannelSigner, Normalization};
use crate::error::Result;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::Value as Json;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Event name of every sync message.
pub const EVENT_NAME: &str = "sync";

pub const DEFAULT_HOST: &str = "api.pusherapp.com";

/// Credentials and endpoint of a Pusher app.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PusherApp {
    pub app_id: String,
    pub key: String,
    pub secret: String,
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
}

impl PusherApp {
    pub fn new(app_id: impl Into<String>, key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            key: key.into(),
            secret: secret.into(),
            scheme: "http".to_string(),
            host: DEFAULT_HOST.to_string(),
            port: None,
        }
    }
}

#[derive(Serialize)]
struct TriggerBody<'a> {
    name: &'a str,
    channels: &'a [&'a str],
    data: &'a str,
}

/// A signed trigger request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriggerRequest {
    pub url: String,
    pub body: String,
}

/// Publishes by triggering the `sync` event on each message's channel.
#[derive(Clone)]
pub struct PusherClient {
    app: PusherApp,
    signer: ChannelSigner,
    transport: Arc<dyn HttpTransport>,
    delivery: Delivery,
}

impl PusherClient {
    pub fn new(app: PusherApp, transport: Arc<dyn HttpTransport>, delivery: Delivery) -> Self {
        Self {
            signer: ChannelSigner::new(&app.secret, Normalization::Verbatim),
            app,
            transport,
            delivery,
        }
    }

    pub fn app(&self) -> &PusherApp {
        &self.app
    }

    pub fn signer(&self) -> &ChannelSigner {
        &self.signer
    }

    pub fn build_message(&self, channel: impl Into<String>, data: Json) -> Message {
        Message::new(channel, data, self.app.secret.clone())
    }

    pub fn publish(&self, message: &Message) -> Result<()> {
        let data = message.data.to_string();
        let request = self.trigger_request(&[message.channel.as_str()], EVENT_NAME, &data, unix_now())?;
        debug!(channel = %message.channel, "triggering pusher event");

        let transport = Arc::clone(&self.transport);
        self.delivery
            .run(move || transport.post_json(&request.url, &request.body))
    }

    /// Pusher has no batch endpoint: one trigger per message.
    pub fn batch_publish(&self, messages: &[Message]) -> Result<()> {
        for message in messages {
            self.publish(message)?;
        }
        Ok(())
    }

    /// Build the signed `POST /apps/{app_id}/events` request.
    pub fn trigger_request(
        &self,
        channels: &[&str],
        event: &str,
        data: &str,
        timestamp: u64,
    ) -> Result<TriggerRequest> {
        let body = serde_json::to_string(&TriggerBody {
            name: event,
            channels,
            data,
        })?;
        let path = format!("/apps/{}/events", self.app.app_id);

        // Parameters in key order, as the signature requires.
        let query = format!(
            "auth_key={}&auth_timestamp={}&auth_version=1.0&body_md5={}",
            self.app.key,
            timestamp,
            hex::encode(Md5::digest(body.as_bytes()))
        );
        let signature = self.sign(&format!("POST\n{}\n{}", path, query));

        let port = self.app.port.map(|p| format!(":{}", p)).unwrap_or_default();
        let url = format!(
            "{}://{}{}{}?{}&auth_signature={}",
            self.app.scheme, self.app.host, port, path, query, signature
        );
        Ok(TriggerRequest { url, body })
    }

    fn sign(&self, payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.app.secret.as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Unused;

    impl HttpTransport for Unused {
        fn post_form(&self, _url: &str, _form: &[(&str, &str)]) -> Result<()> {
            unreachable!()
        }

        fn post_json(&self, _url: &str, _body: &str) -> Result<()> {
            unreachable!()
        }
    }

    #[test]
    fn test_trigger_request_signature() {
        // Worked example from the Pusher REST API documentation.
        let app = PusherApp::new("3", "278d425bdf160c739803", "7ad3773142a6692b25b8");
        let client = PusherClient::new(app, Arc::new(Unused), Delivery::Synchronous);

        let request = client
            .trigger_request(&["project-3"], "foo", r#"{"some":"data"}"#, 1353088179)
            .unwrap();

        assert_eq!(
            request.body,
            r#"{"name":"foo","channels":["project-3"],"data":"{\"some\":\"data\"}"}"#
        );
        assert_eq!(
            request.url,
            "http://api.pusherapp.com/apps/3/events?auth_key=278d425bdf160c739803\
             &auth_timestamp=1353088179&auth_version=1.0\
             &body_md5=ec365a775a4cd0599faeb73354201b6f\
             &auth_signature=da454824c97ba181a32ccc17a72625ba02771f50b50e1e7430e47a1f3f457e6c"
        );
    }

    #[test]
    fn test_custom_endpoint() {
        let mut app = PusherApp::new("1", "key", "secret");
        app.scheme = "https".into();
        app.host = "pusher.internal".into();
        app.port = Some(8443);
        let client = PusherClient::new(app, Arc::new(Unused), Delivery::Synchronous);

        let request = client.trigger_request(&["abc"], EVENT_NAME, "{}", 1).unwrap();
        assert!(request.url.starts_with("https://pusher.internal:8443/apps/1/events?auth_key=key&"));
    }
}
