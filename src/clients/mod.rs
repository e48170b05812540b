//! Broker clients.
//!
//! The broker is picked once, at configuration time:
//!
//! - `Faye`: HTTP polling broker, batches go out as one request
//! - `Pusher`: push broker, batches go out as one trigger per message
//! - `Null`: no broker configured, everything succeeds silently
//!
//! Each client publishes synchronously or schedules the network call on
//! a [`Reactor`](crate::reactor::Reactor).

mod faye;
mod message;
mod pusher;
mod transport;

pub use faye::FayeClient;
pub use message::{batch_envelope, Message, BATCH_CHANNEL};
pub use pusher::{PusherApp, PusherClient, TriggerRequest, DEFAULT_HOST, EVENT_NAME};
pub use transport::{HttpTransport, ReqwestTransport, DEFAULT_TIMEOUT};

use crate::channel::{ChannelSigner, Normalization};
use crate::error::Result;
use crate::reactor::Reactor;
use serde_json::Value as Json;
use std::sync::Arc;

/// Auth token substituted when no broker is configured.
pub const DUMMY_AUTH_TOKEN: &str = "dummy_auth_token";

/// How a publish reaches the network.
#[derive(Clone)]
pub enum Delivery {
    /// Block the caller for the duration of the request.
    Synchronous,
    /// Queue the request on the reactor and return.
    Asynchronous(Arc<Reactor>),
}

impl Delivery {
    pub fn is_async(&self) -> bool {
        matches!(self, Delivery::Asynchronous(_))
    }

    pub(crate) fn run<F>(&self, request: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        match self {
            Delivery::Synchronous => request(),
            Delivery::Asynchronous(reactor) => reactor.perform(request),
        }
    }
}

/// Broker used when none is configured.
#[derive(Clone, Debug)]
pub struct NullClient {
    signer: ChannelSigner,
}

impl NullClient {
    pub fn new() -> Self {
        Self {
            signer: ChannelSigner::new(DUMMY_AUTH_TOKEN, Normalization::Verbatim),
        }
    }
}

impl Default for NullClient {
    fn default() -> Self {
        Self::new()
    }
}

/// The configured broker.
#[derive(Clone)]
pub enum Client {
    Faye(FayeClient),
    Pusher(PusherClient),
    Null(NullClient),
}

impl Client {
    pub fn name(&self) -> &'static str {
        match self {
            Client::Faye(_) => "faye",
            Client::Pusher(_) => "pusher",
            Client::Null(_) => "null",
        }
    }

    /// Signer deriving channels in this broker's format.
    pub fn signer(&self) -> &ChannelSigner {
        match self {
            Client::Faye(client) => client.signer(),
            Client::Pusher(client) => client.signer(),
            Client::Null(client) => &client.signer,
        }
    }

    pub fn normalize_channel(&self, signature: &str) -> String {
        self.signer().normalization().apply(signature)
    }

    pub fn build_message(&self, channel: impl Into<String>, data: Json) -> Message {
        match self {
            Client::Faye(client) => client.build_message(channel, data),
            Client::Pusher(client) => client.build_message(channel, data),
            Client::Null(_) => Message::new(channel, data, DUMMY_AUTH_TOKEN),
        }
    }

    pub fn publish(&self, message: &Message) -> Result<()> {
        match self {
            Client::Faye(client) => client.publish(message),
            Client::Pusher(client) => client.publish(message),
            Client::Null(_) => Ok(()),
        }
    }

    pub fn batch_publish(&self, messages: &[Message]) -> Result<()> {
        match self {
            Client::Faye(client) => client.batch_publish(messages),
            Client::Pusher(client) => client.batch_publish(messages),
            Client::Null(_) => Ok(()),
        }
    }
}
