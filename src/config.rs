//! Sync configuration.
//!
//! The host application loads a `SyncConfig` from wherever it keeps its
//! settings (it derives `Deserialize`) and builds the broker client from it.

use crate::clients::{
    Client, Delivery, FayeClient, HttpTransport, NullClient, PusherApp, PusherClient,
    ReqwestTransport, DUMMY_AUTH_TOKEN,
};
use crate::error::{Result, SyncError};
use crate::partials::PartialCatalog;
use crate::reactor::Reactor;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Broker backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Adapter {
    Faye,
    Pusher,
}

impl Adapter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Adapter::Faye => "Faye",
            Adapter::Pusher => "Pusher",
        }
    }
}

/// Settings of the sync engine and its broker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Polling broker endpoint, e.g. `http://localhost:9292/faye`.
    pub server: Option<String>,
    /// Shared secret signing channels and authorizing publishes.
    pub auth_token: Option<String>,
    /// `None` selects the null broker.
    pub adapter: Option<Adapter>,
    /// Publish on the reactor instead of blocking the caller.
    #[serde(rename = "async")]
    pub async_delivery: bool,
    pub app_id: Option<String>,
    pub api_key: Option<String>,
    pub pusher_api_scheme: Option<String>,
    pub pusher_api_host: Option<String>,
    pub pusher_api_port: Option<u16>,
    pub pusher_ws_host: Option<String>,
    pub pusher_ws_port: Option<u16>,
    pub pusher_wss_port: Option<u16>,
    pub pusher_encrypted: Option<bool>,
    /// Directory holding `<plural>/_<partial>.*` templates.
    pub views_root: PathBuf,
    /// Timeout of broker requests in seconds.
    pub timeout: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            server: None,
            auth_token: None,
            adapter: None,
            async_delivery: false,
            app_id: None,
            api_key: None,
            pusher_api_scheme: None,
            pusher_api_host: None,
            pusher_api_port: None,
            pusher_ws_host: None,
            pusher_ws_port: None,
            pusher_wss_port: None,
            pusher_encrypted: None,
            views_root: PathBuf::from("app/views/sync"),
            timeout: 30,
        }
    }
}

impl SyncConfig {
    /// Encrypted websocket connections unless disabled.
    pub fn pusher_encrypted(&self) -> bool {
        self.pusher_encrypted.unwrap_or(true)
    }

    /// The auth token in effect: required with a broker, a dummy without.
    pub fn effective_auth_token(&self) -> Result<String> {
        match (self.adapter, &self.auth_token) {
            (None, _) => Ok(DUMMY_AUTH_TOKEN.to_string()),
            (Some(_), Some(token)) if !token.is_empty() => Ok(token.clone()),
            (Some(_), _) => Err(SyncError::MissingAuthToken),
        }
    }

    pub fn catalog(&self) -> PartialCatalog {
        PartialCatalog::new(&self.views_root)
    }

    pub fn delivery(&self, reactor: &Arc<Reactor>) -> Delivery {
        if self.async_delivery {
            Delivery::Asynchronous(Arc::clone(reactor))
        } else {
            Delivery::Synchronous
        }
    }

    /// `reqwest` transport honoring `timeout`.
    pub fn transport(&self) -> Result<ReqwestTransport> {
        if self.timeout == 0 {
            return Err(SyncError::InvalidConfig(
                "timeout must be at least one second".into(),
            ));
        }
        ReqwestTransport::with_timeout(Duration::from_secs(self.timeout))
    }

    /// Broker client selected by `adapter`.
    pub fn build_client(
        &self,
        transport: Arc<dyn HttpTransport>,
        reactor: &Arc<Reactor>,
    ) -> Result<Client> {
        let auth_token = self.effective_auth_token()?;
        let delivery = self.delivery(reactor);

        let client = match self.adapter {
            None => Client::Null(NullClient::new()),
            Some(Adapter::Faye) => {
                let server = self.server.clone().ok_or(SyncError::MissingSetting("server"))?;
                Client::Faye(FayeClient::new(server, auth_token, transport, delivery))
            }
            Some(Adapter::Pusher) => {
                let app_id = self.app_id.clone().ok_or(SyncError::MissingSetting("app_id"))?;
                let api_key = self.api_key.clone().ok_or(SyncError::MissingSetting("api_key"))?;
                let mut app = PusherApp::new(app_id, api_key, auth_token);
                if let Some(scheme) = &self.pusher_api_scheme {
                    app.scheme = scheme.clone();
                }
                if let Some(host) = &self.pusher_api_host {
                    app.host = host.clone();
                }
                app.port = self.pusher_api_port;
                Client::Pusher(PusherClient::new(app, transport, delivery))
            }
        };

        info!(
            client = client.name(),
            async_delivery = self.async_delivery,
            "configured sync client"
        );
        Ok(client)
    }

    /// Settings the browser needs to connect, without any secret.
    pub fn client_json(&self) -> Json {
        let mut json = Map::new();
        let mut put = |key: &str, value: Option<Json>| {
            if let Some(value) = value {
                json.insert(key.to_string(), value);
            }
        };
        put("server", self.server.clone().map(Json::from));
        put("api_key", self.api_key.clone().map(Json::from));
        put("pusher_ws_host", self.pusher_ws_host.clone().map(Json::from));
        put("pusher_ws_port", self.pusher_ws_port.map(Json::from));
        put("pusher_wss_port", self.pusher_wss_port.map(Json::from));
        put("pusher_encrypted", Some(Json::from(self.pusher_encrypted())));
        put("adapter", self.adapter.map(|a| Json::from(a.as_str())));
        Json::Object(json)
    }
}
