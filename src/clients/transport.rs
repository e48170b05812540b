//! Outbound HTTP to the broker.

use crate::error::{Result, SyncError};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::trace;

/// Default timeout of broker requests.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection to a broker's HTTP endpoint.
///
/// Every call is one network request; a non-success status is an error.
pub trait HttpTransport: Send + Sync {
    /// POST an url-encoded form.
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<()>;

    /// POST `body` as `application/json`, sent byte for byte.
    fn post_json(&self, url: &str, body: &str) -> Result<()>;
}

/// Blocking `reqwest` transport.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<()> {
        let response = self.client.post(url).form(form).send()?;
        trace!(url, status = %response.status(), "posted form");
        check_status(response)
    }

    fn post_json(&self, url: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_string())
            .send()?;
        trace!(url, status = %response.status(), "posted json");
        check_status(response)
    }
}

fn check_status(response: reqwest::blocking::Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(SyncError::Network(format!(
            "{} responded with {}",
            response.url(),
            status
        )))
    }
}
