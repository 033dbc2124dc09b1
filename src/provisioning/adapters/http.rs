//! `reqwest` transport for identity provider calls.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::{ConfigError, ConfigService, keys};
use crate::provisioning::ports::{
    ProviderRequest, ProviderResponse, ProviderTransport, TransportError,
};

const DEFAULT_TIMEOUT_SECS: u32 = 30;

/// Default provider call timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-over-HTTP transport with a per-request timeout.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport with its own client.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), timeout)
    }

    /// Creates a transport whose timeout is `provider_timeout_secs`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] when configuration cannot be read.
    pub async fn from_config(config: &ConfigService) -> Result<Self, ConfigError> {
        let secs = config
            .get_u32(keys::PROVIDER_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS)
            .await?;
        Ok(Self::new(Duration::from_secs(u64::from(secs))))
    }

    /// Creates a transport over an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

fn map_error(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_owned(),
        }
    } else {
        TransportError::request(url, err)
    }
}

#[async_trait]
impl ProviderTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(url = %request.url))]
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, TransportError> {
        let ProviderRequest { url, headers, body } = request;
        let mut builder = self.client.post(&url).timeout(self.timeout).json(&body);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|err| map_error(&url, err))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|err| map_error(&url, err))?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        debug!(status, "provider responded");
        Ok(ProviderResponse { status, body })
    }
}
