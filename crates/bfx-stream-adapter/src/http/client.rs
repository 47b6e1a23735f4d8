/*
[INPUT]:  HTTP configuration (base URL, timeouts), payload transformer
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{BfxError, Result};
use crate::transform::{FieldMapTransformer, SharedTransformer};

/// Base URL for the public REST API
pub const REST_BASE_URL: &str = "https://api.bitfinex.com/";

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// REST client whose responses go through the same transformer as stream
/// payloads.
pub struct BfxRestClient {
    http_client: Client,
    base_url: Url,
    pub(crate) transformer: SharedTransformer,
}

impl BfxRestClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Self::with_config_and_base_url(config, REST_BASE_URL)
    }

    /// Create a client against a custom base URL (tests, proxies)
    pub fn with_config_and_base_url(config: ClientConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http_client,
            base_url,
            transformer: Arc::new(FieldMapTransformer),
        })
    }

    pub fn with_transformer(mut self, transformer: SharedTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build full URL for an endpoint relative to the base URL
    fn url(&self, endpoint: &str) -> Result<Url> {
        Ok(self.base_url.join(endpoint.trim_start_matches('/'))?)
    }

    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Send a request and decode the JSON body. Non-success statuses become
    /// [`BfxError::Api`].
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "rest response");

        if !status.is_success() {
            return Err(BfxError::api_error(status, body));
        }

        Ok(serde_json::from_str(&body)?)
    }
}

impl std::fmt::Debug for BfxRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BfxRestClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
