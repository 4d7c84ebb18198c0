//! HTTP adapter that fetches connector schema documents with `reqwest`.

use crate::connector::{
    domain::{ConnectorUrl, SchemaDocument},
    ports::{SchemaSource, SchemaSourceError, SchemaSourceResult},
};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tracing::debug;

/// Default per-request timeout for schema fetches.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches schema documents over HTTP(S) with a bounded timeout.
///
/// Each call issues a single `GET`; non-2xx responses and undecodable bodies
/// are reported without retrying.
#[derive(Debug, Clone)]
pub struct HttpSchemaSource {
    client: Client,
}

impl HttpSchemaSource {
    /// Builds a source whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest` error when the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("connector-hub/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an already configured client.
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SchemaSource for HttpSchemaSource {
    async fn fetch(&self, url: &ConnectorUrl) -> SchemaSourceResult<SchemaDocument> {
        debug!(url = url.as_str(), "fetching connector schema");
        let response = self
            .client
            .get(url.as_url().clone())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| SchemaSourceError::unreachable(url, err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SchemaSourceError::HttpStatus {
                url: url.as_str().to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| SchemaSourceError::unreachable(url, err))?;
        serde_json::from_slice(&body)
            .map_err(|err| SchemaSourceError::invalid_schema(url, err.to_string()))
    }
}
