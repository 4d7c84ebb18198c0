//! Outbound port for fetching connector schema documents.

use crate::connector::domain::{ConnectorUrl, SchemaDocument};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for schema fetches.
pub type SchemaSourceResult<T> = Result<T, SchemaSourceError>;

/// Fetches the schema document a connector serves at its URL.
///
/// Implementations perform exactly one attempt; retry policy belongs to the
/// caller.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Fetches and decodes the schema document at `url`.
    async fn fetch(&self, url: &ConnectorUrl) -> SchemaSourceResult<SchemaDocument>;
}

/// Errors returned by schema source adapters.
#[derive(Debug, Clone, Error)]
pub enum SchemaSourceError {
    /// The URL could not be reached.
    #[error("connector schema at {url} is unreachable: {source}")]
    Unreachable {
        /// Requested URL.
        url: String,
        /// Transport failure.
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The URL answered with a non-2xx status.
    #[error("connector schema at {url} returned HTTP {status}")]
    HttpStatus {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The response body is not a valid schema document.
    #[error("connector schema at {url} is invalid: {reason}")]
    InvalidSchema {
        /// Requested URL.
        url: String,
        /// Decoding failure.
        reason: String,
    },
}

impl SchemaSourceError {
    /// Wraps a transport failure for `url`.
    pub fn unreachable(
        url: &ConnectorUrl,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unreachable {
            url: url.as_str().to_owned(),
            source: Arc::new(err),
        }
    }

    /// Describes an undecodable schema document served at `url`.
    pub fn invalid_schema(url: &ConnectorUrl, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            url: url.as_str().to_owned(),
            reason: reason.into(),
        }
    }
}
