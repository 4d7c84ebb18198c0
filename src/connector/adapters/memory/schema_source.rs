//! In-memory schema source for tests and offline deployments.

use crate::connector::{
    domain::{ConnectorUrl, SchemaDocument},
    ports::{SchemaSource, SchemaSourceError, SchemaSourceResult},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Schema source that serves documents published ahead of time.
///
/// URLs with nothing published behave like unreachable hosts.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaSource {
    state: Arc<RwLock<StaticSourceState>>,
}

#[derive(Debug, Default)]
struct StaticSourceState {
    responses: HashMap<String, SchemaSourceResult<SchemaDocument>>,
    fetches: HashMap<String, usize>,
}

impl StaticSchemaSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `document` for `url`, replacing any earlier response.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn publish(&self, url: &str, document: SchemaDocument) -> SchemaSourceResult<()> {
        self.respond(url, Ok(document))
    }

    /// Answers `url` with an HTTP status failure.
    ///
    /// # Errors
    ///
    /// Returns a transport error when lock acquisition fails.
    pub fn fail_with_status(&self, url: &str, status: u16) -> SchemaSourceResult<()> {
        let failure = SchemaSourceError::HttpStatus {
            url: url.to_owned(),
            status,
        };
        self.respond(url, Err(failure))
    }

    /// Returns how many times `url` has been fetched.
    #[must_use]
    pub fn fetch_count(&self, url: &str) -> usize {
        self.state
            .read()
            .map(|state| {
                state
                    .fetches
                    .get(&normalized_key(url))
                    .copied()
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn respond(
        &self,
        url: &str,
        response: SchemaSourceResult<SchemaDocument>,
    ) -> SchemaSourceResult<()> {
        let key = normalized_key(url);
        let mut state = self.state.write().map_err(|err| lock_failure(url, &err))?;
        state.responses.insert(key, response);
        Ok(())
    }
}

#[async_trait]
impl SchemaSource for StaticSchemaSource {
    async fn fetch(&self, url: &ConnectorUrl) -> SchemaSourceResult<SchemaDocument> {
        let mut state = self
            .state
            .write()
            .map_err(|err| lock_failure(url.as_str(), &err))?;
        *state.fetches.entry(url.as_str().to_owned()).or_default() += 1;

        state.responses.get(url.as_str()).cloned().unwrap_or_else(|| {
            Err(SchemaSourceError::unreachable(
                url,
                std::io::Error::new(std::io::ErrorKind::NotFound, "nothing published"),
            ))
        })
    }
}

fn normalized_key(url: &str) -> String {
    ConnectorUrl::parse(url).map_or_else(|_| url.to_owned(), |parsed| parsed.as_str().to_owned())
}

fn lock_failure(url: &str, err: &impl ToString) -> SchemaSourceError {
    SchemaSourceError::Unreachable {
        url: url.to_owned(),
        source: Arc::new(std::io::Error::other(err.to_string())),
    }
}
