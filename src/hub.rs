//! Composition root wiring stores, schema sources and services.

use crate::{
    config::{ConfigError, HubConfig},
    connector::{
        adapters::{
            http::HttpSchemaSource,
            postgres::{PostgresConnectorStore, pool_from_url},
        },
        ports::{ConnectorStore, ConnectorStoreError, SchemaSource},
        services::{AccessControlGateway, ConnectorLifecycleService, ServerProvisioningService},
    },
};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Errors raised while assembling a hub.
#[derive(Debug, Error)]
pub enum HubError {
    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// `database.url` is required for the `PostgreSQL` store.
    #[error("database.url is not configured")]
    MissingDatabaseUrl,

    /// The connection pool could not be built.
    #[error(transparent)]
    Store(#[from] ConnectorStoreError),

    /// The HTTP client could not be built.
    #[error("failed to build schema client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Hub backed by `PostgreSQL` and HTTP schema fetching.
pub type PostgresHub = ConnectorHub<PostgresConnectorStore, HttpSchemaSource, DefaultClock>;

/// The services of one connector hub sharing a store and clock.
#[derive(Clone)]
pub struct ConnectorHub<S, F, C>
where
    S: ConnectorStore,
    F: SchemaSource,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    lifecycle: ConnectorLifecycleService<S, F, C>,
    provisioning: ServerProvisioningService<S, C>,
    access: AccessControlGateway<S, C>,
}

impl<S, F, C> ConnectorHub<S, F, C>
where
    S: ConnectorStore,
    F: SchemaSource,
    C: Clock + Send + Sync,
{
    /// Builds the services from already constructed adapters.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Config`] when the token settings are out of range.
    pub fn from_parts(
        store: Arc<S>,
        source: Arc<F>,
        clock: Arc<C>,
        config: &HubConfig,
    ) -> Result<Self, HubError> {
        let token_settings = config.token_settings()?;
        Ok(Self {
            lifecycle: ConnectorLifecycleService::new(
                Arc::clone(&store),
                source,
                Arc::clone(&clock),
                config.cascade.policy,
            ),
            provisioning: ServerProvisioningService::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                token_settings,
            ),
            access: AccessControlGateway::new(Arc::clone(&store), clock),
            store,
        })
    }

    /// Connector lifecycle operations.
    #[must_use]
    pub const fn lifecycle(&self) -> &ConnectorLifecycleService<S, F, C> {
        &self.lifecycle
    }

    /// Server provisioning operations.
    #[must_use]
    pub const fn provisioning(&self) -> &ServerProvisioningService<S, C> {
        &self.provisioning
    }

    /// Access grant operations.
    #[must_use]
    pub const fn access(&self) -> &AccessControlGateway<S, C> {
        &self.access
    }

    /// The shared store, for the user-management collaborator.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl PostgresHub {
    /// Connects to `PostgreSQL` and builds an HTTP schema client from
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::MissingDatabaseUrl`] when no URL is configured and
    /// propagates pool, client and configuration failures.
    pub fn connect(config: &HubConfig) -> Result<Self, HubError> {
        config.validate()?;
        let url = config
            .database
            .url
            .as_deref()
            .ok_or(HubError::MissingDatabaseUrl)?;
        let pool = pool_from_url(url, config.database.max_connections)?;
        let source = HttpSchemaSource::new(config.activation.request_timeout)?;
        info!(
            max_connections = config.database.max_connections,
            cascade_policy = %config.cascade.policy,
            "connector hub connected"
        );
        Self::from_parts(
            Arc::new(PostgresConnectorStore::new(pool)),
            Arc::new(source),
            Arc::new(DefaultClock),
            config,
        )
    }
}
