//! Server provisioning from active connectors.

use super::{
    access::AccessControlGateway,
    error::{ConnectorServiceError, ConnectorServiceResult},
};
use crate::connector::{
    domain::{
        Connector, ConnectorId, ServerBundle, ServerId, ServerName, SessionIdentity,
        TokenSettings,
    },
    ports::ConnectorStore,
};
use chrono::Duration;
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

/// Request payload for creating a server.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateServerRequest {
    /// Connector the server instantiates.
    pub connector_id: ConnectorId,
    /// Server name, unique per connector.
    pub name: String,
    /// Server configuration document.
    pub configuration: Value,
    /// Token lifetime overriding the configured default.
    pub token_ttl: Option<Duration>,
}

impl CreateServerRequest {
    /// Creates a request using the default token lifetime.
    #[must_use]
    pub fn new(connector_id: ConnectorId, name: impl Into<String>, configuration: Value) -> Self {
        Self {
            connector_id,
            name: name.into(),
            configuration,
            token_ttl: None,
        }
    }

    /// Overrides the lifetime of the initial token.
    #[must_use]
    pub const fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = Some(ttl);
        self
    }
}

/// Creates servers from active connectors and lists them per connector.
#[derive(Clone)]
pub struct ServerProvisioningService<S, C>
where
    S: ConnectorStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    gateway: AccessControlGateway<S, C>,
    token_settings: TokenSettings,
}

impl<S, C> ServerProvisioningService<S, C>
where
    S: ConnectorStore,
    C: Clock + Send + Sync,
{
    /// Creates a provisioning service issuing tokens per `token_settings`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>, token_settings: TokenSettings) -> Self {
        Self {
            gateway: AccessControlGateway::new(Arc::clone(&store), Arc::clone(&clock)),
            store,
            clock,
            token_settings,
        }
    }

    async fn find_visible_connector(
        &self,
        caller: SessionIdentity,
        connector_id: ConnectorId,
    ) -> ConnectorServiceResult<Connector> {
        let connector = self
            .store
            .find_connector(connector_id)
            .await?
            .filter(Connector::is_active)
            .ok_or(ConnectorServiceError::ConnectorNotFound(connector_id))?;
        self.gateway.ensure_visible(caller, &connector).await?;
        Ok(connector)
    }

    /// Creates a server with one token and a copy of every connector tool.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::ConnectorNotFound`] when the
    /// connector is hidden or missing, [`ConnectorServiceError::InvalidState`]
    /// unless it is `active`, [`ConnectorServiceError::Validation`] for a bad
    /// name, configuration or token lifetime and [`ConnectorServiceError::Conflict`] when the
    /// name is taken.
    #[instrument(
        skip(self, request),
        fields(caller = %caller.user_id, connector_id = %request.connector_id)
    )]
    pub async fn create_server(
        &self,
        caller: SessionIdentity,
        request: CreateServerRequest,
    ) -> ConnectorServiceResult<ServerBundle> {
        let connector = self
            .find_visible_connector(caller, request.connector_id)
            .await?;
        let name = ServerName::new(request.name)?;
        let settings = TokenSettings {
            ttl: request.token_ttl.or(self.token_settings.ttl),
            ..self.token_settings
        };

        let bundle = ServerBundle::provision(
            &connector,
            name,
            request.configuration,
            settings,
            &*self.clock,
        )?;
        self.store.insert_server(&bundle).await?;
        info!(
            server_id = %bundle.server.id(),
            tools = bundle.tools.len(),
            "server provisioned"
        );
        Ok(bundle)
    }

    /// Lists the servers of a connector visible to `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::ConnectorNotFound`] when the
    /// connector is hidden or missing.
    pub async fn list_servers(
        &self,
        caller: SessionIdentity,
        connector_id: ConnectorId,
    ) -> ConnectorServiceResult<Vec<ServerBundle>> {
        self.find_visible_connector(caller, connector_id).await?;
        Ok(self.store.list_servers(connector_id).await?)
    }

    /// Returns one server if its connector is visible to `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::ServerNotFound`] for unknown servers
    /// and [`ConnectorServiceError::ConnectorNotFound`] when the owning
    /// connector is hidden or retired.
    pub async fn get_server(
        &self,
        caller: SessionIdentity,
        server_id: ServerId,
    ) -> ConnectorServiceResult<ServerBundle> {
        let bundle = self
            .store
            .find_server(server_id)
            .await?
            .ok_or(ConnectorServiceError::ServerNotFound(server_id))?;
        self.find_visible_connector(caller, bundle.server.connector_id())
            .await?;
        Ok(bundle)
    }
}
