//! Connector lifecycle manager: registration, activation and mode changes.

use super::{
    access::AccessControlGateway,
    cascade::CascadeCoordinator,
    error::{ConnectorServiceError, ConnectorServiceResult, require_superuser},
};
use crate::connector::{
    domain::{
        Activation, CascadePolicy, CascadeReport, Connector, ConnectorId, ConnectorName,
        ConnectorSecret, ConnectorUrl, PendingMode, SecretInput, SessionIdentity, SettableMode,
    },
    ports::{ConnectorStore, SchemaSource},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Request payload for registering a connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterConnectorRequest {
    /// Unique connector name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Mode the connector starts in.
    pub initial_mode: PendingMode,
    /// How the connector secret is obtained.
    pub secret: SecretInput,
}

impl RegisterConnectorRequest {
    /// Creates a request with an empty description, `deactive` entry mode
    /// and no secret.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            initial_mode: PendingMode::default(),
            secret: SecretInput::None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the entry mode.
    #[must_use]
    pub const fn with_initial_mode(mut self, initial_mode: PendingMode) -> Self {
        self.initial_mode = initial_mode;
        self
    }

    /// Sets the secret input.
    #[must_use]
    pub fn with_secret(mut self, secret: SecretInput) -> Self {
        self.secret = secret;
        self
    }
}

/// A freshly registered connector and its plaintext secret.
///
/// The secret is only ever available here; the store keeps its fingerprint.
#[derive(Debug, Clone)]
pub struct RegisteredConnector {
    /// Stored connector.
    pub connector: Connector,
    /// Plaintext secret, when one was requested.
    pub secret: Option<ConnectorSecret>,
}

/// Summary of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationOutcome {
    /// Connector in `active` mode.
    pub connector: Connector,
    /// Number of tools published by the schema.
    pub tool_count: usize,
    /// Number of templates published by the schema.
    pub template_count: usize,
}

/// Owns the connector mode state machine and the register/activate
/// protocol.
#[derive(Clone)]
pub struct ConnectorLifecycleService<S, F, C>
where
    S: ConnectorStore,
    F: SchemaSource,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    source: Arc<F>,
    clock: Arc<C>,
    gateway: AccessControlGateway<S, C>,
    cascade: CascadeCoordinator<S, C>,
}

impl<S, F, C> ConnectorLifecycleService<S, F, C>
where
    S: ConnectorStore,
    F: SchemaSource,
    C: Clock + Send + Sync,
{
    /// Creates a lifecycle service whose deletions apply `cascade_policy`.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        source: Arc<F>,
        clock: Arc<C>,
        cascade_policy: CascadePolicy,
    ) -> Self {
        Self {
            gateway: AccessControlGateway::new(Arc::clone(&store), Arc::clone(&clock)),
            cascade: CascadeCoordinator::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                cascade_policy,
            ),
            store,
            source,
            clock,
        }
    }

    async fn find_live_connector(
        &self,
        connector_id: ConnectorId,
    ) -> ConnectorServiceResult<Connector> {
        self.store
            .find_connector(connector_id)
            .await?
            .filter(Connector::is_active)
            .ok_or(ConnectorServiceError::ConnectorNotFound(connector_id))
    }

    /// Registers a connector in a not-yet-usable mode.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::Unauthorized`] for non-superusers,
    /// [`ConnectorServiceError::Validation`] for malformed input and
    /// [`ConnectorServiceError::Conflict`] when the name or secret is taken.
    #[instrument(skip(self, request), fields(name = %request.name, caller = %caller.user_id))]
    pub async fn register(
        &self,
        caller: SessionIdentity,
        request: RegisterConnectorRequest,
    ) -> ConnectorServiceResult<RegisteredConnector> {
        require_superuser(caller, "register connectors")?;

        let name = ConnectorName::new(request.name)?;
        let secret = request.secret.resolve()?;
        let fingerprint = secret.as_ref().map(ConnectorSecret::fingerprint);
        let connector = Connector::register(
            name,
            request.description,
            request.initial_mode,
            fingerprint,
            &*self.clock,
        )?;

        self.store.insert_connector(&connector).await?;
        info!(connector_id = %connector.id(), mode = %connector.mode(), "connector registered");
        Ok(RegisteredConnector { connector, secret })
    }

    /// Fetches the schema at `connector_url` and promotes the connector to
    /// `active`.
    ///
    /// The fetch happens outside any transaction. The mode flip is a
    /// compare-and-set on the mode observed before the fetch, so exactly one
    /// of several concurrent activations commits.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::ConnectorNotFound`] for unknown
    /// connectors, [`ConnectorServiceError::InvalidState`] when the connector
    /// is already active (checked before fetching),
    /// [`ConnectorServiceError::SchemaUnavailable`] or
    /// [`ConnectorServiceError::InvalidSchema`] when the document cannot be
    /// used, and [`ConnectorServiceError::ConcurrentModification`] when
    /// another writer won the race.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn activate(
        &self,
        caller: SessionIdentity,
        connector_id: ConnectorId,
        connector_url: &str,
    ) -> ConnectorServiceResult<ActivationOutcome> {
        require_superuser(caller, "activate connectors")?;

        let mut connector = self.find_live_connector(connector_id).await?;
        connector.ensure_can_activate()?;
        let observed_mode = connector.mode();
        let url = ConnectorUrl::parse(connector_url)?;

        let document = self.source.fetch(&url).await.inspect_err(|err| {
            warn!(%connector_id, error = %err, "connector schema fetch failed");
        })?;
        let activation = Activation::from_document(&url, document, self.clock.utc())
            .inspect_err(|err| warn!(%connector_id, error = %err, "connector schema rejected"))?;

        connector.activate(activation, &*self.clock)?;
        self.store
            .transition_connector(&connector, observed_mode)
            .await?;

        let tool_count = connector.tools().len();
        let template_count = connector.templates().len();
        info!(%connector_id, tool_count, template_count, "connector activated");
        Ok(ActivationOutcome {
            connector,
            tool_count,
            template_count,
        })
    }

    /// Toggles a connector between `active` and `deactive`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::ConnectorNotFound`] for unknown
    /// connectors, [`ConnectorServiceError::InvalidState`] for illegal
    /// transitions and [`ConnectorServiceError::ConcurrentModification`]
    /// when another writer changed the mode first.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn set_mode(
        &self,
        caller: SessionIdentity,
        connector_id: ConnectorId,
        target: SettableMode,
    ) -> ConnectorServiceResult<Connector> {
        require_superuser(caller, "change connector mode")?;

        let mut connector = self.find_live_connector(connector_id).await?;
        let observed_mode = connector.mode();
        connector.set_mode(target, &*self.clock)?;
        self.store
            .transition_connector(&connector, observed_mode)
            .await?;

        info!(%connector_id, from = %observed_mode, to = %target, "connector mode changed");
        Ok(connector)
    }

    /// Deletes a connector with every dependent row, using the configured
    /// cascade policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::Unauthorized`] for non-superusers,
    /// [`ConnectorServiceError::ConnectorNotFound`] for unknown connectors and
    /// [`ConnectorServiceError::Transaction`] when the cascade rolled back.
    #[instrument(skip(self), fields(caller = %caller.user_id))]
    pub async fn delete(
        &self,
        caller: SessionIdentity,
        connector_id: ConnectorId,
    ) -> ConnectorServiceResult<CascadeReport> {
        require_superuser(caller, "delete connectors")?;
        self.cascade.cascade(connector_id).await
    }

    /// Returns a connector visible to `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::ConnectorNotFound`] when the
    /// connector does not exist, was retired or is hidden from the caller.
    pub async fn get(
        &self,
        caller: SessionIdentity,
        connector_id: ConnectorId,
    ) -> ConnectorServiceResult<Connector> {
        let connector = self.find_live_connector(connector_id).await?;
        self.gateway.ensure_visible(caller, &connector).await?;
        Ok(connector)
    }

    /// Lists the live connectors visible to `caller`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::Transaction`] on store failures.
    pub async fn list(&self, caller: SessionIdentity) -> ConnectorServiceResult<Vec<Connector>> {
        let live: Vec<Connector> = self
            .store
            .list_connectors()
            .await?
            .into_iter()
            .filter(Connector::is_active)
            .collect();
        self.gateway.filter_visible(caller, live).await
    }

    /// Returns the cascade policy used by [`Self::delete`].
    #[must_use]
    pub const fn cascade_policy(&self) -> CascadePolicy {
        self.cascade.policy()
    }
}
