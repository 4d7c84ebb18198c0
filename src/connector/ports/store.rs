//! Entity store port for connectors and every entity that depends on them.

use crate::connector::domain::{
    AccessGrant, AccessGrantView, CascadePolicy, CascadeReport, Connector, ConnectorId,
    ConnectorMode, ConnectorName, Email, ServerBundle, ServerId, ServerName, UserAccount, UserId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

/// Result type for entity store operations.
pub type ConnectorStoreResult<T> = Result<T, ConnectorStoreError>;

/// Persistence contract for connectors, servers, access grants and users.
///
/// Every method that touches more than one row is a single atomic unit of
/// work: implementations either apply all of its writes or none.
#[async_trait]
pub trait ConnectorStore: Send + Sync {
    /// Stores a newly registered connector.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorStoreError::DuplicateName`] when a live connector
    /// holds the name or [`ConnectorStoreError::DuplicateSecret`] when a live
    /// connector holds the same secret fingerprint.
    async fn insert_connector(&self, connector: &Connector) -> ConnectorStoreResult<()>;

    /// Finds a connector by identifier, including soft-disabled ones.
    async fn find_connector(
        &self,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<Option<Connector>>;

    /// Finds the live connector holding `name`.
    async fn find_connector_by_name(
        &self,
        name: &ConnectorName,
    ) -> ConnectorStoreResult<Option<Connector>>;

    /// Returns every connector, including soft-disabled ones.
    async fn list_connectors(&self) -> ConnectorStoreResult<Vec<Connector>>;

    /// Persists a mode transition if the stored mode still equals
    /// `expected_mode`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorStoreError::ModeConflict`] when another writer
    /// changed the mode first, or [`ConnectorStoreError::ConnectorNotFound`]
    /// when the connector no longer exists or was soft-disabled.
    async fn transition_connector(
        &self,
        connector: &Connector,
        expected_mode: ConnectorMode,
    ) -> ConnectorStoreResult<()>;

    /// Applies `policy` to the connector and all of its dependents in one
    /// transaction and reports the affected counts. Soft-disabled rows take
    /// `at` as their update time.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorStoreError::ConnectorNotFound`] when the connector
    /// does not exist or is already soft-disabled.
    async fn cascade_connector(
        &self,
        connector_id: ConnectorId,
        policy: CascadePolicy,
        at: DateTime<Utc>,
    ) -> ConnectorStoreResult<CascadeReport>;

    /// Stores a server with its tokens and tools, re-checking inside the
    /// transaction that the owning connector is still active.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorStoreError::ConnectorNotActive`] when the owning
    /// connector left `active` mode, or
    /// [`ConnectorStoreError::DuplicateServerName`] when the connector
    /// already has a server with that name.
    async fn insert_server(&self, bundle: &ServerBundle) -> ConnectorStoreResult<()>;

    /// Finds a server and its dependents by server identifier.
    async fn find_server(&self, server_id: ServerId) -> ConnectorStoreResult<Option<ServerBundle>>;

    /// Returns every server of a connector with its dependents, including
    /// soft-disabled rows.
    async fn list_servers(
        &self,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<Vec<ServerBundle>>;

    /// Stores an access grant.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorStoreError::DuplicateGrant`] when the pair already
    /// has a grant.
    async fn insert_grant(&self, grant: &AccessGrant) -> ConnectorStoreResult<()>;

    /// Removes the grant for a (user, connector) pair and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorStoreError::GrantNotFound`] when no active grant
    /// exists.
    async fn delete_grant(
        &self,
        user_id: UserId,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<AccessGrant>;

    /// Returns every grant of a connector with grantee and granter emails,
    /// including soft-disabled grants.
    async fn list_grants(
        &self,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<Vec<AccessGrantView>>;

    /// Returns the connectors a user holds an active grant for.
    async fn granted_connector_ids(
        &self,
        user_id: UserId,
    ) -> ConnectorStoreResult<HashSet<ConnectorId>>;

    /// Stores a user account.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorStoreError::DuplicateEmail`] when the email is
    /// taken.
    async fn insert_user(&self, user: &UserAccount) -> ConnectorStoreResult<()>;

    /// Finds a user account by identifier.
    async fn find_user(&self, user_id: UserId) -> ConnectorStoreResult<Option<UserAccount>>;

    /// Removes a user together with every grant they received or issued, and
    /// returns the number of grants removed.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorStoreError::UserNotFound`] when no such user exists.
    async fn delete_user(&self, user_id: UserId) -> ConnectorStoreResult<usize>;
}

/// Errors returned by entity store implementations.
#[derive(Debug, Clone, Error)]
pub enum ConnectorStoreError {
    /// A connector with the same name already exists.
    #[error("duplicate connector name: {0}")]
    DuplicateName(ConnectorName),

    /// A connector with the same secret fingerprint already exists.
    #[error("a connector with the same secret is already registered")]
    DuplicateSecret,

    /// The (user, connector) pair already has a grant.
    #[error("user {user_id} already has access to connector {connector_id}")]
    DuplicateGrant {
        /// Grantee.
        user_id: UserId,
        /// Connector.
        connector_id: ConnectorId,
    },

    /// A user with the same email already exists.
    #[error("duplicate user email: {0}")]
    DuplicateEmail(Email),

    /// The connector already has a server with this name.
    #[error("connector {connector_id} already has a server named '{name}'")]
    DuplicateServerName {
        /// Owning connector.
        connector_id: ConnectorId,
        /// Conflicting server name.
        name: ServerName,
    },

    /// The connector was not found.
    #[error("connector not found: {0}")]
    ConnectorNotFound(ConnectorId),

    /// The user was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// No grant exists for the (user, connector) pair.
    #[error("no access grant for user {user_id} on connector {connector_id}")]
    GrantNotFound {
        /// Grantee.
        user_id: UserId,
        /// Connector.
        connector_id: ConnectorId,
    },

    /// The stored mode differed from the expected mode.
    #[error("connector {connector_id} is no longer in mode {expected}")]
    ModeConflict {
        /// Connector identifier.
        connector_id: ConnectorId,
        /// Mode the writer expected.
        expected: ConnectorMode,
    },

    /// The connector is not in `active` mode.
    #[error("connector {connector_id} is not active (current mode: {mode})")]
    ConnectorNotActive {
        /// Connector identifier.
        connector_id: ConnectorId,
        /// Stored mode.
        mode: ConnectorMode,
    },

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted connector data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure; the transaction was rolled back.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ConnectorStoreError {
    /// Wraps persisted-data decoding or validation failures.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence-layer failure.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
