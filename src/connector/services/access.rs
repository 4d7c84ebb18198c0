//! Access control gateway: grants, revocations and per-user visibility.

use super::error::{ConnectorServiceError, ConnectorServiceResult, require_superuser};
use crate::connector::{
    domain::{AccessGrant, AccessGrantView, Connector, ConnectorId, SessionIdentity, UserId},
    ports::ConnectorStore,
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Single decision point for which connectors a caller may see.
///
/// Superusers see every live connector. Other users see exactly the
/// connectors they hold an active grant for, whatever the connector's mode.
#[derive(Clone)]
pub struct AccessControlGateway<S, C>
where
    S: ConnectorStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
}

impl<S, C> AccessControlGateway<S, C>
where
    S: ConnectorStore,
    C: Clock + Send + Sync,
{
    /// Creates a gateway over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self { store, clock }
    }

    async fn find_live_connector(&self, connector_id: ConnectorId) -> ConnectorServiceResult<()> {
        self.store
            .find_connector(connector_id)
            .await?
            .filter(Connector::is_active)
            .map(|_| ())
            .ok_or(ConnectorServiceError::ConnectorNotFound(connector_id))
    }

    /// Grants `user_id` visibility of `connector_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::Unauthorized`] for non-superusers,
    /// [`ConnectorServiceError::UserNotFound`] or
    /// [`ConnectorServiceError::ConnectorNotFound`] for unknown or inactive
    /// targets, and [`ConnectorServiceError::Conflict`] when the pair already
    /// has a grant.
    #[instrument(skip(self), fields(granter = %caller.user_id))]
    pub async fn grant(
        &self,
        caller: SessionIdentity,
        user_id: UserId,
        connector_id: ConnectorId,
    ) -> ConnectorServiceResult<AccessGrant> {
        require_superuser(caller, "grant connector access")?;

        let grantee_enabled = self
            .store
            .find_user(user_id)
            .await?
            .is_some_and(|user| user.is_active);
        if !grantee_enabled {
            return Err(ConnectorServiceError::UserNotFound(user_id));
        }
        self.find_live_connector(connector_id).await?;

        let grant = AccessGrant::new(user_id, connector_id, caller.user_id, &*self.clock);
        self.store.insert_grant(&grant).await?;
        info!(grant_id = %grant.id, "connector access granted");
        Ok(grant)
    }

    /// Removes the grant for `user_id` on `connector_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::Unauthorized`] for non-superusers and
    /// [`ConnectorServiceError::GrantNotFound`] when no grant exists.
    #[instrument(skip(self), fields(revoker = %caller.user_id))]
    pub async fn revoke(
        &self,
        caller: SessionIdentity,
        user_id: UserId,
        connector_id: ConnectorId,
    ) -> ConnectorServiceResult<AccessGrant> {
        require_superuser(caller, "revoke connector access")?;
        let removed = self.store.delete_grant(user_id, connector_id).await?;
        info!(grant_id = %removed.id, "connector access revoked");
        Ok(removed)
    }

    /// Lists every grant on a connector with grantee and granter emails.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::Unauthorized`] for non-superusers and
    /// [`ConnectorServiceError::ConnectorNotFound`] for unknown or retired
    /// connectors.
    pub async fn list_access(
        &self,
        caller: SessionIdentity,
        connector_id: ConnectorId,
    ) -> ConnectorServiceResult<Vec<AccessGrantView>> {
        require_superuser(caller, "list connector access")?;
        self.find_live_connector(connector_id).await?;
        Ok(self.store.list_grants(connector_id).await?)
    }

    /// Keeps only the connectors `caller` may see.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::Transaction`] when grants cannot be
    /// read.
    pub async fn filter_visible(
        &self,
        caller: SessionIdentity,
        connectors: Vec<Connector>,
    ) -> ConnectorServiceResult<Vec<Connector>> {
        if caller.is_superuser {
            return Ok(connectors);
        }
        let granted = self.store.granted_connector_ids(caller.user_id).await?;
        let visible: Vec<Connector> = connectors
            .into_iter()
            .filter(|connector| granted.contains(&connector.id()))
            .collect();
        debug!(user_id = %caller.user_id, visible = visible.len(), "filtered connectors");
        Ok(visible)
    }

    /// Fails unless `caller` may see `connector`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::ConnectorNotFound`] when the
    /// connector is hidden from the caller.
    pub async fn ensure_visible(
        &self,
        caller: SessionIdentity,
        connector: &Connector,
    ) -> ConnectorServiceResult<()> {
        if caller.is_superuser {
            return Ok(());
        }
        let granted = self.store.granted_connector_ids(caller.user_id).await?;
        if granted.contains(&connector.id()) {
            Ok(())
        } else {
            Err(ConnectorServiceError::ConnectorNotFound(connector.id()))
        }
    }
}
