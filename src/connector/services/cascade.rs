//! Cascade coordinator for connector deletion.

use super::error::{ConnectorServiceError, ConnectorServiceResult};
use crate::connector::{
    domain::{CascadePolicy, CascadeReport, ConnectorId},
    ports::{ConnectorStore, ConnectorStoreError},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::{info, warn};

/// Applies the configured [`CascadePolicy`] to a connector and every row
/// that depends on it, as one unit of work.
#[derive(Clone)]
pub struct CascadeCoordinator<S, C>
where
    S: ConnectorStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    policy: CascadePolicy,
}

impl<S, C> CascadeCoordinator<S, C>
where
    S: ConnectorStore,
    C: Clock + Send + Sync,
{
    /// Creates a coordinator applying `policy` and stamping retired rows with
    /// `clock`.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>, policy: CascadePolicy) -> Self {
        Self {
            store,
            clock,
            policy,
        }
    }

    /// Returns the policy this coordinator applies.
    #[must_use]
    pub const fn policy(&self) -> CascadePolicy {
        self.policy
    }

    /// Deletes or disables the connector subtree rooted at `connector_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorServiceError::ConnectorNotFound`] for unknown or
    /// already retired connectors and [`ConnectorServiceError::Transaction`]
    /// for any other store failure; nothing is changed in either case.
    pub async fn cascade(&self, connector_id: ConnectorId) -> ConnectorServiceResult<CascadeReport> {
        let retired_at = self.clock.utc();
        match self
            .store
            .cascade_connector(connector_id, self.policy, retired_at)
            .await
        {
            Ok(report) => {
                info!(
                    %connector_id,
                    policy = %report.policy,
                    servers = report.servers,
                    tokens = report.tokens,
                    tools = report.tools,
                    access_grants = report.access_grants,
                    "connector cascade applied"
                );
                Ok(report)
            }
            Err(ConnectorStoreError::ConnectorNotFound(missing)) => {
                Err(ConnectorServiceError::ConnectorNotFound(missing))
            }
            Err(err) => {
                warn!(%connector_id, error = %err, "connector cascade rolled back");
                Err(ConnectorServiceError::Transaction(err))
            }
        }
    }
}
