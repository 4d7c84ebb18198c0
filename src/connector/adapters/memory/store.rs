//! In-memory entity store for connectors and their dependents.

use crate::connector::{
    domain::{
        AccessGrant, AccessGrantId, AccessGrantView, CascadePolicy, CascadeReport, Connector,
        ConnectorId, ConnectorMode, ConnectorName, ServerBundle, ServerId, ServerToken,
        ServerTokenId, ServerTool, ServerToolId, UserAccount, UserId,
    },
    domain::Server,
    ports::{ConnectorStore, ConnectorStoreError, ConnectorStoreResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe in-memory entity store.
///
/// All tables live behind one lock, so every multi-row operation runs as a
/// single critical section and readers never observe partial writes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnectorStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    connectors: HashMap<ConnectorId, Connector>,
    servers: HashMap<ServerId, Server>,
    tokens: HashMap<ServerTokenId, ServerToken>,
    tools: HashMap<ServerToolId, ServerTool>,
    grants: HashMap<AccessGrantId, AccessGrant>,
    users: HashMap<UserId, UserAccount>,
}

impl InMemoryConnectorStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ConnectorStoreResult<RwLockReadGuard<'_, InMemoryStoreState>> {
        self.state.read().map_err(|err| {
            ConnectorStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> ConnectorStoreResult<RwLockWriteGuard<'_, InMemoryStoreState>> {
        self.state.write().map_err(|err| {
            ConnectorStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

impl InMemoryStoreState {
    fn bundle(&self, server: &Server) -> ServerBundle {
        let server_id = server.id();
        ServerBundle {
            server: server.clone(),
            tokens: self
                .tokens
                .values()
                .filter(|token| token.server_id == server_id)
                .cloned()
                .collect(),
            tools: self
                .tools
                .values()
                .filter(|tool| tool.server_id == server_id)
                .cloned()
                .collect(),
        }
    }

    fn grant_view(&self, grant: &AccessGrant) -> ConnectorStoreResult<AccessGrantView> {
        let email_of = |user_id: UserId| {
            self.users
                .get(&user_id)
                .map(|user| user.email.clone())
                .ok_or(ConnectorStoreError::UserNotFound(user_id))
        };
        Ok(AccessGrantView {
            grant: grant.clone(),
            grantee_email: email_of(grant.user_id)?,
            granter_email: email_of(grant.granted_by)?,
        })
    }

    fn hard_delete(&mut self, connector_id: ConnectorId, report: &mut CascadeReport) {
        let server_ids: HashSet<ServerId> = self
            .servers
            .values()
            .filter(|server| server.connector_id() == connector_id)
            .map(Server::id)
            .collect();

        let tokens_before = self.tokens.len();
        self.tokens
            .retain(|_, token| !server_ids.contains(&token.server_id));
        report.tokens = tokens_before - self.tokens.len();

        let tools_before = self.tools.len();
        self.tools.retain(|_, tool| !server_ids.contains(&tool.server_id));
        report.tools = tools_before - self.tools.len();

        self.servers.retain(|id, _| !server_ids.contains(id));
        report.servers = server_ids.len();

        let grants_before = self.grants.len();
        self.grants
            .retain(|_, grant| grant.connector_id != connector_id);
        report.access_grants = grants_before - self.grants.len();

        self.connectors.remove(&connector_id);
    }

    fn soft_disable(
        &mut self,
        connector_id: ConnectorId,
        at: DateTime<Utc>,
        report: &mut CascadeReport,
    ) {
        let mut server_ids = HashSet::new();
        for server in self
            .servers
            .values_mut()
            .filter(|server| server.connector_id() == connector_id)
        {
            server.retire(at);
            server_ids.insert(server.id());
        }
        report.servers = server_ids.len();

        for token in self
            .tokens
            .values_mut()
            .filter(|token| server_ids.contains(&token.server_id))
        {
            token.is_active = false;
            report.tokens += 1;
        }

        for tool in self
            .tools
            .values_mut()
            .filter(|tool| server_ids.contains(&tool.server_id))
        {
            tool.is_active = false;
            report.tools += 1;
        }

        for grant in self
            .grants
            .values_mut()
            .filter(|grant| grant.connector_id == connector_id)
        {
            grant.is_active = false;
            report.access_grants += 1;
        }

        if let Some(connector) = self.connectors.get_mut(&connector_id) {
            connector.retire(at);
        }
    }
}

#[async_trait]
impl ConnectorStore for InMemoryConnectorStore {
    async fn insert_connector(&self, connector: &Connector) -> ConnectorStoreResult<()> {
        let mut state = self.write()?;

        if state
            .connectors
            .values()
            .filter(|existing| existing.is_active())
            .any(|existing| existing.name() == connector.name())
        {
            return Err(ConnectorStoreError::DuplicateName(connector.name().clone()));
        }

        if let Some(fingerprint) = connector.secret_fingerprint()
            && state
                .connectors
                .values()
                .filter(|existing| existing.is_active())
                .any(|existing| existing.secret_fingerprint() == Some(fingerprint))
        {
            return Err(ConnectorStoreError::DuplicateSecret);
        }

        state.connectors.insert(connector.id(), connector.clone());
        Ok(())
    }

    async fn find_connector(
        &self,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<Option<Connector>> {
        Ok(self.read()?.connectors.get(&connector_id).cloned())
    }

    async fn find_connector_by_name(
        &self,
        name: &ConnectorName,
    ) -> ConnectorStoreResult<Option<Connector>> {
        Ok(self
            .read()?
            .connectors
            .values()
            .find(|connector| connector.is_active() && connector.name() == name)
            .cloned())
    }

    async fn list_connectors(&self) -> ConnectorStoreResult<Vec<Connector>> {
        let state = self.read()?;
        let mut connectors: Vec<Connector> = state.connectors.values().cloned().collect();
        connectors.sort_by(|left, right| left.name().as_str().cmp(right.name().as_str()));
        Ok(connectors)
    }

    async fn transition_connector(
        &self,
        connector: &Connector,
        expected_mode: ConnectorMode,
    ) -> ConnectorStoreResult<()> {
        let mut state = self.write()?;
        let stored = state
            .connectors
            .get_mut(&connector.id())
            .filter(|stored| stored.is_active())
            .ok_or(ConnectorStoreError::ConnectorNotFound(connector.id()))?;

        if stored.mode() != expected_mode {
            return Err(ConnectorStoreError::ModeConflict {
                connector_id: connector.id(),
                expected: expected_mode,
            });
        }

        *stored = connector.clone();
        Ok(())
    }

    async fn cascade_connector(
        &self,
        connector_id: ConnectorId,
        policy: CascadePolicy,
        at: DateTime<Utc>,
    ) -> ConnectorStoreResult<CascadeReport> {
        let mut state = self.write()?;
        let is_live = state
            .connectors
            .get(&connector_id)
            .is_some_and(Connector::is_active);
        if !is_live {
            return Err(ConnectorStoreError::ConnectorNotFound(connector_id));
        }

        let mut report = CascadeReport::empty(connector_id, policy);
        match policy {
            CascadePolicy::HardDelete => state.hard_delete(connector_id, &mut report),
            CascadePolicy::SoftDisable => state.soft_disable(connector_id, at, &mut report),
        }
        Ok(report)
    }

    async fn insert_server(&self, bundle: &ServerBundle) -> ConnectorStoreResult<()> {
        let mut state = self.write()?;
        let connector_id = bundle.server.connector_id();
        let connector = state
            .connectors
            .get(&connector_id)
            .filter(|connector| connector.is_active())
            .ok_or(ConnectorStoreError::ConnectorNotFound(connector_id))?;
        if connector.mode() != ConnectorMode::Active {
            return Err(ConnectorStoreError::ConnectorNotActive {
                connector_id,
                mode: connector.mode(),
            });
        }

        if state.servers.values().any(|server| {
            server.connector_id() == connector_id && server.name() == bundle.server.name()
        }) {
            return Err(ConnectorStoreError::DuplicateServerName {
                connector_id,
                name: bundle.server.name().clone(),
            });
        }

        state
            .servers
            .insert(bundle.server.id(), bundle.server.clone());
        for token in &bundle.tokens {
            state.tokens.insert(token.id, token.clone());
        }
        for tool in &bundle.tools {
            state.tools.insert(tool.id, tool.clone());
        }
        Ok(())
    }

    async fn find_server(&self, server_id: ServerId) -> ConnectorStoreResult<Option<ServerBundle>> {
        let state = self.read()?;
        Ok(state
            .servers
            .get(&server_id)
            .map(|server| state.bundle(server)))
    }

    async fn list_servers(
        &self,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<Vec<ServerBundle>> {
        let state = self.read()?;
        let mut bundles: Vec<ServerBundle> = state
            .servers
            .values()
            .filter(|server| server.connector_id() == connector_id)
            .map(|server| state.bundle(server))
            .collect();
        bundles.sort_by(|left, right| left.server.name().as_str().cmp(right.server.name().as_str()));
        Ok(bundles)
    }

    async fn insert_grant(&self, grant: &AccessGrant) -> ConnectorStoreResult<()> {
        let mut state = self.write()?;

        if !state.connectors.contains_key(&grant.connector_id) {
            return Err(ConnectorStoreError::ConnectorNotFound(grant.connector_id));
        }
        for user_id in [grant.user_id, grant.granted_by] {
            if !state.users.contains_key(&user_id) {
                return Err(ConnectorStoreError::UserNotFound(user_id));
            }
        }

        if state.grants.values().any(|existing| {
            existing.user_id == grant.user_id && existing.connector_id == grant.connector_id
        }) {
            return Err(ConnectorStoreError::DuplicateGrant {
                user_id: grant.user_id,
                connector_id: grant.connector_id,
            });
        }

        state.grants.insert(grant.id, grant.clone());
        Ok(())
    }

    async fn delete_grant(
        &self,
        user_id: UserId,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<AccessGrant> {
        let mut state = self.write()?;
        let grant_id = state
            .grants
            .values()
            .find(|grant| {
                grant.is_active && grant.user_id == user_id && grant.connector_id == connector_id
            })
            .map(|grant| grant.id)
            .ok_or(ConnectorStoreError::GrantNotFound {
                user_id,
                connector_id,
            })?;

        state
            .grants
            .remove(&grant_id)
            .ok_or(ConnectorStoreError::GrantNotFound {
                user_id,
                connector_id,
            })
    }

    async fn list_grants(
        &self,
        connector_id: ConnectorId,
    ) -> ConnectorStoreResult<Vec<AccessGrantView>> {
        let state = self.read()?;
        let mut grants: Vec<&AccessGrant> = state
            .grants
            .values()
            .filter(|grant| grant.connector_id == connector_id)
            .collect();
        grants.sort_by_key(|grant| grant.created_at);
        grants
            .into_iter()
            .map(|grant| state.grant_view(grant))
            .collect()
    }

    async fn granted_connector_ids(
        &self,
        user_id: UserId,
    ) -> ConnectorStoreResult<HashSet<ConnectorId>> {
        Ok(self
            .read()?
            .grants
            .values()
            .filter(|grant| grant.is_active && grant.user_id == user_id)
            .map(|grant| grant.connector_id)
            .collect())
    }

    async fn insert_user(&self, user: &UserAccount) -> ConnectorStoreResult<()> {
        let mut state = self.write()?;
        if state.users.values().any(|existing| existing.email == user.email) {
            return Err(ConnectorStoreError::DuplicateEmail(user.email.clone()));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, user_id: UserId) -> ConnectorStoreResult<Option<UserAccount>> {
        Ok(self.read()?.users.get(&user_id).cloned())
    }

    async fn delete_user(&self, user_id: UserId) -> ConnectorStoreResult<usize> {
        let mut state = self.write()?;
        if state.users.remove(&user_id).is_none() {
            return Err(ConnectorStoreError::UserNotFound(user_id));
        }
        let grants_before = state.grants.len();
        state
            .grants
            .retain(|_, grant| grant.user_id != user_id && grant.granted_by != user_id);
        Ok(grants_before - state.grants.len())
    }
}
