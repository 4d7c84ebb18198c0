//! Servers instantiated from active connectors, with their tokens and tools.

use super::{
    ConnectorDomainError, ConnectorId, ServerId, ServerName, ServerTokenId, ServerToolId,
    ToolDefinition, connector::Connector, secret::random_alphanumeric,
};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tenant-specific instantiation of an active connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    id: ServerId,
    connector_id: ConnectorId,
    name: ServerName,
    configuration: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_active: bool,
}

/// Parameter object for reconstructing a persisted server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedServerData {
    /// Persisted server identifier.
    pub id: ServerId,
    /// Owning connector.
    pub connector_id: ConnectorId,
    /// Persisted server name.
    pub name: ServerName,
    /// Persisted configuration document.
    pub configuration: Value,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted soft-delete flag.
    pub is_active: bool,
}

impl Server {
    /// Reconstructs a server from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedServerData) -> Self {
        Self {
            id: data.id,
            connector_id: data.connector_id,
            name: data.name,
            configuration: data.configuration,
            created_at: data.created_at,
            updated_at: data.updated_at,
            is_active: data.is_active,
        }
    }

    /// Returns the server identifier.
    #[must_use]
    pub const fn id(&self) -> ServerId {
        self.id
    }

    /// Returns the owning connector identifier.
    #[must_use]
    pub const fn connector_id(&self) -> ConnectorId {
        self.connector_id
    }

    /// Returns the server name.
    #[must_use]
    pub const fn name(&self) -> &ServerName {
        &self.name
    }

    /// Returns the configuration document.
    #[must_use]
    pub const fn configuration(&self) -> &Value {
        &self.configuration
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `false` once the server has been soft-disabled.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Flags the server as soft-disabled at `at`.
    pub const fn retire(&mut self, at: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = at;
    }
}

/// Opaque access token issued for a server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerToken {
    /// Token identifier.
    pub id: ServerTokenId,
    /// Owning server.
    pub server_id: ServerId,
    /// Opaque token value.
    pub value: String,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl ServerToken {
    /// Returns whether the token is usable at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expiry| expiry > now)
    }
}

/// Tool definition copied onto a server at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerTool {
    /// Tool row identifier.
    pub id: ServerToolId,
    /// Owning server.
    pub server_id: ServerId,
    /// Tool definition.
    pub definition: ToolDefinition,
    /// Soft-delete flag.
    pub is_active: bool,
}

/// Token issuance settings for new servers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    /// Number of characters in generated token values.
    pub length: usize,
    /// Optional lifetime of generated tokens.
    pub ttl: Option<Duration>,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            length: 40,
            ttl: None,
        }
    }
}

impl TokenSettings {
    /// Returns when a token issued at `issued_at` expires, if it expires.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::TokenExpiryOutOfRange`] when the
    /// lifetime pushes the expiry past the representable date range.
    pub fn expiry_from(
        &self,
        issued_at: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, ConnectorDomainError> {
        self.ttl
            .map(|ttl| {
                issued_at
                    .checked_add_signed(ttl)
                    .ok_or(ConnectorDomainError::TokenExpiryOutOfRange)
            })
            .transpose()
    }
}

/// A server together with every row that depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerBundle {
    /// The server row.
    pub server: Server,
    /// Tokens issued for the server.
    pub tokens: Vec<ServerToken>,
    /// Tools attached to the server.
    pub tools: Vec<ServerTool>,
}

impl ServerBundle {
    /// Builds a new server, its initial token and its tool copies from an
    /// active connector.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::ConnectorNotActive`] unless the
    /// connector is usable, [`ConnectorDomainError::ServerConfigurationNotObject`]
    /// when the configuration is not an object, and
    /// [`ConnectorDomainError::MissingConfigurationKey`] when a key required
    /// by the connector schema is absent. Returns
    /// [`ConnectorDomainError::TokenExpiryOutOfRange`] when the token lifetime
    /// overflows.
    pub fn provision(
        connector: &Connector,
        name: ServerName,
        configuration: Value,
        token_settings: TokenSettings,
        clock: &impl Clock,
    ) -> Result<Self, ConnectorDomainError> {
        let activation = connector.ensure_usable()?;
        let Some(fields) = configuration.as_object() else {
            return Err(ConnectorDomainError::ServerConfigurationNotObject);
        };
        if let Some(missing) = activation
            .required_config_keys()
            .into_iter()
            .find(|key| !fields.contains_key(*key))
        {
            return Err(ConnectorDomainError::MissingConfigurationKey(
                missing.to_owned(),
            ));
        }

        let timestamp = clock.utc();
        let expires_at = token_settings.expiry_from(timestamp)?;
        let server = Server {
            id: ServerId::new(),
            connector_id: connector.id(),
            name,
            configuration,
            created_at: timestamp,
            updated_at: timestamp,
            is_active: true,
        };
        let token = ServerToken {
            id: ServerTokenId::new(),
            server_id: server.id,
            value: random_alphanumeric(token_settings.length),
            expires_at,
            is_active: true,
            created_at: timestamp,
        };
        let tools = activation
            .tools()
            .iter()
            .map(|definition| ServerTool {
                id: ServerToolId::new(),
                server_id: server.id,
                definition: definition.clone(),
                is_active: true,
            })
            .collect();

        Ok(Self {
            server,
            tokens: vec![token],
            tools,
        })
    }
}
