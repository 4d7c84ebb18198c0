//! Diesel row models for connector persistence.

use super::schema::{connector_access, connectors, server_tokens, server_tools, servers, users};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

/// Query and insert row for connector records.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = connectors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ConnectorRow {
    /// Connector identifier.
    pub id: Uuid,
    /// Unique connector name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Lifecycle mode tag.
    pub mode: String,
    /// Schema URL.
    pub url: Option<String>,
    /// Connector version.
    pub version: Option<String>,
    /// Tool definitions.
    pub tools: Value,
    /// Template definitions.
    pub templates: Value,
    /// Server configuration schema.
    pub config_schema: Option<Value>,
    /// Activation timestamp.
    pub activated_at: Option<DateTime<Utc>>,
    /// Activation retained while toggled off.
    pub suspended_activation: Option<Value>,
    /// Secret fingerprint.
    pub secret_fingerprint: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete flag.
    pub is_active: bool,
}

/// Changeset written by mode transitions.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = connectors)]
#[diesel(treat_none_as_null = true)]
pub struct ConnectorStateChangeset {
    /// Lifecycle mode tag.
    pub mode: String,
    /// Schema URL.
    pub url: Option<String>,
    /// Connector version.
    pub version: Option<String>,
    /// Tool definitions.
    pub tools: Value,
    /// Template definitions.
    pub templates: Value,
    /// Server configuration schema.
    pub config_schema: Option<Value>,
    /// Activation timestamp.
    pub activated_at: Option<DateTime<Utc>>,
    /// Activation retained while toggled off.
    pub suspended_activation: Option<Value>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Query and insert row for servers.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = servers)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServerRow {
    /// Server identifier.
    pub id: Uuid,
    /// Owning connector.
    pub connector_id: Uuid,
    /// Server name.
    pub name: String,
    /// Configuration document.
    pub configuration: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete flag.
    pub is_active: bool,
}

/// Query and insert row for server tokens.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = server_tokens)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServerTokenRow {
    /// Token identifier.
    pub id: Uuid,
    /// Owning server.
    pub server_id: Uuid,
    /// Opaque token value.
    pub value: String,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Query and insert row for server tools.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = server_tools)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ServerToolRow {
    /// Tool row identifier.
    pub id: Uuid,
    /// Owning server.
    pub server_id: Uuid,
    /// Serialized tool definition.
    pub definition: Value,
    /// Soft-delete flag.
    pub is_active: bool,
}

/// Query and insert row for access grants.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = connector_access)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AccessGrantRow {
    /// Grant identifier.
    pub id: Uuid,
    /// Grantee.
    pub user_id: Uuid,
    /// Connector.
    pub connector_id: Uuid,
    /// Issuing superuser.
    pub granted_by: Uuid,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Soft-delete flag.
    pub is_active: bool,
}

/// Query and insert row for user accounts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// User identifier.
    pub id: Uuid,
    /// Unique email.
    pub email: String,
    /// Opaque credential hash.
    pub credential_hash: String,
    /// Superuser flag.
    pub is_superuser: bool,
    /// Account enabled flag.
    pub is_active: bool,
}
