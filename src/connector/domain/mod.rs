//! Domain model for connector lifecycle, servers and access control.
//!
//! The connector domain models connector identity, the `sync` / `deactive` /
//! `active` state machine, activation metadata, server instantiation,
//! access grants and cascade policy. Infrastructure concerns remain outside
//! this boundary.

mod access;
mod cascade;
mod connector;
mod error;
mod ids;
mod mode;
mod schema;
mod secret;
mod server;

pub use access::{AccessGrant, AccessGrantView, Email, SessionIdentity, UserAccount};
pub use cascade::{CascadePolicy, CascadeReport};
pub use connector::{Connector, ConnectorState, PersistedConnectorData};
pub use error::{ConnectorDomainError, ParseCascadePolicyError, ParseConnectorModeError};
pub use ids::{
    AccessGrantId, ConnectorId, ConnectorName, ServerId, ServerName, ServerTokenId, ServerToolId,
    UserId,
};
pub use mode::{ConnectorMode, PendingMode, SettableMode};
pub use schema::{
    Activation, ConnectorUrl, PersistedActivationData, SchemaDocument, SchemaTemplate,
    SchemaTool, TemplateDefinition, ToolDefinition,
};
pub use secret::{ConnectorSecret, SecretFingerprint, SecretInput};
pub use server::{
    PersistedServerData, Server, ServerBundle, ServerToken, ServerTool, TokenSettings,
};
