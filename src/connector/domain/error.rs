//! Error types for connector domain validation and parsing.

use super::ConnectorId;
use thiserror::Error;

/// Errors returned while constructing or transitioning connector domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConnectorDomainError {
    /// The connector name is empty after trimming.
    #[error("connector name must not be empty")]
    EmptyConnectorName,

    /// The connector name contains unsupported characters.
    #[error(
        "connector name '{0}' contains invalid characters (only letters, digits, spaces, '_', '-' and '.' allowed)"
    )]
    InvalidConnectorName(String),

    /// The connector name exceeds the 100-character storage limit.
    #[error("connector name exceeds 100 character limit: {0}")]
    ConnectorNameTooLong(String),

    /// The connector description exceeds the storage limit.
    #[error("connector description exceeds {limit} character limit")]
    DescriptionTooLong {
        /// Maximum accepted length.
        limit: usize,
    },

    /// A provided connector secret is empty after trimming.
    #[error("connector secret must not be empty when provided")]
    EmptySecret,

    /// The activation URL is not an absolute `http` or `https` URL.
    #[error("connector URL '{0}' must be an absolute http:// or https:// URL")]
    InvalidConnectorUrl(String),

    /// The fetched schema document has no version string.
    #[error("connector schema version must not be empty")]
    EmptySchemaVersion,

    /// The fetched schema document declares neither tools nor templates.
    #[error("connector schema must declare at least one tool or template")]
    EmptySchemaDefinitions,

    /// A tool definition name is empty after trimming.
    #[error("tool name must not be empty")]
    EmptyToolName,

    /// A tool definition description is empty after trimming.
    #[error("tool '{0}' description must not be empty")]
    EmptyToolDescription(String),

    /// A tool input schema is not a JSON object.
    #[error("tool '{0}' input schema must be a JSON object")]
    InvalidToolInputSchema(String),

    /// A template name is empty after trimming.
    #[error("template name must not be empty")]
    EmptyTemplateName,

    /// The connector is already in `active` mode.
    #[error("connector {0} is already active")]
    AlreadyActive(ConnectorId),

    /// The requested mode change is not permitted from the current mode.
    #[error("invalid connector mode transition: {from} -> {to}")]
    InvalidModeTransition {
        /// Current mode.
        from: String,
        /// Requested target mode.
        to: String,
    },

    /// The operation requires the connector to be `active`.
    #[error("connector {connector_id} is not active (current mode: {mode})")]
    ConnectorNotActive {
        /// Connector identifier.
        connector_id: ConnectorId,
        /// Mode in canonical string form.
        mode: String,
    },

    /// The server name is empty after trimming.
    #[error("server name must not be empty")]
    EmptyServerName,

    /// The server name exceeds the 100-character storage limit.
    #[error("server name exceeds 100 character limit: {0}")]
    ServerNameTooLong(String),

    /// Server configuration is not a JSON object.
    #[error("server configuration must be a JSON object")]
    ServerConfigurationNotObject,

    /// Server configuration lacks a key the connector schema requires.
    #[error("server configuration is missing required key '{0}'")]
    MissingConfigurationKey(String),

    /// The token lifetime moves the expiry outside the supported date range.
    #[error("server token lifetime is too long to compute an expiry")]
    TokenExpiryOutOfRange,

    /// The email address is malformed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

impl ConnectorDomainError {
    /// Returns whether the error describes a rejected activation schema or URL.
    #[must_use]
    pub const fn is_activation_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidConnectorUrl(_)
                | Self::EmptySchemaVersion
                | Self::EmptySchemaDefinitions
                | Self::EmptyToolName
                | Self::EmptyToolDescription(_)
                | Self::InvalidToolInputSchema(_)
                | Self::EmptyTemplateName
        )
    }

    /// Returns whether the error describes an operation illegal for the
    /// connector's current mode.
    #[must_use]
    pub const fn is_state_violation(&self) -> bool {
        matches!(
            self,
            Self::AlreadyActive(_)
                | Self::InvalidModeTransition { .. }
                | Self::ConnectorNotActive { .. }
        )
    }
}

/// Error returned while parsing a connector mode from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown connector mode: {0}")]
pub struct ParseConnectorModeError(pub String);

/// Error returned while parsing a cascade policy from configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown cascade policy: {0}")]
pub struct ParseCascadePolicyError(pub String);
