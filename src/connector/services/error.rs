//! Service-boundary error taxonomy shared by all connector services.

use crate::connector::{
    domain::{
        ConnectorDomainError, ConnectorId, ConnectorMode, ServerId, SessionIdentity, UserId,
    },
    ports::{ConnectorStoreError, SchemaSourceError},
};
use thiserror::Error;

/// Result type for connector service operations.
pub type ConnectorServiceResult<T> = Result<T, ConnectorServiceError>;

/// Coarse classification of a service failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A uniqueness rule was violated.
    Conflict,
    /// The referenced entity does not exist or is hidden from the caller.
    NotFound,
    /// The operation is illegal in the connector's current mode.
    InvalidState,
    /// The schema document could not be fetched or validated.
    Activation,
    /// The caller lacks the required privilege.
    Authorization,
    /// The request carried malformed input.
    Validation,
    /// The unit of work failed and was rolled back.
    Transaction,
}

impl ErrorKind {
    /// Returns the HTTP status code a transport layer should answer with.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::Conflict | Self::InvalidState => 409,
            Self::NotFound => 404,
            Self::Activation => 400,
            Self::Authorization => 403,
            Self::Validation => 422,
            Self::Transaction => 500,
        }
    }
}

/// Errors returned by connector services.
#[derive(Debug, Clone, Error)]
pub enum ConnectorServiceError {
    /// The caller is not a superuser.
    #[error("user {user_id} is not allowed to {operation}")]
    Unauthorized {
        /// Calling user.
        user_id: UserId,
        /// Attempted operation.
        operation: &'static str,
    },

    /// Request input failed domain validation.
    #[error(transparent)]
    Validation(ConnectorDomainError),

    /// A uniqueness rule was violated.
    #[error(transparent)]
    Conflict(ConnectorStoreError),

    /// The connector does not exist, was retired or is hidden.
    #[error("connector {0} not found")]
    ConnectorNotFound(ConnectorId),

    /// The user does not exist or is disabled.
    #[error("user {0} not found")]
    UserNotFound(UserId),

    /// The server does not exist.
    #[error("server {0} not found")]
    ServerNotFound(ServerId),

    /// No grant exists for the pair.
    #[error("no access grant for user {user_id} on connector {connector_id}")]
    GrantNotFound {
        /// Grantee.
        user_id: UserId,
        /// Connector.
        connector_id: ConnectorId,
    },

    /// The connector's mode does not permit the operation.
    #[error(transparent)]
    InvalidState(ConnectorDomainError),

    /// Another writer changed the connector's mode first.
    #[error("connector {connector_id} changed concurrently; it is no longer {expected}")]
    ConcurrentModification {
        /// Connector identifier.
        connector_id: ConnectorId,
        /// Mode observed before the write.
        expected: ConnectorMode,
    },

    /// The schema document could not be fetched.
    #[error(transparent)]
    SchemaUnavailable(SchemaSourceError),

    /// The fetched schema or the URL failed validation.
    #[error("connector schema rejected: {0}")]
    InvalidSchema(ConnectorDomainError),

    /// The store failed and rolled back.
    #[error("transaction failed: {0}")]
    Transaction(ConnectorStoreError),
}

impl ConnectorServiceError {
    /// Returns the coarse classification of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Authorization,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::ConnectorNotFound(_)
            | Self::UserNotFound(_)
            | Self::ServerNotFound(_)
            | Self::GrantNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidState(_) | Self::ConcurrentModification { .. } => {
                ErrorKind::InvalidState
            }
            Self::SchemaUnavailable(_) | Self::InvalidSchema(_) => ErrorKind::Activation,
            Self::Transaction(_) => ErrorKind::Transaction,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}

impl From<ConnectorDomainError> for ConnectorServiceError {
    fn from(err: ConnectorDomainError) -> Self {
        if err.is_activation_failure() {
            Self::InvalidSchema(err)
        } else if err.is_state_violation() {
            Self::InvalidState(err)
        } else {
            Self::Validation(err)
        }
    }
}

impl From<ConnectorStoreError> for ConnectorServiceError {
    fn from(err: ConnectorStoreError) -> Self {
        match err {
            ConnectorStoreError::DuplicateName(_)
            | ConnectorStoreError::DuplicateSecret
            | ConnectorStoreError::DuplicateGrant { .. }
            | ConnectorStoreError::DuplicateEmail(_)
            | ConnectorStoreError::DuplicateServerName { .. } => Self::Conflict(err),
            ConnectorStoreError::ConnectorNotFound(connector_id) => {
                Self::ConnectorNotFound(connector_id)
            }
            ConnectorStoreError::UserNotFound(user_id) => Self::UserNotFound(user_id),
            ConnectorStoreError::GrantNotFound {
                user_id,
                connector_id,
            } => Self::GrantNotFound {
                user_id,
                connector_id,
            },
            ConnectorStoreError::ModeConflict {
                connector_id,
                expected,
            } => Self::ConcurrentModification {
                connector_id,
                expected,
            },
            ConnectorStoreError::ConnectorNotActive { connector_id, mode } => {
                Self::InvalidState(ConnectorDomainError::ConnectorNotActive {
                    connector_id,
                    mode: mode.as_str().to_owned(),
                })
            }
            ConnectorStoreError::InvalidPersistedData(_) | ConnectorStoreError::Persistence(_) => {
                Self::Transaction(err)
            }
        }
    }
}

impl From<SchemaSourceError> for ConnectorServiceError {
    fn from(err: SchemaSourceError) -> Self {
        Self::SchemaUnavailable(err)
    }
}

/// Rejects callers that are not superusers.
///
/// # Errors
///
/// Returns [`ConnectorServiceError::Unauthorized`] for non-superusers.
pub const fn require_superuser(
    caller: SessionIdentity,
    operation: &'static str,
) -> ConnectorServiceResult<()> {
    if caller.is_superuser {
        Ok(())
    } else {
        Err(ConnectorServiceError::Unauthorized {
            user_id: caller.user_id,
            operation,
        })
    }
}
