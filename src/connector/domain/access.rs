//! Connector access grants, user accounts and caller identity.

use super::{AccessGrantId, ConnectorDomainError, ConnectorId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Record authorizing a user to see and use a connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// Grant identifier.
    pub id: AccessGrantId,
    /// Grantee.
    pub user_id: UserId,
    /// Connector made visible.
    pub connector_id: ConnectorId,
    /// Superuser who issued the grant.
    pub granted_by: UserId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Soft-delete flag.
    pub is_active: bool,
}

impl AccessGrant {
    /// Creates a new grant issued by `granted_by`.
    #[must_use]
    pub fn new(
        user_id: UserId,
        connector_id: ConnectorId,
        granted_by: UserId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: AccessGrantId::new(),
            user_id,
            connector_id,
            granted_by,
            created_at: clock.utc(),
            is_active: true,
        }
    }
}

/// Access grant annotated with grantee and granter identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrantView {
    /// The underlying grant.
    pub grant: AccessGrant,
    /// Email of the grantee.
    pub grantee_email: Email,
    /// Email of the granting superuser.
    pub granter_email: Email,
}

/// Validated, lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Creates a validated email address.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::InvalidEmail`] unless the value has a
    /// non-empty local part and a dotted domain.
    pub fn new(value: impl Into<String>) -> Result<Self, ConnectorDomainError> {
        let normalized = value.into().trim().to_ascii_lowercase();
        let is_valid = normalized
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.contains('@')
            });
        if !is_valid {
            return Err(ConnectorDomainError::InvalidEmail(normalized));
        }
        Ok(Self(normalized))
    }

    /// Returns the email as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// User account as seen by the connector core.
///
/// Credential hashing and session issuance belong to the auth collaborator;
/// the hash is stored opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// User identifier.
    pub id: UserId,
    /// Unique email address.
    pub email: Email,
    /// Opaque credential hash.
    pub credential_hash: String,
    /// Whether the user may perform privileged operations.
    pub is_superuser: bool,
    /// Whether the account is enabled.
    pub is_active: bool,
}

impl UserAccount {
    /// Creates an enabled user account.
    #[must_use]
    pub fn new(email: Email, credential_hash: impl Into<String>, is_superuser: bool) -> Self {
        Self {
            id: UserId::new(),
            email,
            credential_hash: credential_hash.into(),
            is_superuser,
            is_active: true,
        }
    }

    /// Returns the session identity for this account.
    #[must_use]
    pub const fn identity(&self) -> SessionIdentity {
        SessionIdentity {
            user_id: self.id,
            is_superuser: self.is_superuser,
        }
    }
}

/// Authenticated caller identity supplied with every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionIdentity {
    /// Calling user.
    pub user_id: UserId,
    /// Whether the caller is a superuser.
    pub is_superuser: bool,
}

impl SessionIdentity {
    /// Creates a superuser identity.
    #[must_use]
    pub const fn superuser(user_id: UserId) -> Self {
        Self {
            user_id,
            is_superuser: true,
        }
    }

    /// Creates a regular member identity.
    #[must_use]
    pub const fn member(user_id: UserId) -> Self {
        Self {
            user_id,
            is_superuser: false,
        }
    }
}
