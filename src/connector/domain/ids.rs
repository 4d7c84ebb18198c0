//! Identifier and validated-name types for connectors and their dependents.

use super::ConnectorDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Maximum length for connector and server names, matching `VARCHAR(100)`.
const MAX_NAME_LENGTH: usize = 100;

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Creates an identifier from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the wrapped UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "{}", self.0)
            }
        }
    };
}

uuid_identifier!(
    /// Unique identifier for a registered connector.
    ConnectorId
);

uuid_identifier!(
    /// Unique identifier for a server instantiated from a connector.
    ServerId
);

uuid_identifier!(
    /// Unique identifier for a server access token.
    ServerTokenId
);

uuid_identifier!(
    /// Unique identifier for a tool attached to a server.
    ServerToolId
);

uuid_identifier!(
    /// Unique identifier for a connector access grant.
    AccessGrantId
);

uuid_identifier!(
    /// Unique identifier for a user account.
    UserId
);

/// Validated, human-readable connector name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorName(String);

impl ConnectorName {
    /// Creates a validated connector name.
    ///
    /// The input is trimmed. Letters, digits, spaces, `_`, `-` and `.` are
    /// accepted; case is preserved.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError`] when validation fails.
    pub fn new(value: impl Into<String>) -> Result<Self, ConnectorDomainError> {
        let normalized = value.into().trim().to_owned();

        if normalized.is_empty() {
            return Err(ConnectorDomainError::EmptyConnectorName);
        }

        let is_valid = normalized.chars().all(|character| {
            character.is_ascii_alphanumeric() || matches!(character, ' ' | '_' | '-' | '.')
        });
        if !is_valid {
            return Err(ConnectorDomainError::InvalidConnectorName(normalized));
        }

        if normalized.chars().count() > MAX_NAME_LENGTH {
            return Err(ConnectorDomainError::ConnectorNameTooLong(normalized));
        }

        Ok(Self(normalized))
    }

    /// Returns the connector name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ConnectorName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ConnectorName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Validated server name, unique within its owning connector.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerName(String);

impl ServerName {
    /// Creates a validated server name.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError`] when the trimmed name is empty or too
    /// long.
    pub fn new(value: impl Into<String>) -> Result<Self, ConnectorDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ConnectorDomainError::EmptyServerName);
        }
        if normalized.chars().count() > MAX_NAME_LENGTH {
            return Err(ConnectorDomainError::ServerNameTooLong(normalized));
        }
        Ok(Self(normalized))
    }

    /// Returns the server name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
