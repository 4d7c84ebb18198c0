//! Connector secrets and their one-way fingerprints.
//!
//! Plaintext secrets leave the crate exactly once, in the registration
//! response. Only the SHA-256 fingerprint is stored and compared.

use super::ConnectorDomainError;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Length of generated connector secrets.
const GENERATED_SECRET_LENGTH: usize = 48;

/// Secret handling requested at registration time.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum SecretInput {
    /// Register without a secret.
    #[default]
    None,
    /// Register with a caller-supplied secret.
    Provided(String),
    /// Register with a freshly generated secret.
    Generate,
}

impl fmt::Debug for SecretInput {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => formatter.write_str("None"),
            Self::Provided(_) => formatter.write_str("Provided(<redacted>)"),
            Self::Generate => formatter.write_str("Generate"),
        }
    }
}

impl SecretInput {
    /// Resolves the input into an optional plaintext secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::EmptySecret`] when a provided secret
    /// is empty after trimming.
    pub fn resolve(self) -> Result<Option<ConnectorSecret>, ConnectorDomainError> {
        match self {
            Self::None => Ok(None),
            Self::Provided(value) => ConnectorSecret::new(value).map(Some),
            Self::Generate => Ok(Some(ConnectorSecret::generate())),
        }
    }
}

/// Plaintext connector credential.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectorSecret(String);

impl ConnectorSecret {
    /// Wraps a caller-supplied secret.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::EmptySecret`] when the trimmed value is
    /// empty.
    pub fn new(value: impl Into<String>) -> Result<Self, ConnectorDomainError> {
        let normalized = value.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(ConnectorDomainError::EmptySecret);
        }
        Ok(Self(normalized))
    }

    /// Generates a random alphanumeric secret.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_alphanumeric(GENERATED_SECRET_LENGTH))
    }

    /// Returns the plaintext secret.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Derives the fingerprint used for uniqueness checks.
    #[must_use]
    pub fn fingerprint(&self) -> SecretFingerprint {
        SecretFingerprint::of(&self.0)
    }
}

impl fmt::Debug for ConnectorSecret {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("ConnectorSecret(<redacted>)")
    }
}

/// Lowercase hex SHA-256 digest of a connector secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretFingerprint(String);

impl SecretFingerprint {
    /// Computes the fingerprint of a plaintext value.
    #[must_use]
    pub fn of(plaintext: &str) -> Self {
        Self(format!("{:x}", Sha256::digest(plaintext.as_bytes())))
    }

    /// Reconstructs a fingerprint read from persistence.
    #[must_use]
    pub fn from_persisted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Generates a random alphanumeric string of `length` characters.
pub(crate) fn random_alphanumeric(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
