//! Cascade policy and the report produced by a cascade.

use super::{ConnectorId, ParseCascadePolicyError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Effect applied uniformly to a connector and every dependent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePolicy {
    /// Remove the connector and all dependents.
    #[default]
    HardDelete,
    /// Flag the connector and all dependents inactive.
    SoftDisable,
}

impl CascadePolicy {
    /// Returns the canonical configuration representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HardDelete => "hard_delete",
            Self::SoftDisable => "soft_disable",
        }
    }
}

impl fmt::Display for CascadePolicy {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CascadePolicy {
    type Error = ParseCascadePolicyError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "hard_delete" => Ok(Self::HardDelete),
            "soft_disable" => Ok(Self::SoftDisable),
            _ => Err(ParseCascadePolicyError(value.to_owned())),
        }
    }
}

/// Counts of rows affected by one cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    /// Root connector.
    pub connector_id: ConnectorId,
    /// Effect that was applied.
    pub policy: CascadePolicy,
    /// Servers deleted or disabled.
    pub servers: usize,
    /// Server tokens deleted or disabled.
    pub tokens: usize,
    /// Server tools deleted or disabled.
    pub tools: usize,
    /// Access grants revoked.
    pub access_grants: usize,
}

impl CascadeReport {
    /// Creates a report with zero counts.
    #[must_use]
    pub const fn empty(connector_id: ConnectorId, policy: CascadePolicy) -> Self {
        Self {
            connector_id,
            policy,
            servers: 0,
            tokens: 0,
            tools: 0,
            access_grants: 0,
        }
    }
}
