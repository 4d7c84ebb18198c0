//! Connector lifecycle modes.

use super::ParseConnectorModeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle mode of a registered connector.
///
/// Modes are persisted and compared by their string tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorMode {
    /// Registered and awaiting synchronisation; not usable.
    Sync,
    /// Registered or switched off; not usable.
    Deactive,
    /// Activated with schema metadata; the only usable mode.
    Active,
}

impl ConnectorMode {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Deactive => "deactive",
            Self::Active => "active",
        }
    }

    /// Returns whether servers may be created in this mode.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for ConnectorMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ConnectorMode {
    type Error = ParseConnectorModeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "sync" => Ok(Self::Sync),
            "deactive" => Ok(Self::Deactive),
            "active" => Ok(Self::Active),
            _ => Err(ParseConnectorModeError(value.to_owned())),
        }
    }
}

/// Entry mode chosen at registration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingMode {
    /// Register awaiting synchronisation.
    Sync,
    /// Register switched off.
    #[default]
    Deactive,
}

impl From<PendingMode> for ConnectorMode {
    fn from(value: PendingMode) -> Self {
        match value {
            PendingMode::Sync => Self::Sync,
            PendingMode::Deactive => Self::Deactive,
        }
    }
}

/// Target of a direct mode toggle.
///
/// `sync` is not a toggle target. Reaching `active` from `sync` requires a
/// full activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettableMode {
    /// Switch an activated connector back on.
    Active,
    /// Switch a connector off.
    Deactive,
}

impl From<SettableMode> for ConnectorMode {
    fn from(value: SettableMode) -> Self {
        match value {
            SettableMode::Active => Self::Active,
            SettableMode::Deactive => Self::Deactive,
        }
    }
}

impl fmt::Display for SettableMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(ConnectorMode::from(*self).as_str())
    }
}
