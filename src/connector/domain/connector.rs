//! Connector aggregate root and its lifecycle state machine.

use super::{
    Activation, ConnectorDomainError, ConnectorId, ConnectorMode, ConnectorName, PendingMode,
    SecretFingerprint, SettableMode, TemplateDefinition, ToolDefinition,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Maximum description length accepted at registration.
const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Lifecycle state of a connector.
///
/// Activation metadata lives inside the `Active` variant, so a connector is
/// never `active` without it and never exposes it while not active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "activation")]
pub enum ConnectorState {
    /// Awaiting synchronisation.
    Sync,
    /// Switched off. Holds the previous activation when the connector was
    /// toggled off from `active`.
    Deactive {
        /// Activation retained for toggling back on.
        suspended: Option<Activation>,
    },
    /// Usable, with schema metadata.
    Active(Activation),
}

impl ConnectorState {
    /// Returns the persisted mode tag for this state.
    #[must_use]
    pub const fn mode(&self) -> ConnectorMode {
        match self {
            Self::Sync => ConnectorMode::Sync,
            Self::Deactive { .. } => ConnectorMode::Deactive,
            Self::Active(_) => ConnectorMode::Active,
        }
    }
}

/// Connector aggregate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connector {
    id: ConnectorId,
    name: ConnectorName,
    description: String,
    state: ConnectorState,
    secret_fingerprint: Option<SecretFingerprint>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    is_active: bool,
}

/// Parameter object for reconstructing persisted connector state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedConnectorData {
    /// Persisted connector identifier.
    pub id: ConnectorId,
    /// Persisted connector name.
    pub name: ConnectorName,
    /// Persisted description.
    pub description: String,
    /// Persisted lifecycle state.
    pub state: ConnectorState,
    /// Persisted secret fingerprint.
    pub secret_fingerprint: Option<SecretFingerprint>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted soft-delete flag.
    pub is_active: bool,
}

impl Connector {
    /// Creates a newly registered connector in a not-yet-usable mode.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::DescriptionTooLong`] when the
    /// description exceeds the storage limit.
    pub fn register(
        name: ConnectorName,
        description: impl Into<String>,
        initial_mode: PendingMode,
        secret_fingerprint: Option<SecretFingerprint>,
        clock: &impl Clock,
    ) -> Result<Self, ConnectorDomainError> {
        let normalized_description = description.into().trim().to_owned();
        if normalized_description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(ConnectorDomainError::DescriptionTooLong {
                limit: MAX_DESCRIPTION_LENGTH,
            });
        }

        let state = match initial_mode {
            PendingMode::Sync => ConnectorState::Sync,
            PendingMode::Deactive => ConnectorState::Deactive { suspended: None },
        };
        let timestamp = clock.utc();
        Ok(Self {
            id: ConnectorId::new(),
            name,
            description: normalized_description,
            state,
            secret_fingerprint,
            created_at: timestamp,
            updated_at: timestamp,
            is_active: true,
        })
    }

    /// Reconstructs a connector from persistence.
    #[must_use]
    pub fn from_persisted(data: PersistedConnectorData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            description: data.description,
            state: data.state,
            secret_fingerprint: data.secret_fingerprint,
            created_at: data.created_at,
            updated_at: data.updated_at,
            is_active: data.is_active,
        }
    }

    /// Returns the connector identifier.
    #[must_use]
    pub const fn id(&self) -> ConnectorId {
        self.id
    }

    /// Returns the connector name.
    #[must_use]
    pub const fn name(&self) -> &ConnectorName {
        &self.name
    }

    /// Returns the connector description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> &ConnectorState {
        &self.state
    }

    /// Returns the lifecycle mode.
    #[must_use]
    pub const fn mode(&self) -> ConnectorMode {
        self.state.mode()
    }

    /// Returns the current activation metadata, present only while active.
    #[must_use]
    pub const fn activation(&self) -> Option<&Activation> {
        match &self.state {
            ConnectorState::Active(activation) => Some(activation),
            ConnectorState::Sync | ConnectorState::Deactive { .. } => None,
        }
    }

    /// Returns the activation retained while toggled off, if any.
    #[must_use]
    pub const fn suspended_activation(&self) -> Option<&Activation> {
        match &self.state {
            ConnectorState::Deactive { suspended } => suspended.as_ref(),
            ConnectorState::Sync | ConnectorState::Active(_) => None,
        }
    }

    /// Returns the schema URL, present only while active.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.activation().map(Activation::url)
    }

    /// Returns the connector version, present only while active.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.activation().map(Activation::version)
    }

    /// Returns the tool metadata, empty unless active.
    #[must_use]
    pub fn tools(&self) -> &[ToolDefinition] {
        self.activation()
            .map(Activation::tools)
            .unwrap_or_default()
    }

    /// Returns the template metadata, empty unless active.
    #[must_use]
    pub fn templates(&self) -> &[TemplateDefinition] {
        self.activation()
            .map(Activation::templates)
            .unwrap_or_default()
    }

    /// Returns the secret fingerprint, if a secret was registered.
    #[must_use]
    pub const fn secret_fingerprint(&self) -> Option<&SecretFingerprint> {
        self.secret_fingerprint.as_ref()
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

    /// Returns `false` once the connector has been soft-disabled.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.is_active
    }

    /// Promotes the connector to `active` with freshly fetched metadata.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::AlreadyActive`] when the connector is
    /// already active.
    pub fn activate(
        &mut self,
        activation: Activation,
        clock: &impl Clock,
    ) -> Result<(), ConnectorDomainError> {
        self.ensure_can_activate()?;
        self.state = ConnectorState::Active(activation);
        self.touch(clock);
        Ok(())
    }

    /// Validates that a full activation may start from the current state.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::AlreadyActive`] when the connector is
    /// already active.
    pub fn ensure_can_activate(&self) -> Result<(), ConnectorDomainError> {
        match &self.state {
            ConnectorState::Active(_) => Err(ConnectorDomainError::AlreadyActive(self.id)),
            ConnectorState::Sync | ConnectorState::Deactive { .. } => Ok(()),
        }
    }

    /// Toggles the connector between `active` and `deactive`.
    ///
    /// Switching off keeps the activation as suspended metadata; switching
    /// back on restores it. A connector that was never activated cannot be
    /// switched on.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::InvalidModeTransition`] when the
    /// target equals the current mode, when switching on from `sync`, or when
    /// switching on without a suspended activation.
    pub fn set_mode(
        &mut self,
        target: SettableMode,
        clock: &impl Clock,
    ) -> Result<(), ConnectorDomainError> {
        let current = std::mem::replace(&mut self.state, ConnectorState::Sync);
        match transition(current, target) {
            Ok(next) => {
                self.state = next;
                self.touch(clock);
                Ok(())
            }
            Err((restored, error)) => {
                self.state = restored;
                Err(error)
            }
        }
    }

    /// Validates that servers may be created from this connector.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorDomainError::ConnectorNotActive`] unless the
    /// connector is `active` and not soft-disabled.
    pub fn ensure_usable(&self) -> Result<&Activation, ConnectorDomainError> {
        match (&self.state, self.is_active) {
            (ConnectorState::Active(activation), true) => Ok(activation),
            _ => Err(ConnectorDomainError::ConnectorNotActive {
                connector_id: self.id,
                mode: self.mode().as_str().to_owned(),
            }),
        }
    }

    /// Flags the connector as soft-disabled at `at`.
    pub const fn retire(&mut self, at: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = at;
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

type TransitionFailure = (ConnectorState, ConnectorDomainError);

fn transition(
    current: ConnectorState,
    target: SettableMode,
) -> Result<ConnectorState, TransitionFailure> {
    match (current, target) {
        (ConnectorState::Active(activation), SettableMode::Deactive) => {
            Ok(ConnectorState::Deactive {
                suspended: Some(activation),
            })
        }
        (ConnectorState::Sync, SettableMode::Deactive) => {
            Ok(ConnectorState::Deactive { suspended: None })
        }
        (
            ConnectorState::Deactive {
                suspended: Some(activation),
            },
            SettableMode::Active,
        ) => Ok(ConnectorState::Active(activation)),
        (state, requested) => {
            let error = ConnectorDomainError::InvalidModeTransition {
                from: state.mode().as_str().to_owned(),
                to: ConnectorMode::from(requested).as_str().to_owned(),
            };
            Err((state, error))
        }
    }
}
