//! Hub configuration.
//!
//! Values are merged in this order, later sources winning:
//!
//! 1. built-in defaults;
//! 2. an optional YAML file;
//! 3. `CONNECTOR_HUB_`-prefixed environment variables, with `__` separating
//!    nested keys (for example `CONNECTOR_HUB_CASCADE__POLICY=soft_disable`);
//! 4. `DATABASE_URL`, which overrides `database.url`.

use crate::connector::domain::{CascadePolicy, TokenSettings};
use chrono::Utc;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A provider failed or a value could not be deserialized.
    #[error("failed to load configuration: {0}")]
    Load(Box<figment::Error>),

    /// The merged values are inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL. Required when the Postgres store is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
        }
    }
}

/// Connector deletion settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Policy applied to a deleted connector and its dependents.
    pub policy: CascadePolicy,
}

/// Schema fetch settings used during activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Per-request timeout for schema fetches.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Server token issuance settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerTokenConfig {
    /// Characters per generated token.
    pub length: usize,
    /// Default token lifetime; tokens never expire when unset.
    #[serde(with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<Duration>,
}

impl Default for ServerTokenConfig {
    fn default() -> Self {
        Self {
            length: TokenSettings::default().length,
            ttl: None,
        }
    }
}

/// Root configuration for the connector hub.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Deletion settings.
    pub cascade: CascadeConfig,
    /// Activation settings.
    pub activation: ActivationConfig,
    /// Server token settings.
    pub server_tokens: ServerTokenConfig,
}

impl HubConfig {
    /// Builds the provider chain, reading `config_file` when it is given.
    #[must_use]
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = config_file {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed("CONNECTOR_HUB_").split("__"))
            .merge(
                Env::raw()
                    .only(&["DATABASE_URL"])
                    .map(|_| "database.url".into()),
            )
    }

    /// Loads and validates configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Load`] when a source cannot be read or parsed
    /// and [`ConfigError::Invalid`] when validation fails.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero pool size, a zero fetch
    /// timeout, a zero token length or a token lifetime that puts the expiry
    /// of a token issued now outside the representable date range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than zero".to_owned(),
            ));
        }
        if self.activation.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "activation.request_timeout must be greater than zero".to_owned(),
            ));
        }
        if self.server_tokens.length == 0 {
            return Err(ConfigError::Invalid(
                "server_tokens.length must be greater than zero".to_owned(),
            ));
        }
        self.token_settings()?
            .expiry_from(Utc::now())
            .map_err(|err| ConfigError::Invalid(format!("server_tokens.ttl: {err}")))?;
        Ok(())
    }

    /// Converts token settings into the domain representation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the lifetime is out of range.
    pub fn token_settings(&self) -> Result<TokenSettings, ConfigError> {
        let ttl = self
            .server_tokens
            .ttl
            .map(chrono::Duration::from_std)
            .transpose()
            .map_err(|err| ConfigError::Invalid(format!("server_tokens.ttl: {err}")))?;
        Ok(TokenSettings {
            length: self.server_tokens.length,
            ttl,
        })
    }
}
