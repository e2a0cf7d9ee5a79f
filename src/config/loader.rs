//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatekeeperConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),

    #[error("missing secret: environment variable {var} is not set")]
    MissingSecret { var: String },
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatekeeperConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GatekeeperConfig, ConfigError> {
    let config: GatekeeperConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Credentials for the two collaborators.
///
/// Never logged; `Debug` is redacted.
#[derive(Clone)]
pub struct Secrets {
    pub shield_key: Option<String>,
    pub identity_secret: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("shield_key", &self.shield_key.as_ref().map(|_| "<redacted>"))
            .field("identity_secret", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    /// Read secrets from the process environment.
    pub fn from_env(config: &GatekeeperConfig) -> Result<Self, ConfigError> {
        Self::from_lookup(config, |var| std::env::var(var).ok())
    }

    /// Read secrets through `lookup`. Empty values count as missing.
    pub fn from_lookup<F>(config: &GatekeeperConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |var: &str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingSecret { var: var.to_string() })
        };

        let shield_key = if config.shield.enabled {
            Some(fetch(&config.shield.key_env)?)
        } else {
            None
        };
        let identity_secret = fetch(&config.identity.secret_key_env)?;

        Ok(Self {
            shield_key,
            identity_secret,
        })
    }
}
