//! Startup orchestration.
//!
//! # Responsibilities
//! - Read collaborator secrets from the environment
//! - Build the shield and identity clients
//! - Assemble the gate state handed to the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The shield is built only when enabled; a disabled shield needs no key

use std::sync::Arc;

use thiserror::Error;

use crate::config::{ConfigError, GatekeeperConfig, Secrets};
use crate::gate::{GateState, Gatekeeper};
use crate::routing::{InclusionFilter, ProtectedRoutes};
use crate::security::identity::SetupError;
use crate::security::{AbuseShield, RemoteShield, SessionIdentityGate};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("shield client: {0}")]
    Shield(#[source] reqwest::Error),

    #[error("identity gate: {0}")]
    Identity(#[from] SetupError),
}

/// Build the gatekeeper from a validated config and its secrets.
pub fn build_gatekeeper(
    config: &GatekeeperConfig,
    secrets: Secrets,
) -> Result<Gatekeeper, StartupError> {
    let shield: Option<Arc<dyn AbuseShield>> = if config.shield.enabled {
        let key = secrets.shield_key.ok_or_else(|| ConfigError::MissingSecret {
            var: config.shield.key_env.clone(),
        })?;
        let shield = RemoteShield::new(&config.shield, key).map_err(StartupError::Shield)?;
        tracing::info!(
            endpoint = %config.shield.endpoint,
            shield_mode = ?config.shield.shield_mode,
            bot_mode = ?config.shield.bot_mode,
            allow_bots = ?config.shield.allow_bots,
            "Abuse shield enabled"
        );
        Some(Arc::new(shield) as Arc<dyn AbuseShield>)
    } else {
        tracing::warn!("Abuse shield disabled by configuration");
        None
    };

    let identity = Arc::new(SessionIdentityGate::new(
        &config.identity,
        secrets.identity_secret,
    )?);

    let protected = ProtectedRoutes::new(config.routes.protected.iter().cloned());
    tracing::info!(
        protected = ?protected.prefixes().collect::<Vec<_>>(),
        failure_policy = ?config.gate.failure_policy,
        "Gatekeeper configured"
    );

    Ok(Gatekeeper::new(
        shield,
        identity,
        protected,
        config.gate.failure_policy,
    ))
}

/// Load secrets from the environment and build the full gate state.
pub fn build_gate_state(config: &GatekeeperConfig) -> Result<GateState, StartupError> {
    let secrets = Secrets::from_env(config)?;
    let gatekeeper = build_gatekeeper(config, secrets)?;
    Ok(GateState::new(
        gatekeeper,
        InclusionFilter::from_config(&config.filter),
    ))
}
