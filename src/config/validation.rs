//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check protected patterns and filter prefixes are absolute paths
//! - Check collaborator endpoints are usable URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatekeeperConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatekeeperConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field}: invalid URL '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field}: '{value}' must start with '/'")]
    NotAbsolutePath { field: &'static str, value: String },

    #[error("{field}: must be greater than zero")]
    Zero { field: &'static str },

    #[error("routes.protected: at least one pattern is required")]
    NoProtectedRoutes,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatekeeperConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_addr(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_addr(&mut errors, "upstream.address", &config.upstream.address);
    if config.observability.metrics_enabled {
        check_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero { field: "timeouts.request_secs" });
    }

    if config.shield.enabled {
        check_url(&mut errors, "shield.endpoint", &config.shield.endpoint);
        if config.shield.timeout_ms == 0 {
            errors.push(ValidationError::Zero { field: "shield.timeout_ms" });
        }
    }

    check_url(&mut errors, "identity.verify_endpoint", &config.identity.verify_endpoint);
    check_url(&mut errors, "identity.sign_in_url", &config.identity.sign_in_url);
    if config.identity.timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "identity.timeout_ms" });
    }

    if config.routes.protected.is_empty() {
        errors.push(ValidationError::NoProtectedRoutes);
    }
    for pattern in &config.routes.protected {
        check_path(&mut errors, "routes.protected", pattern);
    }
    for prefix in &config.filter.always_prefixes {
        check_path(&mut errors, "filter.always_prefixes", prefix);
    }
    for prefix in &config.filter.internal_prefixes {
        check_path(&mut errors, "filter.internal_prefixes", prefix);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}

fn check_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if url::Url::parse(value).is_err() {
        errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        });
    }
}

fn check_path(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if !value.starts_with('/') {
        errors.push(ValidationError::NotAbsolutePath {
            field,
            value: value.to_string(),
        });
    }
}
