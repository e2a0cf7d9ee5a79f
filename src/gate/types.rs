//! Gate decision types and error definitions.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A resolved user identity. Attached to request extensions on Allow.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl Identity {
    /// Identity without a session id.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: None,
        }
    }
}

/// Why a request was stopped at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The abuse shield vetoed the request.
    ShieldBlocked,
    /// No identity on a protected route.
    SignInRequired,
    /// A collaborator failed and the failure was answered locally.
    Failed,
}

impl Verdict {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::ShieldBlocked => "shield_blocked",
            Verdict::SignInRequired => "sign_in_required",
            Verdict::Failed => "failed",
        }
    }
}

/// Outcome of one gate evaluation. Never cached across requests.
#[derive(Debug)]
pub enum GateDecision {
    /// Continue to the next handler.
    Allow(Option<Identity>),
    /// Answer the client with `response`; no further handler runs.
    ShortCircuit { verdict: Verdict, response: Response },
}

impl GateDecision {
    /// `allow` or the short-circuit verdict label.
    pub fn outcome(&self) -> &'static str {
        match self {
            GateDecision::Allow(Some(_)) => "allow_authenticated",
            GateDecision::Allow(None) => "allow_anonymous",
            GateDecision::ShortCircuit { verdict, .. } => verdict.as_str(),
        }
    }

    /// Whether the request continues to the next handler.
    pub fn is_allow(&self) -> bool {
        matches!(self, GateDecision::Allow(_))
    }

    /// Generic failure answer that leaks nothing about the cause.
    pub fn failed() -> Self {
        GateDecision::ShortCircuit {
            verdict: Verdict::Failed,
            response: (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response(),
        }
    }
}

/// Which collaborator an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Shield,
    Identity,
}

impl Service {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Shield => "shield",
            Service::Identity => "identity",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the gate's collaborators.
#[derive(Debug, Error)]
pub enum GateError {
    /// The abuse shield answered with something unusable.
    #[error("shield error: {0}")]
    Shield(String),

    /// The identity service answered with something unusable.
    #[error("identity error: {0}")]
    Identity(String),

    /// A collaborator could not be reached.
    #[error("{service} unreachable: {source}")]
    Unreachable {
        service: Service,
        #[source]
        source: reqwest::Error,
    },
}

impl GateError {
    /// Collaborator that produced the error.
    pub fn service(&self) -> Service {
        match self {
            GateError::Shield(_) => Service::Shield,
            GateError::Identity(_) => Service::Identity,
            GateError::Unreachable { service, .. } => *service,
        }
    }
}

/// Framework error boundary: generic body, detail stays in the logs.
impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        tracing::error!(service = %self.service(), error = %self, "Gate error reached error boundary");
        let status = match self {
            GateError::Unreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = status.canonical_reason().unwrap_or("Error");
        (status, body).into_response()
    }
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;
