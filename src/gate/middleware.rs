//! Axum middleware wiring the gatekeeper into a router.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::gate::gatekeeper::Gatekeeper;
use crate::gate::types::{GateDecision, GateError};
use crate::routing::{canonical_uri, InclusionFilter};

/// State required by [`gatekeeper_middleware`].
#[derive(Debug, Clone)]
pub struct GateState {
    pub gatekeeper: Arc<Gatekeeper>,
    pub filter: Arc<InclusionFilter>,
}

impl GateState {
    /// Wrap a gatekeeper and its inclusion filter for sharing across requests.
    pub fn new(gatekeeper: Gatekeeper, filter: InclusionFilter) -> Self {
        Self {
            gatekeeper: Arc::new(gatekeeper),
            filter: Arc::new(filter),
        }
    }
}

/// Gate every included request; attach the identity on Allow.
///
/// The path is canonicalized first and the rewritten URI is what the
/// filter, the matcher and the upstream see. Paths that cannot be
/// canonicalized are answered with 400.
///
/// An `Err` here only happens under the propagate policy and is rendered
/// by `GateError`'s `IntoResponse`.
pub async fn gatekeeper_middleware(
    State(state): State<GateState>,
    req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let (mut parts, body) = req.into_parts();

    match canonical_uri(&parts.uri) {
        Ok(Some(uri)) => {
            tracing::debug!(from = %parts.uri.path(), to = %uri.path(), "Canonicalized request path");
            parts.uri = uri;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Rejected request path");
            return Ok((StatusCode::BAD_REQUEST, "Bad Request").into_response());
        }
    }

    if !state.filter.includes(&parts.uri) {
        return Ok(next.run(Request::from_parts(parts, body)).await);
    }

    match state.gatekeeper.handle(&parts).await? {
        GateDecision::Allow(identity) => {
            if let Some(identity) = identity {
                parts.extensions.insert(identity);
            }
            Ok(next.run(Request::from_parts(parts, body)).await)
        }
        GateDecision::ShortCircuit { response, .. } => Ok(response),
    }
}
