//! The request gatekeeper.
//!
//! Runs the abuse shield (if configured) strictly before the identity gate,
//! then applies the failure policy uniformly to whatever either raised.

use std::sync::Arc;

use axum::http::request::Parts;

use crate::config::FailurePolicy;
use crate::gate::types::{GateDecision, GateResult, Verdict};
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::routing::ProtectedRoutes;
use crate::security::{AbuseShield, IdentityGate};

/// Two-stage request gate. Cheap to clone; all state is shared read-only.
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    shield: Option<Arc<dyn AbuseShield>>,
    identity: Arc<dyn IdentityGate>,
    protected: Arc<ProtectedRoutes>,
    policy: FailurePolicy,
}

impl Gatekeeper {
    /// Create a gatekeeper; `None` disables the shield stage.
    pub fn new(
        shield: Option<Arc<dyn AbuseShield>>,
        identity: Arc<dyn IdentityGate>,
        protected: ProtectedRoutes,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            shield,
            identity,
            protected: Arc::new(protected),
            policy,
        }
    }

    /// Whether the shield stage runs.
    pub fn shield_enabled(&self) -> bool {
        self.shield.is_some()
    }

    /// Failure policy applied by [`handle`](Self::handle).
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Routes that require an identity.
    pub fn protected_routes(&self) -> &ProtectedRoutes {
        &self.protected
    }

    /// Decide the fate of one request. Errors are returned untouched.
    pub async fn evaluate(&self, req: &Parts) -> GateResult<GateDecision> {
        // 1. Abuse shield. A block is final.
        if let Some(shield) = &self.shield {
            if let Some(response) = shield.evaluate(req).await? {
                return Ok(GateDecision::ShortCircuit {
                    verdict: Verdict::ShieldBlocked,
                    response,
                });
            }
        }

        // 2. Identity
        let identity = self.identity.resolve_identity(req).await?;
        if identity.is_none() && self.protected.is_protected(req.uri.path()) {
            return Ok(GateDecision::ShortCircuit {
                verdict: Verdict::SignInRequired,
                response: self.identity.sign_in_redirect(req),
            });
        }

        // 3. Continue
        Ok(GateDecision::Allow(identity))
    }

    /// [`evaluate`](Self::evaluate) with the failure policy applied.
    ///
    /// Under [`FailurePolicy::Respond`] a collaborator error becomes a
    /// generic 500 decision; under [`FailurePolicy::Propagate`] it is
    /// returned to the caller. Neither path yields `Allow`.
    pub async fn handle(&self, req: &Parts) -> GateResult<GateDecision> {
        let decision = match self.evaluate(req).await {
            Ok(decision) => decision,
            Err(e) => {
                metrics::record_failure(e.service().as_str());
                match self.policy {
                    FailurePolicy::Propagate => return Err(e),
                    FailurePolicy::Respond => {
                        tracing::error!(
                            request_id = %request_id(req),
                            method = %req.method,
                            path = %req.uri.path(),
                            service = %e.service(),
                            error = %e,
                            "Gatekeeper failure"
                        );
                        GateDecision::failed()
                    }
                }
            }
        };

        tracing::debug!(
            request_id = %request_id(req),
            path = %req.uri.path(),
            outcome = decision.outcome(),
            "Gate decision"
        );
        metrics::record_decision(decision.outcome());
        Ok(decision)
    }
}
