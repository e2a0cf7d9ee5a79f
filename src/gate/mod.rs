//! Request gate subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → middleware.rs (inclusion filter; skip static assets)
//!     → gatekeeper.rs
//!         → AbuseShield::evaluate      (optional; block ends here)
//!         → IdentityGate::resolve_identity
//!         → protected route && anonymous → IdentityGate::sign_in_redirect
//!     → Allow: Identity in extensions, next handler runs
//! ```
//!
//! # Design Decisions
//! - One code path; the shield stage is toggled by config
//! - No retries and no extra timeouts around collaborator calls
//! - Decisions are per request and never cached

pub mod gatekeeper;
pub mod middleware;
pub mod types;

pub use gatekeeper::Gatekeeper;
pub use middleware::{gatekeeper_middleware, GateState};
pub use types::{GateDecision, GateError, GateResult, Identity, Service, Verdict};
