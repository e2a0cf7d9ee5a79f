//! Security subsystem: the two collaborators consulted by the gate.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → shield.rs (bot / attack classification, may block)
//!     → identity.rs (session resolution, sign-in redirect)
//!     → Pass to next handler
//! ```
//!
//! # Design Decisions
//! - Both collaborators are traits so they can be swapped for test doubles
//! - Fail closed: a collaborator error never lets a request through
//! - No trust in client input

pub mod identity;
pub mod shield;

pub use identity::{IdentityGate, SessionIdentityGate};
pub use shield::{AbuseShield, RemoteShield};
