//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → normalize.rs (canonical path; dot-segments, `//`, escapes)
//!     → filter.rs (does the gatekeeper run for this request?)
//!     → matcher.rs (is the path a protected route?)
//!
//! Route Compilation (at startup):
//!     RoutesConfig.protected
//!     → strip `(.*)` suffixes
//!     → Freeze as immutable ProtectedRoutes
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same path always yields the same answer

pub mod filter;
pub mod matcher;
pub mod normalize;

pub use filter::InclusionFilter;
pub use matcher::{Matcher, PathPrefixMatcher, ProtectedRoutes};
pub use normalize::{canonical_path, canonical_uri, PathError};
