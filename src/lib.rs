//! Request gatekeeper library.
//!
//! Gates inbound requests through an optional abuse shield and an identity
//! gate before they reach the application. See [`gate`] for the decision
//! sequence and [`http`] for the reverse-proxy host.

pub mod config;
pub mod gate;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::GatekeeperConfig;
pub use gate::{Gatekeeper, GateDecision, GateError, Identity};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
