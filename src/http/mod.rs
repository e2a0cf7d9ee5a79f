//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (request ID)
//!     → [gate decides: block / redirect / error / continue]
//!     → proxy.rs (continue: forward to upstream)
//!     → Send to client
//! ```

pub mod proxy;
pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::HttpServer;
