//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatekeeperConfig (validated, immutable)
//!
//! environment
//!     → loader.rs Secrets (shield key, identity secret)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A missing secret is a startup error, never a silently disabled stage

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError, Secrets};
pub use schema::{
    FailurePolicy, FilterConfig, GatekeeperConfig, IdentityConfig, ListenerConfig, RuleMode,
    ShieldConfig,
};
