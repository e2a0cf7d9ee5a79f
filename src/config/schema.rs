//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gatekeeper.
//! All types derive Serde traits for deserialization from config files.
//! Defaults reproduce a stock deployment: shield on in LIVE mode, three
//! protected areas, and the standard static-asset filter.

use serde::{Deserialize, Serialize};

/// Root configuration for the gatekeeper.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Application that receives requests the gatekeeper lets through.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Abuse shield settings.
    pub shield: ShieldConfig,

    /// Identity gate settings.
    pub identity: IdentityConfig,

    /// Protected route definitions.
    pub routes: RoutesConfig,

    /// Which requests the gatekeeper runs for at all.
    pub filter: FilterConfig,

    /// Gate behaviour.
    pub gate: GateConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream address (e.g., "127.0.0.1:3000").
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Enforcement mode of a shield rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleMode {
    /// Denials are enforced.
    Live,
    /// Denials are logged only.
    DryRun,
}

/// Abuse shield configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShieldConfig {
    /// Run the shield stage before identity resolution.
    pub enabled: bool,

    /// Decision API endpoint.
    pub endpoint: String,

    /// Environment variable holding the access key.
    pub key_env: String,

    /// Mode of the generic attack-protection rule.
    pub shield_mode: RuleMode,

    /// Mode of the bot-detection rule.
    pub bot_mode: RuleMode,

    /// Bot identifiers or categories that are never blocked.
    pub allow_bots: Vec<String>,

    /// Decision call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ShieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://decide.shield.example.com/v1/decide".to_string(),
            key_env: "SHIELD_KEY".to_string(),
            shield_mode: RuleMode::Live,
            bot_mode: RuleMode::Live,
            allow_bots: vec![
                "CATEGORY:SEARCH_ENGINE".to_string(),
                "GO_HTTP".to_string(),
            ],
            timeout_ms: 1000,
        }
    }
}

/// Identity gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Session verification endpoint.
    pub verify_endpoint: String,

    /// Environment variable holding the backend secret key.
    pub secret_key_env: String,

    /// Cookie carrying the session token.
    pub session_cookie: String,

    /// Sign-in page users are redirected to.
    pub sign_in_url: String,

    /// Verification call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            verify_endpoint: "https://api.identity.example.com/v1/sessions/verify".to_string(),
            secret_key_env: "IDENTITY_SECRET_KEY".to_string(),
            session_cookie: "__session".to_string(),
            sign_in_url: "https://accounts.example.com/sign-in".to_string(),
            timeout_ms: 2000,
        }
    }
}

/// Protected route configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Path patterns requiring an identity. A trailing `(.*)` is optional.
    pub protected: Vec<String>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            protected: vec![
                "/dashboard(.*)".to_string(),
                "/account(.*)".to_string(),
                "/transaction(.*)".to_string(),
            ],
        }
    }
}

/// Inclusion filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Paths always gated, regardless of extension.
    pub always_prefixes: Vec<String>,

    /// Internal asset paths never gated.
    pub internal_prefixes: Vec<String>,

    /// Static-file extensions skipped unless the URL has a query string.
    pub static_extensions: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let exts = [
            "html", "htm", "css", "js", "jpg", "jpeg", "webp", "png", "gif", "svg", "ttf",
            "woff", "woff2", "ico", "csv", "doc", "docx", "xls", "xlsx", "zip", "webmanifest",
        ];
        Self {
            always_prefixes: vec!["/api".to_string(), "/trpc".to_string()],
            internal_prefixes: vec!["/_next".to_string()],
            static_extensions: exts.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// What to do when a collaborator fails unexpectedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and answer with a generic 500.
    #[default]
    Respond,
    /// Hand the error to the framework's error boundary.
    Propagate,
}

/// Gate behaviour.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GateConfig {
    pub failure_policy: FailurePolicy,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
