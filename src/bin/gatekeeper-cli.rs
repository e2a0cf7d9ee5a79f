//! Offline inspection of a gatekeeper configuration.
//!
//! `validate` checks a config file; `check <uri>` reports whether the
//! gate would run for a URI and whether the route is protected.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::json;

use gatekeeper::config::{load_config, GatekeeperConfig};
use gatekeeper::routing::{canonical_uri, InclusionFilter, ProtectedRoutes};

#[derive(Parser)]
#[command(name = "gatekeeper-cli")]
#[command(about = "Inspect a gatekeeper configuration offline", long_about = None)]
struct Cli {
    /// Configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate the configuration, then print a summary
    Validate,
    /// Show how a request URI would be treated
    Check {
        /// Path, optionally with a query string (e.g. "/dashboard?tab=1")
        uri: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatekeeperConfig::default(),
    };

    let summary = match cli.command {
        Commands::Validate => json!({
            "valid": true,
            "listener": config.listener.bind_address,
            "upstream": config.upstream.address,
            "shield": {
                "enabled": config.shield.enabled,
                "shield_mode": config.shield.shield_mode,
                "bot_mode": config.shield.bot_mode,
                "allow_bots": config.shield.allow_bots,
                "key_env": config.shield.key_env,
            },
            "identity_secret_env": config.identity.secret_key_env,
            "protected": config.routes.protected,
            "failure_policy": config.gate.failure_policy,
        }),
        Commands::Check { uri } => {
            let parsed: axum::http::Uri = uri.parse()?;
            let parsed = canonical_uri(&parsed)?.unwrap_or(parsed);
            let filter = InclusionFilter::from_config(&config.filter);
            let protected = ProtectedRoutes::new(config.routes.protected.iter().cloned());
            json!({
                "uri": uri,
                "path": parsed.path(),
                "gated": filter.includes(&parsed),
                "protected": protected.is_protected(parsed.path()),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
