//! Request gatekeeper.
//!
//! Runs in front of an upstream application as a gating reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                     GATEKEEPER                       │
//!   Request       │  ┌──────────┐   ┌────────┐   ┌──────────┐            │
//!   ──────────────┼─▶│ inclusion│──▶│ abuse  │──▶│ identity │──┐         │
//!                 │  │  filter  │   │ shield │   │   gate   │  │         │
//!                 │  └────┬─────┘   └───┬────┘   └────┬─────┘  │         │
//!                 │       │ skip        │ block       │ redirect│ allow  │
//!                 │       ▼             ▼             ▼         ▼        │
//!   Response      │  ┌────────────────────────────────────────────────┐  │   Upstream
//!   ◀─────────────┼──│        response / upstream forwarder           │◀─┼── App
//!                 │  └────────────────────────────────────────────────┘  │
//!                 └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use gatekeeper::config::{load_config, GatekeeperConfig};
use gatekeeper::http::HttpServer;
use gatekeeper::lifecycle::{build_gate_state, signals::shutdown_signal, Shutdown};
use gatekeeper::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "gatekeeper")]
#[command(about = "Gate requests through an abuse shield and an identity gate", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long, env = "GATEKEEPER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatekeeperConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!("gatekeeper v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        shield_enabled = config.shield.enabled,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let gate = match build_gate_state(&config) {
        Ok(gate) => gate,
        Err(e) => {
            tracing::error!(error = %e, "Refusing to start");
            return Err(e.into());
        }
    };

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    let server = HttpServer::new(config, gate)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
