//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the gate and the upstream forwarder
//! - Wire up middleware (tracing, timeout, request ID, metrics)
//! - Bind server to listener
//! - Stop on the shutdown broadcast

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    http::uri::{Authority, InvalidUri},
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatekeeperConfig;
use crate::gate::{gatekeeper_middleware, GateState};
use crate::http::proxy::{proxy_handler, ProxyState};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::observability::metrics;

/// HTTP server fronting the upstream application.
pub struct HttpServer {
    router: Router,
    config: GatekeeperConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and gate.
    pub fn new(config: GatekeeperConfig, gate: GateState) -> Result<Self, InvalidUri> {
        let upstream = Authority::from_str(&config.upstream.address)?;
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        let router = build_router(&config, gate, ProxyState { client, upstream });
        Ok(Self { router, config })
    }

    /// The fully layered router, e.g. for driving with `tower::ServiceExt`.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.address,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatekeeperConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
///
/// `/healthz` is registered after the gate layer and is never gated.
#[allow(deprecated)]
pub fn build_router(config: &GatekeeperConfig, gate: GateState, proxy: ProxyState) -> Router {
    Router::new()
        .fallback(proxy_handler)
        .layer(middleware::from_fn_with_state(gate, gatekeeper_middleware))
        .route("/healthz", get(healthz))
        .with_state(proxy)
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(middleware::from_fn(track_requests))
        .layer(propagate_request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(set_request_id_layer())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn track_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let response = next.run(req).await;
    metrics::record_request(&method, response.status().as_u16(), start);
    response
}
