//! Shared test doubles and mock servers for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::Request,
    http::{request::Parts, StatusCode},
    middleware,
    response::{IntoResponse, Redirect, Response},
    Router,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use gatekeeper::config::FailurePolicy;
use gatekeeper::gate::{gatekeeper_middleware, GateError, GateResult, GateState, Gatekeeper, Identity};
use gatekeeper::routing::{InclusionFilter, ProtectedRoutes};
use gatekeeper::security::{AbuseShield, IdentityGate};

/// Shield double that counts calls.
#[derive(Debug, Default)]
pub struct StubShield {
    pub block: bool,
    pub fail: bool,
    pub calls: AtomicU32,
}

impl StubShield {
    pub fn allowing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn blocking() -> Arc<Self> {
        Arc::new(Self {
            block: true,
            ..Default::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AbuseShield for StubShield {
    async fn evaluate(&self, _req: &Parts) -> GateResult<Option<Response>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GateError::Shield("decision API returned 500".into()));
        }
        Ok(self
            .block
            .then(|| (StatusCode::FORBIDDEN, "blocked by shield").into_response()))
    }
}

/// Identity double returning a fixed identity and counting calls.
#[derive(Debug, Default)]
pub struct StubIdentity {
    pub user: Option<String>,
    pub fail: bool,
    pub calls: AtomicU32,
}

impl StubIdentity {
    pub fn anonymous() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn signed_in(user: &str) -> Arc<Self> {
        Arc::new(Self {
            user: Some(user.to_string()),
            ..Default::default()
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            ..Default::default()
        })
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityGate for StubIdentity {
    async fn resolve_identity(&self, _req: &Parts) -> GateResult<Option<Identity>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(GateError::Identity("verification returned 502".into()));
        }
        Ok(self.user.as_deref().map(Identity::new))
    }

    fn sign_in_redirect(&self, req: &Parts) -> Response {
        Redirect::temporary(&format!("/sign-in?redirect_url={}", req.uri.path())).into_response()
    }
}

pub fn stock_routes() -> ProtectedRoutes {
    ProtectedRoutes::new(["/dashboard(.*)", "/account(.*)", "/transaction(.*)"])
}

pub fn gate_state(
    shield: Option<Arc<StubShield>>,
    identity: Arc<dyn IdentityGate>,
    policy: FailurePolicy,
) -> GateState {
    let gatekeeper = Gatekeeper::new(
        shield.map(|s| s as Arc<dyn AbuseShield>),
        identity,
        stock_routes(),
        policy,
    );
    GateState::new(gatekeeper, InclusionFilter::default())
}

/// Router whose "next handler" reports the identity it was handed.
pub fn echo_app(gate: GateState) -> Router {
    Router::new()
        .fallback(echo_identity)
        .layer(middleware::from_fn_with_state(gate, gatekeeper_middleware))
}

async fn echo_identity(req: Request) -> String {
    match req.extensions().get::<Identity>() {
        Some(identity) => format!("next:{}", identity.user_id),
        None => "next:anonymous".to_string(),
    }
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Start a raw HTTP/1.1 backend answering "<path> <x-user-id or none>".
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 16 * 1024];
                let mut read = 0;
                loop {
                    let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    read += n;
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }

                let head = String::from_utf8_lossy(&buf[..read]).to_string();
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                let user = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("x-user-id")
                            .then(|| value.trim().to_string())
                    })
                    .unwrap_or_else(|| "none".to_string());

                let body = format!("{} {}", path, user);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}
