//! Identity gate: session resolution and sign-in redirects.
//!
//! # Responsibilities
//! - Extract the session token (cookie first, then bearer header)
//! - Verify it against the identity service
//! - Build the "sign in, then come back here" redirect
//!
//! # Design Decisions
//! - No token means anonymous without a network call
//! - A rejected token (401/404) is anonymous, not an error
//! - Any other failure is an error; callers never treat it as a session

use std::time::Duration;

use async_trait::async_trait;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;
use url::Url;

use crate::config::IdentityConfig;
use crate::gate::types::{GateError, GateResult, Identity, Service};

/// Query parameter carrying the return-to URL on sign-in redirects.
pub const REDIRECT_PARAM: &str = "redirect_url";

/// Session resolution capability.
#[async_trait]
pub trait IdentityGate: Send + Sync + std::fmt::Debug {
    /// Resolve the caller's identity; `None` means unauthenticated.
    async fn resolve_identity(&self, req: &Parts) -> GateResult<Option<Identity>>;

    /// Redirect to sign-in, preserving the original destination.
    fn sign_in_redirect(&self, req: &Parts) -> Response;
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    token: &'a str,
}

/// Identity gate backed by a remote session verification endpoint.
#[derive(Debug, Clone)]
pub struct SessionIdentityGate {
    client: reqwest::Client,
    verify_endpoint: String,
    secret_key: String,
    session_cookie: String,
    sign_in_url: Url,
}

impl SessionIdentityGate {
    /// Build the gate with its own HTTP client and parsed sign-in URL.
    pub fn new(config: &IdentityConfig, secret_key: String) -> Result<Self, SetupError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        let sign_in_url = Url::parse(&config.sign_in_url)?;

        Ok(Self {
            client,
            verify_endpoint: config.verify_endpoint.clone(),
            secret_key,
            session_cookie: config.session_cookie.clone(),
            sign_in_url,
        })
    }

    fn session_token<'a>(&self, req: &'a Parts) -> Option<&'a str> {
        session_cookie(req, &self.session_cookie).or_else(|| bearer_token(req))
    }
}

/// Errors building a [`SessionIdentityGate`].
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("sign-in URL: {0}")]
    SignInUrl(#[from] url::ParseError),
}

#[async_trait]
impl IdentityGate for SessionIdentityGate {
    async fn resolve_identity(&self, req: &Parts) -> GateResult<Option<Identity>> {
        let Some(token) = self.session_token(req) else {
            return Ok(None);
        };

        let response = self
            .client
            .post(&self.verify_endpoint)
            .bearer_auth(&self.secret_key)
            .json(&VerifyRequest { token })
            .send()
            .await
            .map_err(|source| GateError::Unreachable {
                service: Service::Identity,
                source,
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::NOT_FOUND => {
                tracing::debug!(path = %req.uri.path(), "Session token rejected");
                Ok(None)
            }
            status if status.is_success() => {
                let identity = response
                    .json::<Identity>()
                    .await
                    .map_err(|e| GateError::Identity(format!("undecodable session: {}", e)))?;
                Ok(Some(identity))
            }
            status => Err(GateError::Identity(format!(
                "verification returned {}",
                status
            ))),
        }
    }

    fn sign_in_redirect(&self, req: &Parts) -> Response {
        let mut target = self.sign_in_url.clone();
        target
            .query_pairs_mut()
            .append_pair(REDIRECT_PARAM, &return_url(req));
        Redirect::temporary(target.as_str()).into_response()
    }
}

fn header_str<'a>(req: &'a Parts, name: &str) -> Option<&'a str> {
    req.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Find `name` among all `Cookie` headers.
fn session_cookie<'a>(req: &'a Parts, name: &str) -> Option<&'a str> {
    req.headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .map(|(key, value)| (key, value.trim()))
        .filter(|(_, value)| !value.is_empty())
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn bearer_token(req: &Parts) -> Option<&str> {
    header_str(req, header::AUTHORIZATION.as_str())
        .and_then(|v| v.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
}

/// Absolute URL of the original request, as the client saw it.
fn return_url(req: &Parts) -> String {
    let path_and_query = req
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let host = header_str(req, "x-forwarded-host")
        .or_else(|| header_str(req, header::HOST.as_str()))
        .or_else(|| req.uri.authority().map(|a| a.as_str()));

    let Some(host) = host else {
        return path_and_query.to_string();
    };

    let scheme = header_str(req, "x-forwarded-proto")
        .or_else(|| req.uri.scheme_str())
        .unwrap_or("http");

    format!("{}://{}{}", scheme, host, path_and_query)
}
