//! Abuse shield: bot and attack protection consulted before identity.
//!
//! # Responsibilities
//! - Describe the complete request (method, path, query, headers, peer) to
//!   the decision service
//! - Apply rule modes locally: LIVE denials block, DRY_RUN denials are logged
//! - Turn a denial into a finished block response
//!
//! # Security Constraints
//! - The access key comes only from the environment
//! - Credential headers are sent redacted
//! - Any transport or decoding failure is an error, never an allow

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ConnectInfo;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config::{RuleMode, ShieldConfig};
use crate::gate::types::{GateError, GateResult, Service};

/// Header carrying the decision id on block responses.
pub const DECISION_ID_HEADER: &str = "x-shield-decision-id";

const REDACTED_HEADERS: &[&str] = &["cookie", "authorization", "proxy-authorization"];

/// Request classification capability.
#[async_trait]
pub trait AbuseShield: Send + Sync + std::fmt::Debug {
    /// `None` means no objection; `Some` is the block response to send.
    async fn evaluate(&self, req: &Parts) -> GateResult<Option<Response>>;
}

#[derive(Debug, Serialize)]
struct RequestDescriptor {
    method: String,
    path: String,
    query: Option<String>,
    headers: BTreeMap<String, String>,
    ip: Option<String>,
}

impl RequestDescriptor {
    fn from_parts(req: &Parts) -> Self {
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in &req.headers {
            let key = name.as_str();
            let value = if REDACTED_HEADERS.contains(&key) {
                "<redacted>".to_string()
            } else {
                String::from_utf8_lossy(value.as_bytes()).into_owned()
            };
            match headers.get_mut(key) {
                Some(existing) => {
                    existing.push_str(", ");
                    existing.push_str(&value);
                }
                None => {
                    headers.insert(key.to_string(), value);
                }
            }
        }

        Self {
            method: req.method.to_string(),
            path: req.uri.path().to_string(),
            query: req.uri.query().map(str::to_string),
            headers,
            ip: req
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
enum Rule {
    Shield { mode: RuleMode },
    DetectBot { mode: RuleMode, allow: Vec<String> },
}

#[derive(Debug, Serialize)]
struct DecideRequest<'a> {
    request: RequestDescriptor,
    rules: &'a [Rule],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum Conclusion {
    Allow,
    Deny,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum ReasonKind {
    Shield,
    Bot,
    RateLimit,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct Reason {
    kind: ReasonKind,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Decision {
    #[serde(default)]
    id: Option<String>,
    conclusion: Conclusion,
    #[serde(default)]
    reason: Option<Reason>,
}

/// Client for a remote shield decision API.
#[derive(Debug, Clone)]
pub struct RemoteShield {
    client: reqwest::Client,
    endpoint: String,
    key: String,
    rules: Vec<Rule>,
    shield_mode: RuleMode,
    bot_mode: RuleMode,
}

impl RemoteShield {
    pub fn new(config: &ShieldConfig, key: String) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        let rules = vec![
            Rule::Shield {
                mode: config.shield_mode,
            },
            Rule::DetectBot {
                mode: config.bot_mode,
                allow: config.allow_bots.clone(),
            },
        ];

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            key,
            rules,
            shield_mode: config.shield_mode,
            bot_mode: config.bot_mode,
        })
    }

    fn mode_for(&self, kind: ReasonKind) -> RuleMode {
        match kind {
            ReasonKind::Shield => self.shield_mode,
            ReasonKind::Bot => self.bot_mode,
            ReasonKind::RateLimit | ReasonKind::Other => RuleMode::Live,
        }
    }

    async fn decide(&self, req: &Parts) -> GateResult<Decision> {
        let payload = DecideRequest {
            request: RequestDescriptor::from_parts(req),
            rules: &self.rules,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.key)
            .json(&payload)
            .send()
            .await
            .map_err(|source| GateError::Unreachable {
                service: Service::Shield,
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(GateError::Shield(format!("decision API returned {}", status)));
        }

        response
            .json::<Decision>()
            .await
            .map_err(|e| GateError::Shield(format!("undecodable decision: {}", e)))
    }
}

#[async_trait]
impl AbuseShield for RemoteShield {
    async fn evaluate(&self, req: &Parts) -> GateResult<Option<Response>> {
        let decision = self.decide(req).await?;

        match decision.conclusion {
            Conclusion::Allow => Ok(None),
            Conclusion::Error => {
                let detail = decision
                    .reason
                    .and_then(|r| r.message)
                    .unwrap_or_else(|| "unspecified".to_string());
                Err(GateError::Shield(format!("decision error: {}", detail)))
            }
            Conclusion::Deny => {
                let kind = decision
                    .reason
                    .as_ref()
                    .map(|r| r.kind)
                    .unwrap_or(ReasonKind::Other);

                if self.mode_for(kind) == RuleMode::DryRun {
                    tracing::warn!(
                        path = %req.uri.path(),
                        reason = ?kind,
                        decision_id = ?decision.id,
                        "Shield denial ignored (dry run)"
                    );
                    return Ok(None);
                }

                tracing::info!(
                    path = %req.uri.path(),
                    reason = ?kind,
                    decision_id = ?decision.id,
                    "Shield blocked request"
                );
                Ok(Some(block_response(kind, decision.id.as_deref())))
            }
        }
    }
}

fn block_response(kind: ReasonKind, decision_id: Option<&str>) -> Response {
    let status = match kind {
        ReasonKind::RateLimit => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::FORBIDDEN,
    };
    let message = status.canonical_reason().unwrap_or("Forbidden");

    let mut response = (status, Json(serde_json::json!({ "error": message }))).into_response();
    if let Some(value) = decision_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        response.headers_mut().insert(DECISION_ID_HEADER, value);
    }
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
