//! Upstream forwarding: the "continue" path of the gatekeeper.
//!
//! # Responsibilities
//! - Rewrite the URI to the upstream authority
//! - Pass the resolved identity upstream as `x-user-id`
//! - Strip client-supplied identity headers
//!
//! # Design Decisions
//! - Single attempt; the body is streamed, never buffered
//! - Upstream failures map to 502

use axum::{
    body::Body,
    extract::{Request, State},
    http::{
        uri::{Authority, PathAndQuery, Scheme},
        HeaderName, HeaderValue, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use hyper_util::client::legacy::{connect::HttpConnector, Client};

use crate::gate::Identity;
use crate::http::request::X_REQUEST_ID;

pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const X_SESSION_ID: HeaderName = HeaderName::from_static("x-session-id");

/// State for [`proxy_handler`].
#[derive(Clone)]
pub struct ProxyState {
    pub client: Client<HttpConnector, Body>,
    pub upstream: Authority,
}

/// Forward a request to the upstream with identity headers set from the gate.
pub async fn proxy_handler(State(state): State<ProxyState>, request: Request) -> Response {
    let (mut parts, body) = request.into_parts();

    let request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // Identity headers come from the gate only.
    parts.headers.remove(X_USER_ID);
    parts.headers.remove(X_SESSION_ID);
    if let Some(identity) = parts.extensions.get::<Identity>() {
        if let Ok(value) = HeaderValue::from_str(&identity.user_id) {
            parts.headers.insert(X_USER_ID, value);
        }
        if let Some(value) = identity
            .session_id
            .as_deref()
            .and_then(|s| HeaderValue::from_str(s).ok())
        {
            parts.headers.insert(X_SESSION_ID, value);
        }
    }

    let mut uri_parts = parts.uri.clone().into_parts();
    uri_parts.scheme = Some(Scheme::HTTP);
    uri_parts.authority = Some(state.upstream.clone());
    if uri_parts.path_and_query.is_none() {
        uri_parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    parts.uri = match Uri::from_parts(uri_parts) {
        Ok(uri) => uri,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Unforwardable URI");
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        uri = %parts.uri,
        "Forwarding request"
    );

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
