//! Request identification.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) as early as possible
//! - Echo it on the response
//! - Expose it to log statements further down
//!
//! # Design Decisions
//! - An ID supplied by a trusted front proxy is kept, not replaced
//! - Missing or non-UTF-8 IDs log as "unknown"

use axum::http::request::Parts;
use axum::http::HeaderName;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Layer assigning an `x-request-id` to every request lacking one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID), MakeRequestUuid)
}

/// Layer copying the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(HeaderName::from_static(X_REQUEST_ID))
}

/// The request ID of `req`, for logging.
pub fn request_id(req: &Parts) -> &str {
    req.headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_request_id_lookup() {
        let (parts, _) = Request::builder()
            .header(X_REQUEST_ID, "abc-123")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(request_id(&parts), "abc-123");

        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert_eq!(request_id(&parts), "unknown");
    }
}
