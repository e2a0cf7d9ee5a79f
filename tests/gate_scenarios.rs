//! End-to-end gate behaviour through the axum middleware.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use gatekeeper::config::{FailurePolicy, IdentityConfig};
use gatekeeper::security::SessionIdentityGate;
use std::sync::Arc;

mod common;
use common::{body_string, echo_app, gate_state, StubIdentity, StubShield};

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::HOST, "app.example.com")
        .header(header::USER_AGENT, "Mozilla/5.0")
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_anonymous_dashboard_redirects_to_sign_in() {
    let shield = StubShield::allowing();
    let identity = StubIdentity::anonymous();
    let app = echo_app(gate_state(
        Some(shield.clone()),
        identity.clone(),
        FailurePolicy::Respond,
    ));

    let response = app.oneshot(get("/dashboard/settings")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION],
        "/sign-in?redirect_url=/dashboard/settings"
    );
    assert_eq!(shield.calls(), 1);
    assert_eq!(identity.calls(), 1);
}

#[tokio::test]
async fn test_session_gate_redirect_preserves_destination() {
    // No session cookie: the real gate answers without any network call.
    let identity = Arc::new(
        SessionIdentityGate::new(&IdentityConfig::default(), "sk_test".into()).unwrap(),
    );
    let app = echo_app(gate_state(
        Some(StubShield::allowing()),
        identity,
        FailurePolicy::Respond,
    ));

    let response = app
        .oneshot(get("/transaction/42?step=confirm"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = response.headers()[header::LOCATION].to_str().unwrap();
    let location = url::Url::parse(location).unwrap();
    assert_eq!(location.path(), "/sign-in");
    let (_, back) = location
        .query_pairs()
        .find(|(k, _)| k == "redirect_url")
        .unwrap();
    assert_eq!(back, "http://app.example.com/transaction/42?step=confirm");
}

#[tokio::test]
async fn test_authenticated_account_continues() {
    let app = echo_app(gate_state(
        Some(StubShield::allowing()),
        StubIdentity::signed_in("user_2NNEqL2nrIRdJ194ndJqAHwEfxC"),
        FailurePolicy::Respond,
    ));

    let response = app.oneshot(get("/account/profile")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_string(response).await,
        "next:user_2NNEqL2nrIRdJ194ndJqAHwEfxC"
    );
}

#[tokio::test]
async fn test_shield_block_is_final() {
    let shield = StubShield::blocking();
    let identity = StubIdentity::signed_in("user_1");
    let app = echo_app(gate_state(
        Some(shield.clone()),
        identity.clone(),
        FailurePolicy::Respond,
    ));

    let response = app.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_string(response).await, "blocked by shield");
    assert_eq!(shield.calls(), 1);
    assert_eq!(identity.calls(), 0, "identity must not run after a block");
}

#[tokio::test]
async fn test_unprotected_api_continues_without_identity() {
    let app = echo_app(gate_state(
        Some(StubShield::allowing()),
        StubIdentity::anonymous(),
        FailurePolicy::Respond,
    ));

    let response = app.oneshot(get("/api/anything")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "next:anonymous");
}

#[tokio::test]
async fn test_identity_failure_never_continues() {
    for policy in [FailurePolicy::Respond, FailurePolicy::Propagate] {
        for path in ["/dashboard", "/login"] {
            let app = echo_app(gate_state(
                Some(StubShield::allowing()),
                StubIdentity::failing(),
                policy,
            ));

            let response = app.oneshot(get(path)).await.unwrap();

            assert_eq!(
                response.status(),
                StatusCode::INTERNAL_SERVER_ERROR,
                "{:?} {}",
                policy,
                path
            );
            let body = body_string(response).await;
            assert!(!body.starts_with("next:"), "{:?} {} continued", policy, path);
            assert!(!body.contains("502"), "error detail leaked: {}", body);
        }
    }
}

#[tokio::test]
async fn test_shield_failure_skips_identity() {
    let identity = StubIdentity::signed_in("user_1");
    let app = echo_app(gate_state(
        Some(StubShield::failing()),
        identity.clone(),
        FailurePolicy::Respond,
    ));

    let response = app.oneshot(get("/account")).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(identity.calls(), 0);
}

#[tokio::test]
async fn test_same_request_same_decision() {
    let app = echo_app(gate_state(
        Some(StubShield::allowing()),
        StubIdentity::anonymous(),
        FailurePolicy::Respond,
    ));

    let first = app.clone().oneshot(get("/dashboard/1")).await.unwrap();
    let second = app.oneshot(get("/dashboard/1")).await.unwrap();

    assert_eq!(first.status(), second.status());
    assert_eq!(
        first.headers()[header::LOCATION],
        second.headers()[header::LOCATION]
    );
}

#[tokio::test]
async fn test_disabled_shield_still_enforces_identity() {
    let app = echo_app(gate_state(
        None,
        StubIdentity::anonymous(),
        FailurePolicy::Respond,
    ));

    let response = app.clone().oneshot(get("/accounts")).await.unwrap();
    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

    let response = app.oneshot(get("/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_static_assets_bypass_gate() {
    let shield = StubShield::blocking();
    let identity = StubIdentity::anonymous();
    let app = echo_app(gate_state(
        Some(shield.clone()),
        identity.clone(),
        FailurePolicy::Respond,
    ));

    for uri in ["/_next/static/chunks/app.js", "/favicon.ico", "/fonts/inter.woff2"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }
    assert_eq!(shield.calls(), 0);
    assert_eq!(identity.calls(), 0);

    // A query string on a static path brings it back under the gate.
    let response = app.oneshot(get("/favicon.ico?v=2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(shield.calls(), 1);
}

#[tokio::test]
async fn test_shield_failure_propagated_skips_identity() {
    let shield = StubShield::failing();
    let identity = StubIdentity::signed_in("user_1");
    let app = echo_app(gate_state(
        Some(shield.clone()),
        identity.clone(),
        FailurePolicy::Propagate,
    ));

    let response = app.oneshot(get("/dashboard")).await.unwrap();

    assert!(!response.status().is_success(), "{}", response.status());
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_string(response).await;
    assert!(!body.starts_with("next:"));
    assert!(!body.contains("decision API"), "error detail leaked: {}", body);
    assert_eq!(shield.calls(), 1);
    assert_eq!(identity.calls(), 0);
}

#[tokio::test]
async fn test_disguised_protected_paths_redirect() {
    let cases = [
        ("/x/../dashboard", "/dashboard"),
        ("//dashboard", "/dashboard"),
        ("/%64ashboard", "/dashboard"),
        ("/./account", "/account"),
        ("/_next/../dashboard/settings", "/dashboard/settings"),
        ("/account//../transaction/7", "/transaction/7"),
    ];

    for (uri, canonical) in cases {
        let shield = StubShield::allowing();
        let identity = StubIdentity::anonymous();
        let app = echo_app(gate_state(
            Some(shield.clone()),
            identity.clone(),
            FailurePolicy::Respond,
        ));

        let response = app.oneshot(get(uri)).await.unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{}", uri);
        assert_eq!(
            response.headers()[header::LOCATION],
            format!("/sign-in?redirect_url={}", canonical).as_str(),
            "{}",
            uri
        );
        assert_eq!(shield.calls(), 1, "{} skipped the shield", uri);
        assert_eq!(identity.calls(), 1, "{} skipped identity", uri);
    }
}

#[tokio::test]
async fn test_disguised_path_reaches_next_in_canonical_form() {
    let app = echo_app(gate_state(
        Some(StubShield::allowing()),
        StubIdentity::signed_in("user_1"),
        FailurePolicy::Respond,
    ));

    let response = app.oneshot(get("/x/../account/profile")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "next:user_1");
}

#[tokio::test]
async fn test_encoded_separator_rejected() {
    let shield = StubShield::allowing();
    let identity = StubIdentity::anonymous();
    let app = echo_app(gate_state(
        Some(shield.clone()),
        identity.clone(),
        FailurePolicy::Respond,
    ));

    for uri in ["/%2Fdashboard", "/dash%2fboard", "/%5Cdashboard", "/a%zz"] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
    assert_eq!(shield.calls(), 0);
    assert_eq!(identity.calls(), 0);
}
