#![allow(clippy::unwrap_used)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use handoff::{
    api::{self, AuthError, Authenticator},
    handoff::{HandshakeConfig, HandshakeCoordinator},
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tower::ServiceExt;

/// Accepts any token starting with `sess-`.
struct PrefixAuthenticator;

#[async_trait]
impl Authenticator for PrefixAuthenticator {
    async fn verify(&self, token: &str) -> Result<Option<String>, AuthError> {
        if token.starts_with("sess-") {
            Ok(Some(format!("user-{token}")))
        } else {
            Err(AuthError::Rejected)
        }
    }
}

fn app(config: HandshakeConfig) -> (Router, Arc<HandshakeCoordinator>) {
    let coordinator = Arc::new(HandshakeCoordinator::with_defaults(config));
    let router = api::router(coordinator.clone(), Arc::new(PrefixAuthenticator));
    (router, coordinator)
}

fn default_app() -> Router {
    app(HandshakeConfig::new()).0
}

async fn get(app: &Router, uri: &str, session: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().uri(uri);
    if let Some(token) = session {
        request = request.header("x-session", token);
    }
    let response = app
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn issue(app: &Router) -> String {
    let (status, body) = get(app, "/login/code", None).await;
    assert_eq!(status, StatusCode::OK);
    body["code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn confirmed_session_reaches_polling_desktop() {
    let app = default_app();
    let code = issue(&app).await;
    assert_eq!(code.len(), 8);

    let poll_app = app.clone();
    let poll_uri = format!("/login/code/{code}/poll");
    let poll = tokio::spawn(async move { get(&poll_app, &poll_uri, None).await });

    tokio::time::sleep(Duration::from_millis(100)).await;

    let confirm_uri = format!("/login/code/{}/confirm", code.to_lowercase());
    let (status, body) = get(&app, &confirm_uri, Some("sess-42")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));

    let (status, body) = poll.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "credential": "sess-42" }));

    let (status, body) = get(&app, &confirm_uri, Some("sess-99")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "already_resolved");
}

#[tokio::test]
async fn bearer_token_is_accepted_for_confirm() {
    let app = default_app();
    let code = issue(&app).await;

    let request = Request::builder()
        .uri(format!("/login/code/{code}/confirm"))
        .header("authorization", "Bearer sess-7")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = get(&app, &format!("/login/code/{code}/poll"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["credential"], "sess-7");
}

#[tokio::test]
async fn confirm_requires_verified_session() {
    let app = default_app();
    let code = issue(&app).await;
    let uri = format!("/login/code/{code}/confirm");

    let (status, body) = get(&app, &uri, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthenticated");

    let (status, _) = get(&app, &uri, Some("forged")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The code is still usable after rejected attempts.
    let (status, _) = get(&app, &uri, Some("sess-1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_and_malformed_codes() {
    let app = default_app();

    let (status, body) = get(&app, "/login/code/ZZZZ2222/poll", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_code");

    let (status, body) = get(&app, "/login/code/ZZZZ2222/confirm", Some("sess-1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "unknown_code");

    let (status, body) = get(&app, "/login/code/AB/poll", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_code");

    let (status, _) = get(&app, "/login/code/AB/confirm", Some("sess-1")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn unconfirmed_code_times_out_then_expires() {
    let app = default_app();
    let code = issue(&app).await;
    let poll_uri = format!("/login/code/{code}/poll");

    let started = tokio::time::Instant::now();
    let (status, body) = get(&app, &poll_uri, None).await;
    let waited = started.elapsed();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "timedOut": true }));
    assert!(waited >= Duration::from_secs(10));
    assert!(waited < Duration::from_secs(11));

    tokio::time::sleep(Duration::from_secs(1)).await;

    let (status, body) = get(&app, &format!("/login/code/{code}/confirm"), Some("sess-42")).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], "code_expired");

    let (status, body) = get(&app, &poll_uri, None).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body, json!({ "expired": true }));
}

#[tokio::test(start_paused = true)]
async fn poll_started_after_issue_times_out_instead_of_expiring() {
    let app = default_app();
    let code = issue(&app).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let poll_uri = format!("/login/code/{code}/poll");
    let started = tokio::time::Instant::now();
    let (status, body) = get(&app, &poll_uri, None).await;
    let waited = started.elapsed();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "timedOut": true }));
    assert!(waited >= Duration::from_millis(9_800));
    assert!(waited <= Duration::from_secs(10));

    let (status, body) = get(&app, &format!("/login/code/{code}/confirm"), Some("sess-42")).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["error"], "code_expired");

    let (status, body) = get(&app, &poll_uri, None).await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body, json!({ "expired": true }));
}

#[tokio::test]
async fn health_reports_tracked_codes() {
    let (app, coordinator) = app(HandshakeConfig::new());
    issue(&app).await;
    issue(&app).await;

    let (status, body) = get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "handoff");
    assert_eq!(body["codes"], 2);
    assert_eq!(coordinator.store().len().await, 2);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = default_app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let request_id = response.headers().get("x-request-id").unwrap();
    assert_eq!(request_id.len(), 26);
}

#[tokio::test]
async fn serves_openapi_document() {
    let app = default_app();
    let (status, body) = get(&app, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/login/code/{code}/poll"].is_object());
}
