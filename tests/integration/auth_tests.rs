//! Authentication integration tests.
//!
//! Tests verify:
//! - Bearer tokens: valid, expired, tampered, wrong secret, unknown user
//! - Session cookies: valid, unknown, after logout
//! - Token precedence over cookies

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use signage_api::auth::TokenSigner;
use signage_api::server::THUMBNAIL_ROUTE;

use super::test_utils::{body_json, thumb_request, Cred, TestApp, SECRET};

const QUERY: &str = "id=S1&name=logo.png";

async fn status_for(app: &TestApp, cred: Cred) -> StatusCode {
    app.router
        .clone()
        .oneshot(thumb_request(QUERY, cred))
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_valid_token() {
    let app = TestApp::new();
    let token = app.token_for("editor");
    assert_eq!(status_for(&app, Cred::Bearer(token)).await, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token() {
    let app = TestApp::new();
    let token = TokenSigner::new(SECRET)
        .issue_with_expiry("editor", 1_000)
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(thumb_request(QUERY, Cred::Bearer(token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "unauthorized");
}

#[tokio::test]
async fn test_tampered_token() {
    let app = TestApp::new();
    let token = app.token_for("viewer");
    // Claim another user with the viewer's signature.
    let forged = token.replacen("viewer", "editor", 1);

    assert_eq!(
        status_for(&app, Cred::Bearer(forged)).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_token_signed_with_other_secret() {
    let app = TestApp::new();
    let token = TokenSigner::new("some-other-secret-abcdefgh")
        .issue("editor", Duration::from_secs(60))
        .unwrap();
    assert_eq!(
        status_for(&app, Cred::Bearer(token)).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_token_for_unknown_user() {
    let app = TestApp::new();
    let token = app.token_for("ghost");
    assert_eq!(
        status_for(&app, Cred::Bearer(token)).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_garbage_token() {
    let app = TestApp::new();
    assert_eq!(
        status_for(&app, Cred::Bearer("not-a-token".to_string())).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_valid_cookie() {
    let app = TestApp::new();
    let session = app.session_for("admin").await;
    assert_eq!(status_for(&app, Cred::Cookie(session)).await, StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_cookie() {
    let app = TestApp::new();
    assert_eq!(
        status_for(&app, Cred::Cookie("0123456789abcdef".to_string())).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_removed_session_is_rejected() {
    let app = TestApp::new();
    let session = app.session_for("editor").await;
    assert!(app.verifier.sessions().remove(&session).await);

    assert_eq!(
        status_for(&app, Cred::Cookie(session)).await,
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_invalid_token_does_not_fall_back_to_cookie() {
    let app = TestApp::new();
    let session = app.session_for("editor").await;

    let request = Request::builder()
        .uri(format!("{}?{}", THUMBNAIL_ROUTE, QUERY))
        .header(header::AUTHORIZATION, "Bearer editor.1.deadbeef")
        .header(header::COOKIE, format!("session_id={}", session))
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_takes_precedence_over_cookie() {
    let app = TestApp::new();
    // Cookie belongs to a permitted user, token to a non-permitted one.
    let session = app.session_for("editor").await;
    let token = app.token_for("viewer");

    let request = Request::builder()
        .uri(format!("{}?{}", THUMBNAIL_ROUTE, QUERY))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::COOKIE, format!("session_id={}", session))
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "forbidden");
}

#[tokio::test]
async fn test_cookie_among_other_cookies() {
    let app = TestApp::new();
    let session = app.session_for("editor").await;

    let request = Request::builder()
        .uri(format!("{}?{}", THUMBNAIL_ROUTE, QUERY))
        .header(
            header::COOKIE,
            format!("theme=dark; session_id={}; lang=en", session),
        )
        .body(Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
