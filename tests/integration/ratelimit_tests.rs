//! Rate limiting integration tests.
//!
//! Tests verify:
//! - Budget exhaustion yields 429 with Retry-After
//! - Budgets are per caller
//! - Unauthenticated requests never consume a budget
//! - Store outages under fail-closed and fail-open policies

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, StatusCode};
use tower::ServiceExt;

use signage_api::{FailMode, RateLimitPolicy, RateLimiter};

use super::test_utils::{body_json, default_slides, thumb_request, Cred, HangingStore, TestApp};

const QUERY: &str = "id=S1&name=logo.png";

fn tight_limiter() -> RateLimiter {
    RateLimiter::in_memory(RateLimitPolicy::new(2, Duration::from_secs(60)))
}

async fn status_as(app: &TestApp, user: &str) -> StatusCode {
    app.router
        .clone()
        .oneshot(thumb_request(QUERY, Cred::Bearer(app.token_for(user))))
        .await
        .unwrap()
        .status()
}

#[tokio::test]
async fn test_budget_exhaustion_returns_429() {
    let app = TestApp::with_limiter(tight_limiter());

    assert_eq!(status_as(&app, "editor").await, StatusCode::OK);
    assert_eq!(status_as(&app, "editor").await, StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(thumb_request(QUERY, Cred::Bearer(app.token_for("editor"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response
        .headers()
        .get(header::RETRY_AFTER)
        .unwrap()
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));

    let json = body_json(response).await;
    assert_eq!(json["error"], "rate_limited");
    assert_eq!(json["status"], 429);
}

#[tokio::test]
async fn test_rejected_request_does_not_reach_store() {
    let app = TestApp::with_limiter(tight_limiter());

    status_as(&app, "editor").await;
    status_as(&app, "editor").await;
    assert_eq!(app.slides.load_count(), 2);

    assert_eq!(
        status_as(&app, "editor").await,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(app.slides.load_count(), 2);
}

#[tokio::test]
async fn test_budgets_are_per_caller() {
    let app = TestApp::with_limiter(tight_limiter());

    status_as(&app, "editor").await;
    status_as(&app, "editor").await;
    assert_eq!(
        status_as(&app, "editor").await,
        StatusCode::TOO_MANY_REQUESTS
    );

    assert_eq!(status_as(&app, "admin").await, StatusCode::OK);
}

#[tokio::test]
async fn test_token_and_cookie_share_a_budget() {
    let app = TestApp::with_limiter(tight_limiter());
    let session = app.session_for("editor").await;

    assert_eq!(status_as(&app, "editor").await, StatusCode::OK);
    let response = app
        .router
        .clone()
        .oneshot(thumb_request(QUERY, Cred::Cookie(session.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .router
        .clone()
        .oneshot(thumb_request(QUERY, Cred::Cookie(session)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_unauthenticated_requests_do_not_count() {
    let app = TestApp::with_limiter(tight_limiter());

    for _ in 0..5 {
        let response = app
            .router
            .clone()
            .oneshot(thumb_request(QUERY, Cred::None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    assert_eq!(status_as(&app, "editor").await, StatusCode::OK);
}

#[tokio::test]
async fn test_budget_resets_after_window() {
    let app = TestApp::with_limiter(RateLimiter::in_memory(RateLimitPolicy::new(
        1,
        Duration::from_millis(200),
    )));

    assert_eq!(status_as(&app, "display").await, StatusCode::OK);
    assert_eq!(
        status_as(&app, "display").await,
        StatusCode::TOO_MANY_REQUESTS
    );

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(status_as(&app, "display").await, StatusCode::OK);
}

// =============================================================================
// Store Outages
// =============================================================================

fn hanging_limiter() -> RateLimiter {
    RateLimiter::new(
        Arc::new(HangingStore),
        RateLimitPolicy::new(10, Duration::from_secs(60)),
    )
    .with_timeout(Duration::from_millis(50))
}

#[tokio::test]
async fn test_store_timeout_fails_closed() {
    let app = TestApp::build(hanging_limiter(), default_slides());

    let response = app
        .router
        .clone()
        .oneshot(thumb_request(QUERY, Cred::Bearer(app.token_for("editor"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_json(response).await;
    assert_eq!(json["error"], "unavailable");
    assert_eq!(app.slides.load_count(), 0);
}

#[tokio::test]
async fn test_store_timeout_fails_open() {
    let app = TestApp::build(
        hanging_limiter().with_fail_mode(FailMode::Open),
        default_slides(),
    );

    assert_eq!(status_as(&app, "editor").await, StatusCode::OK);
    assert_eq!(app.slides.load_count(), 1);
}
