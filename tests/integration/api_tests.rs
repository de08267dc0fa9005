//! API integration tests for the asset thumbnail endpoint.
//!
//! Tests verify:
//! - Successful thumbnail delivery for every permitted group
//! - Pipeline ordering (auth before validation before lookup)
//! - Not-found messages for slide, asset and thumbnail
//! - HTTP response codes, bodies and headers

use axum::http::{header, StatusCode};
use tower::ServiceExt;

use super::test_utils::{
    body_bytes, body_json, thumb_request, Cred, TestApp, LOGO_THUMB,
};

// =============================================================================
// Success
// =============================================================================

#[tokio::test]
async fn test_editor_gets_thumbnail() {
    let app = TestApp::new();
    let token = app.token_for("editor");

    let response = app
        .router
        .clone()
        .oneshot(thumb_request("id=S1&name=logo.png", Cred::Bearer(token)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/png"
    );
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "private, max-age=300"
    );
    assert_eq!(body_bytes(response).await.as_ref(), LOGO_THUMB);
}

#[tokio::test]
async fn test_all_permitted_groups() {
    let app = TestApp::new();

    for user in ["admin", "editor", "display"] {
        let response = app
            .router
            .clone()
            .oneshot(thumb_request(
                "id=S1&name=logo.png",
                Cred::Bearer(app.token_for(user)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "user {}", user);
    }
}

#[tokio::test]
async fn test_cookie_session_gets_thumbnail() {
    let app = TestApp::new();
    let session = app.session_for("display").await;

    let response = app
        .router
        .clone()
        .oneshot(thumb_request("id=S1&name=logo.png", Cred::Cookie(session)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.as_ref(), LOGO_THUMB);
}

#[tokio::test]
async fn test_repeated_requests_are_byte_identical() {
    let app = TestApp::new();
    let token = app.token_for("editor");

    let mut bodies = Vec::new();
    for _ in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(thumb_request(
                "id=S1&name=logo.png",
                Cred::Bearer(token.clone()),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        bodies.push(body_bytes(response).await);
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_percent_encoded_parameters() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(thumb_request(
            "id=S1&name=logo%2Epng",
            Cred::Bearer(app.token_for("editor")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Authentication and Authorization
// =============================================================================

#[tokio::test]
async fn test_no_credentials_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(thumb_request("id=S1&name=logo.png", Cred::None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "unauthorized");
    assert_eq!(json["status"], 401);
    assert_eq!(app.slides.load_count(), 0);
}

#[tokio::test]
async fn test_unauthorized_wins_over_invalid_params() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(thumb_request("", Cred::None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_viewer_is_forbidden() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(thumb_request(
            "id=S1&name=logo.png",
            Cred::Bearer(app.token_for("viewer")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "forbidden");
    assert_eq!(json["message"], "User not authorized to view thumbnails.");
    assert_eq!(app.slides.load_count(), 0);
}

#[tokio::test]
async fn test_viewer_with_missing_slide_is_still_forbidden() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(thumb_request(
            "id=missing&name=logo.png",
            Cred::Bearer(app.token_for("viewer")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// =============================================================================
// Validation
// =============================================================================

#[tokio::test]
async fn test_missing_name_is_bad_request_before_lookup() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(thumb_request("id=S1", Cred::Bearer(app.token_for("editor"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "invalid_request");
    assert_eq!(json["fields"], serde_json::json!(["name"]));
    assert_eq!(app.slides.load_count(), 0);
}

#[tokio::test]
async fn test_all_missing_fields_reported() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(thumb_request("", Cred::Bearer(app.token_for("editor"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["fields"], serde_json::json!(["id", "name"]));
}

#[tokio::test]
async fn test_invalid_params_checked_before_groups() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(thumb_request("id=S1", Cred::Bearer(app.token_for("viewer"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_repeated_parameter_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(thumb_request(
            "id=S1&id=S2&name=logo.png",
            Cred::Bearer(app.token_for("editor")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["fields"], serde_json::json!(["id"]));
}

// =============================================================================
// Not Found
// =============================================================================

async fn not_found_message(query: &str) -> String {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(thumb_request(query, Cred::Bearer(app.token_for("display"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "not_found");
    json["message"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_missing_slide() {
    assert_eq!(
        not_found_message("id=missing&name=logo.png").await,
        "Slide 'missing' doesn't exist."
    );
}

#[tokio::test]
async fn test_missing_asset() {
    assert_eq!(
        not_found_message("id=S1&name=nope.png").await,
        "Asset 'nope.png' doesn't exist."
    );
}

#[tokio::test]
async fn test_asset_without_thumbnail() {
    assert_eq!(
        not_found_message("id=S1&name=clip.mp4").await,
        "Asset doesn't have a thumbnail."
    );
}

#[tokio::test]
async fn test_thumbnail_missing_from_storage() {
    assert_eq!(
        not_found_message("id=S1&name=lost.png").await,
        "Asset doesn't have a thumbnail."
    );
}

// =============================================================================
// Public Routes
// =============================================================================

#[tokio::test]
async fn test_health_is_public() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn test_post_to_thumbnail_route_not_allowed() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .method("POST")
        .uri(signage_api::server::THUMBNAIL_ROUTE)
        .body(axum::body::Body::empty())
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
