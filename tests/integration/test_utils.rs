//! Test utilities for integration tests.
//!
//! This module provides an in-memory slide store, rate-limit stores with
//! controllable failures, and a fully wired router with known users.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use axum::response::Response;
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;

use signage_api::auth::{hash_password, UserRecord};
use signage_api::error::{RateLimitError, StoreError};
use signage_api::ratelimit::RateLimitDecision;
use signage_api::server::THUMBNAIL_ROUTE;
use signage_api::{
    create_router, AppState, Asset, CredentialVerifier, RateLimitKey, RateLimitPolicy,
    RateLimitStore, RateLimiter, RouterConfig, SessionStore, Slide, SlideStore, TokenSigner,
    UserDirectory,
};

/// Token secret shared by the test router and the tests.
pub const SECRET: &str = "integration-test-secret-0123456789";

/// Password of every test user.
pub const PASSWORD: &str = "correct horse battery staple";

/// Thumbnail bytes of `S1/logo.png`.
pub const LOGO_THUMB: &[u8] = b"\x89PNG\r\n\x1a\nlogo-thumbnail";

pub const LANDING_PAGE: &str = "/control";

// =============================================================================
// Mock Slide Store
// =============================================================================

/// Slide store backed by maps, counting metadata loads.
pub struct MockSlideStore {
    slides: HashMap<String, Slide>,
    thumbnails: HashMap<(String, String), Bytes>,
    loads: AtomicUsize,
}

impl MockSlideStore {
    pub fn new() -> Self {
        Self {
            slides: HashMap::new(),
            thumbnails: HashMap::new(),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn with_slide(mut self, slide: Slide) -> Self {
        self.slides.insert(slide.id.clone(), slide);
        self
    }

    pub fn with_thumbnail(mut self, slide_id: &str, asset: &str, data: &'static [u8]) -> Self {
        self.thumbnails.insert(
            (slide_id.to_string(), asset.to_string()),
            Bytes::from_static(data),
        );
        self
    }

    /// Number of `load_slide` calls so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SlideStore for MockSlideStore {
    async fn load_slide(&self, id: &str) -> Result<Option<Slide>, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.slides.get(id).cloned())
    }

    async fn read_thumbnail(
        &self,
        slide: &Slide,
        asset: &Asset,
    ) -> Result<Option<Bytes>, StoreError> {
        Ok(self
            .thumbnails
            .get(&(slide.id.clone(), asset.filename.clone()))
            .cloned())
    }
}

pub fn asset(filename: &str, mime: &str, thumbnail: Option<&str>) -> Asset {
    Asset {
        filename: filename.to_string(),
        mime: mime.to_string(),
        thumbnail: thumbnail.map(str::to_string),
    }
}

/// `S1` with a thumbnailed logo, a video without thumbnail, and an asset
/// whose thumbnail file is missing.
pub fn default_slides() -> MockSlideStore {
    MockSlideStore::new()
        .with_slide(Slide {
            id: "S1".to_string(),
            name: "Lobby".to_string(),
            owner: "editor".to_string(),
            assets: vec![
                asset("logo.png", "image/png", Some("thumbs/logo.png")),
                asset("clip.mp4", "video/mp4", None),
                asset("lost.png", "image/png", Some("thumbs/lost.png")),
            ],
        })
        .with_thumbnail("S1", "logo.png", LOGO_THUMB)
}

// =============================================================================
// Rate-Limit Stores
// =============================================================================

/// Never answers within any reasonable timeout.
pub struct HangingStore;

#[async_trait]
impl RateLimitStore for HangingStore {
    async fn hit(
        &self,
        _key: &RateLimitKey,
        _policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Err(RateLimitError::Store("unreachable".to_string()))
    }
}

// =============================================================================
// Users
// =============================================================================

/// argon2 hash of [`PASSWORD`], computed once per test binary.
pub fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(PASSWORD).unwrap()).clone()
}

pub fn users() -> UserDirectory {
    let hash = password_hash();
    let user = |name: &str, group: &str| UserRecord {
        name: name.to_string(),
        groups: vec![group.to_string()],
        password: hash.clone(),
    };
    UserDirectory::from_records(vec![
        user("admin", "admin"),
        user("editor", "editor"),
        user("display", "display"),
        user("viewer", "viewer"),
    ])
    .unwrap()
}

// =============================================================================
// Test Application
// =============================================================================

/// Landing page [`LANDING_PAGE`], max-age 300, no tracing.
pub fn test_router_config() -> RouterConfig {
    RouterConfig::new()
        .with_landing_page(LANDING_PAGE)
        .with_cache_max_age(300)
        .with_tracing(false)
}

/// A router plus handles on its shared state.
pub struct TestApp {
    pub router: Router,
    pub verifier: Arc<CredentialVerifier>,
    pub slides: Arc<MockSlideStore>,
}

impl TestApp {
    /// Generous rate limit, default slides.
    pub fn new() -> Self {
        Self::with_limiter(RateLimiter::in_memory(RateLimitPolicy::new(
            1000,
            Duration::from_secs(60),
        )))
    }

    pub fn with_limiter(limiter: RateLimiter) -> Self {
        Self::build(limiter, default_slides())
    }

    pub fn build(limiter: RateLimiter, slides: MockSlideStore) -> Self {
        Self::build_with(limiter, slides, test_router_config())
    }

    pub fn build_with(limiter: RateLimiter, slides: MockSlideStore, config: RouterConfig) -> Self {
        let verifier = Arc::new(CredentialVerifier::new(
            TokenSigner::new(SECRET),
            Arc::new(SessionStore::new(Duration::from_secs(600))),
            Arc::new(users()),
        ));
        let slides = Arc::new(slides);
        let state = AppState::new(verifier.clone(), limiter, slides.clone());
        let router = create_router(state, config);
        Self {
            router,
            verifier,
            slides,
        }
    }

    pub fn token_for(&self, user: &str) -> String {
        TokenSigner::new(SECRET)
            .issue(user, Duration::from_secs(300))
            .unwrap()
    }

    pub async fn session_for(&self, user: &str) -> String {
        self.verifier.sessions().create(user).await
    }
}

// =============================================================================
// Requests and Responses
// =============================================================================

/// Credential attached to a test request.
pub enum Cred {
    None,
    Bearer(String),
    Cookie(String),
}

pub fn thumb_request(query: &str, cred: Cred) -> Request<Body> {
    let uri = if query.is_empty() {
        THUMBNAIL_ROUTE.to_string()
    } else {
        format!("{}?{}", THUMBNAIL_ROUTE, query)
    };
    let builder = Request::builder().uri(uri);
    let builder = match cred {
        Cred::None => builder,
        Cred::Bearer(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
        Cred::Cookie(id) => builder.header(header::COOKIE, format!("session_id={}", id)),
    };
    builder.body(Body::empty()).unwrap()
}

pub fn login_request(form: &str, session: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(id) = session {
        builder = builder.header(header::COOKIE, format!("session_id={}", id));
    }
    builder.body(Body::from(form.to_string())).unwrap()
}

pub async fn body_bytes(response: Response) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
