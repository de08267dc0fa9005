//! Router configuration for the signage API.
//!
//! # Route Structure
//!
//! ```text
//! /health                                             - Health check (public)
//! /login                                              - Form login (POST, redirects)
//! /logout                                             - Logout (POST, redirects)
//! /api/endpoint/slide/asset/slide_get_asset_thumb     - Asset thumbnail (pipeline)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use signage_api::server::{create_router, AppState, RouterConfig};
//!
//! let state = AppState::new(verifier, limiter, slides);
//! let config = RouterConfig::new()
//!     .with_landing_page("/control")
//!     .with_cors_origins(vec!["https://signage.example.com".to_string()]);
//!
//! let router = create_router(state, config);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Request,
    routing::{get, post},
    Router,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{dispatch, health_handler, thumbnail_endpoint, AppState, THUMBNAIL_ROUTE};
use super::login::{login_handler, logout_handler, LoginState};

/// Default landing page after login.
pub const DEFAULT_LANDING_PAGE: &str = "/control";

/// Default `Cache-Control` max-age for served assets (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Redirect target after login
    pub landing_page: String,

    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Mark session cookies `Secure` (serve over TLS)
    pub secure_cookies: bool,
}

impl RouterConfig {
    /// By default CORS allows any origin, thumbnails are cacheable for an
    /// hour and tracing is enabled.
    pub fn new() -> Self {
        Self {
            landing_page: DEFAULT_LANDING_PAGE.to_string(),
            cors_origins: None,
            cache_max_age: DEFAULT_CACHE_MAX_AGE,
            enable_tracing: true,
            secure_cookies: false,
        }
    }

    pub fn with_landing_page(mut self, landing_page: impl Into<String>) -> Self {
        self.landing_page = landing_page.into();
        self
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
pub fn create_router(state: AppState, config: RouterConfig) -> Router {
    let thumbnail = Arc::new(thumbnail_endpoint(&state, config.cache_max_age));

    let api_routes = Router::new().route(
        THUMBNAIL_ROUTE,
        get(move |request: Request| dispatch(thumbnail.clone(), request)),
    );

    let login_routes = Router::new()
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .with_state(LoginState {
            verifier: state.verifier.clone(),
            landing_page: config.landing_page.clone(),
            secure_cookies: config.secure_cookies,
        });

    let public_routes = Router::new().route("/health", get(health_handler));

    let router = Router::new()
        .merge(api_routes)
        .merge(login_routes)
        .merge(public_routes)
        .layer(build_cors_layer(&config));

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}
