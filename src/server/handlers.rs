//! HTTP handlers for the signage API.
//!
//! # Endpoints
//!
//! - `GET /api/endpoint/slide/asset/slide_get_asset_thumb?id=..&name=..` - Asset thumbnail
//! - `GET /health` - Health check endpoint

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{AcceptedMethods, CredentialVerifier};
use crate::error::ApiError;
use crate::pipeline::{
    ApiResponse, AuthModule, Endpoint, GroupModule, Handler, RateLimitModule, RequestContext,
    RequestDescriptor, ValidatorModule,
};
use crate::ratelimit::RateLimiter;
use crate::schema::{FieldType, Schema};
use crate::slide::SlideStore;

/// Route of the asset thumbnail endpoint.
pub const THUMBNAIL_ROUTE: &str = "/api/endpoint/slide/asset/slide_get_asset_thumb";

/// Groups allowed to read asset thumbnails.
pub const THUMBNAIL_GROUPS: [&str; 3] = ["admin", "editor", "display"];

// =============================================================================
// Application State
// =============================================================================

/// Services shared by all endpoints.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<CredentialVerifier>,
    pub limiter: RateLimiter,
    pub slides: Arc<dyn SlideStore>,
}

impl AppState {
    pub fn new(
        verifier: Arc<CredentialVerifier>,
        limiter: RateLimiter,
        slides: Arc<dyn SlideStore>,
    ) -> Self {
        Self {
            verifier,
            limiter,
            slides,
        }
    }
}

// =============================================================================
// Pipeline Dispatch
// =============================================================================

/// Run an axum request through an endpoint pipeline.
///
/// The body is read up to the endpoint's limit; larger bodies are rejected
/// before any module runs.
pub async fn dispatch(endpoint: Arc<Endpoint>, request: Request) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    let (parts, body) = request.into_parts();
    let limit = endpoint.body_limit();
    let body = match axum::body::to_bytes(body, limit).await {
        Ok(body) => body,
        Err(_) => {
            return ApiError::invalid(format!("Request body exceeds {} bytes.", limit))
                .into_response()
        }
    };

    let mut descriptor = RequestDescriptor::new(parts.method, parts.uri.path()).with_body(body);
    descriptor.query = parts.uri.query().map(str::to_string);
    descriptor.headers = parts.headers;
    descriptor.peer = peer;

    match endpoint.run(descriptor).await {
        Ok(response) => response.into_response(),
        Err(err) => err.into_response(),
    }
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `GET /health`. Public.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Asset Thumbnail
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ThumbnailParams {
    /// Slide id
    pub id: String,

    /// Asset file name
    pub name: String,
}

/// Serves the stored thumbnail of a slide asset.
pub struct ThumbnailHandler {
    slides: Arc<dyn SlideStore>,
    cache_max_age: u32,
}

impl ThumbnailHandler {
    pub fn new(slides: Arc<dyn SlideStore>, cache_max_age: u32) -> Self {
        Self {
            slides,
            cache_max_age,
        }
    }
}

#[async_trait]
impl Handler for ThumbnailHandler {
    async fn handle(&self, ctx: RequestContext) -> Result<ApiResponse, ApiError> {
        let params: ThumbnailParams = ctx.params_as()?;

        let slide = self
            .slides
            .load_slide(&params.id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Slide '{}' doesn't exist.", params.id)))?;

        let asset = slide
            .asset(&params.name)
            .ok_or_else(|| ApiError::NotFound(format!("Asset '{}' doesn't exist.", params.name)))?;

        let no_thumb = || ApiError::NotFound("Asset doesn't have a thumbnail.".to_string());
        if !asset.has_thumb() {
            return Err(no_thumb());
        }
        let data = self
            .slides
            .read_thumbnail(&slide, asset)
            .await?
            .ok_or_else(no_thumb)?;

        Ok(ApiResponse::file(data, asset.thumb_content_type())
            .with_cache_control(format!("private, max-age={}", self.cache_max_age)))
    }
}

/// Build the thumbnail endpoint:
/// auth (cookie or token) → rate limit → query `{id, name}` → groups → handler.
pub fn thumbnail_endpoint(state: &AppState, cache_max_age: u32) -> Endpoint {
    Endpoint::builder("slide_get_asset_thumb")
        .module(AuthModule::new(
            state.verifier.clone(),
            AcceptedMethods::cookie_or_token(),
        ))
        .module(RateLimitModule::new(state.limiter.clone(), THUMBNAIL_ROUTE))
        .module(ValidatorModule::query(
            Schema::new()
                .required("id", FieldType::String)
                .required("name", FieldType::String),
        ))
        .module(
            GroupModule::new(THUMBNAIL_GROUPS)
                .with_message("User not authorized to view thumbnails."),
        )
        .handler(ThumbnailHandler::new(state.slides.clone(), cache_max_age))
}
