//! # Signage API
//!
//! HTTP API for a digital signage system. Every API endpoint runs the same
//! declarative pipeline before its business logic:
//!
//! ```text
//! authentication → rate limiting → schema validation → authorization → handler
//! ```
//!
//! ## Features
//!
//! - **Credentials**: session cookies from a form login, or HMAC-signed bearer tokens
//! - **Rate limiting**: fixed-window budgets per caller and route, behind a store trait
//!   with bounded calls and an explicit fail-open/fail-closed policy
//! - **Validation**: declared query/body schemas, reporting every offending field
//! - **Authorization**: group whitelists as a reusable pipeline module
//! - **Slide assets**: thumbnails served from a file-system slide store
//!
//! ## Architecture
//!
//! - [`auth`] - Users, sessions, tokens and the credential verifier
//! - [`ratelimit`] - Rate-limit stores and the limiter
//! - [`schema`] - Request schemas and validated parameters
//! - [`pipeline`] - Endpoint modules and the pipeline runner
//! - [`slide`] - Slide metadata and asset storage
//! - [`server`] - Axum handlers, login flow and router
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use signage_api::{
//!     create_router, AppState, CredentialVerifier, FsSlideStore, RateLimitPolicy, RateLimiter,
//!     RouterConfig, SessionStore, TokenSigner, UserDirectory,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let users = UserDirectory::load("data/users.json").await.unwrap();
//!     let verifier = Arc::new(CredentialVerifier::new(
//!         TokenSigner::new("a-long-random-secret"),
//!         Arc::new(SessionStore::default()),
//!         Arc::new(users),
//!     ));
//!     let limiter = RateLimiter::in_memory(RateLimitPolicy::new(120, Duration::from_secs(60)));
//!     let slides = Arc::new(FsSlideStore::new("data/slides"));
//!
//!     let router = create_router(AppState::new(verifier, limiter, slides), RouterConfig::new());
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod ratelimit;
pub mod schema;
pub mod server;
pub mod slide;

// Re-export commonly used types
pub use auth::{
    AcceptedMethods, AuthMethod, CredentialVerifier, Principal, SessionStore, TokenSigner,
    UserDirectory, UserRecord,
};
pub use config::{Cli, Command, HashPasswordConfig, ServeConfig, TokenConfig};
pub use error::{ApiError, RateLimitError, StoreError};
pub use pipeline::{
    ApiResponse, AuthModule, Endpoint, GroupModule, Handler, Module, RateLimitModule,
    RequestContext, RequestDescriptor, Stage, ValidatorModule,
};
pub use ratelimit::{
    CallerKey, FailMode, MemoryRateLimitStore, RateLimitKey, RateLimitPolicy, RateLimitStore,
    RateLimiter,
};
pub use schema::{FieldType, ParamSource, Schema, ValidatedParams};
pub use server::{create_router, AppState, ErrorResponse, RouterConfig};
pub use slide::{Asset, FsSlideStore, Slide, SlideStore};
