//! HTTP server layer for the signage API.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │  GET /api/endpoint/...   POST /login   POST /logout   /health   │
//! │                                                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌────────────┐  ┌─────────┐  │
//! │  │  handlers   │  │    login    │  │  response  │  │ routes  │  │
//! │  │ (pipelines) │  │ (redirects) │  │  (errors)  │  │(router) │  │
//! │  └─────────────┘  └─────────────┘  └────────────┘  └─────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod login;
pub mod response;
pub mod routes;

pub use handlers::{
    dispatch, health_handler, thumbnail_endpoint, AppState, HealthResponse, ThumbnailHandler,
    ThumbnailParams, THUMBNAIL_GROUPS, THUMBNAIL_ROUTE,
};
pub use login::{login_handler, logout_handler, LoginState, LOGIN_FAILED_PAGE, LOGIN_PAGE};
pub use response::ErrorResponse;
pub use routes::{create_router, RouterConfig, DEFAULT_CACHE_MAX_AGE, DEFAULT_LANDING_PAGE};
