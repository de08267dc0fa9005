//! Endpoint pipeline: a fixed chain of modules in front of each handler.
//!
//! ```text
//! RequestDescriptor
//!        │
//!        ▼
//!  ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌────────────┐   ┌─────────┐
//!  │    auth    │──►│ rate_limit │──►│ validator  │──►│   groups   │──►│ handler │
//!  └────────────┘   └────────────┘   └────────────┘   └────────────┘   └─────────┘
//!        │                │                │                │               │
//!        └────────────────┴──── Err(ApiError) ──────────────┴───────────────┘
//!                                          │
//!                                          ▼
//!                               exactly one HTTP response
//! ```
//!
//! Modules write into a shared [`RequestContext`]; the handler reads the
//! principal and validated parameters from it.

mod context;
mod endpoint;
mod modules;

pub use context::{ApiResponse, RequestContext, RequestDescriptor};
pub use endpoint::{Endpoint, EndpointBuilder, Handler, DEFAULT_BODY_LIMIT};
pub use modules::{AuthModule, GroupModule, Module, RateLimitModule, Stage, ValidatorModule};
