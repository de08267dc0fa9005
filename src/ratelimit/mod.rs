//! Per-caller, per-route request budgets.
//!
//! - Fixed-window counters (the window restarts on the first request after it elapses)
//! - Callers are keyed by user when authenticated, by IP otherwise
//! - Store calls are bounded by a timeout; the [`FailMode`] decides whether an
//!   unavailable store rejects or admits requests

mod limiter;
mod store;

pub use limiter::{
    FailMode, RateLimiter, DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW, DEFAULT_STORE_TIMEOUT,
};
pub use store::{
    CallerKey, MemoryRateLimitStore, RateLimitDecision, RateLimitKey, RateLimitPolicy,
    RateLimitStore, DEFAULT_MAX_TRACKED_KEYS,
};
