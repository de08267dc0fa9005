use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{ApiError, RateLimitError};

use super::store::{
    MemoryRateLimitStore, RateLimitDecision, RateLimitKey, RateLimitPolicy, RateLimitStore,
};

/// Default request budget per window.
pub const DEFAULT_RATE_LIMIT: u32 = 120;

/// Default window length (60 seconds).
pub const DEFAULT_RATE_WINDOW: Duration = Duration::from_secs(60);

/// Default bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(250);

/// What to do when the counter store cannot answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailMode {
    /// Reject the request with 503
    #[default]
    Closed,
    /// Let the request through and log a warning
    Open,
}

/// Applies request budgets through a [`RateLimitStore`].
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn RateLimitStore>,
    policy: RateLimitPolicy,
    timeout: Duration,
    fail_mode: FailMode,
}

impl RateLimiter {
    /// Create a limiter over `store` with a default policy for all routes.
    pub fn new(store: Arc<dyn RateLimitStore>, policy: RateLimitPolicy) -> Self {
        Self {
            store,
            policy,
            timeout: DEFAULT_STORE_TIMEOUT,
            fail_mode: FailMode::Closed,
        }
    }

    /// Create a limiter backed by an in-memory store.
    pub fn in_memory(policy: RateLimitPolicy) -> Self {
        Self::new(Arc::new(MemoryRateLimitStore::new()), policy)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fail_mode(mut self, fail_mode: FailMode) -> Self {
        self.fail_mode = fail_mode;
        self
    }

    pub fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    pub fn fail_mode(&self) -> FailMode {
        self.fail_mode
    }

    /// Count one request under `policy`.
    ///
    /// Returns the decision when the request is allowed, `RateLimitExceeded`
    /// when it is over budget, and `Unavailable` when the store fails or
    /// times out under [`FailMode::Closed`].
    pub async fn check(
        &self,
        key: &RateLimitKey,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision, ApiError> {
        let result = match tokio::time::timeout(self.timeout, self.store.hit(key, policy)).await {
            Ok(result) => result,
            Err(_) => Err(RateLimitError::Timeout(self.timeout)),
        };

        match result {
            Ok(decision) if decision.allowed => Ok(decision),
            Ok(decision) => {
                debug!(
                    key = %key,
                    limit = decision.limit,
                    reset_after_ms = decision.reset_after.as_millis() as u64,
                    "Rate limit exceeded"
                );
                Err(ApiError::RateLimitExceeded {
                    retry_after: retry_after_secs(decision.reset_after),
                })
            }
            Err(err) => match self.fail_mode {
                FailMode::Closed => {
                    warn!(key = %key, "Rate limit store unavailable, rejecting: {}", err);
                    Err(err.into())
                }
                FailMode::Open => {
                    warn!(key = %key, "Rate limit store unavailable, allowing: {}", err);
                    Ok(RateLimitDecision::allowed(
                        policy.limit,
                        policy.limit,
                        policy.window,
                    ))
                }
            },
        }
    }
}

/// Whole seconds until reset, rounded up, never zero.
fn retry_after_secs(reset_after: Duration) -> u64 {
    let secs = reset_after.as_secs() + u64::from(reset_after.subsec_nanos() > 0);
    secs.max(1)
}
