//! Rate-limit counter storage.
//!
//! The [`RateLimitStore`] trait is the seam for remote stores; the in-memory
//! [`MemoryRateLimitStore`] keeps fixed-window counters in a bounded LRU map.

use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::Mutex;

use crate::error::RateLimitError;

/// Default number of (caller, route) windows tracked in memory.
pub const DEFAULT_MAX_TRACKED_KEYS: usize = 10_000;

// =============================================================================
// Keys and Policies
// =============================================================================

/// Who is being counted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CallerKey {
    /// An authenticated user
    User(String),
    /// An anonymous caller, by IP address
    Ip(String),
}

impl fmt::Display for CallerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerKey::User(user) => write!(f, "user:{}", user),
            CallerKey::Ip(ip) => write!(f, "ip:{}", ip),
        }
    }
}

/// Counter identity: one window per caller per route.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RateLimitKey {
    pub caller: CallerKey,
    pub route: Arc<str>,
}

impl RateLimitKey {
    pub fn new(caller: CallerKey, route: impl Into<Arc<str>>) -> Self {
        Self {
            caller,
            route: route.into(),
        }
    }
}

impl fmt::Display for RateLimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.caller, self.route)
    }
}

/// A request budget: at most `limit` requests per `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub const fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }
}

/// Outcome of counting one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window resets
    pub reset_after: Duration,
}

impl RateLimitDecision {
    pub fn allowed(limit: u32, remaining: u32, reset_after: Duration) -> Self {
        Self {
            allowed: true,
            limit,
            remaining,
            reset_after,
        }
    }

    pub fn blocked(limit: u32, reset_after: Duration) -> Self {
        Self {
            allowed: false,
            limit,
            remaining: 0,
            reset_after,
        }
    }
}

// =============================================================================
// Store Trait
// =============================================================================

/// Backend holding rate-limit counters.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Count one request against `key` and decide whether it fits `policy`.
    ///
    /// Increment-and-check must be atomic per key: two concurrent hits on
    /// the same key must never both observe the last free slot.
    async fn hit(
        &self,
        key: &RateLimitKey,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counters in process memory.
///
/// Capacity bounds memory: when full, the least recently used window is
/// evicted, which resets that caller's count.
pub struct MemoryRateLimitStore {
    windows: Mutex<LruCache<RateLimitKey, Window>>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_TRACKED_KEYS)
    }

    pub fn with_capacity(max_keys: usize) -> Self {
        let capacity = NonZeroUsize::new(max_keys).unwrap_or(NonZeroUsize::MIN);
        Self {
            windows: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Count a request as of `now`.
    pub async fn hit_at(
        &self,
        key: &RateLimitKey,
        policy: RateLimitPolicy,
        now: Instant,
    ) -> RateLimitDecision {
        let mut windows = self.windows.lock().await;

        let window = windows.get_or_insert_mut(key.clone(), || Window {
            started: now,
            count: 0,
        });

        let mut elapsed = now.saturating_duration_since(window.started);
        if elapsed >= policy.window {
            window.started = now;
            window.count = 0;
            elapsed = Duration::ZERO;
        }

        let reset_after = policy.window.saturating_sub(elapsed);

        if window.count >= policy.limit {
            return RateLimitDecision::blocked(policy.limit, reset_after);
        }

        window.count += 1;
        RateLimitDecision::allowed(policy.limit, policy.limit - window.count, reset_after)
    }

    /// Number of windows currently tracked.
    pub async fn tracked_keys(&self) -> usize {
        self.windows.lock().await.len()
    }
}

impl Default for MemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn hit(
        &self,
        key: &RateLimitKey,
        policy: RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError> {
        Ok(self.hit_at(key, policy, Instant::now()).await)
    }
}
