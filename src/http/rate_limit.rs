//! Rate limiting implementation
//!
//! Two mechanisms live here:
//! - optional client-side pacing through a governor token bucket
//! - server-driven throttling from the `X-Rate-Limit-*` response headers

use chrono::{DateTime, Utc};
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use reqwest::header::HeaderMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

/// Header carrying the request quota of the current window
pub const LIMIT_HEADER: &str = "X-Rate-Limit-Limit";
/// Header carrying the remaining requests in the current window
pub const REMAINING_HEADER: &str = "X-Rate-Limit-Remaining";
/// Header carrying the epoch second at which the window resets
pub const RESET_HEADER: &str = "X-Rate-Limit-Reset";

/// Configuration for client-side pacing
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second
    pub requests_per_second: u32,
    /// Burst size (max tokens in bucket)
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_size: 10,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: &RateLimiterConfig) -> Self {
        let rps = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rps).allow_burst(burst);

        Self {
            limiter: Arc::new(Governor::direct(quota)),
        }
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}

/// Quota snapshot reported by the API on every response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimitStatus {
    /// Requests allowed in the window (0 when unreported)
    pub limit: u64,
    /// Requests left in the window
    pub remaining: u64,
    /// Epoch second at which the window resets
    pub reset: i64,
}

impl RateLimitStatus {
    /// Read the quota headers; absent or malformed headers read as zero
    pub fn from_headers(headers: &HeaderMap) -> Self {
        fn number<T: std::str::FromStr + Default>(headers: &HeaderMap, name: &str) -> T {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_default()
        }

        Self {
            limit: number(headers, LIMIT_HEADER),
            remaining: number(headers, REMAINING_HEADER),
            reset: number(headers, RESET_HEADER),
        }
    }

    /// Percentage of the quota still available; 100 when no limit is reported
    pub fn percent_remaining(&self) -> f64 {
        if self.limit == 0 {
            100.0
        } else {
            100.0 * self.remaining as f64 / self.limit as f64
        }
    }

    /// How long to pause before the next request
    ///
    /// Returns `None` unless the remaining quota dropped below
    /// `threshold_percent` and the reset lies in the future.
    pub fn throttle_delay(&self, threshold_percent: f64, now: DateTime<Utc>) -> Option<Duration> {
        if self.percent_remaining() >= threshold_percent {
            return None;
        }
        let wait = self.reset - now.timestamp();
        u64::try_from(wait)
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
