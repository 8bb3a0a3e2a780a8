//! Pacing of outbound queries.
//!
//! The API enforces one request per second per key, shared by every caller
//! using that key, so queries are spaced by a fixed minimum interval.

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter as GovLimiter};
use std::sync::Arc;
use std::time::Duration;

/// Default gap between queries, matching the API's documented limit.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Longest accepted interval. Longer ones are clamped to it.
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Something that decides when the next query may be sent.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Wait until the next query is allowed.
    async fn wait(&self);
}

/// A rate limiter enforcing a minimum interval between operations.
///
/// Backed by a GCRA limiter with a burst of one: the first call to
/// [`wait`](Pacer::wait) returns immediately, every later call returns no
/// sooner than `interval` after the previous one. A zero interval disables
/// pacing.
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
    interval: Duration,
}

impl RateLimiter {
    /// Create a limiter allowing one operation per `interval`, clamped to
    /// [`MAX_INTERVAL`].
    pub fn new(interval: Duration) -> Self {
        let interval = interval.min(MAX_INTERVAL);
        let limiter = Quota::with_period(interval)
            .map(|quota| Arc::new(GovLimiter::direct(quota)));

        Self { limiter, interval }
    }

    /// Create a limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    /// The configured minimum interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether any pacing is applied.
    pub fn is_limited(&self) -> bool {
        self.limiter.is_some()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

#[async_trait]
impl Pacer for RateLimiter {
    async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}
