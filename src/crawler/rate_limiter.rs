//! Politeness delays
//!
//! Every request is preceded by a pause drawn uniformly from a kind-specific
//! interval. There is no token bucket and no shared state: each keyword
//! worker owns its own limiter and paces only its own requests.

use crate::config::FetchConfig;
use rand::Rng;
use std::time::Duration;

/// Kind of request being paced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Listing,
    Detail,
}

/// Closed interval of delays in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min_ms: min_ms.min(max_ms),
            max_ms: min_ms.max(max_ms),
        }
    }

    /// A range that never pauses
    pub fn zero() -> Self {
        Self::new(0, 0)
    }

    /// Draws one delay from the range
    pub fn sample(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        let ms = rand::thread_rng().gen_range(self.min_ms..=self.max_ms);
        Duration::from_millis(ms)
    }
}

/// Per-worker politeness delay
#[derive(Debug, Clone)]
pub struct RateLimiter {
    listing: DelayRange,
    detail: DelayRange,
}

impl RateLimiter {
    pub fn new(listing: DelayRange, detail: DelayRange) -> Self {
        Self { listing, detail }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            DelayRange::new(config.listing_delay_min, config.listing_delay_max),
            DelayRange::new(config.detail_delay_min, config.detail_delay_max),
        )
    }

    /// A limiter that never waits
    pub fn disabled() -> Self {
        Self::new(DelayRange::zero(), DelayRange::zero())
    }

    pub fn range(&self, kind: RequestKind) -> DelayRange {
        match kind {
            RequestKind::Listing => self.listing,
            RequestKind::Detail => self.detail,
        }
    }

    /// Sleeps for a delay drawn from the interval of `kind`
    pub async fn wait(&self, kind: RequestKind) {
        let delay = self.range(kind).sample();
        if !delay.is_zero() {
            tracing::trace!("Waiting {:?} before {:?} request", delay, kind);
            tokio::time::sleep(delay).await;
        }
    }
}
