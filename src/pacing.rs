//! Request pacing: randomized delays and the sleeper that waits them out.

use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// Something that can suspend the pipeline for a duration.
///
/// Production code sleeps on the tokio timer; tests record the requested
/// durations and return immediately.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        debug!("Delaying {}ms", duration.as_millis());
        tokio::time::sleep(duration).await;
    }
}

/// Randomized delays between detail requests and between keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pacing {
    /// Lower bound (inclusive) of the per-candidate delay
    pub candidate_delay_min_ms: u64,
    /// Upper bound (exclusive) of the per-candidate delay
    pub candidate_delay_max_ms: u64,
    /// Delays picked from after each keyword
    pub keyword_delays_ms: Vec<u64>,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            candidate_delay_min_ms: 1500,
            candidate_delay_max_ms: 3500,
            keyword_delays_ms: vec![3000, 6000, 8000, 9000],
        }
    }
}

impl Pacing {
    /// No waiting at all.
    pub fn disabled() -> Self {
        Self { candidate_delay_min_ms: 0, candidate_delay_max_ms: 0, keyword_delays_ms: Vec::new() }
    }

    /// Uniform delay in `[min, max)` before each detail query.
    pub fn candidate_delay(&self) -> Duration {
        let (min, max) = (self.candidate_delay_min_ms, self.candidate_delay_max_ms);
        if max <= min {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::rng().random_range(min..max))
    }

    /// Delay picked uniformly from the configured set after each keyword.
    pub fn keyword_delay(&self) -> Duration {
        if self.keyword_delays_ms.is_empty() {
            return Duration::ZERO;
        }
        let idx = rand::rng().random_range(0..self.keyword_delays_ms.len());
        Duration::from_millis(self.keyword_delays_ms[idx])
    }
}
