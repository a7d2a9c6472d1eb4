//! Rate-limit backoff decisions.
//!
//! Only HTTP 429 is retried. The retry delay comes from the server's
//! `Retry-After` hint and is capped, and the number of retries for one
//! logical call is bounded so a 429 storm cannot stall a run forever.

use std::time::Duration;

use super::config::BenchConfig;
use super::executor::FailureKind;

/// Classification of a single non-successful attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// HTTP 429 with the server-advised delay, if any
    RateLimited { retry_after_secs: Option<u64> },
    /// Attempt exceeded the per-attempt ceiling
    Timeout,
    /// Any other transport or protocol failure
    NetworkError,
}

/// What the executor does next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Sleep, then repeat the same iteration
    Retry(Duration),
    /// Stop and record this terminal failure
    GiveUp(FailureKind),
}

#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    cap_ms: u64,
    default_retry_after_secs: u64,
    max_retries: u32,
}

impl BackoffPolicy {
    pub fn new(cap_ms: u64, default_retry_after_secs: u64, max_retries: u32) -> Self {
        Self {
            cap_ms,
            default_retry_after_secs,
            max_retries,
        }
    }

    pub fn from_config(config: &BenchConfig) -> Self {
        Self::new(
            config.backoff_cap_ms,
            config.default_retry_after_secs,
            config.max_rate_limit_retries,
        )
    }

    /// Decide how to handle `signal`, given how many rate-limit retries the
    /// current logical call has already consumed.
    pub fn decide(&self, signal: Signal, retries_so_far: u32) -> Decision {
        match signal {
            Signal::RateLimited { retry_after_secs } => {
                if retries_so_far >= self.max_retries {
                    return Decision::GiveUp(FailureKind::NetworkError);
                }
                let secs = retry_after_secs.unwrap_or(self.default_retry_after_secs);
                Decision::Retry(self.delay_for(secs))
            }
            Signal::Timeout => Decision::GiveUp(FailureKind::Timeout),
            Signal::NetworkError => Decision::GiveUp(FailureKind::NetworkError),
        }
    }

    /// `min(secs * 1000, cap)` in milliseconds
    pub fn delay_for(&self, retry_after_secs: u64) -> Duration {
        let ms = retry_after_secs.saturating_mul(1000).min(self.cap_ms);
        Duration::from_millis(ms)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&BenchConfig::default())
    }
}
