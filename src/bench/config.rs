//! Configuration structs for benchmarking.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Discarded calls issued before measurement begins
pub const WARMUP_CALLS: usize = 2;
/// Hard per-attempt ceiling
pub const TIMEOUT_MS: u64 = 30_000;
/// Fixed spacing between consecutive calls
pub const BASE_DELAY_MS: u64 = 400;
/// Upper bound on a rate-limit backoff sleep
pub const BACKOFF_CAP_MS: u64 = 4_000;
/// Measured iterations when none are requested explicitly
pub const DEFAULT_ITERATIONS: usize = 10;

/// Wire transport used by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Rest,
    GraphQl,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Rest => write!(f, "rest"),
            TransportKind::GraphQl => write!(f, "graphql"),
        }
    }
}

impl std::str::FromStr for TransportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rest" => Ok(TransportKind::Rest),
            "graphql" => Ok(TransportKind::GraphQl),
            _ => Err(format!("Unknown transport kind: {}", s)),
        }
    }
}

/// Immutable timing constants shared by the executor and the runner.
///
/// `Default` yields the production methodology; tests shrink the values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchConfig {
    /// Warm-up calls per run (outcomes discarded)
    pub warmup_calls: usize,
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Fixed delay between calls in milliseconds
    pub base_delay_ms: u64,
    /// Cap on the rate-limit backoff in milliseconds
    pub backoff_cap_ms: u64,
    /// Retry delay used when a 429 carries no Retry-After
    pub default_retry_after_secs: u64,
    /// Rate-limit retries allowed per logical call before giving up
    pub max_rate_limit_retries: u32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            warmup_calls: WARMUP_CALLS,
            timeout_ms: TIMEOUT_MS,
            base_delay_ms: BASE_DELAY_MS,
            backoff_cap_ms: BACKOFF_CAP_MS,
            default_retry_after_secs: 1,
            max_rate_limit_retries: 5,
        }
    }
}

impl BenchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}
