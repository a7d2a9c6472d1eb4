//! Timed execution of a single logical call.
//!
//! Each attempt gets its own start/end pair taken immediately around the
//! transport call. Rate-limited attempts are retried in a bounded loop after
//! the backoff sleep, and only the final attempt's duration is reported.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

use super::backoff::{BackoffPolicy, Decision, Signal};
use super::config::BenchConfig;
use super::endpoint::EndpointDescriptor;
use crate::http_client::{RawResponse, Transport, TransportError};

/// Why a logical call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    NetworkError,
}

/// Terminal outcome of one logical call
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    Success {
        latency_ms: f64,
        /// Response body, only when capture was requested
        payload: Option<String>,
    },
    Failed(FailureKind),
}

impl CallOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallOutcome::Success { .. })
    }
}

/// Outcome of a single attempt. `RateLimited` never leaves the executor.
#[derive(Debug)]
enum AttemptOutcome {
    Success { latency: Duration, body: bytes::Bytes },
    RateLimited { retry_after_secs: Option<u64> },
    Failed(Signal),
}

/// Issues timed calls through a [`Transport`]
pub struct TimedCallExecutor<T> {
    transport: T,
    policy: BackoffPolicy,
    timeout: Duration,
}

impl<T: Transport> TimedCallExecutor<T> {
    pub fn new(transport: T, config: &BenchConfig) -> Self {
        Self {
            transport,
            policy: BackoffPolicy::from_config(config),
            timeout: config.timeout(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one logical call to completion and classify it.
    ///
    /// Never returns early on a 429 unless the retry cap is exhausted, and
    /// never retries timeouts or other failures.
    pub async fn execute(
        &self,
        endpoint: &EndpointDescriptor,
        headers: &HeaderMap,
        capture_response: bool,
    ) -> CallOutcome {
        let mut retries = 0u32;

        loop {
            let signal = match self.attempt(endpoint, headers).await {
                AttemptOutcome::Success { latency, body } => {
                    let payload =
                        capture_response.then(|| String::from_utf8_lossy(&body).into_owned());
                    return CallOutcome::Success {
                        latency_ms: latency.as_secs_f64() * 1000.0,
                        payload,
                    };
                }
                AttemptOutcome::RateLimited { retry_after_secs } => {
                    Signal::RateLimited { retry_after_secs }
                }
                AttemptOutcome::Failed(signal) => signal,
            };

            match self.policy.decide(signal, retries) {
                Decision::Retry(delay) => {
                    tracing::warn!(
                        url = %endpoint.url(),
                        delay_ms = delay.as_millis() as u64,
                        retry = retries + 1,
                        max_retries = self.policy.max_retries(),
                        "Rate limited, backing off before retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retries += 1;
                }
                Decision::GiveUp(kind) => {
                    tracing::warn!(
                        url = %endpoint.url(),
                        failure = ?kind,
                        retries = retries,
                        "Call failed"
                    );
                    return CallOutcome::Failed(kind);
                }
            }
        }
    }

    async fn attempt(&self, endpoint: &EndpointDescriptor, headers: &HeaderMap) -> AttemptOutcome {
        let start = Instant::now();
        // Dropping the transport future on timeout aborts the in-flight request
        let result = tokio::time::timeout(self.timeout, self.transport.perform(endpoint, headers)).await;
        let latency = start.elapsed();

        match result {
            Err(_) => {
                tracing::debug!(
                    url = %endpoint.url(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Attempt exceeded timeout"
                );
                AttemptOutcome::Failed(Signal::Timeout)
            }
            Ok(Err(TransportError::Timeout)) => AttemptOutcome::Failed(Signal::Timeout),
            Ok(Err(e)) => {
                tracing::debug!(
                    url = %endpoint.url(),
                    error_kind = e.kind(),
                    error = %e,
                    "Attempt failed"
                );
                AttemptOutcome::Failed(Signal::NetworkError)
            }
            Ok(Ok(raw)) => classify_response(raw, latency),
        }
    }
}

fn classify_response(raw: RawResponse, latency: Duration) -> AttemptOutcome {
    if raw.is_success() {
        AttemptOutcome::Success {
            latency,
            body: raw.body,
        }
    } else if raw.is_rate_limited() {
        AttemptOutcome::RateLimited {
            retry_after_secs: raw.retry_after_secs,
        }
    } else {
        tracing::debug!(
            status = raw.status,
            response_body = %String::from_utf8_lossy(&raw.body),
            "Received error response"
        );
        AttemptOutcome::Failed(Signal::NetworkError)
    }
}
