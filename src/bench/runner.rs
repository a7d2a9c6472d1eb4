//! Benchmark runner: warm-up, then strictly sequential measured iterations.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use super::config::BenchConfig;
use super::endpoint::EndpointDescriptor;
use super::executor::{CallOutcome, FailureKind, TimedCallExecutor};
use super::metrics::{compute_statistics, Statistics};
use crate::http_client::Transport;

/// Raw observations of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    /// Successful latencies in call order (milliseconds)
    pub latencies: Vec<f64>,
    pub errors: u64,
    pub timeouts: u64,
    /// Measured iterations requested (warm-ups excluded)
    pub iterations: usize,
    /// Body of the first measured call, when it succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_payload: Option<String>,
}

impl BenchmarkResult {
    pub fn new(iterations: usize) -> Self {
        Self {
            latencies: Vec::with_capacity(iterations),
            iterations,
            ..Default::default()
        }
    }

    /// Record the terminal classification of one iteration
    pub fn record(&mut self, outcome: CallOutcome) {
        match outcome {
            CallOutcome::Success {
                latency_ms,
                payload,
            } => {
                self.latencies.push(latency_ms);
                if payload.is_some() {
                    self.sample_payload = payload;
                }
            }
            CallOutcome::Failed(FailureKind::Timeout) => self.timeouts += 1,
            CallOutcome::Failed(FailureKind::NetworkError) => self.errors += 1,
        }
    }

    /// Number of terminal classifications recorded so far
    pub fn recorded(&self) -> usize {
        self.latencies.len() + self.errors as usize + self.timeouts as usize
    }

    pub fn statistics(&self) -> Statistics {
        compute_statistics(&self.latencies, self.errors, self.timeouts, self.iterations)
    }
}

/// Runs one logical test against one endpoint
pub struct BenchmarkRunner<T> {
    executor: TimedCallExecutor<T>,
    config: BenchConfig,
}

impl<T: Transport> BenchmarkRunner<T> {
    pub fn new(transport: T, config: BenchConfig) -> Self {
        Self {
            executor: TimedCallExecutor::new(transport, &config),
            config,
        }
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    pub fn executor(&self) -> &TimedCallExecutor<T> {
        &self.executor
    }

    /// Issue the discarded warm-up calls, each followed by the base delay
    pub async fn warmup(&self, endpoint: &EndpointDescriptor, headers: &HeaderMap) {
        tracing::debug!(
            url = %endpoint.url(),
            calls = self.config.warmup_calls,
            "Running warm-up calls"
        );

        for _ in 0..self.config.warmup_calls {
            let _ = self.executor.execute(endpoint, headers, false).await;
            tokio::time::sleep(self.config.base_delay()).await;
        }
    }

    /// Warm up, then measure `iterations` calls one after another.
    ///
    /// Every iteration records exactly one terminal outcome. Only the first
    /// measured call captures its response body.
    pub async fn run(
        &self,
        endpoint: &EndpointDescriptor,
        headers: &HeaderMap,
        iterations: usize,
    ) -> BenchmarkResult {
        self.warmup(endpoint, headers).await;

        let mut result = BenchmarkResult::new(iterations);

        for i in 0..iterations {
            let outcome = self.executor.execute(endpoint, headers, i == 0).await;
            tracing::debug!(
                iteration = i + 1,
                iterations = iterations,
                success = outcome.is_success(),
                "Iteration complete"
            );
            result.record(outcome);

            if i + 1 < iterations {
                tokio::time::sleep(self.config.base_delay()).await;
            }
        }

        tracing::info!(
            url = %endpoint.url(),
            transport = %endpoint.kind(),
            successes = result.latencies.len(),
            errors = result.errors,
            timeouts = result.timeouts,
            "Benchmark run finished"
        );

        result
    }
}
