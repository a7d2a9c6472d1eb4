//! Latency benchmarking engine.
//!
//! This module provides:
//! - Timed call execution over REST and GraphQL with rate-limit backoff
//! - A sequential warm-up/measure runner
//! - Nearest-rank statistics and cross-provider comparison
//! - A mock provider server for local runs

pub mod backoff;
pub mod config;
pub mod endpoint;
pub mod executor;
pub mod metrics;
pub mod mock_server;
pub mod report;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use backoff::{BackoffPolicy, Decision, Signal};
pub use config::{BenchConfig, TransportKind};
pub use endpoint::{AuthScheme, Authorizer, EndpointDescriptor, RequestPayload};
pub use executor::{CallOutcome, FailureKind, TimedCallExecutor};
pub use metrics::{compute_statistics, Statistics};
pub use mock_server::{MockProviderServer, MockServerConfig};
pub use report::{compare, compare_all, BenchmarkReport, ComparisonRow, StatsEntry, Winner};
pub use runner::{BenchmarkResult, BenchmarkRunner};
