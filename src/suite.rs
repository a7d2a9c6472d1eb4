// Suite driver
// Runs planned (provider, test) pairs one after another and gathers results.

use std::collections::BTreeMap;

use crate::bench::config::BenchConfig;
use crate::bench::report::{compare_all, result_key, BenchmarkReport, ComparisonRow, StatsEntry};
use crate::bench::runner::{BenchmarkResult, BenchmarkRunner};
use crate::http_client::Transport;
use crate::providers::{PlannedTest, TestAddresses};

/// Everything a suite run produced
#[derive(Debug, Clone, Default)]
pub struct SuiteOutcome {
    /// Statistics in execution order
    pub entries: Vec<StatsEntry>,
    /// Raw observations keyed `"{provider}_{test}"`
    pub results: BTreeMap<String, BenchmarkResult>,
    pub comparisons: Vec<ComparisonRow>,
}

impl SuiteOutcome {
    pub fn report(
        &self,
        config: &BenchConfig,
        iterations: usize,
        addresses: &TestAddresses,
    ) -> BenchmarkReport {
        BenchmarkReport::new(config, iterations, addresses.to_map(), &self.entries)
    }
}

/// Run every planned test sequentially through one runner
pub async fn run_suite<T: Transport>(
    runner: &BenchmarkRunner<T>,
    plan: &[PlannedTest],
    iterations: usize,
) -> SuiteOutcome {
    let mut outcome = SuiteOutcome::default();

    for (index, planned) in plan.iter().enumerate() {
        let provider = planned.provider.name();
        let test = planned.test.as_str();

        tracing::info!(
            provider = provider,
            test = test,
            transport = %planned.endpoint.kind(),
            index = index + 1,
            total = plan.len(),
            "Starting benchmark"
        );

        let headers = planned.endpoint.auth_headers();
        let result = runner.run(&planned.endpoint, &headers, iterations).await;
        let stats = result.statistics();

        tracing::info!(
            provider = provider,
            test = test,
            avg_ms = stats.avg,
            p95_ms = stats.p95,
            success_rate = stats.success_rate,
            "Benchmark complete"
        );

        outcome.results.insert(result_key(provider, test), result);
        outcome.entries.push(StatsEntry {
            provider: provider.to_string(),
            test: test.to_string(),
            stats,
        });
    }

    outcome.comparisons = compare_all(&outcome.entries);
    outcome
}
