//! Cross-provider comparison and report generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::config::BenchConfig;
use super::metrics::Statistics;
use crate::error::Result;

/// Which side of a comparison had the lower average latency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    A,
    B,
    /// Averages are exactly equal
    Tie,
    /// At least one side recorded no successful calls
    Undecided,
}

/// One logical test compared across two providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    pub test: String,
    pub provider_a: String,
    pub provider_b: String,
    pub avg_a: f64,
    pub avg_b: f64,
    /// `avg_a - avg_b`
    pub diff: f64,
    /// `100 * diff / avg_b`, absent when `avg_b` is zero
    pub percent_diff: Option<f64>,
    pub winner: Winner,
}

impl ComparisonRow {
    pub fn winner_label(&self) -> &str {
        match self.winner {
            Winner::A => self.provider_a.as_str(),
            Winner::B => self.provider_b.as_str(),
            Winner::Tie => "tie",
            Winner::Undecided => "n/a",
        }
    }

    pub fn percent_diff_label(&self) -> String {
        match self.percent_diff {
            Some(pct) => format!("{:+.1}%", pct),
            None => "n/a".to_string(),
        }
    }
}

/// Compare two statistics records that share a test identifier
pub fn compare(
    test: &str,
    provider_a: &str,
    a: &Statistics,
    provider_b: &str,
    b: &Statistics,
) -> ComparisonRow {
    let diff = a.avg - b.avg;
    let percent_diff = if b.avg == 0.0 {
        None
    } else {
        Some(100.0 * diff / b.avg)
    };

    let winner = if !a.has_samples() || !b.has_samples() {
        Winner::Undecided
    } else if a.avg < b.avg {
        Winner::A
    } else if b.avg < a.avg {
        Winner::B
    } else {
        Winner::Tie
    };

    ComparisonRow {
        test: test.to_string(),
        provider_a: provider_a.to_string(),
        provider_b: provider_b.to_string(),
        avg_a: a.avg,
        avg_b: b.avg,
        diff,
        percent_diff,
        winner,
    }
}

/// Statistics for one (provider, test) pair
#[derive(Debug, Clone, PartialEq)]
pub struct StatsEntry {
    pub provider: String,
    pub test: String,
    pub stats: Statistics,
}

impl StatsEntry {
    pub fn key(&self) -> String {
        result_key(&self.provider, &self.test)
    }
}

/// Key used in the persisted results map
pub fn result_key(provider: &str, test: &str) -> String {
    format!("{}_{}", provider, test)
}

/// Compare every pair of providers that ran the same test.
///
/// Tests appear in first-seen order; within a test, pairs follow entry order.
pub fn compare_all(entries: &[StatsEntry]) -> Vec<ComparisonRow> {
    let mut tests: Vec<&str> = Vec::new();
    for entry in entries {
        if !tests.contains(&entry.test.as_str()) {
            tests.push(&entry.test);
        }
    }

    let mut rows = Vec::new();
    for test in tests {
        let group: Vec<&StatsEntry> = entries.iter().filter(|e| e.test == test).collect();
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                rows.push(compare(test, &a.provider, &a.stats, &b.provider, &b.stats));
            }
        }
    }
    rows
}

/// Persisted benchmark document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    pub timestamp: DateTime<Utc>,
    pub iterations: usize,
    pub warmup_calls: usize,
    pub timeout_ms: u64,
    /// Addresses the endpoints were built for (e.g. wallet, token)
    pub addresses: BTreeMap<String, String>,
    /// `"{provider}_{test}"` → statistics
    pub results: BTreeMap<String, Statistics>,
    pub comparisons: Vec<ComparisonRow>,
}

impl BenchmarkReport {
    pub fn new(
        config: &BenchConfig,
        iterations: usize,
        addresses: BTreeMap<String, String>,
        entries: &[StatsEntry],
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            iterations,
            warmup_calls: config.warmup_calls,
            timeout_ms: config.timeout_ms,
            addresses,
            results: entries.iter().map(|e| (e.key(), e.stats)).collect(),
            comparisons: compare_all(entries),
        }
    }

    /// Export the report as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Write the report into `dir` as `latency-<timestamp>.json`
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "latency-{}.json",
            self.timestamp.format("%Y%m%d-%H%M%S")
        ));
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    /// Print per-(provider, test) statistics as an ASCII table
    pub fn print_table(&self) {
        println!();
        println!("┌──────────────────────────────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────────┬──────┬──────┬──────────┐");
        println!("│ Provider / Test                  │  min(ms) │  avg(ms) │  p50(ms) │  p95(ms) │  p99(ms) │  max(ms) │  σ(ms)   │ Err  │ T/O  │ Success% │");
        println!("├──────────────────────────────────┼──────────┼──────────┼──────────┼──────────┼──────────┼──────────┼──────────┼──────┼──────┼──────────┤");

        for (key, s) in &self.results {
            println!(
                "│ {:<32} │ {:>8.1} │ {:>8.1} │ {:>8.1} │ {:>8.1} │ {:>8.1} │ {:>8.1} │ {:>8.1} │ {:>4} │ {:>4} │ {:>7.1}% │",
                key, s.min, s.avg, s.p50, s.p95, s.p99, s.max, s.std_dev, s.errors, s.timeouts, s.success_rate
            );
        }

        println!("└──────────────────────────────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────────┴──────┴──────┴──────────┘");
        println!();
    }

    /// Print head-to-head comparisons
    pub fn print_comparisons(&self) {
        if self.comparisons.is_empty() {
            println!("No tests ran under more than one provider; nothing to compare.");
            return;
        }

        println!("=== Comparison (avg latency) ===");
        for row in &self.comparisons {
            println!(
                "{:<22} {:>10} {:>9.1}ms  vs  {:<10} {:>9.1}ms  diff {:>+9.1}ms ({:>8})  winner: {}",
                row.test,
                row.provider_a,
                row.avg_a,
                row.provider_b,
                row.avg_b,
                row.diff,
                row.percent_diff_label(),
                row.winner_label()
            );
        }
        println!();
    }
}
