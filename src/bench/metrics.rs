//! Latency statistics for a completed run.
//!
//! Percentiles use the nearest-rank method: for percentile `p` over `n`
//! sorted samples the value at index `ceil(p * n / 100) - 1` (clamped to the
//! sample range) is returned, with no interpolation. Standard deviation is
//! the population form (divisor `n`).

use serde::{Deserialize, Serialize};

/// Summary of one (provider, test) run. All latency fields are milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub std_dev: f64,
    /// Successful calls the latency fields were computed from
    #[serde(default)]
    pub samples: usize,
    pub errors: u64,
    pub timeouts: u64,
    /// Successful calls as a percentage of measured iterations requested
    pub success_rate: f64,
}

impl Statistics {
    /// True when at least one call succeeded
    pub fn has_samples(&self) -> bool {
        self.samples > 0
    }
}

/// Reduce observed latencies and failure counts to a [`Statistics`] record.
///
/// An empty `latencies` slice yields zeroed latency fields and a 0% success
/// rate. `total_requested` of 0 is treated as a 0% success rate.
pub fn compute_statistics(
    latencies: &[f64],
    errors: u64,
    timeouts: u64,
    total_requested: usize,
) -> Statistics {
    if latencies.is_empty() {
        return Statistics {
            errors,
            timeouts,
            ..Default::default()
        };
    }

    let mut sorted = latencies.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let count = sorted.len() as f64;
    let avg = sorted.iter().sum::<f64>() / count;
    let variance = sorted.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / count;

    let success_rate = if total_requested == 0 {
        0.0
    } else {
        (100.0 * count / total_requested as f64).min(100.0)
    };

    Statistics {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        avg,
        p50: percentile(&sorted, 50.0),
        p95: percentile(&sorted, 95.0),
        p99: percentile(&sorted, 99.0),
        std_dev: variance.sqrt(),
        samples: sorted.len(),
        errors,
        timeouts,
        success_rate,
    }
}

/// Nearest-rank percentile of an ascending slice. Returns 0 when empty.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    // p * n first keeps integer inputs exact (0.95 * 100 is not)
    let rank = (p * sorted.len() as f64 / 100.0).ceil() as i64 - 1;
    let index = rank.clamp(0, sorted.len() as i64 - 1) as usize;
    sorted[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEN: [f64; 10] = [10.0, 20.0, 30.0, 40.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0];

    #[test]
    fn test_nearest_rank_percentiles() {
        let stats = compute_statistics(&TEN, 0, 0, 10);
        // ceil(0.50 * 10) - 1 = 4
        assert_eq!(stats.p50, 50.0);
        // ceil(0.95 * 10) - 1 = ceil(9.5) - 1 = 9
        assert_eq!(stats.p95, 100.0);
        // ceil(0.99 * 10) - 1 = 9
        assert_eq!(stats.p99, 100.0);
        assert_eq!(stats.min, 10.0);
        assert_eq!(stats.max, 100.0);
        assert_eq!(stats.avg, 55.0);
        assert_eq!(stats.success_rate, 100.0);
    }

    #[test]
    fn test_percentile_index_at_hundred_samples() {
        let samples: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(percentile(&samples, 50.0), 50.0);
        assert_eq!(percentile(&samples, 95.0), 95.0);
        assert_eq!(percentile(&samples, 99.0), 99.0);
    }

    #[test]
    fn test_percentile_clamps_low_ranks() {
        assert_eq!(percentile(&[7.0], 1.0), 7.0);
        assert_eq!(percentile(&[7.0, 9.0], 0.0), 7.0);
        assert_eq!(percentile(&[], 50.0), 0.0);
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let stats = compute_statistics(&[300.0, 100.0, 200.0], 1, 0, 4);
        assert_eq!(stats.min, 100.0);
        assert_eq!(stats.max, 300.0);
        assert_eq!(stats.p50, 200.0);
        assert_eq!(stats.success_rate, 75.0);
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn test_population_std_dev() {
        // mean 5, squared deviations sum to 32, population variance 4
        let stats = compute_statistics(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 0, 0, 8);
        assert_eq!(stats.avg, 5.0);
        assert_eq!(stats.std_dev, 2.0);
    }

    #[test]
    fn test_identical_latencies_have_zero_std_dev() {
        let stats = compute_statistics(&[42.0; 6], 0, 0, 6);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.p99, 42.0);
    }

    #[test]
    fn test_all_timeouts_zero_filled() {
        let stats = compute_statistics(&[], 0, 5, 5);
        assert_eq!(
            stats,
            Statistics {
                timeouts: 5,
                ..Default::default()
            }
        );
        assert!(!stats.has_samples());
    }

    #[test]
    fn test_zero_requested_does_not_divide_by_zero() {
        let stats = compute_statistics(&[10.0], 0, 0, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.avg, 10.0);
        // Samples exist even though the rate is undefined
        assert_eq!(stats.samples, 1);
        assert!(stats.has_samples());
    }

    #[test]
    fn test_serialized_field_names() {
        let stats = compute_statistics(&[1.0, 3.0], 2, 1, 5);
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["stdDev"], 1.0);
        assert_eq!(json["successRate"], 40.0);
        assert_eq!(json["p95"], 3.0);
        assert_eq!(json["timeouts"], 1);
        assert_eq!(json["samples"], 2);
    }

    proptest! {
        #[test]
        fn prop_percentiles_are_ordered(
            latencies in prop::collection::vec(0.0f64..60_000.0, 1..200),
            extra in 0usize..20,
        ) {
            let total = latencies.len() + extra;
            let stats = compute_statistics(&latencies, extra as u64, 0, total);
            prop_assert!(stats.min <= stats.p50);
            prop_assert!(stats.p50 <= stats.p95);
            prop_assert!(stats.p95 <= stats.p99);
            prop_assert!(stats.p99 <= stats.max);
            prop_assert!(stats.std_dev >= 0.0);
            prop_assert!(stats.success_rate > 0.0 && stats.success_rate <= 100.0);
        }

        #[test]
        fn prop_compute_is_pure(
            latencies in prop::collection::vec(0.0f64..5_000.0, 0..50),
        ) {
            let a = compute_statistics(&latencies, 1, 2, 60);
            let b = compute_statistics(&latencies, 1, 2, 60);
            prop_assert_eq!(a.avg.to_bits(), b.avg.to_bits());
            prop_assert_eq!(a.std_dev.to_bits(), b.std_dev.to_bits());
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_empty_means_zero_success(errors in 0u64..10, timeouts in 0u64..10) {
            let stats = compute_statistics(&[], errors, timeouts, 10);
            prop_assert_eq!(stats.success_rate, 0.0);
            prop_assert_eq!(stats.errors, errors);
            prop_assert_eq!(stats.timeouts, timeouts);
        }
    }
}
