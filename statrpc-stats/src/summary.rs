//! Latency Summary
//!
//! Turns a chronological sequence of elapsed durations into aggregate
//! descriptors. Order statistics are taken from a sorted copy; the caller's
//! slice keeps its chronological order.

use crate::percentiles::{nearest_rank_index, upper_median_index};
use crate::TAIL_PERCENTILE;
use std::time::Duration;

/// Aggregate latency descriptors for one sample series
///
/// An empty series yields the all-zero default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LatencyStatistics {
    /// Arithmetic mean
    pub mean: Duration,
    /// Upper median (`sorted[count / 2]`)
    pub median: Duration,
    /// Nearest-rank 95th percentile (`sorted[ceil(0.95 * count) - 1]`)
    pub p95: Duration,
    /// Population standard deviation
    pub std_dev: Duration,
    /// Number of samples
    pub count: usize,
}

/// Summarize a series of latency samples
///
/// # Examples
///
/// ```
/// # use std::time::Duration;
/// # use statrpc_stats::summarize;
/// let samples: Vec<Duration> = [100, 200, 300, 400, 500]
///     .iter()
///     .map(|&ms| Duration::from_millis(ms))
///     .collect();
/// let stats = summarize(&samples);
/// assert_eq!(stats.median, Duration::from_millis(300));
/// assert_eq!(stats.p95, Duration::from_millis(500));
/// ```
pub fn summarize(samples: &[Duration]) -> LatencyStatistics {
    let count = samples.len();
    if count == 0 {
        return LatencyStatistics::default();
    }

    // u128 nanos: no overflow for any realistic run length
    let total: u128 = samples.iter().map(Duration::as_nanos).sum();
    let mean_nanos = total / count as u128;
    let mean = duration_from_nanos(mean_nanos);

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();

    let median = upper_median_index(count)
        .map(|idx| sorted[idx])
        .unwrap_or_default();
    let p95 = nearest_rank_index(count, TAIL_PERCENTILE)
        .map(|idx| sorted[idx])
        .unwrap_or_default();

    let mean_f = mean_nanos as f64;
    let variance = samples
        .iter()
        .map(|d| (d.as_nanos() as f64 - mean_f).powi(2))
        .sum::<f64>()
        / count as f64;
    let std_dev = Duration::from_nanos(variance.sqrt() as u64);

    LatencyStatistics {
        mean,
        median,
        p95,
        std_dev,
        count,
    }
}

fn duration_from_nanos(nanos: u128) -> Duration {
    let secs = (nanos / 1_000_000_000) as u64;
    let subsec = (nanos % 1_000_000_000) as u32;
    Duration::new(secs, subsec)
}

impl LatencyStatistics {
    /// Coefficient of variation in percent (0 when the mean is zero)
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.mean.is_zero() {
            0.0
        } else {
            self.std_dev.as_secs_f64() / self.mean.as_secs_f64() * 100.0
        }
    }

    /// Whether any samples were summarized
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&v| Duration::from_millis(v)).collect()
    }

    #[test]
    fn test_empty_samples() {
        let stats = summarize(&[]);
        assert_eq!(stats.count, 0);
        assert_eq!(stats, LatencyStatistics::default());
        assert!(stats.is_empty());
    }

    #[test]
    fn test_single_sample() {
        let d = Duration::from_micros(42);
        let stats = summarize(&[d]);

        assert_eq!(stats.count, 1);
        assert_eq!(stats.mean, d);
        assert_eq!(stats.median, d);
        assert_eq!(stats.p95, d);
        assert_eq!(stats.std_dev, Duration::ZERO);
    }

    #[test]
    fn test_five_ascending_samples() {
        let stats = summarize(&ms(&[100, 200, 300, 400, 500]));

        assert_eq!(stats.count, 5);
        assert_eq!(stats.mean, Duration::from_millis(300));
        assert_eq!(stats.median, Duration::from_millis(300));
        assert_eq!(stats.p95, Duration::from_millis(500));
        // sqrt((200^2 + 100^2 + 0 + 100^2 + 200^2) / 5) ms = sqrt(20000) ms
        let expected = 141.421_356f64;
        assert!((stats.std_dev.as_secs_f64() * 1000.0 - expected).abs() < 0.001);
    }

    #[test]
    fn test_upper_median_for_even_count() {
        let stats = summarize(&ms(&[10, 20, 30, 40]));
        assert_eq!(stats.median, Duration::from_millis(30));
        assert_eq!(stats.mean, Duration::from_millis(25));
    }

    #[test]
    fn test_unsorted_input_is_preserved() {
        let samples = ms(&[500, 100, 400, 200, 300]);
        let before = samples.clone();
        let stats = summarize(&samples);

        assert_eq!(samples, before);
        assert_eq!(stats.median, Duration::from_millis(300));
        assert_eq!(stats.p95, Duration::from_millis(500));
    }

    #[test]
    fn test_mean_truncates_to_whole_nanos() {
        let samples = [Duration::from_nanos(1), Duration::from_nanos(2)];
        assert_eq!(summarize(&samples).mean, Duration::from_nanos(1));
    }

    #[test]
    fn test_constant_series_has_zero_spread() {
        let stats = summarize(&ms(&[7, 7, 7, 7]));
        assert_eq!(stats.std_dev, Duration::ZERO);
        assert!((stats.coefficient_of_variation() - 0.0).abs() < f64::EPSILON);
    }
}
