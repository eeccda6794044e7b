//! Nearest-Rank Percentiles
//!
//! Percentiles are read straight out of the sorted sample array. No
//! interpolation between neighbours: the reported value is always a latency
//! that was actually observed.

use std::time::Duration;

/// Index of the `percentile`-th nearest-rank element in a sorted array of
/// `count` samples: `ceil(p / 100 * count) - 1`, clamped to the array.
///
/// Returns `None` for an empty array.
///
/// # Examples
///
/// ```
/// # use statrpc_stats::nearest_rank_index;
/// assert_eq!(nearest_rank_index(5, 95.0), Some(4));
/// assert_eq!(nearest_rank_index(100, 95.0), Some(94));
/// assert_eq!(nearest_rank_index(0, 95.0), None);
/// ```
pub fn nearest_rank_index(count: usize, percentile: f64) -> Option<usize> {
    if count == 0 {
        return None;
    }

    let rank = (percentile / 100.0 * count as f64).ceil() as usize;
    Some(rank.clamp(1, count) - 1)
}

/// Index of the upper median (`count / 2`). For even counts this picks the
/// higher of the two middle elements rather than averaging them.
pub fn upper_median_index(count: usize) -> Option<usize> {
    if count == 0 { None } else { Some(count / 2) }
}

/// Look up a nearest-rank percentile in an already sorted slice.
pub fn percentile(sorted: &[Duration], percentile: f64) -> Duration {
    nearest_rank_index(sorted.len(), percentile)
        .map(|idx| sorted[idx])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&v| Duration::from_millis(v)).collect()
    }

    #[test]
    fn test_p95_five_samples() {
        let sorted = ms(&[100, 200, 300, 400, 500]);
        assert_eq!(percentile(&sorted, 95.0), Duration::from_millis(500));
    }

    #[test]
    fn test_p95_hundred_samples() {
        let sorted: Vec<Duration> = (1..=100).map(Duration::from_micros).collect();
        // ceil(0.95 * 100) - 1 = 94 -> the 95th value
        assert_eq!(percentile(&sorted, 95.0), Duration::from_micros(95));
    }

    #[test]
    fn test_p95_twenty_one_samples() {
        // ceil(19.95) - 1 = 19
        assert_eq!(nearest_rank_index(21, 95.0), Some(19));
    }

    #[test]
    fn test_extreme_percentiles() {
        assert_eq!(nearest_rank_index(10, 0.0), Some(0));
        assert_eq!(nearest_rank_index(10, 100.0), Some(9));
        assert_eq!(nearest_rank_index(10, 150.0), Some(9));
    }

    #[test]
    fn test_upper_median() {
        assert_eq!(upper_median_index(0), None);
        assert_eq!(upper_median_index(1), Some(0));
        assert_eq!(upper_median_index(4), Some(2));
        assert_eq!(upper_median_index(5), Some(2));
    }

    #[test]
    fn test_empty_samples() {
        assert_eq!(percentile(&[], 95.0), Duration::ZERO);
    }
}
