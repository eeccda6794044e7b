#![warn(missing_docs)]
//! statrpc Statistics
//!
//! Summarizes latency samples collected by the benchmarking client:
//! - Mean computed from an integer nanosecond sum (no float drift on long runs)
//! - Upper median and nearest-rank p95, taken directly from the sorted samples
//! - Population standard deviation
//!
//! Percentiles are never interpolated. Results stay reproducible across
//! implementations that use the same index formulas.

mod percentiles;
mod summary;

pub use percentiles::{nearest_rank_index, percentile, upper_median_index};
pub use summary::{LatencyStatistics, summarize};

/// Percentile reported as the tail latency
pub const TAIL_PERCENTILE: f64 = 95.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert!((TAIL_PERCENTILE - 95.0).abs() < f64::EPSILON);
    }
}
