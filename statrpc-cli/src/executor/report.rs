//! Report Building

use super::execution::{BenchmarkOutcome, BenchmarkPlan};
use super::metadata::build_report_meta;
use statrpc_report::{LatencyMetrics, Overhead, Report, StatRecord};

/// Build a complete Report from a finished run
pub fn build_report(plan: &BenchmarkPlan, target: &str, outcome: &BenchmarkOutcome) -> Report {
    let remote = LatencyMetrics::from(&outcome.remote_stats);
    let local = LatencyMetrics::from(&outcome.local_stats);
    let server_host = Some(outcome.server.hostname.clone()).filter(|h| !h.is_empty());

    Report {
        meta: build_report_meta(plan, target, server_host),
        stat: outcome.last.as_ref().map(StatRecord::from),
        overhead: Overhead::between(&remote, &local),
        remote,
        local,
    }
}
