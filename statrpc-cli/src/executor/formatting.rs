//! Output Formatting
//!
//! Human-readable output: the stat result of the last remote call, one
//! latency line per series, and the RPC overhead.

use statrpc_report::{LatencyMetrics, Report, format_duration};

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();

    match &report.stat {
        Some(stat) => output.push_str(&format!(
            "stat result: size={} mode={:o} uid={} gid={} type={} mtime={}.{:09}\n",
            stat.size, stat.mode, stat.uid, stat.gid, stat.file_type, stat.mtime_sec, stat.mtime_nsec
        )),
        None => output.push_str("stat result: none (no measured calls)\n"),
    }

    output.push_str(&latency_line("RPC   latency", &report.remote));
    output.push_str(&latency_line("Local latency", &report.local));

    let delta = report.overhead.mean_delta_ns;
    let sign = if delta >= 0.0 { "+" } else { "" };
    let ratio = if report.overhead.mean_ratio > 0.0 {
        format!("{:.1}x local mean", report.overhead.mean_ratio)
    } else {
        "local mean n/a".to_string()
    };
    output.push_str(&format!(
        "RPC overhead: {}{} per call ({})\n",
        sign,
        format_duration(delta),
        ratio
    ));

    output
}

fn latency_line(label: &str, metrics: &LatencyMetrics) -> String {
    format!(
        "{}: avg={} med={} p95={} std={} n={}\n",
        label,
        format_duration(metrics.mean_ns),
        format_duration(metrics.median_ns),
        format_duration(metrics.p95_ns),
        format_duration(metrics.std_dev_ns),
        metrics.samples
    )
}
