#![warn(missing_docs)]
//! statrpc Report - Benchmark Report Model
//!
//! Output formats:
//! - Human (terminal text)
//! - JSON (machine-readable)

mod json;
mod report;

pub use json::generate_json_report;
pub use report::{LatencyMetrics, Overhead, Report, ReportMeta, StatRecord, SystemInfo};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// JSON with full schema
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Format a nanosecond quantity with an adaptive unit (ns, µs, ms, s).
pub fn format_duration(nanos: f64) -> String {
    let abs = nanos.abs();
    if abs < 1_000.0 {
        format!("{:.0}ns", nanos)
    } else if abs < 1_000_000.0 {
        format!("{:.2}µs", nanos / 1_000.0)
    } else if abs < 1_000_000_000.0 {
        format!("{:.2}ms", nanos / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos / 1_000_000_000.0)
    }
}
