//! Report Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrpc_core::StatResult;
use statrpc_stats::LatencyStatistics;

/// Complete benchmark report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Run metadata
    pub meta: ReportMeta,
    /// Result of the last measured remote call (absent when `iters` is 0)
    pub stat: Option<StatRecord>,
    /// Remote call latency
    pub remote: LatencyMetrics,
    /// Local syscall latency
    pub local: LatencyMetrics,
    /// Remote versus local comparison
    pub overhead: Overhead,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// statrpc version that produced the report
    pub version: String,
    /// When the run finished
    pub timestamp: DateTime<Utc>,
    /// Server address as given on the command line
    pub target: String,
    /// Host name advertised by the server during handshake
    pub server_host: Option<String>,
    /// Queried path
    pub path: String,
    /// Whether symbolic links were followed
    pub follow_symlink: bool,
    /// Discarded warmup calls
    pub warmup: u64,
    /// Measured calls per phase
    pub iters: u64,
    /// Per-call deadline
    pub timeout_ns: u64,
    /// Client machine
    pub system: SystemInfo,
}

/// Client system information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system
    pub os: String,
    /// CPU architecture
    pub arch: String,
    /// CPU model name
    pub cpu: String,
    /// Logical core count
    pub cpu_cores: u32,
}

/// File status fields as reported by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRecord {
    /// Size in bytes
    pub size: i64,
    /// Raw mode bits
    pub mode: u32,
    /// Owner user id
    pub uid: u32,
    /// Owner group id
    pub gid: u32,
    /// Modification time, seconds
    pub mtime_sec: i64,
    /// Modification time, nanoseconds
    pub mtime_nsec: i64,
    /// `FILE`, `DIR`, `SYMLINK` or `OTHER`
    pub file_type: String,
}

impl From<&StatResult> for StatRecord {
    fn from(result: &StatResult) -> Self {
        Self {
            size: result.size,
            mode: result.mode,
            uid: result.uid,
            gid: result.gid,
            mtime_sec: result.mtime_sec,
            mtime_nsec: result.mtime_nsec,
            file_type: result.file_type.to_string(),
        }
    }
}

/// Latency descriptors for one series, in nanoseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyMetrics {
    /// Sample count
    pub samples: usize,
    /// Arithmetic mean
    pub mean_ns: f64,
    /// Upper median
    pub median_ns: f64,
    /// Nearest-rank 95th percentile
    pub p95_ns: f64,
    /// Population standard deviation
    pub std_dev_ns: f64,
    /// Standard deviation as a percentage of the mean
    pub cv_percent: f64,
}

impl From<&LatencyStatistics> for LatencyMetrics {
    fn from(stats: &LatencyStatistics) -> Self {
        Self {
            samples: stats.count,
            mean_ns: stats.mean.as_nanos() as f64,
            median_ns: stats.median.as_nanos() as f64,
            p95_ns: stats.p95.as_nanos() as f64,
            std_dev_ns: stats.std_dev.as_nanos() as f64,
            cv_percent: stats.coefficient_of_variation(),
        }
    }
}

/// Cost of the RPC layer relative to the local syscall
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Overhead {
    /// Remote mean minus local mean
    pub mean_delta_ns: f64,
    /// Remote median minus local median
    pub median_delta_ns: f64,
    /// Remote mean divided by local mean (0 when the local mean is 0)
    pub mean_ratio: f64,
}

impl Overhead {
    /// Compare a remote series against a local one
    pub fn between(remote: &LatencyMetrics, local: &LatencyMetrics) -> Self {
        let mean_ratio = if local.mean_ns > 0.0 {
            remote.mean_ns / local.mean_ns
        } else {
            0.0
        };
        Self {
            mean_delta_ns: remote.mean_ns - local.mean_ns,
            median_delta_ns: remote.median_ns - local.median_ns,
            mean_ratio,
        }
    }
}
