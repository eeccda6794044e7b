#![warn(missing_docs)]
//! # statrpc
//!
//! A single filesystem metadata query ("stat a path") served over RPC, and a
//! client that measures how much the RPC layer costs compared with issuing
//! the same `stat(2)`/`lstat(2)` locally.
//!
//! - **Stat service**: maps the syscall and its failures onto a small,
//!   network-safe status contract (`INVALID_ARGUMENT`, `NOT_FOUND`,
//!   `PERMISSION_DENIED`, `INTERNAL`)
//! - **Framed TCP transport**: length-prefixed rkyv messages, validated on read
//! - **Benchmark runner**: warmup, then sequential remote and local phases
//!   with per-call deadlines
//! - **Summaries**: mean, upper median, nearest-rank p95 and population
//!   standard deviation
//!
//! ## Quick Start
//!
//! ```ignore
//! use statrpc::prelude::*;
//! use std::time::Duration;
//!
//! let addr = StatServer::bind("127.0.0.1:0", 2)?.spawn()?;
//! let client = StatClient::connect(&addr.to_string(), Duration::from_secs(5))?;
//! let outcome = BenchmarkRunner::new(client, BenchmarkPlan::default()).run()?;
//! println!("{:?}", outcome.remote_stats);
//! ```

// Re-export core types
pub use statrpc_core::{
    FailureKind, FileType, LatencySample, QueryError, SampleSource, StatResult, pin_to_cpu, query,
    time_call,
};

// Re-export wire protocol
pub use statrpc_ipc::{
    DEFAULT_PORT, PROTOCOL_VERSION, RpcStatus, ServerInfo, StatRequest, StatResponse, StatusCode,
};

// Re-export stats
pub use statrpc_stats::{LatencyStatistics, nearest_rank_index, percentile, summarize};

// Re-export report
pub use statrpc_report::{OutputFormat, Report, format_duration, generate_json_report};

// Re-export server
pub use statrpc_server::{StatServer, StatService};

// Re-export client
pub use statrpc_cli::{
    BenchError, BenchmarkOutcome, BenchmarkPlan, BenchmarkRunner, ClientError, StatClient,
    StatrpcConfig, build_report, format_human_output,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BenchmarkPlan, BenchmarkRunner, FileType, StatClient, StatRequest, StatServer,
        StatusCode, summarize,
    };
}

/// Run the benchmarking client CLI.
pub use statrpc_cli::run_bench;

/// Run the server CLI.
pub use statrpc_cli::run_server;
