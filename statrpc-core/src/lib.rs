#![warn(missing_docs)]
//! statrpc Core
//!
//! Shared building blocks for the stat service and the benchmarking client:
//! - `query` wraps `stat(2)`/`lstat(2)` and classifies failures
//! - `StatResult` and `FileType`, the structured view of a file status
//! - Wall-clock latency samples tagged with their source (remote or local)
//! - CPU affinity pinning for steadier measurements

mod measure;
mod query;

pub use measure::{LatencySample, SampleSource, Timer, pin_to_cpu, time_call};
pub use query::{FailureKind, FileType, QueryError, StatResult, query};
