//! Benchmark Executor
//!
//! Runs the remote-versus-local comparison and turns it into a report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! BenchmarkPlan + StatClient
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  Warmup → remote phase → local phase, summarize
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   report    │  Build Report with metadata and overhead
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │ formatting  │  Human-readable output
//! └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - Timed call loops and the run outcome
//! - [`report`] - Report building
//! - [`formatting`] - Human-readable output formatting
//! - [`metadata`] - System metadata collection

mod execution;
mod formatting;
mod metadata;
mod report;

// Re-export public API
pub use execution::{BenchError, BenchmarkOutcome, BenchmarkPlan, BenchmarkRunner};
pub use formatting::format_human_output;
pub use report::build_report;
