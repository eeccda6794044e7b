//! Benchmark Execution
//!
//! A run is three strictly sequential phases over one owned connection:
//!
//! ```text
//! warmup (remote, discarded) → measured remote calls → measured local calls
//! ```
//!
//! Warmup failures are logged and ignored. Any failure in a measured phase
//! ends the run with no statistics.

use crate::client::{ClientError, StatClient};
use indicatif::{ProgressBar, ProgressStyle};
use statrpc_core::{LatencySample, QueryError, SampleSource, StatResult, query, time_call};
use statrpc_ipc::{ServerInfo, StatRequest};
use statrpc_stats::{LatencyStatistics, summarize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// What to measure and how many times
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkPlan {
    /// Path to stat
    pub path: String,
    /// stat (true) or lstat (false)
    pub follow_symlink: bool,
    /// Deadline for each remote call
    pub timeout: Duration,
    /// Remote calls discarded before measurement
    pub warmup: u64,
    /// Measured calls per phase
    pub iters: u64,
}

impl Default for BenchmarkPlan {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            follow_symlink: false,
            timeout: Duration::from_secs(5),
            warmup: 5,
            iters: 50,
        }
    }
}

impl BenchmarkPlan {
    /// Reject plans that could never produce a measurement.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.path.is_empty() {
            return Err(BenchError::InvalidPlan("path must not be empty".to_string()));
        }
        if self.timeout.is_zero() {
            return Err(BenchError::InvalidPlan(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn request(&self) -> StatRequest {
        StatRequest {
            path: self.path.clone(),
            follow_symlink: self.follow_symlink,
        }
    }
}

/// Errors that end a benchmark run
#[derive(Debug, Error)]
pub enum BenchError {
    /// The plan failed validation
    #[error("Invalid benchmark plan: {0}")]
    InvalidPlan(String),

    /// A measured remote call failed
    #[error("Remote call {iteration} failed: {source}")]
    Remote {
        /// Zero-based index within the measured phase
        iteration: u64,
        /// Underlying client error
        #[source]
        source: ClientError,
    },

    /// A measured local call failed
    #[error("Local call {iteration} failed: {source}")]
    Local {
        /// Zero-based index within the measured phase
        iteration: u64,
        /// Underlying query error
        #[source]
        source: QueryError,
    },
}

/// Samples and summaries from a completed run
#[derive(Debug, Clone)]
pub struct BenchmarkOutcome {
    /// Result of the last measured remote call (`None` when `iters` is 0)
    pub last: Option<StatResult>,
    /// Remote samples in call order
    pub remote: Vec<LatencySample>,
    /// Local samples in call order
    pub local: Vec<LatencySample>,
    /// Summary of `remote`
    pub remote_stats: LatencyStatistics,
    /// Summary of `local`
    pub local_stats: LatencyStatistics,
    /// Server identity from the handshake
    pub server: ServerInfo,
}

/// Drives one benchmark run over an owned client connection
pub struct BenchmarkRunner {
    client: StatClient,
    plan: BenchmarkPlan,
    progress: ProgressBar,
}

impl BenchmarkRunner {
    /// Create a runner. The client is closed when the runner is dropped.
    pub fn new(client: StatClient, plan: BenchmarkPlan) -> Self {
        Self {
            client,
            plan,
            progress: ProgressBar::hidden(),
        }
    }

    /// Draw a progress bar on stderr during the measured phases
    pub fn with_progress(mut self, enabled: bool) -> Self {
        if enabled {
            let pb = ProgressBar::new(self.plan.iters.saturating_mul(2));
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            self.progress = pb;
        }
        self
    }

    /// Execute warmup, remote and local phases.
    pub fn run(mut self) -> Result<BenchmarkOutcome, BenchError> {
        self.plan.validate()?;
        let request = self.plan.request();
        let timeout = self.plan.timeout;
        let iters = self.plan.iters;

        info!(warmup = self.plan.warmup, "warmup phase");
        for iteration in 0..self.plan.warmup {
            if let Err(e) = self.client.stat(&request, timeout) {
                debug!(iteration, error = %e, "warmup call failed");
            }
        }

        info!(iters, addr = %self.client.target(), path = %self.plan.path, "remote phase");
        self.progress.set_message("remote");
        let mut remote = Vec::with_capacity(iters as usize);
        let mut last = None;
        for iteration in 0..iters {
            let (result, sample) =
                time_call(SampleSource::Remote, || self.client.stat(&request, timeout));
            let stat = result.map_err(|source| BenchError::Remote { iteration, source })?;
            debug!(iteration, elapsed_ns = sample.elapsed.as_nanos() as u64, "remote call");
            remote.push(sample);
            last = Some(stat);
            self.progress.inc(1);
        }

        info!(iters, "local phase");
        self.progress.set_message("local");
        let mut local = Vec::with_capacity(iters as usize);
        for iteration in 0..iters {
            let (result, sample) = time_call(SampleSource::Local, || {
                query(&self.plan.path, self.plan.follow_symlink)
            });
            result.map_err(|source| BenchError::Local { iteration, source })?;
            local.push(sample);
            self.progress.inc(1);
        }
        self.progress.finish_and_clear();

        let remote_stats = summarize(&elapsed(&remote));
        let local_stats = summarize(&elapsed(&local));
        for (phase, stats) in [("remote", &remote_stats), ("local", &local_stats)] {
            if !stats.is_empty() {
                info!(
                    phase,
                    mean_ns = stats.mean.as_nanos() as u64,
                    cv_percent = stats.coefficient_of_variation(),
                    "phase summary"
                );
            }
        }

        Ok(BenchmarkOutcome {
            last,
            remote,
            local,
            remote_stats,
            local_stats,
            server: self.client.server_info().clone(),
        })
    }
}

fn elapsed(samples: &[LatencySample]) -> Vec<Duration> {
    samples.iter().map(|s| s.elapsed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrpc_core::FileType;
    use statrpc_ipc::{
        ClientMessage, FrameReader, FrameWriter, ServerMessage, StatReply, StatResponse,
        StatusCode,
    };
    use statrpc_server::StatServer;
    use std::net::{TcpListener, TcpStream};

    fn client() -> StatClient {
        let addr = StatServer::bind("127.0.0.1:0", 2)
            .unwrap()
            .spawn()
            .unwrap()
            .to_string();
        StatClient::connect(&addr, Duration::from_secs(5)).unwrap()
    }

    /// Serve one connection with `answer`, which sees each Stat call id and
    /// returns the reply to send, or `None` to stay silent.
    fn fake_client<F>(answer: F) -> StatClient
    where
        F: Fn(u64) -> Option<StatReply> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = FrameReader::new(stream.try_clone().unwrap());
            let mut writer: FrameWriter<TcpStream> = FrameWriter::new(stream);
            writer.write(&ServerMessage::Hello(ServerInfo::default())).unwrap();
            while let Ok(ClientMessage::Stat { call_id, .. }) = reader.read::<ClientMessage>() {
                if let Some(reply) = answer(call_id) {
                    if writer.write(&ServerMessage::Reply { call_id, reply }).is_err() {
                        break;
                    }
                }
            }
        });
        StatClient::connect(&addr, Duration::from_secs(5)).unwrap()
    }

    fn plan(path: &str, warmup: u64, iters: u64) -> BenchmarkPlan {
        BenchmarkPlan {
            path: path.to_string(),
            warmup,
            iters,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate() {
        assert!(BenchmarkPlan::default().validate().is_ok());
        assert!(matches!(
            plan("", 0, 1).validate(),
            Err(BenchError::InvalidPlan(_))
        ));
        let zero_timeout = BenchmarkPlan {
            timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            zero_timeout.validate(),
            Err(BenchError::InvalidPlan(_))
        ));
    }

    #[test]
    fn test_sample_counts() {
        let outcome = BenchmarkRunner::new(client(), plan("/", 0, 3)).run().unwrap();

        assert_eq!(outcome.remote.len(), 3);
        assert_eq!(outcome.local.len(), 3);
        assert!(outcome.remote.iter().all(|s| s.source == SampleSource::Remote));
        assert!(outcome.local.iter().all(|s| s.source == SampleSource::Local));
        assert!(outcome.remote.iter().all(|s| s.elapsed > Duration::ZERO));
        assert!(outcome.local.iter().all(|s| s.elapsed > Duration::ZERO));
        assert_eq!(outcome.remote_stats.count, 3);
        assert_eq!(outcome.local_stats.count, 3);
        assert_eq!(outcome.last.unwrap().file_type, FileType::Directory);
    }

    #[test]
    fn test_zero_iterations() {
        let outcome = BenchmarkRunner::new(client(), plan("/", 2, 0)).run().unwrap();
        assert!(outcome.last.is_none());
        assert!(outcome.remote.is_empty());
        assert_eq!(outcome.remote_stats, LatencyStatistics::default());
        assert_eq!(outcome.local_stats, LatencyStatistics::default());
    }

    #[test]
    fn test_warmup_errors_are_swallowed() {
        let outcome = BenchmarkRunner::new(client(), plan("/no/such/path", 3, 0))
            .run()
            .unwrap();
        assert!(outcome.last.is_none());
    }

    #[test]
    fn test_remote_failure_aborts() {
        let err = BenchmarkRunner::new(client(), plan("/no/such/path", 0, 5))
            .run()
            .unwrap_err();
        match err {
            BenchError::Remote { iteration, source } => {
                assert_eq!(iteration, 0);
                assert_eq!(source.code(), Some(StatusCode::NotFound));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_symlink_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(dir.path(), &link).unwrap();
        let path = link.to_str().unwrap();

        let outcome = BenchmarkRunner::new(client(), plan(path, 0, 1)).run().unwrap();
        assert_eq!(outcome.last.unwrap().file_type, FileType::Symlink);

        let follow = BenchmarkPlan {
            follow_symlink: true,
            ..plan(path, 0, 1)
        };
        let outcome = BenchmarkRunner::new(client(), follow).run().unwrap();
        assert_eq!(outcome.last.unwrap().file_type, FileType::Directory);
    }

    #[test]
    fn test_local_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone");
        let client = fake_client(|_| {
            Some(StatReply::Success(StatResponse::from(StatResult {
                size: 1,
                mode: 0o100644,
                uid: 0,
                gid: 0,
                mtime_sec: 0,
                mtime_nsec: 0,
                file_type: FileType::File,
            })))
        });

        let err = BenchmarkRunner::new(client, plan(missing.to_str().unwrap(), 0, 3))
            .run()
            .unwrap_err();
        match err {
            BenchError::Local { iteration, source } => {
                assert_eq!(iteration, 0);
                assert!(matches!(source, QueryError::NotFound { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_remote_timeout_aborts() {
        let client = fake_client(|_| None);
        let silent = BenchmarkPlan {
            timeout: Duration::from_millis(100),
            ..plan("/", 0, 3)
        };

        let err = BenchmarkRunner::new(client, silent).run().unwrap_err();
        match err {
            BenchError::Remote { iteration, source } => {
                assert_eq!(iteration, 0);
                assert!(matches!(source, ClientError::Timeout(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
