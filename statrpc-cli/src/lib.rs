#![warn(missing_docs)]
//! statrpc CLI Library
//!
//! Entry points for the two binaries:
//! - `statrpc-server` serves the Stat RPC on a TCP port
//! - `statrpc-bench` measures that RPC against a local `stat(2)`/`lstat(2)`
//!
//! Settings are layered: built-in defaults, then `statrpc.toml`, then `$ADDR`
//! (client address only), then explicit flags.

mod client;
mod config;
mod executor;

pub use client::{ClientError, StatClient};
pub use config::*;
pub use executor::{
    BenchError, BenchmarkOutcome, BenchmarkPlan, BenchmarkRunner, build_report,
    format_human_output,
};

use anyhow::Context;
use clap::Parser;
use statrpc_core::pin_to_cpu;
use statrpc_ipc::DEFAULT_PORT;
use statrpc_report::{OutputFormat, generate_json_report};
use statrpc_server::StatServer;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Address used when neither `--addr`, `$ADDR` nor the config file sets one
pub fn default_addr() -> String {
    format!("localhost:{}", DEFAULT_PORT)
}

/// statrpc-bench arguments
#[derive(Parser, Debug)]
#[command(name = "statrpc-bench")]
#[command(author, version, about = "Compare remote Stat RPC latency with a local stat call")]
pub struct BenchCli {
    /// Server address (host:port)
    #[arg(long, env = "ADDR")]
    pub addr: Option<String>,

    /// Path to stat
    #[arg(long)]
    pub path: Option<String>,

    /// Follow symbolic links (stat instead of lstat); `--follow=false` overrides the config file
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub follow: Option<bool>,

    /// Per-call deadline (e.g., 5s, 250ms)
    #[arg(long, value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Discarded calls before measurement
    #[arg(long)]
    pub warmup: Option<u64>,

    /// Measured calls per phase
    #[arg(long)]
    pub iters: Option<u64>,

    /// Output format: human, json
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Show a progress bar on stderr
    #[arg(long)]
    pub progress: bool,

    /// Pin the benchmarking thread to this CPU core
    #[arg(long)]
    pub pin_cpu: Option<usize>,

    /// Write a default statrpc.toml to the current directory and exit
    #[arg(long)]
    pub init: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// statrpc-server arguments
#[derive(Parser, Debug)]
#[command(name = "statrpc-server")]
#[command(author, version, about = "Serve the Stat RPC over TCP")]
pub struct ServerCli {
    /// Listen address; ":port" listens on all interfaces
    #[arg(long)]
    pub listen: Option<String>,

    /// Connection worker threads (default: one per core)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    StatrpcConfig::parse_std_duration(s).map_err(|e| e.to_string())
}

/// Initialize logging on stderr; `RUST_LOG` overrides the default filter.
fn init_tracing(verbose: bool) {
    let default = if verbose { "statrpc=debug" } else { "statrpc=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the benchmarking client with process arguments.
pub fn run_bench() -> anyhow::Result<()> {
    let cli = BenchCli::parse();
    run_bench_with_cli(cli)
}

/// Run the benchmarking client with pre-parsed arguments.
pub fn run_bench_with_cli(cli: BenchCli) -> anyhow::Result<()> {
    init_tracing(cli.verbose);

    if cli.init {
        let dir = std::env::current_dir()?;
        let path = StatrpcConfig::write_default(&dir)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    let config = StatrpcConfig::discover().unwrap_or_default();
    let target = resolve_addr(&cli, &config);
    let plan = build_plan(&cli, &config)?;
    plan.validate()?;

    let format_str = cli.format.as_deref().unwrap_or(&config.output.format);
    let format: OutputFormat = format_str.parse().map_err(|e: String| anyhow::anyhow!(e))?;

    if let Some(cpu) = cli.pin_cpu {
        if let Err(e) = pin_to_cpu(cpu) {
            warn!(cpu, error = %e, "failed to pin to CPU; continuing unpinned");
        }
    }

    info!(addr = %target, path = %plan.path, follow = plan.follow_symlink, "connecting");
    let client = StatClient::connect(&target, plan.timeout)
        .with_context(|| format!("failed to connect to {}", target))?;

    let outcome = BenchmarkRunner::new(client, plan.clone())
        .with_progress(cli.progress)
        .run()?;

    let report = build_report(&plan, &target, &outcome);
    let output = match format {
        OutputFormat::Json => generate_json_report(&report)? + "\n",
        OutputFormat::Human => format_human_output(&report),
    };

    // Write output
    if let Some(ref path) = cli.output {
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        file.write_all(output.as_bytes())?;
        eprintln!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    Ok(())
}

/// `--addr`/`$ADDR`, then `statrpc.toml`, then the built-in default.
fn resolve_addr(cli: &BenchCli, config: &StatrpcConfig) -> String {
    cli.addr
        .clone()
        .or_else(|| config.client.addr.clone())
        .unwrap_or_else(default_addr)
}

/// Build a BenchmarkPlan by layering: statrpc.toml defaults → CLI overrides.
fn build_plan(cli: &BenchCli, config: &StatrpcConfig) -> anyhow::Result<BenchmarkPlan> {
    let timeout = match cli.timeout {
        Some(timeout) => timeout,
        None => StatrpcConfig::parse_std_duration(&config.client.timeout)
            .with_context(|| format!("invalid client.timeout {:?}", config.client.timeout))?,
    };

    Ok(BenchmarkPlan {
        path: cli.path.clone().unwrap_or_else(|| config.client.path.clone()),
        follow_symlink: cli.follow.unwrap_or(config.client.follow),
        timeout,
        warmup: cli.warmup.unwrap_or(config.client.warmup),
        iters: cli.iters.unwrap_or(config.client.iters),
    })
}

/// Run the server with process arguments.
pub fn run_server() -> anyhow::Result<()> {
    let cli = ServerCli::parse();
    run_server_with_cli(cli)
}

/// Run the server with pre-parsed arguments. Blocks until the listener fails.
pub fn run_server_with_cli(cli: ServerCli) -> anyhow::Result<()> {
    init_tracing(cli.verbose);

    let config = StatrpcConfig::discover().unwrap_or_default();
    let listen = cli.listen.unwrap_or(config.server.listen);
    let workers = cli
        .workers
        .or(config.server.workers)
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });

    let server = StatServer::bind(&listen, workers)?;
    server.serve()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bench_cli(args: &[&str]) -> BenchCli {
        let mut argv = vec!["statrpc-bench"];
        argv.extend_from_slice(args);
        BenchCli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_plan_defaults() {
        let cli = bench_cli(&[]);
        let plan = build_plan(&cli, &StatrpcConfig::default()).unwrap();
        assert_eq!(plan, BenchmarkPlan::default());
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = StatrpcConfig::default();
        config.client.path = "/etc".to_string();
        config.client.iters = 10;
        config.client.timeout = "2s".to_string();

        let cli = bench_cli(&["--iters", "3", "--timeout", "250ms", "--follow"]);
        let plan = build_plan(&cli, &config).unwrap();
        assert_eq!(plan.path, "/etc");
        assert_eq!(plan.iters, 3);
        assert_eq!(plan.warmup, 5);
        assert_eq!(plan.timeout, Duration::from_millis(250));
        assert!(plan.follow_symlink);
    }

    #[test]
    fn test_follow_flag_overrides_config() {
        let mut config = StatrpcConfig::default();
        config.client.follow = true;

        let plan = build_plan(&bench_cli(&[]), &config).unwrap();
        assert!(plan.follow_symlink);

        let plan = build_plan(&bench_cli(&["--follow=false"]), &config).unwrap();
        assert!(!plan.follow_symlink);

        config.client.follow = false;
        let plan = build_plan(&bench_cli(&["--follow"]), &config).unwrap();
        assert!(plan.follow_symlink);
        let plan = build_plan(&bench_cli(&["--follow", "true"]), &config).unwrap();
        assert!(plan.follow_symlink);
    }

    #[test]
    fn test_default_addr_uses_standard_port() {
        assert_eq!(default_addr(), format!("localhost:{}", DEFAULT_PORT));
    }

    #[test]
    fn test_invalid_config_timeout() {
        let mut config = StatrpcConfig::default();
        config.client.timeout = "soon".to_string();
        assert!(build_plan(&bench_cli(&[]), &config).is_err());
    }

    #[test]
    fn test_addr_precedence() {
        let mut config = StatrpcConfig::default();
        let cli = BenchCli {
            addr: None,
            ..bench_cli(&[])
        };
        assert_eq!(resolve_addr(&cli, &config), "localhost:50051");

        config.client.addr = Some("from-config:1".to_string());
        assert_eq!(resolve_addr(&cli, &config), "from-config:1");

        let cli = bench_cli(&["--addr", "from-flag:2"]);
        assert_eq!(resolve_addr(&cli, &config), "from-flag:2");
    }

    #[test]
    fn test_bad_timeout_flag_rejected() {
        assert!(BenchCli::try_parse_from(["statrpc-bench", "--timeout", "later"]).is_err());
    }

    #[test]
    fn test_server_cli() {
        let cli = ServerCli::try_parse_from(["statrpc-server", "--listen", ":9000", "--workers", "2"])
            .unwrap();
        assert_eq!(cli.listen.as_deref(), Some(":9000"));
        assert_eq!(cli.workers, Some(2));
    }
}
