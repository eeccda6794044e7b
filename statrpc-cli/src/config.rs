//! Configuration loading from statrpc.toml
//!
//! Defaults for both binaries can be placed in a `statrpc.toml` file. The file
//! is discovered by walking up from the current directory; command-line flags
//! (and `$ADDR` for the client address) take precedence over it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the configuration file looked up by [`StatrpcConfig::discover`]
pub const CONFIG_FILE: &str = "statrpc.toml";

/// statrpc configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StatrpcConfig {
    /// Benchmarking client settings
    #[serde(default)]
    pub client: ClientConfig,
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Output settings
    #[serde(default)]
    pub output: OutputConfig,
}

/// Benchmarking client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server address (`host:port`); `$ADDR` and `--addr` override it
    #[serde(default)]
    pub addr: Option<String>,
    /// Path to stat
    #[serde(default = "default_path")]
    pub path: String,
    /// Follow symbolic links (stat) instead of reporting the link (lstat)
    #[serde(default)]
    pub follow: bool,
    /// Per-call deadline (e.g., "5s", "250ms")
    #[serde(default = "default_timeout")]
    pub timeout: String,
    /// Discarded calls before measurement
    #[serde(default = "default_warmup")]
    pub warmup: u64,
    /// Measured calls per phase
    #[serde(default = "default_iters")]
    pub iters: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            addr: None,
            path: default_path(),
            follow: false,
            timeout: default_timeout(),
            warmup: default_warmup(),
            iters: default_iters(),
        }
    }
}

fn default_path() -> String {
    "/".to_string()
}
fn default_timeout() -> String {
    "5s".to_string()
}
fn default_warmup() -> u64 {
    5
}
fn default_iters() -> u64 {
    50
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address; `:port` means all interfaces
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Connection worker threads (defaults to available parallelism)
    #[serde(default)]
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            workers: None,
        }
    }
}

fn default_listen() -> String {
    statrpc_server::default_listen_addr()
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default report format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl StatrpcConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(&dir)
    }

    /// Walk up from `start` looking for `statrpc.toml`
    pub fn discover_from(start: &Path) -> Option<Self> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!(
                            path = %config_path.display(),
                            error = %e,
                            "ignoring unreadable config file"
                        );
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# statrpc configuration

[client]
# Server address (overridden by $ADDR and --addr)
# addr = "localhost:50051"
# Path to stat
path = "/"
# Follow symbolic links (stat) instead of reporting the link (lstat)
follow = false
# Per-call deadline
timeout = "5s"
# Discarded calls before measurement
warmup = 5
# Measured calls per phase
iters = 50

[server]
# Listen address; ":port" listens on all interfaces
listen = ":50051"
# Connection worker threads (uncomment to pin; default is one per core)
# workers = 4

[output]
# Report format: human or json
format = "human"
"#
        .to_string()
    }

    /// Write [`default_toml`](Self::default_toml) to `dir/statrpc.toml`.
    /// An existing file is never overwritten.
    pub fn write_default(dir: &Path) -> anyhow::Result<PathBuf> {
        let path = dir.join(CONFIG_FILE);
        if path.exists() {
            return Err(anyhow::anyhow!("{} already exists", path.display()));
        }
        std::fs::write(&path, Self::default_toml())?;
        Ok(path)
    }

    /// Parse duration string (e.g., "5s", "500ms", "2m") to nanoseconds
    pub fn parse_duration(s: &str) -> anyhow::Result<u64> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok((value * multiplier as f64) as u64)
    }

    /// [`parse_duration`](Self::parse_duration) as a `Duration`, for clap value parsers
    pub fn parse_std_duration(s: &str) -> anyhow::Result<Duration> {
        Self::parse_duration(s).map(Duration::from_nanos)
    }
}
