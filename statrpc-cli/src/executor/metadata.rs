//! System Metadata Collection

use super::execution::BenchmarkPlan;
use chrono::Utc;
use statrpc_report::{ReportMeta, SystemInfo};

/// Build report metadata for a run against `target`
pub fn build_report_meta(
    plan: &BenchmarkPlan,
    target: &str,
    server_host: Option<String>,
) -> ReportMeta {
    ReportMeta {
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        target: target.to_string(),
        server_host,
        path: plan.path.clone(),
        follow_symlink: plan.follow_symlink,
        warmup: plan.warmup,
        iters: plan.iters,
        timeout_ns: plan.timeout.as_nanos() as u64,
        system: system_info(),
    }
}

fn system_info() -> SystemInfo {
    SystemInfo {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpu: get_cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: num_cpus(),
    }
}

/// Get CPU model name from /proc/cpuinfo (Linux only)
fn get_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn num_cpus() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}
