//! Latency Sampling
//!
//! Wall-clock timing of individual calls. Each sample records the elapsed
//! time between issuing a call and receiving its result (or error).

use std::time::{Duration, Instant};

/// Where a sample was measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleSource {
    /// A remote Stat call through the RPC transport
    Remote,
    /// A direct local syscall
    Local,
}

/// A single elapsed-duration measurement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencySample {
    /// Which series this sample belongs to
    pub source: SampleSource,
    /// Elapsed wall-clock time
    pub elapsed: Duration,
}

/// Timer for a single call
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer
    #[inline(always)]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Stop the timer and tag the elapsed time with its source
    #[inline(always)]
    pub fn stop(&self, source: SampleSource) -> LatencySample {
        LatencySample {
            source,
            elapsed: self.start.elapsed(),
        }
    }
}

/// Run `f` once and time it, whatever it returns.
#[inline]
pub fn time_call<T>(source: SampleSource, f: impl FnOnce() -> T) -> (T, LatencySample) {
    let timer = Timer::start();
    let value = f();
    (value, timer.stop(source))
}

/// Set CPU affinity to pin the current thread to a specific core
///
/// Avoids core migrations between samples.
#[cfg(target_os = "linux")]
pub fn pin_to_cpu(cpu: usize) -> Result<(), std::io::Error> {
    use std::mem::MaybeUninit;

    // CPU_SET indexes a fixed-size mask
    if cpu >= libc::CPU_SETSIZE as usize {
        return Err(std::io::Error::from_raw_os_error(libc::EINVAL));
    }

    unsafe {
        let mut set = MaybeUninit::<libc::cpu_set_t>::zeroed();
        let set_ref = set.assume_init_mut();

        libc::CPU_ZERO(set_ref);
        libc::CPU_SET(cpu, set_ref);

        let result = libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), set_ref);

        if result == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }
}

/// CPU pinning is not supported on this platform; always succeeds.
#[cfg(not(target_os = "linux"))]
pub fn pin_to_cpu(_cpu: usize) -> Result<(), std::io::Error> {
    Ok(())
}
