//! # Process resource probes.
//!
//! [`ResourceProbe`] is the seam between the monitor and the OS. The default
//! [`SysinfoProbe`] reads the current process through the `sysinfo` crate; tests plug in
//! scripted probes.

use sysinfo::{Pid, ProcessRefreshKind, System};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One reading of the current process.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResourceSample {
    /// Resident memory in MB.
    pub memory_mb: f64,
    /// CPU usage in percent (may exceed 100 on multi-core hosts).
    pub cpu_percent: f64,
}

/// Source of process resource readings.
pub trait ResourceProbe: Send + 'static {
    /// Takes one reading, or `None` if the platform cannot provide it.
    fn sample(&mut self) -> Option<ResourceSample>;

    /// Reads resident memory only, for per-task deltas.
    ///
    /// Must not disturb what [`sample`](Self::sample) measures between two calls.
    fn memory_mb(&mut self) -> Option<f64> {
        self.sample().map(|s| s.memory_mb)
    }
}

/// [`ResourceProbe`] backed by [`sysinfo`].
///
/// CPU usage is computed between two refreshes, so the first reading reports `0.0`.
/// Memory-only reads use a separate [`System`] so they leave the CPU baseline alone.
pub struct SysinfoProbe {
    system: System,
    memory: System,
    pid: Option<Pid>,
}

impl SysinfoProbe {
    /// Creates a probe for the current process.
    pub fn new() -> Self {
        Self {
            system: System::new(),
            memory: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SysinfoProbe {
    fn sample(&mut self) -> Option<ResourceSample> {
        let pid = self.pid?;
        if !self.system.refresh_process(pid) {
            return None;
        }
        let process = self.system.process(pid)?;
        Some(ResourceSample {
            memory_mb: process.memory() as f64 / BYTES_PER_MB,
            cpu_percent: f64::from(process.cpu_usage()),
        })
    }

    fn memory_mb(&mut self) -> Option<f64> {
        let pid = self.pid?;
        if !self
            .memory
            .refresh_process_specifics(pid, ProcessRefreshKind::new().with_memory())
        {
            return None;
        }
        let process = self.memory.process(pid)?;
        Some(process.memory() as f64 / BYTES_PER_MB)
    }
}
