//! # Background process resource sampling.
//!
//! [`ResourceMonitor`] samples the current process every [`MonitorConfig::interval`]
//! and keeps current values plus running peaks in a shared [`ResourceStats`].
//!
//! ```text
//! start_monitoring() ──► sampler task
//!                          loop {
//!                            tick(interval)
//!                            probe.sample() ──► stats (write lock, peaks)
//!                            above limit?   ──► tracing::warn! + ResourceWarning event
//!                          }
//! stop_monitoring()  ──► cancel token (idempotent)
//! get_stats()        ──► snapshot copy (read lock)
//! ```
//!
//! ## Rules
//! - Monitoring never aborts work: a breached limit only warns.
//! - A probe that cannot read the process skips the tick.
//! - The sampler holds the stats lock only while updating, never across `.await`.

mod probe;

pub use probe::{ResourceProbe, ResourceSample, SysinfoProbe};

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::events::{Bus, Event, EventKind};

/// Monitor settings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonitorConfig {
    /// Whether [`ResourceMonitor::start_monitoring`] launches the sampler.
    pub enabled: bool,
    /// Sampling period.
    pub interval: Duration,
    /// Process memory warning threshold (MB). `0` disables the check.
    pub memory_limit_mb: f64,
    /// Process CPU warning threshold (%). `0` disables the check.
    pub cpu_limit_percent: f64,
}

impl MonitorConfig {
    fn memory_limit(&self) -> Option<f64> {
        (self.memory_limit_mb > 0.0).then_some(self.memory_limit_mb)
    }

    fn cpu_limit(&self) -> Option<f64> {
        (self.cpu_limit_percent > 0.0).then_some(self.cpu_limit_percent)
    }
}

impl Default for MonitorConfig {
    /// Enabled, sampled every second, warns above 1024 MB or 80% CPU.
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(1),
            memory_limit_mb: 1024.0,
            cpu_limit_percent: 80.0,
        }
    }
}

/// Snapshot of sampled process resources.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ResourceStats {
    pub current_memory_mb: f64,
    pub peak_memory_mb: f64,
    pub current_cpu_percent: f64,
    pub peak_cpu_percent: f64,
    /// Samples recorded.
    pub samples: u64,
    /// Samples that breached at least one limit.
    pub warnings: u64,
    pub last_sample_at: Option<SystemTime>,
}

struct Shared {
    cfg: MonitorConfig,
    probe: Mutex<Box<dyn ResourceProbe>>,
    stats: RwLock<ResourceStats>,
    bus: Option<Bus>,
}

struct Sampler {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic sampler of process memory and CPU.
pub struct ResourceMonitor {
    shared: Arc<Shared>,
    sampler: Mutex<Option<Sampler>>,
}

impl ResourceMonitor {
    /// Creates a monitor reading the current process through [`SysinfoProbe`].
    pub fn new(cfg: MonitorConfig) -> Self {
        Self::with_probe(cfg, Box::new(SysinfoProbe::new()), None)
    }

    /// Creates a monitor with a custom probe, optionally publishing warnings on `bus`.
    pub fn with_probe(cfg: MonitorConfig, probe: Box<dyn ResourceProbe>, bus: Option<Bus>) -> Self {
        Self {
            shared: Arc::new(Shared {
                cfg,
                probe: Mutex::new(probe),
                stats: RwLock::new(ResourceStats::default()),
                bus,
            }),
            sampler: Mutex::new(None),
        }
    }

    /// Monitor settings.
    pub fn config(&self) -> &MonitorConfig {
        &self.shared.cfg
    }

    /// Launches the background sampler.
    ///
    /// Returns `false` if monitoring is disabled or already running.
    /// Must be called within a Tokio runtime.
    pub fn start_monitoring(&self) -> bool {
        if !self.shared.cfg.enabled {
            return false;
        }
        let mut sampler = self.sampler.lock();
        if sampler.as_ref().is_some_and(|s| !s.handle.is_finished()) {
            return false;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(sample_loop(Arc::clone(&self.shared), token.clone()));
        *sampler = Some(Sampler { token, handle });
        true
    }

    /// Halts the background sampler. Idempotent.
    pub fn stop_monitoring(&self) {
        if let Some(sampler) = self.sampler.lock().take() {
            sampler.token.cancel();
        }
    }

    /// `true` while the sampler is running.
    pub fn is_monitoring(&self) -> bool {
        self.sampler
            .lock()
            .as_ref()
            .is_some_and(|s| !s.handle.is_finished())
    }

    /// Snapshot copy of the current stats.
    pub fn get_stats(&self) -> ResourceStats {
        *self.shared.stats.read()
    }

    /// Reads the process once without recording the sample.
    pub fn sample_now(&self) -> Option<ResourceSample> {
        self.shared.probe.lock().sample()
    }

    /// Current process memory in MB (`0.0` if unavailable).
    ///
    /// Reads memory only; the sampler's CPU measurement is not reset.
    pub fn memory_mb(&self) -> f64 {
        self.shared.probe.lock().memory_mb().unwrap_or(0.0)
    }

    /// Takes one sample and records it into the stats, as a sampler tick does.
    pub fn record_sample(&self) -> Option<ResourceSample> {
        self.shared.tick()
    }
}

impl Drop for ResourceMonitor {
    fn drop(&mut self) {
        self.stop_monitoring();
    }
}

impl Shared {
    fn tick(&self) -> Option<ResourceSample> {
        let sample = self.probe.lock().sample()?;
        let memory_over = self.cfg.memory_limit().filter(|&l| sample.memory_mb > l);
        let cpu_over = self.cfg.cpu_limit().filter(|&l| sample.cpu_percent > l);

        {
            let mut stats = self.stats.write();
            stats.current_memory_mb = sample.memory_mb;
            stats.current_cpu_percent = sample.cpu_percent;
            stats.peak_memory_mb = stats.peak_memory_mb.max(sample.memory_mb);
            stats.peak_cpu_percent = stats.peak_cpu_percent.max(sample.cpu_percent);
            stats.samples += 1;
            if memory_over.is_some() || cpu_over.is_some() {
                stats.warnings += 1;
            }
            stats.last_sample_at = Some(SystemTime::now());
        }

        if let Some(limit) = memory_over {
            tracing::warn!(
                memory_mb = sample.memory_mb,
                limit_mb = limit,
                "process memory above limit"
            );
            self.publish(format!(
                "memory {:.1}MB above limit {limit:.1}MB",
                sample.memory_mb
            ));
        }
        if let Some(limit) = cpu_over {
            tracing::warn!(
                cpu_percent = sample.cpu_percent,
                limit_percent = limit,
                "process cpu above limit"
            );
            self.publish(format!(
                "cpu {:.1}% above limit {limit:.1}%",
                sample.cpu_percent
            ));
        }
        Some(sample)
    }

    fn publish(&self, reason: String) {
        if let Some(bus) = &self.bus {
            bus.publish(Event::new(EventKind::ResourceWarning).with_reason(reason));
        }
    }
}

async fn sample_loop(shared: Arc<Shared>, token: CancellationToken) {
    let mut ticker = tokio::time::interval(shared.cfg.interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                shared.tick();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scripted(std::vec::IntoIter<ResourceSample>);

    impl ResourceProbe for Scripted {
        fn sample(&mut self) -> Option<ResourceSample> {
            self.0.next()
        }
    }

    fn scripted(samples: &[(f64, f64)]) -> Box<dyn ResourceProbe> {
        let v: Vec<_> = samples
            .iter()
            .map(|&(memory_mb, cpu_percent)| ResourceSample {
                memory_mb,
                cpu_percent,
            })
            .collect();
        Box::new(Scripted(v.into_iter()))
    }

    fn cfg(memory_limit_mb: f64, cpu_limit_percent: f64) -> MonitorConfig {
        MonitorConfig {
            enabled: true,
            interval: Duration::from_millis(100),
            memory_limit_mb,
            cpu_limit_percent,
        }
    }

    #[test]
    fn tracks_current_and_peaks() {
        let m = ResourceMonitor::with_probe(
            cfg(0.0, 0.0),
            scripted(&[(100.0, 5.0), (300.0, 50.0), (200.0, 10.0)]),
            None,
        );
        while m.record_sample().is_some() {}

        let s = m.get_stats();
        assert_eq!(s.samples, 3);
        assert_eq!(s.current_memory_mb, 200.0);
        assert_eq!(s.peak_memory_mb, 300.0);
        assert_eq!(s.current_cpu_percent, 10.0);
        assert_eq!(s.peak_cpu_percent, 50.0);
        assert_eq!(s.warnings, 0);
        assert!(s.last_sample_at.is_some());
    }

    #[tokio::test]
    async fn breached_limits_warn_and_publish() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let m = ResourceMonitor::with_probe(
            cfg(150.0, 90.0),
            scripted(&[(100.0, 10.0), (200.0, 95.0)]),
            Some(bus),
        );
        m.record_sample();
        m.record_sample();

        assert_eq!(m.get_stats().warnings, 1);
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.kind, EventKind::ResourceWarning);
        assert!(first.reason.as_deref().unwrap().starts_with("memory"));
        assert!(second.reason.as_deref().unwrap().starts_with("cpu"));
    }

    #[tokio::test(start_paused = true)]
    async fn sampler_runs_until_stopped() {
        let samples = vec![(10.0, 1.0); 100];
        let m = ResourceMonitor::with_probe(cfg(0.0, 0.0), scripted(&samples), None);

        assert!(m.start_monitoring());
        assert!(!m.start_monitoring());
        tokio::time::sleep(Duration::from_millis(350)).await;
        m.stop_monitoring();
        m.stop_monitoring();
        tokio::task::yield_now().await;

        let seen = m.get_stats().samples;
        assert!(seen >= 3, "only {seen} samples");
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(m.get_stats().samples, seen);
        assert!(!m.is_monitoring());
    }

    #[test]
    fn disabled_monitor_never_starts() {
        let mut c = cfg(0.0, 0.0);
        c.enabled = false;
        let m = ResourceMonitor::with_probe(c, scripted(&[]), None);
        assert!(!m.start_monitoring());
        assert_eq!(m.memory_mb(), 0.0);
    }

    struct Split {
        memory: f64,
    }

    impl ResourceProbe for Split {
        fn sample(&mut self) -> Option<ResourceSample> {
            Some(ResourceSample {
                memory_mb: self.memory,
                cpu_percent: 40.0,
            })
        }

        fn memory_mb(&mut self) -> Option<f64> {
            self.memory += 1.0;
            Some(self.memory)
        }
    }

    #[test]
    fn memory_reads_leave_sampling_alone() {
        let m = ResourceMonitor::with_probe(
            cfg(0.0, 0.0),
            Box::new(Split { memory: 64.0 }),
            None,
        );
        assert_eq!(m.memory_mb(), 65.0);
        assert_eq!(m.memory_mb(), 66.0);
        assert_eq!(m.get_stats().samples, 0);

        let s = m.record_sample().unwrap();
        assert_eq!(s.memory_mb, 66.0);
        assert_eq!(m.get_stats().samples, 1);
    }
}
