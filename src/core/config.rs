//! # Executor configuration.
//!
//! Provides [`ExecutorConfig`], the centralized settings for an [`AsyncExecutor`](crate::AsyncExecutor).
//!
//! Config is used in two ways:
//! 1. **Executor creation**: `AsyncExecutor::builder(config).build()`
//! 2. **TaskConfig defaults**: `TaskConfig::with_defaults(&config)`
//!
//! ## Sentinel values
//! - `default_timeout = 0s` → no timeout
//! - `thread_pool_size = 0` / `process_pool_size = 0` → unlimited (no semaphore)
//! - `bus_capacity` is clamped to at least 1, `workers` to at least 1
//! - `rate_limit.max_calls = 0` → limiter never waits
//! - queue limit `0` → that priority level is unbounded
//! - `max_retained_results = 0` → finished results are never evicted

use std::time::Duration;

use crate::monitor::MonitorConfig;
use crate::queue::QueueLimits;
use crate::rate_limit::RateLimitConfig;

/// Failure handling of [`AsyncExecutor::process_parallel_batches`](crate::AsyncExecutor::process_parallel_batches).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Failed chunks are logged and dropped; successful chunks are returned.
    #[default]
    BestEffort,
    /// The first failed chunk aborts the run with `ExecutorError::BatchFailed`.
    FailFast,
}

/// Global configuration for the executor.
///
/// All fields are public. Prefer the helper accessors to avoid sprinkling
/// sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    /// Number of worker loops.
    pub workers: usize,
    /// Per-priority queue bounds.
    pub queue_limits: QueueLimits,
    /// Upper bound on how long an idle worker waits before re-probing the queue.
    pub idle_backoff: Duration,
    /// Capacity of the event bus ring buffer.
    pub bus_capacity: usize,
    /// Maximum wait for in-flight attempts on `stop()`.
    pub grace: Duration,
    /// Concurrent `ThreadPool` attempts (`0` = unlimited).
    pub thread_pool_size: usize,
    /// Concurrent `ProcessPool` children (`0` = unlimited).
    pub process_pool_size: usize,
    /// Shared rate limiter settings.
    pub rate_limit: RateLimitConfig,
    /// Resource monitor settings.
    pub monitor: MonitorConfig,
    /// Default failure handling of parallel batches.
    pub batch_policy: BatchPolicy,
    /// Keep results after `wait_for_task` delivered them.
    pub retain_results: bool,
    /// Finished results kept at most; the oldest nobody waits on are evicted first
    /// (`0` = unlimited).
    pub max_retained_results: usize,
    /// Default per-attempt timeout (`0s` = none), inherited by `TaskConfig::with_defaults`.
    pub default_timeout: Duration,
    /// Attach the built-in `LogWriter` subscriber.
    pub log_events: bool,
}

impl ExecutorConfig {
    /// Worker count clamped to at least 1.
    #[inline]
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }

    /// Default per-attempt timeout as an `Option`.
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.default_timeout == Duration::ZERO {
            None
        } else {
            Some(self.default_timeout)
        }
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Thread pool bound as an `Option` (`None` = unlimited).
    #[inline]
    pub fn thread_limit(&self) -> Option<usize> {
        (self.thread_pool_size > 0).then_some(self.thread_pool_size)
    }

    /// Process pool bound as an `Option` (`None` = unlimited).
    #[inline]
    pub fn process_limit(&self) -> Option<usize> {
        (self.process_pool_size > 0).then_some(self.process_pool_size)
    }

    /// Retained result bound as an `Option` (`None` = unlimited).
    #[inline]
    pub fn retention_limit(&self) -> Option<usize> {
        (self.max_retained_results > 0).then_some(self.max_retained_results)
    }
}

impl Default for ExecutorConfig {
    /// Default configuration:
    ///
    /// - `workers = 4`
    /// - `queue_limits = 1000` per level
    /// - `idle_backoff = 10ms`
    /// - `bus_capacity = 1024`
    /// - `grace = 30s`
    /// - `thread_pool_size = 4`, `process_pool_size = 2`
    /// - `rate_limit = 10 calls / 1s`
    /// - `monitor = MonitorConfig::default()`
    /// - `batch_policy = BestEffort`
    /// - `retain_results = false`
    /// - `max_retained_results = 10_000`
    /// - `default_timeout = 0s` (none)
    /// - `log_events = true`
    fn default() -> Self {
        Self {
            workers: 4,
            queue_limits: QueueLimits::default(),
            idle_backoff: Duration::from_millis(10),
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
            thread_pool_size: 4,
            process_pool_size: 2,
            rate_limit: RateLimitConfig::default(),
            monitor: MonitorConfig::default(),
            batch_policy: BatchPolicy::default(),
            retain_results: false,
            max_retained_results: 10_000,
            default_timeout: Duration::ZERO,
            log_events: true,
        }
    }
}
