//! # Per-task configuration.
//!
//! [`TaskConfig`] bundles everything the engine needs to schedule and supervise one task:
//! priority, optional timeout, retry budget and backoff, execution mode, rate-limit gate,
//! an optional memory budget and free-form tags.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskforge::{ExecutionMode, TaskConfig, TaskPriority};
//!
//! let cfg = TaskConfig::default()
//!     .with_priority(TaskPriority::High)
//!     .with_timeout(Some(Duration::from_secs(5)))
//!     .with_retries(2, Duration::from_millis(200), 2.0)
//!     .with_mode(ExecutionMode::ThreadPool)
//!     .with_tag("feed:hn");
//!
//! assert_eq!(cfg.retry_policy().max_retries, 2);
//! ```

use std::time::Duration;

use crate::core::ExecutorConfig;
use crate::policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
use crate::tasks::TaskPriority;

/// Where an attempt runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    /// Awaited on the worker loop itself (cooperative). Blocking callables go to the blocking threads.
    #[default]
    Inline,
    /// Spawned onto the runtime (async) or the blocking pool (sync), bounded by `thread_pool_size`.
    ThreadPool,
    /// Runs an external program as a child process, bounded by `process_pool_size`.
    ProcessPool,
}

/// Scheduling, timeout and retry settings for one task.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskConfig {
    /// Queue level the task is placed in.
    pub priority: TaskPriority,
    /// Per-attempt timeout (`None` = unbounded).
    pub timeout: Option<Duration>,
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub retry_delay: Duration,
    /// Multiplier applied to the delay for every further retry.
    pub retry_backoff: f64,
    /// Upper bound for a single retry delay.
    pub max_retry_delay: Duration,
    /// Randomization of retry delays.
    pub jitter: JitterPolicy,
    /// Memory growth (MB) above which a warning is logged. Never enforced.
    pub memory_limit_mb: Option<f64>,
    /// Execution backend.
    pub mode: ExecutionMode,
    /// Acquire the executor's rate limiter before every attempt.
    pub rate_limited: bool,
    /// Free-form labels, copied into the result. No scheduling effect.
    pub tags: Vec<String>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            priority: TaskPriority::Normal,
            timeout: None,
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            retry_backoff: 2.0,
            max_retry_delay: Duration::from_secs(60),
            jitter: JitterPolicy::None,
            memory_limit_mb: None,
            mode: ExecutionMode::Inline,
            rate_limited: false,
            tags: Vec::new(),
        }
    }
}

impl TaskConfig {
    /// Default task settings, inheriting the executor-wide default timeout.
    pub fn with_defaults(cfg: &ExecutorConfig) -> Self {
        Self {
            timeout: cfg.default_timeout(),
            ..Self::default()
        }
    }

    /// Returns a config with updated priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Returns a config with updated per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns a config with updated retry budget and backoff.
    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration, retry_backoff: f64) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self.retry_backoff = retry_backoff;
        self
    }

    /// Returns a config with updated jitter.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Returns a config with updated execution mode.
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns a config with updated memory budget.
    pub fn with_memory_limit_mb(mut self, limit: Option<f64>) -> Self {
        self.memory_limit_mb = limit;
        self
    }

    /// Returns a config that passes the executor's rate limiter before each attempt.
    pub fn rate_limited(mut self, on: bool) -> Self {
        self.rate_limited = on;
        self
    }

    /// Returns a config with one more tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Timeout with `0s` treated as "none".
    #[inline]
    pub fn effective_timeout(&self) -> Option<Duration> {
        self.timeout.filter(|d| !d.is_zero())
    }

    /// Backoff schedule derived from `retry_delay`, `retry_backoff` and `max_retry_delay`.
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            first: self.retry_delay,
            max: self.max_retry_delay,
            factor: self.retry_backoff,
            jitter: self.jitter,
        }
    }

    /// Retry policy derived from this config.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: self.backoff(),
        }
    }
}
