//! # Runtime events emitted by the executor and its workers.
//!
//! The [`EventKind`] enum classifies events across four categories:
//! - **Submission events**: a task entered or was refused by the queue
//! - **Lifecycle events**: attempt flow (starting, completed, failed, timeout, retry, cancel)
//! - **Pool events**: worker loops, shutdown and grace handling
//! - **Side-channel events**: resource warnings, batch chunks, subscriber health
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task id,
//! priority, worker index, reasons and retry delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskforge::{Event, EventKind, TaskPriority};
//!
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_task("fetch-feed")
//!     .with_priority(TaskPriority::High)
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(500))
//!     .with_reason("connection reset");
//!
//! assert_eq!(ev.kind, EventKind::RetryScheduled);
//! assert_eq!(ev.task.as_deref(), Some("fetch-feed"));
//! assert_eq!(ev.delay_ms, Some(500));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::tasks::TaskPriority;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Submission events ===
    /// Task accepted into the queue.
    ///
    /// Sets: `task`, `priority`
    TaskSubmitted,

    /// Task refused at submission (queue full, duplicate id, unsupported mode, stopped).
    ///
    /// Sets: `task`, `priority`, `reason`
    QueueRejected,

    // === Task lifecycle events ===
    /// A worker is starting an attempt.
    ///
    /// Sets: `task`, `priority`, `worker`, `attempt` (1-based)
    TaskStarting,

    /// Task finished successfully (terminal).
    ///
    /// Sets: `task`, `worker`, `attempt`
    TaskCompleted,

    /// Task failed and will not be retried (terminal).
    ///
    /// Sets: `task`, `worker`, `attempt`, `reason`
    TaskFailed,

    /// An attempt exceeded its timeout. Followed by `RetryScheduled` or `TaskFailed`.
    ///
    /// Sets: `task`, `worker`, `attempt`, `timeout_ms`
    TimeoutHit,

    /// Attempt failed with a retryable error; the task goes back to the queue after `delay_ms`.
    ///
    /// Sets: `task`, `worker`, `attempt` (the failed one), `delay_ms`, `reason`
    RetryScheduled,

    /// Task cancelled (terminal).
    ///
    /// Sets: `task`, optionally `worker`, `reason`
    TaskCancelled,

    // === Pool events ===
    /// Worker loop started.
    ///
    /// Sets: `worker`
    WorkerStarted,

    /// Worker loop exited.
    ///
    /// Sets: `worker`
    WorkerStopped,

    /// `stop()` was called.
    ShutdownRequested,

    /// All worker loops stopped within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some attempts did not stop in time.
    ///
    /// Sets: `reason` (stuck task ids)
    GraceExceeded,

    // === Side-channel events ===
    /// Process resource sample breached a configured limit.
    ///
    /// Sets: `reason`, optionally `task` (per-task memory limit)
    ResourceWarning,

    /// A parallel-batch chunk failed.
    ///
    /// Sets: `task` (chunk task id), `reason`
    BatchChunkFailed,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason`
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets: `task` (subscriber name), `reason` (panic message)
    SubscriberPanicked,
}

impl EventKind {
    /// Stable short label.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::TaskSubmitted => "task_submitted",
            EventKind::QueueRejected => "queue_rejected",
            EventKind::TaskStarting => "task_starting",
            EventKind::TaskCompleted => "task_completed",
            EventKind::TaskFailed => "task_failed",
            EventKind::TimeoutHit => "timeout_hit",
            EventKind::RetryScheduled => "retry_scheduled",
            EventKind::TaskCancelled => "task_cancelled",
            EventKind::WorkerStarted => "worker_started",
            EventKind::WorkerStopped => "worker_stopped",
            EventKind::ShutdownRequested => "shutdown_requested",
            EventKind::AllStoppedWithin => "all_stopped_within",
            EventKind::GraceExceeded => "grace_exceeded",
            EventKind::ResourceWarning => "resource_warning",
            EventKind::BatchChunkFailed => "batch_chunk_failed",
            EventKind::SubscriberOverflow => "subscriber_overflow",
            EventKind::SubscriberPanicked => "subscriber_panicked",
        }
    }
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task id (or subscriber name for subscriber events).
    pub task: Option<Arc<str>>,
    /// Queue level of the task.
    pub priority: Option<TaskPriority>,
    /// Index of the worker loop.
    pub worker: Option<usize>,
    /// Attempt count (starting from 1).
    pub attempt: Option<u32>,
    /// Attempt timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Retry delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            priority: None,
            worker: None,
            attempt: None,
            timeout_ms: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches a priority.
    #[inline]
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Attaches a worker index.
    #[inline]
    pub fn with_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(compact_ms(d));
        self
    }

    /// Attaches a retry delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(compact_ms(d));
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }

    /// `true` for subscriber health reports (overflow or panic).
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[inline]
fn compact_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::TaskSubmitted);
        let b = Event::new(EventKind::TaskStarting);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn durations_are_clamped_to_u32_ms() {
        let ev = Event::new(EventKind::TimeoutHit).with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(ev.timeout_ms, Some(u32::MAX));
    }

    #[test]
    fn subscriber_helpers() {
        let ev = Event::subscriber_overflow("log", "full");
        assert!(ev.is_subscriber_event());
        assert_eq!(ev.task.as_deref(), Some("log"));
        assert!(!Event::new(EventKind::TaskFailed).is_subscriber_event());
    }
}
