//! # LogWriter: events as `tracing` records.
//!
//! Maps each [`Event`] to one `tracing` record under the `taskforge` target.
//! Install any `tracing` subscriber (e.g. `tracing-subscriber`) to see them.
//!
//! | kind                         | level  |
//! |------------------------------|--------|
//! | submitted / starting / worker| debug  |
//! | completed / cancelled / stop | info   |
//! | retry / timeout / overflow   | warn   |
//! | failed / grace / panic       | error  |
//!
//! `ResourceWarning` and `BatchChunkFailed` are not accepted: the monitor and the batch
//! processor log those directly at the point of detection.

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event-to-`tracing` subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        let priority = e.priority.map_or("-", |p| p.as_label());

        match e.kind {
            EventKind::TaskSubmitted => {
                tracing::debug!(target: "taskforge", seq = e.seq, task, priority, "task submitted");
            }
            EventKind::QueueRejected => {
                tracing::warn!(target: "taskforge", seq = e.seq, task, priority, reason, "task rejected");
            }
            EventKind::TaskStarting => {
                tracing::debug!(
                    target: "taskforge",
                    seq = e.seq,
                    task,
                    priority,
                    worker = e.worker,
                    attempt = e.attempt,
                    "attempt starting"
                );
            }
            EventKind::TaskCompleted => {
                tracing::info!(target: "taskforge", seq = e.seq, task, attempt = e.attempt, "task completed");
            }
            EventKind::TaskFailed => {
                tracing::error!(target: "taskforge", seq = e.seq, task, attempt = e.attempt, reason, "task failed");
            }
            EventKind::TimeoutHit => {
                tracing::warn!(
                    target: "taskforge",
                    seq = e.seq,
                    task,
                    attempt = e.attempt,
                    timeout_ms = e.timeout_ms,
                    "attempt timed out"
                );
            }
            EventKind::RetryScheduled => {
                tracing::warn!(
                    target: "taskforge",
                    seq = e.seq,
                    task,
                    after_attempt = e.attempt,
                    delay_ms = e.delay_ms,
                    reason,
                    "retry scheduled"
                );
            }
            EventKind::TaskCancelled => {
                tracing::info!(target: "taskforge", seq = e.seq, task, reason, "task cancelled");
            }
            EventKind::WorkerStarted => {
                tracing::debug!(target: "taskforge", worker = e.worker, "worker started");
            }
            EventKind::WorkerStopped => {
                tracing::debug!(target: "taskforge", worker = e.worker, "worker stopped");
            }
            EventKind::ShutdownRequested => {
                tracing::info!(target: "taskforge", "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                tracing::info!(target: "taskforge", "all workers stopped within grace");
            }
            EventKind::GraceExceeded => {
                tracing::error!(target: "taskforge", stuck = reason, "grace exceeded");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "taskforge", subscriber = task, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "taskforge", subscriber = task, info = reason, "subscriber panicked");
            }
            EventKind::ResourceWarning | EventKind::BatchChunkFailed => {}
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }

    fn accepts(&self, kind: EventKind) -> bool {
        !matches!(kind, EventKind::ResourceWarning | EventKind::BatchChunkFailed)
    }
}
