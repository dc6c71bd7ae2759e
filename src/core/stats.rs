//! # Executor counters and the performance snapshot.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use crate::monitor::ResourceStats;
use crate::queue::QueueStats;
use crate::tasks::TaskStatus;

/// Lock-free counters updated by the executor and its workers.
#[derive(Default)]
pub(crate) struct Counters {
    submitted: AtomicU64,
    rejected: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    cancelled: AtomicU64,
    retries: AtomicU64,
    exec_nanos: AtomicU64,
    running: AtomicUsize,
}

impl Counters {
    pub(crate) fn submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn retried(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn attempt_started(&self) {
        self.running.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn attempt_finished(&self, took: Duration) {
        self.running.fetch_sub(1, Ordering::Relaxed);
        let nanos = u64::try_from(took.as_nanos()).unwrap_or(u64::MAX);
        self.exec_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Counts one terminal outcome.
    pub(crate) fn finished(&self, status: TaskStatus) {
        let counter = match status {
            TaskStatus::Completed => &self.completed,
            TaskStatus::Failed => &self.failed,
            TaskStatus::Timeout => &self.timed_out,
            TaskStatus::Cancelled => &self.cancelled,
            TaskStatus::Pending | TaskStatus::Running => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(
        &self,
        workers: usize,
        uptime: Duration,
        queue: QueueStats,
        resources: ResourceStats,
    ) -> PerformanceStats {
        let completed = self.completed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let timed_out = self.timed_out.load(Ordering::Relaxed);
        let cancelled = self.cancelled.load(Ordering::Relaxed);
        let finished = completed + failed + timed_out + cancelled;
        let exec_nanos = self.exec_nanos.load(Ordering::Relaxed);

        PerformanceStats {
            workers,
            uptime,
            submitted: self.submitted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            completed,
            failed,
            timed_out,
            cancelled,
            retries: self.retries.load(Ordering::Relaxed),
            running: self.running.load(Ordering::Relaxed),
            queued: queue.total(),
            success_rate: if finished == 0 {
                0.0
            } else {
                completed as f64 / finished as f64
            },
            avg_execution_time: if finished == 0 {
                Duration::ZERO
            } else {
                Duration::from_nanos(exec_nanos / finished)
            },
            queue,
            resources,
        }
    }
}

/// Point-in-time executor statistics.
#[derive(Clone, Debug, PartialEq)]
pub struct PerformanceStats {
    pub workers: usize,
    /// Time since `start()` (zero if never started).
    pub uptime: Duration,
    pub submitted: u64,
    /// Submissions refused (full queue, duplicate, unsupported mode, stopped).
    pub rejected: u64,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub cancelled: u64,
    /// Retries scheduled across all tasks.
    pub retries: u64,
    /// Attempts currently executing.
    pub running: usize,
    /// Tasks currently enqueued.
    pub queued: usize,
    /// `completed / finished` (`0.0` before the first terminal result).
    pub success_rate: f64,
    /// Attempt time summed over all attempts, divided by terminal results.
    pub avg_execution_time: Duration,
    pub queue: QueueStats,
    pub resources: ResourceStats,
}
