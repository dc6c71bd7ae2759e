//! # Scheduling priority and lifecycle status.
//!
//! ## State machine (per task, across attempts)
//! ```text
//! Pending ──► Running ──► Completed                       (terminal)
//!                    ├──► Cancelled                       (terminal)
//!                    ├──► Failed   (no retries left)      (terminal)
//!                    ├──► Timeout  (no retries left)      (terminal)
//!                    └──► Failed/Timeout with retries left ──► Pending
//! ```

/// Scheduling priority. Only used to order dequeues, it carries no business meaning.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TaskPriority {
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    Urgent = 3,
}

impl TaskPriority {
    /// All levels in dequeue order (highest first).
    pub const DESCENDING: [TaskPriority; 4] = [
        TaskPriority::Urgent,
        TaskPriority::High,
        TaskPriority::Normal,
        TaskPriority::Low,
    ];

    /// Dense index of the level (`Low = 0` .. `Urgent = 3`).
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns a short stable label for logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Normal => "normal",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Waiting in the queue (or sleeping before a retry).
    Pending,
    /// An attempt is executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Failed with no retries left (or with a non-retryable error).
    Failed,
    /// Cancelled explicitly or by shutdown.
    Cancelled,
    /// Last attempt exceeded its timeout and no retries were left.
    Timeout,
}

impl TaskStatus {
    /// `true` for `Completed`, `Failed`, `Cancelled` and `Timeout`.
    ///
    /// A `Timeout` observed on an intermediate attempt is never stored as a status:
    /// the task goes straight back to `Pending` when a retry is scheduled.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }

    /// Returns a short stable label for logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
            TaskStatus::Timeout => "timeout",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_are_totally_ordered() {
        assert!(TaskPriority::Urgent > TaskPriority::High);
        assert!(TaskPriority::High > TaskPriority::Normal);
        assert!(TaskPriority::Normal > TaskPriority::Low);
        let mut sorted = TaskPriority::DESCENDING;
        sorted.sort();
        sorted.reverse();
        assert_eq!(sorted, TaskPriority::DESCENDING);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        for s in [
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Cancelled,
            TaskStatus::Timeout,
        ] {
            assert!(s.is_terminal(), "{s:?}");
        }
    }
}
