//! Error types used by the executor and by tasks.
//!
//! This module defines two main error enums:
//!
//! - [`ExecutorError`]: errors raised by the engine itself (admission, waiting, lifecycle).
//! - [`TaskError`]: errors raised by individual task attempts.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.
//! Retry decisions are driven by [`TaskError::is_retryable`], never by the error's identity.

use std::any::Any;
use std::time::Duration;
use thiserror::Error;

use crate::tasks::{ExecutionMode, TaskPriority};

/// # Errors produced by the executor.
///
/// These never describe a task's own failure: a task that fails is reported
/// through its [`TaskResult`](crate::TaskResult), not through this type.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExecutorError {
    /// The queue for this priority level is at its configured bound.
    #[error("queue for {priority:?} priority is full (capacity {capacity})")]
    QueueFull {
        /// Priority level that rejected the task.
        priority: TaskPriority,
        /// Configured bound of that level.
        capacity: usize,
    },

    /// A task with the same id is still in flight.
    #[error("task {id:?} is already in flight")]
    DuplicateTask {
        /// Offending task id.
        id: String,
    },

    /// No task with this id is known (never submitted, or its result was already delivered).
    #[error("unknown task {id:?}")]
    UnknownTask {
        /// Requested task id.
        id: String,
    },

    /// The executor has been stopped and no longer accepts submissions.
    #[error("executor is not accepting new tasks")]
    NotAccepting,

    /// `start()` was called on an executor that is already running or was stopped.
    #[error("executor already started")]
    AlreadyStarted,

    /// The callable cannot run under the requested execution mode.
    #[error("{callable} callable cannot run in {mode:?} mode")]
    UnsupportedMode {
        /// Requested mode.
        mode: ExecutionMode,
        /// Kind of callable (`async`, `blocking`, `command`).
        callable: &'static str,
    },

    /// Waiting for a result exceeded the caller's wait budget.
    #[error("gave up waiting for {id:?} after {timeout:?}")]
    WaitTimeout {
        /// Task id (or a comma separated list for batch waits).
        id: String,
        /// Wait budget that was exceeded.
        timeout: Duration,
    },

    /// A chunk of a fail-fast batch run did not succeed.
    #[error("batch chunk #{chunk} failed: {error}")]
    BatchFailed {
        /// Zero-based chunk index.
        chunk: usize,
        /// Failure description.
        error: String,
    },

    /// Shutdown grace period was exceeded; some tasks were still running.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Ids of the tasks that were still running.
        stuck: Vec<String>,
    },
}

impl ExecutorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskforge::ExecutorError;
    ///
    /// let err = ExecutorError::NotAccepting;
    /// assert_eq!(err.as_label(), "executor_not_accepting");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecutorError::QueueFull { .. } => "executor_queue_full",
            ExecutorError::DuplicateTask { .. } => "executor_duplicate_task",
            ExecutorError::UnknownTask { .. } => "executor_unknown_task",
            ExecutorError::NotAccepting => "executor_not_accepting",
            ExecutorError::AlreadyStarted => "executor_already_started",
            ExecutorError::UnsupportedMode { .. } => "executor_unsupported_mode",
            ExecutorError::WaitTimeout { .. } => "executor_wait_timeout",
            ExecutorError::BatchFailed { .. } => "executor_batch_failed",
            ExecutorError::GraceExceeded { .. } => "executor_grace_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ExecutorError::QueueFull { priority, capacity } => {
                format!("queue full: priority={priority:?} capacity={capacity}")
            }
            ExecutorError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck:?}")
            }
            other => other.to_string(),
        }
    }
}

/// # Errors produced by task execution.
///
/// Some errors are retryable (`Timeout`, `Fail`), others are final.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    /// Attempt exceeded its timeout duration.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout: Duration,
    },

    /// Non-recoverable error (never retried).
    #[error("fatal error (no retry): {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Attempt failed but may succeed if retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task was cancelled before or during execution.
    #[error("task cancelled")]
    Canceled,

    /// The callable panicked.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl TaskError {
    /// Builds a retryable failure from anything printable.
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Builds a non-retryable failure from anything printable.
    pub fn fatal(error: impl std::fmt::Display) -> Self {
        TaskError::Fatal {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use taskforge::TaskError;
    /// use std::time::Duration;
    ///
    /// let err = TaskError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "task_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            TaskError::Fatal { error } => format!("fatal: {error}"),
            TaskError::Fail { error } => format!("error: {error}"),
            TaskError::Canceled => "cancelled".to_string(),
            TaskError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Indicates whether the error type is safe to retry.
    ///
    /// Returns `true` for [`TaskError::Fail`] and [`TaskError::Timeout`],
    /// `false` otherwise.
    ///
    /// # Example
    /// ```
    /// use taskforge::TaskError;
    ///
    /// assert!(TaskError::fail("flaky upstream").is_retryable());
    /// assert!(!TaskError::fatal("bad input").is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. } | TaskError::Timeout { .. })
    }
}

/// Renders a panic payload caught with `catch_unwind`.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_classification() {
        assert!(TaskError::fail("x").is_retryable());
        assert!(TaskError::Timeout {
            timeout: Duration::from_millis(5)
        }
        .is_retryable());
        assert!(!TaskError::fatal("x").is_retryable());
        assert!(!TaskError::Canceled.is_retryable());
        assert!(!TaskError::Panicked { info: "boom".into() }.is_retryable());
    }

    #[test]
    fn labels_are_stable() {
        let err = ExecutorError::QueueFull {
            priority: TaskPriority::High,
            capacity: 2,
        };
        assert_eq!(err.as_label(), "executor_queue_full");
        assert_eq!(err.as_message(), "queue full: priority=High capacity=2");
        assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    }

    #[test]
    fn panic_payloads_render() {
        let a: Box<dyn Any + Send> = Box::new("static");
        let b: Box<dyn Any + Send> = Box::new(String::from("owned"));
        let c: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(a.as_ref()), "static");
        assert_eq!(panic_message(b.as_ref()), "owned");
        assert_eq!(panic_message(c.as_ref()), "unknown panic");
    }
}
