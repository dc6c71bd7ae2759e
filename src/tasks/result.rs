//! # Terminal outcome of a task.

use std::any::Any;
use std::time::{Duration, SystemTime};

use crate::error::TaskError;
use crate::tasks::{TaskStatus, TaskValue};

/// Terminal outcome record of one task (across all its attempts).
///
/// Task failures are reported here and never as an `Err` from
/// [`AsyncExecutor::wait_for_task`](crate::AsyncExecutor::wait_for_task):
/// inspect [`TaskResult::is_successful`] and [`TaskResult::error`].
#[derive(Clone, Debug)]
pub struct TaskResult {
    pub task_id: String,
    /// One of the terminal statuses.
    pub status: TaskStatus,
    pub value: Option<TaskValue>,
    pub error: Option<TaskError>,
    /// Start of the first attempt (`None` if the task never ran).
    pub started_at: Option<SystemTime>,
    pub finished_at: SystemTime,
    /// Wall time of the last attempt.
    pub execution_time: Duration,
    /// Process memory growth (MB) observed across the last attempt.
    pub memory_delta_mb: f64,
    /// Retries performed.
    pub retries: u32,
    pub tags: Vec<String>,
}

impl TaskResult {
    /// `true` iff the task completed and carries no error.
    pub fn is_successful(&self) -> bool {
        self.status == TaskStatus::Completed && self.error.is_none()
    }

    /// Borrows the success value as `T`.
    pub fn value_as<T: Any>(&self) -> Option<&T> {
        self.value.as_ref().and_then(TaskValue::downcast_ref::<T>)
    }

    /// Result for a task cancelled before or between attempts.
    pub(crate) fn cancelled(
        task_id: impl Into<String>,
        started_at: Option<SystemTime>,
        retries: u32,
        tags: Vec<String>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Cancelled,
            value: None,
            error: Some(TaskError::Canceled),
            started_at,
            finished_at: SystemTime::now(),
            execution_time: Duration::ZERO,
            memory_delta_mb: 0.0,
            retries,
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed() -> TaskResult {
        TaskResult {
            task_id: "t".into(),
            status: TaskStatus::Completed,
            value: Some(TaskValue::new(7u32)),
            error: None,
            started_at: Some(SystemTime::now()),
            finished_at: SystemTime::now(),
            execution_time: Duration::from_millis(3),
            memory_delta_mb: 0.0,
            retries: 0,
            tags: vec![],
        }
    }

    #[test]
    fn successful_requires_completed_and_no_error() {
        let ok = completed();
        assert!(ok.is_successful());
        assert_eq!(ok.value_as::<u32>(), Some(&7));

        let mut with_error = completed();
        with_error.error = Some(TaskError::fail("late"));
        assert!(!with_error.is_successful());

        let cancelled = TaskResult::cancelled("t", None, 1, vec![]);
        assert!(!cancelled.is_successful());
        assert_eq!(cancelled.status, TaskStatus::Cancelled);
    }
}
