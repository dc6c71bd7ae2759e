//! # Task specification for submission.
//!
//! Defines [`TaskSpec`], the bundle handed to
//! [`AsyncExecutor::submit`](crate::AsyncExecutor::submit) and
//! [`AsyncExecutor::submit_batch`](crate::AsyncExecutor::submit_batch):
//! a caller-chosen id, the [`Callable`] and its [`TaskConfig`].

use crate::tasks::{Callable, TaskConfig, TaskPriority};

/// Id + callable + config.
///
/// ## Example
/// ```rust
/// use taskforge::{Callable, TaskContext, TaskError, TaskPriority, TaskSpec};
///
/// let spec = TaskSpec::new("fetch-hn", Callable::from_fn(|_ctx: TaskContext| async {
///     Ok::<_, TaskError>(())
/// }))
/// .with_priority(TaskPriority::High);
///
/// assert_eq!(spec.id(), "fetch-hn");
/// assert_eq!(spec.config().priority, TaskPriority::High);
/// ```
#[derive(Clone, Debug)]
pub struct TaskSpec {
    id: String,
    callable: Callable,
    config: TaskConfig,
}

impl TaskSpec {
    /// Creates a spec with the default [`TaskConfig`].
    pub fn new(id: impl Into<String>, callable: Callable) -> Self {
        Self {
            id: id.into(),
            callable,
            config: TaskConfig::default(),
        }
    }

    /// Returns the task id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the callable.
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Returns the config.
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Returns a new spec with the given config.
    pub fn with_config(mut self, config: TaskConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns a new spec with updated priority.
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.config.priority = priority;
        self
    }

    pub(crate) fn into_parts(self) -> (String, Callable, TaskConfig) {
        (self.id, self.callable, self.config)
    }
}
