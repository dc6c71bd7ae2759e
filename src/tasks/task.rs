//! # Asynchronous task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable) and its shared handle [`TaskRef`].
//! A convenient closure-backed implementation lives in [`TaskFn`](crate::TaskFn).
//!
//! A task receives a [`TaskContext`] whose token should be checked periodically so
//! the attempt stops cooperatively on cancellation or timeout.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::TaskError;
use crate::tasks::{TaskContext, TaskValue};

/// Boxed future produced by one attempt. Every execution backend is awaited through this type.
pub type BoxTaskFuture = Pin<Box<dyn Future<Output = Result<TaskValue, TaskError>> + Send + 'static>>;

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;

/// # Asynchronous, cancelable unit of work.
///
/// [`spawn`](Task::spawn) is called once per attempt and must return a **fresh** future,
/// since a task may run several times under retry.
///
/// # Example
/// ```
/// use taskforge::{BoxTaskFuture, Task, TaskContext, TaskValue};
///
/// struct Ping;
///
/// impl Task for Ping {
///     fn spawn(&self, ctx: TaskContext) -> BoxTaskFuture {
///         Box::pin(async move {
///             if ctx.is_cancelled() {
///                 return Err(taskforge::TaskError::Canceled);
///             }
///             Ok(TaskValue::new("pong"))
///         })
///     }
/// }
/// ```
pub trait Task: Send + Sync + 'static {
    /// Creates the future for one attempt.
    fn spawn(&self, ctx: TaskContext) -> BoxTaskFuture;
}
