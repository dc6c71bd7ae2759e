//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(TaskContext) -> Fut`, producing a fresh
//! future per attempt. No state is shared between attempts unless the closure
//! captures it explicitly (e.g. through an `Arc`).
//!
//! ## Example
//! ```rust
//! use taskforge::{TaskContext, TaskError, TaskFn, TaskRef};
//!
//! let t: TaskRef = TaskFn::arc(|ctx: TaskContext| async move {
//!     Ok::<_, TaskError>(format!("attempt {}", ctx.attempt()))
//! });
//! ```

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use crate::error::TaskError;
use crate::tasks::task::{BoxTaskFuture, Task};
use crate::tasks::{TaskContext, TaskValue};

/// Function-backed task implementation.
///
/// The closure may return any `T: Send + Sync + 'static`; it is wrapped in a [`TaskValue`].
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the task and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F, Fut, T> Task for TaskFn<F>
where
    F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    T: Any + Send + Sync,
{
    fn spawn(&self, ctx: TaskContext) -> BoxTaskFuture {
        let fut = (self.f)(ctx);
        Box::pin(async move { fut.await.map(TaskValue::new) })
    }
}
