//! # What a task runs.
//!
//! [`Callable`] is the inbound boundary of the engine. Arguments are bound by closure
//! capture ([`Callable::from_fn_with`] binds a shared argument value explicitly), and every
//! variant is `Fn` rather than `FnOnce` because a callable may run more than once under retry.
//!
//! ```text
//! Callable::Async    ── Inline | ThreadPool
//! Callable::Blocking ── Inline | ThreadPool
//! Callable::Command  ── Inline | ThreadPool | ProcessPool
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::TaskError;
use crate::tasks::{CommandSpec, ExecutionMode, TaskContext, TaskFn, TaskRef, TaskValue};

/// Synchronous closure type stored by [`Callable::Blocking`].
pub type BlockingFn = Arc<dyn Fn(TaskContext) -> Result<TaskValue, TaskError> + Send + Sync>;

/// Unit of work submitted to the executor.
#[derive(Clone)]
pub enum Callable {
    /// Async work.
    Async(TaskRef),
    /// Synchronous work; should not be used inline if it blocks for long.
    Blocking(BlockingFn),
    /// External program.
    Command(CommandSpec),
}

impl Callable {
    /// Wraps an async closure.
    ///
    /// ```rust
    /// use taskforge::{Callable, TaskContext, TaskError};
    ///
    /// let c = Callable::from_fn(|_ctx: TaskContext| async { Ok::<_, TaskError>(42u64) });
    /// assert_eq!(c.kind(), "async");
    /// ```
    pub fn from_fn<F, Fut, T>(f: F) -> Self
    where
        F: Fn(TaskContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
        T: Any + Send + Sync,
    {
        Callable::Async(TaskFn::arc(f))
    }

    /// Wraps an async closure together with the arguments it is called with.
    pub fn from_fn_with<A, F, Fut, T>(args: A, f: F) -> Self
    where
        A: Send + Sync + 'static,
        F: Fn(TaskContext, Arc<A>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
        T: Any + Send + Sync,
    {
        let args = Arc::new(args);
        Self::from_fn(move |ctx: TaskContext| f(ctx, Arc::clone(&args)))
    }

    /// Wraps a synchronous closure.
    pub fn blocking<F, T>(f: F) -> Self
    where
        F: Fn(TaskContext) -> Result<T, TaskError> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        Callable::Blocking(Arc::new(move |ctx: TaskContext| f(ctx).map(TaskValue::new)))
    }

    /// Wraps an external program.
    pub fn command(spec: CommandSpec) -> Self {
        Callable::Command(spec)
    }

    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Callable::Async(_) => "async",
            Callable::Blocking(_) => "blocking",
            Callable::Command(_) => "command",
        }
    }

    /// Whether this callable can run under `mode`.
    pub fn supports(&self, mode: ExecutionMode) -> bool {
        match mode {
            ExecutionMode::Inline | ExecutionMode::ThreadPool => true,
            ExecutionMode::ProcessPool => matches!(self, Callable::Command(_)),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Command(spec) => f.debug_tuple("Command").field(spec).finish(),
            other => write!(f, "Callable::{}", other.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_pool_only_runs_commands() {
        let a = Callable::from_fn(|_ctx: TaskContext| async { Ok::<_, TaskError>(()) });
        let b = Callable::blocking(|_ctx: TaskContext| Ok::<_, TaskError>(1u8));
        let c = Callable::command(CommandSpec::new("true"));
        assert!(!a.supports(ExecutionMode::ProcessPool));
        assert!(!b.supports(ExecutionMode::ProcessPool));
        assert!(c.supports(ExecutionMode::ProcessPool));
        for mode in [ExecutionMode::Inline, ExecutionMode::ThreadPool] {
            assert!(a.supports(mode) && b.supports(mode) && c.supports(mode));
        }
    }
}
