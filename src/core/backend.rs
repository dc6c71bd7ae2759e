//! # Execution backends.
//!
//! Turns a [`Callable`] and its [`ExecutionMode`] into one [`BoxTaskFuture`], so the
//! worker awaits every backend the same way.
//!
//! ```text
//! mode \ callable   Async                 Blocking                  Command
//! Inline            awaited on worker     spawn_blocking            child process
//! ThreadPool        tokio::spawn          spawn_blocking            child process
//!                   └── thread permit ──┘ └── thread permit ──┘     └ thread permit
//! ProcessPool       (rejected at submit)  (rejected at submit)      child process
//!                                                                   └ process permit
//! ```
//!
//! ## Rules
//! - Panics become [`TaskError::Panicked`] on every path.
//! - A pool permit lives as long as the work it guards: it moves into the spawned task,
//!   so work abandoned after a timeout still counts against the pool until it ends.
//! - Blocking closures never run on a runtime worker thread, so a timeout can abandon them.
//! - Spawned tasks are detached when their future is dropped; child processes are killed.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinError;

use crate::core::ExecutorConfig;
use crate::error::{TaskError, panic_message};
use crate::tasks::{BlockingFn, BoxTaskFuture, Callable, ExecutionMode, TaskContext, TaskRef, TaskValue};

/// Semaphores bounding the thread and process pools.
pub(crate) struct Backends {
    threads: Option<Arc<Semaphore>>,
    processes: Option<Arc<Semaphore>>,
}

impl Backends {
    pub(crate) fn new(cfg: &ExecutorConfig) -> Self {
        Self {
            threads: cfg.thread_limit().map(|n| Arc::new(Semaphore::new(n))),
            processes: cfg.process_limit().map(|n| Arc::new(Semaphore::new(n))),
        }
    }

    /// Builds the future of one attempt.
    pub(crate) fn dispatch(&self, callable: &Callable, mode: ExecutionMode, ctx: TaskContext) -> BoxTaskFuture {
        match (mode, callable) {
            (ExecutionMode::Inline, Callable::Async(task)) => guarded(task, ctx),
            (ExecutionMode::Inline, Callable::Blocking(f)) => {
                let f = Arc::clone(f);
                async move {
                    let handle = tokio::task::spawn_blocking(move || call_blocking(&f, ctx));
                    handle.await.unwrap_or_else(|e| Err(from_join(e)))
                }
                .boxed()
            }
            (ExecutionMode::ThreadPool, Callable::Async(task)) => {
                let task = Arc::clone(task);
                let sem = self.threads.clone();
                async move {
                    let permit = acquire(sem).await?;
                    let handle = tokio::spawn(async move {
                        let _permit = permit;
                        guarded(&task, ctx).await
                    });
                    handle.await.unwrap_or_else(|e| Err(from_join(e)))
                }
                .boxed()
            }
            (ExecutionMode::ThreadPool, Callable::Blocking(f)) => {
                let f = Arc::clone(f);
                let sem = self.threads.clone();
                async move {
                    let permit = acquire(sem).await?;
                    let handle = tokio::task::spawn_blocking(move || {
                        let _permit = permit;
                        f(ctx)
                    });
                    handle.await.unwrap_or_else(|e| Err(from_join(e)))
                }
                .boxed()
            }
            (mode, Callable::Command(spec)) => {
                let spec = spec.clone();
                let sem = match mode {
                    ExecutionMode::Inline => None,
                    ExecutionMode::ThreadPool => self.threads.clone(),
                    ExecutionMode::ProcessPool => self.processes.clone(),
                };
                async move {
                    let _permit = acquire(sem).await?;
                    spec.run(ctx).await.map(TaskValue::new)
                }
                .boxed()
            }
            (ExecutionMode::ProcessPool, other) => {
                let err = TaskError::fatal(format!("{} callable cannot run in a child process", other.kind()));
                async move { Err(err) }.boxed()
            }
        }
    }
}

/// Creates the task future and polls it with panics caught, both at creation and while running.
fn guarded(task: &TaskRef, ctx: TaskContext) -> BoxTaskFuture {
    match std::panic::catch_unwind(AssertUnwindSafe(|| task.spawn(ctx))) {
        Ok(fut) => AssertUnwindSafe(fut)
            .catch_unwind()
            .map(|res| res.unwrap_or_else(|p| Err(panicked(p))))
            .boxed(),
        Err(p) => {
            let err = panicked(p);
            async move { Err(err) }.boxed()
        }
    }
}

fn call_blocking(f: &BlockingFn, ctx: TaskContext) -> Result<TaskValue, TaskError> {
    std::panic::catch_unwind(AssertUnwindSafe(|| f(ctx))).unwrap_or_else(|p| Err(panicked(p)))
}

async fn acquire(sem: Option<Arc<Semaphore>>) -> Result<Option<OwnedSemaphorePermit>, TaskError> {
    match sem {
        Some(sem) => sem.acquire_owned().await.map(Some).map_err(|_| TaskError::Canceled),
        None => Ok(None),
    }
}

fn panicked(payload: Box<dyn std::any::Any + Send>) -> TaskError {
    TaskError::Panicked {
        info: panic_message(payload.as_ref()),
    }
}

fn from_join(err: JoinError) -> TaskError {
    match err.try_into_panic() {
        Ok(payload) => panicked(payload),
        Err(_) => TaskError::Canceled,
    }
}
