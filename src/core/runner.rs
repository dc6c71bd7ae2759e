//! # Run a single attempt of a task.
//!
//! Executes one attempt of a [`TaskRecord`] through the [`Backends`], with the optional
//! rate-limit gate, the optional timeout and the task's cancellation token.
//!
//! ```text
//! rate_limited? ──► limiter.acquire()
//! dispatch(callable, mode, ctx{child token})
//!   ├─ Ok / Err            ──► returned as is
//!   ├─ timeout elapsed     ──► cancel child → publish TimeoutHit → Err(Timeout)
//!   └─ task token fired    ──► cancel child → Err(Canceled)
//! ```
//!
//! ## Rules
//! - A **child token** is derived per attempt; cancelling it never cancels the task token.
//! - Timeout is enforced at the waiting layer: the future is dropped, detached work
//!   may keep running until it observes its token.
//! - Task-token cancellation wins over a simultaneous result (`biased` select).

use tokio::time;

use crate::core::backend::Backends;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::rate_limit::RateLimiter;
use crate::tasks::{TaskContext, TaskRecord, TaskValue};

/// Everything an attempt needs besides the task itself.
pub(crate) struct AttemptEnv<'a> {
    pub backends: &'a Backends,
    pub limiter: &'a RateLimiter,
    pub bus: &'a Bus,
    pub worker: usize,
}

/// Executes one attempt of `record`.
pub(crate) async fn run_once(
    env: &AttemptEnv<'_>,
    record: &TaskRecord,
    attempt: u32,
) -> Result<TaskValue, TaskError> {
    let cfg = record.config();
    let task_token = record.token();
    let child = task_token.child_token();
    let ctx = TaskContext::new(record.id_arc(), attempt, child.clone(), env.limiter.clone());

    let work = async {
        if cfg.rate_limited {
            env.limiter.acquire().await;
        }
        let fut = env.backends.dispatch(record.callable(), cfg.mode, ctx);
        match cfg.effective_timeout() {
            Some(dur) => match time::timeout(dur, fut).await {
                Ok(res) => res,
                Err(_elapsed) => {
                    child.cancel();
                    env.bus.publish(
                        Event::new(EventKind::TimeoutHit)
                            .with_task(record.id_arc())
                            .with_worker(env.worker)
                            .with_attempt(attempt)
                            .with_timeout(dur),
                    );
                    Err(TaskError::Timeout { timeout: dur })
                }
            },
            None => fut.await,
        }
    };

    tokio::select! {
        biased;
        _ = task_token.cancelled() => {
            child.cancel();
            Err(TaskError::Canceled)
        }
        res = work => res,
    }
}
