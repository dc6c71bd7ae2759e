//! # Per-attempt context handed to callables.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::rate_limit::RateLimiter;

/// Handle passed to every attempt of a task.
///
/// - [`TaskContext::token`] is cancelled when the task is cancelled, when the attempt
///   times out, or when the executor shuts down. Long-running callables should check it.
/// - [`TaskContext::rate_limiter`] is the executor's shared limiter; callables that wrap
///   capacity-constrained calls can `acquire()` it themselves.
#[derive(Clone, Debug)]
pub struct TaskContext {
    task_id: Arc<str>,
    attempt: u32,
    token: CancellationToken,
    limiter: RateLimiter,
}

impl TaskContext {
    pub(crate) fn new(task_id: Arc<str>, attempt: u32, token: CancellationToken, limiter: RateLimiter) -> Self {
        Self {
            task_id,
            attempt,
            token,
            limiter,
        }
    }

    /// Id of the task this attempt belongs to.
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Attempt number, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Cancellation token of this attempt.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Shorthand for `token().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the attempt is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// The executor's shared rate limiter.
    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}
