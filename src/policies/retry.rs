//! # Retry policy.
//!
//! [`RetryPolicy`] turns "an attempt failed with this error" into a decision.
//! The decision depends only on data: the number of retries already performed,
//! `max_retries`, and [`TaskError::is_retryable`].
//!
//! ```text
//! decide(retries_done, err)
//!   ├─ !err.is_retryable()           ─► GiveUp
//!   ├─ retries_done >= max_retries   ─► GiveUp
//!   └─ otherwise                     ─► Retry { retry: retries_done + 1,
//!                                               delay: backoff.delay(retries_done + 1) }
//! ```
//!
//! A task with `max_retries = 2` whose callable always fails is therefore
//! attempted exactly three times.

use std::time::Duration;

use crate::error::TaskError;
use crate::policies::BackoffPolicy;

/// Outcome of [`RetryPolicy::decide`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RetryDecision {
    /// Schedule another attempt after `delay`; `retry` is the new retries count.
    Retry { retry: u32, delay: Duration },
    /// The failure is final.
    GiveUp,
}

/// How many retries a task gets and how long it waits between them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Delay schedule.
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn never() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Decides what happens after a failed attempt.
    pub fn decide(&self, retries_done: u32, err: &TaskError) -> RetryDecision {
        if !err.is_retryable() || retries_done >= self.max_retries {
            return RetryDecision::GiveUp;
        }
        let retry = retries_done + 1;
        RetryDecision::Retry {
            retry,
            delay: self.backoff.delay(retry),
        }
    }
}
