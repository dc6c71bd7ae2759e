//! Retry policies.
//!
//! This module groups the knobs that control **whether** a failed attempt is
//! retried and **how long** a task waits before its next attempt.
//!
//! ## Contents
//! - [`RetryPolicy`]   how many retries a task gets, and which errors qualify
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid thundering herd
//!
//! ## Quick wiring
//! ```text
//! TaskConfig { max_retries, retry_delay, retry_backoff, max_retry_delay, jitter }
//!      └─► TaskConfig::retry_policy() ─► RetryPolicy { max_retries, backoff }
//!           └─► core::pool worker calls decide(retries_done, &err)
//!                 ├─ Retry { retry, delay } ─► sleep(delay), requeue
//!                 └─ GiveUp                 ─► terminal TaskResult
//! ```
//!
//! ## Defaults
//! - `max_retries = 3`
//! - `BackoffPolicy::default()` → first=1s, factor=2.0, max=60s, jitter=None.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::{RetryDecision, RetryPolicy};
