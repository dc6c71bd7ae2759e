//! # taskforge
//!
//! **Taskforge** is an in-process async task execution engine.
//!
//! Callers submit units of work with a priority, timeout, retry and execution-mode config;
//! a fixed pool of workers runs them highest-priority first, retries transient failures
//! with exponential backoff, and hands terminal results back to whoever waits for them.
//!
//! ## Architecture
//! ```text
//!   submit_task / submit / submit_batch / process_parallel_batches
//!            │
//!            ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  AsyncExecutor (facade)                                         │
//! │  - Registry    (status, cancel token, result slot per task id)  │
//! │  - TaskQueue   (Urgent > High > Normal > Low, FIFO per level)   │
//! │  - RateLimiter (sliding window, shared by rate-limited tasks)   │
//! │  - ResourceMonitor (periodic memory / CPU sampling)             │
//! └──────┬──────────────────┬──────────────────┬───────────────┬────┘
//!        ▼                  ▼                  ▼               │
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │   worker 0   │   │   worker 1   │   │   worker N   │   │
//!     │ get → run →  │   │ get → run →  │   │ get → run →  │   │
//!     │ retry/settle │   │ retry/settle │   │ retry/settle │   │
//!     └┬─────────────┘   └┬─────────────┘   └┬─────────────┘   │
//!      │ inline / thread pool / child process backends         │
//!      ▼                  ▼                  ▼                 ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Bus (broadcast channel)                     │
//! └─────────────────────────────────┬───────────────────────────────┘
//!                                   ▼
//!                            SubscriberSet
//!                        ┌──────────┼──────────┐
//!                        ▼          ▼          ▼
//!                    LogWriter    custom     custom
//! ```
//!
//! ### Task lifecycle
//! ```text
//! Pending ──► Running ──┬─► Completed
//!    ▲                  ├─► Cancelled
//!    │                  ├─► Failed   (fatal / panic / retries exhausted)
//!    │                  ├─► Timeout  (retries exhausted)
//!    └──── backoff ─────┘   (retryable error, retries left)
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types                                   |
//! |-------------------|-----------------------------------------------------------|---------------------------------------------|
//! | **Executor**      | Submission, waiting, cancellation, batches, stats.        | [`AsyncExecutor`], [`ExecutorConfig`]       |
//! | **Tasks**         | Async closures, blocking closures, external commands.     | [`Callable`], [`TaskConfig`], [`TaskSpec`]  |
//! | **Policies**      | Retry classification, exponential backoff, jitter.        | [`RetryPolicy`], [`BackoffPolicy`]          |
//! | **Queueing**      | Bounded priority levels with backpressure.                | [`TaskQueue`], [`QueueLimits`]              |
//! | **Rate limiting** | Sliding-window limiter.                                   | [`RateLimiter`]                             |
//! | **Monitoring**    | Process memory / CPU sampling with threshold warnings.    | [`ResourceMonitor`], [`ResourceProbe`]      |
//! | **Events**        | Lifecycle events for logging, metrics, custom hooks.      | [`Event`], [`Subscribe`]                    |
//! | **Errors**        | Typed errors for submission and task execution.           | [`ExecutorError`], [`TaskError`]            |
//!
//! ## Optional features
//! - `logging` (default): exports the built-in [`LogWriter`], which maps events to `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskforge::{AsyncExecutor, Callable, ExecutorConfig, TaskConfig, TaskContext, TaskError, TaskPriority};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let exec = AsyncExecutor::new(ExecutorConfig::default());
//!     exec.start()?;
//!
//!     let id = exec.submit_task(
//!         "checksum",
//!         Callable::from_fn(|ctx: TaskContext| async move {
//!             if ctx.is_cancelled() {
//!                 return Err(TaskError::Canceled);
//!             }
//!             Ok::<_, TaskError>(0xC0FFEEu32)
//!         }),
//!         TaskConfig::default()
//!             .with_priority(TaskPriority::High)
//!             .with_timeout(Some(Duration::from_secs(5))),
//!     )?;
//!
//!     let result = exec.wait_for_task(&id, None).await?;
//!     assert!(result.is_successful());
//!     assert_eq!(result.value_as::<u32>(), Some(&0xC0FFEE));
//!
//!     exec.stop().await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod monitor;
mod policies;
mod queue;
mod rate_limit;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{
    AsyncExecutor, BatchOptions, BatchPolicy, ExecutorBuilder, ExecutorConfig, PerformanceStats, WaitMode,
};
pub use error::{ExecutorError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use monitor::{MonitorConfig, ResourceMonitor, ResourceProbe, ResourceSample, ResourceStats, SysinfoProbe};
pub use policies::{BackoffPolicy, JitterPolicy, RetryDecision, RetryPolicy};
pub use queue::{QueueLimits, QueueStats, TaskQueue};
pub use rate_limit::{RateLimitConfig, RateLimiter};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    BlockingFn, BoxTaskFuture, Callable, CommandOutput, CommandSpec, ExecutionMode, Task, TaskConfig, TaskContext,
    TaskFn, TaskPriority, TaskRecord, TaskRef, TaskResult, TaskSpec, TaskStatus, TaskValue,
};

// Built-in `tracing` subscriber.
// Disable with: `--no-default-features`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
