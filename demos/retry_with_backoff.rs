//! # Example: retry_with_backoff
//!
//! A task fails twice with a retryable error before succeeding; a second task hits its
//! attempt timeout every time and ends as `Timeout`.
//!
//! ## Flow
//! ```text
//! attempt 1 ──► Err(Fail)    ──► RetryScheduled{delay=100ms} ──► requeue
//! attempt 2 ──► Err(Fail)    ──► RetryScheduled{delay=200ms} ──► requeue
//! attempt 3 ──► Ok           ──► TaskCompleted
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=taskforge=debug cargo run --example retry_with_backoff
//! ```

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use taskforge::{AsyncExecutor, Callable, ExecutorConfig, JitterPolicy, TaskConfig, TaskContext, TaskError};
use tracing_subscriber::EnvFilter;

static CALLS: AtomicU32 = AtomicU32::new(0);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskforge=debug")))
        .init();

    let exec = AsyncExecutor::new(ExecutorConfig::default());
    exec.start()?;

    let flaky = Callable::from_fn(|ctx: TaskContext| async move {
        let call = CALLS.fetch_add(1, Ordering::Relaxed) + 1;
        if call <= 2 {
            println!("[flaky] attempt {} fails", ctx.attempt());
            return Err(TaskError::fail(format!("connection reset #{call}")));
        }
        println!("[flaky] attempt {} succeeds", ctx.attempt());
        Ok("payload")
    });
    let cfg = TaskConfig::default()
        .with_retries(3, Duration::from_millis(100), 2.0)
        .with_jitter(JitterPolicy::Equal);
    let id = exec.submit_task("flaky", flaky, cfg)?;
    let result = exec.wait_for_task(&id, None).await?;
    println!("flaky -> {} after {} retries", result.status.as_label(), result.retries);

    let slow = Callable::from_fn(|ctx: TaskContext| async move {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(10)) => Ok(()),
            _ = ctx.cancelled() => Err(TaskError::Canceled),
        }
    });
    let cfg = TaskConfig::default()
        .with_timeout(Some(Duration::from_millis(150)))
        .with_retries(1, Duration::from_millis(50), 1.0);
    let id = exec.submit_task("slow", slow, cfg)?;
    let result = exec.wait_for_task(&id, None).await?;
    println!(
        "slow  -> {} ({})",
        result.status.as_label(),
        result.error.map(|e| e.as_message()).unwrap_or_default()
    );

    exec.stop().await?;
    Ok(())
}
