//! # Example: custom_subscriber
//!
//! Attaches a metrics-style subscriber next to the built-in `LogWriter`.
//!
//! Shows how to:
//! - Implement the [`Subscribe`] trait.
//! - Inspect [`Event`] / [`EventKind`] for task lifecycle counters.
//! - Wire the subscriber in with [`AsyncExecutor::builder`].
//!
//! ## Flow
//! ```text
//! worker loops ──► Bus ──► subscriber listener ──► SubscriberSet
//!                                                   ├─► LogWriter (tracing)
//!                                                   └─► Tally.on_event()
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example custom_subscriber
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use taskforge::{AsyncExecutor, Callable, Event, EventKind, ExecutorConfig, Subscribe, TaskConfig, TaskContext, TaskError};
use tracing_subscriber::EnvFilter;

/// Counts terminal outcomes and retries.
#[derive(Default)]
struct Tally {
    completed: AtomicU64,
    failed: AtomicU64,
    retries: AtomicU64,
}

#[async_trait::async_trait]
impl Subscribe for Tally {
    async fn on_event(&self, ev: &Event) {
        match ev.kind {
            EventKind::TaskCompleted => {
                self.completed.fetch_add(1, Ordering::Relaxed);
            }
            EventKind::TaskFailed => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                println!(
                    "[tally] failed: task={} reason={}",
                    ev.task.as_deref().unwrap_or("<unknown>"),
                    ev.reason.as_deref().unwrap_or("<none>")
                );
            }
            EventKind::RetryScheduled => {
                self.retries.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    fn name(&self) -> &'static str {
        "tally"
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("taskforge=info")))
        .init();

    let tally = Arc::new(Tally::default());
    let exec = AsyncExecutor::builder(ExecutorConfig::default())
        .with_subscriber(tally.clone())
        .build();
    exec.start()?;

    let ok = Callable::from_fn(|_ctx: TaskContext| async { Ok::<_, TaskError>(()) });
    let broken = Callable::from_fn(|_ctx: TaskContext| async { Err::<(), _>(TaskError::fail("disk full")) });
    let retry = TaskConfig::default().with_retries(2, Duration::from_millis(50), 2.0);

    let mut ids = vec![exec.submit_task("alpha", ok.clone(), TaskConfig::default())?];
    ids.push(exec.submit_task("bravo", ok, TaskConfig::default())?);
    ids.push(exec.submit_task("charlie", broken, retry)?);
    for id in &ids {
        exec.wait_for_task(id, None).await?;
    }

    exec.stop().await?;
    // Subscribers run on their own workers; give them a moment to drain.
    tokio::time::sleep(Duration::from_millis(100)).await;
    println!(
        "completed={} failed={} retries={}",
        tally.completed.load(Ordering::Relaxed),
        tally.failed.load(Ordering::Relaxed),
        tally.retries.load(Ordering::Relaxed)
    );
    Ok(())
}
