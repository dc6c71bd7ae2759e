//! # Example: basic_submit
//!
//! Submits a few tasks with different priorities and waits for their results.
//!
//! Shows how to:
//! - Build an [`AsyncExecutor`] and start its workers.
//! - Submit async and blocking callables with a [`TaskConfig`].
//! - Wait for one task, then for a whole group.
//!
//! ## Flow
//! ```text
//! submit_task ──► TaskQueue (Urgent > High > Normal > Low)
//!                     │
//!                     ▼
//!               worker loop ──► run_once ──► TaskResult ──► wait_for_task
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=taskforge=debug cargo run --example basic_submit
//! ```

use std::time::Duration;

use taskforge::{
    AsyncExecutor, Callable, ExecutionMode, ExecutorConfig, TaskConfig, TaskContext, TaskError, TaskPriority, WaitMode,
};
use tracing_subscriber::EnvFilter;

fn word_count(text: &'static str) -> Callable {
    Callable::from_fn(move |ctx: TaskContext| async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        println!("[{}] counting words (attempt {})", ctx.task_id(), ctx.attempt());
        Ok::<_, TaskError>(text.split_whitespace().count())
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut cfg = ExecutorConfig::default();
    cfg.workers = 2;
    let exec = AsyncExecutor::new(cfg);
    exec.start()?;

    let id = exec.submit_task("greeting", word_count("hello from the executor"), TaskConfig::default())?;
    let result = exec.wait_for_task(&id, Some(Duration::from_secs(5))).await?;
    println!("greeting -> {:?} words in {:?}", result.value_as::<usize>(), result.execution_time);

    let mut ids = Vec::new();
    for (name, priority) in [
        ("report", TaskPriority::Low),
        ("alert", TaskPriority::Urgent),
        ("digest", TaskPriority::Normal),
    ] {
        let cfg = TaskConfig::default()
            .with_priority(priority)
            .with_timeout(Some(Duration::from_secs(2)))
            .with_tag(priority.as_label());
        ids.push(exec.submit_task(name, word_count("one two three"), cfg)?);
    }

    let checksum = Callable::blocking(|_ctx: TaskContext| {
        Ok::<_, TaskError>((0u64..1_000_000).fold(0u64, |acc, n| acc.wrapping_add(n * n)))
    });
    let cfg = TaskConfig::default().with_mode(ExecutionMode::ThreadPool);
    ids.push(exec.submit_task("checksum", checksum, cfg)?);

    for r in exec.wait_for_batch(&ids, None, WaitMode::AllCompleted).await? {
        println!("{:<9} {:<10} tags={:?}", r.task_id, r.status.as_label(), r.tags);
    }

    let stats = exec.get_performance_stats();
    println!(
        "completed={} failed={} success_rate={:.2} avg={:?}",
        stats.completed, stats.failed, stats.success_rate, stats.avg_execution_time
    );

    exec.stop().await?;
    Ok(())
}
