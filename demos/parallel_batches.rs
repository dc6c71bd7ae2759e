//! # Example: parallel_batches
//!
//! Squares 1..=100 in chunks of 10 with at most 3 chunks in flight, then runs the
//! same input fail-fast with a poisoned chunk.
//!
//! ## Run
//! ```bash
//! cargo run --example parallel_batches
//! ```

use std::time::Duration;

use taskforge::{AsyncExecutor, BatchOptions, BatchPolicy, ExecutorConfig, TaskConfig, TaskError};
use tracing_subscriber::EnvFilter;

async fn square_all(chunk: Vec<u64>) -> Result<Vec<u64>, TaskError> {
    tokio::time::sleep(Duration::from_millis(50)).await;
    if chunk.contains(&42) {
        return Err(TaskError::fatal("refusing to square 42"));
    }
    Ok(chunk.into_iter().map(|n| n * n).collect())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let exec = AsyncExecutor::new(ExecutorConfig::default());
    exec.start()?;

    let items: Vec<u64> = (1..=100).collect();
    let squares = exec
        .process_parallel_batches(items.clone(), square_all, 10, 3)
        .await?;
    println!("best effort: {} of {} items (chunk with 42 dropped)", squares.len(), items.len());

    let opts = BatchOptions::new(10, 3)
        .with_policy(BatchPolicy::FailFast)
        .with_config(TaskConfig::default().with_retries(0, Duration::ZERO, 1.0));
    match exec.process_batches_with(items, square_all, opts).await {
        Ok(out) => println!("fail fast: {} items", out.len()),
        Err(e) => println!("fail fast: {}", e.as_message()),
    }

    exec.stop().await?;
    Ok(())
}
