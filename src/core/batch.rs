//! # Parallel chunked processing on top of the executor.
//!
//! Splits `items` into chunks of `batch_size`, submits each chunk as one task and keeps
//! at most `max_concurrent` chunk tasks outstanding.
//!
//! ```text
//! items ──chunks(batch_size)──► [c0, c1, c2, ...]
//!                                 │
//!        ┌── in flight ≤ max_concurrent ──┐
//!        │ submit c_i ──► wait c_i result │──► slot[i] = Vec<O>
//!        └────────────────────────────────┘
//! slots (in chunk order) ──flatten──► Vec<O>
//! ```
//!
//! ## Policies
//! - [`BatchPolicy::BestEffort`]: a failed chunk is logged, published as `BatchChunkFailed`
//!   and its items are missing from the output.
//! - [`BatchPolicy::FailFast`]: the first failed chunk cancels the chunks in flight, no further
//!   chunk is submitted, and [`ExecutorError::BatchFailed`] is returned.
//!
//! Chunk results are always released from the registry, whatever `retain_results` says.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::sync::watch;

use crate::core::config::BatchPolicy;
use crate::core::executor::{AsyncExecutor, wait_result};
use crate::error::{ExecutorError, TaskError};
use crate::events::{Event, EventKind};
use crate::tasks::{Callable, TaskConfig, TaskContext, TaskResult};

static BATCH_RUN: AtomicU64 = AtomicU64::new(0);

/// Settings of one [`AsyncExecutor::process_batches_with`] run.
#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Items per chunk (`0` is treated as `1`).
    pub batch_size: usize,
    /// Chunk tasks outstanding at once (`0` is treated as `1`).
    pub max_concurrent: usize,
    /// What a failed chunk does to the run.
    pub policy: BatchPolicy,
    /// Config of every chunk task (priority, timeout, retries, mode...).
    pub config: TaskConfig,
}

impl BatchOptions {
    /// Best-effort options with a default task config.
    pub fn new(batch_size: usize, max_concurrent: usize) -> Self {
        Self {
            batch_size,
            max_concurrent,
            policy: BatchPolicy::default(),
            config: TaskConfig::default(),
        }
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(mut self, config: TaskConfig) -> Self {
        self.config = config;
        self
    }
}

impl AsyncExecutor {
    /// Processes `items` in parallel chunks and returns the successful outputs in chunk order.
    ///
    /// Uses [`ExecutorConfig::batch_policy`](crate::ExecutorConfig::batch_policy) and the
    /// executor's default task config.
    ///
    /// ```rust
    /// use taskforge::{AsyncExecutor, ExecutorConfig, TaskError};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let exec = AsyncExecutor::new(ExecutorConfig::default());
    /// exec.start()?;
    ///
    /// let doubled = exec
    ///     .process_parallel_batches(
    ///         (1..=10u32).collect(),
    ///         |chunk: Vec<u32>| async move { Ok::<_, TaskError>(chunk.into_iter().map(|n| n * 2).collect::<Vec<u32>>()) },
    ///         3,
    ///         2,
    ///     )
    ///     .await?;
    /// assert_eq!(doubled, (1..=10u32).map(|n| n * 2).collect::<Vec<_>>());
    ///
    /// exec.stop().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn process_parallel_batches<I, O, F, Fut>(
        &self,
        items: Vec<I>,
        processor: F,
        batch_size: usize,
        max_concurrent: usize,
    ) -> Result<Vec<O>, ExecutorError>
    where
        I: Clone + Send + Sync + 'static,
        O: Clone + Send + Sync + 'static,
        F: Fn(Vec<I>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<O>, TaskError>> + Send + 'static,
    {
        let cfg = self.config();
        let opts = BatchOptions::new(batch_size, max_concurrent)
            .with_policy(cfg.batch_policy)
            .with_config(TaskConfig::with_defaults(cfg));
        self.process_batches_with(items, processor, opts).await
    }

    /// Same as [`process_parallel_batches`](Self::process_parallel_batches) with explicit options.
    ///
    /// Fails with [`ExecutorError::NotAccepting`] unless the executor is running: chunk
    /// tasks would otherwise never be picked up.
    pub async fn process_batches_with<I, O, F, Fut>(
        &self,
        items: Vec<I>,
        processor: F,
        opts: BatchOptions,
    ) -> Result<Vec<O>, ExecutorError>
    where
        I: Clone + Send + Sync + 'static,
        O: Clone + Send + Sync + 'static,
        F: Fn(Vec<I>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<O>, TaskError>> + Send + 'static,
    {
        if !self.is_running() {
            return Err(ExecutorError::NotAccepting);
        }
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let run = BATCH_RUN.fetch_add(1, Ordering::Relaxed);
        let processor = Arc::new(processor);
        let chunks: Vec<Vec<I>> = items
            .chunks(opts.batch_size.max(1))
            .map(<[I]>::to_vec)
            .collect();
        let total = chunks.len();
        let limit = opts.max_concurrent.max(1);

        let mut slots: Vec<Option<Vec<O>>> = (0..total).map(|_| None).collect();
        let mut ids: Vec<Option<String>> = vec![None; total];
        let mut pending = chunks.into_iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut failure: Option<ExecutorError> = None;

        loop {
            while failure.is_none() && in_flight.len() < limit {
                let Some((idx, chunk)) = pending.next() else {
                    break;
                };
                let id = format!("batch-{run}-{idx}");
                let p = Arc::clone(&processor);
                let callable = Callable::from_fn_with(chunk, move |_ctx: TaskContext, chunk: Arc<Vec<I>>| {
                    p(chunk.as_ref().clone())
                });
                let submitted = self
                    .submit_task(id, callable, opts.config.clone())
                    .and_then(|id| self.result_receiver(&id).map(|rx| (id, rx)));
                match submitted {
                    Ok((id, rx)) => {
                        ids[idx] = Some(id);
                        in_flight.push(await_chunk(idx, rx));
                    }
                    Err(e) => {
                        self.abort_chunks(&ids);
                        failure = Some(e);
                    }
                }
            }

            let Some((idx, result)) = in_flight.next().await else {
                break;
            };
            let Some(id) = ids[idx].take() else {
                continue;
            };
            self.shared.registry.release(&id);

            match chunk_output::<O>(result) {
                Ok(values) => slots[idx] = Some(values),
                Err(_) if failure.is_some() => {}
                Err(error) => match opts.policy {
                    BatchPolicy::BestEffort => {
                        tracing::warn!(chunk = idx, task = %id, error = %error, "batch chunk failed, dropping its items");
                        self.shared.bus.publish(
                            Event::new(EventKind::BatchChunkFailed)
                                .with_task(id.as_str())
                                .with_reason(format!("chunk #{idx}: {error}")),
                        );
                    }
                    BatchPolicy::FailFast => {
                        self.abort_chunks(&ids);
                        failure = Some(ExecutorError::BatchFailed { chunk: idx, error });
                    }
                },
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }
        Ok(slots.into_iter().flatten().flatten().collect())
    }

    fn abort_chunks(&self, ids: &[Option<String>]) {
        for id in ids.iter().flatten() {
            self.cancel_task(id);
        }
    }
}

async fn await_chunk(
    idx: usize,
    rx: watch::Receiver<Option<TaskResult>>,
) -> (usize, Option<TaskResult>) {
    (idx, wait_result(rx).await)
}

/// Extracts the chunk output from its task result, or describes why there is none.
fn chunk_output<O: Clone + Send + Sync + 'static>(result: Option<TaskResult>) -> Result<Vec<O>, String> {
    let Some(result) = result else {
        return Err("result was discarded".into());
    };
    if !result.is_successful() {
        return Err(match result.error {
            Some(err) => err.to_string(),
            None => result.status.as_label().to_string(),
        });
    }
    let value = result.value.ok_or_else(|| String::from("missing output"))?;
    match value.downcast::<Vec<O>>() {
        Ok(out) => Ok(Arc::try_unwrap(out).unwrap_or_else(|shared| shared.as_ref().clone())),
        Err(_) => Err("unexpected output type".into()),
    }
}
