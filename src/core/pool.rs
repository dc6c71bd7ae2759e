//! # WorkerPool: N worker loops over the shared queue.
//!
//! Each worker loop repeatedly takes the highest-priority task from the [`TaskQueue`],
//! runs one attempt and applies the task's retry policy.
//!
//! ## Worker loop
//! ```text
//! loop {
//!   ├─► pool token cancelled? → exit
//!   ├─► queue.get()
//!   │     └─ empty → wait(queue notify | idle_backoff | pool token)
//!   ├─► mark Running, baseline memory, publish TaskStarting
//!   ├─► run_once(attempt) ──► backend (inline / thread pool / process)
//!   │       ├─ Ok                  → Completed
//!   │       ├─ Err(Canceled)       → Cancelled
//!   │       └─ Err(e) → RetryPolicy::decide(retries, e)
//!   │             ├─ Retry{delay}  → Pending, publish RetryScheduled,
//!   │             │                  sleep(delay) (task/pool cancel → Cancelled),
//!   │             │                  requeue
//!   │             └─ GiveUp        → Failed | Timeout
//!   └─► TaskResult → registry (wakes waiters), counters, event
//! }
//! ```
//!
//! ## Rules
//! - Attempts of one task never overlap: the record is owned by exactly one worker or the queue.
//! - A worker never exits because of a task: errors and panics become results.
//! - Workers are non-preemptive: a running lower-priority task is never interrupted
//!   for a higher-priority arrival.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::ExecutorConfig;
use crate::core::backend::Backends;
use crate::core::registry::Registry;
use crate::core::runner::{AttemptEnv, run_once};
use crate::core::stats::Counters;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::monitor::ResourceMonitor;
use crate::policies::RetryDecision;
use crate::queue::TaskQueue;
use crate::rate_limit::RateLimiter;
use crate::tasks::{TaskRecord, TaskResult, TaskStatus, TaskValue};

const MIN_IDLE_BACKOFF: Duration = Duration::from_millis(1);

/// State shared by the executor facade and every worker loop.
pub(crate) struct Shared {
    pub cfg: ExecutorConfig,
    pub queue: TaskQueue,
    pub registry: Registry,
    pub limiter: RateLimiter,
    pub monitor: ResourceMonitor,
    pub backends: Backends,
    pub counters: Counters,
    pub bus: Bus,
}

impl Shared {
    /// Publishes a terminal result: registry (wakes waiters), counters and event.
    pub(crate) fn finish(&self, result: TaskResult, worker: Option<usize>, attempt: Option<u32>) {
        let mut ev = match result.status {
            TaskStatus::Completed => Event::new(EventKind::TaskCompleted),
            TaskStatus::Cancelled => Event::new(EventKind::TaskCancelled),
            _ => Event::new(EventKind::TaskFailed),
        }
        .with_task(result.task_id.as_str());
        if let Some(err) = &result.error {
            ev = ev.with_reason(err.to_string());
        }
        if let Some(w) = worker {
            ev = ev.with_worker(w);
        }
        if let Some(a) = attempt {
            ev = ev.with_attempt(a);
        }

        let status = result.status;
        if self.registry.complete(result) {
            self.counters.finished(status);
            self.bus.publish(ev);
        }
    }

    /// Resolves a record that will never run again as Cancelled.
    pub(crate) fn finish_cancelled(&self, record: &TaskRecord, worker: Option<usize>) {
        let result = TaskResult::cancelled(
            record.id(),
            record.started_at(),
            record.retries(),
            record.config().tags.clone(),
        );
        self.finish(result, worker, None);
    }
}

/// Handles to the running worker loops.
pub(crate) struct WorkerPool {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Launches `worker_count` loops over `shared.queue`.
    pub(crate) fn start(shared: &Arc<Shared>, worker_count: usize) -> Self {
        let token = CancellationToken::new();
        let handles = (0..worker_count)
            .map(|idx| tokio::spawn(worker_loop(Arc::clone(shared), idx, token.clone())))
            .collect();
        Self { token, handles }
    }

    /// Asks every loop to exit after its current task (retry sleeps are interrupted).
    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    /// Waits for every loop to exit.
    pub(crate) async fn join(&mut self) {
        for h in self.handles.drain(..) {
            let _ = h.await;
        }
    }
}

async fn worker_loop(shared: Arc<Shared>, worker: usize, token: CancellationToken) {
    shared
        .bus
        .publish(Event::new(EventKind::WorkerStarted).with_worker(worker));
    let idle = shared.cfg.idle_backoff.max(MIN_IDLE_BACKOFF);

    while !token.is_cancelled() {
        let Some(record) = shared.queue.get() else {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = shared.queue.notified() => {}
                _ = time::sleep(idle) => {}
            }
            continue;
        };
        execute(&shared, worker, &token, record).await;
    }

    shared
        .bus
        .publish(Event::new(EventKind::WorkerStopped).with_worker(worker));
}

/// Runs one attempt of `record` and settles its outcome.
async fn execute(shared: &Shared, worker: usize, pool_token: &CancellationToken, mut record: TaskRecord) {
    if record.token().is_cancelled() {
        shared.finish_cancelled(&record, Some(worker));
        return;
    }

    let attempt = record.retries() + 1;
    record.mark_running();
    shared.registry.set_status(record.id(), TaskStatus::Running);
    let track_memory = shared.cfg.monitor.enabled || record.config().memory_limit_mb.is_some();
    let baseline = if track_memory { shared.monitor.memory_mb() } else { 0.0 };

    shared.bus.publish(
        Event::new(EventKind::TaskStarting)
            .with_task(record.id_arc())
            .with_priority(record.priority())
            .with_worker(worker)
            .with_attempt(attempt),
    );

    let env = AttemptEnv {
        backends: &shared.backends,
        limiter: &shared.limiter,
        bus: &shared.bus,
        worker,
    };
    shared.counters.attempt_started();
    let began = Instant::now();
    let outcome = run_once(&env, &record, attempt).await;
    let took = began.elapsed();
    shared.counters.attempt_finished(took);

    let memory_delta_mb = if track_memory {
        shared.monitor.memory_mb() - baseline
    } else {
        0.0
    };
    check_memory_limit(shared, &record, memory_delta_mb);

    let settle = |status: TaskStatus, value: Option<TaskValue>, error: Option<TaskError>, record: &TaskRecord| {
        let result = TaskResult {
            task_id: record.id().to_string(),
            status,
            value,
            error,
            started_at: record.started_at(),
            finished_at: SystemTime::now(),
            execution_time: took,
            memory_delta_mb,
            retries: record.retries(),
            tags: record.config().tags.clone(),
        };
        shared.finish(result, Some(worker), Some(attempt));
    };

    let err = match outcome {
        Ok(value) => return settle(TaskStatus::Completed, Some(value), None, &record),
        Err(TaskError::Canceled) => {
            return settle(TaskStatus::Cancelled, None, Some(TaskError::Canceled), &record);
        }
        Err(err) => err,
    };

    match record.config().retry_policy().decide(record.retries(), &err) {
        RetryDecision::Retry { retry, delay } => {
            record.mark_retry(retry);
            shared.registry.set_status(record.id(), TaskStatus::Pending);
            shared.counters.retried();
            shared.bus.publish(
                Event::new(EventKind::RetryScheduled)
                    .with_task(record.id_arc())
                    .with_priority(record.priority())
                    .with_worker(worker)
                    .with_attempt(attempt)
                    .with_delay(delay)
                    .with_reason(err.to_string()),
            );

            let interrupted = tokio::select! {
                biased;
                _ = record.token().cancelled() => true,
                _ = pool_token.cancelled() => true,
                _ = time::sleep(delay) => false,
            };
            if interrupted || pool_token.is_cancelled() {
                shared.finish_cancelled(&record, Some(worker));
            } else {
                shared.queue.requeue(record);
            }
        }
        RetryDecision::GiveUp => {
            let status = match err {
                TaskError::Timeout { .. } => TaskStatus::Timeout,
                _ => TaskStatus::Failed,
            };
            settle(status, None, Some(err), &record);
        }
    }
}

fn check_memory_limit(shared: &Shared, record: &TaskRecord, delta_mb: f64) {
    let Some(limit) = record.config().memory_limit_mb else {
        return;
    };
    if delta_mb <= limit {
        return;
    }
    tracing::warn!(
        task = record.id(),
        memory_delta_mb = delta_mb,
        limit_mb = limit,
        "task memory growth above limit"
    );
    shared.bus.publish(
        Event::new(EventKind::ResourceWarning)
            .with_task(record.id_arc())
            .with_reason(format!("memory delta {delta_mb:.1}MB above task limit {limit:.1}MB")),
    );
}
