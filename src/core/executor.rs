//! # AsyncExecutor: the facade owning queue, workers, limiter and monitor.
//!
//! ## Architecture
//! ```text
//! submit_task(id, callable, cfg)
//!   ├─ accepting?            (no → NotAccepting)
//!   ├─ callable.supports(mode) (no → UnsupportedMode)
//!   ├─ registry.register(id) (in flight → DuplicateTask)
//!   └─ queue.put(record)     (full → QueueFull)
//!                │
//!                ▼
//!   WorkerPool ─ worker_loop × N ─► run_once ─► TaskResult ─► registry (watch)
//!                                                                │
//! wait_for_task(id) ◄────────────────────────────────────────────┘
//!
//! Bus ──► subscriber listener ──► SubscriberSet (LogWriter, custom...)
//! ```
//!
//! ## Lifecycle
//! ```text
//! Idle ──start()──► Running ──stop()──► Stopped
//!   └──────────────stop()──────────────────┘
//! ```
//! - Submissions are accepted while `Idle` (tasks wait in the queue) and `Running`.
//! - `stop()` stops accepting, lets workers finish their current attempt within
//!   [`ExecutorConfig::grace`], then resolves every task still pending as Cancelled.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{join_all, select_all};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, watch};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::ExecutorConfig;
use crate::core::builder::ExecutorBuilder;
use crate::core::pool::{Shared, WorkerPool};
use crate::core::stats::PerformanceStats;
use crate::error::ExecutorError;
use crate::events::{Event, EventKind};
use crate::monitor::ResourceStats;
use crate::queue::QueueStats;
use crate::rate_limit::RateLimiter;
use crate::subscribers::SubscriberSet;
use crate::tasks::{Callable, TaskConfig, TaskPriority, TaskRecord, TaskResult, TaskSpec, TaskStatus};

/// How [`AsyncExecutor::wait_for_batch`] decides it is done.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WaitMode {
    /// Wait until every task is terminal; results come back in `ids` order.
    #[default]
    AllCompleted,
    /// Return as soon as one task is terminal, with every result available at that point.
    FirstCompleted,
}

enum Lifecycle {
    Idle,
    Running { pool: WorkerPool },
    Stopped,
}

/// In-process task execution engine.
///
/// Built with [`AsyncExecutor::builder`] (or [`AsyncExecutor::new`]) inside a Tokio runtime
/// and shared by `Arc`.
///
/// ## Example
/// ```rust
/// use std::time::Duration;
/// use taskforge::{AsyncExecutor, Callable, ExecutorConfig, TaskConfig, TaskContext, TaskError};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let exec = AsyncExecutor::new(ExecutorConfig::default());
/// exec.start()?;
///
/// let id = exec.submit_task(
///     "answer",
///     Callable::from_fn(|_ctx: TaskContext| async { Ok::<_, TaskError>(42u32) }),
///     TaskConfig::default(),
/// )?;
/// let result = exec.wait_for_task(&id, Some(Duration::from_secs(5))).await?;
/// assert_eq!(result.value_as::<u32>(), Some(&42));
///
/// exec.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct AsyncExecutor {
    pub(crate) shared: Arc<Shared>,
    state: Mutex<Lifecycle>,
    accepting: RwLock<bool>,
    started_at: Mutex<Option<Instant>>,
    listener_token: CancellationToken,
}

impl AsyncExecutor {
    /// Returns a builder for an executor with the given config.
    pub fn builder(cfg: ExecutorConfig) -> ExecutorBuilder {
        ExecutorBuilder::new(cfg)
    }

    /// Builds an executor with default subscribers and the `sysinfo` probe.
    pub fn new(cfg: ExecutorConfig) -> Arc<Self> {
        ExecutorBuilder::new(cfg).build()
    }

    pub(crate) fn new_internal(shared: Arc<Shared>, subs: Option<SubscriberSet>) -> Self {
        let listener_token = CancellationToken::new();
        if let Some(set) = subs {
            subscriber_listener(&shared, set, listener_token.clone());
        }
        Self {
            shared,
            state: Mutex::new(Lifecycle::Idle),
            accepting: RwLock::new(true),
            started_at: Mutex::new(None),
            listener_token,
        }
    }

    /// Executor settings.
    pub fn config(&self) -> &ExecutorConfig {
        &self.shared.cfg
    }

    /// Launches the worker loops and the resource monitor.
    ///
    /// Fails with [`ExecutorError::AlreadyStarted`] if running or stopped.
    pub fn start(&self) -> Result<(), ExecutorError> {
        let mut state = self.state.lock();
        if !matches!(*state, Lifecycle::Idle) {
            return Err(ExecutorError::AlreadyStarted);
        }
        let pool = WorkerPool::start(&self.shared, self.shared.cfg.worker_count());
        *state = Lifecycle::Running { pool };
        *self.started_at.lock() = Some(Instant::now());
        self.shared.monitor.start_monitoring();
        Ok(())
    }

    /// `true` between `start()` and `stop()`.
    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), Lifecycle::Running { .. })
    }

    /// Stops accepting, waits up to `grace` for in-flight attempts, and resolves
    /// every remaining task as Cancelled.
    ///
    /// Returns [`ExecutorError::GraceExceeded`] if some attempts were still running
    /// when the grace period ended; those are cancelled through their tokens.
    pub async fn stop(&self) -> Result<(), ExecutorError> {
        *self.accepting.write() = false;
        let prev = std::mem::replace(&mut *self.state.lock(), Lifecycle::Stopped);
        let shared = &self.shared;
        shared.bus.publish(Event::new(EventKind::ShutdownRequested));

        let mut res = Ok(());
        if let Lifecycle::Running { mut pool } = prev {
            pool.cancel();
            let grace = shared.cfg.grace;
            match time::timeout(grace, pool.join()).await {
                Ok(()) => shared.bus.publish(Event::new(EventKind::AllStoppedWithin)),
                Err(_elapsed) => {
                    let mut stuck = shared.registry.with_status(TaskStatus::Running);
                    stuck.sort();
                    shared.registry.cancel_outstanding();
                    shared.bus.publish(
                        Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")),
                    );
                    res = Err(ExecutorError::GraceExceeded { grace, stuck });
                }
            }
        }

        for record in shared.queue.drain() {
            record.token().cancel();
            shared.finish_cancelled(&record, None);
        }
        shared.monitor.stop_monitoring();
        res
    }

    /// Submits one task.
    ///
    /// Fails without blocking on a full queue level, a duplicate in-flight id, a callable
    /// that cannot run under `config.mode`, or after `stop()`.
    pub fn submit_task(
        &self,
        id: impl Into<String>,
        callable: Callable,
        config: TaskConfig,
    ) -> Result<String, ExecutorError> {
        let id = id.into();
        let priority = config.priority;
        let accepting = self.accepting.read();
        if !*accepting {
            return Err(self.reject(&id, priority, ExecutorError::NotAccepting));
        }
        if !callable.supports(config.mode) {
            let err = ExecutorError::UnsupportedMode {
                mode: config.mode,
                callable: callable.kind(),
            };
            return Err(self.reject(&id, priority, err));
        }

        let shared = &self.shared;
        let record = TaskRecord::new(id.as_str(), callable, config);
        if let Err(e) = shared.registry.register(record.id_arc(), record.token().clone()) {
            return Err(self.reject(&id, priority, e));
        }
        if let Err(e) = shared.queue.put(record) {
            shared.registry.unregister(&id);
            return Err(self.reject(&id, priority, e));
        }
        drop(accepting);

        shared.counters.submitted();
        shared.bus.publish(
            Event::new(EventKind::TaskSubmitted)
                .with_task(id.as_str())
                .with_priority(priority),
        );
        Ok(id)
    }

    /// Submits a [`TaskSpec`].
    pub fn submit(&self, spec: TaskSpec) -> Result<String, ExecutorError> {
        let (id, callable, config) = spec.into_parts();
        self.submit_task(id, callable, config)
    }

    /// Submits every spec or none: on the first rejection the already submitted
    /// members are cancelled and the error is returned.
    ///
    /// On a running executor an earlier member may finish before the rejection; such a
    /// member cannot be taken back and its result stays available under its id.
    pub fn submit_batch(&self, specs: Vec<TaskSpec>) -> Result<Vec<String>, ExecutorError> {
        let mut ids = Vec::with_capacity(specs.len());
        for spec in specs {
            match self.submit(spec) {
                Ok(id) => ids.push(id),
                Err(e) => {
                    self.roll_back(&ids);
                    return Err(e);
                }
            }
        }
        Ok(ids)
    }

    /// Waits until the task is terminal and returns its result.
    ///
    /// A task failure is a successful return with `!result.is_successful()`.
    /// Exceeding `timeout` yields [`ExecutorError::WaitTimeout`] and leaves the task running.
    /// The result is discarded after delivery unless `retain_results` is set.
    pub async fn wait_for_task(
        &self,
        id: &str,
        timeout: Option<Duration>,
    ) -> Result<TaskResult, ExecutorError> {
        let rx = self.result_receiver(id)?;
        let result = match timeout {
            Some(d) => time::timeout(d, wait_result(rx))
                .await
                .map_err(|_| ExecutorError::WaitTimeout {
                    id: id.to_string(),
                    timeout: d,
                })?,
            None => wait_result(rx).await,
        }
        .ok_or_else(|| ExecutorError::UnknownTask { id: id.to_string() })?;

        self.delivered(id);
        Ok(result)
    }

    /// Waits for several tasks.
    ///
    /// An empty `ids` returns an empty list immediately.
    pub async fn wait_for_batch<S: AsRef<str>>(
        &self,
        ids: &[S],
        timeout: Option<Duration>,
        mode: WaitMode,
    ) -> Result<Vec<TaskResult>, ExecutorError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let receivers = ids
            .iter()
            .map(|id| self.result_receiver(id.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let wait = async {
            match mode {
                WaitMode::AllCompleted => join_all(receivers.into_iter().map(wait_result))
                    .await
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>(),
                WaitMode::FirstCompleted => {
                    let waits = receivers.into_iter().map(|rx| Box::pin(wait_result(rx)));
                    let _ = select_all(waits).await;
                    ids.iter()
                        .filter_map(|id| self.shared.registry.peek(id.as_ref()))
                        .collect()
                }
            }
        };

        let results = match timeout {
            Some(d) => time::timeout(d, wait)
                .await
                .map_err(|_| ExecutorError::WaitTimeout {
                    id: ids.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join(","),
                    timeout: d,
                })?,
            None => wait.await,
        };

        for r in &results {
            self.delivered(&r.task_id);
        }
        Ok(results)
    }

    /// Cancels a task.
    ///
    /// - Pending in the queue: removed and resolved as Cancelled.
    /// - Waiting for a retry or running: its token fires; the worker stops waiting and
    ///   resolves it as Cancelled. Async work sees the token, child processes are killed,
    ///   blocking closures run to completion unobserved.
    /// - Terminal or unknown: returns `false`.
    pub fn cancel_task(&self, id: &str) -> bool {
        let shared = &self.shared;
        match shared.registry.status(id) {
            Some(status) if !status.is_terminal() => {}
            _ => return false,
        }
        if let Some(record) = shared.queue.remove(id) {
            record.token().cancel();
            shared.finish_cancelled(&record, None);
            return true;
        }
        match shared.registry.token(id) {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Per-priority queue depth.
    pub fn get_queue_stats(&self) -> QueueStats {
        self.shared.queue.qsize()
    }

    /// Counters, rates, queue depth and resource usage.
    pub fn get_performance_stats(&self) -> PerformanceStats {
        let uptime = self
            .started_at
            .lock()
            .map_or(Duration::ZERO, |t| t.elapsed());
        self.shared.counters.snapshot(
            self.shared.cfg.worker_count(),
            uptime,
            self.shared.queue.qsize(),
            self.shared.monitor.get_stats(),
        )
    }

    /// Current status, if the task is known.
    pub fn task_status(&self, id: &str) -> Option<TaskStatus> {
        self.shared.registry.status(id)
    }

    /// Result of a terminal task without consuming it.
    pub fn try_result(&self, id: &str) -> Option<TaskResult> {
        self.shared.registry.peek(id)
    }

    /// Drops every stored terminal result; returns how many were dropped.
    pub fn prune_results(&self) -> usize {
        self.shared.registry.prune_finished()
    }

    /// Shared rate limiter (the one `rate_limited` tasks pass through).
    pub fn rate_limiter(&self) -> RateLimiter {
        self.shared.limiter.clone()
    }

    /// Process resource snapshot.
    pub fn resource_stats(&self) -> ResourceStats {
        self.shared.monitor.get_stats()
    }

    /// Raw receiver of every subsequent runtime event.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Cancels and forgets the members of a rejected batch. Finished members are kept.
    fn roll_back(&self, ids: &[String]) {
        for id in ids {
            if self.cancel_task(id) {
                self.shared.registry.release(id);
            }
        }
    }

    fn reject(&self, id: &str, priority: TaskPriority, err: ExecutorError) -> ExecutorError {
        self.shared.counters.rejected();
        self.shared.bus.publish(
            Event::new(EventKind::QueueRejected)
                .with_task(id)
                .with_priority(priority)
                .with_reason(err.as_label()),
        );
        err
    }

    pub(crate) fn result_receiver(
        &self,
        id: &str,
    ) -> Result<watch::Receiver<Option<TaskResult>>, ExecutorError> {
        self.shared
            .registry
            .subscribe(id)
            .ok_or_else(|| ExecutorError::UnknownTask { id: id.to_string() })
    }

    fn delivered(&self, id: &str) {
        if !self.shared.cfg.retain_results {
            self.shared.registry.release(id);
        }
    }
}

impl Drop for AsyncExecutor {
    fn drop(&mut self) {
        if let Lifecycle::Running { pool } = &*self.state.lock() {
            pool.cancel();
        }
        self.shared.monitor.stop_monitoring();
        self.listener_token.cancel();
    }
}

/// Resolves with the result once published, or `None` if the slot was dropped.
pub(crate) async fn wait_result(mut rx: watch::Receiver<Option<TaskResult>>) -> Option<TaskResult> {
    rx.wait_for(Option::is_some)
        .await
        .ok()
        .and_then(|r| r.clone())
}

/// Forwards bus events to the subscriber set until the executor is dropped.
///
/// On drop, events already on the bus are still forwarded and the subscriber
/// queues are drained before the listener ends.
fn subscriber_listener(shared: &Shared, set: SubscriberSet, token: CancellationToken) {
    let mut rx = shared.bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
        loop {
            match rx.try_recv() {
                Ok(ev) => set.emit(&ev),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
        set.shutdown().await;
    });
}
