//! # A submitted task.
//!
//! [`TaskRecord`] is what travels through the engine: it is owned by the
//! [`TaskQueue`](crate::TaskQueue) while pending, then by the worker executing it,
//! and it goes back to the queue when a retry is scheduled. Its status lives in the
//! executor's registry, not here.

use std::sync::Arc;
use std::time::SystemTime;

use tokio_util::sync::CancellationToken;

use crate::tasks::{Callable, TaskConfig, TaskPriority};

/// Submitted task with its mutable lifecycle state.
#[derive(Debug)]
pub struct TaskRecord {
    id: Arc<str>,
    callable: Callable,
    config: TaskConfig,
    created_at: SystemTime,
    started_at: Option<SystemTime>,
    retries: u32,
    token: CancellationToken,
}

impl TaskRecord {
    /// Creates a pending record.
    pub fn new(id: impl Into<Arc<str>>, callable: Callable, config: TaskConfig) -> Self {
        Self {
            id: id.into(),
            callable,
            config,
            created_at: SystemTime::now(),
            started_at: None,
            retries: 0,
            token: CancellationToken::new(),
        }
    }

    /// Task id.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn id_arc(&self) -> Arc<str> {
        Arc::clone(&self.id)
    }

    /// What the task runs.
    pub fn callable(&self) -> &Callable {
        &self.callable
    }

    /// Task settings.
    pub fn config(&self) -> &TaskConfig {
        &self.config
    }

    /// Queue level.
    pub fn priority(&self) -> TaskPriority {
        self.config.priority
    }

    /// Submission time.
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    /// Start of the first attempt, if any.
    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    /// Retries performed so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Cancellation token covering every attempt of this task.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Marks an attempt as started. The first start time is kept across retries.
    pub(crate) fn mark_running(&mut self) {
        self.started_at.get_or_insert_with(SystemTime::now);
    }

    /// Records a scheduled retry.
    pub(crate) fn mark_retry(&mut self, retries: u32) {
        self.retries = retries;
    }
}
