//! # Priority-partitioned bounded task queue.
//!
//! [`TaskQueue`] keeps one FIFO per [`TaskPriority`] level, each with its own bound.
//!
//! ```text
//! put(task) ──► level[task.priority]  (full → QueueFull, never drops, never blocks)
//!
//! get():  Urgent ──► High ──► Normal ──► Low      first non-empty level, FIFO within it
//! ```
//!
//! ## Rules
//! - **Backpressure**: a full level rejects new submissions with [`ExecutorError::QueueFull`].
//! - **Strict priority**: no cross-level fairness; a sustained stream of `Urgent` tasks
//!   starves lower levels. Callers needing fairness must rate-limit their own submissions.
//! - **Retries** re-enter through `requeue`, which ignores the bound: the task was already admitted.
//! - All levels share one lock, so [`TaskQueue::qsize`] totals always equal the number of
//!   enqueued tasks.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::ExecutorError;
use crate::tasks::{TaskPriority, TaskRecord};

const LEVELS: usize = 4;

/// Per-priority queue bounds. `0` means unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueLimits {
    pub low: usize,
    pub normal: usize,
    pub high: usize,
    pub urgent: usize,
}

impl QueueLimits {
    /// Same bound for every level.
    pub fn uniform(capacity: usize) -> Self {
        Self {
            low: capacity,
            normal: capacity,
            high: capacity,
            urgent: capacity,
        }
    }

    /// Bound of one level as an `Option` (`None` = unbounded).
    #[inline]
    pub fn for_priority(&self, priority: TaskPriority) -> Option<usize> {
        let cap = match priority {
            TaskPriority::Low => self.low,
            TaskPriority::Normal => self.normal,
            TaskPriority::High => self.high,
            TaskPriority::Urgent => self.urgent,
        };
        if cap == 0 { None } else { Some(cap) }
    }
}

impl Default for QueueLimits {
    /// 1000 tasks per level.
    fn default() -> Self {
        Self::uniform(1000)
    }
}

/// Depth of every level at one instant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub low: usize,
    pub normal: usize,
    pub high: usize,
    pub urgent: usize,
}

impl QueueStats {
    /// Depth of one level.
    pub fn depth(&self, priority: TaskPriority) -> usize {
        match priority {
            TaskPriority::Low => self.low,
            TaskPriority::Normal => self.normal,
            TaskPriority::High => self.high,
            TaskPriority::Urgent => self.urgent,
        }
    }

    /// Sum across all levels.
    pub fn total(&self) -> usize {
        self.low + self.normal + self.high + self.urgent
    }
}

/// Four bounded FIFO queues with strict-priority dequeue.
pub struct TaskQueue {
    levels: Mutex<[VecDeque<TaskRecord>; LEVELS]>,
    limits: QueueLimits,
    ready: Notify,
}

impl TaskQueue {
    /// Creates an empty queue.
    pub fn new(limits: QueueLimits) -> Self {
        Self {
            levels: Mutex::new(Default::default()),
            limits,
            ready: Notify::new(),
        }
    }

    /// Configured bounds.
    pub fn limits(&self) -> QueueLimits {
        self.limits
    }

    /// Enqueues `task` at the level of its priority.
    ///
    /// Fails with [`ExecutorError::QueueFull`] if that level is at its bound.
    pub fn put(&self, task: TaskRecord) -> Result<(), ExecutorError> {
        let priority = task.priority();
        {
            let mut levels = self.levels.lock();
            let level = &mut levels[priority.index()];
            if let Some(capacity) = self.limits.for_priority(priority) {
                if level.len() >= capacity {
                    return Err(ExecutorError::QueueFull { priority, capacity });
                }
            }
            level.push_back(task);
        }
        self.ready.notify_one();
        Ok(())
    }

    /// Enqueues an already admitted task (retry), ignoring the bound.
    pub(crate) fn requeue(&self, task: TaskRecord) {
        let idx = task.priority().index();
        self.levels.lock()[idx].push_back(task);
        self.ready.notify_one();
    }

    /// Dequeues the oldest task of the highest non-empty level.
    pub fn get(&self) -> Option<TaskRecord> {
        let mut levels = self.levels.lock();
        TaskPriority::DESCENDING
            .iter()
            .find_map(|p| levels[p.index()].pop_front())
    }

    /// Removes a pending task by id.
    pub fn remove(&self, id: &str) -> Option<TaskRecord> {
        let mut levels = self.levels.lock();
        for level in levels.iter_mut() {
            if let Some(pos) = level.iter().position(|t| t.id() == id) {
                return level.remove(pos);
            }
        }
        None
    }

    /// Removes every pending task, highest priority first.
    pub fn drain(&self) -> Vec<TaskRecord> {
        let mut levels = self.levels.lock();
        TaskPriority::DESCENDING
            .iter()
            .flat_map(|p| std::mem::take(&mut levels[p.index()]))
            .collect()
    }

    /// Per-priority depth.
    pub fn qsize(&self) -> QueueStats {
        let levels = self.levels.lock();
        QueueStats {
            low: levels[TaskPriority::Low.index()].len(),
            normal: levels[TaskPriority::Normal.index()].len(),
            high: levels[TaskPriority::High.index()].len(),
            urgent: levels[TaskPriority::Urgent.index()].len(),
        }
    }

    /// Total number of pending tasks.
    pub fn len(&self) -> usize {
        self.levels.lock().iter().map(VecDeque::len).sum()
    }

    /// `true` if no task is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves after a `put`/`requeue` (a permit is stored if nobody is waiting).
    pub(crate) async fn notified(&self) {
        self.ready.notified().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::tasks::{Callable, TaskConfig, TaskContext};

    fn task(id: &str, priority: TaskPriority) -> TaskRecord {
        let callable = Callable::from_fn(|_ctx: TaskContext| async { Ok::<_, TaskError>(()) });
        TaskRecord::new(id, callable, TaskConfig::default().with_priority(priority))
    }

    fn drain_ids(q: &TaskQueue) -> Vec<String> {
        std::iter::from_fn(|| q.get()).map(|t| t.id().to_string()).collect()
    }

    #[test]
    fn strict_priority_then_fifo() {
        let q = TaskQueue::new(QueueLimits::default());
        q.put(task("low-1", TaskPriority::Low)).unwrap();
        q.put(task("normal-1", TaskPriority::Normal)).unwrap();
        q.put(task("urgent-1", TaskPriority::Urgent)).unwrap();
        q.put(task("normal-2", TaskPriority::Normal)).unwrap();
        q.put(task("high-1", TaskPriority::High)).unwrap();
        q.put(task("urgent-2", TaskPriority::Urgent)).unwrap();

        assert_eq!(
            drain_ids(&q),
            ["urgent-1", "urgent-2", "high-1", "normal-1", "normal-2", "low-1"]
        );
        assert!(q.get().is_none());
    }

    #[test]
    fn full_level_rejects_without_touching_others() {
        let q = TaskQueue::new(QueueLimits::uniform(1));
        q.put(task("a", TaskPriority::High)).unwrap();
        let err = q.put(task("b", TaskPriority::High)).unwrap_err();
        assert_eq!(
            err,
            ExecutorError::QueueFull {
                priority: TaskPriority::High,
                capacity: 1
            }
        );
        q.put(task("c", TaskPriority::Low)).unwrap();
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn requeue_ignores_bound() {
        let q = TaskQueue::new(QueueLimits::uniform(1));
        q.put(task("a", TaskPriority::Normal)).unwrap();
        q.requeue(task("b", TaskPriority::Normal));
        assert_eq!(q.qsize().normal, 2);
    }

    #[test]
    fn zero_limit_is_unbounded() {
        let q = TaskQueue::new(QueueLimits::uniform(0));
        for i in 0..5_000 {
            q.put(task(&format!("t{i}"), TaskPriority::Low)).unwrap();
        }
        assert_eq!(q.len(), 5_000);
    }

    #[test]
    fn stats_total_matches_contents() {
        let q = TaskQueue::new(QueueLimits::default());
        for (i, p) in TaskPriority::DESCENDING.iter().cycle().take(10).enumerate() {
            q.put(task(&format!("t{i}"), *p)).unwrap();
        }
        let stats = q.qsize();
        assert_eq!(stats.total(), 10);
        assert_eq!(stats.total(), q.len());
        assert_eq!(stats.depth(TaskPriority::Urgent), 3);
        q.get();
        assert_eq!(q.qsize().total(), 9);
    }

    #[test]
    fn remove_and_drain() {
        let q = TaskQueue::new(QueueLimits::default());
        q.put(task("a", TaskPriority::Low)).unwrap();
        q.put(task("b", TaskPriority::Urgent)).unwrap();
        q.put(task("c", TaskPriority::Normal)).unwrap();

        assert_eq!(q.remove("c").map(|t| t.id().to_string()), Some("c".into()));
        assert!(q.remove("c").is_none());

        let drained: Vec<_> = q.drain().iter().map(|t| t.id().to_string()).collect();
        assert_eq!(drained, ["b", "a"]);
        assert!(q.is_empty());
    }
}
