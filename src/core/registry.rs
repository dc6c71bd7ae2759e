//! # Task registry: status and result slots keyed by task id.
//!
//! Every admitted task has one entry from submission until its result is released.
//! The entry holds the current status, the task's cancellation token and a
//! [`watch`] channel carrying the terminal [`TaskResult`].
//!
//! ```text
//! register(id) ──► Entry { Pending, token, watch(None) }
//! set_status   ──► Running / Pending (retry)
//! complete     ──► status = terminal, watch ← Some(result)   (wakes every waiter)
//!                  └─ over the retention limit → evict oldest unwatched results
//! release      ──► entry removed (only once terminal)
//! ```
//!
//! ## Rules
//! - At most one in-flight entry per id; a terminal id may be registered again.
//! - A result is published exactly once per entry; later `complete` calls are ignored.
//! - The map lock is never held across `.await`; waiters await their own receiver.
//! - Eviction never drops an in-flight entry or a result someone is waiting on.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::ExecutorError;
use crate::tasks::{TaskResult, TaskStatus};

struct Entry {
    status: TaskStatus,
    token: CancellationToken,
    tx: watch::Sender<Option<TaskResult>>,
    /// Completion stamp; `0` while in flight.
    finished: u64,
}

#[derive(Default)]
struct Table {
    entries: HashMap<Arc<str>, Entry>,
    /// Completion order, oldest first. Items whose stamp no longer matches are stale.
    order: VecDeque<(Arc<str>, u64)>,
    /// Terminal entries currently in `entries`.
    terminal: usize,
    stamp: u64,
}

/// Result map shared by the executor and its workers.
pub(crate) struct Registry {
    table: Mutex<Table>,
    limit: Option<usize>,
}

impl Registry {
    /// Creates a registry keeping at most `limit` finished results (`None` = unlimited).
    pub(crate) fn new(limit: Option<usize>) -> Self {
        Self {
            table: Mutex::new(Table::default()),
            limit,
        }
    }

    /// Registers a new pending task.
    ///
    /// Fails with [`ExecutorError::DuplicateTask`] if the id is still in flight.
    pub(crate) fn register(&self, id: Arc<str>, token: CancellationToken) -> Result<(), ExecutorError> {
        let mut table = self.table.lock();
        if let Some(prev) = table.entries.get(&id) {
            if !prev.status.is_terminal() {
                return Err(ExecutorError::DuplicateTask { id: id.to_string() });
            }
        }
        let (tx, _rx) = watch::channel(None);
        let prev = table.entries.insert(
            id,
            Entry {
                status: TaskStatus::Pending,
                token,
                tx,
                finished: 0,
            },
        );
        if prev.is_some() {
            table.terminal -= 1;
        }
        Ok(())
    }

    /// Drops an entry that never reached the queue.
    pub(crate) fn unregister(&self, id: &str) {
        self.table.lock().remove(id);
    }

    pub(crate) fn set_status(&self, id: &str, status: TaskStatus) {
        if let Some(e) = self.table.lock().entries.get_mut(id) {
            if !e.status.is_terminal() {
                e.status = status;
            }
        }
    }

    pub(crate) fn status(&self, id: &str) -> Option<TaskStatus> {
        self.table.lock().entries.get(id).map(|e| e.status)
    }

    pub(crate) fn token(&self, id: &str) -> Option<CancellationToken> {
        self.table.lock().entries.get(id).map(|e| e.token.clone())
    }

    /// Publishes the terminal result. Returns `false` if the entry is gone or already terminal.
    pub(crate) fn complete(&self, result: TaskResult) -> bool {
        let mut table = self.table.lock();
        let id = match table.entries.get_key_value(result.task_id.as_str()) {
            Some((id, e)) if !e.status.is_terminal() => Arc::clone(id),
            _ => return false,
        };
        table.stamp += 1;
        let stamp = table.stamp;
        if let Some(e) = table.entries.get_mut(&id) {
            e.status = result.status;
            e.finished = stamp;
            e.tx.send_replace(Some(result));
        }

        table.terminal += 1;
        if let Some(limit) = self.limit {
            table.order.push_back((id, stamp));
            table.evict_over(limit);
        }
        true
    }

    pub(crate) fn subscribe(&self, id: &str) -> Option<watch::Receiver<Option<TaskResult>>> {
        self.table.lock().entries.get(id).map(|e| e.tx.subscribe())
    }

    /// Copy of the result, if the task is terminal.
    pub(crate) fn peek(&self, id: &str) -> Option<TaskResult> {
        self.table
            .lock()
            .entries
            .get(id)
            .and_then(|e| e.tx.borrow().clone())
    }

    /// Removes a terminal entry.
    pub(crate) fn release(&self, id: &str) {
        let mut table = self.table.lock();
        if table.entries.get(id).is_some_and(|e| e.status.is_terminal()) {
            table.remove(id);
        }
    }

    /// Removes every terminal entry; returns how many were dropped.
    pub(crate) fn prune_finished(&self) -> usize {
        let mut table = self.table.lock();
        let before = table.entries.len();
        table.entries.retain(|_, e| !e.status.is_terminal());
        table.order.clear();
        table.terminal = 0;
        before - table.entries.len()
    }

    /// Ids with the given status.
    pub(crate) fn with_status(&self, status: TaskStatus) -> Vec<String> {
        self.table
            .lock()
            .entries
            .iter()
            .filter(|(_, e)| e.status == status)
            .map(|(id, _)| id.to_string())
            .collect()
    }

    /// Fires the token of every non-terminal task.
    pub(crate) fn cancel_outstanding(&self) {
        for e in self.table.lock().entries.values() {
            if !e.status.is_terminal() {
                e.token.cancel();
            }
        }
    }
}

impl Table {
    fn remove(&mut self, id: &str) {
        if let Some(e) = self.entries.remove(id) {
            if e.status.is_terminal() {
                self.terminal -= 1;
            }
        }
        // Released results leave stale order items behind.
        if self.order.len() > 2 * self.terminal + 64 {
            let entries = &self.entries;
            self.order
                .retain(|(id, stamp)| entries.get(id).is_some_and(|e| e.finished == *stamp));
        }
    }

    /// Drops the oldest terminal entries nobody is waiting on until at most `limit` remain.
    fn evict_over(&mut self, limit: usize) {
        let mut watched = Vec::new();
        while self.terminal > limit {
            let Some((id, stamp)) = self.order.pop_front() else {
                break;
            };
            let Some(e) = self.entries.get(&id) else {
                continue;
            };
            if e.finished != stamp {
                continue;
            }
            if e.tx.receiver_count() > 0 {
                watched.push((id, stamp));
                continue;
            }
            self.entries.remove(&id);
            self.terminal -= 1;
        }
        for item in watched.into_iter().rev() {
            self.order.push_front(item);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    #[test]
    fn duplicate_in_flight_is_rejected_until_terminal() {
        let reg = Registry::new(None);
        reg.register(id("a"), CancellationToken::new()).unwrap();
        assert_eq!(
            reg.register(id("a"), CancellationToken::new()),
            Err(ExecutorError::DuplicateTask { id: "a".into() })
        );

        assert!(reg.complete(TaskResult::cancelled("a", None, 0, vec![])));
        assert!(!reg.complete(TaskResult::cancelled("a", None, 0, vec![])));
        reg.register(id("a"), CancellationToken::new()).unwrap();
        assert_eq!(reg.status("a"), Some(TaskStatus::Pending));
    }

    #[tokio::test]
    async fn waiters_see_the_result() {
        let reg = Registry::new(None);
        reg.register(id("a"), CancellationToken::new()).unwrap();
        let mut rx = reg.subscribe("a").unwrap();
        reg.set_status("a", TaskStatus::Running);
        assert_eq!(reg.with_status(TaskStatus::Running), ["a"]);

        reg.complete(TaskResult::cancelled("a", None, 0, vec![]));
        let got = rx.wait_for(Option::is_some).await.unwrap().clone();
        assert_eq!(got.map(|r| r.status), Some(TaskStatus::Cancelled));
        assert!(reg.peek("a").is_some());

        reg.release("a");
        assert!(reg.status("a").is_none());
    }

    #[test]
    fn release_keeps_in_flight_entries() {
        let reg = Registry::new(None);
        reg.register(id("a"), CancellationToken::new()).unwrap();
        reg.release("a");
        assert_eq!(reg.prune_finished(), 0);
        assert_eq!(reg.status("a"), Some(TaskStatus::Pending));
    }

    fn finish(reg: &Registry, id: &str) {
        reg.complete(TaskResult::cancelled(id, None, 0, vec![]));
    }

    #[test]
    fn oldest_unwatched_results_are_evicted_over_the_limit() {
        let reg = Registry::new(Some(2));
        for name in ["a", "b", "c", "d"] {
            reg.register(id(name), CancellationToken::new()).unwrap();
        }
        let _watching_a = reg.subscribe("a").unwrap();

        finish(&reg, "a");
        finish(&reg, "b");
        assert!(reg.peek("a").is_some() && reg.peek("b").is_some());

        finish(&reg, "c");
        assert!(reg.peek("a").is_some());
        assert_eq!(reg.status("b"), None);
        assert!(reg.peek("c").is_some());
        assert_eq!(reg.status("d"), Some(TaskStatus::Pending));

        finish(&reg, "d");
        assert!(reg.peek("a").is_some());
        assert_eq!(reg.status("c"), None);
        assert!(reg.peek("d").is_some());
    }

    #[test]
    fn reused_ids_are_not_evicted_by_their_old_stamp() {
        let reg = Registry::new(Some(1));
        reg.register(id("a"), CancellationToken::new()).unwrap();
        finish(&reg, "a");
        reg.register(id("a"), CancellationToken::new()).unwrap();

        reg.register(id("b"), CancellationToken::new()).unwrap();
        finish(&reg, "b");
        reg.register(id("c"), CancellationToken::new()).unwrap();
        finish(&reg, "c");

        assert_eq!(reg.status("a"), Some(TaskStatus::Pending));
        assert_eq!(reg.status("b"), None);
        assert!(reg.peek("c").is_some());
    }
}
