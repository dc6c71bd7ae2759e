//! # Event bus for executor runtime events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`]: workers, the executor facade, the batch
//! runner and the resource monitor publish without blocking, and any number of
//! receivers observe what is published after they subscribed.
//!
//! ```text
//! worker loops ──┐
//! AsyncExecutor ─┼──► Bus ──► subscriber listener ──► SubscriberSet
//! batch runner ──┤        └─► AsyncExecutor::subscribe() receivers
//! monitor ───────┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; without receivers the event is dropped.
//! - One ring buffer of `capacity` events is shared by all receivers.
//! - A receiver that falls behind gets `RecvError::Lagged(n)` and skips the `n` oldest events.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel of [`Event`]s. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus holding up to `capacity` undelivered events (at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to every current receiver.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver of every subsequent event.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_only_see_later_events() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::ShutdownRequested));
        assert_eq!(bus.receiver_count(), 0);

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::WorkerStarted).with_worker(3));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::WorkerStarted);
        assert_eq!(ev.worker, Some(3));
    }
}
