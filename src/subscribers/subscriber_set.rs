//! # Fan-out of bus events to subscribers.
//!
//! [`SubscriberSet`] owns one bounded queue and one worker per [`Subscribe`] implementor.
//! The executor's listener task feeds it every event read from the bus.
//!
//! ```text
//! emit(ev) ──┬─► accepts? ─► try_send ─► [queue: log-writer] ─► worker ─► on_event
//!            └─► accepts? ─► try_send ─► [queue: custom]     ─► worker ─► on_event
//!                                │                                │
//!                      full/closed → SubscriberOverflow    panic → SubscriberPanicked
//! ```
//!
//! ## Rules
//! - `emit()` never waits.
//! - Overflow and panic reports go back on the bus; a report that itself overflows is
//!   dropped silently.
//! - Order is kept per subscriber, not across subscribers.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::panic_message;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct Slot {
    sub: Arc<dyn Subscribe>,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Subscribers with their queues and workers.
pub struct SubscriberSet {
    slots: Vec<Slot>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Must be called within a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let (slots, workers): (Vec<Slot>, Vec<JoinHandle<()>>) = subs
            .into_iter()
            .map(|sub| {
                let (tx, rx) = mpsc::channel(sub.queue_capacity().max(1));
                let worker = tokio::spawn(drain(Arc::clone(&sub), rx, bus.clone()));
                (Slot { sub, tx }, worker)
            })
            .unzip();
        Self { slots, workers, bus }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Queues a copy of `event` for every subscriber that accepts its kind.
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Queues a shared event for every subscriber that accepts its kind.
    pub fn emit_arc(&self, event: Arc<Event>) {
        for slot in self.slots.iter().filter(|s| s.sub.accepts(event.kind)) {
            let reason = match slot.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !event.is_subscriber_event() {
                self.bus.publish(Event::subscriber_overflow(slot.sub.name(), reason));
            }
        }
    }

    /// Closes the queues and waits until every worker has handled what was queued.
    pub async fn shutdown(self) {
        drop(self.slots);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

async fn drain(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let handled = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
        if let Err(payload) = handled {
            bus.publish(Event::subscriber_panicked(sub.name(), panic_message(payload.as_ref())));
        }
    }
}
