//! # The `Subscribe` extension point.
//!
//! Anything that wants to observe the executor (metrics exporters, audit logs, test
//! probes) implements [`Subscribe`] and is passed to
//! [`ExecutorBuilder::with_subscriber`](crate::ExecutorBuilder::with_subscriber).
//!
//! ```text
//! SubscriberSet::emit(ev)
//!   ├─ accepts(ev.kind)? ── no ──► skipped for this subscriber
//!   └─ yes ──► bounded queue ──► dedicated worker ──► on_event(ev)
//! ```
//!
//! A subscriber never slows the workers down: a full queue loses the event for that
//! subscriber only (`SubscriberOverflow`) and a panic in `on_event` is reported as
//! `SubscriberPanicked` while the worker keeps going.
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use async_trait::async_trait;
//! use taskforge::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct Timeouts(AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for Timeouts {
//!     async fn on_event(&self, _ev: &Event) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//!
//!     fn name(&self) -> &'static str { "timeouts" }
//!
//!     fn accepts(&self, kind: EventKind) -> bool {
//!         kind == EventKind::TimeoutHit
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};

/// Observer of executor events.
///
/// `on_event` runs on the subscriber's own Tokio task, in publication order.
/// Blocking inside it stalls only this subscriber's queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name reported in `SubscriberOverflow` / `SubscriberPanicked` events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue (at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }

    /// Whether events of `kind` should be queued for this subscriber at all.
    fn accepts(&self, kind: EventKind) -> bool {
        let _ = kind;
        true
    }
}
