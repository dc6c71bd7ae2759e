//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by the executor, its worker
//! loops, the resource monitor and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `AsyncExecutor` (submission, shutdown, batches), worker loops,
//!   `run_once`, `ResourceMonitor`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the executor's subscriber listener (fans out to `SubscriberSet`),
//!   and any raw receiver from `AsyncExecutor::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
