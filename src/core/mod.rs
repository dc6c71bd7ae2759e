//! Runtime core: executor facade, worker pool and lifecycle.
//!
//! The public API of this module is [`AsyncExecutor`] (built with [`ExecutorBuilder`]),
//! its [`ExecutorConfig`] and the types its operations return.
//!
//! Internal modules:
//! - [`pool`]: worker loops, retry handling and result publication;
//! - [`runner`]: executes one attempt with rate limit, timeout and cancellation;
//! - [`backend`]: inline, thread-pool and process backends behind one future type;
//! - [`registry`]: task status, cancellation tokens and result slots by id;
//! - [`stats`]: execution counters and the [`PerformanceStats`] snapshot;
//! - [`batch`]: chunked parallel processing.

mod backend;
mod batch;
mod builder;
mod config;
mod executor;
mod pool;
mod registry;
mod runner;
mod stats;

pub use batch::BatchOptions;
pub use builder::ExecutorBuilder;
pub use config::{BatchPolicy, ExecutorConfig};
pub use executor::{AsyncExecutor, WaitMode};
pub use stats::PerformanceStats;
