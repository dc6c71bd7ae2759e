//! # Task abstractions, configuration and results.
//!
//! This module provides the task-related types:
//! - [`Task`] - trait for implementing async, cancelable work
//! - [`TaskFn`] - closure-backed [`Task`]
//! - [`Callable`] - what a task runs (async closure, blocking closure or external command)
//! - [`TaskConfig`] - priority, timeout, retry and execution-mode settings
//! - [`TaskSpec`] - id + callable + config, the unit of submission
//! - [`TaskRecord`] - a submitted task as it moves through queue and workers
//! - [`TaskResult`] - terminal outcome of a task
//! - [`TaskContext`] - per-attempt handle passed to callables

mod callable;
mod command;
mod config;
mod context;
mod record;
mod result;
mod spec;
mod status;
mod task;
mod task_fn;
mod value;

pub use callable::{BlockingFn, Callable};
pub use command::{CommandOutput, CommandSpec};
pub use config::{ExecutionMode, TaskConfig};
pub use context::TaskContext;
pub use record::TaskRecord;
pub use result::TaskResult;
pub use spec::TaskSpec;
pub use status::{TaskPriority, TaskStatus};
pub use task::{BoxTaskFuture, Task, TaskRef};
pub use task_fn::TaskFn;
pub use value::TaskValue;
