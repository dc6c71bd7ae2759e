//! # External program callables.
//!
//! [`CommandSpec`] describes a program run as a child process. It is the only kind of
//! callable accepted by [`ExecutionMode::ProcessPool`](crate::ExecutionMode::ProcessPool),
//! and may also be used inline or on the thread pool.
//!
//! The child is spawned with `kill_on_drop`, so an attempt that times out or is
//! cancelled also terminates the process.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::TaskError;
use crate::tasks::TaskContext;

/// Program, arguments, environment and working directory of a child process.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    pub cwd: Option<PathBuf>,
}

/// Captured result of a successful child process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code (`None` if terminated by a signal).
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandSpec {
    /// Creates a spec for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets one environment variable for the child.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Sets the working directory of the child.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Runs the program to completion.
    ///
    /// A missing program is [`TaskError::Fatal`]; other spawn errors and a non-zero
    /// exit status are [`TaskError::Fail`] (retryable).
    pub(crate) async fn run(&self, ctx: TaskContext) -> Result<CommandOutput, TaskError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let output = tokio::select! {
            out = cmd.output() => out.map_err(|e| self.spawn_error(e))?,
            _ = ctx.cancelled() => return Err(TaskError::Canceled),
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            return Err(TaskError::Fail {
                error: format!("{} exited with {}: {}", self.program, output.status, stderr.trim()),
            });
        }
        Ok(CommandOutput {
            code: output.status.code(),
            stdout,
            stderr,
        })
    }

    fn spawn_error(&self, e: io::Error) -> TaskError {
        if e.kind() == io::ErrorKind::NotFound {
            TaskError::fatal(format!("{}: program not found", self.program))
        } else {
            TaskError::fail(format!("{}: {e}", self.program))
        }
    }
}
