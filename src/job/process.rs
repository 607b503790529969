//! A job context that runs a shell command.

use std::process::{ExitStatus, Stdio};

use thiserror::Error;
use tokio::process::Command;

use super::{Execution, JobContext, JobInfo};
use crate::time::{Clock, SystemClock};

/// Error type for a command run.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The shell could not be started.
    #[error("failed to start command: {0}")]
    Spawn(#[source] std::io::Error),

    /// The command finished unsuccessfully.
    #[error("command exited with {0}")]
    Exit(ExitStatus),
}

/// Runs [`JobInfo::command`] with `sh -c` and records the outcome.
///
/// The execution starts (and is stamped) when the job is created; `next`
/// runs the command and captures its output, `stop` records the end time.
#[derive(Debug)]
pub struct CommandJob<C = SystemClock> {
    info: JobInfo,
    execution: Execution,
    clock: C,
}

impl CommandJob<SystemClock> {
    /// Creates a job using the system clock.
    #[must_use]
    pub fn new(info: JobInfo) -> Self {
        Self::with_clock(info, SystemClock)
    }
}

impl<C: Clock> CommandJob<C> {
    /// Creates a job with a custom clock.
    #[must_use]
    pub fn with_clock(info: JobInfo, clock: C) -> Self {
        let started_at = clock.now();
        Self {
            execution: Execution::start(Execution::id_for(started_at), started_at),
            info,
            clock,
        }
    }

    /// Consumes the job and returns its execution record.
    #[must_use]
    pub fn into_execution(self) -> Execution {
        self.execution
    }
}

impl<C: Clock> JobContext for CommandJob<C> {
    type Error = CommandError;

    fn job(&self) -> &JobInfo {
        &self.info
    }

    fn execution(&self) -> &Execution {
        &self.execution
    }

    async fn next(&mut self) -> Result<(), CommandError> {
        tracing::debug!("Running job '{}': {}", self.info.name, self.info.command);

        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.info.command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(CommandError::Spawn)?;

        self.execution.stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        self.execution.stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(())
        } else {
            Err(CommandError::Exit(output.status))
        }
    }

    fn stop(&mut self, error: Option<&CommandError>) {
        let ended_at = self.clock.now();
        self.execution.stop(ended_at, error.map(ToString::to_string));
    }
}
