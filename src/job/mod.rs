//! Job execution records and the context a notifier wraps.
//!
//! The scheduler side of the system is represented by [`JobContext`]: it
//! exposes the job's identity, the execution record being filled in, and
//! the `next`/`stop` hooks a notifier uses to let the rest of the pipeline
//! run before it reads the outcome.
//!
//! [`CommandJob`] is a process-backed context used by the CLI.

mod process;
mod snapshot;

#[cfg(test)]
mod snapshot_tests;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

pub use process::{CommandError, CommandJob};
pub use snapshot::{ExecutionSnapshot, format_duration};

/// Identity of a scheduled job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobInfo {
    /// Job name
    pub name: String,
    /// Schedule expression, as configured
    pub schedule: String,
    /// Command the job runs
    pub command: String,
}

impl JobInfo {
    /// Creates a job description.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        schedule: impl Into<String>,
        command: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            schedule: schedule.into(),
            command: command.into(),
        }
    }
}

/// The record of one run of a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Execution identifier
    pub id: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Run time, set by [`stop`](Self::stop)
    pub duration: Duration,
    /// Still running
    pub is_running: bool,
    /// The run ended with an error
    pub failed: bool,
    /// The run was skipped
    pub skipped: bool,
    /// Error text of a failed run
    pub error: Option<String>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl Execution {
    /// Starts a new running execution.
    #[must_use]
    pub fn start(id: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            started_at,
            duration: Duration::ZERO,
            is_running: true,
            failed: false,
            skipped: false,
            error: None,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// An identifier derived from the start time.
    #[must_use]
    pub fn id_for(started_at: DateTime<Utc>) -> String {
        format!("{:x}", started_at.timestamp_micros())
    }

    /// Finishes the execution. An error marks it failed.
    pub fn stop(&mut self, ended_at: DateTime<Utc>, error: Option<String>) {
        self.duration = (ended_at - self.started_at).to_std().unwrap_or_default();
        self.is_running = false;
        if let Some(error) = error {
            self.failed = true;
            self.error = Some(error);
        }
    }

    /// Marks the execution as skipped.
    pub const fn skip(&mut self) {
        self.skipped = true;
    }

    /// When the run ended (start plus duration).
    #[must_use]
    pub fn ended_at(&self) -> DateTime<Utc> {
        chrono::Duration::from_std(self.duration)
            .ok()
            .and_then(|duration| self.started_at.checked_add_signed(duration))
            .unwrap_or(self.started_at)
    }
}

/// The execution context a job notifier runs inside.
///
/// Implemented by the scheduler; the notifier calls [`next`](Self::next) to
/// run the remaining pipeline, then [`stop`](Self::stop) with its result,
/// and only then reads [`execution`](Self::execution).
pub trait JobContext: Send {
    /// Error returned by the pipeline.
    type Error: std::error::Error + Send + Sync + 'static;

    /// The job being run.
    fn job(&self) -> &JobInfo;

    /// The execution record.
    fn execution(&self) -> &Execution;

    /// Runs the rest of the pipeline.
    fn next(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Finalizes the execution record with the pipeline result.
    fn stop(&mut self, error: Option<&Self::Error>);
}
