//! Immutable template data captured when a job completes.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use super::{Execution, JobInfo};

/// Everything a webhook template can read about a finished execution.
///
/// Built once per completion and shared read-only (behind an `Arc`) by every
/// delivery spawned for it. Serializes with the field names templates use:
/// `JobName`, `ExecutionID`, `StartTime`, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExecutionSnapshot {
    pub job_name: String,
    pub job_schedule: String,
    pub job_command: String,
    #[serde(rename = "ExecutionID")]
    pub execution_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Human-readable run time, e.g. `1m23s`
    pub duration: String,
    pub is_running: bool,
    pub failed: bool,
    pub skipped: bool,
    /// Neither failed nor skipped
    pub success: bool,
    /// Error text, empty when there is none
    pub error: String,
    pub has_error: bool,
    pub stdout: String,
    pub stderr: String,
    pub hostname: String,
    /// RFC 3339 start time
    pub timestamp: String,
}

impl ExecutionSnapshot {
    /// Captures the snapshot using this machine's host name.
    #[must_use]
    pub fn capture(job: &JobInfo, execution: &Execution) -> Self {
        let hostname = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_default();
        Self::with_hostname(job, execution, hostname)
    }

    /// Captures the snapshot with an explicit host name.
    #[must_use]
    pub fn with_hostname(job: &JobInfo, execution: &Execution, hostname: String) -> Self {
        Self {
            job_name: job.name.clone(),
            job_schedule: job.schedule.clone(),
            job_command: job.command.clone(),
            execution_id: execution.id.clone(),
            start_time: execution.started_at,
            end_time: execution.ended_at(),
            duration: format_duration(execution.duration),
            is_running: execution.is_running,
            failed: execution.failed,
            skipped: execution.skipped,
            success: !execution.failed && !execution.skipped,
            error: execution.error.clone().unwrap_or_default(),
            has_error: execution.error.is_some(),
            stdout: execution.stdout.clone(),
            stderr: execution.stderr.clone(),
            hostname,
            timestamp: execution
                .started_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Formats a duration as `1h2m3.5s`, `1m23s`, `1.5s`, `250ms`, `3µs`, `0s`.
///
/// Below one second the largest fitting unit is used; from one second up,
/// hours and minutes are spelled out once a larger unit is present.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{nanos}ns");
    }
    if nanos < 1_000_000 {
        return format!("{}µs", decimal(nanos, 1_000, 3));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", decimal(nanos, 1_000_000, 6));
    }

    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = total % 3600 / 60;
    let seconds = u128::from(total % 60) * 1_000_000_000 + u128::from(duration.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{}s", decimal(seconds, 1_000_000_000, 9));
    out
}

/// `value / unit` with the fractional digits that are not zero.
fn decimal(value: u128, unit: u128, digits: usize) -> String {
    let whole = value / unit;
    let fraction = value % unit;
    if fraction == 0 {
        return whole.to_string();
    }

    let fraction = format!("{fraction:0digits$}");
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}
