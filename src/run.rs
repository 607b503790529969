//! Application execution logic.
//!
//! This module loads the webhook config, wires the dispatchers into a
//! notifier, runs the job through it, and waits for the deliveries it
//! started.

use std::fmt::Write as _;
use std::path::Path;
use std::time::Duration;

use jobhook::config::{self, ConfigError, LoadedWebhooks, PerJobConfig, RunArgs};
use jobhook::dispatch::{
    DeliveryPool, JobNotifier, PerJobDispatcher, build_global_dispatchers,
};
use jobhook::job::{CommandError, CommandJob, JobContext, JobInfo, format_duration};
use jobhook::time::Sleeper;
use jobhook::webhook::{Deliverer, HttpClient, ReqwestClient};

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;

/// Runs the job described by `args` and notifies its webhooks.
///
/// Webhook configuration problems are logged and never stop the job: a
/// config file that fails to load means no webhooks, and a bad per-job
/// reference disables only the per-job webhooks.
///
/// # Errors
///
/// Returns the job's own error, unchanged.
///
/// # Coverage Note
///
/// This function is excluded from coverage because it spawns a real shell
/// and uses the real HTTP client.
#[cfg(not(tarpaulin_include))]
pub async fn execute(config_path: &Path, args: RunArgs) -> Result<(), CommandError> {
    let loaded = load_webhooks(config_path);
    let pool = DeliveryPool::new(Deliverer::new(ReqwestClient::new()));
    let notifier = build_notifier(pool, &loaded, &args.per_job());

    let drain_timeout = Duration::from_secs(args.drain_timeout);
    let command = args.command_line();
    let mut job = CommandJob::new(JobInfo::new(args.job_name, args.schedule, command));

    let result = notifier.run(&mut job).await;
    log_outcome(&job, &result);

    drain(notifier.pool(), drain_timeout).await;
    result
}

/// Loads the webhook config, logging and ignoring failures.
fn load_webhooks(path: &Path) -> LoadedWebhooks {
    match config::load(path) {
        Ok(loaded) => {
            tracing::info!(
                "Loaded {} webhook definition(s) from '{}'",
                loaded.definitions.len(),
                path.display()
            );
            loaded
        }
        Err(e) => {
            tracing::error!("Webhooks disabled: {e}");
            LoadedWebhooks::default()
        }
    }
}

/// Creates the notifier: global dispatchers in priority order, then the
/// job's own dispatcher if it names any webhooks.
pub fn build_notifier<H, S>(
    pool: DeliveryPool<H, S>,
    loaded: &LoadedWebhooks,
    per_job: &PerJobConfig,
) -> JobNotifier<H, S>
where
    H: HttpClient + 'static,
    S: Sleeper + 'static,
{
    let mut notifier = JobNotifier::new(pool);
    for dispatcher in build_global_dispatchers(loaded) {
        notifier.push(dispatcher);
    }

    match PerJobDispatcher::from_config(per_job, &loaded.registry) {
        Ok(Some(dispatcher)) => notifier.push(dispatcher),
        Ok(None) => {}
        Err(e) => tracing::error!("Per-job webhooks disabled: {e}"),
    }

    notifier
}

/// Waits up to `timeout` for in-flight deliveries.
///
/// Returns `false` if deliveries were still running when it gave up.
pub async fn drain<H, S>(pool: &DeliveryPool<H, S>, timeout: Duration) -> bool
where
    H: HttpClient + 'static,
    S: Sleeper + 'static,
{
    if pool.in_flight() == 0 {
        return true;
    }

    tracing::debug!("Waiting for {} webhook delivery(ies)", pool.in_flight());
    if tokio::time::timeout(timeout, pool.drain()).await.is_ok() {
        true
    } else {
        tracing::warn!(
            "Gave up on {} webhook delivery(ies) after {}s",
            pool.in_flight(),
            timeout.as_secs()
        );
        false
    }
}

fn log_outcome<J: JobContext>(job: &J, result: &Result<(), J::Error>) {
    let name = &job.job().name;
    let took = format_duration(job.execution().duration);
    match result {
        Ok(()) => tracing::info!("Job '{name}' completed in {took}"),
        Err(e) => tracing::error!("Job '{name}' failed after {took}: {e}"),
    }
}

/// Loads the config at `path` and describes every definition.
///
/// Definitions whose retry settings would keep them from firing are
/// flagged in the report.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, parsed, or validated.
pub fn check(path: &Path) -> Result<String, ConfigError> {
    let loaded = config::load(path)?;

    let mut report = String::new();
    let _ = writeln!(
        report,
        "{} webhook(s) in '{}'",
        loaded.definitions.len(),
        path.display()
    );
    for definition in &loaded.definitions {
        let _ = writeln!(report, "  {definition}");
        if let Err(e) = definition.retry_policy() {
            let _ = writeln!(report, "    warning: {e}");
        }
    }

    Ok(report)
}
