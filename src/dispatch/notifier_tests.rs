//! Tests for the job notifier middleware.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use super::test_fixtures::{job, pool, snapshot, webhook};
use super::{GlobalDispatcher, JobNotifier, PerJobDispatcher, PoolConfig};
use crate::config::{PerJobConfig, WebhookDefinition, WebhookRegistry, WebhookType};
use crate::job::{Execution, JobContext, JobInfo};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("job blew up")]
struct Boom;

/// A pipeline that ends with a fixed result.
struct StubJob {
    info: JobInfo,
    execution: Execution,
    fail: bool,
    stopped: bool,
}

impl StubJob {
    fn new(fail: bool) -> Self {
        let now = Utc::now();
        Self {
            info: job(),
            execution: Execution::start(Execution::id_for(now), now),
            fail,
            stopped: false,
        }
    }
}

impl JobContext for StubJob {
    type Error = Boom;

    fn job(&self) -> &JobInfo {
        &self.info
    }

    fn execution(&self) -> &Execution {
        &self.execution
    }

    async fn next(&mut self) -> Result<(), Boom> {
        if self.fail { Err(Boom) } else { Ok(()) }
    }

    fn stop(&mut self, error: Option<&Boom>) {
        self.stopped = true;
        self.execution.stop(Utc::now(), error.map(ToString::to_string));
    }
}

fn global(definition: WebhookDefinition) -> GlobalDispatcher {
    GlobalDispatcher::new(Arc::new(definition)).unwrap()
}

#[tokio::test]
async fn returns_job_error_unchanged() {
    let (pool, client) = pool(PoolConfig::default());
    let notifier = JobNotifier::new(pool).with_dispatcher(global(webhook("ops", WebhookType::Error)));
    let mut ctx = StubJob::new(true);

    let result = notifier.run(&mut ctx).await;
    notifier.pool().drain().await;

    assert_eq!(result, Err(Boom));
    assert!(ctx.stopped);
    assert!(ctx.execution.failed);
    assert_eq!(client.urls(), ["https://hooks.example.com/ops"]);
}

#[tokio::test]
async fn webhook_failure_does_not_fail_the_job() {
    let (pool, client) = pool(PoolConfig::default());
    let mut hook = webhook("ops", WebhookType::All);
    hook.url = "https://fail.example.com/".into();
    let notifier = JobNotifier::new(pool).with_dispatcher(global(hook));
    let mut ctx = StubJob::new(false);

    let result = notifier.run(&mut ctx).await;
    notifier.pool().drain().await;

    assert_eq!(result, Ok(()));
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn deliveries_start_in_dispatcher_order() {
    let (pool, _client) = pool(PoolConfig::default());
    let mut registry = WebhookRegistry::new();
    registry.register(Arc::new(webhook("job-chat", WebhookType::Info)));
    let per_job = PerJobDispatcher::from_config(&PerJobConfig::new("", "job-chat"), &registry)
        .unwrap()
        .unwrap();

    let notifier = JobNotifier::new(pool)
        .with_dispatcher(global(webhook("first", WebhookType::All)))
        .with_dispatcher(global(webhook("skipped", WebhookType::Error)))
        .with_dispatcher(global(webhook("second", WebhookType::Info)))
        .with_dispatcher(per_job);

    let selected: Vec<String> = notifier
        .select(&snapshot(false))
        .into_iter()
        .map(|p| p.webhook.name.clone())
        .collect();
    assert_eq!(selected, ["first", "second", "job-chat"]);
    assert_eq!(notifier.len(), 4);

    let handles = notifier.notify(snapshot(false));
    assert_eq!(handles.len(), 3);
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn every_selected_webhook_is_delivered() {
    let (pool, client) = pool(PoolConfig::default());
    let notifier = JobNotifier::new(pool)
        .with_dispatcher(global(webhook("a", WebhookType::All)))
        .with_dispatcher(global(webhook("b", WebhookType::Info)))
        .with_dispatcher(global(webhook("c", WebhookType::Error)));

    notifier.run(&mut StubJob::new(false)).await.unwrap();
    notifier.pool().drain().await;

    let mut urls = client.urls();
    urls.sort();
    assert_eq!(
        urls,
        ["https://hooks.example.com/a", "https://hooks.example.com/b"]
    );
}

#[tokio::test]
async fn no_dispatchers_sends_nothing() {
    let (pool, client) = pool(PoolConfig::default());
    let notifier = JobNotifier::new(pool);

    notifier.run(&mut StubJob::new(true)).await.unwrap_err();
    notifier.pool().drain().await;

    assert!(notifier.is_empty());
    assert!(client.requests().is_empty());
}
