//! Shared fixtures for dispatch tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::{WebhookDefinition, WebhookType};
use crate::job::{Execution, ExecutionSnapshot, JobInfo};
use crate::time::InstantSleeper;
use crate::webhook::{Deliverer, HttpClient, HttpError, HttpRequest, HttpResponse};

use super::{DeliveryPool, PoolConfig};

/// Records every request; answers 500 for URLs containing `fail`, else 200.
#[derive(Debug, Default)]
pub struct RecordingClient {
    requests: Mutex<Vec<HttpRequest>>,
}

impl RecordingClient {
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.url.to_string())
            .collect()
    }
}

impl HttpClient for Arc<RecordingClient> {
    async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
        let status = if req.url.as_str().contains("fail") {
            http::StatusCode::INTERNAL_SERVER_ERROR
        } else {
            http::StatusCode::OK
        };
        self.requests.lock().unwrap().push(req);
        Ok(HttpResponse::new(status, http::HeaderMap::new(), Vec::new()))
    }
}

pub type TestPool = DeliveryPool<Arc<RecordingClient>, Arc<InstantSleeper>>;

pub fn pool(config: PoolConfig) -> (TestPool, Arc<RecordingClient>) {
    let client = Arc::new(RecordingClient::default());
    let deliverer = Deliverer::new(Arc::clone(&client)).with_sleeper(Arc::new(InstantSleeper::new()));
    (DeliveryPool::with_config(deliverer, config), client)
}

pub fn webhook(name: &str, kind: WebhookType) -> WebhookDefinition {
    WebhookDefinition {
        name: name.to_string(),
        kind,
        active: true,
        priority: 0,
        url: format!("https://hooks.example.com/{name}"),
        method: http::Method::POST,
        headers: BTreeMap::new(),
        body: None,
        only_on_error: false,
        timeout: Duration::from_secs(5),
        retry: None,
    }
}

pub fn job() -> JobInfo {
    JobInfo::new("backup", "@daily", "tar -czf out.tgz /data")
}

pub fn execution(failed: bool) -> Execution {
    let start: DateTime<Utc> = DateTime::parse_from_rfc3339("2024-03-05T14:07:09Z")
        .unwrap()
        .with_timezone(&Utc);
    let mut execution = Execution::start("exec-1", start);
    execution.stop(
        start + chrono::Duration::seconds(83),
        failed.then(|| "exit status 2".to_string()),
    );
    execution
}

pub fn snapshot(failed: bool) -> ExecutionSnapshot {
    ExecutionSnapshot::with_hostname(&job(), &execution(failed), "host-a".into())
}
