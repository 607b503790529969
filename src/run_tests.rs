//! Tests for the run module.

use std::sync::Arc;

use jobhook::config::WebhookDefinition;
use jobhook::dispatch::PoolConfig;
use jobhook::job::ExecutionSnapshot;
use jobhook::time::InstantSleeper;
use jobhook::webhook::{HttpError, HttpRequest, HttpResponse};

use super::*;

/// Answers every request with 200 OK.
#[derive(Debug, Default)]
struct OkClient;

impl HttpClient for OkClient {
    async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
        Ok(HttpResponse::new(
            http::StatusCode::OK,
            http::HeaderMap::new(),
            Vec::new(),
        ))
    }
}

/// Never answers.
#[derive(Debug, Default)]
struct HangingClient;

impl HttpClient for HangingClient {
    async fn request(&self, _req: HttpRequest) -> Result<HttpResponse, HttpError> {
        std::future::pending().await
    }
}

fn pool<H: HttpClient + 'static>(client: H) -> DeliveryPool<H, InstantSleeper> {
    DeliveryPool::with_config(
        Deliverer::new(client).with_sleeper(InstantSleeper::new()),
        PoolConfig::default(),
    )
}

fn loaded(json: &str) -> LoadedWebhooks {
    config::from_file(config::WebhooksFile::parse(json).unwrap()).unwrap()
}

const CONFIG: &str = r#"{"webhooks": [
    {"name": "ops", "type": "error", "active": true, "url": "https://ops.example.com/", "priority": 2},
    {"name": "chat", "type": "info", "active": true, "url": "https://chat.example.com/", "priority": 1},
    {"name": "slow", "type": "all", "active": true, "url": "https://slow.example.com/",
     "retry": {"count": 1, "backoff": "whenever"}}
]}"#;

fn snapshot(failed: bool) -> ExecutionSnapshot {
    let start = chrono::Utc::now();
    let mut execution = jobhook::job::Execution::start("id", start);
    execution.stop(start, failed.then(|| "boom".to_string()));
    ExecutionSnapshot::with_hostname(&JobInfo::new("nightly", "", "true"), &execution, String::new())
}

fn names<H, S>(notifier: &JobNotifier<H, S>, failed: bool) -> Vec<String>
where
    H: HttpClient + 'static,
    S: Sleeper + 'static,
{
    notifier
        .select(&snapshot(failed))
        .into_iter()
        .map(|p| p.webhook.name.clone())
        .collect()
}

mod notifier {
    use super::*;

    #[test]
    fn globals_only() {
        let notifier = build_notifier(pool(OkClient), &loaded(CONFIG), &PerJobConfig::default());

        // "slow" has an unusable backoff and is left out
        assert_eq!(notifier.len(), 2);
        assert_eq!(names(&notifier, true), ["ops"]);
        assert_eq!(names(&notifier, false), ["chat"]);
    }

    #[test]
    fn per_job_dispatcher_comes_last() {
        let notifier = build_notifier(
            pool(OkClient),
            &loaded(CONFIG),
            &PerJobConfig::new("ops", "chat"),
        );

        assert_eq!(notifier.len(), 3);
        assert_eq!(names(&notifier, true), ["ops", "ops"]);
    }

    #[test]
    fn bad_reference_keeps_globals() {
        let notifier = build_notifier(
            pool(OkClient),
            &loaded(CONFIG),
            &PerJobConfig::new("chat", ""),
        );

        assert_eq!(notifier.len(), 2);
    }

    #[test]
    fn empty_config_builds_empty_notifier() {
        let notifier = build_notifier(
            pool(OkClient),
            &LoadedWebhooks::default(),
            &PerJobConfig::default(),
        );

        assert!(notifier.is_empty());
    }
}

mod draining {
    use super::*;

    #[tokio::test]
    async fn idle_pool_drains_at_once() {
        assert!(drain(&pool(OkClient), Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn finished_deliveries_drain() {
        let notifier = build_notifier(pool(OkClient), &loaded(CONFIG), &PerJobConfig::default());
        notifier.notify(snapshot(true));

        assert!(drain(notifier.pool(), Duration::from_secs(5)).await);
        assert_eq!(notifier.pool().in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_delivery_times_out() {
        let pool = pool(HangingClient);
        let webhook = Arc::new(WebhookDefinition::from_raw(
            0,
            config::RawWebhook {
                name: "stuck".into(),
                kind: "all".into(),
                active: true,
                url: "https://stuck.example.com/".into(),
                ..config::RawWebhook::default()
            },
        )
        .unwrap());
        let retry = webhook.retry_policy().unwrap();
        drop(pool.spawn(
            Arc::new(snapshot(false)),
            jobhook::dispatch::PendingDelivery { webhook, retry },
        ));

        assert!(!drain(&pool, Duration::from_secs(30)).await);
        assert_eq!(pool.in_flight(), 1);
    }
}

mod checking {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn lists_definitions_and_flags_bad_backoff() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONFIG.as_bytes()).unwrap();

        let report = check(file.path()).unwrap();

        assert!(report.starts_with("3 webhook(s)"));
        assert!(report.contains("name: chat"));
        assert!(report.contains("warning: webhook 'slow' has invalid retry backoff"));
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let report = check(&dir.path().join("none.json")).unwrap();
        assert!(report.starts_with("0 webhook(s)"));
    }

    #[test]
    fn invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"webhooks": [{"name": "x", "type": "info"}]}"#).unwrap();

        assert!(matches!(
            check(file.path()),
            Err(ConfigError::Validation(_))
        ));
    }
}

mod exit_status {
    use crate::app::job_status;
    use jobhook::job::CommandError;

    #[test]
    fn success_is_zero() {
        assert_eq!(job_status(&Ok(())), 0);
    }

    #[test]
    fn spawn_failure_is_runtime_error() {
        let err = CommandError::Spawn(std::io::Error::other("no shell"));
        assert_eq!(job_status(&Err(err)), 2);
    }

    #[cfg(unix)]
    #[test]
    fn exit_code_passes_through() {
        use std::os::unix::process::ExitStatusExt;

        let status = std::process::ExitStatus::from_raw(7 << 8);
        assert_eq!(job_status(&Err(CommandError::Exit(status))), 7);
    }

    #[cfg(unix)]
    #[test]
    fn signal_maps_to_one() {
        use std::os::unix::process::ExitStatusExt;

        let status = std::process::ExitStatus::from_raw(9);
        assert_eq!(job_status(&Err(CommandError::Exit(status))), 1);
    }
}
