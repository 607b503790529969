//! Bounded background pool that renders and delivers webhooks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Notify, Semaphore, mpsc};
use tokio::task::JoinHandle;

use super::{DispatchError, PendingDelivery, TemplateField};
use crate::config::defaults;
use crate::job::ExecutionSnapshot;
use crate::template::Renderer;
use crate::time::{Sleeper, TokioSleeper};
use crate::webhook::{Deliverer, Delivery, HttpClient};

/// Pool sizing and failure reporting.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Deliveries allowed to run at the same time
    pub concurrency: usize,
    /// Receives every failed delivery, if set
    pub failures: Option<mpsc::UnboundedSender<DispatchError>>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            concurrency: defaults::DELIVERY_CONCURRENCY,
            failures: None,
        }
    }
}

/// Runs deliveries as independent tokio tasks.
///
/// At most [`PoolConfig::concurrency`] deliveries talk to the network at
/// once; the rest wait for a permit. A failure is logged, forwarded to the
/// failure channel, and otherwise contained in its own task.
///
/// Cloning is cheap and clones share the same pool.
#[derive(Debug)]
pub struct DeliveryPool<H, S = TokioSleeper> {
    shared: Arc<Shared<H, S>>,
    in_flight: Arc<InFlight>,
}

impl<H, S> Clone for DeliveryPool<H, S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

#[derive(Debug)]
struct Shared<H, S> {
    deliverer: Deliverer<H, S>,
    renderer: Renderer,
    permits: Semaphore,
    failures: Option<mpsc::UnboundedSender<DispatchError>>,
}

/// Count of spawned deliveries that have not finished.
#[derive(Debug, Default)]
struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

/// Decrements the in-flight count when its task ends, however it ends.
struct InFlightGuard(Arc<InFlight>);

impl InFlightGuard {
    fn enter(in_flight: &Arc<InFlight>) -> Self {
        in_flight.count.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(in_flight))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

impl<H, S> DeliveryPool<H, S>
where
    H: HttpClient + 'static,
    S: Sleeper + 'static,
{
    /// Creates a pool with default sizing and no failure channel.
    #[must_use]
    pub fn new(deliverer: Deliverer<H, S>) -> Self {
        Self::with_config(deliverer, PoolConfig::default())
    }

    /// Creates a pool with explicit sizing and failure reporting.
    ///
    /// A concurrency of zero is treated as one.
    #[must_use]
    pub fn with_config(deliverer: Deliverer<H, S>, config: PoolConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                deliverer,
                renderer: Renderer::new(),
                permits: Semaphore::new(config.concurrency.max(1)),
                failures: config.failures,
            }),
            in_flight: Arc::new(InFlight::default()),
        }
    }

    /// Starts one delivery in the background.
    ///
    /// Must be called from within a tokio runtime. The returned handle may
    /// be dropped; the delivery keeps running.
    pub fn spawn(
        &self,
        snapshot: Arc<ExecutionSnapshot>,
        pending: PendingDelivery,
    ) -> JoinHandle<()> {
        let shared = Arc::clone(&self.shared);
        let guard = InFlightGuard::enter(&self.in_flight);

        tokio::spawn(async move {
            let _guard = guard;
            let Ok(_permit) = shared.permits.acquire().await else {
                return;
            };

            match shared.run(&snapshot, &pending).await {
                Ok(attempts) => tracing::info!(
                    "Webhook '{}' delivered for job '{}' ({attempts} attempt(s))",
                    pending.webhook.name,
                    snapshot.job_name
                ),
                Err(e) => shared.report(e),
            }
        })
    }

    /// Number of spawned deliveries that have not finished.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.count.load(Ordering::SeqCst)
    }

    /// Waits until every spawned delivery has finished.
    ///
    /// Deliveries spawned while waiting are waited for as well.
    pub async fn drain(&self) {
        loop {
            let idle = self.in_flight.idle.notified();
            if self.in_flight() == 0 {
                return;
            }
            idle.await;
        }
    }
}

impl<H: HttpClient, S: Sleeper> Shared<H, S> {
    async fn run(
        &self,
        snapshot: &ExecutionSnapshot,
        pending: &PendingDelivery,
    ) -> Result<u32, DispatchError> {
        let delivery = self.render(snapshot, pending)?;
        self.deliverer
            .deliver(&delivery)
            .await
            .map_err(|source| DispatchError::Delivery {
                webhook: pending.webhook.name.clone(),
                source,
            })
    }

    /// Evaluates every template of the definition against the snapshot.
    fn render(
        &self,
        snapshot: &ExecutionSnapshot,
        pending: &PendingDelivery,
    ) -> Result<Delivery, DispatchError> {
        let webhook = &pending.webhook;
        let render_error = |field, source| DispatchError::Render {
            webhook: webhook.name.clone(),
            field,
            source,
        };

        let url = self
            .renderer
            .render(&webhook.url, snapshot)
            .map_err(|e| render_error(TemplateField::Url, e))?;

        let mut headers = BTreeMap::new();
        for (name, template) in &webhook.headers {
            let value = self
                .renderer
                .render(template, snapshot)
                .map_err(|e| render_error(TemplateField::Header(name.clone()), e))?;
            headers.insert(name.clone(), value);
        }

        let body = webhook
            .body
            .as_ref()
            .map(|body| self.renderer.render_body(body, snapshot))
            .transpose()
            .map_err(|e| render_error(TemplateField::Body, e))?;

        Ok(Delivery {
            method: webhook.method.clone(),
            url,
            headers,
            body,
            timeout: webhook.timeout,
            retry: pending.retry.clone(),
        })
    }

    fn report(&self, error: DispatchError) {
        tracing::error!("Webhook delivery failed: {error}");
        if let Some(failures) = &self.failures {
            // The receiver may already be gone.
            let _ = failures.send(error);
        }
    }
}
