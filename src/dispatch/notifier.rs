//! Middleware that notifies webhooks once a job has finished.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::{DeliveryPool, Dispatcher, PendingDelivery};
use crate::job::{ExecutionSnapshot, JobContext};
use crate::time::{Sleeper, TokioSleeper};
use crate::webhook::HttpClient;

/// Runs a job's pipeline, then starts every delivery its outcome selects.
///
/// Dispatchers are consulted in the order they were added; global
/// dispatchers are normally added in priority order before the job's own
/// per-job dispatcher. Deliveries start in that order and then run
/// independently.
#[derive(Debug)]
pub struct JobNotifier<H, S = TokioSleeper> {
    dispatchers: Vec<Box<dyn Dispatcher>>,
    pool: DeliveryPool<H, S>,
}

impl<H, S> JobNotifier<H, S>
where
    H: HttpClient + 'static,
    S: Sleeper + 'static,
{
    /// Creates a notifier with no dispatchers.
    #[must_use]
    pub fn new(pool: DeliveryPool<H, S>) -> Self {
        Self {
            dispatchers: Vec::new(),
            pool,
        }
    }

    /// Adds a dispatcher after the existing ones.
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: impl Dispatcher + 'static) -> Self {
        self.push(dispatcher);
        self
    }

    /// Adds a dispatcher after the existing ones.
    pub fn push(&mut self, dispatcher: impl Dispatcher + 'static) {
        self.dispatchers.push(Box::new(dispatcher));
    }

    /// Number of dispatchers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dispatchers.len()
    }

    /// Returns `true` if no dispatcher was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dispatchers.is_empty()
    }

    /// The pool deliveries are spawned on.
    #[must_use]
    pub const fn pool(&self) -> &DeliveryPool<H, S> {
        &self.pool
    }

    /// Runs the pipeline and notifies.
    ///
    /// The pipeline's result is returned unchanged; webhook failures never
    /// affect it.
    ///
    /// # Errors
    ///
    /// Returns the error produced by [`JobContext::next`].
    pub async fn run<J: JobContext>(&self, ctx: &mut J) -> Result<(), J::Error> {
        let result = ctx.next().await;
        ctx.stop(result.as_ref().err());

        let snapshot = ExecutionSnapshot::capture(ctx.job(), ctx.execution());
        self.notify(snapshot);

        result
    }

    /// The deliveries a finished execution selects, in start order.
    #[must_use]
    pub fn select(&self, snapshot: &ExecutionSnapshot) -> Vec<PendingDelivery> {
        self.dispatchers
            .iter()
            .flat_map(|dispatcher| dispatcher.on_job_complete(snapshot))
            .collect()
    }

    /// Starts the deliveries selected for a finished execution.
    pub fn notify(&self, snapshot: ExecutionSnapshot) -> Vec<JoinHandle<()>> {
        let snapshot = Arc::new(snapshot);

        self.select(&snapshot)
            .into_iter()
            .map(|pending| self.pool.spawn(Arc::clone(&snapshot), pending))
            .collect()
    }
}
