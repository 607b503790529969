//! Dispatchers built from every loaded definition.

use std::sync::Arc;

use super::{Dispatcher, PendingDelivery};
use crate::config::{LoadedWebhooks, ValidationError, WebhookDefinition};
use crate::job::ExecutionSnapshot;
use crate::webhook::RetryPolicy;

/// What a global dispatcher does for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Deliver.
    Send,
    /// The definition is inactive.
    Inactive,
    /// The definition's type does not select this outcome.
    TypeMismatch,
    /// `onlyOnError` is set and the job did not fail.
    SuppressedOnlyOnError,
}

impl Decision {
    /// Classifies one execution outcome for a definition.
    ///
    /// `onlyOnError` can only turn a send into a suppression; it never
    /// makes a mismatched type fire.
    #[must_use]
    pub const fn for_outcome(webhook: &WebhookDefinition, failed: bool) -> Self {
        if !webhook.active {
            Self::Inactive
        } else if !webhook.kind.selects(failed) {
            Self::TypeMismatch
        } else if webhook.only_on_error && !failed {
            Self::SuppressedOnlyOnError
        } else {
            Self::Send
        }
    }
}

/// Fires one definition for every job it classifies as interested.
#[derive(Debug, Clone)]
pub struct GlobalDispatcher {
    webhook: Arc<WebhookDefinition>,
    retry: RetryPolicy,
}

impl GlobalDispatcher {
    /// Creates a dispatcher, resolving the retry policy once.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidBackoff`] for a malformed backoff.
    pub fn new(webhook: Arc<WebhookDefinition>) -> Result<Self, ValidationError> {
        let retry = webhook.retry_policy()?;
        Ok(Self { webhook, retry })
    }

    /// The definition this dispatcher fires.
    #[must_use]
    pub fn webhook(&self) -> &WebhookDefinition {
        &self.webhook
    }

    /// The retry policy every delivery uses.
    #[must_use]
    pub const fn retry(&self) -> &RetryPolicy {
        &self.retry
    }
}

impl Dispatcher for GlobalDispatcher {
    fn on_job_complete(&self, snapshot: &ExecutionSnapshot) -> Vec<PendingDelivery> {
        let name = &self.webhook.name;
        match Decision::for_outcome(&self.webhook, snapshot.failed) {
            Decision::Send => vec![PendingDelivery {
                webhook: Arc::clone(&self.webhook),
                retry: self.retry.clone(),
            }],
            Decision::Inactive => {
                tracing::debug!("Webhook '{name}' is inactive, skipping");
                Vec::new()
            }
            Decision::TypeMismatch => {
                tracing::debug!(
                    "Webhook '{name}' ({}) does not match job '{}' outcome (failed: {}), skipping",
                    self.webhook.kind,
                    snapshot.job_name,
                    snapshot.failed
                );
                Vec::new()
            }
            Decision::SuppressedOnlyOnError => {
                tracing::debug!(
                    "Webhook '{name}' has onlyOnError set and job '{}' succeeded, skipping",
                    snapshot.job_name
                );
                Vec::new()
            }
        }
    }
}

/// Builds one dispatcher per definition, in priority order.
///
/// A definition whose dispatcher cannot be built is logged and left out;
/// the rest are still returned.
#[must_use]
pub fn build_global_dispatchers(loaded: &LoadedWebhooks) -> Vec<GlobalDispatcher> {
    let dispatchers: Vec<GlobalDispatcher> = loaded
        .definitions
        .iter()
        .filter_map(|webhook| match GlobalDispatcher::new(Arc::clone(webhook)) {
            Ok(dispatcher) => Some(dispatcher),
            Err(e) => {
                tracing::error!("Failed to create webhook '{}': {e}", webhook.name);
                None
            }
        })
        .collect();

    tracing::info!(
        "Loaded {} global webhook(s) out of {} definition(s)",
        dispatchers.len(),
        loaded.definitions.len()
    );
    dispatchers
}
