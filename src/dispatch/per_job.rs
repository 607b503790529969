//! Dispatcher for the webhooks one job names explicitly.

use std::sync::Arc;

use super::{Dispatcher, PendingDelivery};
use crate::config::{NameList, PerJobConfig, ReferenceError, WebhookDefinition, WebhookRegistry};
use crate::job::ExecutionSnapshot;

/// Routes a job's outcome to the webhooks listed in its configuration.
///
/// Failed runs go to the error list, every other run to the info list.
/// `onlyOnError` is not consulted here: naming a webhook in a list is
/// already the routing decision.
#[derive(Debug, Clone, Default)]
pub struct PerJobDispatcher {
    on_error: Vec<Arc<WebhookDefinition>>,
    on_info: Vec<Arc<WebhookDefinition>>,
}

impl PerJobDispatcher {
    /// Resolves both name lists against the registry.
    ///
    /// Returns `Ok(None)` when neither list names anything. Inactive
    /// definitions are accepted with a warning and skipped when firing.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError`] when a name is not registered or its type
    /// does not fit the list it appears in.
    pub fn from_config(
        config: &PerJobConfig,
        registry: &WebhookRegistry,
    ) -> Result<Option<Self>, ReferenceError> {
        let on_error = resolve(NameList::Error, &config.error_names(), registry)?;
        let on_info = resolve(NameList::Info, &config.info_names(), registry)?;

        if on_error.is_empty() && on_info.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self { on_error, on_info }))
    }

    /// Definitions fired when the job fails.
    #[must_use]
    pub fn error_webhooks(&self) -> &[Arc<WebhookDefinition>] {
        &self.on_error
    }

    /// Definitions fired when the job does not fail.
    #[must_use]
    pub fn info_webhooks(&self) -> &[Arc<WebhookDefinition>] {
        &self.on_info
    }
}

fn resolve(
    list: NameList,
    names: &[String],
    registry: &WebhookRegistry,
) -> Result<Vec<Arc<WebhookDefinition>>, ReferenceError> {
    names
        .iter()
        .map(|name| {
            let webhook = registry
                .get(name)
                .ok_or_else(|| ReferenceError::UnknownWebhook {
                    list,
                    name: name.clone(),
                })?;

            if !list.accepts(webhook.kind) {
                return Err(ReferenceError::IncompatibleType {
                    list,
                    name: name.clone(),
                    kind: webhook.kind,
                });
            }

            if !webhook.active {
                tracing::warn!("Webhook '{name}' referenced in {list} is inactive");
            }

            Ok(Arc::clone(webhook))
        })
        .collect()
}

impl Dispatcher for PerJobDispatcher {
    fn on_job_complete(&self, snapshot: &ExecutionSnapshot) -> Vec<PendingDelivery> {
        let selected = if snapshot.failed {
            &self.on_error
        } else {
            &self.on_info
        };

        selected
            .iter()
            .filter_map(|webhook| {
                if !webhook.active {
                    tracing::debug!("Webhook '{}' is inactive, skipping", webhook.name);
                    return None;
                }

                match webhook.retry_policy() {
                    Ok(retry) => Some(PendingDelivery {
                        webhook: Arc::clone(webhook),
                        retry,
                    }),
                    Err(e) => {
                        tracing::error!("Skipping webhook '{}': {e}", webhook.name);
                        None
                    }
                }
            })
            .collect()
    }
}
