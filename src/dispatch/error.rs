//! Error type for background deliveries.

use thiserror::Error;

use super::TemplateField;
use crate::template::TemplateError;
use crate::webhook::DeliveryError;

/// A background delivery that did not complete.
///
/// Logged at error level and forwarded to the pool's failure channel; never
/// returned to the job.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A template could not be rendered.
    #[error("webhook '{webhook}': failed to render {field}: {source}")]
    Render {
        /// Definition name
        webhook: String,
        /// Template that failed
        field: TemplateField,
        /// Underlying template error
        #[source]
        source: TemplateError,
    },

    /// The rendered request could not be delivered.
    #[error("webhook '{webhook}': {source}")]
    Delivery {
        /// Definition name
        webhook: String,
        /// Underlying delivery error
        #[source]
        source: DeliveryError,
    },
}

impl DispatchError {
    /// Name of the definition that failed.
    #[must_use]
    pub fn webhook(&self) -> &str {
        match self {
            Self::Render { webhook, .. } | Self::Delivery { webhook, .. } => webhook,
        }
    }
}
