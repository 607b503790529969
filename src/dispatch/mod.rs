//! Job-completion dispatch: which webhooks fire, and firing them.
//!
//! This module provides:
//! - The [`Dispatcher`] trait, implemented by [`GlobalDispatcher`] (one per
//!   loaded definition) and [`PerJobDispatcher`] (one per job that names
//!   webhooks)
//! - [`DeliveryPool`], which renders and delivers on background tasks
//! - [`JobNotifier`], the middleware that runs a job and hands the outcome
//!   to every dispatcher
//!
//! Dispatchers only decide. Rendering, delivery, and failure reporting live
//! in the pool, so a failing webhook never reaches the job's result.

mod error;
mod global;
mod notifier;
mod per_job;
mod pool;

#[cfg(test)]
mod notifier_tests;
#[cfg(test)]
mod test_fixtures;

use std::fmt;
use std::sync::Arc;

use crate::config::WebhookDefinition;
use crate::job::ExecutionSnapshot;
use crate::webhook::RetryPolicy;

pub use error::DispatchError;
pub use global::{Decision, GlobalDispatcher, build_global_dispatchers};
pub use notifier::JobNotifier;
pub use per_job::PerJobDispatcher;
pub use pool::{DeliveryPool, PoolConfig};

/// Decides which webhooks a finished execution is delivered to.
pub trait Dispatcher: Send + Sync + fmt::Debug {
    /// Returns the deliveries to start, in the order they should start.
    fn on_job_complete(&self, snapshot: &ExecutionSnapshot) -> Vec<PendingDelivery>;
}

/// A definition selected for delivery, with its resolved retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelivery {
    /// The definition to render and send
    pub webhook: Arc<WebhookDefinition>,
    /// Attempts and backoff for this delivery
    pub retry: RetryPolicy,
}

/// The template a render error came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateField {
    /// The URL template.
    Url,
    /// A header value template, by header name.
    Header(String),
    /// The body template.
    Body,
}

impl fmt::Display for TemplateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url => f.write_str("url"),
            Self::Header(name) => write!(f, "header '{name}'"),
            Self::Body => f.write_str("body"),
        }
    }
}
