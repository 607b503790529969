//! Configuration layer: webhook definitions, the registry, and the CLI.
//!
//! This module provides:
//! - CLI argument parsing ([`Cli`], [`Command`])
//! - JSON webhook file parsing ([`WebhooksFile`])
//! - Validated definitions ([`WebhookDefinition`], [`WebhookType`], [`Body`])
//! - Name lookup ([`WebhookRegistry`])
//! - Loading with path resolution ([`load`], [`config_path_from_env`])
//! - Per-job references ([`PerJobConfig`])
//! - Default values ([`defaults`])
//!
//! # Path resolution
//!
//! The config file path is resolved with the following priority:
//!
//! 1. **`WEBHOOK_CONFIG` environment variable**
//! 2. **Explicit setting** (`--webhook-config`)
//! 3. **Built-in default** (`/etc/config/middlewares.json`)
//!
//! A missing file means "no webhooks", not an error.
//!
//! # Fail-fast validation
//!
//! One invalid definition rejects the whole file: either every definition is
//! loaded and registered, or none is. Retry backoff strings are the
//! exception; they are parsed when a dispatcher is built so that a bad
//! backoff only disables that one global webhook.

mod cli;
pub mod defaults;
mod definition;
mod error;
mod file;
mod loader;
mod per_job;
mod registry;


pub use cli::{Cli, Command, RunArgs};
pub use definition::{Body, RetrySettings, WebhookDefinition, WebhookType};
pub use error::{ConfigError, NameList, ReferenceError, ValidationError};
pub use file::{RawRetry, RawWebhook, WebhooksFile, default_config_template};
pub use loader::{
    LoadedWebhooks, config_path_from_env, from_file, load, resolve_config_path,
    write_default_config,
};
pub use per_job::{PerJobConfig, parse_webhook_names};
pub use registry::WebhookRegistry;
