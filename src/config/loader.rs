//! Config path resolution and loading.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::defaults;
use super::error::ConfigError;
use super::file::WebhooksFile;
use super::{WebhookDefinition, WebhookRegistry};

/// The result of loading the webhook config file.
#[derive(Debug, Default, Clone)]
pub struct LoadedWebhooks {
    /// Definitions sorted by ascending priority (file order among equals)
    pub definitions: Vec<Arc<WebhookDefinition>>,
    /// Lookup by name for per-job references
    pub registry: WebhookRegistry,
}

impl LoadedWebhooks {
    /// Returns `true` if no definitions were loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Picks the config file path.
///
/// Order: `override_path` (normally the `WEBHOOK_CONFIG` environment
/// variable), then `explicit`, then [`defaults::CONFIG_PATH`]. Empty values
/// are skipped and a leading `~/` expands to the home directory.
#[must_use]
pub fn resolve_config_path(override_path: Option<&str>, explicit: Option<&Path>) -> PathBuf {
    let chosen = override_path
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| {
            explicit
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
        })
        .unwrap_or_else(|| PathBuf::from(defaults::CONFIG_PATH));

    expand_home(chosen)
}

/// [`resolve_config_path`] reading the override from the environment.
#[must_use]
pub fn config_path_from_env(explicit: Option<&Path>) -> PathBuf {
    let env = std::env::var(defaults::CONFIG_PATH_ENV).ok();
    resolve_config_path(env.as_deref(), explicit)
}

fn expand_home(path: PathBuf) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path;
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => path,
    }
}

/// Loads, validates, and sorts the webhook definitions at `path`.
///
/// A missing file is not an error and yields an empty result.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed, or if any
/// definition fails validation. Nothing is loaded in that case.
pub fn load(path: &Path) -> Result<LoadedWebhooks, ConfigError> {
    if !path.exists() {
        tracing::debug!(
            "Webhook config file not found at '{}', skipping webhooks",
            path.display()
        );
        return Ok(LoadedWebhooks::default());
    }

    let file = WebhooksFile::load(path)?;
    let loaded = from_file(file)?;

    if loaded.is_empty() {
        tracing::debug!("No webhooks defined in config file '{}'", path.display());
    }

    Ok(loaded)
}

/// Validates and sorts already-parsed definitions.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] for the first invalid definition.
pub fn from_file(file: WebhooksFile) -> Result<LoadedWebhooks, ConfigError> {
    let mut definitions = file
        .webhooks
        .into_iter()
        .enumerate()
        .map(|(index, raw)| WebhookDefinition::from_raw(index, raw).map(Arc::new))
        .collect::<Result<Vec<_>, _>>()?;

    // Stable: equal priorities keep file order.
    definitions.sort_by_key(|d| d.priority);

    let mut registry = WebhookRegistry::new();
    for definition in &definitions {
        registry.register(Arc::clone(definition));
    }

    Ok(LoadedWebhooks {
        definitions,
        registry,
    })
}

/// Writes the example webhook config to a file.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let template = super::file::default_config_template();
    std::fs::write(path, template).map_err(|e| ConfigError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}
