//! Per-job webhook references.

use serde::Deserialize;

/// The webhook names a single job routes its outcome to.
///
/// Each field is a comma-separated list (`"a, b"`) or a JSON array
/// (`["a","b"]`) of registry names.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PerJobConfig {
    /// Names fired when the job fails
    #[serde(default)]
    pub webhook_error_names: String,

    /// Names fired when the job does not fail
    #[serde(default)]
    pub webhook_info_names: String,
}

impl PerJobConfig {
    /// Creates a config from the two raw name lists.
    #[must_use]
    pub fn new(error_names: impl Into<String>, info_names: impl Into<String>) -> Self {
        Self {
            webhook_error_names: error_names.into(),
            webhook_info_names: info_names.into(),
        }
    }

    /// Parsed error-list names.
    #[must_use]
    pub fn error_names(&self) -> Vec<String> {
        parse_webhook_names(&self.webhook_error_names)
    }

    /// Parsed info-list names.
    #[must_use]
    pub fn info_names(&self) -> Vec<String> {
        parse_webhook_names(&self.webhook_info_names)
    }

    /// Returns `true` if neither list names anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.error_names().is_empty() && self.info_names().is_empty()
    }
}

/// Parses a JSON array of names, falling back to a comma-separated list.
///
/// Blank entries of the comma form are dropped.
#[must_use]
pub fn parse_webhook_names(names: &str) -> Vec<String> {
    if names.trim().is_empty() {
        return Vec::new();
    }

    if let Ok(list) = serde_json::from_str::<Vec<String>>(names) {
        return list;
    }

    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect()
}
