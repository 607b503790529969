//! Webhook config file parsing.
//!
//! Defines the on-disk JSON shape with serde. Every field is optional here;
//! validation and defaults happen in [`WebhookDefinition::from_raw`].
//!
//! [`WebhookDefinition::from_raw`]: super::WebhookDefinition::from_raw

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;

/// Root of the webhook config file.
#[derive(Debug, Default, Deserialize)]
pub struct WebhooksFile {
    /// Webhook definitions in file order
    #[serde(default)]
    pub webhooks: Vec<RawWebhook>,
}

/// A webhook entry exactly as written in the file.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawWebhook {
    /// Lookup name
    #[serde(default)]
    pub name: String,

    /// "error", "info", or "all"
    #[serde(default, rename = "type")]
    pub kind: String,

    /// Whether the webhook fires at all
    #[serde(default)]
    pub active: bool,

    /// Ordering among global webhooks (lower first)
    #[serde(default)]
    pub priority: i64,

    /// URL template
    #[serde(default)]
    pub url: String,

    /// HTTP method
    #[serde(default)]
    pub method: String,

    /// Header templates
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,

    /// Body template: a string, or any JSON structure containing templates
    #[serde(default)]
    pub body: Option<serde_json::Value>,

    /// Suppress sending when the job succeeded
    #[serde(default)]
    pub only_on_error: bool,

    /// Timeout in seconds (0 = default)
    #[serde(default)]
    pub timeout: u64,

    /// Retry settings
    #[serde(default)]
    pub retry: Option<RawRetry>,
}

/// Retry settings as written in the file.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawRetry {
    /// Retries after the first attempt
    #[serde(default)]
    pub count: u32,

    /// Initial backoff, e.g. "1s" or "500ms"
    #[serde(default)]
    pub backoff: String,
}

impl WebhooksFile {
    /// Loads the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::JsonParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Parses config from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

/// Generates an example webhook config file.
#[must_use]
pub fn default_config_template() -> String {
    r##"{
  "webhooks": [
    {
      "name": "slack-errors",
      "type": "error",
      "active": true,
      "priority": 10,
      "url": "https://hooks.slack.com/services/CHANGE/ME",
      "headers": {
        "Content-Type": "application/json"
      },
      "body": {
        "text": "Job {{.JobName}} failed on {{.Hostname}}: {{.Error | jsonEscape}}",
        "attachments": [
          {
            "color": "{{colorHex .}}",
            "text": "{{.Stderr | truncate 500 | jsonEscape}}"
          }
        ]
      },
      "timeout": 10,
      "retry": {
        "count": 3,
        "backoff": "1s"
      }
    },
    {
      "name": "status-page",
      "type": "all",
      "active": false,
      "priority": 20,
      "url": "https://status.example.com/jobs/{{.JobName}}?status={{statusCode .}}",
      "method": "PUT",
      "body": "{{.JobName}} {{if .Failed}}failed{{else}}completed{{end}} in {{.Duration}}"
    }
  ]
}
"##
    .to_string()
}
