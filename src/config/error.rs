//! Error types for configuration loading, validation, and references.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use super::WebhookType;

/// Error type for loading the webhook config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or does not match the expected shape.
    #[error("Failed to parse JSON config '{}': {source}", path.display())]
    JsonParse {
        /// Path to the config file
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// One of the definitions is invalid; the whole file is rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A webhook definition field is missing or malformed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The definition has no URL.
    #[error("webhook at index {index} is missing required 'url' field")]
    MissingUrl {
        /// Position of the definition in the file
        index: usize,
    },

    /// The definition has no type.
    #[error("webhook '{name}' is missing required 'type' field")]
    MissingType {
        /// Definition name
        name: String,
    },

    /// The type is not one of the known values.
    #[error("webhook '{name}' has invalid type '{value}', must be one of: 'error', 'info', 'all'")]
    InvalidType {
        /// Definition name
        name: String,
        /// The rejected type string
        value: String,
    },

    /// The method is not a valid HTTP method token.
    #[error("webhook '{name}' has invalid HTTP method '{value}'")]
    InvalidMethod {
        /// Definition name
        name: String,
        /// The rejected method string
        value: String,
    },

    /// The body is a JSON scalar other than a string.
    #[error("webhook '{name}' has unsupported body type: expected string, object, or array")]
    UnsupportedBody {
        /// Definition name
        name: String,
    },

    /// The retry backoff is not a duration.
    #[error("webhook '{name}' has invalid retry backoff duration '{value}': {reason}")]
    InvalidBackoff {
        /// Definition name
        name: String,
        /// The rejected duration string
        value: String,
        /// Parser message
        reason: String,
    },
}

/// Which per-job name list a reference came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameList {
    /// Webhooks fired when the job fails.
    Error,
    /// Webhooks fired when the job does not fail.
    Info,
}

impl NameList {
    /// Types a definition may have to be referenced from this list.
    #[must_use]
    pub const fn accepts(self, kind: WebhookType) -> bool {
        match self {
            Self::Error => matches!(kind, WebhookType::Error | WebhookType::All),
            Self::Info => matches!(kind, WebhookType::Info | WebhookType::All),
        }
    }
}

impl fmt::Display for NameList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("webhook-error-names"),
            Self::Info => f.write_str("webhook-info-names"),
        }
    }
}

/// A per-job configuration refers to a webhook it may not use.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReferenceError {
    /// No definition with this name was loaded.
    #[error("{list} references unknown webhook '{name}'")]
    UnknownWebhook {
        /// List holding the reference
        list: NameList,
        /// Referenced name
        name: String,
    },

    /// The definition's type does not fit the list.
    #[error("webhook '{name}' has type '{kind}' but is referenced in {list}")]
    IncompatibleType {
        /// List holding the reference
        list: NameList,
        /// Referenced name
        name: String,
        /// The definition's type
        kind: WebhookType,
    },
}
