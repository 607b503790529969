//! Validated webhook definitions.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use http::Method;

use super::defaults;
use super::error::ValidationError;
use super::file::{RawRetry, RawWebhook};
use crate::webhook::RetryPolicy;

/// Which job outcomes a webhook is interested in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookType {
    /// Only failed jobs.
    Error,
    /// Only jobs that did not fail.
    Info,
    /// Every job.
    All,
}

impl WebhookType {
    /// Returns the config-file spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Info => "info",
            Self::All => "all",
        }
    }

    /// Classification: does this type select a job with the given outcome?
    #[must_use]
    pub const fn selects(self, failed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Error => failed,
            Self::Info => !failed,
        }
    }
}

impl fmt::Display for WebhookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(Self::Error),
            "info" => Ok(Self::Info),
            "all" => Ok(Self::All),
            _ => Err(()),
        }
    }
}

/// Request body template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// Rendered as-is.
    Text(String),
    /// Serialized to JSON text, rendered, then checked to still be JSON.
    Structured(serde_json::Value),
}

/// Retry settings kept as written until a dispatcher needs them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetrySettings {
    /// Retries after the first attempt
    pub count: u32,
    /// Initial backoff text; empty means the default
    pub backoff: String,
}

/// A validated webhook definition. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookDefinition {
    /// Lookup name
    pub name: String,
    /// Outcome classification
    pub kind: WebhookType,
    /// Inactive definitions never fire
    pub active: bool,
    /// Lower runs first among global webhooks
    pub priority: i64,
    /// URL template
    pub url: String,
    /// HTTP method
    pub method: Method,
    /// Header templates, by header name
    pub headers: BTreeMap<String, String>,
    /// Body template
    pub body: Option<Body>,
    /// Legacy flag: never send for a successful job
    pub only_on_error: bool,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retry settings, if configured
    pub retry: Option<RetrySettings>,
}

impl WebhookDefinition {
    /// Validates a raw entry and applies defaults.
    ///
    /// `index` is the entry's position in the file, used when it has no URL.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the URL or type is missing, the type
    /// or method is not recognized, or the body is a non-string scalar.
    pub fn from_raw(index: usize, raw: RawWebhook) -> Result<Self, ValidationError> {
        if raw.url.is_empty() {
            return Err(ValidationError::MissingUrl { index });
        }

        if raw.kind.is_empty() {
            return Err(ValidationError::MissingType { name: raw.name });
        }

        let Ok(kind) = raw.kind.parse::<WebhookType>() else {
            return Err(ValidationError::InvalidType {
                name: raw.name,
                value: raw.kind,
            });
        };

        let method_str = if raw.method.is_empty() {
            defaults::METHOD
        } else {
            raw.method.as_str()
        };
        let method = method_str
            .parse::<Method>()
            .map_err(|_| ValidationError::InvalidMethod {
                name: raw.name.clone(),
                value: method_str.to_string(),
            })?;

        let body = match raw.body {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(text)) => Some(Body::Text(text)),
            Some(value @ (serde_json::Value::Object(_) | serde_json::Value::Array(_))) => {
                Some(Body::Structured(value))
            }
            Some(_) => return Err(ValidationError::UnsupportedBody { name: raw.name }),
        };

        let timeout = if raw.timeout == 0 {
            defaults::timeout()
        } else {
            Duration::from_secs(raw.timeout)
        };

        Ok(Self {
            name: raw.name,
            kind,
            active: raw.active,
            priority: raw.priority,
            url: raw.url,
            method,
            headers: raw.headers.unwrap_or_default(),
            body,
            only_on_error: raw.only_on_error,
            timeout,
            retry: raw.retry.map(RetrySettings::from),
        })
    }

    /// Builds the retry policy for this definition.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidBackoff`] if the backoff is not a
    /// duration such as `"1s"` or `"500ms"`.
    pub fn retry_policy(&self) -> Result<RetryPolicy, ValidationError> {
        let Some(retry) = &self.retry else {
            return Ok(RetryPolicy::from_retry_count(defaults::RETRY_COUNT));
        };

        let backoff = if retry.backoff.is_empty() {
            defaults::retry_backoff()
        } else {
            humantime::parse_duration(&retry.backoff).map_err(|e| {
                ValidationError::InvalidBackoff {
                    name: self.name.clone(),
                    value: retry.backoff.clone(),
                    reason: e.to_string(),
                }
            })?
        };

        Ok(RetryPolicy::from_retry_count(retry.count).with_initial_delay(backoff))
    }
}

impl From<RawRetry> for RetrySettings {
    fn from(raw: RawRetry) -> Self {
        Self {
            count: raw.count,
            backoff: raw.backoff,
        }
    }
}

impl fmt::Display for WebhookDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let retries = self.retry.as_ref().map_or(0, |r| r.count);
        write!(
            f,
            "Webhook {{ name: {}, type: {}, active: {}, priority: {}, method: {}, url: {}, \
             timeout: {}s, retries: {}, only_on_error: {} }}",
            self.name,
            self.kind,
            self.active,
            self.priority,
            self.method,
            self.url,
            self.timeout.as_secs(),
            retries,
            self.only_on_error,
        )
    }
}
