//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Environment variable overriding the webhook config file path.
pub const CONFIG_PATH_ENV: &str = "WEBHOOK_CONFIG";

/// Webhook config file used when neither the environment nor the caller names one.
pub const CONFIG_PATH: &str = "/etc/config/middlewares.json";

/// Default HTTP method for webhook requests.
pub const METHOD: &str = "POST";

/// Default request timeout in seconds.
pub const TIMEOUT_SECS: u64 = 10;

/// Default number of retries after the first attempt.
pub const RETRY_COUNT: u32 = 0;

/// Default initial retry backoff in milliseconds.
pub const RETRY_BACKOFF_MILLIS: u64 = 1_000;

/// Response body bytes kept for error diagnostics.
pub const RESPONSE_BODY_LIMIT: usize = 1024;

/// Deliveries allowed to run at the same time.
pub const DELIVERY_CONCURRENCY: usize = 16;

/// Default request timeout as Duration.
#[must_use]
pub const fn timeout() -> Duration {
    Duration::from_secs(TIMEOUT_SECS)
}

/// Default initial retry backoff as Duration.
#[must_use]
pub const fn retry_backoff() -> Duration {
    Duration::from_millis(RETRY_BACKOFF_MILLIS)
}
