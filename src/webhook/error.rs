//! Error types for HTTP delivery.

use thiserror::Error;

/// Error type for HTTP transport operations.
///
/// Describes what went wrong without dictating recovery strategy.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    ///
    /// The server did not respond within the configured timeout period.
    #[error("Request timed out")]
    Timeout,

    /// The request could not be built from the given URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Failure of a single delivery attempt.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// Transport-level failure.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The endpoint answered with a status outside 2xx.
    #[error("non-2xx status code: {}, body: {body}", status.as_u16())]
    NonSuccessStatus {
        /// Response status
        status: http::StatusCode,
        /// Leading part of the response body (at most 1 KiB)
        body: String,
    },
}

/// Error returned by [`Deliverer::deliver`](super::Deliverer::deliver).
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The rendered URL is not a valid absolute URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The rendered URL
        url: String,
        /// Reason for invalidity
        reason: String,
    },

    /// A rendered header name or value is not valid HTTP.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// Header name
        name: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Every attempt failed; carries the last attempt's error.
    #[error("failed after {attempts} attempt(s): {last_error}")]
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// Error from the final attempt
        #[source]
        last_error: AttemptError,
    },
}
