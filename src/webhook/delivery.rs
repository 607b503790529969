//! Single-target delivery with retry.

use std::collections::BTreeMap;
use std::time::Duration;

use http::{HeaderName, HeaderValue, Method};

use super::{AttemptError, DeliveryError, HttpClient, HttpRequest, RetryPolicy};
use crate::config::defaults;
use crate::time::{Sleeper, TokioSleeper};

/// A fully rendered request plus its delivery parameters.
///
/// Produced by the dispatch layer after templates have been evaluated;
/// nothing in here is a template anymore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// HTTP method
    pub method: Method,
    /// Rendered target URL
    pub url: String,
    /// Rendered headers, by name
    pub headers: BTreeMap<String, String>,
    /// Rendered body, if the definition has one
    pub body: Option<Vec<u8>>,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Attempt count and backoff
    pub retry: RetryPolicy,
}

impl Delivery {
    /// Creates a POST delivery with default timeout and no retry.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
            timeout: defaults::timeout(),
            retry: RetryPolicy::default(),
        }
    }

    /// Builds the HTTP request sent on every attempt.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::InvalidUrl`] or [`DeliveryError::InvalidHeader`]
    /// when the rendered values are not valid HTTP.
    pub fn to_request(&self) -> Result<HttpRequest, DeliveryError> {
        let url = url::Url::parse(&self.url).map_err(|e| DeliveryError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        let mut request = HttpRequest::new(self.method.clone(), url).with_timeout(self.timeout);

        for (name, value) in &self.headers {
            let header_name =
                name.parse::<HeaderName>()
                    .map_err(|e| DeliveryError::InvalidHeader {
                        name: name.clone(),
                        reason: e.to_string(),
                    })?;
            let header_value =
                HeaderValue::from_str(value).map_err(|e| DeliveryError::InvalidHeader {
                    name: name.clone(),
                    reason: e.to_string(),
                })?;
            request.headers.insert(header_name, header_value);
        }

        request.body.clone_from(&self.body);
        Ok(request)
    }
}

/// Sends [`Delivery`] values over an [`HttpClient`], retrying on failure.
///
/// # Type Parameters
///
/// - `H`: The HTTP client implementation
/// - `S`: The sleeper used between attempts (defaults to [`TokioSleeper`])
#[derive(Debug)]
pub struct Deliverer<H, S = TokioSleeper> {
    client: H,
    sleeper: S,
}

impl<H> Deliverer<H, TokioSleeper> {
    /// Creates a deliverer that sleeps on the tokio timer.
    #[must_use]
    pub const fn new(client: H) -> Self {
        Self {
            client,
            sleeper: TokioSleeper,
        }
    }
}

impl<H, S> Deliverer<H, S> {
    /// Sets a custom sleeper for retry delays.
    ///
    /// This is primarily useful for testing to avoid actual delays.
    #[must_use]
    pub fn with_sleeper<S2>(self, sleeper: S2) -> Deliverer<H, S2> {
        Deliverer {
            client: self.client,
            sleeper,
        }
    }

    /// Returns the underlying HTTP client.
    #[must_use]
    pub const fn client(&self) -> &H {
        &self.client
    }
}

impl<H: HttpClient, S: Sleeper> Deliverer<H, S> {
    /// Executes a single request attempt.
    async fn execute_request(&self, request: &HttpRequest) -> Result<(), AttemptError> {
        let response = self.client.request(request.clone()).await?;

        if response.is_success() {
            return Ok(());
        }

        Err(AttemptError::NonSuccessStatus {
            status: response.status,
            body: response.body_prefix(defaults::RESPONSE_BODY_LIMIT),
        })
    }

    /// Delivers the request, retrying with exponential backoff.
    ///
    /// Returns the number of attempts it took to succeed.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Exhausted`] with the last attempt's error when
    /// every attempt fails, or a request-building error before any attempt.
    pub async fn deliver(&self, delivery: &Delivery) -> Result<u32, DeliveryError> {
        let request = delivery.to_request()?;
        let policy = &delivery.retry;

        let mut attempt = 1;
        loop {
            match self.execute_request(&request).await {
                Ok(()) => return Ok(attempt),
                Err(e) if policy.should_retry(attempt) => {
                    let delay = policy.delay_for_retry(attempt - 1);
                    tracing::debug!(
                        "Attempt {attempt}/{} to {} failed ({e}), retrying in {delay:?}",
                        policy.max_attempts,
                        delivery.url
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(DeliveryError::Exhausted {
                        attempts: attempt,
                        last_error: e,
                    });
                }
            }
        }
    }
}
