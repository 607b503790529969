//! Delivery engine: sends rendered webhook requests over HTTP.
//!
//! This module provides types and traits for:
//! - Building HTTP requests ([`HttpRequest`])
//! - Handling HTTP responses ([`HttpResponse`])
//! - Abstracting HTTP clients ([`HttpClient`])
//! - Production HTTP client implementation ([`ReqwestClient`])
//! - Delivery with retries ([`Deliverer`], [`Delivery`])
//! - Retry policy configuration ([`RetryPolicy`])

mod client;
mod delivery;
mod error;
mod http;
mod retry;

#[cfg(test)]
mod client_tests;

pub use client::ReqwestClient;
pub use delivery::{Deliverer, Delivery};
pub use error::{AttemptError, DeliveryError, HttpError};
pub use self::http::{HttpClient, HttpRequest, HttpResponse};
pub use retry::RetryPolicy;
