//! HTTP client types for the remote API.
//!
//! This module provides the request pipeline: the transport that carries
//! session cookies, the retry policy around it, the multipart encoder, the
//! response decoder, and the account-level [`ApiClient`] with its upload
//! operations.
//!
//! # Overview
//!
//! - [`HttpClient`]: The async transport for one account
//! - [`HttpRequest`]: A request to be sent
//! - [`HttpResponse`]: The status, headers and body of a reply
//! - [`retry`]: The retry decision and delay strategies
//! - [`multipart`]: The multipart body encoder
//! - [`decode`]: Big-integer safe JSON decoding
//! - [`ApiClient`]: Plain API calls with login checks and typed decoding
//! - [`upload`]: Photo uploads and chunked video uploads
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use appwire::{ClientConfig, CookieStore, HttpClient, HttpMethod, HttpRequest, SigningKey};
//!
//! let config = ClientConfig::builder()
//!     .signing_key(SigningKey::new("app-key")?)
//!     .build()?;
//! let client = HttpClient::new(config, Arc::new(CookieStore::in_memory()))?;
//!
//! let request = HttpRequest::builder(HttpMethod::Get, "si/fetch_headers/").build()?;
//! let response = client.send(&request).await?;
//! ```
//!
//! # Retry Behavior
//!
//! Only connection timeouts are retried, up to
//! [`ClientConfig::max_retries`](crate::ClientConfig::max_retries) times
//! with a constant one second delay by default. Every HTTP status is
//! returned to the caller, except 429 which becomes
//! [`ApiError::Throttled`].

pub mod api;
pub mod decode;
mod errors;
mod http_client;
mod http_request;
mod http_response;
pub mod multipart;
mod options;
pub mod retry;
pub mod upload;

pub use api::ApiClient;
pub use decode::DecodedResponse;
pub use errors::{ApiError, FailureKind, InvalidRequestError, TransportFailure};
pub use http_client::{HttpClient, TRUNCATED_BODY_CHARS};
pub use http_request::{HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::HttpResponse;
pub use multipart::MultipartPart;
pub use options::{CallOptions, CriticalOptions, EffectiveOptions};
pub use retry::{RetryDelay, RetryPolicy};
