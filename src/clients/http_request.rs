//! Request descriptors.
//!
//! An [`HttpRequest`] describes one logical call: method, URI, headers,
//! body and the logging flags that control how it is reported. It is built
//! fresh for every call and never mutated once built.

use std::fmt;

use crate::clients::errors::InvalidRequestError;

/// HTTP methods used by the remote API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// HTTP GET.
    Get,
    /// HTTP POST.
    Post,
    /// HTTP PUT.
    Put,
}

impl HttpMethod {
    /// Returns the method as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Self::GET,
            HttpMethod::Post => Self::POST,
            HttpMethod::Put => Self::PUT,
        }
    }
}

/// A request to be sent by the [`HttpClient`](crate::clients::HttpClient).
///
/// Use [`HttpRequest::builder`] to construct requests.
///
/// # Example
///
/// ```rust
/// use appwire::clients::{HttpMethod, HttpRequest};
///
/// let request = HttpRequest::builder(HttpMethod::Post, "upload/photo/")
///     .header("Content-Type", "multipart/form-data; boundary=abc")
///     .body(b"--abc--".to_vec())
///     .debug_uploaded_bytes(true)
///     .build()
///     .unwrap();
///
/// assert_eq!(request.header("content-type"), Some("multipart/form-data; boundary=abc"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpRequest {
    /// The HTTP method.
    pub method: HttpMethod,
    /// Absolute URI, or an endpoint relative to the API base URL.
    pub uri: String,
    /// Headers in insertion order. Names are unique, compared case-insensitively.
    pub headers: Vec<(String, String)>,
    /// The request body, if any.
    pub body: Option<Vec<u8>>,
    /// Suppresses debug output for this request.
    pub no_debug: bool,
    /// Logs the uploaded body text.
    pub debug_uploaded_body: bool,
    /// Logs the uploaded byte count.
    pub debug_uploaded_bytes: bool,
}

impl HttpRequest {
    /// Creates a new builder.
    #[must_use]
    pub fn builder(method: HttpMethod, uri: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, uri)
    }

    /// Returns the value of a header, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the body length in bytes.
    #[must_use]
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequestError::MissingBody`] for a POST or PUT without
    /// a body.
    pub fn verify(&self) -> Result<(), InvalidRequestError> {
        if matches!(self.method, HttpMethod::Post | HttpMethod::Put) && self.body.is_none() {
            return Err(InvalidRequestError::MissingBody {
                method: self.method.to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for [`HttpRequest`].
#[derive(Debug)]
pub struct HttpRequestBuilder {
    request: HttpRequest,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, uri: impl Into<String>) -> Self {
        Self {
            request: HttpRequest {
                method,
                uri: uri.into(),
                headers: Vec::new(),
                body: None,
                no_debug: false,
                debug_uploaded_body: false,
                debug_uploaded_bytes: false,
            },
        }
    }

    /// Sets a header, replacing any existing value for the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .request
            .headers
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
        {
            Some(existing) => existing.1 = value,
            None => self.request.headers.push((name, value)),
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.request.body = Some(body.into());
        self
    }

    /// Suppresses debug output for this request.
    #[must_use]
    pub const fn no_debug(mut self, no_debug: bool) -> Self {
        self.request.no_debug = no_debug;
        self
    }

    /// Logs the uploaded body text when debugging.
    #[must_use]
    pub const fn debug_uploaded_body(mut self, enabled: bool) -> Self {
        self.request.debug_uploaded_body = enabled;
        self
    }

    /// Logs the uploaded byte count when debugging.
    #[must_use]
    pub const fn debug_uploaded_bytes(mut self, enabled: bool) -> Self {
        self.request.debug_uploaded_bytes = enabled;
        self
    }

    /// Builds the [`HttpRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidRequestError`] if the request fails validation.
    pub fn build(self) -> Result<HttpRequest, InvalidRequestError> {
        self.request.verify()?;
        Ok(self.request)
    }
}
