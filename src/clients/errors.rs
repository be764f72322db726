//! Error types for requests, responses and uploads.
//!
//! # Error Handling
//!
//! Every fallible client operation returns [`ApiError`]:
//!
//! - [`ApiError::LoginRequired`]: an authenticated call was attempted while
//!   logged out; nothing was sent
//! - [`ApiError::Transport`]: a socket-level failure, see [`TransportFailure`]
//! - [`ApiError::Throttled`]: the server answered HTTP 429
//! - [`ApiError::ApiCallFailed`]: the decoded response reported failure
//! - [`ApiError::ServerDroppedChunks`]: the server lost chunk state during a
//!   video upload
//! - [`ApiError::MalformedResponse`]: a body that had to be JSON was not
//! - [`ApiError::InvalidRequest`]: the request was rejected before sending
//!
//! # Example
//!
//! ```rust,ignore
//! use appwire::ApiError;
//!
//! match client.api("accounts/current_user/", None, true).await {
//!     Ok((csrf, body)) => println!("{body}"),
//!     Err(ApiError::LoginRequired) => println!("log in first"),
//!     Err(ApiError::Throttled { uri }) => println!("slow down: {uri}"),
//!     Err(e) => println!("request failed: {e}"),
//! }
//! ```

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::ConfigError;

/// The class of a socket-level failure.
///
/// Only [`FailureKind::ConnectTimeout`] is retried automatically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The connection could not be established before the connect timeout.
    ConnectTimeout,
    /// The connection could not be established (refused, DNS, TLS).
    Connect,
    /// The request timed out after the connection was established.
    Timeout,
    /// Any other transport failure.
    Other,
}

impl FailureKind {
    /// Classifies a `reqwest` error.
    #[must_use]
    pub fn classify(error: &reqwest::Error) -> Self {
        match (error.is_connect(), error.is_timeout()) {
            (true, true) => Self::ConnectTimeout,
            (true, false) => Self::Connect,
            (false, true) => Self::Timeout,
            (false, false) => Self::Other,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectTimeout => write!(f, "connect timeout"),
            Self::Connect => write!(f, "connect error"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "transport error"),
        }
    }
}

/// A request that failed below the HTTP layer.
///
/// # Example
///
/// ```rust
/// use appwire::clients::{FailureKind, TransportFailure};
///
/// let failure = TransportFailure {
///     kind: FailureKind::ConnectTimeout,
///     method: "POST".to_string(),
///     uri: "https://i.instagram.com/api/v1/upload/photo/".to_string(),
///     message: "operation timed out".to_string(),
/// };
/// assert!(failure.to_string().contains("connect timeout"));
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{method} {uri} failed ({kind}): {message}")]
pub struct TransportFailure {
    /// The failure class.
    pub kind: FailureKind,
    /// The request method.
    pub method: String,
    /// The request URI.
    pub uri: String,
    /// The error reported by the HTTP stack.
    pub message: String,
}

impl TransportFailure {
    /// Builds a failure from a `reqwest` error.
    #[must_use]
    pub fn from_reqwest(error: &reqwest::Error, method: &str, uri: &str) -> Self {
        Self {
            kind: FailureKind::classify(error),
            method: method.to_string(),
            uri: uri.to_string(),
            message: error.to_string(),
        }
    }
}

/// A request rejected before anything was sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidRequestError {
    /// A file part or upload source had no data.
    #[error("File data is missing for '{name}'.")]
    MissingFileData {
        /// The field or path with no data.
        name: String,
    },

    /// An upload source file was empty.
    #[error("Cannot upload empty file '{}'.", .path.display())]
    EmptyFile {
        /// The empty file.
        path: PathBuf,
    },

    /// A POST or PUT request was built without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// An argument was outside its accepted range.
    #[error("Invalid argument '{name}': {reason}")]
    InvalidArgument {
        /// The argument name.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Unified error type for client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An authenticated call was made while logged out.
    #[error("User not logged in. Please call login() and then try again.")]
    LoginRequired,

    /// The request failed at the socket level.
    #[error(transparent)]
    Transport(#[from] TransportFailure),

    /// The server answered HTTP 429.
    #[error("Throttled by the server (HTTP 429) for {uri}. Please wait a few minutes before you try again.")]
    Throttled {
        /// The throttled request URI.
        uri: String,
    },

    /// The decoded response was marked unsuccessful.
    #[error("{type_name}: {}", .message.as_deref().unwrap_or("request failed without a message"))]
    ApiCallFailed {
        /// The response type that was being decoded.
        type_name: String,
        /// The server's `message` field, if any.
        message: Option<String>,
    },

    /// The server lost chunk state during a video upload.
    #[error("Upload of '{}' failed, the server dropped chunks. Last reply: {reply}", .path.display())]
    ServerDroppedChunks {
        /// The file being uploaded.
        path: PathBuf,
        /// The body of the terminal chunk reply.
        reply: String,
    },

    /// A body that had to be JSON could not be decoded.
    #[error("Malformed response: {reason}. Body: {body}")]
    MalformedResponse {
        /// The decoder's complaint.
        reason: String,
        /// A prefix of the offending body.
        body: String,
    },

    /// The request was rejected before sending.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidRequestError),

    /// Reading an upload source failed.
    #[error("Could not read '{}': {source}", .path.display())]
    File {
        /// The file being read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The client configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// Returns `true` for [`ApiError::ServerDroppedChunks`].
    #[must_use]
    pub const fn is_dropped_chunks(&self) -> bool {
        matches!(self, Self::ServerDroppedChunks { .. })
    }

    /// Builds a [`ApiError::MalformedResponse`] with a bounded body preview.
    pub(crate) fn malformed(reason: impl fmt::Display, body: &[u8]) -> Self {
        Self::MalformedResponse {
            reason: reason.to_string(),
            body: preview(body, 200),
        }
    }
}

/// Returns at most `max_chars` characters of `body`, lossily decoded.
pub(crate) fn preview(body: &[u8], max_chars: usize) -> String {
    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.into_owned(),
    }
}
