//! Configuration error types.
//!
//! This module contains the error type returned by configuration builders
//! and validated newtypes.
//!
//! # Error Handling
//!
//! All configuration constructors return `Result<T, ConfigError>` to enable
//! fail-fast validation. Error messages are designed to be clear and actionable.
//!
//! # Example
//!
//! ```rust
//! use appwire::{ConfigError, SigningKey};
//!
//! let result = SigningKey::new("");
//! assert!(matches!(result, Err(ConfigError::EmptySigningKey)));
//! ```

use thiserror::Error;

/// Errors that can occur while building a client configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Signing key cannot be empty.
    #[error("Signing key cannot be empty. Please provide the application signing key.")]
    EmptySigningKey,

    /// API URL is invalid.
    #[error("Invalid API URL '{url}'. Expected an absolute http(s) URL ending in '/', e.g. 'https://api.example.com/api/v1/'.")]
    InvalidApiUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// Proxy URL is invalid.
    #[error("Invalid proxy '{proxy}'. Expected a scheme-qualified URL such as 'http://127.0.0.1:8080'.")]
    InvalidProxy {
        /// The invalid proxy that was provided.
        proxy: String,
    },

    /// Output interface is invalid.
    #[error("Invalid output interface '{interface}'. Expected a local IP address.")]
    InvalidOutputInterface {
        /// The invalid interface value that was provided.
        interface: String,
    },

    /// A custom CA bundle could not be loaded.
    #[error("Could not load CA bundle '{path}': {reason}")]
    InvalidCaBundle {
        /// Path of the bundle.
        path: String,
        /// Why loading failed.
        reason: String,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("Could not build HTTP client: {reason}")]
    HttpClientBuild {
        /// The reason reported by the HTTP stack.
        reason: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },
}
