//! Configuration types for the client.
//!
//! This module provides the configuration used to build an
//! [`HttpClient`](crate::clients::HttpClient) and the higher-level
//! [`ApiClient`](crate::clients::api::ApiClient).
//!
//! # Overview
//!
//! - [`ClientConfig`]: All transport, retry and protocol settings
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`TlsVerification`]: How server certificates are verified
//! - [`ProtocolHeaders`]: Vendor header values sent on plain API calls
//! - [`ApiUrl`], [`SigningKey`], [`ProxyUrl`], [`OutputInterface`]: validated newtypes
//!
//! # Example
//!
//! ```rust
//! use appwire::{ClientConfig, SigningKey};
//!
//! let config = ClientConfig::builder()
//!     .signing_key(SigningKey::new("app-signing-key").unwrap())
//!     .debug(true)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.max_retries(), 10);
//! ```

pub mod constants;
mod newtypes;

pub use newtypes::{is_absolute_uri, ApiUrl, OutputInterface, ProxyUrl, SigningKey};

use std::path::PathBuf;
use std::time::Duration;

use crate::clients::retry::{RetryDelay, DEFAULT_MAX_RETRIES};
use crate::error::ConfigError;
use constants::{
    DEFAULT_ACCEPT_ENCODING, DEFAULT_ACCEPT_LANGUAGE, DEFAULT_API_URL, DEFAULT_CAPABILITIES,
    DEFAULT_CONNECTION_TYPE, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_CONTENT_TYPE,
    DEFAULT_HTTP_ENGINE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SIG_KEY_VERSION,
};

/// Default number of whole-sequence attempts for chunked video uploads.
pub const DEFAULT_UPLOAD_ATTEMPTS: u32 = 4;

/// How the transport verifies server TLS certificates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// Verify against the built-in root store.
    #[default]
    Enabled,
    /// Accept any certificate. Insecure, meant for intercepting proxies.
    Disabled,
    /// Verify against the PEM bundle at the given path, in addition to the
    /// built-in roots.
    CustomCa(PathBuf),
}

/// Vendor-specific header values sent with every plain API call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolHeaders {
    /// `X-IG-Capabilities`.
    pub capabilities: String,
    /// `X-IG-Connection-Type`.
    pub connection_type: String,
    /// `X-FB-HTTP-Engine`.
    pub http_engine: String,
    /// `Accept-Encoding`.
    pub accept_encoding: String,
    /// `Accept-Language`.
    pub accept_language: String,
    /// `Content-Type` for non-multipart calls.
    pub content_type: String,
}

impl Default for ProtocolHeaders {
    fn default() -> Self {
        Self {
            capabilities: DEFAULT_CAPABILITIES.to_string(),
            connection_type: DEFAULT_CONNECTION_TYPE.to_string(),
            http_engine: DEFAULT_HTTP_ENGINE.to_string(),
            accept_encoding: DEFAULT_ACCEPT_ENCODING.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

/// Configuration for the client.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_url: ApiUrl,
    signing_key: SigningKey,
    sig_key_version: String,
    tls: TlsVerification,
    proxy: Option<ProxyUrl>,
    output_interface: Option<OutputInterface>,
    connect_timeout: Duration,
    request_timeout: Duration,
    debug: bool,
    truncated_debug: bool,
    max_retries: u32,
    retry_delay: RetryDelay,
    upload_attempts: u32,
    headers: ProtocolHeaders,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the API base URL.
    #[must_use]
    pub const fn api_url(&self) -> &ApiUrl {
        &self.api_url
    }

    /// Returns the body signing key.
    #[must_use]
    pub const fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Returns the signature key version.
    #[must_use]
    pub fn sig_key_version(&self) -> &str {
        &self.sig_key_version
    }

    /// Returns the TLS verification mode.
    #[must_use]
    pub const fn tls(&self) -> &TlsVerification {
        &self.tls
    }

    /// Returns the proxy, if configured.
    #[must_use]
    pub const fn proxy(&self) -> Option<&ProxyUrl> {
        self.proxy.as_ref()
    }

    /// Returns the outbound interface override, if configured.
    #[must_use]
    pub const fn output_interface(&self) -> Option<OutputInterface> {
        self.output_interface
    }

    /// Returns the connect timeout.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Returns the total per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Returns whether request debugging is enabled globally.
    #[must_use]
    pub const fn debug(&self) -> bool {
        self.debug
    }

    /// Returns whether logged response bodies are truncated.
    #[must_use]
    pub const fn truncated_debug(&self) -> bool {
        self.truncated_debug
    }

    /// Returns the retry ceiling for a single logical request.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the delay strategy applied between retries.
    #[must_use]
    pub const fn retry_delay(&self) -> &RetryDelay {
        &self.retry_delay
    }

    /// Returns the default attempt ceiling for whole-sequence video uploads.
    #[must_use]
    pub const fn upload_attempts(&self) -> u32 {
        self.upload_attempts
    }

    /// Returns the protocol header values.
    #[must_use]
    pub const fn headers(&self) -> &ProtocolHeaders {
        &self.headers
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// The only required field is `signing_key`.
///
/// # Defaults
///
/// - `api_url`: [`constants::DEFAULT_API_URL`]
/// - `sig_key_version`: `"4"`
/// - `tls`: [`TlsVerification::Enabled`]
/// - `proxy`, `output_interface`: `None`
/// - `connect_timeout`: 30 seconds, `request_timeout`: 240 seconds
/// - `debug`, `truncated_debug`: `false`
/// - `max_retries`: 10, `retry_delay`: constant 1000 ms
/// - `upload_attempts`: 4
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    api_url: Option<ApiUrl>,
    signing_key: Option<SigningKey>,
    sig_key_version: Option<String>,
    tls: Option<TlsVerification>,
    proxy: Option<ProxyUrl>,
    output_interface: Option<OutputInterface>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    debug: Option<bool>,
    truncated_debug: Option<bool>,
    max_retries: Option<u32>,
    retry_delay: Option<RetryDelay>,
    upload_attempts: Option<u32>,
    headers: Option<ProtocolHeaders>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL.
    #[must_use]
    pub fn api_url(mut self, url: ApiUrl) -> Self {
        self.api_url = Some(url);
        self
    }

    /// Sets the body signing key (required).
    #[must_use]
    pub fn signing_key(mut self, key: SigningKey) -> Self {
        self.signing_key = Some(key);
        self
    }

    /// Sets the signature key version.
    #[must_use]
    pub fn sig_key_version(mut self, version: impl Into<String>) -> Self {
        self.sig_key_version = Some(version.into());
        self
    }

    /// Sets the TLS verification mode.
    #[must_use]
    pub fn tls(mut self, tls: TlsVerification) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Routes every request through the given proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: ProxyUrl) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Binds outbound connections to the given local address.
    #[must_use]
    pub const fn output_interface(mut self, interface: OutputInterface) -> Self {
        self.output_interface = Some(interface);
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets the total per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Enables or disables request debugging.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Truncates logged response bodies.
    #[must_use]
    pub const fn truncated_debug(mut self, truncated: bool) -> Self {
        self.truncated_debug = Some(truncated);
        self
    }

    /// Sets the retry ceiling for a single logical request.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets the delay strategy between retries.
    ///
    /// Use [`RetryDelay::None`] for deterministic tests.
    #[must_use]
    pub fn retry_delay(mut self, delay: RetryDelay) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Sets the default attempt ceiling for whole-sequence video uploads.
    #[must_use]
    pub const fn upload_attempts(mut self, attempts: u32) -> Self {
        self.upload_attempts = Some(attempts);
        self
    }

    /// Overrides the protocol header values.
    #[must_use]
    pub fn headers(mut self, headers: ProtocolHeaders) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Builds the [`ClientConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `signing_key` is not
    /// set, or [`ConfigError::InvalidApiUrl`] if the default URL is rejected.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let signing_key = self.signing_key.ok_or(ConfigError::MissingRequiredField {
            field: "signing_key",
        })?;
        let api_url = match self.api_url {
            Some(url) => url,
            None => ApiUrl::new(DEFAULT_API_URL)?,
        };

        Ok(ClientConfig {
            api_url,
            signing_key,
            sig_key_version: self
                .sig_key_version
                .unwrap_or_else(|| DEFAULT_SIG_KEY_VERSION.to_string()),
            tls: self.tls.unwrap_or_default(),
            proxy: self.proxy,
            output_interface: self.output_interface,
            connect_timeout: self
                .connect_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS)),
            request_timeout: self
                .request_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
            debug: self.debug.unwrap_or(false),
            truncated_debug: self.truncated_debug.unwrap_or(false),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            retry_delay: self.retry_delay.unwrap_or_default(),
            upload_attempts: self.upload_attempts.unwrap_or(DEFAULT_UPLOAD_ATTEMPTS),
            headers: self.headers.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SigningKey {
        SigningKey::new("test-signing-key").unwrap()
    }

    #[test]
    fn test_builder_requires_signing_key() {
        let result = ClientConfigBuilder::new().build();

        assert!(matches!(
            result,
            Err(ConfigError::MissingRequiredField {
                field: "signing_key"
            })
        ));
    }

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = ClientConfig::builder().signing_key(key()).build().unwrap();

        assert_eq!(config.api_url().as_ref(), DEFAULT_API_URL);
        assert_eq!(config.sig_key_version(), "4");
        assert_eq!(config.tls(), &TlsVerification::Enabled);
        assert!(config.proxy().is_none());
        assert!(config.output_interface().is_none());
        assert_eq!(config.connect_timeout(), Duration::from_secs(30));
        assert_eq!(config.request_timeout(), Duration::from_secs(240));
        assert!(!config.debug());
        assert!(!config.truncated_debug());
        assert_eq!(config.max_retries(), 10);
        assert_eq!(config.retry_delay().delay_for(3), Duration::from_millis(1000));
        assert_eq!(config.upload_attempts(), 4);
        assert_eq!(config.headers(), &ProtocolHeaders::default());
    }

    #[test]
    fn test_builder_with_all_optional_fields() {
        let config = ClientConfig::builder()
            .signing_key(key())
            .api_url(ApiUrl::new("http://127.0.0.1:9000/api/v1/").unwrap())
            .sig_key_version("5")
            .tls(TlsVerification::Disabled)
            .proxy(ProxyUrl::new("http://10.0.0.1:3128").unwrap())
            .output_interface(OutputInterface::new("127.0.0.1").unwrap())
            .connect_timeout(Duration::from_secs(5))
            .request_timeout(Duration::from_secs(60))
            .debug(true)
            .truncated_debug(true)
            .max_retries(3)
            .retry_delay(RetryDelay::None)
            .upload_attempts(2)
            .build()
            .unwrap();

        assert_eq!(config.api_url().host_name(), "127.0.0.1");
        assert_eq!(config.sig_key_version(), "5");
        assert_eq!(config.tls(), &TlsVerification::Disabled);
        assert_eq!(config.proxy().unwrap().as_ref(), "http://10.0.0.1:3128");
        assert!(config.output_interface().is_some());
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert!(config.debug());
        assert_eq!(config.max_retries(), 3);
        assert_eq!(config.retry_delay().delay_for(1), Duration::ZERO);
        assert_eq!(config.upload_attempts(), 2);
    }

    #[test]
    fn test_config_is_clone_and_debug_without_leaking_key() {
        let config = ClientConfig::builder().signing_key(key()).build().unwrap();
        let cloned = config.clone();
        assert_eq!(cloned.signing_key(), config.signing_key());

        let debug_str = format!("{config:?}");
        assert!(debug_str.contains("ClientConfig"));
        assert!(!debug_str.contains("test-signing-key"));
    }
}
