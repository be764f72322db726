//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use std::fmt;
use std::net::IpAddr;

/// The fixed base URL that relative API endpoints are resolved against.
///
/// The URL must be absolute (`http` or `https`), must have a host, and must
/// end with `/` so that endpoints such as `upload/photo/` can be appended.
///
/// # Example
///
/// ```rust
/// use appwire::ApiUrl;
///
/// let url = ApiUrl::new("https://i.instagram.com/api/v1/").unwrap();
/// assert_eq!(url.host_name(), "i.instagram.com");
/// assert_eq!(url.resolve("upload/photo/"), "https://i.instagram.com/api/v1/upload/photo/");
/// assert_eq!(url.resolve("https://upload.example.com/x"), "https://upload.example.com/x");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiUrl {
    url: String,
    host_start: usize,
    host_end: usize,
}

impl ApiUrl {
    /// Creates a new validated API URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiUrl`] if the URL is invalid.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into().trim().to_string();
        let invalid = || ConfigError::InvalidApiUrl { url: url.clone() };

        if !is_absolute_uri(&url) || !url.ends_with('/') {
            return Err(invalid());
        }

        let host_start = url.find("://").ok_or_else(invalid)? + 3;
        let remainder = &url[host_start..];
        let host_end = remainder
            .find([':', '/', '?', '#'])
            .map_or(url.len(), |i| host_start + i);

        if host_end == host_start {
            return Err(invalid());
        }

        Ok(Self {
            url,
            host_start,
            host_end,
        })
    }

    /// Returns the host name portion of the URL (without port).
    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.url[self.host_start..self.host_end]
    }

    /// Resolves an endpoint against this base URL.
    ///
    /// Endpoints that already start with `http:` or `https:` are returned
    /// verbatim; this is how chunk-upload URLs pointing at other hosts pass
    /// through. Everything else is appended to the base.
    #[must_use]
    pub fn resolve(&self, endpoint: &str) -> String {
        if is_absolute_uri(endpoint) {
            endpoint.to_string()
        } else {
            format!("{}{}", self.url, endpoint)
        }
    }
}

impl AsRef<str> for ApiUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

/// Returns `true` if the string begins with a recognized URI scheme.
#[must_use]
pub fn is_absolute_uri(value: &str) -> bool {
    value.starts_with("http:") || value.starts_with("https:")
}

/// The application key used to HMAC-sign request bodies.
///
/// # Security
///
/// The `Debug` implementation masks the key, displaying only
/// `SigningKey(*****)`.
///
/// # Example
///
/// ```rust
/// use appwire::SigningKey;
///
/// let key = SigningKey::new("app-key").unwrap();
/// assert_eq!(format!("{:?}", key), "SigningKey(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(String);

impl SigningKey {
    /// Creates a new validated signing key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySigningKey`] if the key is empty.
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ConfigError::EmptySigningKey);
        }
        Ok(Self(key))
    }
}

impl AsRef<str> for SigningKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(*****)")
    }
}

/// A proxy applied to every request.
///
/// Accepts `http://`, `https://`, `socks5://` and `socks5h://` URLs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyUrl(String);

impl ProxyUrl {
    const SCHEMES: [&'static str; 4] = ["http://", "https://", "socks5://", "socks5h://"];

    /// Creates a new validated proxy URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidProxy`] if the value has no supported
    /// scheme or no host.
    pub fn new(proxy: impl Into<String>) -> Result<Self, ConfigError> {
        let proxy = proxy.into().trim().to_string();
        let host = Self::SCHEMES
            .iter()
            .find_map(|scheme| proxy.strip_prefix(scheme));

        match host {
            Some(host) if !host.is_empty() => Ok(Self(proxy)),
            _ => Err(ConfigError::InvalidProxy { proxy }),
        }
    }
}

impl AsRef<str> for ProxyUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The local address outbound connections are bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputInterface(IpAddr);

impl OutputInterface {
    /// Parses an output interface from a local IP address string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOutputInterface`] if the value is empty
    /// or not an IP address.
    pub fn new(interface: &str) -> Result<Self, ConfigError> {
        interface
            .trim()
            .parse::<IpAddr>()
            .map(Self)
            .map_err(|_| ConfigError::InvalidOutputInterface {
                interface: interface.to_string(),
            })
    }

    /// Returns the address to bind to.
    #[must_use]
    pub const fn addr(&self) -> IpAddr {
        self.0
    }
}
