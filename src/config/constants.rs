//! Protocol constants for the remote mobile API.
//!
//! These values mirror what the official mobile application sends. They are
//! the defaults for the corresponding [`ClientConfig`](super::ClientConfig)
//! fields and may be overridden when the remote service changes them.

/// Default API base URL for relative endpoints.
pub const DEFAULT_API_URL: &str = "https://i.instagram.com/api/v1/";

/// Default signature key version sent alongside signed bodies.
pub const DEFAULT_SIG_KEY_VERSION: &str = "4";

/// Default `X-IG-Capabilities` header value.
pub const DEFAULT_CAPABILITIES: &str = "3brTPw==";

/// Default `X-IG-Connection-Type` header value.
pub const DEFAULT_CONNECTION_TYPE: &str = "WIFI";

/// Default `X-FB-HTTP-Engine` header value.
pub const DEFAULT_HTTP_ENGINE: &str = "Liger";

/// Default `Accept-Encoding` header value.
pub const DEFAULT_ACCEPT_ENCODING: &str = "gzip, deflate";

/// Default `Accept-Language` header value.
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US";

/// Default `Content-Type` for plain API calls.
pub const DEFAULT_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Name of the session authentication cookie.
pub const CSRF_COOKIE_NAME: &str = "csrftoken";

/// Connect timeout applied to every request, in seconds.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Total per-request timeout, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 240;

/// Maximum redirects followed per request.
pub const MAX_REDIRECTS: usize = 8;

/// Bounds of the randomized `X-IG-Connection-Speed` header, in kbps.
pub const CONNECTION_SPEED_KBPS: std::ops::Range<u32> = 1000..3700;
