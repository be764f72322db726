//! # appwire
//!
//! An async HTTP client core for a mobile-app style API that expects exact
//! request shaping: vendor headers, signed bodies, hand-built multipart
//! bodies, cookie-based session continuity and big-integer safe JSON.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - A shared [`CookieStore`] with pluggable persistence
//! - An [`HttpClient`] transport that attaches cookies, enforces TLS, proxy
//!   and interface settings, and retries connection timeouts
//! - A response decoder that keeps large integer identifiers exact
//! - An [`ApiClient`] for plain calls, signed calls and media uploads,
//!   including chunked video uploads with whole-sequence retries
//!
//! ## Quick Start
//!
//! ```rust
//! use appwire::{ClientConfig, SigningKey};
//!
//! let config = ClientConfig::builder()
//!     .signing_key(SigningKey::new("app-signing-key").unwrap())
//!     .max_retries(3)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.api_url().host_name(), "i.instagram.com");
//! ```
//!
//! ## Making Calls
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use appwire::{ApiClient, ClientConfig, CookieStore, Session, SigningKey};
//! use appwire::cookies::FileCookieJar;
//!
//! let config = ClientConfig::builder()
//!     .signing_key(SigningKey::new("app-signing-key")?)
//!     .build()?;
//! let cookies = Arc::new(CookieStore::new(FileCookieJar::new("cookies.json")));
//! let session = Arc::new(Session::new("Instagram 10.3.2 Android (18/4.3; 320dpi; 720x1280)"));
//! let client = ApiClient::new(config, session, cookies)?;
//!
//! // Anonymous calls work right away.
//! let (csrf, headers) = client.api("si/fetch_headers/", None, false).await?;
//!
//! // Authenticated calls need a restored or freshly issued csrftoken.
//! if client.restore_cookies() && client.mark_logged_in() {
//!     let (_, timeline) = client.api("feed/timeline/", None, true).await?;
//! }
//! ```
//!
//! ## Uploading Video
//!
//! ```rust,ignore
//! use appwire::clients::upload::SessionPolicy;
//!
//! let reply = client
//!     .upload_video("clip.mp4", SessionPolicy::Renew { upload_id: None }, None)
//!     .await?;
//! println!("{:?}", reply.upload_id);
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events. Request and response details are
//! logged at `debug` level when [`ClientConfig::debug`] is on. Retries are
//! logged at `warn` level.
//!
//! ## Thread Safety
//!
//! [`ClientConfig`], [`CookieStore`], [`Session`], [`HttpClient`] and
//! [`ApiClient`] are `Send + Sync` and can be shared across tasks.

pub mod auth;
pub mod clients;
pub mod config;
pub mod cookies;
pub mod error;

// Re-export public types at crate root for convenience
pub use auth::{LoginState, Session, SignedForm};
pub use config::{
    ApiUrl, ClientConfig, ClientConfigBuilder, OutputInterface, ProtocolHeaders, ProxyUrl,
    SigningKey, TlsVerification,
};
pub use cookies::{CookieEntry, CookieError, CookieStore};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    ApiClient, ApiError, CallOptions, FailureKind, HttpClient, HttpMethod, HttpRequest,
    HttpRequestBuilder, HttpResponse, InvalidRequestError, RetryDelay, TransportFailure,
};
