//! Transport client.
//!
//! This module provides the [`HttpClient`] type, which sends one
//! [`HttpRequest`] at a time with the account's cookies attached, retries
//! connect timeouts, and merges the response's cookies back into the store.

use std::sync::Arc;

use crate::clients::errors::{preview, ApiError, FailureKind, TransportFailure};
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::{parse_response_headers, HttpResponse};
use crate::clients::options::{CallOptions, CriticalOptions, EffectiveOptions};
use crate::clients::retry::RetryPolicy;
use crate::config::constants::MAX_REDIRECTS;
use crate::config::{ClientConfig, OutputInterface, ProxyUrl, TlsVerification};
use crate::cookies::CookieStore;
use crate::error::ConfigError;

/// Characters of response body kept in logs when truncated debugging is on.
pub const TRUNCATED_BODY_CHARS: usize = 1000;

/// HTTP transport for one account.
///
/// The client handles:
/// - Resolving relative endpoints against the API base URL
/// - Attaching the `Cookie` header from the shared [`CookieStore`]
/// - Enforcing TLS verification, proxy and outbound interface on every call
/// - Retrying connect timeouts through a [`RetryPolicy`]
/// - Turning HTTP 429 into [`ApiError::Throttled`]
/// - Following redirects, merging `Set-Cookie` headers from every hop
/// - Persisting the cookie store after every response
///
/// Every other status is returned as a normal response.
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use appwire::{ClientConfig, CookieStore, HttpClient, HttpMethod, HttpRequest, SigningKey};
///
/// let config = ClientConfig::builder()
///     .signing_key(SigningKey::new("app-key")?)
///     .build()?;
/// let client = HttpClient::new(config, Arc::new(CookieStore::in_memory()))?;
///
/// let request = HttpRequest::builder(HttpMethod::Get, "si/fetch_headers/").build()?;
/// let response = client.send(&request).await?;
/// println!("{}", response.status);
/// ```
#[derive(Debug)]
pub struct HttpClient {
    client: reqwest::Client,
    config: ClientConfig,
    critical: CriticalOptions,
    cookies: Arc<CookieStore>,
    retry: RetryPolicy,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a transport using `config` and the account's cookie store.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the proxy, CA bundle or TLS setup is
    /// rejected by the HTTP stack.
    pub fn new(config: ClientConfig, cookies: Arc<CookieStore>) -> Result<Self, ConfigError> {
        let critical = CriticalOptions::from_config(&config);
        let client = build_client(&config, &critical)?;
        let retry = RetryPolicy::from_config(&config);

        Ok(Self {
            client,
            config,
            critical,
            cookies,
            retry,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the shared cookie store.
    #[must_use]
    pub const fn cookies(&self) -> &Arc<CookieStore> {
        &self.cookies
    }

    /// Returns the settings enforced on every call.
    #[must_use]
    pub const fn critical_options(&self) -> &CriticalOptions {
        &self.critical
    }

    /// Changes TLS verification for subsequent calls.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the new HTTP client cannot be built; the
    /// previous settings stay in effect.
    pub fn set_tls(&mut self, tls: TlsVerification) -> Result<(), ConfigError> {
        let mut critical = self.critical.clone();
        critical.tls = tls;
        self.apply_critical(critical)
    }

    /// Changes or removes the proxy for subsequent calls.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the new HTTP client cannot be built.
    pub fn set_proxy(&mut self, proxy: Option<ProxyUrl>) -> Result<(), ConfigError> {
        let mut critical = self.critical.clone();
        critical.proxy = proxy;
        self.apply_critical(critical)
    }

    /// Changes or removes the outbound interface for subsequent calls.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the new HTTP client cannot be built.
    pub fn set_output_interface(
        &mut self,
        interface: Option<OutputInterface>,
    ) -> Result<(), ConfigError> {
        let mut critical = self.critical.clone();
        critical.output_interface = interface;
        self.apply_critical(critical)
    }

    fn apply_critical(&mut self, critical: CriticalOptions) -> Result<(), ConfigError> {
        self.client = build_client(&self.config, &critical)?;
        self.critical = critical;
        Ok(())
    }

    /// Sends a request with default call options.
    ///
    /// # Errors
    ///
    /// See [`send_with`](Self::send_with).
    pub async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.send_with(request, CallOptions::default()).await
    }

    /// Sends a request, retrying connect timeouts.
    ///
    /// `options` are laid under the client's critical settings, so they can
    /// add headers or shorten the timeout but never change TLS, proxy,
    /// interface or cookies.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`ApiError::InvalidRequest`] if the request fails validation
    /// - [`ApiError::Transport`] once retrying stops on a socket failure
    /// - [`ApiError::Throttled`] for HTTP 429
    pub async fn send_with(
        &self,
        request: &HttpRequest,
        options: CallOptions,
    ) -> Result<HttpResponse, ApiError> {
        request.verify()?;

        let url = self.config.api_url().resolve(&request.uri);
        let effective = EffectiveOptions::layer(options, &self.critical);
        let method = request.method.as_str();

        let response = self
            .retry
            .run(method, &url, || self.execute_once(request, &url, &effective))
            .await?;

        if response.status == 429 {
            return Err(ApiError::Throttled { uri: url });
        }
        Ok(response)
    }

    /// Performs one attempt without retrying.
    ///
    /// Follows redirects itself: every hop's `Set-Cookie` headers are merged
    /// and each hop carries the cookies for its own host.
    async fn execute_once(
        &self,
        request: &HttpRequest,
        url: &str,
        options: &EffectiveOptions,
    ) -> Result<HttpResponse, TransportFailure> {
        let method = request.method.as_str();
        let failure = |message: String| TransportFailure {
            kind: FailureKind::Other,
            method: method.to_string(),
            uri: url.to_string(),
            message,
        };
        let mut current = reqwest::Url::parse(url).map_err(|e| failure(e.to_string()))?;

        let mut headers: Vec<&(String, String)> = request
            .headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("cookie"))
            .collect();
        for extra in &options.headers {
            match headers
                .iter_mut()
                .find(|(name, _)| name.eq_ignore_ascii_case(&extra.0))
            {
                Some(slot) => *slot = extra,
                None => headers.push(extra),
            }
        }

        let mut hop_method: reqwest::Method = request.method.into();
        let mut body = request.body.as_ref();
        let mut redirects = 0;

        loop {
            let host = current.host_str().unwrap_or_default().to_string();

            let mut builder = self.client.request(hop_method.clone(), current.clone());
            for (name, value) in &headers {
                if body.is_none()
                    && request.body.is_some()
                    && name.eq_ignore_ascii_case("content-type")
                {
                    continue;
                }
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(cookie) =
                self.cookies
                    .cookie_header(&host, current.path(), current.scheme() == "https")
            {
                builder = builder.header(reqwest::header::COOKIE, cookie);
            }
            if let Some(timeout) = options.timeout {
                builder = builder.timeout(timeout);
            }
            if let Some(body) = body {
                builder = builder.body(body.clone());
            }

            let res = builder
                .send()
                .await
                .map_err(|e| TransportFailure::from_reqwest(&e, method, url))?;

            let status = res.status().as_u16();
            let response_headers = parse_response_headers(res.headers());
            let response_body = res
                .bytes()
                .await
                .map_err(|e| TransportFailure::from_reqwest(&e, method, url))?
                .to_vec();
            let response = HttpResponse::new(status, response_headers, response_body);

            self.absorb_cookies(&response, &host);

            let next = redirect_target(&current, &response);
            match next {
                Some(next) if redirects < MAX_REDIRECTS => {
                    redirects += 1;
                    if switches_to_get(status, &hop_method) {
                        hop_method = reqwest::Method::GET;
                        body = None;
                    }
                    tracing::debug!(
                        status,
                        from = %current,
                        to = %next,
                        "Following redirect"
                    );
                    current = next;
                }
                Some(_) => {
                    return Err(failure(format!(
                        "too many redirects (limit {MAX_REDIRECTS})"
                    )));
                }
                None => {
                    self.log_exchange(request, url, &response);
                    return Ok(response);
                }
            }
        }
    }

    fn absorb_cookies(&self, response: &HttpResponse, host: &str) {
        self.cookies.merge_set_cookie_headers(
            response.header_values("set-cookie").iter().map(String::as_str),
            host,
        );
        if let Err(e) = self.cookies.save() {
            tracing::warn!(error = %e, "Failed to persist cookies after response");
        }
    }

    fn log_exchange(&self, request: &HttpRequest, url: &str, response: &HttpResponse) {
        if !self.config.debug() || request.no_debug {
            return;
        }

        let uploaded_body = request
            .debug_uploaded_body
            .then(|| request.body.as_deref().map(|b| preview(b, usize::MAX)))
            .flatten();
        let uploaded_bytes = request.debug_uploaded_bytes.then(|| request.body_len());
        let response_body = if self.config.truncated_debug() {
            preview(&response.body, TRUNCATED_BODY_CHARS)
        } else {
            response.text()
        };

        tracing::debug!(
            method = %request.method,
            uri = %url,
            uploaded_body = ?uploaded_body,
            uploaded_bytes = ?uploaded_bytes,
            status = response.status,
            response_bytes = response.body.len(),
            response_body = %response_body,
            "HTTP exchange"
        );
    }
}

/// Returns the next URL when `response` is a redirect with a usable
/// `Location`.
fn redirect_target(current: &reqwest::Url, response: &HttpResponse) -> Option<reqwest::Url> {
    if !matches!(response.status, 301 | 302 | 303 | 307 | 308) {
        return None;
    }
    let next = current.join(response.header("location")?).ok()?;
    matches!(next.scheme(), "http" | "https").then_some(next)
}

/// 303 always becomes GET; 301 and 302 turn a POST into GET.
fn switches_to_get(status: u16, method: &reqwest::Method) -> bool {
    match status {
        303 => *method != reqwest::Method::HEAD,
        301 | 302 => *method == reqwest::Method::POST,
        _ => false,
    }
}

fn build_client(
    config: &ClientConfig,
    critical: &CriticalOptions,
) -> Result<reqwest::Client, ConfigError> {
    let mut builder = reqwest::Client::builder()
        .use_rustls_tls()
        .connect_timeout(config.connect_timeout())
        .timeout(config.request_timeout())
        .redirect(reqwest::redirect::Policy::none())
        .gzip(true)
        .deflate(true);

    match &critical.tls {
        TlsVerification::Enabled => {}
        TlsVerification::Disabled => builder = builder.danger_accept_invalid_certs(true),
        TlsVerification::CustomCa(path) => {
            let invalid = |reason: String| ConfigError::InvalidCaBundle {
                path: path.display().to_string(),
                reason,
            };
            let pem = std::fs::read(path).map_err(|e| invalid(e.to_string()))?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| invalid(e.to_string()))?;
            builder = builder.add_root_certificate(cert);
        }
    }

    // Environment proxies never apply; only the configured one does.
    builder = match &critical.proxy {
        Some(proxy) => {
            let proxy =
                reqwest::Proxy::all(proxy.as_ref()).map_err(|_| ConfigError::InvalidProxy {
                    proxy: proxy.as_ref().to_string(),
                })?;
            builder.proxy(proxy)
        }
        None => builder.no_proxy(),
    };

    if let Some(interface) = critical.output_interface {
        builder = builder.local_address(interface.addr());
    }

    builder.build().map_err(|e| ConfigError::HttpClientBuild {
        reason: e.to_string(),
    })
}
