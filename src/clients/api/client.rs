//! Plain API calls for one account.

use std::sync::Arc;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::auth::signing::SignedForm;
use crate::auth::{LoginState, Session};
use crate::clients::api::responses::ApiResponse;
use crate::clients::decode::{decode_json, decode_typed};
use crate::clients::errors::{ApiError, InvalidRequestError};
use crate::clients::http_client::HttpClient;
use crate::clients::http_request::{HttpMethod, HttpRequest, HttpRequestBuilder};
use crate::clients::http_response::HttpResponse;
use crate::clients::multipart::{self, MultipartPart};
use crate::config::constants::CONNECTION_SPEED_KBPS;
use crate::config::ClientConfig;
use crate::cookies::CookieStore;
use crate::error::ConfigError;

/// Client for the remote API, bound to one account.
///
/// `ApiClient` adds what every endpoint shares on top of the
/// [`HttpClient`]: the login precondition, the fixed header set, and
/// decoding. Upload operations are implemented on this type in
/// [`crate::clients::upload`].
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use appwire::{ApiClient, ClientConfig, CookieStore, Session, SigningKey};
/// use appwire::cookies::FileCookieJar;
///
/// let config = ClientConfig::builder()
///     .signing_key(SigningKey::new("app-key")?)
///     .build()?;
/// let session = Arc::new(Session::new("Instagram 10.3.2 Android (18/4.3; 320dpi; 720x1280)"));
/// let cookies = Arc::new(CookieStore::new(FileCookieJar::new("cookies.json")));
///
/// let client = ApiClient::new(config, session, cookies)?;
/// if client.restore_cookies() {
///     let (csrf, timeline) = client.api("feed/timeline/", None, true).await?;
/// }
/// ```
pub struct ApiClient {
    http: HttpClient,
    session: Arc<Session>,
    login_state: Option<Arc<dyn LoginState>>,
}

// Verify ApiClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiClient>();
};

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("http", &self.http)
            .field("session", &self.session)
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}

impl ApiClient {
    /// Creates a client for `session`, sharing `cookies` with any other
    /// client of the same account.
    ///
    /// The session's own login flag is used as the login precondition.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        session: Arc<Session>,
        cookies: Arc<CookieStore>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            http: HttpClient::new(config, cookies)?,
            session,
            login_state: None,
        })
    }

    /// Replaces the login precondition with an external one.
    #[must_use]
    pub fn with_login_state(mut self, login_state: Arc<dyn LoginState>) -> Self {
        self.login_state = Some(login_state);
        self
    }

    /// Returns the transport.
    #[must_use]
    pub const fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Returns the transport for changing proxy, TLS or interface settings.
    pub fn http_mut(&mut self) -> &mut HttpClient {
        &mut self.http
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        self.http.config()
    }

    /// Returns the session.
    #[must_use]
    pub const fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Returns the shared cookie store.
    #[must_use]
    pub const fn cookies(&self) -> &Arc<CookieStore> {
        self.http.cookies()
    }

    /// Returns the host name of the API base URL.
    #[must_use]
    pub fn api_host(&self) -> &str {
        self.config().api_url().host_name()
    }

    /// Returns the current `csrftoken` for the API host.
    #[must_use]
    pub fn csrf_token(&self) -> Option<String> {
        self.cookies().csrf_token(self.api_host())
    }

    /// Returns `true` if calls requiring authentication may proceed.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.login_state
            .as_ref()
            .map_or_else(|| self.session.is_logged_in(), |state| state.is_logged_in())
    }

    /// Loads persisted cookies.
    ///
    /// Returns `true` if a valid `csrftoken` was restored. Otherwise the
    /// session is marked logged out.
    pub fn restore_cookies(&self) -> bool {
        self.cookies().load();
        let valid = self.cookies().has_valid_csrf_token(self.api_host());
        if !valid {
            self.session.set_logged_in(false);
        }
        valid
    }

    /// Marks the session logged in, provided a valid `csrftoken` is present.
    ///
    /// Call this after a successful authenticated response. Returns the new
    /// login state.
    pub fn mark_logged_in(&self) -> bool {
        let valid = self.cookies().has_valid_csrf_token(self.api_host());
        self.session.set_logged_in(valid);
        valid
    }

    /// Marks the session logged out.
    pub fn mark_logged_out(&self) {
        self.session.set_logged_in(false);
    }

    /// Fails with [`ApiError::LoginRequired`] if `needs_auth` and logged out.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::LoginRequired`] as described.
    pub fn ensure_logged_in(&self, needs_auth: bool) -> Result<(), ApiError> {
        if needs_auth && !self.is_logged_in() {
            return Err(ApiError::LoginRequired);
        }
        Ok(())
    }

    /// Returns the headers sent with every plain API call.
    ///
    /// The connection speed is drawn at random for every call.
    #[must_use]
    pub fn standard_headers(&self) -> Vec<(String, String)> {
        let headers = self.config().headers();
        let speed = rand::thread_rng().gen_range(CONNECTION_SPEED_KBPS);

        vec![
            ("User-Agent".to_string(), self.session.user_agent().to_string()),
            ("Connection".to_string(), "keep-alive".to_string()),
            ("Accept".to_string(), "*/*".to_string()),
            ("Accept-Encoding".to_string(), headers.accept_encoding.clone()),
            ("X-IG-Capabilities".to_string(), headers.capabilities.clone()),
            ("X-IG-Connection-Type".to_string(), headers.connection_type.clone()),
            ("X-IG-Connection-Speed".to_string(), format!("{speed}kbps")),
            ("X-FB-HTTP-Engine".to_string(), headers.http_engine.clone()),
            ("Content-Type".to_string(), headers.content_type.clone()),
            ("Accept-Language".to_string(), headers.accept_language.clone()),
        ]
    }

    fn request_builder(
        &self,
        method: HttpMethod,
        endpoint: &str,
    ) -> HttpRequestBuilder {
        self.standard_headers()
            .into_iter()
            .fold(HttpRequest::builder(method, endpoint), |builder, (name, value)| {
                builder.header(name, value)
            })
    }

    /// Sends a plain call: GET without a body, POST with one.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::LoginRequired`] without any network activity if
    /// `needs_auth` is set while logged out, or any transport error.
    pub async fn send_api(
        &self,
        endpoint: &str,
        post: Option<String>,
        needs_auth: bool,
    ) -> Result<HttpResponse, ApiError> {
        self.ensure_logged_in(needs_auth)?;

        let request = match post {
            Some(body) => self.request_builder(HttpMethod::Post, endpoint).body(body),
            None => self.request_builder(HttpMethod::Get, endpoint),
        }
        .build()?;

        self.http.send(&request).await
    }

    /// Performs a plain call and returns the current `csrftoken` with the
    /// decoded body.
    ///
    /// No success check is made on the body.
    ///
    /// # Errors
    ///
    /// See [`send_api`](Self::send_api); additionally
    /// [`ApiError::MalformedResponse`] if the body is not JSON.
    pub async fn api(
        &self,
        endpoint: &str,
        post: Option<String>,
        needs_auth: bool,
    ) -> Result<(Option<String>, Value), ApiError> {
        let response = self.send_api(endpoint, post, needs_auth).await?;
        let tree = decode_json(&response.body)?;
        Ok((self.csrf_token(), tree))
    }

    /// Performs a plain call and decodes the body into `T`.
    ///
    /// # Errors
    ///
    /// See [`api`](Self::api); additionally [`ApiError::ApiCallFailed`] if
    /// the body does not report success.
    pub async fn request<T>(
        &self,
        endpoint: &str,
        post: Option<String>,
        needs_auth: bool,
    ) -> Result<T, ApiError>
    where
        T: ApiResponse + DeserializeOwned,
    {
        let response = self.send_api(endpoint, post, needs_auth).await?;
        decode_typed(&response.body)
    }

    /// POSTs `payload` as a signed body and decodes the reply into `T`.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request); additionally
    /// [`ApiError::InvalidRequest`] if `payload` cannot be serialized.
    pub async fn signed_request<T, P>(
        &self,
        endpoint: &str,
        payload: &P,
        needs_auth: bool,
    ) -> Result<T, ApiError>
    where
        T: ApiResponse + DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let form = SignedForm::from_payload(payload, self.config()).map_err(|e| {
            InvalidRequestError::InvalidArgument {
                name: "payload",
                reason: e.to_string(),
            }
        })?;
        self.request(endpoint, Some(form.encode()), needs_auth).await
    }

    /// POSTs a multipart body, using the session UUID as boundary.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::LoginRequired`] as for plain calls,
    /// [`ApiError::InvalidRequest`] if a file part has no data, or any
    /// transport error.
    pub async fn send_multipart(
        &self,
        endpoint: &str,
        parts: &[MultipartPart],
        needs_auth: bool,
    ) -> Result<HttpResponse, ApiError> {
        self.ensure_logged_in(needs_auth)?;
        multipart::validate(parts)?;

        let boundary = self.session.uuid();
        let request = self
            .request_builder(HttpMethod::Post, endpoint)
            .header("Content-Type", multipart::content_type(boundary))
            .body(multipart::encode(parts, boundary))
            .debug_uploaded_bytes(true)
            .build()?;

        self.http.send(&request).await
    }

    /// Sends a prepared request through the transport, subject to the
    /// login precondition.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::LoginRequired`] as for plain calls, or any
    /// transport error.
    pub async fn send_raw(
        &self,
        request: &HttpRequest,
        needs_auth: bool,
    ) -> Result<HttpResponse, ApiError> {
        self.ensure_logged_in(needs_auth)?;
        self.http.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SigningKey;
    use crate::cookies::CookieEntry;

    struct AlwaysLoggedIn;

    impl LoginState for AlwaysLoggedIn {
        fn is_logged_in(&self) -> bool {
            true
        }
    }

    fn client() -> ApiClient {
        let config = ClientConfig::builder()
            .signing_key(SigningKey::new("key").unwrap())
            .build()
            .unwrap();
        ApiClient::new(
            config,
            Arc::new(Session::with_uuid("test-agent", "uuid-1")),
            Arc::new(CookieStore::in_memory()),
        )
        .unwrap()
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_standard_headers() {
        let client = client();
        let headers = client.standard_headers();

        assert_eq!(header(&headers, "User-Agent"), Some("test-agent"));
        assert_eq!(header(&headers, "Connection"), Some("keep-alive"));
        assert_eq!(header(&headers, "X-IG-Capabilities"), Some("3brTPw=="));
        assert_eq!(header(&headers, "X-IG-Connection-Type"), Some("WIFI"));
        assert_eq!(header(&headers, "X-FB-HTTP-Engine"), Some("Liger"));
        assert_eq!(header(&headers, "Accept-Language"), Some("en-US"));
        assert_eq!(
            header(&headers, "Content-Type"),
            Some("application/x-www-form-urlencoded; charset=UTF-8")
        );
    }

    #[test]
    fn test_connection_speed_in_range() {
        let client = client();
        for _ in 0..50 {
            let headers = client.standard_headers();
            let speed = header(&headers, "X-IG-Connection-Speed").unwrap();
            let kbps: u32 = speed.strip_suffix("kbps").unwrap().parse().unwrap();
            assert!((1000..3700).contains(&kbps));
        }
    }

    #[test]
    fn test_ensure_logged_in() {
        let client = client();
        assert!(client.ensure_logged_in(false).is_ok());
        assert!(matches!(
            client.ensure_logged_in(true),
            Err(ApiError::LoginRequired)
        ));
    }

    #[test]
    fn test_mark_logged_in_requires_csrf_cookie() {
        let client = client();
        assert!(!client.mark_logged_in());
        assert!(!client.is_logged_in());

        client
            .cookies()
            .insert(CookieEntry::new("csrftoken", "tok", "i.instagram.com"));
        assert!(client.mark_logged_in());
        assert!(client.is_logged_in());
        assert_eq!(client.csrf_token().as_deref(), Some("tok"));

        client.mark_logged_out();
        assert!(!client.is_logged_in());
    }

    #[test]
    fn test_restore_without_csrf_forces_logged_out() {
        let client = client();
        client.session().set_logged_in(true);
        assert!(!client.restore_cookies());
        assert!(!client.is_logged_in());
    }

    #[test]
    fn test_external_login_state() {
        let client = client().with_login_state(Arc::new(AlwaysLoggedIn));
        assert!(client.is_logged_in());
        assert!(client.ensure_logged_in(true).is_ok());
    }
}
