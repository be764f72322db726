//! Integration tests for account-level API calls.
//!
//! These tests exercise the full stack from [`ApiClient`] through the
//! transport to a mock server: the login precondition, header shaping,
//! big-integer safe decoding, signed bodies and shared cookie state.

use std::sync::Arc;

use appwire::auth::signing::compute_signature;
use appwire::clients::api::StatusResponse;
use appwire::clients::upload::PhotoKind;
use appwire::cookies::{encode_cookies, CookieEntry, CookieStore, FileCookieJar};
use appwire::{ApiClient, ApiError, ApiUrl, ClientConfig, RetryDelay, Session, SigningKey};
use serde::Serialize;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_config(server: &MockServer) -> ClientConfig {
    ClientConfig::builder()
        .api_url(ApiUrl::new(format!("{}/api/v1/", server.uri())).unwrap())
        .signing_key(SigningKey::new("test-key").unwrap())
        .retry_delay(RetryDelay::None)
        .build()
        .unwrap()
}

fn create_client(server: &MockServer, cookies: Arc<CookieStore>) -> ApiClient {
    ApiClient::new(
        create_config(server),
        Arc::new(Session::with_uuid("test-agent", "uuid-1")),
        cookies,
    )
    .unwrap()
}

#[tokio::test]
async fn test_login_required_makes_no_network_calls() {
    let server = MockServer::start().await;
    let client = create_client(&server, Arc::new(CookieStore::in_memory()));

    let result = client.api("feed/timeline/", None, true).await;
    assert!(matches!(result, Err(ApiError::LoginRequired)));

    let result = client
        .upload_photo(PhotoKind::Single, "/nonexistent/photo.jpg", None)
        .await;
    assert!(matches!(result, Err(ApiError::LoginRequired)));

    let result = client.request_video_upload_url(None).await;
    assert!(matches!(result, Err(ApiError::LoginRequired)));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_api_returns_csrf_token_and_big_integers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/1862381929234567890/info/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "csrftoken=fresh; Path=/")
                .set_body_string(
                    r#"{"status":"ok","user":{"pk":1862381929234567890,"follower_count":12}}"#,
                ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, Arc::new(CookieStore::in_memory()));
    let (csrf, tree) = client
        .api("users/1862381929234567890/info/", None, false)
        .await
        .unwrap();

    assert_eq!(csrf.as_deref(), Some("fresh"));
    assert_eq!(tree["user"]["pk"], "1862381929234567890");
    assert_eq!(tree["user"]["follower_count"], 12);
}

#[tokio::test]
async fn test_standard_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/qe/sync/"))
        .and(header("user-agent", "test-agent"))
        .and(header("x-ig-capabilities", "3brTPw=="))
        .and(header("x-ig-connection-type", "WIFI"))
        .and(header("x-fb-http-engine", "Liger"))
        .and(header("accept-language", "en-US"))
        .and(header(
            "content-type",
            "application/x-www-form-urlencoded; charset=UTF-8",
        ))
        .and(body_string("id=uuid-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, Arc::new(CookieStore::in_memory()));
    let (_, tree) = client
        .api("qe/sync/", Some("id=uuid-1".to_string()), false)
        .await
        .unwrap();
    assert_eq!(tree["status"], "ok");
}

#[tokio::test]
async fn test_typed_request_reports_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/feed/timeline/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_string(r#"{"status":"fail","message":"login_required"}"#),
        )
        .mount(&server)
        .await;

    let cookies = Arc::new(CookieStore::in_memory());
    cookies.insert(CookieEntry::new("csrftoken", "tok", "127.0.0.1"));
    let client = create_client(&server, cookies);
    assert!(client.mark_logged_in());

    let result = client
        .request::<StatusResponse>("feed/timeline/", None, true)
        .await;
    match result {
        Err(ApiError::ApiCallFailed { message, .. }) => {
            assert_eq!(message.as_deref(), Some("login_required"));
        }
        other => panic!("Expected ApiCallFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_signed_request_body() {
    #[derive(Serialize)]
    struct EditProfile<'a> {
        _uuid: &'a str,
        biography: &'a str,
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/accounts/edit_profile/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(&server, Arc::new(CookieStore::in_memory()));
    let payload = EditProfile {
        _uuid: "uuid-1",
        biography: "hi there",
    };
    let reply: StatusResponse = client
        .signed_request("accounts/edit_profile/", &payload, false)
        .await
        .unwrap();
    assert!(appwire::clients::api::ApiResponse::is_ok(&reply));

    let json = r#"{"_uuid":"uuid-1","biography":"hi there"}"#;
    let expected_body = format!(
        "ig_sig_key_version=4&signed_body={}",
        urlencoding::encode(&format!("{}{json}", compute_signature(json, "test-key")))
    );
    let requests = server.received_requests().await.unwrap();
    assert_eq!(String::from_utf8_lossy(&requests[0].body), expected_body);
}

#[tokio::test]
async fn test_signed_request_accepts_unsized_payload() {
    let server = MockServer::start().await;
    let json = "[1862381929234567890,42]";
    let expected_body = format!(
        "ig_sig_key_version=4&signed_body={}",
        urlencoding::encode(&format!("{}{json}", compute_signature(json, "test-key")))
    );
    Mock::given(method("POST"))
        .and(path("/api/v1/media/seen/"))
        .and(body_string(expected_body))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let cookies = Arc::new(CookieStore::in_memory());
    cookies.insert(CookieEntry::new("csrftoken", "tok", "127.0.0.1"));
    let client = create_client(&server, cookies);
    assert!(client.mark_logged_in());

    let media_ids: Vec<u64> = vec![1_862_381_929_234_567_890, 42];
    let reply: StatusResponse = client
        .signed_request("media/seen/", media_ids.as_slice(), true)
        .await
        .unwrap();
    assert_eq!(reply.status.as_deref(), Some("ok"));
}

#[tokio::test]
async fn test_cookie_store_shared_between_clients() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/si/fetch_headers/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "mid=shared; Path=/")
                .set_body_string("{}"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/launcher/sync/"))
        .and(header("cookie", "mid=shared"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let cookies = Arc::new(CookieStore::in_memory());
    let first = create_client(&server, Arc::clone(&cookies));
    let second = create_client(&server, Arc::clone(&cookies));

    first.api("si/fetch_headers/", None, false).await.unwrap();
    second.api("launcher/sync/", None, false).await.unwrap();
}

#[tokio::test]
async fn test_restored_cookies_allow_authenticated_calls() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/feed/timeline/"))
        .and(header("cookie", "csrftoken=saved"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"status":"ok"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let cookie_path =
        std::env::temp_dir().join(format!("appwire-restore-{}.json", uuid::Uuid::new_v4()));
    let saved = encode_cookies(&[CookieEntry::new("csrftoken", "saved", "127.0.0.1")]).unwrap();
    std::fs::write(&cookie_path, saved).unwrap();

    let client = create_client(
        &server,
        Arc::new(CookieStore::new(FileCookieJar::new(&cookie_path))),
    );
    assert!(client.restore_cookies());
    assert!(client.mark_logged_in());

    let (csrf, tree) = client.api("feed/timeline/", None, true).await.unwrap();
    assert_eq!(csrf.as_deref(), Some("saved"));
    assert_eq!(tree["status"], "ok");

    let _ = std::fs::remove_file(cookie_path);
}

#[tokio::test]
async fn test_missing_cookie_file_forces_logged_out() {
    let server = MockServer::start().await;
    let cookie_path =
        std::env::temp_dir().join(format!("appwire-missing-{}.json", uuid::Uuid::new_v4()));

    let client = create_client(
        &server,
        Arc::new(CookieStore::new(FileCookieJar::new(&cookie_path))),
    );
    assert!(!client.restore_cookies());
    assert!(!client.mark_logged_in());

    let result = client.api("feed/timeline/", None, true).await;
    assert!(matches!(result, Err(ApiError::LoginRequired)));
}
