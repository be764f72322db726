//! Integration tests for retry behavior.
//!
//! Only connection timeouts are retried. These tests pin down that every
//! other outcome reaches the caller after a single attempt.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use appwire::clients::retry::RetryPolicy;
use appwire::cookies::CookieStore;
use appwire::{
    ApiError, ApiUrl, ClientConfig, FailureKind, HttpClient, HttpMethod, HttpRequest, RetryDelay,
    SigningKey, TransportFailure,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_client(api_url: &str, delay: RetryDelay) -> HttpClient {
    let config = ClientConfig::builder()
        .api_url(ApiUrl::new(api_url).unwrap())
        .signing_key(SigningKey::new("test-key").unwrap())
        .retry_delay(delay)
        .build()
        .unwrap();
    HttpClient::new(config, Arc::new(CookieStore::in_memory())).unwrap()
}

fn connect_timeout() -> TransportFailure {
    TransportFailure {
        kind: FailureKind::ConnectTimeout,
        method: "POST".to_string(),
        uri: "https://i.instagram.com/api/v1/upload/photo/".to_string(),
        message: "connect timed out".to_string(),
    }
}

#[tokio::test]
async fn test_server_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/busy/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_client(
        &format!("{}/api/v1/", server.uri()),
        RetryDelay::Constant(Duration::from_secs(5)),
    );
    let request = HttpRequest::builder(HttpMethod::Get, "busy/").build().unwrap();

    let started = Instant::now();
    let response = client.send(&request).await.unwrap();

    assert_eq!(response.status, 503);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_refused_connection_is_not_retried() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = create_client(
        &format!("http://127.0.0.1:{port}/api/v1/"),
        RetryDelay::Constant(Duration::from_secs(5)),
    );
    let request = HttpRequest::builder(HttpMethod::Get, "feed/timeline/")
        .build()
        .unwrap();

    let started = Instant::now();
    let result = client.send(&request).await;

    match result {
        Err(ApiError::Transport(failure)) => {
            assert_eq!(failure.kind, FailureKind::Connect);
            assert!(failure.uri.ends_with("/api/v1/feed/timeline/"));
        }
        other => panic!("Expected connect failure, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_zero_ceiling_means_single_attempt() {
    let policy = RetryPolicy::new(0, RetryDelay::None);
    let attempts = AtomicU32::new(0);

    let result: Result<(), TransportFailure> = policy
        .run("POST", "upload/photo/", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(connect_timeout()) }
        })
        .await;

    assert_eq!(result.unwrap_err().kind, FailureKind::ConnectTimeout);
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
