//! Integration tests for download dispatch against a mock download
//! endpoint.

use std::sync::Arc;
use std::time::Duration;

use sobaixa_core::{
    ApiConfig, DispatchError, DispatchOutcome, DispatchTracker, DownloadRequest,
    HttpDownloadLauncher,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SUBMITTED_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=PLx";

fn request(format_id: &str) -> DownloadRequest {
    DownloadRequest {
        url: SUBMITTED_URL.to_string(),
        format_id: format_id.to_string(),
    }
}

fn tracker_for(server: &MockServer, settle_period: Duration) -> DispatchTracker {
    let config = ApiConfig::new(&server.uri()).expect("mock server URI is a valid base");
    DispatchTracker::with_settle_period(Arc::new(HttpDownloadLauncher::new(config)), settle_period)
}

#[tokio::test]
async fn test_dispatch_hits_download_endpoint_with_original_url() {
    let server = MockServer::start().await;

    // The download endpoint receives the URL as submitted, not the
    // canonical form.
    Mock::given(method("GET"))
        .and(path("/api/download"))
        .and(query_param("url", SUBMITTED_URL))
        .and(query_param("format_id", "22"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, Duration::from_secs(60));
    let outcome = tracker
        .begin_dispatch(&request("22"))
        .await
        .expect("dispatch succeeds");

    assert_eq!(outcome, DispatchOutcome::Started);
    assert!(tracker.is_dispatching("22"));
    server.verify().await;
}

#[tokio::test]
async fn test_rapid_repeat_dispatch_collapses_to_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, Duration::from_secs(60));
    let first = tracker.begin_dispatch(&request("22")).await.expect("first");
    let second = tracker
        .begin_dispatch(&request("22"))
        .await
        .expect("second is a no-op");

    assert_eq!(first, DispatchOutcome::Started);
    assert_eq!(second, DispatchOutcome::AlreadyInFlight);
    server.verify().await;
}

#[tokio::test]
async fn test_slot_frees_after_settle_period_and_allows_redispatch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/download"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let tracker = tracker_for(&server, Duration::from_millis(50));
    tracker.begin_dispatch(&request("22")).await.expect("first");

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!tracker.is_dispatching("22"), "settle period has elapsed");

    let outcome = tracker
        .begin_dispatch(&request("22"))
        .await
        .expect("redispatch after settle");
    assert_eq!(outcome, DispatchOutcome::Started);
    server.verify().await;
}

#[tokio::test]
async fn test_unreachable_endpoint_reports_error_but_keeps_slot() {
    // Nothing listens on port 1; the launch fails immediately.
    let config = ApiConfig::new("http://127.0.0.1:1").expect("valid base");
    let tracker = DispatchTracker::with_settle_period(
        Arc::new(HttpDownloadLauncher::new(config)),
        Duration::from_millis(50),
    );

    let result = tracker.begin_dispatch(&request("22")).await;
    assert!(matches!(result, Err(DispatchError::Endpoint { .. })));

    // The failed launch still occupies the slot until the settle period
    // elapses.
    assert!(tracker.is_dispatching("22"));
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!tracker.is_dispatching("22"));
}
