// crates/runboard-client/tests/scripted_responses.rs
// ============================================================================
// Module: Scripted Response Tests
// Description: Feed and client behavior against scripted HTTP responses.
// Purpose: Validate loading, error, retention, limits, and request ordering.
// Dependencies: runboard-client, tiny_http, tokio
// ============================================================================

//! ## Overview
//! A `tiny_http` server answers each request from a fixed script, optionally
//! after a delay, so overlapping refreshes can be forced to complete out of
//! order.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::float_cmp,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use runboard_client::ClientConfig;
use runboard_client::DashboardView;
use runboard_client::FeedConfig;
use runboard_client::FeedError;
use runboard_client::ResponseOrdering;
use runboard_client::RunFeed;
use runboard_client::RunFeedClient;
use serde_json::Value;
use serde_json::json;
use tiny_http::Header;
use tiny_http::Response;
use tiny_http::Server;
use tokio::time::timeout;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// One scripted reply.
struct Step {
    /// HTTP status code.
    status: u16,
    /// Response body.
    body: String,
    /// Delay before replying.
    delay: Duration,
}

impl Step {
    /// Immediate reply with a JSON body.
    fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Immediate reply with a raw body.
    fn raw(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    /// Delays this reply.
    const fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Collection payload holding runs with the given ids.
fn runs_body(ids: &[&str]) -> Value {
    let runs: Vec<Value> =
        ids.iter().map(|id| json!({"run_id": id, "status": "FINISHED"})).collect();
    json!({ "modelRuns": runs })
}

/// Serves `script` in order and reports each request URL as it arrives.
fn scripted_server(script: Vec<Step>) -> (String, mpsc::Receiver<String>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let (seen_tx, seen_rx) = mpsc::channel();
    thread::spawn(move || {
        for step in script {
            let Ok(request) = server.recv() else {
                return;
            };
            let _ = seen_tx.send(request.url().to_string());
            thread::spawn(move || {
                thread::sleep(step.delay);
                let header =
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                let response = Response::from_string(step.body)
                    .with_status_code(step.status)
                    .with_header(header);
                let _ = request.respond(response);
            });
        }
    });
    (format!("http://{addr}"), seen_rx)
}

/// Returns the ids of the records currently held by `feed`.
fn record_ids(feed: &RunFeed) -> Vec<String> {
    feed.snapshot().records.iter().filter_map(|record| record.run_id.clone()).collect()
}

// ============================================================================
// SECTION: Loading and Errors
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn mount_reports_loading_until_records_arrive() {
    let (base, _seen) = scripted_server(vec![
        Step::json(200, &runs_body(&["a", "b"])).after(Duration::from_millis(200)),
    ]);
    let feed = RunFeed::mount(&FeedConfig::new(base)).unwrap();
    let initial = feed.snapshot();
    assert!(initial.loading);
    assert_eq!(initial.error, None);
    assert_eq!(DashboardView::from_snapshot(&initial), DashboardView::Loading);

    let settled = feed.settled().await;
    assert!(!settled.loading);
    assert_eq!(settled.error, None);
    assert_eq!(record_ids(&feed), vec!["a", "b"]);
    assert!(DashboardView::from_snapshot(&settled).is_ready());
}

#[tokio::test(flavor = "multi_thread")]
async fn failure_surfaces_server_error_field() {
    let (base, _seen) = scripted_server(vec![Step::json(
        500,
        &json!({"error": "Failed to fetch model runs", "details": "connection refused"}),
    )]);
    let feed = RunFeed::new(&FeedConfig::new(base)).unwrap();
    let snapshot = feed.refresh().await;
    assert!(!snapshot.loading);
    assert!(snapshot.records.is_empty());
    assert_eq!(snapshot.error.as_deref(), Some("Failed to fetch model runs"));
    assert_eq!(
        DashboardView::from_snapshot(&snapshot),
        DashboardView::Error("Failed to fetch model runs".to_string())
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn failure_without_error_field_uses_fallback_message() {
    let (base, _seen) = scripted_server(vec![
        Step::raw(503, "upstream unavailable"),
        Step::json(502, &json!({"error": 7})),
        Step::json(500, &json!({"error": ""})),
    ]);
    let feed = RunFeed::new(&FeedConfig::new(base)).unwrap();
    for _ in 0 .. 3 {
        let snapshot = feed.refresh().await;
        assert_eq!(snapshot.error.as_deref(), Some("Failed to fetch data"));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_refresh_keeps_previous_records() {
    let (base, _seen) = scripted_server(vec![
        Step::json(200, &runs_body(&["a"])),
        Step::json(500, &json!({"error": "Failed to fetch model runs"})),
        Step::json(200, &runs_body(&["b", "c"])),
    ]);
    let feed = RunFeed::new(&FeedConfig::new(base)).unwrap();
    feed.refresh().await;
    assert_eq!(record_ids(&feed), vec!["a"]);

    let failed = feed.refresh().await;
    assert_eq!(failed.error.as_deref(), Some("Failed to fetch model runs"));
    assert_eq!(record_ids(&feed), vec!["a"]);

    let recovered = feed.refresh().await;
    assert_eq!(recovered.error, None);
    assert_eq!(record_ids(&feed), vec!["b", "c"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn refresh_clears_error_when_request_starts() {
    let (base, seen) = scripted_server(vec![
        Step::json(500, &json!({"error": "boom"})),
        Step::json(200, &runs_body(&["a"])).after(Duration::from_millis(300)),
    ]);
    let feed = RunFeed::new(&FeedConfig::new(base)).unwrap();
    feed.refresh().await;
    assert_eq!(feed.snapshot().error.as_deref(), Some("boom"));
    seen.recv().unwrap();

    let pending = tokio::spawn({
        let feed = feed.clone();
        async move { feed.refresh().await }
    });
    seen.recv_timeout(Duration::from_secs(5)).unwrap();
    let during = feed.snapshot();
    assert!(during.loading);
    assert_eq!(during.error, None);
    pending.await.unwrap();
    assert_eq!(record_ids(&feed), vec!["a"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn transport_failure_sets_error_message() {
    let closed = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = closed.local_addr().unwrap();
    drop(closed);
    let feed = RunFeed::new(&FeedConfig::new(format!("http://{addr}"))).unwrap();
    let snapshot = feed.refresh().await;
    assert!(!snapshot.loading);
    let message = snapshot.error.unwrap();
    assert!(message.starts_with("feed transport error"), "{message}");
}

#[tokio::test(flavor = "multi_thread")]
async fn undecodable_bodies_are_reported() {
    let (base, _seen) = scripted_server(vec![
        Step::raw(200, "not json"),
        Step::json(200, &json!({"runs": []})),
    ]);
    let feed = RunFeed::new(&FeedConfig::new(base)).unwrap();
    for _ in 0 .. 2 {
        let message = feed.refresh().await.error.unwrap();
        assert!(message.starts_with("feed decode error"), "{message}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_response_is_rejected() {
    let ids: Vec<String> = (0 .. 100).map(|index| format!("run-{index}")).collect();
    let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
    let (base, _seen) = scripted_server(vec![Step::json(200, &runs_body(&id_refs))]);
    let mut config = ClientConfig::new(base);
    config.max_response_bytes = 256;
    let client = RunFeedClient::new(&config).unwrap();
    let err = client.fetch_runs().await.unwrap_err();
    match err {
        FeedError::ResponseTooLarge {
            actual,
            limit,
        } => {
            assert_eq!(limit, 256);
            assert!(actual > limit);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_error_body_still_reports_status() {
    let padding = "x".repeat(4096);
    let (base, _seen) = scripted_server(vec![
        Step::json(500, &json!({"error": "Failed to fetch model runs", "details": padding})),
        Step::raw(502, &"y".repeat(128 * 1024)),
    ]);
    let mut config = ClientConfig::new(base);
    config.max_response_bytes = 1024;
    let client = RunFeedClient::new(&config).unwrap();

    let err = client.fetch_runs().await.unwrap_err();
    match err {
        FeedError::Status {
            status,
            message,
        } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Failed to fetch model runs");
        }
        other => panic!("unexpected error {other:?}"),
    }

    let err = client.fetch_runs().await.unwrap_err();
    match err {
        FeedError::Status {
            status,
            message,
        } => {
            assert_eq!(status, 502);
            assert_eq!(message, "Failed to fetch data");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

// ============================================================================
// SECTION: Abandoned Refreshes
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn dropped_refresh_does_not_leave_feed_loading() {
    let silent = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = silent.local_addr().unwrap();
    let feed = RunFeed::new(&FeedConfig::new(format!("http://{addr}"))).unwrap();

    let outcome = timeout(Duration::from_millis(200), feed.refresh()).await;
    assert!(outcome.is_err(), "silent server must not answer");

    let snapshot = feed.snapshot();
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error, None);
    assert_eq!(DashboardView::from_snapshot(&snapshot), DashboardView::Empty);
    let settled = timeout(Duration::from_secs(1), feed.settled()).await;
    assert!(settled.is_ok(), "settled must return once the refresh is dropped");
    drop(silent);
}

#[tokio::test(flavor = "multi_thread")]
async fn dropped_refresh_does_not_supersede_mount_fetch() {
    let (base, seen) = scripted_server(vec![
        Step::json(200, &runs_body(&["mounted"])).after(Duration::from_millis(400)),
        Step::json(200, &runs_body(&["abandoned"])).after(Duration::from_secs(30)),
    ]);
    let feed = RunFeed::mount(&FeedConfig::new(base)).unwrap();
    seen.recv_timeout(Duration::from_secs(5)).unwrap();

    let outcome = timeout(Duration::from_millis(100), feed.refresh()).await;
    assert!(outcome.is_err());
    assert!(feed.snapshot().loading, "mount fetch is still in flight");

    let settled = timeout(Duration::from_secs(5), feed.settled()).await.unwrap();
    assert!(!settled.loading);
    assert_eq!(settled.error, None);
    assert_eq!(record_ids(&feed), vec!["mounted"]);
}

// ============================================================================
// SECTION: Overlapping Refreshes
// ============================================================================

/// Issues a slow refresh then a fast one and returns the feed afterwards.
async fn overlapping_refreshes(ordering: ResponseOrdering) -> RunFeed {
    let (base, seen) = scripted_server(vec![
        Step::json(200, &runs_body(&["stale"])).after(Duration::from_millis(400)),
        Step::json(200, &runs_body(&["fresh"])),
    ]);
    let mut config = FeedConfig::new(base);
    config.ordering = ordering;
    let feed = RunFeed::new(&config).unwrap();

    let slow = tokio::spawn({
        let feed = feed.clone();
        async move { feed.refresh().await }
    });
    seen.recv_timeout(Duration::from_secs(5)).unwrap();
    let after_fast = feed.refresh().await;
    assert!(after_fast.loading, "slow request is still in flight");
    assert_eq!(record_ids(&feed), vec!["fresh"]);

    let after_slow = slow.await.unwrap();
    assert!(!after_slow.loading);
    feed
}

#[tokio::test(flavor = "multi_thread")]
async fn last_issued_request_wins_by_default() {
    let feed = overlapping_refreshes(ResponseOrdering::LastIssuedWins).await;
    assert_eq!(record_ids(&feed), vec!["fresh"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn last_response_wins_when_configured() {
    let feed = overlapping_refreshes(ResponseOrdering::LastResponseWins).await;
    assert_eq!(record_ids(&feed), vec!["stale"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn subscribers_observe_state_transitions() {
    let (base, _seen) = scripted_server(vec![Step::json(200, &runs_body(&["a"]))]);
    let feed = RunFeed::new(&FeedConfig::new(base)).unwrap();
    let mut receiver = feed.subscribe();
    feed.refresh().await;
    assert!(receiver.has_changed().unwrap());
    let latest = receiver.borrow_and_update().clone();
    assert!(!latest.loading);
    assert_eq!(latest.records.len(), 1);
}

// ============================================================================
// SECTION: Single Run and Footprints
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn fetch_run_encodes_id_and_maps_not_found() {
    let (base, seen) = scripted_server(vec![
        Step::json(200, &json!({"modelRun": {"run_id": "a b/c", "status": "FAILED"}})),
        Step::json(404, &json!({"error": "Run not found", "details": "zzz"})),
    ]);
    let client = RunFeedClient::new(&ClientConfig::new(format!("{base}/"))).unwrap();
    let found = client.fetch_run("a b/c").await.unwrap();
    assert_eq!(found, Some(json!({"run_id": "a b/c", "status": "FAILED"})));
    assert_eq!(seen.recv().unwrap(), "/api/model-runs/a%20b%2Fc");

    assert_eq!(client.fetch_run("zzz").await.unwrap(), None);
    assert_eq!(seen.recv().unwrap(), "/api/model-runs/zzz");
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_footprints_sends_paging_query() {
    let page = json!([{
        "run_id": "r1",
        "gpu_energy_kwh": 1.5,
        "gpu_carbon_kg": 0.25,
        "start_time": 1_000,
        "end_time": null,
        "status": "FINISHED"
    }]);
    let (base, seen) = scripted_server(vec![Step::json(200, &page), Step::json(200, &json!([]))]);
    let client = RunFeedClient::new(&ClientConfig::new(base)).unwrap();
    let footprints = client.fetch_footprints(Some(2), Some(1)).await.unwrap();
    assert_eq!(seen.recv().unwrap(), "/api/footprints?limit=2&skip=1");
    assert_eq!(footprints.len(), 1);
    assert_eq!(footprints[0].run_id.as_deref(), Some("r1"));
    assert_eq!(footprints[0].gpu_energy_kwh, 1.5);
    assert_eq!(footprints[0].start_time, Some(1_000));
    assert_eq!(footprints[0].end_time, None);

    assert!(client.fetch_footprints(None, None).await.unwrap().is_empty());
    assert_eq!(seen.recv().unwrap(), "/api/footprints");
}
