//! End-to-end integration tests for the pagetrack tracker.
//!
//! These tests run a real tracker over HTTP against an in-process fake
//! collector, from a pre-existing host buffer to acknowledged deliveries.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use pagetrack_agent::{CommandQueue, ElementAttributes, Tracker};
use pagetrack_config::{RetryConfig, TrackerConfig};
use serde_json::{Value, json};

// ── Fake collector ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct FakeCollector {
    tracked: Arc<Mutex<Vec<Value>>>,
    logged: Arc<Mutex<Vec<Value>>>,
    /// Requests to refuse with a 500 before accepting.
    failures_left: Arc<AtomicUsize>,
}

impl FakeCollector {
    fn failing(times: usize) -> Self {
        Self {
            failures_left: Arc::new(AtomicUsize::new(times)),
            ..Self::default()
        }
    }

    fn tracked(&self) -> Vec<Value> {
        self.tracked.lock().unwrap().clone()
    }

    fn log_messages(&self) -> Vec<String> {
        self.logged
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r["message"].as_str().map(str::to_string))
            .collect()
    }

    async fn serve(&self) -> String {
        let router = Router::new()
            .route("/track", post(track))
            .route("/js-log", post(js_log))
            .with_state(self.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}

async fn track(
    State(fake): State<FakeCollector>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.tracked.lock().unwrap().push(body);
    let refused = fake
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if refused {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "busy"})))
    } else {
        (StatusCode::OK, Json(json!({"status": "ok"})))
    }
}

async fn js_log(State(fake): State<FakeCollector>, Json(body): Json<Value>) -> StatusCode {
    fake.logged.lock().unwrap().push(body);
    StatusCode::NO_CONTENT
}

fn config(endpoint: &str) -> TrackerConfig {
    TrackerConfig {
        endpoint: endpoint.to_string(),
        request_timeout_secs: 5,
        ..TrackerConfig::default()
    }
}

fn buffer(raw: Value) -> CommandQueue {
    let entries = raw.as_array().cloned().unwrap_or_default();
    let (queue, errors) = CommandQueue::from_wire_buffer(&entries);
    assert!(errors.is_empty(), "unexpected malformed entries: {errors:?}");
    queue
}

async fn settle(tracker: &Tracker) {
    tokio::time::timeout(Duration::from_secs(10), tracker.wait_idle())
        .await
        .expect("deliveries did not settle");
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_pre_existing_buffer_is_delivered_once() {
    let fake = FakeCollector::default();
    let base = fake.serve().await;

    let queue = buffer(json!([
        ["setAccount", {"id": "u1", "email": "ada@shop.io"}],
        ["trackProduct", {"id": "p1", "name": "Mug", "price": "12.00"}],
        ["trackPageView", {"path": "/checkout"}],
    ]));
    let tracker = Tracker::from_config(&config(&base), queue).unwrap();
    settle(&tracker).await;

    let tracked = fake.tracked();
    assert_eq!(tracked.len(), 2);

    let product = &tracked[0];
    assert_eq!(product["type"], "product");
    assert_eq!(product["id"], "p1");
    assert_eq!(product["name"], "Mug");
    assert_eq!(product["userId"], "u1");
    assert_eq!(product["account"], "ada@shop.io");
    assert_eq!(product["email"], "ada@shop.io");
    let ts = product["timestamp"].as_str().unwrap();
    assert_eq!(ts.len(), "2025-01-01T00:00:00.000Z".len());
    assert!(ts.ends_with('Z'));

    assert_eq!(tracked[1]["type"], "page_view");
    assert_eq!(tracked[1]["path"], "/checkout");

    // Later appends go straight through; the buffer is not replayed.
    tracker.push_wire(&json!(["trackLogin", {}]));
    settle(&tracker).await;
    let tracked = fake.tracked();
    assert_eq!(tracked.len(), 3);
    assert_eq!(tracked[2]["type"], "login");
    assert_eq!(tracker.stats().delivered, 3);
}

#[tokio::test]
async fn e2e_flaky_collector_is_retried_until_accepted() {
    let fake = FakeCollector::failing(3);
    let base = fake.serve().await;

    let tracker = Tracker::from_config(&config(&base), CommandQueue::new()).unwrap();
    tracker.push_wire(&json!(["trackCart", {"sku": "k1", "qty": 2}]));
    settle(&tracker).await;

    let tracked = fake.tracked();
    assert_eq!(tracked.len(), 4);
    assert!(tracked.iter().all(|b| b["sku"] == "k1" && b["qty"] == 2));

    let stats = tracker.stats();
    assert_eq!(stats.failed, 3);
    assert_eq!(stats.retried, 3);
    assert_eq!(stats.delivered, 1);
    assert_eq!(tracker.pending(), 0);
}

#[tokio::test]
async fn e2e_retry_ceiling_from_config() {
    let fake = FakeCollector::failing(usize::MAX);
    let base = fake.serve().await;

    let cfg = TrackerConfig {
        retry: RetryConfig {
            max_attempts: 2,
            backoff_ms: 10,
        },
        ..config(&base)
    };
    let tracker = Tracker::from_config(&cfg, CommandQueue::new()).unwrap();
    tracker.push_wire(&json!(["trackProduct", {"id": "p1"}]));
    settle(&tracker).await;

    assert_eq!(fake.tracked().len(), 2);
    let stats = tracker.stats();
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.abandoned, 1);
    assert_eq!(stats.delivered, 0);
}

#[tokio::test]
async fn e2e_invalid_commands_never_reach_the_collector() {
    let fake = FakeCollector::default();
    let base = fake.serve().await;

    let tracker = Tracker::from_config(&config(&base), CommandQueue::new()).unwrap();
    tracker.push_wire(&json!(["trackProduct", {"name": "no id"}]));
    tracker.push_wire(&json!(["trackWishlist", {"id": "w1"}]));
    tracker.push_wire(&json!("not a command"));
    tracker.push_wire(&json!(["trackPageView", {"path": "/ok"}]));
    settle(&tracker).await;

    let tracked = fake.tracked();
    assert_eq!(tracked.len(), 1);
    assert_eq!(tracked[0]["path"], "/ok");

    let stats = tracker.stats();
    assert_eq!(stats.rejected, 2);
    assert_eq!(stats.discarded, 1);
}

#[tokio::test]
async fn e2e_auto_seed_from_marked_element() {
    let fake = FakeCollector::default();
    let base = fake.serve().await;
    let cfg = config(&base);

    let tracker = Tracker::from_config(&cfg, CommandQueue::new()).unwrap();
    let elements: Vec<ElementAttributes> = serde_json::from_value(json!([
        {"class": "hero"},
        {"data-track-product": "", "data-product-id": "sku-7", "data-product-category": "tea"},
    ]))
    .unwrap();
    assert!(tracker.seed(&elements, &cfg.seed.marker_attribute).is_some());
    settle(&tracker).await;

    let tracked = fake.tracked();
    assert_eq!(tracked.len(), 1);
    assert_eq!(tracked[0]["id"], "sku-7");
    assert_eq!(tracked[0]["category"], "tea");
    assert_eq!(tracked[0]["account"], "default_email");
}

#[tokio::test]
async fn e2e_diagnostics_reach_remote_log() {
    let fake = FakeCollector::default();
    let base = fake.serve().await;

    let tracker = Tracker::from_config(&config(&base), CommandQueue::new()).unwrap();
    tracker.push_wire(&json!(["setAccount", "u9"]));
    tracker.push_wire(&json!(["trackLogin", {"method": "sso"}]));
    settle(&tracker).await;

    // Log posts are fire-and-forget; poll until they land.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let messages = fake.log_messages();
        if messages.iter().any(|m| m == "Server response") {
            assert!(messages.iter().any(|m| m == "Account set to"));
            assert!(messages.iter().any(|m| m == "Sending event"));
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "remote log never received the response record: {messages:?}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn e2e_remote_log_can_be_disabled() {
    let fake = FakeCollector::default();
    let base = fake.serve().await;

    let cfg = TrackerConfig {
        remote_log: false,
        ..config(&base)
    };
    let tracker = Tracker::from_config(&cfg, CommandQueue::new()).unwrap();
    tracker.push_wire(&json!(["trackPageView", {"path": "/"}]));
    settle(&tracker).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(fake.tracked().len(), 1);
    assert!(fake.log_messages().is_empty());
}

#[tokio::test]
async fn e2e_config_defaults_and_validation() {
    let config = TrackerConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.track_url(), "http://127.0.0.1:8080/track");
    assert_eq!(config.log_url(), "http://127.0.0.1:8080/js-log");

    let parsed: TrackerConfig = toml::from_str(&TrackerConfig::default_toml()).unwrap();
    assert_eq!(parsed.endpoint, config.endpoint);

    let bad = TrackerConfig {
        endpoint: "ftp://nope".into(),
        ..TrackerConfig::default()
    };
    assert!(bad.validate().is_err());
}
