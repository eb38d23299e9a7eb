use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pulse_core::config::Config;
use pulse_duckdb::DuckDbBackend;
use pulse_server::app::build_app;
use pulse_server::state::AppState;

fn test_config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/pulse-test".to_string(),
        duckdb_memory_limit: "1GB".to_string(),
        seed_domain: None,
        notify_timeout_secs: 1,
    }
}

async fn setup() -> (Arc<AppState>, axum::Router) {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    db.seed_website("example.com", "user_1")
        .await
        .expect("seed website");
    let state = Arc::new(AppState::new(db, test_config()));
    let app = build_app(Arc::clone(&state));
    (state, app)
}

fn track_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/track")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build request")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request")
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

/// Drive the full pipeline: one session start plus pageviews through the
/// public track endpoint.
async fn track_session_with_pageviews(app: &axum::Router, session_id: &str, pages: &[&str]) {
    let start = json!({
        "domain": "example.com",
        "url": "https://example.com/",
        "event": "session_start",
        "source": "newsletter",
        "sessionId": session_id
    });
    let response = app
        .clone()
        .oneshot(track_request(&start.to_string()))
        .await
        .expect("session start");
    assert_eq!(response.status(), StatusCode::OK);

    for page in pages {
        let view = json!({
            "domain": "example.com",
            "url": page,
            "event": "pageview",
            "sessionId": session_id
        });
        let response = app
            .clone()
            .oneshot(track_request(&view.to_string()))
            .await
            .expect("pageview");
        assert_eq!(response.status(), StatusCode::OK);
    }
}

// ============================================================
// BDD: End-to-end aggregation scenario
// ============================================================
#[tokio::test]
async fn test_end_to_end_session_with_two_pageviews() {
    let (_state, app) = setup().await;

    track_session_with_pageviews(
        &app,
        "sess_1",
        &["https://example.com/home", "https://example.com/pricing"],
    )
    .await;

    let response = app
        .oneshot(get_request("/api/websites/example.com/stats?window=all%20time"))
        .await
        .expect("stats");
    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;

    assert_eq!(stats["visits"], 1);
    assert_eq!(stats["pageViews"], 2);
    assert_eq!(stats["pagesPerSession"], 2.0);
    // The session has two pageviews, so it is not a bounce.
    assert_eq!(stats["bounceRate"], 0.0);

    let sources = stats["topSources"].as_array().expect("sources");
    assert_eq!(sources[0]["source"], "newsletter");
    assert_eq!(sources[0]["count"], 1);
    assert_eq!(sources[0]["percentage"], 100.0);
}

#[tokio::test]
async fn test_single_pageview_session_bounces() {
    let (_state, app) = setup().await;

    track_session_with_pageviews(&app, "sess_1", &["https://example.com/home"]).await;

    let response = app
        .oneshot(get_request("/api/websites/example.com/stats"))
        .await
        .expect("stats");
    let stats = json_body(response).await;

    assert_eq!(stats["bounceRate"], 100.0);
    assert_eq!(stats["pagesPerSession"], 1.0);
}

// ============================================================
// BDD: Empty windows never divide by zero
// ============================================================
#[tokio::test]
async fn test_metrics_are_zero_with_no_facts() {
    let (_state, app) = setup().await;

    let response = app
        .oneshot(get_request("/api/websites/example.com/stats"))
        .await
        .expect("stats");
    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;

    assert_eq!(stats["visits"], 0);
    assert_eq!(stats["pageViews"], 0);
    assert_eq!(stats["bounceRate"], 0.0);
    assert_eq!(stats["pagesPerSession"], 0.0);
    assert_eq!(stats["returnRate"], 0.0);
    assert_eq!(stats["topPages"].as_array().map(Vec::len), Some(0));
}

// ============================================================
// BDD: Reading is idempotent
// ============================================================
#[tokio::test]
async fn test_get_views_twice_returns_identical_results() {
    let (_state, app) = setup().await;
    track_session_with_pageviews(&app, "sess_1", &["https://example.com/home"]).await;

    let first = app
        .clone()
        .oneshot(get_request("/api/websites/example.com/views"))
        .await
        .expect("first read");
    let second = app
        .oneshot(get_request("/api/websites/example.com/views"))
        .await
        .expect("second read");

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(json_body(first).await, json_body(second).await);
}

// ============================================================
// BDD: Page grouping strips scheme and host, keeps the query
// ============================================================
#[tokio::test]
async fn test_top_pages_group_by_stripped_path() {
    let (_state, app) = setup().await;

    let view = json!({
        "domain": "example.com",
        "url": "https://example.com/blog/post-1?x=1",
        "event": "pageview"
    });
    let response = app
        .clone()
        .oneshot(track_request(&view.to_string()))
        .await
        .expect("pageview");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request("/api/websites/example.com/stats"))
        .await
        .expect("stats");
    let stats = json_body(response).await;

    let pages = stats["topPages"].as_array().expect("pages");
    assert_eq!(pages[0]["value"], "blog/post-1?x=1");
    assert_eq!(pages[0]["count"], 1);
}

// ============================================================
// BDD: Window filtering over backdated facts
// ============================================================
#[tokio::test]
async fn test_window_includes_only_qualifying_pageviews() {
    let (state, app) = setup().await;

    // Backdate facts directly in the store; the gateway always stamps "now".
    {
        let conn = state.db.conn_for_test().await;
        let now = Utc::now();
        for (page, age) in [
            ("/fresh", Duration::hours(2)),
            ("/yesterday", Duration::hours(25)),
            ("/ancient", Duration::days(8)),
        ] {
            conn.execute(
                r#"INSERT INTO page_views (
                    id, domain, page, visit_id, city, region, country,
                    operating_system, device_type, browser_name,
                    screen_resolution, created_at
                ) VALUES (?1, 'example.com', ?2, NULL, 'Unknown', 'Unknown',
                          'Unknown', 'Unknown', 'Unknown', 'Unknown',
                          'Unknown', ?3)"#,
                pulse_duckdb::duckdb::params![
                    uuid::Uuid::new_v4().to_string(),
                    page,
                    (now - age).to_rfc3339(),
                ],
            )
            .expect("insert backdated pageview");
        }
    }

    let one_day = app
        .clone()
        .oneshot(get_request(
            "/api/websites/example.com/views?window=last%201%20day",
        ))
        .await
        .expect("one-day read");
    let one_day_json = json_body(one_day).await;
    let pages = one_day_json["pageViews"].as_array().expect("pageViews");
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0]["page"], "/fresh");

    let seven_days = app
        .clone()
        .oneshot(get_request(
            "/api/websites/example.com/views?window=last%207%20days",
        ))
        .await
        .expect("seven-day read");
    let seven_days_json = json_body(seven_days).await;
    assert_eq!(
        seven_days_json["pageViews"].as_array().map(Vec::len),
        Some(2)
    );

    let all_time = app
        .oneshot(get_request("/api/websites/example.com/views?window=0"))
        .await
        .expect("all-time read");
    let all_time_json = json_body(all_time).await;
    assert_eq!(all_time_json["pageViews"].as_array().map(Vec::len), Some(3));
}

// ============================================================
// BDD: Equal counts keep first-seen order
// ============================================================
#[tokio::test]
async fn test_source_ties_preserve_insertion_order() {
    let (_state, app) = setup().await;

    for source in ["A", "A", "A", "B", "B", "B", "C"] {
        let start = json!({
            "domain": "example.com",
            "url": "https://example.com/",
            "event": "session_start",
            "source": source
        });
        let response = app
            .clone()
            .oneshot(track_request(&start.to_string()))
            .await
            .expect("session start");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(get_request("/api/websites/example.com/stats"))
        .await
        .expect("stats");
    let stats = json_body(response).await;

    let sources = stats["topSources"].as_array().expect("sources");
    let order: Vec<&str> = sources
        .iter()
        .map(|s| s["source"].as_str().expect("source string"))
        .collect();
    assert_eq!(order, vec!["A", "B", "C"]);
}

// ============================================================
// BDD: Custom-event grouping reflects the normalized name
// ============================================================
#[tokio::test]
async fn test_custom_event_grouping_uses_lowercased_names() {
    let (state, app) = setup().await;

    let now = Utc::now();
    for name in ["Purchase_Completed", "purchase_completed", "Signup"] {
        state
            .db
            .insert_custom_event(&pulse_core::fact::CustomEvent::record(
                name,
                "example.com",
                "",
                now,
            ))
            .await
            .expect("insert custom event");
    }

    let response = app
        .oneshot(get_request("/api/websites/example.com/stats"))
        .await
        .expect("stats");
    let stats = json_body(response).await;

    let events = stats["customEvents"].as_array().expect("events");
    assert_eq!(events[0]["value"], "purchase_completed");
    assert_eq!(events[0]["count"], 2);
    assert_eq!(events[1]["value"], "signup");
}

// ============================================================
// BDD: Active users over the trailing ten minutes
// ============================================================
#[tokio::test]
async fn test_active_users_counts_distinct_live_sessions() {
    let (_state, app) = setup().await;

    // One session seen through both fact kinds still counts once.
    track_session_with_pageviews(&app, "sess_live", &["https://example.com/home"]).await;

    let response = app
        .oneshot(get_request("/api/websites/example.com/active"))
        .await
        .expect("active");
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["activeUsers"], 1);
}

// ============================================================
// BDD: Validation of the read surface
// ============================================================
#[tokio::test]
async fn test_unknown_website_reads_are_404() {
    let (_state, app) = setup().await;

    for uri in [
        "/api/websites/missing.com/views",
        "/api/websites/missing.com/stats",
        "/api/websites/missing.com/active",
    ] {
        let response = app
            .clone()
            .oneshot(get_request(uri))
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_invalid_window_is_400() {
    let (_state, app) = setup().await;

    let response = app
        .oneshot(get_request(
            "/api/websites/example.com/stats?window=yesterday",
        ))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
