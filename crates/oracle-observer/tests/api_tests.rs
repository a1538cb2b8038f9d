//! Integration tests for the dashboard API endpoints.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Timers run on a `ManualScheduler`, so nothing
//! ticks unless a test says so.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use oracle_analyst::AnalystBackend;
use oracle_core::analyst::CatalogAnalyst;
use oracle_core::catalog::ScenarioCatalog;
use oracle_core::config::OracleConfig;
use oracle_core::generator::EventSource;
use oracle_core::scheduler::ManualScheduler;
use oracle_observer::router::build_router;
use oracle_observer::state::AppState;
use oracle_types::{CrisisEvent, EventCategory, EventId, RunPhase, Severity};
use serde_json::Value;
use tower::ServiceExt;

/// Replays a fixed list of events, oldest first.
struct Scripted(Vec<CrisisEvent>);

impl EventSource for Scripted {
    fn poll(&mut self) -> Option<CrisisEvent> {
        self.0.pop()
    }
}

fn event(title: &str, category: EventCategory, severity: Severity) -> CrisisEvent {
    CrisisEvent {
        id: EventId::new(),
        title: title.to_owned(),
        location: String::from("Somewhere"),
        severity,
        category,
        created_at: Utc::now(),
        description: String::from("Test event"),
        coordinates: None,
    }
}

fn make_state(config: &OracleConfig) -> (Arc<AppState>, ManualScheduler) {
    let scheduler = ManualScheduler::new();
    let catalog = Arc::new(ScenarioCatalog::standard());
    let source = Scripted(vec![
        event("Cyber attack", EventCategory::Terrorism, Severity::Medium),
        event("Flooding", EventCategory::Environment, Severity::Critical),
        event("Border clash", EventCategory::Conflict, Severity::High),
    ]);
    let state = Arc::new(AppState::new(
        config,
        Arc::new(scheduler.clone()),
        Box::new(source),
        Arc::clone(&catalog),
        AnalystBackend::Catalog(CatalogAnalyst::new(catalog)),
    ));
    state.feed.prime(3);
    (state, scheduler)
}

fn router() -> (Router, Arc<AppState>) {
    let (state, _) = make_state(&OracleConfig::default());
    (build_router(Arc::clone(&state)), state)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn get(router: Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn post(router: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_owned()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

// =========================================================================
// Status page and dashboard
// =========================================================================

#[tokio::test]
async fn index_returns_html() {
    let (router, _) = router();
    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn dashboard_aggregates_all_components() {
    let (router, _) = router();
    let (status, json) = get(router, "/api/dashboard").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["timeline"]["current_year"], 2024);
    assert_eq!(json["timeline"]["label"], "live");
    assert_eq!(json["events"]["count"], 3);
    assert_eq!(json["simulator"]["phase"], "idle");
}

// =========================================================================
// Timeline
// =========================================================================

#[tokio::test]
async fn seek_clamps_out_of_range_years() {
    let (router, _) = router();
    let (status, json) = post(router.clone(), "/api/timeline/seek", r#"{"year": 1800}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_year"], 1990);

    let (_, json) = post(router.clone(), "/api/timeline/seek", r#"{"year": 2001}"#).await;
    assert_eq!(json["current_year"], 2001);
    assert_eq!(json["label"], "historical");

    let (_, json) = post(router, "/api/timeline/seek", r#"{"year": 9999}"#).await;
    assert_eq!(json["current_year"], 2050);
    assert_eq!(json["label"], "predicted");
}

#[tokio::test]
async fn seek_rejects_malformed_body() {
    let (router, _) = router();
    let (status, json) = post(router.clone(), "/api/timeline/seek", r#"{"year": "soon"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
    assert!(json["error"].is_string());

    let (status, _) = post(router, "/api/timeline/seek", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quick_jump_moves_to_labelled_year() {
    let (router, _) = router();
    let (status, json) =
        post(router, "/api/timeline/jump", r#"{"jump": "financial_crisis"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["current_year"], 2008);
}

#[tokio::test]
async fn milestones_list_catalog_and_quick_jumps() {
    let (router, _) = router();
    let (status, json) = get(router.clone(), "/api/timeline/milestones").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["milestones"].as_array().unwrap().len(), 11);
    assert_eq!(json["milestones"][0]["year"], 1990);
    assert_eq!(json["milestones"][10]["title"], "Net Zero Goals");
    assert_eq!(json["jumps"].as_array().unwrap().len(), 4);
    assert_eq!(json["jumps"][1]["jump"], "financial_crisis");
    assert_eq!(json["jumps"][1]["label"], "Crisis (2008)");
    assert_eq!(json["jumps"][1]["year"], 2008);

    let jump = format!(r#"{{"jump": {}}}"#, json["jumps"][3]["jump"]);
    let (_, json) = post(router, "/api/timeline/jump", &jump).await;
    assert_eq!(json["current_year"], 2030);
}

#[tokio::test]
async fn toggle_flips_playback() {
    let (state, scheduler) = make_state(&OracleConfig::default());
    let router = build_router(Arc::clone(&state));

    let (status, json) = post(router.clone(), "/api/timeline/toggle", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_playing"], true);
    assert_eq!(scheduler.active_tasks(), 1);

    let (_, json) = post(router, "/api/timeline/toggle", "").await;
    assert_eq!(json["is_playing"], false);
    assert_eq!(state.timeline.snapshot().current_year, 2024);
}

#[tokio::test]
async fn speed_cycles_on_empty_body_and_validates_values() {
    let (router, _) = router();
    let (_, json) = post(router.clone(), "/api/timeline/speed", "").await;
    assert_eq!(json["speed"], 2);
    let (_, json) = post(router.clone(), "/api/timeline/speed", "").await;
    assert_eq!(json["speed"], 5);

    let (status, json) = post(router.clone(), "/api/timeline/speed", r#"{"speed": 1}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["speed"], 1);

    let (status, _) = post(router, "/api/timeline/speed", r#"{"speed": 3}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn play_advances_on_scheduler_ticks_and_pause_stops() {
    let (state, scheduler) = make_state(&OracleConfig::default());
    let router = build_router(Arc::clone(&state));

    post(router.clone(), "/api/timeline/seek", r#"{"year": 2000}"#).await;
    let (_, json) = post(router.clone(), "/api/timeline/play", "").await;
    assert_eq!(json["is_playing"], true);

    scheduler.advance(Duration::from_millis(600));
    assert_eq!(state.timeline.snapshot().current_year, 2003);

    let (_, json) = post(router.clone(), "/api/timeline/pause", "").await;
    assert_eq!(json["is_playing"], false);
    scheduler.advance(Duration::from_millis(600));
    assert_eq!(state.timeline.snapshot().current_year, 2003);

    let (_, json) = post(router, "/api/timeline/reset", "").await;
    assert_eq!(json["current_year"], 1990);
}

// =========================================================================
// Crisis feed
// =========================================================================

#[tokio::test]
async fn events_are_newest_first_with_age() {
    let (router, _) = router();
    let (status, json) = get(router, "/api/events").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 3);
    assert_eq!(json["live"], false);
    assert_eq!(json["events"][0]["title"], "Cyber attack");
    assert_eq!(json["events"][2]["title"], "Border clash");
    assert_eq!(json["events"][0]["age"], "Just now");
}

#[tokio::test]
async fn events_filter_by_category_severity_and_limit() {
    let (router, _) = router();

    let (_, json) = get(router.clone(), "/api/events?category=environment").await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["events"][0]["title"], "Flooding");

    let (_, json) = get(router.clone(), "/api/events?category=all&min_severity=high").await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["events"][0]["title"], "Flooding");
    assert_eq!(json["events"][1]["title"], "Border clash");

    let (_, json) =
        get(router.clone(), "/api/events?category=conflict&min_severity=high").await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["events"][0]["title"], "Border clash");

    let (_, json) =
        get(router.clone(), "/api/events?category=terrorism&min_severity=high").await;
    assert_eq!(json["count"], 0);

    let (_, json) = get(router.clone(), "/api/events?limit=1").await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["events"][0]["title"], "Cyber attack");

    let (status, json) = get(router, "/api/events?category=weather").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn live_toggle_starts_and_stops_generation() {
    let (router, state) = router();
    let (status, json) = post(router.clone(), "/api/events/live", r#"{"live": true}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["live"], true);
    assert!(state.feed.is_live());

    let (_, json) = post(router, "/api/events/live", r#"{"live": false}"#).await;
    assert_eq!(json["live"], false);
    assert!(!state.feed.is_live());
}

// =========================================================================
// Scenarios and simulator
// =========================================================================

#[tokio::test]
async fn scenarios_list_with_parameter_ranges() {
    let (router, _) = router();
    let (status, json) = get(router, "/api/scenarios").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 5);
    assert_eq!(json[0]["id"], "climate-action");
    assert_eq!(json[0]["parameter_ranges"]["carbonTax"]["max"], "150");
}

#[tokio::test(start_paused = true)]
async fn evaluate_returns_catalog_outcome() {
    let (router, state) = router();
    let (status, json) = post(
        router,
        "/api/simulator/evaluate",
        r#"{"scenario_id": "climate-action", "parameters": {"carbonTax": 500}}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"]["probability_percent"], 75);
    assert_eq!(json["outcome"]["timeframe_label"], "10-15 years");
    assert_eq!(json["overrides"]["carbonTax"], "150");
    assert_eq!(state.simulator.phase(), RunPhase::Completed);
}

#[tokio::test(start_paused = true)]
async fn evaluate_clamps_overrides_beyond_decimal_range() {
    let (router, _) = router();
    let (status, json) = post(
        router.clone(),
        "/api/simulator/evaluate",
        r#"{"scenario_id": "climate-action", "parameters": {"carbonTax": 1e30}}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["overrides"]["carbonTax"], "150");

    let (status, json) = post(
        router,
        "/api/simulator/evaluate",
        r#"{"scenario_id": "climate-action", "parameters": {"carbonTax": -1e300}}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["overrides"]["carbonTax"], "50");
}

#[tokio::test]
async fn adjust_clamps_values_beyond_decimal_range() {
    let (router, _) = router();
    post(router.clone(), "/api/simulator/select", r#"{"scenario_id": "peace-treaty"}"#).await;

    let (status, json) = post(
        router,
        "/api/simulator/adjust",
        r#"{"name": "refugeeReturn", "value": 100000000000000000000000000000}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "90");
}

#[tokio::test(start_paused = true)]
async fn evaluate_unknown_scenario_gets_generic_outcome() {
    let (router, _) = router();
    let (status, json) =
        post(router, "/api/simulator/evaluate", r#"{"scenario_id": "asteroid"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"]["scenario_title"], "asteroid");
    assert_eq!(json["outcome"]["probability_percent"], 60);
    assert_eq!(json["outcome"]["global_impact_score"], "5.0");
}

#[tokio::test(start_paused = true)]
async fn second_evaluation_while_running_is_conflict() {
    let (router, state) = router();

    let first = tokio::spawn(post(
        router.clone(),
        "/api/simulator/evaluate",
        r#"{"scenario_id": "peace-treaty"}"#,
    ));
    while state.simulator.phase() != RunPhase::Running {
        tokio::task::yield_now().await;
    }

    let (status, json) = post(
        router,
        "/api/simulator/evaluate",
        r#"{"scenario_id": "climate-action"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["status"], 409);

    let (status, json) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["scenario_id"], "peace-treaty");
}

#[tokio::test(start_paused = true)]
async fn selection_flow_runs_staged_overrides() {
    let (router, _) = router();

    let (status, _) = post(router.clone(), "/api/simulator/run", "").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        post(router.clone(), "/api/simulator/select", r#"{"scenario_id": "nope"}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) =
        post(router.clone(), "/api/simulator/select", r#"{"scenario_id": "peace-treaty"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["selected_scenario_id"], "peace-treaty");

    let (status, json) = post(
        router.clone(),
        "/api/simulator/adjust",
        r#"{"name": "refugeeReturn", "value": 10}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "30");

    let (status, _) = post(
        router.clone(),
        "/api/simulator/adjust",
        r#"{"name": "moonBase", "value": 1}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = post(router.clone(), "/api/simulator/run", "").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["overrides"]["refugeeReturn"], "30");
    assert_eq!(json["outcome"]["probability_percent"], 65);

    let (_, json) = post(router, "/api/simulator/reset", "").await;
    assert_eq!(json["phase"], "idle");
    assert!(json["last_run"].is_null());
    assert!(json["selected_scenario_id"].is_null());
}
