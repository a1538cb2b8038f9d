//! REST API endpoint handlers for the dashboard.
//!
//! Handlers translate JSON into the core's typed calls and back. They
//! never hold a component lock across an `.await`; the components guard
//! their own state.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/dashboard` | Timeline, feed and simulator in one view |
//! | `GET` | `/api/timeline` | Time cursor snapshot |
//! | `GET` | `/api/timeline/milestones` | Milestones and quick jumps |
//! | `POST` | `/api/timeline/{seek,jump,play,pause,toggle,reset,speed}` | Cursor control |
//! | `GET` | `/api/events` | Crisis feed (category, severity, limit) |
//! | `POST` | `/api/events/live` | Toggle live generation |
//! | `GET` | `/api/scenarios` | Scenario catalog with parameter ranges |
//! | `GET` | `/api/simulator` | Simulator snapshot |
//! | `POST` | `/api/simulator/evaluate` | Evaluate a scenario |
//! | `POST` | `/api/simulator/{select,adjust,run,reset}` | Selection flow |

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse};
use chrono::Utc;
use oracle_core::analyst::ScenarioAnalyst;
use oracle_core::feed::{CategoryFilter, age_label};
use oracle_core::timeline::milestones;
use oracle_types::{
    CrisisEvent, Milestone, ParameterRange, ParameterSet, PlaybackSpeed, QuickJump, Scenario,
    ScenarioRun, Severity, SimulatorSnapshot, TimelineSnapshot,
};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use tracing::debug;

use crate::error::ObserverError;
use crate::state::AppState;

/// Default page size for `GET /api/events`.
const DEFAULT_EVENT_LIMIT: usize = 100;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// `all` or one event category.
    #[serde(default)]
    pub category: CategoryFilter,
    /// Only events at or above this severity.
    pub min_severity: Option<Severity>,
    /// Maximum number of events to return (default 100).
    pub limit: Option<usize>,
}

/// Body of `POST /api/timeline/seek`.
#[derive(Debug, Deserialize)]
pub struct SeekRequest {
    /// Target year; clamped into the timeline range.
    pub year: i32,
}

/// Body of `POST /api/timeline/jump`.
#[derive(Debug, Deserialize)]
pub struct JumpRequest {
    /// Which shortcut to take.
    pub jump: QuickJump,
}

/// Body of `POST /api/timeline/speed`. An empty body cycles the speed.
#[derive(Debug, Deserialize)]
pub struct SpeedRequest {
    /// Years per tick: 1, 2 or 5.
    pub speed: PlaybackSpeed,
}

/// Body of `POST /api/events/live`.
#[derive(Debug, Deserialize)]
pub struct LiveRequest {
    /// Whether the feed should generate events.
    pub live: bool,
}

/// Body of `POST /api/simulator/evaluate`.
#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    /// Scenario to evaluate; unknown ids get the generic report.
    pub scenario_id: String,
    /// Parameter overrides by name. Any JSON number is accepted and
    /// clamped into the parameter's range.
    #[serde(default)]
    pub parameters: BTreeMap<String, Number>,
}

/// Body of `POST /api/simulator/select`.
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    /// Catalog scenario to select.
    pub scenario_id: String,
}

/// Body of `POST /api/simulator/adjust`.
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    /// Parameter name.
    pub name: String,
    /// Requested value; clamped into the parameter range.
    pub value: Number,
}

/// A quick-jump button: where it goes and what it says.
#[derive(Debug, Serialize)]
pub struct JumpEntry {
    /// Value accepted by `POST /api/timeline/jump`.
    pub jump: QuickJump,
    /// Button label.
    pub label: &'static str,
    /// Target year.
    pub year: i32,
}

/// Response of `GET /api/timeline/milestones`.
#[derive(Debug, Serialize)]
pub struct MilestonesResponse {
    /// Every milestone in chronological order.
    pub milestones: Vec<Milestone>,
    /// Quick jumps in display order.
    pub jumps: Vec<JumpEntry>,
}

/// A feed entry with its relative age.
#[derive(Debug, Serialize)]
pub struct FeedEntry {
    /// The event itself.
    #[serde(flatten)]
    pub event: CrisisEvent,
    /// "Just now", "5m ago", ...
    pub age: String,
}

/// Response of `GET /api/events`.
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    /// Whether the generator is live.
    pub live: bool,
    /// Number of events returned.
    pub count: usize,
    /// Matching events, newest first.
    pub events: Vec<FeedEntry>,
}

/// A catalog scenario with the ranges its parameters may be moved within.
#[derive(Debug, Serialize)]
pub struct ScenarioEntry {
    /// The scenario.
    #[serde(flatten)]
    pub scenario: Scenario,
    /// Per-parameter range.
    pub parameter_ranges: BTreeMap<String, ParameterRange>,
}

/// Response of `GET /api/dashboard`.
#[derive(Debug, Serialize)]
pub struct DashboardView {
    /// Time cursor.
    pub timeline: TimelineSnapshot,
    /// Feed, newest first.
    pub events: EventsResponse,
    /// Simulator state.
    pub simulator: SimulatorSnapshot,
}

/// Response of `POST /api/simulator/adjust`.
#[derive(Debug, Serialize)]
pub struct AdjustResponse {
    /// The value actually stored after clamping.
    pub value: Decimal,
    /// Simulator state after the change.
    pub simulator: SimulatorSnapshot,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the dashboard state and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timeline = state.timeline.snapshot();
    let year = timeline.current_year;
    let label = timeline.label.caption();
    let playing = if timeline.is_playing { "PLAYING" } else { "PAUSED" };
    let milestone = timeline.milestone.map_or_else(String::new, |m| m.title);
    let events = state.feed.events().len();
    let live = if state.feed.is_live() { "LIVE" } else { "PAUSED" };
    let phase = format!("{:?}", state.simulator.phase());
    let analyst = state.simulator.analyst().name();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Oracle Earth</title>
    <style>
        body {{ background: #05070d; color: #c9d1d9; font-family: monospace; padding: 2rem; max-width: 800px; margin: 0 auto; }}
        h1 {{ color: #38bdf8; margin-bottom: 0.25rem; }}
        .metric {{ display: inline-block; border: 1px solid #1e293b; border-radius: 6px; padding: 1rem 1.5rem; margin: 0.5rem 0.5rem 0.5rem 0; }}
        .label {{ color: #64748b; font-size: 0.85rem; }}
        .value {{ color: #38bdf8; font-size: 1.5rem; font-weight: bold; }}
        li::before {{ content: "GET "; color: #4ade80; }}
        ul {{ list-style: none; padding: 0; }}
        a {{ color: #38bdf8; }}
    </style>
</head>
<body>
    <h1>Oracle Earth</h1>
    <p>AI brain of our planet</p>
    <div>
        <div class="metric"><div class="label">Year</div><div class="value">{year}</div></div>
        <div class="metric"><div class="label">{label}</div><div class="value">{playing}</div></div>
        <div class="metric"><div class="label">Milestone</div><div class="value">{milestone}</div></div>
        <div class="metric"><div class="label">Crisis feed</div><div class="value">{events} ({live})</div></div>
        <div class="metric"><div class="label">Simulator ({analyst})</div><div class="value">{phase}</div></div>
    </div>
    <h2>API</h2>
    <ul>
        <li><a href="/api/dashboard">/api/dashboard</a></li>
        <li><a href="/api/timeline">/api/timeline</a></li>
        <li><a href="/api/timeline/milestones">/api/timeline/milestones</a></li>
        <li><a href="/api/events">/api/events</a> (?category=&amp;min_severity=&amp;limit=)</li>
        <li><a href="/api/scenarios">/api/scenarios</a></li>
        <li><a href="/api/simulator">/api/simulator</a></li>
    </ul>
    <p><code>ws://host:port/ws/dashboard</code> streams timeline, event and outcome updates.</p>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Everything the dashboard renders, in one response.
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardView> {
    Json(DashboardView {
        timeline: state.timeline.snapshot(),
        events: feed_response(&state, &EventsQuery::default()),
        simulator: state.simulator.snapshot(),
    })
}

// ---------------------------------------------------------------------------
// Timeline
// ---------------------------------------------------------------------------

/// Current time cursor.
pub async fn get_timeline(State(state): State<Arc<AppState>>) -> Json<TimelineSnapshot> {
    Json(state.timeline.snapshot())
}

/// Move the cursor to a year. Out-of-range years are clamped, not rejected.
pub async fn seek(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SeekRequest>, JsonRejection>,
) -> Result<Json<TimelineSnapshot>, ObserverError> {
    let Json(body) = body?;
    Ok(Json(state.timeline.seek(body.year)))
}

/// Jump to one of the labelled shortcut years.
pub async fn jump(
    State(state): State<Arc<AppState>>,
    body: Result<Json<JumpRequest>, JsonRejection>,
) -> Result<Json<TimelineSnapshot>, ObserverError> {
    let Json(body) = body?;
    Ok(Json(state.timeline.jump(body.jump)))
}

/// Milestones and quick-jump shortcuts for the timeline controls.
pub async fn get_milestones() -> Json<MilestonesResponse> {
    Json(MilestonesResponse {
        milestones: milestones(),
        jumps: QuickJump::ALL
            .into_iter()
            .map(|jump| JumpEntry {
                jump,
                label: jump.label(),
                year: jump.year(),
            })
            .collect(),
    })
}

/// Start playback if paused, pause it if playing.
pub async fn toggle(State(state): State<Arc<AppState>>) -> Json<TimelineSnapshot> {
    Json(state.timeline.toggle())
}

/// Start playback.
pub async fn play(State(state): State<Arc<AppState>>) -> Json<TimelineSnapshot> {
    Json(state.timeline.play())
}

/// Pause playback.
pub async fn pause(State(state): State<Arc<AppState>>) -> Json<TimelineSnapshot> {
    Json(state.timeline.pause())
}

/// Rewind to the first year.
pub async fn reset_timeline(State(state): State<Arc<AppState>>) -> Json<TimelineSnapshot> {
    Json(state.timeline.reset())
}

/// Set the playback speed, or cycle 1 -> 2 -> 5 -> 1 when the body is empty.
pub async fn speed(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TimelineSnapshot>, ObserverError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Json(state.timeline.cycle_speed()));
    }
    let request: SpeedRequest = serde_json::from_slice(&body)?;
    Ok(Json(state.timeline.set_speed(request.speed)))
}

// ---------------------------------------------------------------------------
// Crisis feed
// ---------------------------------------------------------------------------

/// Crisis feed, newest first.
///
/// # Query Parameters
///
/// - `category` -- `all` (default) or one event category
/// - `min_severity` -- `low`, `medium`, `high` or `critical`
/// - `limit` -- maximum number of events (default 100)
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    query: Result<Query<EventsQuery>, QueryRejection>,
) -> Result<Json<EventsResponse>, ObserverError> {
    let Query(query) = query?;
    Ok(Json(feed_response(&state, &query)))
}

/// Turn live generation on or off.
pub async fn set_live(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LiveRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ObserverError> {
    let Json(body) = body?;
    state.feed.set_live(body.live);
    Ok(Json(serde_json::json!({ "live": state.feed.is_live() })))
}

fn feed_response(state: &AppState, query: &EventsQuery) -> EventsResponse {
    let now = Utc::now();
    let limit = query.limit.unwrap_or(DEFAULT_EVENT_LIMIT);
    let matching: Vec<CrisisEvent> = match query.min_severity {
        Some(min) => state
            .feed
            .at_or_above(min)
            .into_iter()
            .filter(|e| query.category.matches(e))
            .collect(),
        None => state.feed.filter_by(query.category),
    };
    let events: Vec<FeedEntry> = matching
        .into_iter()
        .take(limit)
        .map(|event| FeedEntry {
            age: age_label(event.created_at, now),
            event,
        })
        .collect();

    debug!(
        category = %query.category,
        returned = events.len(),
        "Feed queried"
    );

    EventsResponse {
        live: state.feed.is_live(),
        count: events.len(),
        events,
    }
}

// ---------------------------------------------------------------------------
// Scenarios and simulator
// ---------------------------------------------------------------------------

/// The scenario catalog with parameter ranges.
pub async fn list_scenarios(State(state): State<Arc<AppState>>) -> Json<Vec<ScenarioEntry>> {
    let catalog = state.simulator.catalog();
    Json(
        catalog
            .scenarios()
            .iter()
            .map(|scenario| ScenarioEntry {
                parameter_ranges: catalog.parameter_ranges(&scenario.id).unwrap_or_default(),
                scenario: scenario.clone(),
            })
            .collect(),
    )
}

/// Current simulator state.
pub async fn get_simulator(State(state): State<Arc<AppState>>) -> Json<SimulatorSnapshot> {
    Json(state.simulator.snapshot())
}

/// Evaluate a scenario and return the finished run.
///
/// Responds `409 Conflict` while another evaluation is running.
pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    body: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<ScenarioRun>, ObserverError> {
    let Json(body) = body?;
    let overrides: ParameterSet = body
        .parameters
        .iter()
        .map(|(name, value)| (name.clone(), override_value(value)))
        .collect();
    let run = state.simulator.evaluate(&body.scenario_id, &overrides).await?;
    Ok(Json(run))
}

/// Select a catalog scenario for the step-by-step flow.
pub async fn select(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SelectRequest>, JsonRejection>,
) -> Result<Json<SimulatorSnapshot>, ObserverError> {
    let Json(body) = body?;
    Ok(Json(state.simulator.select(&body.scenario_id)?))
}

/// Stage a parameter override for the selected scenario.
pub async fn adjust(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AdjustRequest>, JsonRejection>,
) -> Result<Json<AdjustResponse>, ObserverError> {
    let Json(body) = body?;
    let value = state.simulator.adjust(&body.name, override_value(&body.value))?;
    Ok(Json(AdjustResponse {
        value,
        simulator: state.simulator.snapshot(),
    }))
}

/// Convert a JSON number to a [`Decimal`], saturating at the type's bounds.
///
/// Magnitudes beyond `Decimal::MAX` become `MAX`/`MIN` and values too small
/// to represent become zero; the catalog then clamps them into range.
fn override_value(number: &Number) -> Decimal {
    if let Some(int) = number.as_i64() {
        return Decimal::from(int);
    }
    if let Some(int) = number.as_u64() {
        return Decimal::from(int);
    }
    let float = number.as_f64().unwrap_or_default();
    number
        .to_string()
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_f64(float))
        .unwrap_or(if float.abs() < 1.0 {
            Decimal::ZERO
        } else if float.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        })
}

/// Evaluate the selected scenario with the staged overrides.
pub async fn run_selected(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ScenarioRun>, ObserverError> {
    Ok(Json(state.simulator.run_selected().await?))
}

/// Clear selection, staged overrides and the last run.
pub async fn reset_simulator(State(state): State<Arc<AppState>>) -> Json<SimulatorSnapshot> {
    Json(state.simulator.reset())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn number(json: &str) -> Number {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn override_values_keep_exact_decimals() {
        assert_eq!(override_value(&number("120")), Decimal::from(120));
        assert_eq!(override_value(&number("-7")), Decimal::from(-7));
        assert_eq!(override_value(&number("85.5")), Decimal::new(855, 1));
    }

    #[test]
    fn override_values_saturate_outside_decimal_range() {
        assert_eq!(override_value(&number("1e30")), Decimal::MAX);
        assert_eq!(override_value(&number("100000000000000000000000000000")), Decimal::MAX);
        assert_eq!(override_value(&number("-1e300")), Decimal::MIN);
        assert!(override_value(&number("1e-40")).abs() < Decimal::new(1, 20));
    }
}
