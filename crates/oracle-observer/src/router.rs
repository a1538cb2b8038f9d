//! Axum router construction for the dashboard API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS enabled for the browser dashboard.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the dashboard server.
///
/// See [`handlers`] for the endpoint table. CORS allows any origin.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/dashboard", get(ws::ws_dashboard))
        .route("/api/dashboard", get(handlers::get_dashboard))
        // Timeline
        .route("/api/timeline", get(handlers::get_timeline))
        .route("/api/timeline/milestones", get(handlers::get_milestones))
        .route("/api/timeline/seek", post(handlers::seek))
        .route("/api/timeline/jump", post(handlers::jump))
        .route("/api/timeline/play", post(handlers::play))
        .route("/api/timeline/pause", post(handlers::pause))
        .route("/api/timeline/toggle", post(handlers::toggle))
        .route("/api/timeline/reset", post(handlers::reset_timeline))
        .route("/api/timeline/speed", post(handlers::speed))
        // Crisis feed
        .route("/api/events", get(handlers::list_events))
        .route("/api/events/live", post(handlers::set_live))
        // Scenarios
        .route("/api/scenarios", get(handlers::list_scenarios))
        .route("/api/simulator", get(handlers::get_simulator))
        .route("/api/simulator/evaluate", post(handlers::evaluate))
        .route("/api/simulator/select", post(handlers::select))
        .route("/api/simulator/adjust", post(handlers::adjust))
        .route("/api/simulator/run", post(handlers::run_selected))
        .route("/api/simulator/reset", post(handlers::reset_simulator))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
