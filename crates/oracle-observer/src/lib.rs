//! Dashboard API server for Oracle Earth.
//!
//! An Axum HTTP server exposing:
//!
//! - **REST endpoints** for the time cursor, the crisis feed and the
//!   scenario simulator, including their control operations
//! - **`WebSocket` endpoint** (`/ws/dashboard`) streaming timeline, event
//!   and outcome updates via [`tokio::sync::broadcast`]
//! - **Minimal HTML status page** (`GET /`)
//!
//! This crate is the validation boundary: request JSON is parsed into the
//! core's typed values here, and malformed input is answered with `400`
//! before it reaches a component.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::{AppState, DashboardBroadcast, Simulator};
