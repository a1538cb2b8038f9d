//! `WebSocket` handler for the live dashboard stream.
//!
//! Clients connect to `GET /ws/dashboard` and receive one JSON text frame
//! per [`DashboardBroadcast`]: timeline moves, new crisis events and
//! completed scenario runs. The first frame is the current timeline so a
//! fresh client can render immediately.
//!
//! A client that falls behind skips the lagged messages and resumes from
//! the newest one.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::{AppState, DashboardBroadcast};

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming dashboard updates.
///
/// # Route
///
/// `GET /ws/dashboard`
pub async fn ws_dashboard(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("Dashboard client connected");

    let mut rx = state.subscribe();

    let greeting = DashboardBroadcast::Timeline(state.timeline.snapshot());
    if !send(&mut socket, &greeting).await {
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(message) => {
                        if !send(&mut socket, &message).await {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "Dashboard client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Broadcast channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Dashboard client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("Dashboard client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Send one broadcast as a text frame. Returns `false` once the client is
/// gone.
async fn send(socket: &mut WebSocket, message: &DashboardBroadcast) -> bool {
    let json = match serde_json::to_string(message) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize dashboard broadcast: {e}");
            return true;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        debug!("Dashboard client disconnected (send failed)");
        return false;
    }
    true
}
