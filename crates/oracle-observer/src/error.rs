//! Error types for the dashboard API.
//!
//! [`ObserverError`] is the validation boundary: malformed JSON bodies and
//! query strings, and simulator admission errors, all leave here as a
//! `{ "error", "status" }` JSON body.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use oracle_core::simulator::SimulatorError;

/// Errors that can occur in the dashboard API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body or query string was malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The request conflicts with the current simulator state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<JsonRejection> for ObserverError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ObserverError {
    fn from(rejection: QueryRejection) -> Self {
        Self::InvalidRequest(rejection.body_text())
    }
}

impl From<SimulatorError> for ObserverError {
    fn from(err: SimulatorError) -> Self {
        match err {
            SimulatorError::Busy | SimulatorError::NothingSelected => Self::Conflict(err.to_string()),
            SimulatorError::UnknownScenario { .. } => Self::NotFound(err.to_string()),
            SimulatorError::UnknownParameter { .. } => Self::InvalidRequest(err.to_string()),
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Serialization(e) => {
                (StatusCode::BAD_REQUEST, format!("JSON error: {e}"))
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulator_errors_map_to_statuses() {
        let status = |e: SimulatorError| ObserverError::from(e).into_response().status();
        assert_eq!(status(SimulatorError::Busy), StatusCode::CONFLICT);
        assert_eq!(status(SimulatorError::NothingSelected), StatusCode::CONFLICT);
        assert_eq!(
            status(SimulatorError::UnknownScenario { id: "x".to_owned() }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status(SimulatorError::UnknownParameter {
                scenario_id: "x".to_owned(),
                name: "y".to_owned(),
            }),
            StatusCode::BAD_REQUEST
        );
    }
}
