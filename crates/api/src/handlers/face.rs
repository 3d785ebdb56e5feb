//! Handlers for the face detection trigger and poll endpoints.
//!
//! Both return immediately with a status code describing the job's current
//! state; clients are expected to poll `/getface` until it returns 200.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cubescan_core::status::{PollOutcome, TriggerOutcome};

use crate::error::AppResult;
use crate::state::AppState;

/// `425 Too Early`, returned while the job is still running.
pub fn too_early() -> StatusCode {
    StatusCode::from_u16(425).unwrap_or(StatusCode::LOCKED)
}

/// GET /detectface
///
/// Start the detection job. Returns 200 with an empty body once the program
/// is spawned, or 423 if a job is already running.
pub async fn detect_face(State(state): State<AppState>) -> AppResult<StatusCode> {
    match state.coordinator.trigger()? {
        TriggerOutcome::Started => Ok(StatusCode::OK),
        TriggerOutcome::AlreadyRunning => Ok(StatusCode::LOCKED),
    }
}

/// GET /getface
///
/// Report the job state: 404 when nothing has run (or the result was already
/// returned), 425 while running, and 200 with the cube state document once
/// done. An unreadable document still yields 200 with an error body.
pub async fn get_face(State(state): State<AppState>) -> Response {
    match state.coordinator.poll() {
        PollOutcome::NotFound => StatusCode::NOT_FOUND.into_response(),
        PollOutcome::InProgress => too_early().into_response(),
        PollOutcome::Ready(document) => (StatusCode::OK, Json(document)).into_response(),
    }
}
