use super::state::AppState;
use crate::error::{LibraryError, SchedulerError};
use crate::library::Recording;
use crate::scheduler::StartSession;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ImportRecordingRequest {
    /// Path of the clip, relative to the server's import directory
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn scheduler_error(e: SchedulerError) -> Response {
    let status = match &e {
        SchedulerError::RecordingNotFound(_) => StatusCode::NOT_FOUND,
        SchedulerError::InvalidConfiguration(_) => StatusCode::UNPROCESSABLE_ENTITY,
        // Playback failures reach clients as `lastError` in a 200 snapshot
        SchedulerError::PlaybackFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SchedulerError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    };
    if status.is_server_error() {
        error!("Scheduler request failed: {}", e);
    }
    error_response(status, e)
}

fn library_error(e: LibraryError) -> Response {
    let status = match &e {
        LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
        LibraryError::DefaultRecording(_) => StatusCode::CONFLICT,
        LibraryError::InvalidClip(_)
        | LibraryError::NotImportable(_)
        | LibraryError::Probe(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LibraryError::Io(_) | LibraryError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Library request failed: {}", e);
    }
    error_response(status, e)
}

/// Snapshot as JSON, or 204 when no session is active
fn snapshot_response<T: Serialize>(snapshot: Option<T>) -> Response {
    match snapshot {
        Some(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /recordings
/// List built-in and user recordings
pub async fn list_recordings(State(state): State<AppState>) -> Json<Vec<Recording>> {
    Json(state.library.list())
}

/// POST /recordings
/// Import a clip from disk as a user recording
pub async fn import_recording(
    State(state): State<AppState>,
    Json(req): Json<ImportRecordingRequest>,
) -> Response {
    info!("Importing recording from {}", req.path);

    let library = state.library.clone();
    let result = tokio::task::spawn_blocking(move || library.import(&req.path)).await;

    match result {
        Ok(Ok(recording)) => (StatusCode::CREATED, Json(recording)).into_response(),
        Ok(Err(e)) => library_error(e),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e),
    }
}

/// DELETE /recordings/:recording_id
pub async fn delete_recording(
    State(state): State<AppState>,
    Path(recording_id): Path<String>,
) -> Response {
    match state.library.delete(&recording_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => library_error(e),
    }
}

/// GET /session
/// Current session snapshot
pub async fn get_session(State(state): State<AppState>) -> Response {
    match state.scheduler.snapshot().await {
        Ok(snapshot) => snapshot_response(snapshot),
        Err(e) => scheduler_error(e),
    }
}

/// POST /session/start
/// Start a session, replacing any active one
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSession>,
) -> Response {
    info!(
        "Starting session for recording {} (interval={}min, duration={:?}min)",
        req.recording_id, req.interval_minutes, req.duration_minutes
    );

    match state.scheduler.start_session(req).await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => scheduler_error(e),
    }
}

/// POST /session/pause
pub async fn pause_session(State(state): State<AppState>) -> Response {
    match state.scheduler.pause_session().await {
        Ok(snapshot) => snapshot_response(snapshot),
        Err(e) => scheduler_error(e),
    }
}

/// POST /session/resume
pub async fn resume_session(State(state): State<AppState>) -> Response {
    match state.scheduler.resume_session().await {
        Ok(snapshot) => snapshot_response(snapshot),
        Err(e) => scheduler_error(e),
    }
}

/// POST /session/stop
pub async fn stop_session(State(state): State<AppState>) -> Response {
    match state.scheduler.stop_session().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => scheduler_error(e),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
