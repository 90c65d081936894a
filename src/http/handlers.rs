use super::state::AppState;
use crate::error::RecordingError;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartRecordingRequest {
    pub participant_id: String,
    pub track_id: String,
}

#[derive(Debug, Serialize)]
pub struct StartRecordingResponse {
    pub participant_id: String,
    pub job_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StopRecordingResponse {
    pub participant_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /recordings/start
/// Start recording a participant's audio track
pub async fn start_recording(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> impl IntoResponse {
    info!(
        "Starting recording for participant: {} (track {})",
        req.participant_id, req.track_id
    );

    match state
        .supervisor
        .start(&req.participant_id, &req.track_id)
        .await
    {
        Ok(job_id) => (
            StatusCode::OK,
            Json(StartRecordingResponse {
                participant_id: req.participant_id,
                job_id,
                status: "recording".to_string(),
            }),
        )
            .into_response(),
        Err(e @ RecordingError::AlreadyRecording(_)) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
        Err(e @ RecordingError::RecordingStart(_)) => {
            error!("Failed to start recording: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to start recording: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /recordings/stop/:participant_id
/// Stop recording for a specific participant
pub async fn stop_recording(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> impl IntoResponse {
    info!("Stopping recording for participant: {}", participant_id);

    if state.supervisor.stop(&participant_id).await {
        (
            StatusCode::OK,
            Json(StopRecordingResponse {
                participant_id,
                status: "stopping".to_string(),
                message: "Recording stop requested".to_string(),
            }),
        )
            .into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No active recording for participant {}", participant_id),
            }),
        )
            .into_response()
    }
}

/// GET /recordings/:participant_id/status
/// Get status of one participant's recording
pub async fn get_recording_status(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> impl IntoResponse {
    match state.supervisor.status(&participant_id).await {
        Some(recording) => (StatusCode::OK, Json(recording)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("No recording found for participant {}", participant_id),
            }),
        )
            .into_response(),
    }
}

/// GET /recordings/status
/// Get status of all recordings, historical and active
pub async fn get_all_recordings(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.supervisor.status_all().await)).into_response()
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
