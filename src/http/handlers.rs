use super::state::AppState;
use crate::error::TurnError;
use crate::session::{SessionStats, StartOutcome, TurnPhase};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct PressResponse {
    pub status: String,
    pub phase: TurnPhase,
}

#[derive(Debug, Serialize)]
pub struct ReleaseResponse {
    pub status: String,
    pub phase: TurnPhase,
}

#[derive(Debug, Serialize)]
pub struct InteractionResponse {
    pub first_interaction: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

fn status_for(err: &TurnError) -> StatusCode {
    match err {
        TurnError::PermissionDenied => StatusCode::FORBIDDEN,
        TurnError::NoDevice | TurnError::NoSupportedFormat => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sphere/press
/// Start recording a turn
pub async fn press(State(state): State<AppState>) -> impl IntoResponse {
    state.controller.mark_interaction();

    match state.controller.request_start().await {
        StartOutcome::Started => (
            StatusCode::OK,
            Json(PressResponse {
                status: "recording".to_string(),
                phase: state.controller.phase().await,
            }),
        )
            .into_response(),
        StartOutcome::Ignored => error_response(
            StatusCode::CONFLICT,
            format!("A turn is already {}", state.controller.phase().await),
        ),
        StartOutcome::Superseded => {
            error_response(StatusCode::CONFLICT, "Session was reset while starting")
        }
        StartOutcome::Failed(e) => {
            error!("Failed to start recording: {}", e);
            error_response(status_for(&e), e.to_string())
        }
    }
}

/// POST /sphere/release
/// Stop recording; the turn pipeline continues in the background
pub async fn release(State(state): State<AppState>) -> impl IntoResponse {
    let phase = state.controller.phase().await;
    if phase != TurnPhase::Recording {
        return error_response(StatusCode::CONFLICT, format!("Not recording ({phase})"));
    }

    let controller = state.controller.clone();
    tokio::spawn(async move {
        let outcome = controller.request_stop().await;
        info!("Turn finished: {:?}", outcome);
    });

    (
        StatusCode::ACCEPTED,
        Json(ReleaseResponse {
            status: "processing".to_string(),
            phase,
        }),
    )
        .into_response()
}

/// POST /interaction
/// Record a user interaction so replies can be played
pub async fn interaction(State(state): State<AppState>) -> impl IntoResponse {
    let first_interaction = state.controller.mark_interaction();
    (StatusCode::OK, Json(InteractionResponse { first_interaction }))
}

/// POST /session/reset
/// Tear the session down and greet again
pub async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    info!("Resetting kiosk session");
    state.log.clear().await;
    state.controller.teardown().await;
    let stats: SessionStats = state.controller.stats().await;
    (StatusCode::OK, Json(stats))
}

/// GET /status
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.controller.stats().await))
}

/// GET /transcript
/// Messages shown so far plus the sphere state
pub async fn transcript(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.log.snapshot().await))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
