//! Mission hand-off and simulation control endpoints.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::state::AppState;
use skydrop_core::{MissionError, MissionFix, MissionSnapshot};

fn mission_error_response(err: MissionError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        MissionError::InvalidMission { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        MissionError::InvalidTransition { .. } => StatusCode::CONFLICT,
    };
    (status, Json(serde_json::json!({"error": err.to_string()})))
}

/// Freeze the planning route into a mission snapshot for the tower.
pub async fn create_mission(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<MissionSnapshot>), (StatusCode, Json<serde_json::Value>)> {
    let snapshot = state.create_mission().map_err(mission_error_response)?;
    tracing::info!(
        "Mission created: {} waypoints, {:.2} km, ~{} min",
        snapshot.waypoints.len(),
        snapshot.total_distance_km,
        snapshot.estimated_duration_min
    );
    Ok((StatusCode::CREATED, Json(snapshot)))
}

pub async fn get_mission(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MissionSnapshot>, StatusCode> {
    state.mission().map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn start_mission(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MissionFix>, (StatusCode, Json<serde_json::Value>)> {
    let fix = state.start_mission().map_err(mission_error_response)?;
    tracing::info!("Mission started");
    Ok(Json(fix))
}

pub async fn pause_mission(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MissionFix>, (StatusCode, Json<serde_json::Value>)> {
    let fix = state.pause_mission().map_err(mission_error_response)?;
    tracing::info!("Mission paused");
    Ok(Json(fix))
}

pub async fn resume_mission(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MissionFix>, (StatusCode, Json<serde_json::Value>)> {
    let fix = state.resume_mission().map_err(mission_error_response)?;
    tracing::info!("Mission resumed");
    Ok(Json(fix))
}

pub async fn abort_mission(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, (StatusCode, Json<serde_json::Value>)> {
    state.abort_mission().map_err(mission_error_response)?;
    tracing::info!("Mission aborted");
    Ok(StatusCode::NO_CONTENT)
}

/// Latest simulated fix, if a simulation exists.
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MissionFix>, StatusCode> {
    state.telemetry().map(Json).ok_or(StatusCode::NOT_FOUND)
}
