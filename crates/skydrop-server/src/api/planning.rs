//! Route planning endpoints: waypoint CRUD, CSV export and the two-phase
//! CSV import flow.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::state::AppState;
use skydrop_core::{csv, CsvImportError, MissionSnapshot, RouteError, Waypoint};

#[derive(Debug, Deserialize)]
pub struct WaypointRequest {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    /// Raw CSV text as exported by the planner or edited by hand.
    pub csv: String,
}

fn route_error_response(err: RouteError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        RouteError::DistanceExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RouteError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
    };
    (status, Json(serde_json::json!({"error": err.to_string()})))
}

fn import_error_response(err: CsvImportError) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({"error": err.to_string()})),
    )
}

// === Handlers ===

/// Current planning route with distance and duration estimates.
pub async fn get_route(State(state): State<Arc<AppState>>) -> Json<MissionSnapshot> {
    Json(state.route_snapshot())
}

pub async fn clear_route(State(state): State<Arc<AppState>>) -> StatusCode {
    state.clear_route();
    tracing::info!("Cleared planning route");
    StatusCode::NO_CONTENT
}

pub async fn add_waypoint(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WaypointRequest>,
) -> Result<(StatusCode, Json<Waypoint>), (StatusCode, Json<serde_json::Value>)> {
    let waypoint = state
        .add_waypoint(req.lat, req.lon)
        .map_err(route_error_response)?;
    tracing::info!(
        "Added waypoint {} at ({:.5}, {:.5})",
        waypoint.number,
        waypoint.latitude,
        waypoint.longitude
    );
    Ok((StatusCode::CREATED, Json(waypoint)))
}

pub async fn move_waypoint(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
    Json(req): Json<WaypointRequest>,
) -> Result<Json<MissionSnapshot>, (StatusCode, Json<serde_json::Value>)> {
    state
        .move_waypoint(index, req.lat, req.lon)
        .map_err(route_error_response)?;
    Ok(Json(state.route_snapshot()))
}

pub async fn remove_waypoint(
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> Result<Json<MissionSnapshot>, (StatusCode, Json<serde_json::Value>)> {
    let removed = state.remove_waypoint(index).map_err(route_error_response)?;
    tracing::info!("Removed waypoint {}", removed.number);
    Ok(Json(state.route_snapshot()))
}

/// Download the current route as CSV.
pub async fn export_route(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let body = csv::export_waypoints(&state.route_waypoints());
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"route.csv\"",
            ),
        ],
        body,
    )
}

/// Phase one of the import: validate the CSV and stage a preview. The live
/// route is untouched until the preview is confirmed.
pub async fn import_route(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    let preview = csv::import_preview(
        &req.csv,
        state.config().planning_speed_kmh,
    )
    .map_err(import_error_response)?;

    tracing::info!(
        "Staged import preview: {} waypoints, {:.2} km",
        preview.waypoints.len(),
        preview.total_distance_km
    );
    let response = serde_json::json!(preview);
    state.set_pending_import(preview);
    Ok(Json(response))
}

/// Phase two: replace the live route with the staged preview. A preview
/// that breaks the distance cap is kept pending so the caller can cancel.
pub async fn confirm_import(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MissionSnapshot>, (StatusCode, Json<serde_json::Value>)> {
    match state.confirm_pending_import() {
        Ok(Some(snapshot)) => {
            tracing::info!(
                "Import confirmed: {} waypoints now on route",
                snapshot.waypoints.len()
            );
            Ok(Json(snapshot))
        }
        Ok(None) => Err((
            StatusCode::CONFLICT,
            Json(serde_json::json!({"error": "No import pending"})),
        )),
        Err(err) => Err(route_error_response(err)),
    }
}

pub async fn cancel_import(State(state): State<Arc<AppState>>) -> StatusCode {
    if state.cancel_pending_import() {
        tracing::info!("Import cancelled");
        StatusCode::NO_CONTENT
    } else {
        StatusCode::CONFLICT
    }
}
