//! Location API endpoints.
//!
//! CRUD for the three persisted map collections: DDT delivery markers,
//! warehouses and the drone fleet roster.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::persistence;
use crate::state::AppState;
use skydrop_core::{distance_km, Ddt, DroneOpStatus, DroneRecord, Warehouse};

#[derive(Debug, Deserialize)]
pub struct CreateDdtRequest {
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub rack: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDdtRequest {
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub rack: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWarehouseRequest {
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct CreateDroneRequest {
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub battery_pct: Option<u8>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDroneRequest {
    pub name: Option<String>,
    pub status: Option<DroneOpStatus>,
    pub battery_pct: Option<u8>,
    pub package: Option<u8>,
    pub active: Option<bool>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub range_km: Option<f64>,
}

fn coordinate_error(lat: f64, lon: f64) -> Option<(StatusCode, Json<serde_json::Value>)> {
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Some((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": "Latitude out of range", "field": "lat"})),
        ));
    }
    if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
        return Some((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": "Longitude out of range", "field": "lon"})),
        ));
    }
    None
}

// === DDT handlers ===

pub async fn create_ddt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDdtRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Some(err) = coordinate_error(req.lat, req.lon) {
        return err;
    }

    let id = state.next_ddt_id();
    let ddt = Ddt {
        id,
        name: req.name.unwrap_or_else(|| format!("DDT {}", id)),
        lat: req.lat,
        lon: req.lon,
        rack: req.rack,
        active: true,
    };

    if let Err(err) = persistence::upsert_ddt(state.db().pool(), &ddt).await {
        tracing::error!("Failed to persist DDT {}: {}", id, err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to save DDT"})),
        );
    }
    state.insert_ddt(ddt.clone());
    tracing::info!("Created DDT '{}' ({})", ddt.name, ddt.id);

    (StatusCode::CREATED, Json(serde_json::json!(ddt)))
}

pub async fn list_ddts(State(state): State<Arc<AppState>>) -> Json<Vec<Ddt>> {
    Json(state.list_ddts())
}

pub async fn get_ddt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<Ddt>, StatusCode> {
    state.get_ddt(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn update_ddt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Json(req): Json<UpdateDdtRequest>,
) -> Result<Json<Ddt>, (StatusCode, Json<serde_json::Value>)> {
    if let (Some(lat), Some(lon)) = (req.lat, req.lon) {
        if let Some(err) = coordinate_error(lat, lon) {
            return Err(err);
        }
    }

    // Persist before touching the in-memory map so a failed write leaves
    // both views agreeing on the old record.
    let mut updated = state.get_ddt(id).ok_or((
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "DDT not found"})),
    ))?;
    if let Some(name) = req.name {
        updated.name = name;
    }
    if let Some(lat) = req.lat {
        updated.lat = lat;
    }
    if let Some(lon) = req.lon {
        updated.lon = lon;
    }
    if let Some(rack) = req.rack {
        updated.rack = Some(rack);
    }
    if let Some(active) = req.active {
        updated.active = active;
    }

    if let Err(err) = persistence::upsert_ddt(state.db().pool(), &updated).await {
        tracing::error!("Failed to persist DDT {}: {}", id, err);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to save DDT"})),
        ));
    }
    state.insert_ddt(updated.clone());
    Ok(Json(updated))
}

/// Flip the marker's active flag.
pub async fn toggle_ddt(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<Ddt>, (StatusCode, Json<serde_json::Value>)> {
    let mut updated = state.get_ddt(id).ok_or((
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "DDT not found"})),
    ))?;
    updated.active = !updated.active;

    if let Err(err) = persistence::upsert_ddt(state.db().pool(), &updated).await {
        tracing::error!("Failed to persist DDT {}: {}", id, err);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to save DDT"})),
        ));
    }
    state.insert_ddt(updated.clone());
    tracing::info!("DDT {} active = {}", id, updated.active);
    Ok(Json(updated))
}

pub async fn delete_ddt(State(state): State<Arc<AppState>>, Path(id): Path<u32>) -> StatusCode {
    if state.get_ddt(id).is_none() {
        return StatusCode::NOT_FOUND;
    }
    if let Err(err) = persistence::delete_ddt(state.db().pool(), id).await {
        tracing::error!("Failed to delete DDT {}: {}", id, err);
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    state.remove_ddt(id);
    tracing::info!("Deleted DDT {}", id);
    StatusCode::NO_CONTENT
}

// === Warehouse handlers ===

pub async fn create_warehouse(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWarehouseRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Some(err) = coordinate_error(req.lat, req.lon) {
        return err;
    }

    let id = state.next_warehouse_id();
    let warehouse = Warehouse {
        id,
        name: req.name.unwrap_or_else(|| format!("Warehouse {}", id)),
        lat: req.lat,
        lon: req.lon,
    };

    if let Err(err) = persistence::upsert_warehouse(state.db().pool(), &warehouse).await {
        tracing::error!("Failed to persist warehouse {}: {}", id, err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to save warehouse"})),
        );
    }
    state.insert_warehouse(warehouse.clone());
    tracing::info!("Created warehouse '{}' ({})", warehouse.name, warehouse.id);

    (StatusCode::CREATED, Json(serde_json::json!(warehouse)))
}

pub async fn list_warehouses(State(state): State<Arc<AppState>>) -> Json<Vec<Warehouse>> {
    Json(state.list_warehouses())
}

pub async fn get_warehouse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<Warehouse>, StatusCode> {
    state
        .get_warehouse(id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

pub async fn delete_warehouse(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> StatusCode {
    if state.get_warehouse(id).is_none() {
        return StatusCode::NOT_FOUND;
    }
    if let Err(err) = persistence::delete_warehouse(state.db().pool(), id).await {
        tracing::error!("Failed to delete warehouse {}: {}", id, err);
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    state.remove_warehouse(id);
    tracing::info!("Deleted warehouse {}", id);
    StatusCode::NO_CONTENT
}

/// Active DDTs within range of a warehouse, nearest first.
pub async fn warehouse_ddts_in_range(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<DdtInRange>>, StatusCode> {
    let warehouse = state.get_warehouse(id).ok_or(StatusCode::NOT_FOUND)?;
    let range_km = query
        .range_km
        .unwrap_or(state.config().warehouse_range_km);

    let mut in_range: Vec<DdtInRange> = state
        .list_ddts()
        .into_iter()
        .filter(|ddt| ddt.active)
        .filter_map(|ddt| {
            let dist = distance_km(warehouse.lat, warehouse.lon, ddt.lat, ddt.lon);
            (dist <= range_km).then_some(DdtInRange {
                ddt,
                distance_km: dist,
            })
        })
        .collect();
    in_range.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

    Ok(Json(in_range))
}

#[derive(serde::Serialize)]
pub struct DdtInRange {
    #[serde(flatten)]
    pub ddt: Ddt,
    pub distance_km: f64,
}

// === Drone handlers ===

pub async fn create_drone(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateDroneRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    if let Some(err) = coordinate_error(req.lat, req.lon) {
        return err;
    }

    let id = state.next_drone_id();
    let drone = DroneRecord {
        id,
        name: req.name.unwrap_or_else(|| format!("Drone {}", id)),
        status: DroneOpStatus::Idle,
        battery_pct: req.battery_pct.unwrap_or(100).min(100),
        package: None,
        active: true,
        lat: req.lat,
        lon: req.lon,
    };

    if let Err(err) = persistence::upsert_drone(state.db().pool(), &drone).await {
        tracing::error!("Failed to persist drone {}: {}", id, err);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to save drone"})),
        );
    }
    state.insert_drone(drone.clone());
    tracing::info!("Created drone '{}' ({})", drone.name, drone.id);

    (StatusCode::CREATED, Json(serde_json::json!(drone)))
}

pub async fn list_drones(State(state): State<Arc<AppState>>) -> Json<Vec<DroneRecord>> {
    Json(state.list_drones())
}

pub async fn get_drone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<DroneRecord>, StatusCode> {
    state.get_drone(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

pub async fn update_drone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Json(req): Json<UpdateDroneRequest>,
) -> Result<Json<DroneRecord>, (StatusCode, Json<serde_json::Value>)> {
    if let (Some(lat), Some(lon)) = (req.lat, req.lon) {
        if let Some(err) = coordinate_error(lat, lon) {
            return Err(err);
        }
    }

    let mut updated = state.get_drone(id).ok_or((
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "Drone not found"})),
    ))?;
    if let Some(name) = req.name {
        updated.name = name;
    }
    if let Some(status) = req.status {
        updated.status = status;
    }
    if let Some(battery) = req.battery_pct {
        updated.battery_pct = battery.min(100);
    }
    if let Some(package) = req.package {
        updated.package = Some(package);
    }
    if let Some(active) = req.active {
        updated.active = active;
    }
    if let Some(lat) = req.lat {
        updated.lat = lat;
    }
    if let Some(lon) = req.lon {
        updated.lon = lon;
    }

    if let Err(err) = persistence::upsert_drone(state.db().pool(), &updated).await {
        tracing::error!("Failed to persist drone {}: {}", id, err);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to save drone"})),
        ));
    }
    state.insert_drone(updated.clone());
    Ok(Json(updated))
}

/// Flip the drone's active flag.
pub async fn toggle_drone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<DroneRecord>, (StatusCode, Json<serde_json::Value>)> {
    let mut updated = state.get_drone(id).ok_or((
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "Drone not found"})),
    ))?;
    updated.active = !updated.active;

    if let Err(err) = persistence::upsert_drone(state.db().pool(), &updated).await {
        tracing::error!("Failed to persist drone {}: {}", id, err);
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({"error": "Failed to save drone"})),
        ));
    }
    state.insert_drone(updated.clone());
    tracing::info!("Drone {} active = {}", id, updated.active);
    Ok(Json(updated))
}

pub async fn delete_drone(State(state): State<Arc<AppState>>, Path(id): Path<u32>) -> StatusCode {
    if state.get_drone(id).is_none() {
        return StatusCode::NOT_FOUND;
    }
    if let Err(err) = persistence::delete_drone(state.db().pool(), id).await {
        tracing::error!("Failed to delete drone {}: {}", id, err);
        return StatusCode::INTERNAL_SERVER_ERROR;
    }
    state.remove_drone(id);
    tracing::info!("Deleted drone {}", id);
    StatusCode::NO_CONTENT
}
