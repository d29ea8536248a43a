//! REST API routes.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::api::{locations, missions, planning, weather, ws};
use crate::state::AppState;

/// Create the API router.
pub fn create_router() -> Router<Arc<AppState>> {
    Router::new()
        // Delivery target markers
        .route("/v1/ddts", get(locations::list_ddts))
        .route("/v1/ddts", post(locations::create_ddt))
        .route("/v1/ddts/:id", get(locations::get_ddt))
        .route("/v1/ddts/:id", put(locations::update_ddt))
        .route("/v1/ddts/:id", delete(locations::delete_ddt))
        .route("/v1/ddts/:id/toggle", post(locations::toggle_ddt))
        // Warehouses
        .route("/v1/warehouses", get(locations::list_warehouses))
        .route("/v1/warehouses", post(locations::create_warehouse))
        .route("/v1/warehouses/:id", get(locations::get_warehouse))
        .route("/v1/warehouses/:id", delete(locations::delete_warehouse))
        .route("/v1/warehouses/:id/ddts", get(locations::warehouse_ddts_in_range))
        // Drone fleet records
        .route("/v1/drones", get(locations::list_drones))
        .route("/v1/drones", post(locations::create_drone))
        .route("/v1/drones/:id", get(locations::get_drone))
        .route("/v1/drones/:id", put(locations::update_drone))
        .route("/v1/drones/:id", delete(locations::delete_drone))
        .route("/v1/drones/:id/toggle", post(locations::toggle_drone))
        // Route planning
        .route("/v1/route", get(planning::get_route))
        .route("/v1/route", delete(planning::clear_route))
        .route("/v1/route/waypoints", post(planning::add_waypoint))
        .route("/v1/route/waypoints/:index", put(planning::move_waypoint))
        .route("/v1/route/waypoints/:index", delete(planning::remove_waypoint))
        .route("/v1/route/export", get(planning::export_route))
        .route("/v1/route/import", post(planning::import_route))
        .route("/v1/route/import/confirm", post(planning::confirm_import))
        .route("/v1/route/import/cancel", post(planning::cancel_import))
        // Mission hand-off and simulation control
        .route("/v1/mission", post(missions::create_mission))
        .route("/v1/mission", get(missions::get_mission))
        .route("/v1/mission/start", post(missions::start_mission))
        .route("/v1/mission/pause", post(missions::pause_mission))
        .route("/v1/mission/resume", post(missions::resume_mission))
        .route("/v1/mission/abort", post(missions::abort_mission))
        .route("/v1/mission/telemetry", get(missions::get_telemetry))
        .route("/v1/mission/ws", get(ws::ws_handler))
        // Site weather
        .route("/v1/weather", get(weather::get_weather))
}
