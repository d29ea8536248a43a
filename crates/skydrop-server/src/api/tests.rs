use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{api, config::Config, persistence, state::AppState};

async fn setup_app() -> (axum::Router, Arc<AppState>) {
    let mut config = Config::from_env();
    config.database_path = ":memory:".to_string();
    config.database_max_connections = 1;
    config.weather_api_key = None;

    let db = persistence::init_database(&config.database_path, config.database_max_connections)
        .await
        .expect("init db");
    let state = Arc::new(AppState::with_database(db, config));
    state.load_from_database().await.expect("load db");

    let app = api::routes().with_state(state.clone());
    (app, state)
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn create_ddt_and_query_warehouse_range() {
    let (app, _state) = setup_app().await;

    let res = app
        .clone()
        .oneshot(post_json(
            "/v1/warehouses",
            json!({"name": "Depot", "lat": 40.0, "lon": -74.0}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let warehouse = read_json(res).await;
    let warehouse_id = warehouse["id"].as_u64().unwrap();

    // Near DDT, about 1.1 km north; gets an auto-generated name.
    let res = app
        .clone()
        .oneshot(post_json("/v1/ddts", json!({"lat": 40.01, "lon": -74.0})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let near = read_json(res).await;
    assert_eq!(near["name"], format!("DDT {}", near["id"]));

    // Far DDT, about 55 km north, outside the default 10 km range.
    let res = app
        .clone()
        .oneshot(post_json("/v1/ddts", json!({"lat": 40.5, "lon": -74.0})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app
        .clone()
        .oneshot(get(&format!("/v1/warehouses/{}/ddts", warehouse_id)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let in_range = read_json(res).await;
    let entries = in_range.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], near["id"]);
    assert!(entries[0]["distance_km"].as_f64().unwrap() < 2.0);

    // Widening the range picks up the far DDT too, nearest first.
    let res = app
        .clone()
        .oneshot(get(&format!(
            "/v1/warehouses/{}/ddts?range_km=100",
            warehouse_id
        )))
        .await
        .unwrap();
    let in_range = read_json(res).await;
    assert_eq!(in_range.as_array().unwrap().len(), 2);
    assert_eq!(in_range[0]["id"], near["id"]);
}

#[tokio::test]
async fn deactivated_ddt_excluded_from_range_query() {
    let (app, _state) = setup_app().await;

    let res = app
        .clone()
        .oneshot(post_json("/v1/warehouses", json!({"lat": 40.0, "lon": -74.0})))
        .await
        .unwrap();
    let warehouse_id = read_json(res).await["id"].as_u64().unwrap();

    let res = app
        .clone()
        .oneshot(post_json("/v1/ddts", json!({"lat": 40.01, "lon": -74.0})))
        .await
        .unwrap();
    let ddt_id = read_json(res).await["id"].as_u64().unwrap();

    let deactivate = Request::builder()
        .method("PUT")
        .uri(format!("/v1/ddts/{}", ddt_id))
        .header("content-type", "application/json")
        .body(Body::from(json!({"active": false}).to_string()))
        .unwrap();
    let res = app.clone().oneshot(deactivate).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(get(&format!("/v1/warehouses/{}/ddts", warehouse_id)))
        .await
        .unwrap();
    let in_range = read_json(res).await;
    assert!(in_range.as_array().unwrap().is_empty());

    // Toggle flips it back on and it reappears.
    let res = app
        .clone()
        .oneshot(post_json(&format!("/v1/ddts/{}/toggle", ddt_id), json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let toggled = read_json(res).await;
    assert_eq!(toggled["active"], true);

    let res = app
        .clone()
        .oneshot(get(&format!("/v1/warehouses/{}/ddts", warehouse_id)))
        .await
        .unwrap();
    let in_range = read_json(res).await;
    assert_eq!(in_range.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn waypoint_add_remove_renumbers() {
    let (app, _state) = setup_app().await;

    for (lat, lon) in [(40.0, -74.0), (40.1, -74.0), (40.2, -74.0)] {
        let res = app
            .clone()
            .oneshot(post_json("/v1/route/waypoints", json!({"lat": lat, "lon": lon})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/v1/route/waypoints/1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let route = read_json(res).await;
    let waypoints = route["waypoints"].as_array().unwrap();
    assert_eq!(waypoints.len(), 2);
    assert_eq!(waypoints[0]["number"], 1);
    assert_eq!(waypoints[1]["number"], 2);
    assert_eq!(waypoints[1]["latitude"], 40.2);
}

#[tokio::test]
async fn waypoint_over_distance_cap_rejected() {
    let (app, _state) = setup_app().await;

    let res = app
        .clone()
        .oneshot(post_json("/v1/route/waypoints", json!({"lat": 0.0, "lon": 0.0})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = app
        .clone()
        .oneshot(post_json("/v1/route/waypoints", json!({"lat": 1.0, "lon": 0.0})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // A third leg of ~167 km would push the total past 200 km.
    let res = app
        .clone()
        .oneshot(post_json("/v1/route/waypoints", json!({"lat": 2.5, "lon": 0.0})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = app.clone().oneshot(get("/v1/route")).await.unwrap();
    let route = read_json(res).await;
    assert_eq!(route["waypoints"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn csv_import_is_two_phase() {
    let (app, _state) = setup_app().await;

    let csv = "Number,Latitude,Longitude\n1,40.0,-74.0\n2,40.05,-74.0\n";
    let res = app
        .clone()
        .oneshot(post_json("/v1/route/import", json!({"csv": csv})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let preview = read_json(res).await;
    assert_eq!(preview["waypoints"].as_array().unwrap().len(), 2);

    // The live route is untouched until the preview is confirmed.
    let res = app.clone().oneshot(get("/v1/route")).await.unwrap();
    let route = read_json(res).await;
    assert!(route["waypoints"].as_array().unwrap().is_empty());

    let res = app
        .clone()
        .oneshot(post_json("/v1/route/import/confirm", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let route = read_json(res).await;
    assert_eq!(route["waypoints"].as_array().unwrap().len(), 2);

    // Nothing pending anymore.
    let res = app
        .clone()
        .oneshot(post_json("/v1/route/import/confirm", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_csv_rejected_and_route_preserved() {
    let (app, _state) = setup_app().await;

    let res = app
        .clone()
        .oneshot(post_json("/v1/route/waypoints", json!({"lat": 40.0, "lon": -74.0})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let csv = "Number,Latitude,Longitude\n1,not-a-number,-74.0\n2,40.05,-74.0\n";
    let res = app
        .clone()
        .oneshot(post_json("/v1/route/import", json!({"csv": csv})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = app.clone().oneshot(get("/v1/route")).await.unwrap();
    let route = read_json(res).await;
    assert_eq!(route["waypoints"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn csv_export_round_trips_route() {
    let (app, _state) = setup_app().await;

    for (lat, lon) in [(40.0, -74.0), (40.1, -74.1)] {
        let res = app
            .clone()
            .oneshot(post_json("/v1/route/waypoints", json!({"lat": lat, "lon": lon})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = app.clone().oneshot(get("/v1/route/export")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("Number,Latitude,Longitude\n"));
    assert_eq!(text.lines().count(), 3);
}

#[tokio::test]
async fn mission_lifecycle() {
    let (app, _state) = setup_app().await;

    // A mission needs at least two waypoints.
    let res = app
        .clone()
        .oneshot(post_json("/v1/mission", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    for (lat, lon) in [(40.0, -74.0), (40.05, -74.0)] {
        let res = app
            .clone()
            .oneshot(post_json("/v1/route/waypoints", json!({"lat": lat, "lon": lon})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = app
        .clone()
        .oneshot(post_json("/v1/mission", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let snapshot = read_json(res).await;
    assert!(snapshot["total_distance_km"].as_f64().unwrap() > 5.0);

    let res = app
        .clone()
        .oneshot(post_json("/v1/mission/start", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fix = read_json(res).await;
    assert_eq!(fix["status"], "running");
    assert_eq!(fix["latitude"], 40.0);

    // Pausing twice is an invalid transition.
    let res = app
        .clone()
        .oneshot(post_json("/v1/mission/pause", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let res = app
        .clone()
        .oneshot(post_json("/v1/mission/pause", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .clone()
        .oneshot(post_json("/v1/mission/resume", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(get("/v1/mission/telemetry"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .clone()
        .oneshot(post_json("/v1/mission/abort", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The aborted simulation is gone.
    let res = app
        .clone()
        .oneshot(get("/v1/mission/telemetry"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The mission snapshot survives; a fresh run can start.
    let res = app
        .clone()
        .oneshot(post_json("/v1/mission/start", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn mission_restartable_after_completion() {
    let (app, state) = setup_app().await;

    for (lat, lon) in [(40.0, -74.0), (40.05, -74.0)] {
        let res = app
            .clone()
            .oneshot(post_json("/v1/route/waypoints", json!({"lat": lat, "lon": lon})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let res = app
        .clone()
        .oneshot(post_json("/v1/mission", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = app
        .clone()
        .oneshot(post_json("/v1/mission/start", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // One enormous tick runs the route to the end.
    let (_, fix) = state.tick_sim(1_000_000_000.0).unwrap();
    assert_eq!(fix.status, skydrop_core::MissionStatus::Completed);

    // A completed run cannot be aborted, only superseded.
    let res = app
        .clone()
        .oneshot(post_json("/v1/mission/abort", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = app
        .clone()
        .oneshot(post_json("/v1/mission", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let res = app
        .clone()
        .oneshot(post_json("/v1/mission/start", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let fix = read_json(res).await;
    assert_eq!(fix["status"], "running");
    assert_eq!(fix["progress_pct"], 0.0);
}

#[tokio::test]
async fn failed_persist_leaves_memory_untouched() {
    let (app, state) = setup_app().await;

    let res = app
        .clone()
        .oneshot(post_json(
            "/v1/ddts",
            json!({"name": "Rooftop A", "lat": 40.0, "lon": -74.0}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let ddt_id = read_json(res).await["id"].as_u64().unwrap();

    // Closing the pool makes every subsequent write fail.
    state.db().pool().close().await;

    let update = Request::builder()
        .method("PUT")
        .uri(format!("/v1/ddts/{}", ddt_id))
        .header("content-type", "application/json")
        .body(Body::from(json!({"name": "Rooftop B"}).to_string()))
        .unwrap();
    let res = app.clone().oneshot(update).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let res = app
        .clone()
        .oneshot(get(&format!("/v1/ddts/{}", ddt_id)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(read_json(res).await["name"], "Rooftop A");

    let delete = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/ddts/{}", ddt_id))
        .body(Body::empty())
        .unwrap();
    let res = app.clone().oneshot(delete).await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let res = app
        .clone()
        .oneshot(get(&format!("/v1/ddts/{}", ddt_id)))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn pause_without_simulation_rejected() {
    let (app, _state) = setup_app().await;

    let res = app
        .clone()
        .oneshot(post_json("/v1/mission/pause", json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn coordinate_validation_on_create() {
    let (app, _state) = setup_app().await;

    let res = app
        .clone()
        .oneshot(post_json("/v1/ddts", json!({"lat": 95.0, "lon": 0.0})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = app
        .clone()
        .oneshot(post_json("/v1/drones", json!({"lat": 0.0, "lon": -181.0})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
