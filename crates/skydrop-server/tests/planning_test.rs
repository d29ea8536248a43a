//! Mission planning integration tests.
//!
//! Tests the planning and simulation flow against a live server.
//!
//! Run with: cargo test --test planning_test -- --ignored
//! Requires a running skydrop server.

use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;

fn base_url() -> String {
    std::env::var("SKYDROP_TEST_URL").unwrap_or_else(|_| "http://localhost:4000".to_string())
}

/// Plan a short route, run the mission and watch telemetry advance.
#[tokio::test]
#[ignore]
async fn test_planned_mission_progresses() {
    let client = Client::new();
    let base = base_url();

    // Fresh route
    client
        .delete(format!("{}/v1/route", base))
        .send()
        .await
        .unwrap();

    for (lat, lon) in [(40.0, -74.0), (40.01, -74.0), (40.02, -74.0)] {
        let resp = client
            .post(format!("{}/v1/route/waypoints", base))
            .json(&serde_json::json!({"lat": lat, "lon": lon}))
            .send()
            .await
            .unwrap();
        assert!(resp.status().is_success());
    }

    let resp = client
        .post(format!("{}/v1/mission", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

    let resp = client
        .post(format!("{}/v1/mission/start", base))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    // Give the simulation loop a few ticks, then expect forward progress.
    sleep(Duration::from_millis(500)).await;

    let fix: serde_json::Value = client
        .get(format!("{}/v1/mission/telemetry", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(fix["progress_pct"].as_f64().unwrap() > 0.0);
    assert!(fix["latitude"].as_f64().unwrap() > 40.0);

    let resp = client
        .post(format!("{}/v1/mission/abort", base))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
}

/// Import a CSV route through the preview/confirm flow.
#[tokio::test]
#[ignore]
async fn test_csv_import_flow() {
    let client = Client::new();
    let base = base_url();

    client
        .delete(format!("{}/v1/route", base))
        .send()
        .await
        .unwrap();

    let csv = "Number,Latitude,Longitude\n1,40.0,-74.0\n2,40.05,-74.0\n";
    let resp = client
        .post(format!("{}/v1/route/import", base))
        .json(&serde_json::json!({"csv": csv}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let resp = client
        .post(format!("{}/v1/route/import/confirm", base))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let route: serde_json::Value = client
        .get(format!("{}/v1/route", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(route["waypoints"].as_array().unwrap().len(), 2);
}
