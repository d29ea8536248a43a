//! Site weather endpoint backed by OpenWeatherMap.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::state::AppState;
use skydrop_core::WeatherReport;

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Serialize)]
pub struct WeatherResponse {
    #[serde(flatten)]
    pub report: WeatherReport,
    pub fetched_at: DateTime<Utc>,
}

pub async fn get_weather(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherResponse>, (StatusCode, Json<serde_json::Value>)> {
    if !query.lat.is_finite()
        || !query.lon.is_finite()
        || !(-90.0..=90.0).contains(&query.lat)
        || !(-180.0..=180.0).contains(&query.lon)
    {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({"error": "Coordinate out of range"})),
        ));
    }

    match state.weather().current(query.lat, query.lon).await {
        Ok(report) => Ok(Json(WeatherResponse {
            report,
            fetched_at: Utc::now(),
        })),
        Err(err) => {
            tracing::warn!("Weather lookup failed: {:#}", err);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({"error": "Weather service unavailable"})),
            ))
        }
    }
}
