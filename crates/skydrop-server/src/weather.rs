//! OpenWeatherMap client for site weather enrichment.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use skydrop_core::WeatherReport;

#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
            api_key,
        }
    }

    /// Fetch current conditions for a coordinate, metric units.
    pub async fn current(&self, lat: f64, lon: f64) -> Result<WeatherReport> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("OPENWEATHER_API_KEY is not set"))?;

        let url = format!("{}/data/2.5/weather", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("units", "metric".to_string()),
                ("appid", api_key.to_string()),
            ])
            .send()
            .await
            .context("weather request failed")?
            .error_for_status()
            .context("weather upstream returned an error status")?;

        let payload: OwmResponse = response
            .json()
            .await
            .context("malformed weather response")?;

        let conditions = payload
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "unknown".to_string());

        Ok(WeatherReport {
            temperature_c: payload.main.temp,
            humidity_pct: payload.main.humidity,
            wind_speed_mps: payload.wind.speed,
            conditions,
        })
    }
}

#[derive(Deserialize)]
struct OwmResponse {
    main: OwmMain,
    wind: OwmWind,
    #[serde(default)]
    weather: Vec<OwmCondition>,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct OwmWind {
    speed: f64,
}

#[derive(Deserialize)]
struct OwmCondition {
    description: String,
}
