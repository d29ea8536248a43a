//! Server configuration from environment.

use skydrop_core::{RouteLimits, DEFAULT_MAX_ROUTE_KM};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_path: String,
    pub database_max_connections: u32,
    /// Planning-route cap in km; zero or negative disables the cap.
    pub max_route_distance_km: f64,
    /// Average speed used for duration estimates, km/h.
    pub planning_speed_kmh: f64,
    /// Simulated ground speed for the tower loop, m/s.
    pub sim_speed_mps: f64,
    /// Simulation frame interval, ms.
    pub sim_tick_ms: u64,
    /// Default radius for warehouse DDT range queries, km.
    pub warehouse_range_km: f64,
    pub weather_api_key: Option<String>,
    pub weather_base_url: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_port: parse_env("SKYDROP_PORT", 4000),
            database_path: env::var("SKYDROP_DB_PATH")
                .unwrap_or_else(|_| "data/skydrop.db".to_string()),
            database_max_connections: parse_env("SKYDROP_DB_MAX_CONNECTIONS", 5),
            max_route_distance_km: parse_env("SKYDROP_MAX_ROUTE_KM", DEFAULT_MAX_ROUTE_KM),
            planning_speed_kmh: parse_env("SKYDROP_PLANNING_SPEED_KMH", 30.0),
            sim_speed_mps: parse_env("SKYDROP_SIM_SPEED_MPS", 50.0),
            sim_tick_ms: parse_env("SKYDROP_SIM_TICK_MS", 100),
            warehouse_range_km: parse_env("SKYDROP_WAREHOUSE_RANGE_KM", 10.0),
            weather_api_key: env::var("OPENWEATHER_API_KEY").ok(),
            weather_base_url: env::var("OPENWEATHER_URL")
                .unwrap_or_else(|_| "https://api.openweathermap.org".to_string()),
        }
    }

    /// Limits for the planning route context.
    pub fn route_limits(&self) -> RouteLimits {
        if self.max_route_distance_km > 0.0 {
            RouteLimits {
                max_distance_km: Some(self.max_route_distance_km),
            }
        } else {
            RouteLimits::unbounded()
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
