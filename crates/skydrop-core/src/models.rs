//! Core data models for the skydrop system.

use serde::{Deserialize, Serialize};

/// One ordered point in a planned flight route.
///
/// Identity is positional; `number` is display ordering and is recomputed
/// to stay contiguous (1..N) whenever the owning route is mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub number: u32,
    pub latitude: f64,
    pub longitude: f64,
}

impl Waypoint {
    pub fn new(number: u32, latitude: f64, longitude: f64) -> Self {
        Self {
            number,
            latitude,
            longitude,
        }
    }
}

/// Derived mission record handed from the planning context to the tower
/// simulation. Recomputed whenever the route changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionSnapshot {
    pub waypoints: Vec<Waypoint>,
    pub total_distance_km: f64,
    pub estimated_duration_min: u32,
}

/// A named delivery drop-point marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ddt {
    pub id: u32,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    /// Storage rack assigned at this drop point, if any.
    #[serde(default)]
    pub rack: Option<String>,
    pub active: bool,
}

/// A warehouse marker drones launch from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: u32,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DroneOpStatus {
    /// Parked at its warehouse
    #[default]
    Idle,
    /// Assigned to a running mission
    Active,
}

/// A registered delivery drone and its display metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroneRecord {
    pub id: u32,
    pub name: String,
    pub status: DroneOpStatus,
    pub battery_pct: u8,
    /// Assigned package slot (1-4), if any.
    #[serde(default)]
    pub package: Option<u8>,
    pub active: bool,
    pub lat: f64,
    pub lon: f64,
}

/// Best-effort weather enrichment for a map position. Never required for
/// core correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_speed_mps: f64,
    pub conditions: String,
}
