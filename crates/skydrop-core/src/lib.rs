pub mod csv;
pub mod error;
pub mod models;
pub mod route;
pub mod sim;
pub mod spatial;

pub use csv::{export_waypoints, import_preview, parse_waypoints, ImportPreview};
pub use error::{CsvImportError, MissionError, RouteError};
pub use models::{
    Ddt, DroneOpStatus, DroneRecord, MissionSnapshot, Warehouse, WeatherReport, Waypoint,
};
pub use route::{
    estimated_duration_min, path_distance_km, Route, RouteLimits, DEFAULT_MAX_ROUTE_KM,
    DEFAULT_PLANNING_SPEED_KMH,
};
pub use sim::{MissionFix, MissionSim, MissionStatus, DEFAULT_SIM_SPEED_MPS};
pub use spatial::{bearing_degrees, distance_km, distance_m};
