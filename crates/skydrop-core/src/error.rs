//! Error taxonomy. Every variant is recoverable: the offending operation is
//! rejected and prior state is preserved unchanged.

use crate::sim::MissionStatus;
use thiserror::Error;

/// Route mutation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    #[error("route distance {total_km:.2} km would exceed the {limit_km:.0} km limit")]
    DistanceExceeded { total_km: f64, limit_km: f64 },

    #[error("waypoint index {index} out of range (route has {len} waypoints)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// CSV waypoint import failures. `line` is 1-based and counts the header.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CsvImportError {
    #[error("CSV header is missing a required '{0}' column")]
    MissingColumn(&'static str),

    #[error("invalid coordinates at line {line}")]
    MalformedRow { line: usize },

    #[error("coordinates out of range at line {line}")]
    OutOfRange { line: usize },

    #[error("duplicate waypoint number {number}")]
    DuplicateSequenceNumber { number: u32 },

    #[error("at least 2 waypoints required, found {found}")]
    InsufficientWaypoints { found: usize },
}

/// Mission simulation control failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MissionError {
    #[error("invalid mission: {waypoint_count} waypoints (minimum 2)")]
    InvalidMission { waypoint_count: usize },

    #[error("operation not valid while mission is {from:?}")]
    InvalidTransition { from: MissionStatus },
}
