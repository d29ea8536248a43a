//! Tower mission simulation.
//!
//! A `MissionSim` flies a point along successive route segments at a fixed
//! ground speed. It is driven by an external clock: `tick(elapsed_ms)` is a
//! plain state transition with no scheduling of its own, so the same machine
//! runs under an animation loop, a tokio interval, or a test harness.

use crate::error::MissionError;
use crate::models::{MissionSnapshot, Waypoint};
use crate::spatial::{bearing_degrees, distance_m};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Simulated ground speed matching the tower screen, in m/s.
pub const DEFAULT_SIM_SPEED_MPS: f64 = 50.0;

/// Cruise altitude the cosmetic telemetry oscillates around, in meters.
const BASE_ALTITUDE_M: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissionStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Aborted,
}

/// Interpolated drone state at one animation tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Compass orientation of the drone icon, degrees `[0, 360)`.
    pub bearing_deg: f64,
    pub altitude_m: f64,
    pub battery_pct: f64,
    pub speed_mps: f64,
    pub progress_pct: f64,
    pub status: MissionStatus,
}

#[derive(Debug, Clone)]
pub struct MissionSim {
    waypoints: Vec<Waypoint>,
    speed_mps: f64,
    segment: usize,
    progress: f64,
    status: MissionStatus,
}

impl MissionSim {
    pub fn new(waypoints: Vec<Waypoint>, speed_mps: f64) -> Self {
        Self {
            waypoints,
            speed_mps,
            segment: 0,
            progress: 0.0,
            status: MissionStatus::Idle,
        }
    }

    pub fn from_snapshot(snapshot: &MissionSnapshot, speed_mps: f64) -> Self {
        Self::new(snapshot.waypoints.clone(), speed_mps)
    }

    pub fn status(&self) -> MissionStatus {
        self.status
    }

    pub fn segment_index(&self) -> usize {
        self.segment
    }

    pub fn segment_progress(&self) -> f64 {
        self.progress
    }

    fn segments(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    /// Begin flying from waypoint 1 toward waypoint 2.
    ///
    /// Valid only from `Idle` with at least 2 waypoints; an undersized
    /// mission is refused as a recoverable condition.
    pub fn start(&mut self) -> Result<(), MissionError> {
        if self.status != MissionStatus::Idle {
            return Err(MissionError::InvalidTransition { from: self.status });
        }
        if self.waypoints.len() < 2 {
            return Err(MissionError::InvalidMission {
                waypoint_count: self.waypoints.len(),
            });
        }
        self.status = MissionStatus::Running;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), MissionError> {
        if self.status != MissionStatus::Running {
            return Err(MissionError::InvalidTransition { from: self.status });
        }
        self.status = MissionStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), MissionError> {
        if self.status != MissionStatus::Paused {
            return Err(MissionError::InvalidTransition { from: self.status });
        }
        self.status = MissionStatus::Running;
        Ok(())
    }

    /// Terminal; the caller discards the simulation afterwards.
    pub fn abort(&mut self) -> Result<(), MissionError> {
        match self.status {
            MissionStatus::Running | MissionStatus::Paused => {
                self.status = MissionStatus::Aborted;
                Ok(())
            }
            from => Err(MissionError::InvalidTransition { from }),
        }
    }

    /// Advance by wall-clock time and report the resulting fix.
    ///
    /// Only a `Running` mission moves; leftover time at a segment boundary
    /// spills into the next segment. Completing the final segment
    /// transitions to `Completed`.
    pub fn tick(&mut self, elapsed_ms: f64) -> MissionFix {
        let mut remaining = elapsed_ms.max(0.0);
        while remaining > 0.0 && self.status == MissionStatus::Running {
            let a = self.waypoints[self.segment];
            let b = self.waypoints[self.segment + 1];
            let segment_m = distance_m(a.latitude, a.longitude, b.latitude, b.longitude);
            let duration_ms = if self.speed_mps > 0.0 {
                segment_m / self.speed_mps * 1000.0
            } else {
                0.0
            };

            // Zero-length segments (duplicate points) complete instantly.
            if duration_ms <= 0.0 {
                self.advance_segment();
                continue;
            }

            let left_ms = (1.0 - self.progress) * duration_ms;
            if remaining >= left_ms {
                remaining -= left_ms;
                self.advance_segment();
            } else {
                self.progress += remaining / duration_ms;
                remaining = 0.0;
            }
        }
        self.fix()
    }

    fn advance_segment(&mut self) {
        if self.segment + 1 >= self.segments() {
            self.progress = 1.0;
            self.status = MissionStatus::Completed;
        } else {
            self.segment += 1;
            self.progress = 0.0;
        }
    }

    /// Current interpolated state without advancing the clock.
    pub fn fix(&self) -> MissionFix {
        let (latitude, longitude, bearing_deg) = match self.waypoints.len() {
            0 => (0.0, 0.0, 0.0),
            1 => (self.waypoints[0].latitude, self.waypoints[0].longitude, 0.0),
            _ => {
                let a = self.waypoints[self.segment];
                let b = self.waypoints[self.segment + 1];
                // Plain linear interpolation; fine at delivery-route scales.
                let lat = a.latitude + (b.latitude - a.latitude) * self.progress;
                let lon = a.longitude + (b.longitude - a.longitude) * self.progress;
                let bearing = bearing_degrees(a.latitude, a.longitude, b.latitude, b.longitude);
                (lat, lon, bearing)
            }
        };

        let segments = self.segments().max(1) as f64;
        let overall = (self.segment as f64 + self.progress) / segments;

        // Cosmetic telemetry: deterministic functions of progress with no
        // physical meaning. Battery drains by up to 20 points over the
        // route, altitude bows sinusoidally over each segment.
        let waypoint_count = self.waypoints.len().max(1) as f64;
        let battery_pct =
            (100.0 - (self.segment as f64 + self.progress) / waypoint_count * 20.0).max(0.0);
        let altitude_m = BASE_ALTITUDE_M + (self.progress * PI).sin() * 20.0;

        MissionFix {
            latitude,
            longitude,
            bearing_deg,
            altitude_m,
            battery_pct,
            speed_mps: self.speed_mps,
            progress_pct: (overall * 100.0).clamp(0.0, 100.0),
            status: self.status,
        }
    }
}
