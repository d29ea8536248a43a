//! Planned flight route: an owned, ordered waypoint sequence with an
//! optional cumulative-distance cap.
//!
//! Mutations are checked prospectively: a candidate point that would push
//! the total past the cap is never inserted, and a rejected move leaves the
//! waypoint at its prior coordinates.

use crate::error::RouteError;
use crate::models::{MissionSnapshot, Waypoint};
use crate::spatial::distance_km;
use serde::{Deserialize, Serialize};

/// Default cumulative route cap for the planning context, in kilometers.
pub const DEFAULT_MAX_ROUTE_KM: f64 = 200.0;

/// Average planning speed used for duration estimates, in km/h.
pub const DEFAULT_PLANNING_SPEED_KMH: f64 = 30.0;

/// Per-context route constraints. The admin contexts carry no cap; the
/// planning screen caps at [`DEFAULT_MAX_ROUTE_KM`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RouteLimits {
    pub max_distance_km: Option<f64>,
}

impl Default for RouteLimits {
    fn default() -> Self {
        Self {
            max_distance_km: Some(DEFAULT_MAX_ROUTE_KM),
        }
    }
}

impl RouteLimits {
    /// Limits with no distance cap.
    pub fn unbounded() -> Self {
        Self {
            max_distance_km: None,
        }
    }
}

/// Ordered sequence of waypoints; insertion order is flight order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Route {
    waypoints: Vec<Waypoint>,
    limits: RouteLimits,
}

impl Route {
    pub fn new(limits: RouteLimits) -> Self {
        Self {
            waypoints: Vec::new(),
            limits,
        }
    }

    /// Build a route from already-validated waypoints, renumbering them
    /// contiguously. Enforces the cap when one is configured.
    pub fn from_waypoints(
        waypoints: Vec<Waypoint>,
        limits: RouteLimits,
    ) -> Result<Self, RouteError> {
        let mut route = Self::new(limits);
        route.replace(waypoints)?;
        Ok(route)
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn limits(&self) -> RouteLimits {
        self.limits
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Append a waypoint as the next sequence number.
    ///
    /// The total length including the candidate is checked first; on
    /// rejection the route is unchanged and the error reports the violating
    /// total alongside the limit.
    pub fn add_waypoint(&mut self, latitude: f64, longitude: f64) -> Result<Waypoint, RouteError> {
        if let (Some(limit), Some(last)) = (self.limits.max_distance_km, self.waypoints.last()) {
            let total = self.total_distance_km()
                + distance_km(last.latitude, last.longitude, latitude, longitude);
            if total > limit {
                return Err(RouteError::DistanceExceeded {
                    total_km: total,
                    limit_km: limit,
                });
            }
        }

        let number = self.waypoints.len() as u32 + 1;
        let waypoint = Waypoint::new(number, latitude, longitude);
        self.waypoints.push(waypoint);
        Ok(waypoint)
    }

    /// Relocate a waypoint, keeping its sequence position.
    ///
    /// The prospective total is computed without touching stored state, so
    /// a rejected move is fully rolled back by construction.
    pub fn move_waypoint(
        &mut self,
        index: usize,
        latitude: f64,
        longitude: f64,
    ) -> Result<(), RouteError> {
        if index >= self.waypoints.len() {
            return Err(RouteError::IndexOutOfRange {
                index,
                len: self.waypoints.len(),
            });
        }

        if let Some(limit) = self.limits.max_distance_km {
            let total = self.distance_with_moved(index, latitude, longitude);
            if total > limit {
                return Err(RouteError::DistanceExceeded {
                    total_km: total,
                    limit_km: limit,
                });
            }
        }

        self.waypoints[index].latitude = latitude;
        self.waypoints[index].longitude = longitude;
        Ok(())
    }

    /// Remove a waypoint and renumber the remainder to stay contiguous.
    /// Removal only shortens the route, so no distance check applies.
    pub fn remove_waypoint(&mut self, index: usize) -> Result<Waypoint, RouteError> {
        if index >= self.waypoints.len() {
            return Err(RouteError::IndexOutOfRange {
                index,
                len: self.waypoints.len(),
            });
        }
        let removed = self.waypoints.remove(index);
        self.renumber();
        Ok(removed)
    }

    /// Swap in a new waypoint list wholesale (import confirmation).
    /// The incoming order is kept; numbers are rewritten 1..N.
    pub fn replace(&mut self, waypoints: Vec<Waypoint>) -> Result<(), RouteError> {
        if let Some(limit) = self.limits.max_distance_km {
            let total = path_distance_km(&waypoints);
            if total > limit {
                return Err(RouteError::DistanceExceeded {
                    total_km: total,
                    limit_km: limit,
                });
            }
        }
        self.waypoints = waypoints;
        self.renumber();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.waypoints.clear();
    }

    /// Sum of consecutive-pair great-circle distances; 0 for fewer than
    /// two waypoints.
    pub fn total_distance_km(&self) -> f64 {
        path_distance_km(&self.waypoints)
    }

    /// `ceil(total / speed * 60)` minutes at the given average speed.
    pub fn estimated_duration_min(&self, avg_speed_kmh: f64) -> u32 {
        estimated_duration_min(self.total_distance_km(), avg_speed_kmh)
    }

    /// Derive the hand-off record for the tower simulation.
    pub fn snapshot(&self, avg_speed_kmh: f64) -> MissionSnapshot {
        MissionSnapshot {
            waypoints: self.waypoints.clone(),
            total_distance_km: self.total_distance_km(),
            estimated_duration_min: self.estimated_duration_min(avg_speed_kmh),
        }
    }

    fn distance_with_moved(&self, index: usize, latitude: f64, longitude: f64) -> f64 {
        let coord = |i: usize| -> (f64, f64) {
            if i == index {
                (latitude, longitude)
            } else {
                (self.waypoints[i].latitude, self.waypoints[i].longitude)
            }
        };
        let mut total = 0.0;
        for i in 1..self.waypoints.len() {
            let (lat1, lon1) = coord(i - 1);
            let (lat2, lon2) = coord(i);
            total += distance_km(lat1, lon1, lat2, lon2);
        }
        total
    }

    fn renumber(&mut self) {
        for (i, wp) in self.waypoints.iter_mut().enumerate() {
            wp.number = i as u32 + 1;
        }
    }
}

/// Total great-circle length of a waypoint polyline in kilometers.
pub fn path_distance_km(waypoints: &[Waypoint]) -> f64 {
    waypoints
        .windows(2)
        .map(|pair| {
            distance_km(
                pair[0].latitude,
                pair[0].longitude,
                pair[1].latitude,
                pair[1].longitude,
            )
        })
        .sum()
}

/// Duration estimate in whole minutes, rounded up.
pub fn estimated_duration_min(total_distance_km: f64, avg_speed_kmh: f64) -> u32 {
    if avg_speed_kmh <= 0.0 {
        return 0;
    }
    (total_distance_km / avg_speed_kmh * 60.0).ceil() as u32
}
