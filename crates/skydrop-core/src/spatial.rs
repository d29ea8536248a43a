//! Spatial math for route distances and drone heading.

/// Mean Earth radius used by all great-circle math.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers (Haversine).
///
/// Defined for all finite inputs; the result is always >= 0.
///
/// # Arguments
/// * `lat1`, `lon1` - First point in decimal degrees
/// * `lat2`, `lon2` - Second point in decimal degrees
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Great-circle distance in meters.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    distance_km(lat1, lon1, lat2, lon2) * 1000.0
}

/// Initial compass bearing from one point to another, in degrees `[0, 360)`.
///
/// 0 = north, 90 = east. Used for marker orientation, not navigation.
pub fn bearing_degrees(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let y = delta_lambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    (y.atan2(x).to_degrees() + 360.0) % 360.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_same_point_is_zero() {
        assert_eq!(distance_km(0.0, 0.0, 0.0, 0.0), 0.0);
        assert!(distance_km(33.6846, -117.8265, 33.6846, -117.8265) < 1e-9);
    }

    #[test]
    fn distance_quarter_great_circle() {
        // 0,0 -> 0,90 spans a quarter of the equator
        let dist = distance_km(0.0, 0.0, 0.0, 90.0);
        assert!((dist - 10_007.5).abs() < 5.0, "got {dist}");
    }

    #[test]
    fn distance_one_degree_latitude() {
        let dist = distance_km(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111.19).abs() < 0.1, "got {dist}");
    }

    #[test]
    fn bearing_cardinal_directions() {
        assert!((bearing_degrees(0.0, 0.0, 1.0, 0.0) - 0.0).abs() < 1e-6);
        assert!((bearing_degrees(0.0, 0.0, 0.0, 1.0) - 90.0).abs() < 1e-6);
        assert!((bearing_degrees(1.0, 0.0, 0.0, 0.0) - 180.0).abs() < 1e-6);
        assert!((bearing_degrees(0.0, 1.0, 0.0, 0.0) - 270.0).abs() < 1e-6);
    }

    #[test]
    fn bearing_is_normalized() {
        let b = bearing_degrees(10.0, 20.0, -5.0, -40.0);
        assert!((0.0..360.0).contains(&b));
    }
}
