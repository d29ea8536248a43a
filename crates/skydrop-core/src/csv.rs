//! CSV waypoint import and export.
//!
//! Import is two-phase: `import_preview` parses and validates into an
//! [`ImportPreview`] without touching any live route; the caller applies the
//! preview through [`Route::replace`](crate::route::Route::replace) only on
//! explicit confirmation.

use crate::error::CsvImportError;
use crate::models::Waypoint;
use crate::route::{estimated_duration_min, path_distance_km};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Validated candidate route awaiting confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreview {
    pub waypoints: Vec<Waypoint>,
    pub total_distance_km: f64,
    pub estimated_duration_min: u32,
}

/// Parse CSV text into an ordered waypoint list.
///
/// The header row must contain `latitude` and `longitude` columns
/// (case-insensitive, any order). An optional `number` column supplies
/// explicit ordering; otherwise row order is used. Blank lines are skipped.
pub fn parse_waypoints(text: &str) -> Result<Vec<Waypoint>, CsvImportError> {
    let mut lines = text.lines();
    let header: Vec<String> = lines
        .next()
        .unwrap_or("")
        .to_lowercase()
        .split(',')
        .map(|cell| cell.trim().to_string())
        .collect();

    let lat_idx = header
        .iter()
        .position(|c| c == "latitude")
        .ok_or(CsvImportError::MissingColumn("latitude"))?;
    let lon_idx = header
        .iter()
        .position(|c| c == "longitude")
        .ok_or(CsvImportError::MissingColumn("longitude"))?;
    let num_idx = header.iter().position(|c| c == "number");

    let mut waypoints = Vec::new();
    let mut seen_numbers = HashSet::new();

    for (i, raw) in lines.enumerate() {
        let line = i + 2; // 1-based, counting the header
        if raw.trim().is_empty() {
            continue;
        }
        let cells: Vec<&str> = raw.split(',').map(str::trim).collect();

        let latitude = parse_coordinate(&cells, lat_idx, line)?;
        let longitude = parse_coordinate(&cells, lon_idx, line)?;

        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(CsvImportError::OutOfRange { line });
        }

        let number = match num_idx {
            // Sequence numbers start at 1; a zero is as malformed as a
            // non-numeric cell.
            Some(idx) => cells
                .get(idx)
                .and_then(|cell| cell.parse::<u32>().ok())
                .filter(|&n| n >= 1)
                .ok_or(CsvImportError::MalformedRow { line })?,
            None => waypoints.len() as u32 + 1,
        };

        if num_idx.is_some() && !seen_numbers.insert(number) {
            return Err(CsvImportError::DuplicateSequenceNumber { number });
        }

        waypoints.push(Waypoint::new(number, latitude, longitude));
    }

    if waypoints.len() < 2 {
        return Err(CsvImportError::InsufficientWaypoints {
            found: waypoints.len(),
        });
    }

    if num_idx.is_some() {
        waypoints.sort_by_key(|wp| wp.number);
    }

    Ok(waypoints)
}

fn parse_coordinate(cells: &[&str], idx: usize, line: usize) -> Result<f64, CsvImportError> {
    let value: f64 = cells
        .get(idx)
        .and_then(|cell| cell.parse().ok())
        .ok_or(CsvImportError::MalformedRow { line })?;
    if !value.is_finite() {
        return Err(CsvImportError::MalformedRow { line });
    }
    Ok(value)
}

/// Parse and derive the distance/duration summary shown in the
/// confirmation dialog.
pub fn import_preview(text: &str, avg_speed_kmh: f64) -> Result<ImportPreview, CsvImportError> {
    let waypoints = parse_waypoints(text)?;
    let total_distance_km = path_distance_km(&waypoints);
    Ok(ImportPreview {
        estimated_duration_min: estimated_duration_min(total_distance_km, avg_speed_kmh),
        total_distance_km,
        waypoints,
    })
}

/// Emit waypoints as canonical `Number,Latitude,Longitude` CSV.
pub fn export_waypoints(waypoints: &[Waypoint]) -> String {
    let mut out = String::from("Number,Latitude,Longitude\n");
    for wp in waypoints {
        out.push_str(&format!("{},{},{}\n", wp.number, wp.latitude, wp.longitude));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_numbered_rows() {
        let wps = parse_waypoints("Number,Latitude,Longitude\n1,10.0,20.0\n2,10.1,20.1\n").unwrap();
        assert_eq!(wps.len(), 2);
        assert_eq!(wps[0].number, 1);
        assert_eq!(wps[0].latitude, 10.0);
        assert_eq!(wps[1].number, 2);
        assert_eq!(wps[1].longitude, 20.1);
    }

    #[test]
    fn sorts_by_explicit_number() {
        let wps = parse_waypoints("Number,Latitude,Longitude\n3,30.0,3.0\n1,10.0,1.0\n2,20.0,2.0\n")
            .unwrap();
        let order: Vec<u32> = wps.iter().map(|wp| wp.number).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(wps[0].latitude, 10.0);
    }

    #[test]
    fn header_is_case_insensitive_and_order_free() {
        let wps = parse_waypoints("LONGITUDE,latitude\n20.0,10.0\n20.1,10.1\n").unwrap();
        assert_eq!(wps[0].latitude, 10.0);
        assert_eq!(wps[0].longitude, 20.0);
        // Row order supplies numbering when no number column exists
        assert_eq!(wps[1].number, 2);
    }

    #[test]
    fn missing_columns_are_reported() {
        assert_eq!(
            parse_waypoints("Latitude\n10.0\n").unwrap_err(),
            CsvImportError::MissingColumn("longitude")
        );
        assert_eq!(
            parse_waypoints("").unwrap_err(),
            CsvImportError::MissingColumn("latitude")
        );
    }

    #[test]
    fn malformed_coordinates_name_the_line() {
        let err = parse_waypoints("Latitude,Longitude\n10.0,20.0\nabc,20.1\n").unwrap_err();
        assert_eq!(err, CsvImportError::MalformedRow { line: 3 });

        let err = parse_waypoints("Latitude,Longitude\nNaN,20.0\n10.1,20.1\n").unwrap_err();
        assert_eq!(err, CsvImportError::MalformedRow { line: 2 });
    }

    #[test]
    fn zero_sequence_number_is_malformed() {
        let err = parse_waypoints("Number,Latitude,Longitude\n0,10.0,20.0\n1,10.1,20.1\n")
            .unwrap_err();
        assert_eq!(err, CsvImportError::MalformedRow { line: 2 });
    }

    #[test]
    fn out_of_range_latitude_yields_no_preview() {
        let err = import_preview("Latitude,Longitude\n95.0,20.0\n", 30.0).unwrap_err();
        assert_eq!(err, CsvImportError::OutOfRange { line: 2 });
    }

    #[test]
    fn duplicate_numbers_are_rejected() {
        let err = parse_waypoints("Number,Latitude,Longitude\n1,10.0,20.0\n1,10.1,20.1\n")
            .unwrap_err();
        assert_eq!(err, CsvImportError::DuplicateSequenceNumber { number: 1 });
    }

    #[test]
    fn single_row_is_insufficient() {
        let err = parse_waypoints("Latitude,Longitude\n10.0,20.0\n").unwrap_err();
        assert_eq!(err, CsvImportError::InsufficientWaypoints { found: 1 });
    }

    #[test]
    fn blank_lines_are_skipped() {
        let wps = parse_waypoints("Latitude,Longitude\n10.0,20.0\n\n10.1,20.1\n\n").unwrap();
        assert_eq!(wps.len(), 2);
    }

    #[test]
    fn preview_carries_distance_and_duration() {
        let preview =
            import_preview("Latitude,Longitude\n0.0,0.0\n1.0,0.0\n", 30.0).unwrap();
        assert!((preview.total_distance_km - 111.19).abs() < 0.1);
        // 111.19 km at 30 km/h, rounded up
        assert_eq!(preview.estimated_duration_min, 223);
    }

    #[test]
    fn export_round_trips_through_import() {
        let original = vec![
            Waypoint::new(1, 10.0, 20.0),
            Waypoint::new(2, 10.5, 20.25),
        ];
        let text = export_waypoints(&original);
        assert!(text.starts_with("Number,Latitude,Longitude\n"));
        let parsed = parse_waypoints(&text).unwrap();
        assert_eq!(parsed, original);
    }
}
