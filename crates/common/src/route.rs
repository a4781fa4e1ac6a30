//! Fixed routes replayed by the simulator.
//!
//! Waypoints are stored as `DVec2` with x=longitude and y=latitude, the same
//! convention the rest of the workspace uses for geographic positions.

use std::path::Path;

use geo::prelude::*;
use geo::Point;
use glam::DVec2;

use crate::error::{BusError, Result};

/// An ordered, non-empty, immutable list of waypoints traversed cyclically.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    waypoints: Vec<DVec2>,
}

impl Route {
    /// Builds a route from `(lat, lon)` pairs, rejecting empty input and
    /// coordinates outside the valid latitude/longitude ranges.
    pub fn from_lat_lon(pairs: &[(f64, f64)]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(BusError::Route("route has no waypoints".to_string()));
        }

        let mut waypoints = Vec::with_capacity(pairs.len());
        for (index, &(lat, lon)) in pairs.iter().enumerate() {
            if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
                return Err(BusError::Route(format!(
                    "waypoint {index}: latitude {lat} out of range"
                )));
            }
            if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
                return Err(BusError::Route(format!(
                    "waypoint {index}: longitude {lon} out of range"
                )));
            }
            waypoints.push(DVec2::new(lon, lat));
        }

        Ok(Self { waypoints })
    }

    /// Loads a route from a JSON array of `[lat, lon]` pairs.
    pub fn load_from_json(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("🗺️ Loading route from: {}", path.display());

        let raw = std::fs::read_to_string(path)?;
        let pairs: Vec<[f64; 2]> = serde_json::from_str(&raw)?;
        let pairs: Vec<(f64, f64)> = pairs.into_iter().map(|[lat, lon]| (lat, lon)).collect();
        Self::from_lat_lon(&pairs)
    }

    pub fn waypoints(&self) -> &[DVec2] {
        &self.waypoints
    }

    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Returns `true` if the route has no waypoints.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// Waypoint visited on the `tick`-th write, wrapping around the end.
    pub fn point_at(&self, tick: usize) -> DVec2 {
        self.waypoints[tick % self.waypoints.len()]
    }

    /// Total length in meters of the path through all waypoints in order.
    pub fn length_meters(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|w| {
                let p1 = Point::new(w[0].x, w[0].y);
                let p2 = Point::new(w[1].x, w[1].y);
                p1.haversine_distance(&p2)
            })
            .sum()
    }
}

/// Returns a short out-and-back loop on a test campus.
/// First and last waypoints coincide, closing the loop.
pub fn campus_loop() -> Route {
    Route {
        waypoints: vec![
            DVec2::new(-122.084, 37.4219983),
            // Heading north-west
            DVec2::new(-122.0845, 37.4225),
            DVec2::new(-122.0850, 37.4230),
            DVec2::new(-122.0855, 37.4235),
            // Turnaround
            DVec2::new(-122.0860, 37.4240),
            // Back the same way
            DVec2::new(-122.0855, 37.4235),
            DVec2::new(-122.0850, 37.4230),
            DVec2::new(-122.0845, 37.4225),
            DVec2::new(-122.084, 37.4219983),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campus_loop_is_closed() {
        let route = campus_loop();
        assert_eq!(route.len(), 9);
        assert!(!route.is_empty());
        assert_eq!(route.point_at(0), DVec2::new(-122.084, 37.4219983));
        assert_eq!(route.point_at(8), DVec2::new(-122.084, 37.4219983));
    }

    #[test]
    fn point_at_wraps_around() {
        let route = campus_loop();
        for tick in 0..30 {
            assert_eq!(route.point_at(tick), route.waypoints()[tick % 9]);
        }
        assert_eq!(route.point_at(9), route.point_at(0));
    }

    #[test]
    fn campus_loop_length_is_plausible() {
        // Four ~70m legs out, four back.
        let meters = campus_loop().length_meters();
        assert!(meters > 400.0 && meters < 700.0, "got {meters}");
    }

    #[test]
    fn single_point_route_has_zero_length() {
        let route = Route::from_lat_lon(&[(10.0, 20.0)]).unwrap();
        assert_eq!(route.length_meters(), 0.0);
        assert_eq!(route.point_at(5), DVec2::new(20.0, 10.0));
    }

    #[test]
    fn rejects_empty_route() {
        assert!(matches!(Route::from_lat_lon(&[]), Err(BusError::Route(_))));
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(Route::from_lat_lon(&[(91.0, 0.0)]).is_err());
        assert!(Route::from_lat_lon(&[(0.0, -180.5)]).is_err());
        assert!(Route::from_lat_lon(&[(f64::NAN, 0.0)]).is_err());
    }

    #[test]
    fn loads_lat_lon_pairs_from_json() {
        let path = std::env::temp_dir().join(format!("bus-route-{}.json", std::process::id()));
        std::fs::write(&path, "[[37.4219983, -122.084], [37.4225, -122.0845]]").unwrap();

        let route = Route::load_from_json(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(route.len(), 2);
        assert_eq!(route.point_at(1), DVec2::new(-122.0845, 37.4225));
    }

    #[test]
    fn missing_route_file_is_io_error() {
        let err = Route::load_from_json("/nonexistent/route.json").unwrap_err();
        assert!(matches!(err, BusError::Io(_)));
    }
}
