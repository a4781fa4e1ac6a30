//! The record published for the simulated vehicle on every tick.

use std::fmt;

use glam::DVec2;
use serde::Serialize;

/// Latest reported position of a bus, as stored at its database reference.
///
/// Serialized as `{"lat": .., "lon": .., "timestamp": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionRecord {
    pub lat: f64,
    pub lon: f64,
    /// Unix time in whole seconds at which the record was built.
    pub timestamp: i64,
}

impl PositionRecord {
    /// Builds a record for a waypoint (x=longitude, y=latitude).
    pub fn at(point: DVec2, timestamp: i64) -> Self {
        Self {
            lat: point.y,
            lon: point.x,
            timestamp,
        }
    }

    /// Builds a record stamped with the current wall-clock time.
    pub fn now(point: DVec2) -> Self {
        Self::at(point, chrono::Utc::now().timestamp())
    }
}

impl fmt::Display for PositionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{lat: {}, lon: {}, timestamp: {}}}",
            self.lat, self.lon, self.timestamp
        )
    }
}
