// ── Geographic primitives ──

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean meters per degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Both components are finite and within the WGS84 ranges.
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Convert a ground distance in meters to (latitude, longitude) degree
    /// extents at this position. Longitude extent grows toward the poles.
    pub fn meters_to_degrees(self, meters: f64) -> (f64, f64) {
        let dlat = meters / METERS_PER_DEGREE;
        let cos = self.lat.to_radians().cos().abs().max(1e-6);
        (dlat, dlat / cos)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}
