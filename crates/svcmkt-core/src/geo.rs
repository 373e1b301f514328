//! Coordinate math for location-aware search.
//!
//! Great-circle distance via the haversine formula on a spherical Earth,
//! radius membership, and the display rule used wherever a distance is shown
//! next to a listing.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used for every distance in the marketplace.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),

    #[error("latitude and longitude must be provided together")]
    PartialCoordinates,
}

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Builds a position after checking both components are in range.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidLatitude`] or [`GeoError::InvalidLongitude`]
    /// when a component is out of range or not a finite number.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    #[must_use]
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        haversine_distance_km(self, other)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

#[must_use]
pub fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

/// Great-circle distance between two positions in kilometres.
///
/// Callers are expected to pass positions that satisfy
/// [`is_valid_coordinates`]; the formula itself has no failure mode.
#[must_use]
pub fn haversine_distance_km(a: &Coordinates, b: &Coordinates) -> f64 {
    let d_lat = to_radians(b.latitude - a.latitude);
    let d_lon = to_radians(b.longitude - a.longitude);

    let h = (d_lat / 2.0).sin().powi(2)
        + to_radians(a.latitude).cos()
            * to_radians(b.latitude).cos()
            * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Returns `true` when both components are present, finite and in range.
#[must_use]
pub fn is_valid_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> bool {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Coordinates::new(lat, lon).is_ok(),
        _ => false,
    }
}

/// Inclusive radius test: a point exactly `radius_km` away is inside.
#[must_use]
pub fn is_within_radius(a: &Coordinates, b: &Coordinates, radius_km: f64) -> bool {
    haversine_distance_km(a, b) <= radius_km
}

/// Formats a distance for display.
///
/// | distance        | output          |
/// |-----------------|-----------------|
/// | `< 1 km`        | whole metres, `"500m"`   |
/// | `1 km ..< 10 km`| one decimal, `"2.4km"`   |
/// | `>= 10 km`      | whole km, `"15km"`       |
#[must_use]
pub fn format_distance(km: f64) -> String {
    if km < 1.0 {
        format!("{}m", (km * 1000.0).round())
    } else if km < 10.0 {
        format!("{km:.1}km")
    } else {
        format!("{}km", km.round())
    }
}

#[cfg(test)]
#[path = "geo_test.rs"]
mod tests;
