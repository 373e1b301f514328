//! Resolved location records.
//!
//! Every resolution method (device position, IP lookup, geocoding) produces a
//! [`LocationInfo`]. On the wire it is a flat record where every field is
//! optional; in memory it is either pinned to coordinates or address-only, so
//! a half-populated coordinate pair can never circulate.

use serde::{Deserialize, Serialize};

use crate::geo::{Coordinates, GeoError};

/// Administrative fields attached to a location. All best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddressDetails {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub service_radius_km: Option<f64>,
}

/// The flat JSON shape exchanged with the location endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_radius_km: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireLocation", into = "WireLocation")]
pub enum LocationInfo {
    Resolved {
        coordinates: Coordinates,
        details: AddressDetails,
    },
    AddressOnly(AddressDetails),
}

impl LocationInfo {
    #[must_use]
    pub fn resolved(coordinates: Coordinates, details: AddressDetails) -> Self {
        Self::Resolved {
            coordinates,
            details,
        }
    }

    /// A bare position with no address fields, as produced by a device fix
    /// that could not be reverse geocoded.
    #[must_use]
    pub fn from_coordinates(coordinates: Coordinates) -> Self {
        Self::resolved(coordinates, AddressDetails::default())
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Resolved { coordinates, .. } => Some(*coordinates),
            Self::AddressOnly(_) => None,
        }
    }

    #[must_use]
    pub fn details(&self) -> &AddressDetails {
        match self {
            Self::Resolved { details, .. } | Self::AddressOnly(details) => details,
        }
    }

    /// Human-readable label: `"city, state, country"` with blanks skipped,
    /// then the free-text address, then `"Unknown location"`.
    #[must_use]
    pub fn display_string(&self) -> String {
        let details = self.details();
        let parts: Vec<&str> = [&details.city, &details.state, &details.country]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect();

        if !parts.is_empty() {
            return parts.join(", ");
        }

        details
            .address
            .as_deref()
            .map(str::trim)
            .filter(|address| !address.is_empty())
            .map_or_else(|| "Unknown location".to_string(), str::to_string)
    }
}

impl TryFrom<WireLocation> for LocationInfo {
    type Error = GeoError;

    fn try_from(wire: WireLocation) -> Result<Self, Self::Error> {
        let details = AddressDetails {
            address: wire.address,
            city: wire.city,
            state: wire.state,
            country: wire.country,
            postal_code: wire.postal_code,
            service_radius_km: wire.service_radius_km,
        };
        match (wire.latitude, wire.longitude) {
            (Some(lat), Some(lon)) => Ok(Self::resolved(Coordinates::new(lat, lon)?, details)),
            (None, None) => Ok(Self::AddressOnly(details)),
            _ => Err(GeoError::PartialCoordinates),
        }
    }
}

impl From<LocationInfo> for WireLocation {
    fn from(info: LocationInfo) -> Self {
        let (coordinates, details) = match info {
            LocationInfo::Resolved {
                coordinates,
                details,
            } => (Some(coordinates), details),
            LocationInfo::AddressOnly(details) => (None, details),
        };
        Self {
            latitude: coordinates.map(|c| c.latitude),
            longitude: coordinates.map(|c| c.longitude),
            address: details.address,
            city: details.city,
            state: details.state,
            country: details.country,
            postal_code: details.postal_code,
            service_radius_km: details.service_radius_km,
        }
    }
}
