//! Request and response bodies for the `/services/location/*` endpoints.

use serde::{Deserialize, Serialize};

/// Envelope wrapping every location endpoint response:
/// `{ "success": true, "data": { ... } }`.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    /// Optional server-side explanation, usually only present on failure.
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GeocodeRequest<'a> {
    pub address: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ReverseGeocodeRequest {
    pub latitude: f64,
    pub longitude: f64,
}
