//! HTTP client for the marketplace location endpoints.
//!
//! Wraps `reqwest` with the `{ success, data }` envelope handling shared by the
//! IP lookup, geocoding and reverse-geocoding endpoints. Each call is a single
//! request with no retry; the transport timeout comes from configuration.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use svcmkt_core::{AppConfig, Coordinates, LocationInfo};

use crate::error::ClientError;
use crate::types::{ApiEnvelope, GeocodeRequest, ReverseGeocodeRequest};

const IP_PATH: &str = "services/location/ip";
const GEOCODE_PATH: &str = "services/location/geocode";
const REVERSE_GEOCODE_PATH: &str = "services/location/reverse-geocode";

/// Client for the `/services/location/*` endpoints.
#[derive(Debug, Clone)]
pub struct LocationClient {
    client: Client,
    base_url: Url,
}

impl LocationClient {
    /// Creates a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so relative joins append to the base
        // path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            base_url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Creates a client from the application configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] when no API base URL is configured,
    /// otherwise see [`LocationClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ClientError> {
        Self::new(
            config.require_api_base_url()?,
            config.request_timeout_secs,
            &config.user_agent,
        )
    }

    /// `GET /services/location/ip`: approximate location of the caller.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Http`] on network failure or non-2xx status.
    /// - [`ClientError::Unsuccessful`] if the envelope reports failure.
    /// - [`ClientError::Deserialize`] if the body is not a valid envelope.
    pub async fn ip_location(&self) -> Result<LocationInfo, ClientError> {
        let url = self.endpoint(IP_PATH)?;
        tracing::debug!(%url, "requesting IP location");
        self.send(self.client.get(url), IP_PATH).await
    }

    /// `POST /services/location/geocode` with `{ "address": ... }`.
    ///
    /// # Errors
    ///
    /// Same as [`LocationClient::ip_location`].
    pub async fn geocode(&self, address: &str) -> Result<LocationInfo, ClientError> {
        let url = self.endpoint(GEOCODE_PATH)?;
        tracing::debug!(%url, address, "geocoding address");
        let request = self.client.post(url).json(&GeocodeRequest { address });
        self.send(request, GEOCODE_PATH).await
    }

    /// `POST /services/location/reverse-geocode` with `{ latitude, longitude }`.
    ///
    /// # Errors
    ///
    /// Same as [`LocationClient::ip_location`].
    pub async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<LocationInfo, ClientError> {
        let url = self.endpoint(REVERSE_GEOCODE_PATH)?;
        tracing::debug!(%url, "reverse geocoding position");
        let request = self.client.post(url).json(&ReverseGeocodeRequest {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
        });
        self.send(request, REVERSE_GEOCODE_PATH).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Sends the request, asserts a 2xx status, unwraps the envelope and
    /// decodes `data` as a [`LocationInfo`].
    async fn send(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<LocationInfo, ClientError> {
        let response = request.send().await?.error_for_status()?;
        let body = response.text().await?;

        let envelope: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(&body).map_err(|e| ClientError::Deserialize {
                context: endpoint.to_string(),
                source: e,
            })?;

        if !envelope.success {
            return Err(ClientError::Unsuccessful {
                endpoint: endpoint.to_string(),
                message: envelope
                    .message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            });
        }

        let data = envelope.data.ok_or_else(|| ClientError::Unsuccessful {
            endpoint: endpoint.to_string(),
            message: "response carried no data".to_string(),
        })?;

        serde_json::from_value(data).map_err(|e| ClientError::Deserialize {
            context: format!("{endpoint} data"),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
