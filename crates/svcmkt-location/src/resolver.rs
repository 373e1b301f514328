//! Location resolution chain.
//!
//! Each acquisition method is independent and fails on its own; [`resolve`]
//! composes them by trying an ordered list of strategies and returning the
//! first success.
//!
//! [`resolve`]: LocationResolver::resolve

use std::sync::Arc;

use svcmkt_core::{Coordinates, LocationInfo};

use crate::client::LocationClient;
use crate::error::{LocationError, LocationErrorCode};
use crate::platform::{PermissionStatus, PositionOptions, PositionSource};

/// One way of finding out where the user is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Device fix, followed by a best-effort reverse geocode.
    Device,
    /// Approximate location of the caller's IP address.
    Ip,
    /// Geocode a free-text address.
    Address(String),
}

impl Strategy {
    /// Device first, then IP lookup.
    #[must_use]
    pub fn default_chain() -> Vec<Strategy> {
        vec![Strategy::Device, Strategy::Ip]
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Device => write!(f, "device"),
            Strategy::Ip => write!(f, "ip"),
            Strategy::Address(_) => write!(f, "address"),
        }
    }
}

/// Outcome of a successful strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub strategy: Strategy,
    /// Absent when the winning lookup only knew an administrative area.
    pub coordinates: Option<Coordinates>,
    /// Absent when a device fix could not be reverse geocoded.
    pub info: Option<LocationInfo>,
}

#[derive(Debug)]
pub struct LocationResolver<S> {
    source: Arc<S>,
    client: LocationClient,
    options: PositionOptions,
}

impl<S: PositionSource> LocationResolver<S> {
    #[must_use]
    pub fn new(source: Arc<S>, client: LocationClient, options: PositionOptions) -> Self {
        Self {
            source,
            client,
            options,
        }
    }

    #[must_use]
    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    #[must_use]
    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    /// Single device fix, bounded by [`PositionOptions::timeout`].
    ///
    /// # Errors
    ///
    /// Returns the source's failure (permission denied, unavailable,
    /// timeout), a timeout error when the source does not answer in time,
    /// or the "not supported" error when the host has no positioning.
    pub async fn acquire_current_position(&self) -> Result<Coordinates, LocationError> {
        if !self.source.is_supported() {
            return Err(LocationError::unsupported());
        }

        let fix = self.source.current_position(&self.options);
        match tokio::time::timeout(self.options.timeout, fix).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(
                    timeout_secs = self.options.timeout.as_secs(),
                    "device position request timed out"
                );
                Err(LocationError::timeout())
            }
        }
    }

    /// # Errors
    ///
    /// Any transport or envelope failure, normalized to code `-1`.
    pub async fn acquire_from_ip(&self) -> Result<LocationInfo, LocationError> {
        self.client.ip_location().await.map_err(|e| {
            tracing::warn!(error = %e, "IP location lookup failed");
            LocationError::remote("Failed to get location from IP")
        })
    }

    /// Geocodes `address`. A blank address is not sent and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Any transport or envelope failure, normalized to code `-1`.
    pub async fn geocode_address(
        &self,
        address: &str,
    ) -> Result<Option<LocationInfo>, LocationError> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }

        self.client.geocode(address).await.map(Some).map_err(|e| {
            tracing::warn!(error = %e, address, "geocoding failed");
            LocationError::remote("Failed to geocode address")
        })
    }

    /// # Errors
    ///
    /// Any transport or envelope failure, normalized to code `-1`.
    pub async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<LocationInfo, LocationError> {
        self.client.reverse_geocode(coordinates).await.map_err(|e| {
            tracing::warn!(error = %e, %coordinates, "reverse geocoding failed");
            LocationError::remote("Failed to get address from coordinates")
        })
    }

    /// Never fails: a query error reads as [`PermissionStatus::Unsupported`].
    pub async fn check_permission_status(&self) -> PermissionStatus {
        match self.source.permission_status().await {
            Ok(status) => status,
            Err(e) => {
                tracing::debug!(error = %e, "permission query failed");
                PermissionStatus::Unsupported
            }
        }
    }

    /// Device fix plus an opportunistic reverse geocode. The reverse geocode
    /// failing leaves `info` empty but still counts as success.
    ///
    /// # Errors
    ///
    /// See [`LocationResolver::acquire_current_position`].
    pub async fn locate_device(&self) -> Result<Resolution, LocationError> {
        let fix = self.acquire_current_position().await?;

        let info = match self.reverse_geocode(fix).await {
            Ok(info) => Some(LocationInfo::resolved(fix, info.details().clone())),
            Err(e) => {
                tracing::warn!(error = %e, "keeping bare device position");
                None
            }
        };

        Ok(Resolution {
            strategy: Strategy::Device,
            coordinates: Some(fix),
            info,
        })
    }

    /// Runs a single strategy.
    ///
    /// # Errors
    ///
    /// The strategy's own failure. A blank [`Strategy::Address`] fails with
    /// code `-1` so a chain moves on to the next strategy.
    pub async fn attempt(&self, strategy: &Strategy) -> Result<Resolution, LocationError> {
        match strategy {
            Strategy::Device => self.locate_device().await,
            Strategy::Ip => {
                let info = self.acquire_from_ip().await?;
                Ok(Resolution {
                    strategy: Strategy::Ip,
                    coordinates: info.coordinates(),
                    info: Some(info),
                })
            }
            Strategy::Address(address) => {
                let info = self
                    .geocode_address(address)
                    .await?
                    .ok_or_else(|| LocationError::remote("No address to geocode"))?;
                Ok(Resolution {
                    strategy: strategy.clone(),
                    coordinates: info.coordinates(),
                    info: Some(info),
                })
            }
        }
    }

    /// Tries `strategies` in order and returns the first success.
    ///
    /// # Errors
    ///
    /// The last strategy's error when every strategy fails, or a code `-1`
    /// error when `strategies` is empty.
    pub async fn resolve(&self, strategies: &[Strategy]) -> Result<Resolution, LocationError> {
        self.resolve_with(strategies, |_, _| {}).await
    }

    /// Like [`LocationResolver::resolve`], calling `on_failure` for every
    /// strategy that fails before the chain moves on.
    ///
    /// # Errors
    ///
    /// See [`LocationResolver::resolve`].
    pub async fn resolve_with(
        &self,
        strategies: &[Strategy],
        mut on_failure: impl FnMut(&Strategy, &LocationError),
    ) -> Result<Resolution, LocationError> {
        let mut last_error = None;

        for strategy in strategies {
            match self.attempt(strategy).await {
                Ok(resolution) => {
                    tracing::info!(%strategy, "location resolved");
                    return Ok(resolution);
                }
                Err(e) => {
                    tracing::info!(%strategy, error = %e, "location strategy failed");
                    on_failure(strategy, &e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            LocationError::new(
                LocationErrorCode::Remote,
                "No location strategies configured",
            )
        }))
    }
}
