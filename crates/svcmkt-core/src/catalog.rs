use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::Coordinates;
use crate::ConfigError;

/// A bookable service offered on the marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListing {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub provider_name: String,
    pub category: String,
    /// Listing lifecycle, e.g. `"active"`, `"paused"`, `"pending"`.
    pub status: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Price as a decimal string, e.g. `"120.00"`.
    pub price: Decimal,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// A provider's public profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub category: String,
    /// Approval state, e.g. `"approved"`, `"pending"`, `"rejected"`.
    pub status: String,
    #[serde(default)]
    pub hourly_rate: Option<Decimal>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub review_count: u32,
    pub joined_at: DateTime<Utc>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// How far from `coordinates` the provider is willing to travel.
    #[serde(default)]
    pub service_radius_km: Option<f64>,
}

impl ProviderProfile {
    /// Returns `true` when `point` lies inside the provider's own service
    /// area. Providers without a position or radius serve nowhere.
    #[must_use]
    pub fn serves(&self, point: &Coordinates) -> bool {
        match (self.coordinates, self.service_radius_km) {
            (Some(home), Some(radius)) => crate::geo::is_within_radius(&home, point, radius),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub services: Vec<ServiceListing>,
    #[serde(default)]
    pub providers: Vec<ProviderProfile>,
}

/// Load and validate a catalog from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_catalog(path: &Path) -> Result<Catalog, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::CatalogFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_catalog(&content)
}

/// Parse and validate catalog YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_catalog(content: &str) -> Result<Catalog, ConfigError> {
    let catalog: Catalog = serde_yaml::from_str(content)?;
    validate_catalog(&catalog)?;
    Ok(catalog)
}

fn validate_catalog(catalog: &Catalog) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for service in &catalog.services {
        if service.title.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "service {} has an empty title",
                service.id
            )));
        }
        if !seen_ids.insert(service.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate id {} (service '{}')",
                service.id, service.title
            )));
        }
        if service.price.is_sign_negative() {
            return Err(ConfigError::Validation(format!(
                "service '{}' has negative price {}",
                service.title, service.price
            )));
        }
        validate_rating(&service.title, service.rating)?;
        validate_position(&service.title, service.coordinates)?;
    }

    for provider in &catalog.providers {
        if provider.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "provider {} has an empty name",
                provider.id
            )));
        }
        if !seen_ids.insert(provider.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate id {} (provider '{}')",
                provider.id, provider.name
            )));
        }
        if provider.hourly_rate.is_some_and(|rate| rate.is_sign_negative()) {
            return Err(ConfigError::Validation(format!(
                "provider '{}' has a negative hourly rate",
                provider.name
            )));
        }
        if provider
            .service_radius_km
            .is_some_and(|radius| !radius.is_finite() || radius < 0.0)
        {
            return Err(ConfigError::Validation(format!(
                "provider '{}' has an invalid service radius",
                provider.name
            )));
        }
        validate_rating(&provider.name, provider.rating)?;
        validate_position(&provider.name, provider.coordinates)?;
    }

    Ok(())
}

fn validate_rating(label: &str, rating: f64) -> Result<(), ConfigError> {
    if (0.0..=5.0).contains(&rating) {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "'{label}' has rating {rating}; must be between 0 and 5"
        )))
    }
}

fn validate_position(label: &str, coordinates: Option<Coordinates>) -> Result<(), ConfigError> {
    match coordinates {
        Some(c) => Coordinates::new(c.latitude, c.longitude)
            .map(|_| ())
            .map_err(|e| ConfigError::Validation(format!("'{label}' has {e}"))),
        None => Ok(()),
    }
}
