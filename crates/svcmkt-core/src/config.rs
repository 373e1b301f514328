use crate::app_config::{AppConfig, Environment};
use crate::geo::Coordinates;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(var, format!("expected a boolean, got '{raw}'"))),
        }
    };

    let parse_optional_f64 = |var: &str| -> Result<Option<f64>, ConfigError> {
        lookup(var)
            .ok()
            .map(|raw| {
                raw.trim()
                    .parse::<f64>()
                    .map_err(|e| invalid(var, e.to_string()))
            })
            .transpose()
    };

    let api_base_url = lookup("SVCMKT_API_BASE_URL").ok();
    if api_base_url
        .as_deref()
        .is_some_and(|url| url.trim().is_empty())
    {
        return Err(invalid(
            "SVCMKT_API_BASE_URL",
            "must not be empty".to_string(),
        ));
    }

    let env = parse_environment(&or_default("SVCMKT_ENV", "development"))?;
    let log_level = or_default("SVCMKT_LOG_LEVEL", "info");
    let catalog_path = PathBuf::from(or_default("SVCMKT_CATALOG_PATH", "./config/catalog.yaml"));

    let request_timeout_secs = parse_u64("SVCMKT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("SVCMKT_USER_AGENT", "svcmkt/0.1 (location)");

    let gps_timeout_secs = parse_u64("SVCMKT_GPS_TIMEOUT_SECS", "10")?;
    if gps_timeout_secs == 0 {
        return Err(invalid(
            "SVCMKT_GPS_TIMEOUT_SECS",
            "must be at least 1 second".to_string(),
        ));
    }
    let gps_max_age_secs = parse_u64("SVCMKT_GPS_MAX_AGE_SECS", "300")?;
    let gps_high_accuracy = parse_bool("SVCMKT_GPS_HIGH_ACCURACY", "true")?;

    let default_radius_km = or_default("SVCMKT_DEFAULT_RADIUS_KM", "25")
        .trim()
        .parse::<f64>()
        .map_err(|e| invalid("SVCMKT_DEFAULT_RADIUS_KM", e.to_string()))?;
    if !default_radius_km.is_finite() || default_radius_km <= 0.0 {
        return Err(invalid(
            "SVCMKT_DEFAULT_RADIUS_KM",
            format!("radius must be a positive number of kilometres, got {default_radius_km}"),
        ));
    }

    let manual_position = match (
        parse_optional_f64("SVCMKT_MANUAL_LAT")?,
        parse_optional_f64("SVCMKT_MANUAL_LON")?,
    ) {
        (Some(lat), Some(lon)) => Some(
            Coordinates::new(lat, lon).map_err(|e| invalid("SVCMKT_MANUAL_LAT", e.to_string()))?,
        ),
        (None, None) => None,
        (Some(_), None) => {
            return Err(invalid(
                "SVCMKT_MANUAL_LON",
                "must be set together with SVCMKT_MANUAL_LAT".to_string(),
            ))
        }
        (None, Some(_)) => {
            return Err(invalid(
                "SVCMKT_MANUAL_LAT",
                "must be set together with SVCMKT_MANUAL_LON".to_string(),
            ))
        }
    };

    let auto_request_location = parse_bool("SVCMKT_AUTO_REQUEST_LOCATION", "false")?;

    Ok(AppConfig {
        env,
        log_level,
        api_base_url,
        catalog_path,
        request_timeout_secs,
        user_agent,
        gps_timeout_secs,
        gps_max_age_secs,
        gps_high_accuracy,
        default_radius_km,
        manual_position,
        auto_request_location,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for anything other than
/// `development`, `test`, or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SVCMKT_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
