use std::path::PathBuf;

use crate::geo::Coordinates;
use crate::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    /// Base URL the `/services/location/*` endpoints hang off. Only commands
    /// that talk to those endpoints need it.
    pub api_base_url: Option<String>,
    pub catalog_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub gps_timeout_secs: u64,
    pub gps_max_age_secs: u64,
    pub gps_high_accuracy: bool,
    pub default_radius_km: f64,
    /// Fixed device position for hosts without a positioning device.
    pub manual_position: Option<Coordinates>,
    pub auto_request_location: bool,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `SVCMKT_API_BASE_URL` was
    /// not set.
    pub fn require_api_base_url(&self) -> Result<&str, ConfigError> {
        self.api_base_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("SVCMKT_API_BASE_URL".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("api_base_url", &self.api_base_url)
            .field("catalog_path", &self.catalog_path)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("gps_timeout_secs", &self.gps_timeout_secs)
            .field("gps_max_age_secs", &self.gps_max_age_secs)
            .field("gps_high_accuracy", &self.gps_high_accuracy)
            .field("default_radius_km", &self.default_radius_km)
            // Precise home coordinates stay out of logs.
            .field(
                "manual_position",
                &self.manual_position.as_ref().map(|_| "[redacted]"),
            )
            .field("auto_request_location", &self.auto_request_location)
            .finish()
    }
}
