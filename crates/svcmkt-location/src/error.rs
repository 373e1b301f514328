use thiserror::Error;

/// Transport-level failures from the location endpoints.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure, or a non-2xx status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The body was not the expected `{ success, data }` envelope, or `data`
    /// was not a valid location record.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The endpoint answered with `"success": false` or without a payload.
    #[error("{endpoint} reported failure: {message}")]
    Unsuccessful { endpoint: String, message: String },

    #[error("invalid base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },

    #[error("configuration error: {0}")]
    Config(#[from] svcmkt_core::ConfigError),
}

/// Failure classes surfaced to whoever displays location state.
///
/// The numeric codes follow the browser geolocation taxonomy, with `-1` for
/// anything that went wrong talking to a remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    Remote,
}

impl LocationErrorCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            LocationErrorCode::PermissionDenied => 1,
            LocationErrorCode::PositionUnavailable => 2,
            LocationErrorCode::Timeout => 3,
            LocationErrorCode::Remote => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {})", .kind.as_i32())]
pub struct LocationError {
    pub kind: LocationErrorCode,
    pub message: String,
}

impl LocationError {
    pub fn new(kind: LocationErrorCode, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> i32 {
        self.kind.as_i32()
    }

    #[must_use]
    pub fn permission_denied() -> Self {
        Self::new(
            LocationErrorCode::PermissionDenied,
            "Location access denied by user",
        )
    }

    #[must_use]
    pub fn position_unavailable() -> Self {
        Self::new(
            LocationErrorCode::PositionUnavailable,
            "Location information is unavailable",
        )
    }

    #[must_use]
    pub fn timeout() -> Self {
        Self::new(LocationErrorCode::Timeout, "Location request timed out")
    }

    #[must_use]
    pub fn unsupported() -> Self {
        Self::new(
            LocationErrorCode::PositionUnavailable,
            "Geolocation is not supported by this device",
        )
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(LocationErrorCode::Remote, message)
    }

    /// Wraps a failure reported through a continuous watch.
    #[must_use]
    pub fn watch(inner: &LocationError) -> Self {
        Self::new(
            inner.kind,
            format!("Watch position error: {}", inner.message),
        )
    }
}
