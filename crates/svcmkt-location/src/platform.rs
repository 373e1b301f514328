//! The device positioning seam.
//!
//! [`PositionSource`] abstracts whatever the host offers for one-shot fixes,
//! continuous watches and permission queries. Two implementations ship with
//! the crate: [`FixedPositionSource`] for hosts configured with a manual
//! position and [`UnsupportedPositionSource`] for hosts with no positioning
//! at all. [`ConfiguredSource`] picks between them from [`AppConfig`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use svcmkt_core::{AppConfig, Coordinates};
use tokio::sync::mpsc;

use crate::error::LocationError;

/// Options passed to every position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    /// How long a single fix may take before it fails with a timeout.
    pub timeout: Duration,
    /// Oldest cached fix the source may return instead of a fresh one.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::from_secs(300),
        }
    }
}

impl PositionOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            enable_high_accuracy: config.gps_high_accuracy,
            timeout: Duration::from_secs(config.gps_timeout_secs),
            maximum_age: Duration::from_secs(config.gps_max_age_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionStatus {
    Granted,
    Denied,
    #[default]
    Prompt,
    Unsupported,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::Prompt => write!(f, "prompt"),
            PermissionStatus::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Handle for an active watch, returned by [`PositionSource::watch_position`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Channel a source pushes watch updates into.
pub type PositionSink = mpsc::UnboundedSender<Result<Coordinates, LocationError>>;

pub trait PositionSource: Send + Sync + 'static {
    /// `false` when the host has no positioning capability at all.
    fn is_supported(&self) -> bool;

    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<Coordinates, LocationError>> + Send;

    /// Starts pushing fixes (or failures) into `sink` until
    /// [`clear_watch`](PositionSource::clear_watch) is called with the
    /// returned id.
    fn watch_position(&self, options: &PositionOptions, sink: PositionSink) -> WatchId;

    fn clear_watch(&self, id: WatchId);

    /// Queries the host permission system. Hosts without one report
    /// `Ok(PermissionStatus::Unsupported)`.
    fn permission_status(
        &self,
    ) -> impl Future<Output = Result<PermissionStatus, LocationError>> + Send;
}

/// Reports one configured position, for hosts without positioning hardware.
#[derive(Debug)]
pub struct FixedPositionSource {
    position: Coordinates,
    next_watch: AtomicU64,
}

impl FixedPositionSource {
    #[must_use]
    pub fn new(position: Coordinates) -> Self {
        Self {
            position,
            next_watch: AtomicU64::new(1),
        }
    }
}

impl PositionSource for FixedPositionSource {
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        Ok(self.position)
    }

    fn watch_position(&self, _options: &PositionOptions, sink: PositionSink) -> WatchId {
        let id = WatchId(self.next_watch.fetch_add(1, Ordering::Relaxed));
        // The position never moves, so a single update is the whole stream.
        if sink.send(Ok(self.position)).is_err() {
            tracing::debug!(watch_id = id.0, "watch receiver dropped before first fix");
        }
        id
    }

    fn clear_watch(&self, id: WatchId) {
        tracing::debug!(watch_id = id.0, "cleared fixed-position watch");
    }

    async fn permission_status(&self) -> Result<PermissionStatus, LocationError> {
        Ok(PermissionStatus::Granted)
    }
}

/// A host with no positioning capability.
#[derive(Debug, Default)]
pub struct UnsupportedPositionSource;

impl PositionSource for UnsupportedPositionSource {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        Err(LocationError::unsupported())
    }

    fn watch_position(&self, _options: &PositionOptions, sink: PositionSink) -> WatchId {
        if sink.send(Err(LocationError::unsupported())).is_err() {
            tracing::debug!("watch receiver dropped before unsupported notice");
        }
        WatchId(0)
    }

    fn clear_watch(&self, _id: WatchId) {}

    async fn permission_status(&self) -> Result<PermissionStatus, LocationError> {
        Ok(PermissionStatus::Unsupported)
    }
}

/// The source chosen from configuration: a manual position when one is
/// configured, otherwise no positioning.
#[derive(Debug)]
pub enum ConfiguredSource {
    Fixed(FixedPositionSource),
    Unsupported(UnsupportedPositionSource),
}

impl ConfiguredSource {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        match config.manual_position {
            Some(position) => Self::Fixed(FixedPositionSource::new(position)),
            None => Self::Unsupported(UnsupportedPositionSource),
        }
    }
}

impl PositionSource for ConfiguredSource {
    fn is_supported(&self) -> bool {
        match self {
            Self::Fixed(source) => source.is_supported(),
            Self::Unsupported(source) => source.is_supported(),
        }
    }

    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        match self {
            Self::Fixed(source) => source.current_position(options).await,
            Self::Unsupported(source) => source.current_position(options).await,
        }
    }

    fn watch_position(&self, options: &PositionOptions, sink: PositionSink) -> WatchId {
        match self {
            Self::Fixed(source) => source.watch_position(options, sink),
            Self::Unsupported(source) => source.watch_position(options, sink),
        }
    }

    fn clear_watch(&self, id: WatchId) {
        match self {
            Self::Fixed(source) => source.clear_watch(id),
            Self::Unsupported(source) => source.clear_watch(id),
        }
    }

    async fn permission_status(&self) -> Result<PermissionStatus, LocationError> {
        match self {
            Self::Fixed(source) => source.permission_status().await,
            Self::Unsupported(source) => source.permission_status().await,
        }
    }
}
