//! Location state controller.
//!
//! Owns the session's location state (position, resolved address, loading
//! flag, last error, permission status) and drives the resolver on behalf of
//! whatever presents that state. Every acquisition captures its failure into
//! [`LocationState::error`] as well as returning it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use svcmkt_core::{AppConfig, Coordinates, LocationInfo};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{LocationError, LocationErrorCode};
use crate::platform::{PermissionStatus, PositionSource, WatchId};
use crate::resolver::{LocationResolver, Resolution, Strategy};

/// Snapshot of the controller state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationState {
    pub coordinates: Option<Coordinates>,
    pub location_info: Option<LocationInfo>,
    pub loading: bool,
    pub error: Option<LocationError>,
    pub permission_status: PermissionStatus,
    pub watching: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Acquire a device fix as soon as permission becomes granted.
    pub auto_request: bool,
}

impl ControllerOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            auto_request: config.auto_request_location,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    state: LocationState,
    in_flight: usize,
}

#[derive(Debug)]
struct Shared {
    inner: Mutex<Inner>,
    /// Cleared on teardown; late results are dropped once this is false.
    active: AtomicBool,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `f` unless the controller has been torn down.
    fn update(&self, f: impl FnOnce(&mut LocationState)) -> bool {
        if !self.active.load(Ordering::Acquire) {
            tracing::debug!("discarding location update after teardown");
            return false;
        }
        f(&mut self.lock().state);
        true
    }
}

/// Holds `loading` up while at least one acquisition is pending. After
/// teardown the call is still counted but the state is left alone.
struct LoadingGuard<'a> {
    shared: &'a Shared,
}

impl<'a> LoadingGuard<'a> {
    fn enter(shared: &'a Shared) -> Self {
        shared.lock().in_flight += 1;
        shared.update(|state| {
            state.loading = true;
            state.error = None;
        });
        Self { shared }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        if inner.in_flight == 0 {
            inner.state.loading = false;
        }
    }
}

/// A live platform watch. Dropping it stops forwarding updates and clears
/// the platform watch.
struct WatchSubscription<S: PositionSource> {
    source: Arc<S>,
    id: WatchId,
    task: JoinHandle<()>,
}

impl<S: PositionSource> Drop for WatchSubscription<S> {
    fn drop(&mut self) {
        self.task.abort();
        self.source.clear_watch(self.id);
        tracing::debug!(watch_id = self.id.0, "position watch cleared");
    }
}

pub struct LocationController<S: PositionSource> {
    resolver: LocationResolver<S>,
    options: ControllerOptions,
    shared: Arc<Shared>,
    watch: Mutex<Option<WatchSubscription<S>>>,
}

impl<S: PositionSource> std::fmt::Debug for LocationController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationController")
            .field("options", &self.options)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<S: PositionSource> LocationController<S> {
    #[must_use]
    pub fn new(resolver: LocationResolver<S>, options: ControllerOptions) -> Self {
        Self {
            resolver,
            options,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                active: AtomicBool::new(true),
            }),
            watch: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn resolver(&self) -> &LocationResolver<S> {
        &self.resolver
    }

    #[must_use]
    pub fn state(&self) -> LocationState {
        self.shared.lock().state.clone()
    }

    /// Activates the controller and queries permission once. Callers that
    /// must not wait on the query can spawn this.
    pub async fn mount(&self) -> PermissionStatus {
        self.shared.active.store(true, Ordering::Release);
        self.refresh_permission().await
    }

    /// Re-queries the permission status. With `auto_request` set, a
    /// transition into [`PermissionStatus::Granted`] triggers one device fix;
    /// re-checks that stay granted do not.
    pub async fn refresh_permission(&self) -> PermissionStatus {
        let status = self.resolver.check_permission_status().await;

        let mut previous = None;
        self.shared.update(|state| {
            previous = Some(state.permission_status);
            state.permission_status = status;
        });

        let entered_granted = status == PermissionStatus::Granted
            && previous.is_some_and(|prev| prev != PermissionStatus::Granted);
        if self.options.auto_request && entered_granted {
            tracing::debug!("permission granted, requesting device position");
            // Failure is already captured in state.
            let _ = self.get_current_location().await;
        }

        status
    }

    /// Device fix with opportunistic reverse geocoding.
    ///
    /// # Errors
    ///
    /// The acquisition failure, also stored in [`LocationState::error`]. A
    /// permission failure additionally marks the permission as denied.
    pub async fn get_current_location(&self) -> Result<Resolution, LocationError> {
        let _loading = LoadingGuard::enter(&self.shared);
        let result = self.resolver.locate_device().await;
        self.record(&result);
        result
    }

    /// # Errors
    ///
    /// The normalized remote failure, also stored in [`LocationState::error`].
    pub async fn get_location_from_ip(&self) -> Result<LocationInfo, LocationError> {
        let _loading = LoadingGuard::enter(&self.shared);
        let result = self.resolver.acquire_from_ip().await;
        match &result {
            Ok(info) => self.record_info(info),
            Err(e) => self.record_error(e),
        }
        result
    }

    /// Geocodes `address`. A blank address leaves the state untouched and
    /// returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// The normalized remote failure, also stored in [`LocationState::error`].
    pub async fn geocode_address(
        &self,
        address: &str,
    ) -> Result<Option<LocationInfo>, LocationError> {
        if address.trim().is_empty() {
            return Ok(None);
        }

        let _loading = LoadingGuard::enter(&self.shared);
        let result = self.resolver.geocode_address(address).await;
        match &result {
            Ok(Some(info)) => self.record_info(info),
            Ok(None) => {}
            Err(e) => self.record_error(e),
        }
        result
    }

    /// # Errors
    ///
    /// The normalized remote failure, also stored in [`LocationState::error`].
    pub async fn reverse_geocode(
        &self,
        coordinates: Coordinates,
    ) -> Result<LocationInfo, LocationError> {
        let _loading = LoadingGuard::enter(&self.shared);
        let result = self
            .resolver
            .reverse_geocode(coordinates)
            .await
            .map(|info| LocationInfo::resolved(coordinates, info.details().clone()));
        match &result {
            Ok(info) => self.record_info(info),
            Err(e) => self.record_error(e),
        }
        result
    }

    /// Runs [`Strategy::default_chain`].
    ///
    /// # Errors
    ///
    /// See [`LocationController::locate_with`].
    pub async fn locate(&self) -> Result<Resolution, LocationError> {
        self.locate_with(&Strategy::default_chain()).await
    }

    /// Tries `strategies` in order and records the first success. A denied
    /// device attempt marks the permission as denied even when a later
    /// strategy succeeds.
    ///
    /// # Errors
    ///
    /// The last strategy's failure, also stored in [`LocationState::error`].
    pub async fn locate_with(&self, strategies: &[Strategy]) -> Result<Resolution, LocationError> {
        let _loading = LoadingGuard::enter(&self.shared);

        let result = self
            .resolver
            .resolve_with(strategies, |_, e| {
                if e.kind == LocationErrorCode::PermissionDenied {
                    self.shared.update(|state| {
                        state.permission_status = PermissionStatus::Denied;
                    });
                }
            })
            .await;
        self.record(&result);
        result
    }

    /// Starts continuous tracking. Each fix replaces the coordinates and
    /// clears the error; each failure replaces the error only. Calling this
    /// while already watching does nothing.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start_watching(&self) {
        let mut watch = self.watch_slot();
        if watch.is_some() {
            return;
        }

        let source = Arc::clone(self.resolver.source());
        if !source.is_supported() {
            self.record_error(&LocationError::unsupported());
            return;
        }

        let (sink, mut updates) = mpsc::unbounded_channel();
        let id = source.watch_position(self.resolver.options(), sink);

        let shared = Arc::clone(&self.shared);
        let task = tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                shared.update(|state| match update {
                    Ok(coordinates) => {
                        state.coordinates = Some(coordinates);
                        state.error = None;
                    }
                    Err(e) => state.error = Some(LocationError::watch(&e)),
                });
            }
        });

        tracing::debug!(watch_id = id.0, "position watch started");
        *watch = Some(WatchSubscription { source, id, task });
        self.shared.update(|state| state.watching = true);
    }

    pub fn stop_watching(&self) {
        let subscription = self.watch_slot().take();
        if subscription.is_some() {
            drop(subscription);
            self.shared.lock().state.watching = false;
        }
    }

    /// Forgets the position, address and error, and stops any watch.
    pub fn clear_location(&self) {
        self.stop_watching();
        self.shared.update(|state| {
            state.coordinates = None;
            state.location_info = None;
            state.error = None;
        });
    }

    pub fn clear_error(&self) {
        self.shared.update(|state| state.error = None);
    }

    /// Stops any watch and discards results of acquisitions still pending.
    pub fn teardown(&self) {
        self.shared.active.store(false, Ordering::Release);
        self.stop_watching();
    }

    fn watch_slot(&self) -> MutexGuard<'_, Option<WatchSubscription<S>>> {
        self.watch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, result: &Result<Resolution, LocationError>) {
        match result {
            Ok(resolution) => {
                self.shared.update(|state| {
                    state.coordinates = resolution.coordinates;
                    state.location_info.clone_from(&resolution.info);
                    state.error = None;
                });
            }
            Err(e) => self.record_error(e),
        }
    }

    fn record_info(&self, info: &LocationInfo) {
        self.shared.update(|state| {
            state.coordinates = info.coordinates();
            state.location_info = Some(info.clone());
            state.error = None;
        });
    }

    fn record_error(&self, error: &LocationError) {
        self.shared.update(|state| {
            if error.kind == LocationErrorCode::PermissionDenied {
                state.permission_status = PermissionStatus::Denied;
            }
            state.error = Some(error.clone());
        });
    }
}
