//! Shared fakes for the resolver and controller integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use svcmkt_core::Coordinates;
use svcmkt_location::{
    LocationClient, LocationError, LocationResolver, PermissionStatus, PositionOptions,
    PositionSink, PositionSource, WatchId,
};

/// A position source whose answers are set by the test and whose calls are
/// counted.
pub struct ScriptedSource {
    pub supported: bool,
    pub fix: Mutex<Result<Coordinates, LocationError>>,
    pub permission: Mutex<Result<PermissionStatus, LocationError>>,
    pub delay: Option<Duration>,
    pub current_calls: AtomicUsize,
    pub watch_calls: AtomicUsize,
    pub clear_calls: AtomicUsize,
    pub sinks: Mutex<Vec<PositionSink>>,
}

impl ScriptedSource {
    pub fn with_fix(fix: Result<Coordinates, LocationError>) -> Self {
        Self {
            supported: true,
            fix: Mutex::new(fix),
            permission: Mutex::new(Ok(PermissionStatus::Prompt)),
            delay: None,
            current_calls: AtomicUsize::new(0),
            watch_calls: AtomicUsize::new(0),
            clear_calls: AtomicUsize::new(0),
            sinks: Mutex::new(Vec::new()),
        }
    }

    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::with_fix(Ok(Coordinates::new(latitude, longitude).unwrap()))
    }

    pub fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::with_fix(Err(LocationError::unsupported()))
        }
    }

    pub fn set_permission(&self, permission: Result<PermissionStatus, LocationError>) {
        *self.permission.lock().unwrap() = permission;
    }

    /// Pushes an update through the most recent watch sink.
    pub fn emit(&self, update: Result<Coordinates, LocationError>) {
        let sinks = self.sinks.lock().unwrap();
        let sink = sinks.last().expect("no watch registered");
        sink.send(update).expect("watch receiver dropped");
    }

    pub fn current_calls(&self) -> usize {
        self.current_calls.load(Ordering::SeqCst)
    }

    pub fn watch_calls(&self) -> usize {
        self.watch_calls.load(Ordering::SeqCst)
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }
}

impl PositionSource for ScriptedSource {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, LocationError> {
        self.current_calls.fetch_add(1, Ordering::SeqCst);
        let fix = self.fix.lock().unwrap().clone();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        fix
    }

    fn watch_position(&self, _options: &PositionOptions, sink: PositionSink) -> WatchId {
        let n = self.watch_calls.fetch_add(1, Ordering::SeqCst);
        self.sinks.lock().unwrap().push(sink);
        WatchId(u64::try_from(n).unwrap() + 1)
    }

    fn clear_watch(&self, _id: WatchId) {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn permission_status(&self) -> Result<PermissionStatus, LocationError> {
        self.permission.lock().unwrap().clone()
    }
}

pub fn test_client(base_url: &str) -> LocationClient {
    LocationClient::new(base_url, 5, "svcmkt-test/0.1").expect("client construction should not fail")
}

pub fn resolver(source: &Arc<ScriptedSource>, base_url: &str) -> LocationResolver<ScriptedSource> {
    LocationResolver::new(
        Arc::clone(source),
        test_client(base_url),
        PositionOptions::default(),
    )
}

/// Polls `check` until it holds or roughly a second has passed.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
