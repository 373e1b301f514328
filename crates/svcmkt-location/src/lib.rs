//! Location resolution for the service marketplace.
//!
//! [`LocationClient`] talks to the marketplace location endpoints,
//! [`PositionSource`] abstracts the device, [`LocationResolver`] composes the
//! two into fallback chains and [`LocationController`] keeps the session's
//! location state.

pub mod client;
pub mod controller;
pub mod error;
pub mod platform;
pub mod resolver;
pub(crate) mod types;

pub use client::LocationClient;
pub use controller::{ControllerOptions, LocationController, LocationState};
pub use error::{ClientError, LocationError, LocationErrorCode};
pub use platform::{
    ConfiguredSource, FixedPositionSource, PermissionStatus, PositionOptions, PositionSink,
    PositionSource, UnsupportedPositionSource, WatchId,
};
pub use resolver::{LocationResolver, Resolution, Strategy};
