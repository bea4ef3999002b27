//! Device location.
//!
//! Sessions never block on the geolocation service for longer than the
//! configured timeout. Failure kinds are kept apart because they call for
//! different user actions: a denied permission needs a settings change, a
//! timeout usually just needs another try.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use haven_core::clock::Clock;
use haven_core::errors::LocationError;
use haven_core::geo::{Coordinates, LocationFix};

/// Accuracy reported for fixes that come from a configured default point.
pub const FALLBACK_ACCURACY_METERS: f64 = 1_000.0;

/// Source of the device's current position.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_fix(&self) -> Result<LocationFix, LocationError>;
}

/// Ask `provider` for a fix, giving up after `timeout`.
///
/// # Errors
///
/// Returns whatever the provider reports, or [`LocationError::Timeout`] when
/// no fix arrived in time.
pub async fn acquire_fix<P>(provider: &P, timeout: Duration) -> Result<LocationFix, LocationError>
where
    P: LocationProvider + ?Sized,
{
    match tokio::time::timeout(timeout, provider.current_fix()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_secs = timeout.as_secs(), "location fix timed out");
            Err(LocationError::Timeout {
                after_secs: timeout.as_secs(),
            })
        }
    }
}

/// A fix supplied up front, e.g. from `--lat`/`--lng`.
#[derive(Debug, Clone, Copy)]
pub struct StaticProvider {
    fix: LocationFix,
}

impl StaticProvider {
    #[must_use]
    pub const fn new(fix: LocationFix) -> Self {
        Self { fix }
    }
}

#[async_trait]
impl LocationProvider for StaticProvider {
    async fn current_fix(&self) -> Result<LocationFix, LocationError> {
        if self.fix.coordinates().is_valid() {
            Ok(self.fix)
        } else {
            Err(LocationError::Unavailable(format!(
                "({}, {}) is not a valid coordinate",
                self.fix.lat, self.fix.lng
            )))
        }
    }
}

/// The configured default point, stamped with the current time.
#[derive(Debug, Clone)]
pub struct FallbackProvider {
    coordinates: Coordinates,
    clock: Arc<dyn Clock>,
}

impl FallbackProvider {
    #[must_use]
    pub fn new(coordinates: Coordinates, clock: Arc<dyn Clock>) -> Self {
        Self { coordinates, clock }
    }
}

#[async_trait]
impl LocationProvider for FallbackProvider {
    async fn current_fix(&self) -> Result<LocationFix, LocationError> {
        Ok(LocationFix {
            lat: self.coordinates.lat,
            lng: self.coordinates.lng,
            accuracy_meters: FALLBACK_ACCURACY_METERS,
            captured_at: self.clock.now(),
        })
    }
}

/// Stands in for a device without location access.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProvider;

#[async_trait]
impl LocationProvider for NoProvider {
    async fn current_fix(&self) -> Result<LocationFix, LocationError> {
        Err(LocationError::PermissionDenied)
    }
}
