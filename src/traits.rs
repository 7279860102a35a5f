//! Seams between the pipeline and the outside world.
//!
//! These are intentionally minimal. The HTTP adapters in `nominatim` and
//! `osrm` implement them for production; tests script their own.

use std::time::Duration;

use crate::error::{GeocodeError, RouteError};
use crate::model::Coordinates;
use crate::polyline::Polyline;

/// Resolves free text to coordinates with a single outbound request.
///
/// `Ok(None)` means the service answered and found nothing. Retrying and
/// pacing are the resolver's business, not the geocoder's.
pub trait Geocoder: Send + Sync {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

/// A driving route between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: Polyline,
    pub distance_km: f64,
}

/// Requests a driving route with a single outbound request.
pub trait RouteProvider: Send + Sync {
    fn route(&self, origin: Coordinates, destination: Coordinates) -> Result<Route, RouteError>;
}

/// Blocks the current thread. Swapped out in tests so retries run instantly.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Sleeps for real.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Returns immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _duration: Duration) {}
}

impl<T: Geocoder + ?Sized> Geocoder for std::sync::Arc<T> {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        (**self).geocode(query)
    }
}

impl<T: RouteProvider + ?Sized> RouteProvider for std::sync::Arc<T> {
    fn route(&self, origin: Coordinates, destination: Coordinates) -> Result<Route, RouteError> {
        (**self).route(origin, destination)
    }
}
