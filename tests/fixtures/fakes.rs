//! Scripted stand-ins for the geocoding and routing services.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use consultant_dispatch::config::DispatchConfig;
use consultant_dispatch::error::{GeocodeError, RouteError};
use consultant_dispatch::haversine::great_circle_km;
use consultant_dispatch::polyline::Polyline;
use consultant_dispatch::traits::{Geocoder, NoSleep, Route, RouteProvider};
use consultant_dispatch::{CancelToken, Coordinates, Dispatcher};
use parking_lot::Mutex;

use super::rio_grande_do_sul::{CITIES, City};

/// Config with pacing and backoff pauses removed.
pub fn quiet_config() -> DispatchConfig {
    let mut config = DispatchConfig::default();
    config.geocoder.min_interval_ms = 0;
    config.geocoder.retry_delay_ms = 0;
    config
}

/// Wires fakes into a dispatcher that never sleeps.
pub fn dispatcher(
    geocoder: &Arc<FakeGeocoder>,
    router: &Arc<FakeRouter>,
    config: &DispatchConfig,
) -> Dispatcher<Arc<FakeGeocoder>, Arc<FakeRouter>> {
    Dispatcher::new(Arc::clone(geocoder), Arc::clone(router), config)
        .expect("build dispatcher")
        .with_sleeper(Arc::new(NoSleep))
}

/// Geocoder answering from a fixed table keyed by the qualified query.
///
/// Lookups are case-insensitive. Unknown queries find nothing.
#[derive(Default)]
pub struct FakeGeocoder {
    places: HashMap<String, Coordinates>,
    /// Remaining transient failures per query.
    flaky: Mutex<HashMap<String, u32>>,
    /// Cancelled on the first transient failure, like a user giving up.
    cancel_on_failure: Option<CancelToken>,
    calls: Mutex<Vec<(String, Instant)>>,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Knows every fixture city under `"<city>, RS, Brasil"`.
    pub fn with_fixture_cities() -> Self {
        CITIES
            .iter()
            .fold(Self::new(), |geocoder, city| geocoder.city(city))
    }

    pub fn city(self, city: &City) -> Self {
        self.place(&format!("{}, RS, Brasil", city.name), city.coords())
    }

    pub fn place(mut self, query: &str, coords: Coordinates) -> Self {
        self.places.insert(query.to_lowercase(), coords);
        self
    }

    /// Fails the query `failures` times with a transient error first.
    pub fn flaky(self, query: &str, failures: u32) -> Self {
        self.flaky.lock().insert(query.to_lowercase(), failures);
        self
    }

    pub fn cancel_on_failure(mut self, token: &CancelToken) -> Self {
        self.cancel_on_failure = Some(token.clone());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(query, _)| query.clone()).collect()
    }

    /// When each request arrived, in arrival order.
    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().iter().map(|(_, at)| *at).collect()
    }

    pub fn calls_for(&self, query: &str) -> usize {
        let query = query.to_lowercase();
        self.calls
            .lock()
            .iter()
            .filter(|(call, _)| call.to_lowercase() == query)
            .count()
    }
}

impl Geocoder for FakeGeocoder {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        self.calls.lock().push((query.to_string(), Instant::now()));
        let key = query.to_lowercase();

        if let Some(remaining) = self.flaky.lock().get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                if let Some(token) = &self.cancel_on_failure {
                    token.cancel();
                }
                return Err(GeocodeError::Transient("simulated timeout".into()));
            }
        }

        Ok(self.places.get(&key).copied())
    }
}

/// Router returning scripted distances per origin.
///
/// Unscripted origins get 1.3x the straight-line distance. A failing
/// router rejects every request, as an unreachable service would.
#[derive(Default)]
pub struct FakeRouter {
    distances: Vec<(Coordinates, f64)>,
    failing: bool,
    calls: Mutex<Vec<(Coordinates, Coordinates)>>,
}

impl FakeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn distance_from(mut self, origin: Coordinates, km: f64) -> Self {
        self.distances.push((origin, km));
        self
    }

    pub fn calls(&self) -> Vec<(Coordinates, Coordinates)> {
        self.calls.lock().clone()
    }
}

impl RouteProvider for FakeRouter {
    fn route(&self, origin: Coordinates, destination: Coordinates) -> Result<Route, RouteError> {
        self.calls.lock().push((origin, destination));
        if self.failing {
            return Err(RouteError::Status("simulated network error".into()));
        }

        let distance_km = self
            .distances
            .iter()
            .find(|(scripted, _)| *scripted == origin)
            .map(|(_, km)| *km)
            .unwrap_or_else(|| great_circle_km(origin, destination) * 1.3);

        Ok(Route {
            path: Polyline::new(vec![origin, destination]),
            distance_km,
        })
    }
}
