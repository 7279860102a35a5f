//! OSRM HTTP adapter for driving routes.

use serde::Deserialize;

use crate::config::RouterConfig;
use crate::error::RouteError;
use crate::model::Coordinates;
use crate::polyline::Polyline;
use crate::traits::{Route, RouteProvider};

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: RouterConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: RouterConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn route_url(&self, origin: Coordinates, destination: Coordinates) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            origin.lng,
            origin.lat,
            destination.lng,
            destination.lat,
        )
    }
}

impl RouteProvider for OsrmClient {
    fn route(&self, origin: Coordinates, destination: Coordinates) -> Result<Route, RouteError> {
        let body = self
            .client
            .get(self.route_url(origin, destination))
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmRouteResponse>())?;

        body.into_route()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    geometry: OsrmGeometry,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<Vec<f64>>,
}

impl OsrmRouteResponse {
    pub(crate) fn into_route(self) -> Result<Route, RouteError> {
        if self.code != "Ok" {
            let detail = match self.message {
                Some(message) => format!("{}: {}", self.code, message),
                None => self.code,
            };
            return Err(RouteError::Status(detail));
        }

        let route = self.routes.into_iter().next().ok_or(RouteError::NoRoute)?;
        if !route.distance.is_finite() || route.distance < 0.0 {
            return Err(RouteError::Malformed(format!("distance {}", route.distance)));
        }

        Ok(Route {
            path: Polyline::from_lng_lat(&route.geometry.coordinates),
            distance_km: route.distance / 1000.0,
        })
    }
}
