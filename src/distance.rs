//! Road distance with a great-circle fallback.

use tracing::{debug, warn};

use crate::haversine::great_circle_km;
use crate::model::{Coordinates, DistanceSource};
use crate::polyline::Polyline;
use crate::traits::RouteProvider;

/// Result of measuring one consultant's trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TravelLeg {
    /// Empty when `source` is [`DistanceSource::GreatCircle`].
    pub path: Polyline,
    pub distance_km: f64,
    pub source: DistanceSource,
}

/// Asks the routing service first and falls back to a straight line when
/// it fails. The fallback only fires on a [`crate::error::RouteError`]; a
/// successful route is used as-is even when it is much longer.
#[derive(Debug, Clone)]
pub struct DistanceService<R> {
    router: R,
}

impl<R: RouteProvider> DistanceService<R> {
    pub fn new(router: R) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn distance(&self, origin: Coordinates, destination: Coordinates) -> TravelLeg {
        match self.router.route(origin, destination) {
            Ok(route) => {
                debug!(distance_km = route.distance_km, points = route.path.len(), "road route");
                TravelLeg {
                    path: route.path,
                    distance_km: route.distance_km,
                    source: DistanceSource::Road,
                }
            }
            Err(err) => {
                let distance_km = great_circle_km(origin, destination);
                warn!(error = %err, distance_km, "routing failed, using great-circle distance");
                TravelLeg {
                    path: Polyline::default(),
                    distance_km,
                    source: DistanceSource::GreatCircle,
                }
            }
        }
    }
}
