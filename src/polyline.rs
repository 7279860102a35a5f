//! Route geometry.
//!
//! Routing services speak GeoJSON, which orders each pair as
//! `[longitude, latitude]`. Map consumers want latitude first, so the
//! transposition happens once, here, when a route enters the crate.

use serde::{Deserialize, Serialize};

use crate::model::Coordinates;

/// A route geometry as an ordered sequence of latitude/longitude points.
///
/// Empty when only a straight-line distance is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Coordinates>,
}

impl Polyline {
    pub fn new(points: Vec<Coordinates>) -> Self {
        Self { points }
    }

    /// Builds a polyline from GeoJSON `[lng, lat]` positions.
    ///
    /// Positions with fewer than two components are dropped.
    pub fn from_lng_lat(positions: &[Vec<f64>]) -> Self {
        let points = positions
            .iter()
            .filter_map(|position| match position.as_slice() {
                [lng, lat, ..] => Some(Coordinates::new(*lat, *lng)),
                _ => None,
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[Coordinates] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Points as `(lat, lng)` tuples, ready for a map line layer.
    pub fn to_lat_lng(&self) -> Vec<(f64, f64)> {
        self.points.iter().map(Coordinates::as_tuple).collect()
    }
}
