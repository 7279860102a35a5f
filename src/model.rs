//! Roster and pipeline data types.

use serde::{Deserialize, Serialize};

use crate::polyline::Polyline;

/// Distance stamped on records whose origin could not be resolved.
pub const UNRESOLVED_DISTANCE_KM: f64 = 9999.0;

/// Records at or above this distance are never ranked.
pub const ROUTABLE_LIMIT_KM: f64 = 9000.0;

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// `(lat, lng)` tuple, the shape map widgets usually want.
    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Outcome of resolving one place name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    Found(Coordinates),
    Unresolved,
}

impl Resolution {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Resolution::Found(coords) => Some(*coords),
            Resolution::Unresolved => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

impl From<Option<Coordinates>> for Resolution {
    fn from(value: Option<Coordinates>) -> Self {
        value.map_or(Resolution::Unresolved, Resolution::Found)
    }
}

/// A field consultant as handed over by the ingestion layer.
///
/// `occupancy` is a workload percentage already normalized to 0-100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consultant {
    pub name: String,
    pub home: String,
    pub occupancy: f64,
}

impl Consultant {
    pub fn new(name: impl Into<String>, home: impl Into<String>, occupancy: f64) -> Self {
        Self {
            name: name.into(),
            home: home.into(),
            occupancy,
        }
    }

    /// Home location text, or `None` for blanks and spreadsheet `nan` cells.
    pub fn home_place(&self) -> Option<&str> {
        let home = self.home.trim();
        if home.is_empty() || home.eq_ignore_ascii_case("nan") {
            None
        } else {
            Some(home)
        }
    }
}

/// Where a record's distance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceSource {
    /// Length of a driving route from the routing service.
    Road,
    /// Straight-line fallback; the routing service was unavailable.
    GreatCircle,
    /// Origin never resolved; distance is the sentinel.
    Unresolved,
}

/// A consultant annotated by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsultantRecord {
    pub consultant: Consultant,
    pub origin: Option<Coordinates>,
    pub distance_km: f64,
    pub path: Polyline,
    pub source: DistanceSource,
}

impl ConsultantRecord {
    /// A record that has not been (or could not be) placed on the map.
    pub fn unresolved(consultant: Consultant) -> Self {
        Self {
            consultant,
            origin: None,
            distance_km: UNRESOLVED_DISTANCE_KM,
            path: Polyline::default(),
            source: DistanceSource::Unresolved,
        }
    }

    pub fn name(&self) -> &str {
        &self.consultant.name
    }

    pub fn occupancy(&self) -> f64 {
        self.consultant.occupancy
    }

    /// True when the record may take part in ranking.
    pub fn is_routable(&self) -> bool {
        self.origin.is_some() && self.distance_km < ROUTABLE_LIMIT_KM
    }
}
