//! Nominatim HTTP adapter for geocoding.

use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

use crate::config::GeocoderConfig;
use crate::error::GeocodeError;
use crate::model::Coordinates;
use crate::traits::Geocoder;

/// Blocking client for a Nominatim-compatible `/search` endpoint.
///
/// Nominatim's usage policy asks for an identifying User-Agent; every
/// client carries its own token, so build a fresh one per run.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    config: GeocoderConfig,
    user_agent: String,
    client: reqwest::blocking::Client,
}

impl NominatimClient {
    /// Builds a client with a newly minted run token.
    pub fn for_run(config: GeocoderConfig) -> Result<Self, reqwest::Error> {
        let user_agent = format!("{}_{}", config.user_agent_prefix, Uuid::now_v7().simple());
        Self::with_user_agent(config, user_agent)
    }

    pub fn with_user_agent(
        config: GeocoderConfig,
        user_agent: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let user_agent = user_agent.into();
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(user_agent.clone())
            .build()?;

        Ok(Self {
            config,
            user_agent,
            client,
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }
}

impl Geocoder for NominatimClient {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let mut params = vec![("q", query), ("format", "jsonv2"), ("limit", "1")];
        if let Some(codes) = self.config.country_codes.as_deref() {
            params.push(("countrycodes", codes));
        }

        let places = self
            .client
            .get(self.search_url())
            .query(&params)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<Vec<NominatimPlace>>())?;

        best_match(&places)
    }
}

/// One search hit. Nominatim encodes coordinates as strings.
#[derive(Debug, Deserialize)]
pub(crate) struct NominatimPlace {
    lat: String,
    lon: String,
}

pub(crate) fn best_match(places: &[NominatimPlace]) -> Result<Option<Coordinates>, GeocodeError> {
    let Some(first) = places.first() else {
        return Ok(None);
    };

    let lat = parse_degrees(&first.lat, 90.0)
        .ok_or_else(|| GeocodeError::Rejected(format!("bad latitude {:?}", first.lat)))?;
    let lng = parse_degrees(&first.lon, 180.0)
        .ok_or_else(|| GeocodeError::Rejected(format!("bad longitude {:?}", first.lon)))?;

    Ok(Some(Coordinates::new(lat, lng)))
}

/// Finite decimal degrees within `±limit`. `f64::from_str` accepts "NaN" and "inf".
fn parse_degrees(raw: &str, limit: f64) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.abs() <= limit)
}
