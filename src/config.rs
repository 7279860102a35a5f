//! Pipeline configuration.
//!
//! Every section has defaults matching the public OpenStreetMap services,
//! so a TOML file only needs the values it wants to change:
//!
//! ```toml
//! [geocoder]
//! base_url = "http://localhost:8080"
//! min_interval_ms = 0
//!
//! [query]
//! region_suffix = "SC, Brasil"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::resolver::{Backoff, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffMode {
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Prefix of the per-run User-Agent token.
    pub user_agent_prefix: String,
    /// Minimum spacing between any two outbound geocoding requests.
    pub min_interval_ms: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub backoff: BackoffMode,
    /// Optional ISO 3166-1 alpha-2 filter, e.g. "br".
    pub country_codes: Option<String>,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            timeout_secs: 10,
            user_agent_prefix: "consultant_dispatch".to_string(),
            min_interval_ms: 1100,
            max_attempts: 3,
            retry_delay_ms: 2000,
            backoff: BackoffMode::Fixed,
            country_codes: None,
        }
    }
}

impl GeocoderConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::from_millis(self.retry_delay_ms);
        let backoff = match self.backoff {
            BackoffMode::Fixed => Backoff::Fixed(delay),
            BackoffMode::Exponential => Backoff::Exponential {
                base: delay,
                max: delay.saturating_mul(8),
            },
        };
        RetryPolicy::new(self.max_attempts, backoff)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_url: "http://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Appended to every place name before geocoding.
    pub region_suffix: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            region_suffix: "RS, Brasil".to_string(),
        }
    }
}

impl QueryConfig {
    /// `"<place>, <suffix>"`, or the bare place when no suffix is set.
    pub fn qualify(&self, place: &str) -> String {
        let place = place.trim();
        let suffix = self.region_suffix.trim();
        if suffix.is_empty() {
            place.to_string()
        } else {
            format!("{}, {}", place, suffix)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Concurrent origin lookups. Pacing stays global regardless.
    pub geocode_workers: usize,
    /// Concurrent route requests.
    pub route_workers: usize,
    /// Occupancy above which the winner is flagged as heavily loaded.
    pub high_occupancy_pct: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            geocode_workers: 1,
            route_workers: 8,
            high_occupancy_pct: 80.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub geocoder: GeocoderConfig,
    pub router: RouterConfig,
    pub query: QueryConfig,
    pub pipeline: PipelineConfig,
}

impl DispatchConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let mut config: DispatchConfig = toml::from_str(raw)?;
        config.pipeline.geocode_workers = config.pipeline.geocode_workers.max(1);
        config.pipeline.route_workers = config.pipeline.route_workers.max(1);
        config.geocoder.max_attempts = config.geocoder.max_attempts.max(1);
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }
}
