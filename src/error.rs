//! Error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// A single failed geocoding request.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// Timeout, connection failure, throttling or a 5xx. Worth retrying.
    #[error("geocoder unavailable: {0}")]
    Transient(String),
    /// The service answered but the answer is unusable. Not retried.
    #[error("geocoder rejected request: {0}")]
    Rejected(String),
}

impl GeocodeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GeocodeError::Transient(_))
    }
}

impl From<reqwest::Error> for GeocodeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            return GeocodeError::Transient(err.to_string());
        }
        match err.status() {
            Some(status) if status.is_server_error() || status.as_u16() == 429 => {
                GeocodeError::Transient(err.to_string())
            }
            _ => GeocodeError::Rejected(err.to_string()),
        }
    }
}

/// A failed routing request. Every variant is absorbed by the great-circle fallback.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("routing request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("routing service answered {0}")]
    Status(String),
    #[error("routing service returned no route")]
    NoRoute,
    #[error("malformed routing response: {0}")]
    Malformed(String),
}

/// Terminal failure of a dispatch run.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("destination not found")]
    DestinationNotFound { query: String },
    #[error("no valid route")]
    NoValidRoute { unresolved: usize, total: usize },
    #[error("run cancelled")]
    Cancelled,
    #[error("failed to build worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
