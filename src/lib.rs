//! consultant-dispatch core
//!
//! Picks which field consultant to send to a customer city: geocode the
//! destination and every distinct home city (paced, retried, cached),
//! measure road distance with a straight-line fallback, then rank by
//! workload and distance.

pub mod traits;
pub mod model;
pub mod error;
pub mod config;
pub mod resolver;
pub mod cache;
pub mod nominatim;
pub mod osrm;
pub mod haversine;
pub mod polyline;
pub mod distance;
pub mod selector;
pub mod dispatch;

pub use config::DispatchConfig;
pub use dispatch::{AssignmentResult, CancelToken, Dispatcher, Progress, RunContext};
pub use error::DispatchError;
pub use model::{Consultant, ConsultantRecord, Coordinates};
