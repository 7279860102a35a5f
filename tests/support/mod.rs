//! Shared setup for tests that talk to real services.

pub mod osrm_dataset;
