//! Test fixtures for consultant-dispatch.
//!
//! Provides:
//! - Real Rio Grande do Sul city coordinates (from OpenStreetMap)
//! - Scripted geocoder and router fakes with call logs

#![allow(dead_code)]

pub mod fakes;
pub mod rio_grande_do_sul;

pub use fakes::*;
pub use rio_grande_do_sul::*;
