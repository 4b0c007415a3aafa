#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geofencing and distance calculations for the relief map.
//!
//! The [`region`] module loads the configured service area (bounding box,
//! city center, and named zones) from TOML and exposes the geofence as a
//! `GeoJSON` overlay. The [`distance`] module provides the haversine
//! distance used to verify that field workers are on site.

pub mod distance;
pub mod region;

use thiserror::Error;

/// Errors that can occur while loading geographic configuration.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Reading a region file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The region TOML was malformed.
    #[error("Region parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The region parsed but describes an impossible area.
    #[error("Invalid region: {message}")]
    InvalidRegion {
        /// Description of what went wrong.
        message: String,
    },
}
