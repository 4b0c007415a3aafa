#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Weather snapshot types and hazard classification.
//!
//! A [`WeatherSnapshot`] is what the rest of the system sees of the
//! external weather provider. When the provider cannot be reached the
//! snapshot is the [`WeatherSnapshot::offline`] sentinel, which is never
//! hazardous. Consumers must read `Offline` as "no enrichment available",
//! not as "confirmed clear weather".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Condition string used for the unavailable-provider sentinel.
pub const OFFLINE_CONDITION: &str = "Offline";

/// Provider condition categories treated as hazardous.
pub const HAZARDOUS_CONDITIONS: &[&str] = &[
    "Rain",
    "Thunderstorm",
    "Tornado",
    "Squall",
    "Dust",
    "Haze",
    "Drizzle",
];

/// Conditions that warrant a red, urgent alert.
pub const SEVERE_CONDITIONS: &[&str] = &["Thunderstorm", "Tornado", "Squall"];

/// Conditions involving active precipitation.
pub const PRECIPITATION_CONDITIONS: &[&str] =
    &["Rain", "Drizzle", "Thunderstorm", "Squall", "Tornado"];

/// Temperatures strictly above this (°C) count as a heatwave.
pub const EXTREME_HEAT_CELSIUS: f64 = 42.0;

/// Wind speeds strictly above this (m/s) count as high wind.
pub const HIGH_WIND_METERS_PER_SECOND: f64 = 15.0;

/// Classifies raw provider readings as hazardous or not.
///
/// Hazardous when the condition is one of [`HAZARDOUS_CONDITIONS`], the
/// temperature exceeds [`EXTREME_HEAT_CELSIUS`], or the wind exceeds
/// [`HIGH_WIND_METERS_PER_SECOND`].
#[must_use]
pub fn is_hazardous(condition: &str, temperature_celsius: f64, wind_speed: f64) -> bool {
    HAZARDOUS_CONDITIONS.contains(&condition)
        || temperature_celsius > EXTREME_HEAT_CELSIUS
        || wind_speed > HIGH_WIND_METERS_PER_SECOND
}

/// Current conditions at a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    /// Temperature in °C rounded to an integer; `None` when unknown.
    pub temperature: Option<i32>,
    /// Provider's primary condition category (e.g. "Rain").
    pub condition: String,
    /// Provider's free-text description (e.g. "heavy intensity rain").
    pub description: Option<String>,
    /// Relative humidity percentage.
    pub humidity: Option<u8>,
    /// Wind speed in m/s.
    pub wind_speed: Option<f64>,
    /// Result of [`is_hazardous`] on the raw readings.
    pub is_hazardous: bool,
    /// When the snapshot was taken.
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    /// The sentinel returned when the provider is unavailable.
    #[must_use]
    pub fn offline(fetched_at: DateTime<Utc>) -> Self {
        Self {
            temperature: None,
            condition: OFFLINE_CONDITION.to_string(),
            description: Some("Service unavailable".to_string()),
            humidity: None,
            wind_speed: None,
            is_hazardous: false,
            fetched_at,
        }
    }

    /// Whether this is the unavailable-provider sentinel.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.condition == OFFLINE_CONDITION
    }

    /// Whether the condition is one of [`SEVERE_CONDITIONS`].
    #[must_use]
    pub fn is_severe(&self) -> bool {
        SEVERE_CONDITIONS.contains(&self.condition.as_str())
    }

    /// Whether the condition involves active precipitation.
    #[must_use]
    pub fn is_precipitating(&self) -> bool {
        PRECIPITATION_CONDITIONS.contains(&self.condition.as_str())
    }

    /// Whether the recorded wind exceeds the high-wind threshold.
    #[must_use]
    pub fn is_high_wind(&self) -> bool {
        self.wind_speed
            .is_some_and(|w| w > HIGH_WIND_METERS_PER_SECOND)
    }

    /// Whether the recorded temperature exceeds the heatwave threshold.
    #[must_use]
    pub fn is_extreme_heat(&self) -> bool {
        self.temperature
            .is_some_and(|t| f64::from(t) > EXTREME_HEAT_CELSIUS)
    }
}
