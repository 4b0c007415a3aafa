#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Weather enrichment for incident reports and the alert watcher.
//!
//! Providers implement [`WeatherProvider`]. Callers that must never fail
//! because of the weather service (report submission, the zone overview)
//! go through [`fetch_or_offline`], which bounds the call with a timeout
//! and degrades every failure to the [`WeatherSnapshot::offline`]
//! sentinel. The watcher calls the provider directly so it can tell a
//! failed check apart from calm weather.

pub mod openweather;

use std::time::Duration;

use chrono::Utc;
use relief_map_geography_models::Coordinate;
use relief_map_weather_models::WeatherSnapshot;
use thiserror::Error;

pub use openweather::OpenWeatherClient;

/// Default upper bound on a single provider call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from weather providers.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// HTTP request failed (connection, TLS, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status.
    #[error("Weather provider returned HTTP {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Provider did not answer in time.
    #[error("Weather provider timed out after {0:?}")]
    Timeout(Duration),

    /// Provider is not configured.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },
}

/// A source of current weather conditions.
#[async_trait::async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Fetches the current conditions at `coordinate`.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError`] if the provider cannot produce a snapshot.
    async fn fetch_conditions(&self, coordinate: Coordinate)
    -> Result<WeatherSnapshot, WeatherError>;
}

/// Provider used when no API key is configured. Every call fails, so
/// enrichment always degrades to the offline sentinel.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredProvider;

#[async_trait::async_trait]
impl WeatherProvider for UnconfiguredProvider {
    async fn fetch_conditions(
        &self,
        _coordinate: Coordinate,
    ) -> Result<WeatherSnapshot, WeatherError> {
        Err(WeatherError::Config {
            message: "OPENWEATHER_API_KEY is not set".to_string(),
        })
    }
}

/// Calls `provider` with a bounded timeout.
///
/// # Errors
///
/// Returns [`WeatherError::Timeout`] if the provider does not answer
/// within `timeout`, or whatever error the provider itself returns.
pub async fn fetch_with_timeout(
    provider: &dyn WeatherProvider,
    coordinate: Coordinate,
    timeout: Duration,
) -> Result<WeatherSnapshot, WeatherError> {
    tokio::time::timeout(timeout, provider.fetch_conditions(coordinate))
        .await
        .map_err(|_| WeatherError::Timeout(timeout))?
}

/// Fetches conditions, absorbing every failure into the offline sentinel.
pub async fn fetch_or_offline(
    provider: &dyn WeatherProvider,
    coordinate: Coordinate,
    timeout: Duration,
) -> WeatherSnapshot {
    match fetch_with_timeout(provider, coordinate, timeout).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log::warn!(
                "Weather unavailable at ({}, {}): {e}",
                coordinate.latitude,
                coordinate.longitude
            );
            WeatherSnapshot::offline(Utc::now())
        }
    }
}

/// Provider settings read from the environment.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    /// `OPENWEATHER_API_KEY`.
    pub api_key: Option<String>,
    /// `OPENWEATHER_BASE_URL`.
    pub base_url: String,
    /// `WEATHER_TIMEOUT_SECS`.
    pub timeout: Duration,
}

impl WeatherConfig {
    /// Reads provider settings from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = std::env::var("OPENWEATHER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let base_url = std::env::var("OPENWEATHER_BASE_URL")
            .unwrap_or_else(|_| openweather::DEFAULT_BASE_URL.to_string());
        let timeout = std::env::var("WEATHER_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Self {
            api_key,
            base_url,
            timeout,
        }
    }

    /// Builds the configured provider.
    ///
    /// Without an API key this logs a warning and returns
    /// [`UnconfiguredProvider`].
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Http`] if the HTTP client cannot be built.
    pub fn build_provider(&self) -> Result<Box<dyn WeatherProvider>, WeatherError> {
        match &self.api_key {
            Some(key) => Ok(Box::new(OpenWeatherClient::new(
                key.clone(),
                self.base_url.clone(),
                self.timeout,
            )?)),
            None => {
                log::warn!("OPENWEATHER_API_KEY not set; weather enrichment will report Offline");
                Ok(Box::new(UnconfiguredProvider))
            }
        }
    }
}
