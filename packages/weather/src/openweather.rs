//! `OpenWeatherMap` current-conditions client.
//!
//! See <https://openweathermap.org/current>

use std::time::Duration;

use chrono::{DateTime, Utc};
use relief_map_geography_models::Coordinate;
use relief_map_weather_models::{WeatherSnapshot, is_hazardous};

use crate::{WeatherError, WeatherProvider};

/// Default current-weather endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// HTTP client for the `OpenWeatherMap` current weather API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenWeatherClient {
    /// Creates a client whose requests give up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, WeatherError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }
}

#[async_trait::async_trait]
impl WeatherProvider for OpenWeatherClient {
    async fn fetch_conditions(
        &self,
        coordinate: Coordinate,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(WeatherError::Status {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        log::debug!("OpenWeather payload: {body}");
        parse_response(&body, Utc::now())
    }
}

/// Parses an `OpenWeatherMap` current-weather JSON body.
///
/// # Errors
///
/// Returns [`WeatherError::Parse`] if the primary condition or the
/// temperature is missing.
#[allow(clippy::cast_possible_truncation)]
pub fn parse_response(
    body: &serde_json::Value,
    fetched_at: DateTime<Utc>,
) -> Result<WeatherSnapshot, WeatherError> {
    let primary = body["weather"]
        .as_array()
        .and_then(|w| w.first())
        .ok_or_else(|| WeatherError::Parse {
            message: "Missing weather[0] in OpenWeather response".to_string(),
        })?;

    let condition = primary["main"]
        .as_str()
        .ok_or_else(|| WeatherError::Parse {
            message: "Missing weather[0].main in OpenWeather response".to_string(),
        })?
        .to_string();

    let temp = body["main"]["temp"]
        .as_f64()
        .ok_or_else(|| WeatherError::Parse {
            message: "Missing main.temp in OpenWeather response".to_string(),
        })?;

    let wind_speed = body["wind"]["speed"].as_f64();
    let humidity = body["main"]["humidity"]
        .as_u64()
        .and_then(|h| u8::try_from(h).ok());
    let description = primary["description"].as_str().map(String::from);

    let hazardous = is_hazardous(&condition, temp, wind_speed.unwrap_or(0.0));

    Ok(WeatherSnapshot {
        temperature: Some(temp.round() as i32),
        condition,
        description,
        humidity,
        wind_speed,
        is_hazardous: hazardous,
        fetched_at,
    })
}

#[cfg(test)]
mod tests {
    use actix_web::dev::ServerHandle;
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, HttpServer, web};

    use super::*;

    #[test]
    fn parses_thunderstorm_payload() {
        let body = serde_json::json!({
            "weather": [{ "main": "Thunderstorm", "description": "thunderstorm with heavy rain" }],
            "main": { "temp": 27.6, "humidity": 88 },
            "wind": { "speed": 6.1 }
        });
        let snapshot = parse_response(&body, Utc::now()).unwrap();
        assert_eq!(snapshot.condition, "Thunderstorm");
        assert_eq!(snapshot.temperature, Some(28));
        assert_eq!(snapshot.humidity, Some(88));
        assert!(snapshot.is_hazardous);
        assert!(snapshot.is_severe());
    }

    #[test]
    fn clear_but_hot_is_hazardous() {
        let body = serde_json::json!({
            "weather": [{ "main": "Clear", "description": "clear sky" }],
            "main": { "temp": 43.2, "humidity": 10 },
            "wind": { "speed": 2.0 }
        });
        let snapshot = parse_response(&body, Utc::now()).unwrap();
        assert_eq!(snapshot.temperature, Some(43));
        assert!(snapshot.is_hazardous);
        assert!(snapshot.is_extreme_heat());
    }

    #[test]
    fn clear_and_calm_is_not_hazardous() {
        let body = serde_json::json!({
            "weather": [{ "main": "Clouds", "description": "scattered clouds" }],
            "main": { "temp": 29.0, "humidity": 40 }
        });
        let snapshot = parse_response(&body, Utc::now()).unwrap();
        assert!(!snapshot.is_hazardous);
        assert_eq!(snapshot.wind_speed, None);
    }

    #[test]
    fn malformed_payload_is_a_parse_error() {
        let body = serde_json::json!({ "cod": 401, "message": "Invalid API key" });
        assert!(matches!(
            parse_response(&body, Utc::now()),
            Err(WeatherError::Parse { .. })
        ));

        let body = serde_json::json!({ "weather": [{ "main": "Rain" }], "main": {} });
        assert!(matches!(
            parse_response(&body, Utc::now()),
            Err(WeatherError::Parse { .. })
        ));
    }

    /// Serves `status` on every path after `delay`. Returns the base URL.
    fn spawn_upstream(status: u16, delay: Duration) -> (String, ServerHandle) {
        let server = HttpServer::new(move || {
            App::new().default_service(web::to(move || async move {
                tokio::time::sleep(delay).await;
                HttpResponse::build(StatusCode::from_u16(status).unwrap())
                    .body("upstream unavailable")
            }))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (format!("http://{addr}/data/2.5/weather"), handle)
    }

    #[actix_web::test]
    async fn server_error_degrades_to_offline() {
        let (url, handle) = spawn_upstream(500, Duration::ZERO);
        let client =
            OpenWeatherClient::new("test-key".to_string(), url, Duration::from_secs(2)).unwrap();

        let direct = client
            .fetch_conditions(Coordinate::new(17.385, 78.4867))
            .await;
        assert!(matches!(direct, Err(WeatherError::Status { status: 500 })));

        let snapshot = crate::fetch_or_offline(
            &client,
            Coordinate::new(17.385, 78.4867),
            Duration::from_secs(3),
        )
        .await;
        assert!(snapshot.is_offline());
        assert!(!snapshot.is_hazardous);

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn stalled_upstream_degrades_to_offline() {
        let (url, handle) = spawn_upstream(200, Duration::from_secs(5));
        let client =
            OpenWeatherClient::new("test-key".to_string(), url, Duration::from_millis(300))
                .unwrap();

        let snapshot = crate::fetch_or_offline(
            &client,
            Coordinate::new(17.385, 78.4867),
            Duration::from_secs(1),
        )
        .await;
        assert!(snapshot.is_offline());
        assert!(!snapshot.is_hazardous);

        handle.stop(false).await;
    }

    #[tokio::test]
    async fn unreachable_endpoint_degrades_to_offline() {
        let client = OpenWeatherClient::new(
            "test-key".to_string(),
            "http://127.0.0.1:9/data/2.5/weather".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();
        let snapshot = crate::fetch_or_offline(
            &client,
            Coordinate::new(17.385, 78.4867),
            Duration::from_secs(3),
        )
        .await;
        assert!(snapshot.is_offline());
        assert!(!snapshot.is_hazardous);
    }
}
