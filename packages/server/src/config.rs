//! Server settings read from the environment.

use std::time::Duration;

use relief_map_weather::WeatherConfig;

/// Admin account created at startup if missing.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    /// `BOOTSTRAP_ADMIN_NAME`.
    pub name: String,
    /// `BOOTSTRAP_ADMIN_PASSWORD`.
    pub password: String,
    /// `BOOTSTRAP_ADMIN_PHONE`.
    pub phone: String,
    /// `BOOTSTRAP_ADMIN_DEPARTMENT`, default "Control Room".
    pub department: String,
}

/// Everything `run_server` reads from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
    pub session_ttl: chrono::Duration,
    pub watch_interval: Duration,
    pub weather: WeatherConfig,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ServerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        let session_ttl_hours: i64 = std::env::var("SESSION_TTL_HOURS")
            .ok()
            .and_then(|h| h.parse().ok())
            .filter(|h| *h > 0)
            .unwrap_or(12);
        let watch_minutes: u64 = std::env::var("WEATHER_CHECK_INTERVAL_MINUTES")
            .ok()
            .and_then(|m| m.parse().ok())
            .filter(|m| *m > 0)
            .unwrap_or(30);

        Self {
            bind_addr,
            port,
            session_ttl: chrono::Duration::hours(session_ttl_hours),
            watch_interval: minutes(watch_minutes),
            weather: WeatherConfig::from_env(),
            bootstrap_admin: bootstrap_admin_from_env(),
        }
    }
}

/// Saturates instead of overflowing for absurdly large settings.
const fn minutes(count: u64) -> Duration {
    Duration::from_secs(count.saturating_mul(60))
}

fn bootstrap_admin_from_env() -> Option<BootstrapAdmin> {
    let name = std::env::var("BOOTSTRAP_ADMIN_NAME").ok()?;
    let Ok(password) = std::env::var("BOOTSTRAP_ADMIN_PASSWORD") else {
        log::warn!("BOOTSTRAP_ADMIN_NAME is set without BOOTSTRAP_ADMIN_PASSWORD; skipping");
        return None;
    };
    Some(BootstrapAdmin {
        name,
        password,
        phone: std::env::var("BOOTSTRAP_ADMIN_PHONE").unwrap_or_else(|_| "100".to_string()),
        department: std::env::var("BOOTSTRAP_ADMIN_DEPARTMENT")
            .unwrap_or_else(|_| "Control Room".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_interval_is_converted_from_minutes() {
        assert_eq!(minutes(30), Duration::from_secs(1800));
    }

    #[test]
    fn huge_watch_interval_saturates() {
        assert_eq!(minutes(u64::MAX), Duration::from_secs(u64::MAX));
    }
}
