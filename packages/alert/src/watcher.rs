//! Background weather watcher.
//!
//! Every interval the watcher checks conditions at the service area's
//! center. Hazardous weather produces an automated alert unless a live
//! automated alert was already raised within [`DEDUP_WINDOW`]. This is
//! at-most-one per window, not exactly-once: a manual alert with a
//! different title never suppresses the watcher.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use relief_map_alert_models::{
    AUTOMATED_TITLE, Alert, AlertSeverity, NewAlert, URGENT_AUTOMATED_TITLE,
};
use relief_map_geography::region::ServiceArea;
use relief_map_weather::{WeatherProvider, fetch_with_timeout};
use relief_map_weather_models::WeatherSnapshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{AlertBoard, AlertError};

/// An automated alert created within this window suppresses new ones.
pub const DEDUP_WINDOW: Duration = Duration::hours(3);

/// How long an automated alert stays live.
pub const ALERT_LIFETIME: Duration = Duration::hours(4);

/// Default time between checks.
pub const DEFAULT_INTERVAL: StdDuration = StdDuration::from_secs(30 * 60);

/// What [`plan_alert`] decided.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertPlan {
    /// Conditions are not hazardous.
    Calm,
    /// A recent automated alert already covers this.
    Suppressed {
        /// The alert that is still live.
        existing: Alert,
    },
    /// A new alert should be published.
    Create(NewAlert),
}

/// Result of one watcher run.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchOutcome {
    /// Conditions are not hazardous.
    Calm,
    /// Hazardous, but a recent automated alert is still live.
    Suppressed {
        /// The alert that is still live.
        existing: Alert,
    },
    /// A new automated alert was published.
    Created(Alert),
    /// The weather check failed; nothing was decided.
    Skipped,
}

/// Decides whether `snapshot` warrants a new automated alert.
#[must_use]
pub fn plan_alert(
    snapshot: &WeatherSnapshot,
    existing: &[Alert],
    area_label: &str,
    now: DateTime<Utc>,
) -> AlertPlan {
    if snapshot.is_offline() || !snapshot.is_hazardous {
        return AlertPlan::Calm;
    }

    if let Some(recent) = existing
        .iter()
        .filter(|a| a.is_automated() && a.is_live(now))
        .find(|a| now - a.created_at < DEDUP_WINDOW)
    {
        return AlertPlan::Suppressed {
            existing: recent.clone(),
        };
    }

    let (title, severity) = if snapshot.is_severe() {
        (URGENT_AUTOMATED_TITLE, AlertSeverity::Red)
    } else {
        (AUTOMATED_TITLE, AlertSeverity::Orange)
    };

    AlertPlan::Create(NewAlert {
        title: title.to_string(),
        message: alert_message(snapshot),
        severity,
        area: area_label.to_string(),
        expires_at: Some(now + ALERT_LIFETIME),
    })
}

fn alert_message(snapshot: &WeatherSnapshot) -> String {
    let description = snapshot
        .description
        .as_deref()
        .unwrap_or(&snapshot.condition)
        .to_uppercase();
    let temperature = snapshot
        .temperature
        .map_or_else(|| "unknown".to_string(), |t| format!("{t}°C"));
    format!(
        "Automatic Update: {description} reported. Temperature: {temperature}. \
         Avoid low-lying areas and stay indoors."
    )
}

/// Periodic hazard check for one service area.
#[derive(Clone)]
pub struct WeatherWatcher {
    board: AlertBoard,
    provider: Arc<dyn WeatherProvider>,
    area: Arc<ServiceArea>,
    timeout: StdDuration,
}

impl WeatherWatcher {
    #[must_use]
    pub fn new(
        board: AlertBoard,
        provider: Arc<dyn WeatherProvider>,
        area: Arc<ServiceArea>,
        timeout: StdDuration,
    ) -> Self {
        Self {
            board,
            provider,
            area,
            timeout,
        }
    }

    /// Runs one check at `now`.
    ///
    /// Provider failures are logged and yield [`WatchOutcome::Skipped`];
    /// the next scheduled run retries.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::Database`] if alerts cannot be read or stored.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<WatchOutcome, AlertError> {
        let snapshot =
            match fetch_with_timeout(self.provider.as_ref(), self.area.center, self.timeout).await
            {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    log::warn!("Weather check skipped: {e}");
                    return Ok(WatchOutcome::Skipped);
                }
            };

        let existing = self.board.list_all()?;
        match plan_alert(&snapshot, &existing, &self.area.area_label, now) {
            AlertPlan::Calm => {
                log::debug!("Weather check: {} is not hazardous", snapshot.condition);
                Ok(WatchOutcome::Calm)
            }
            AlertPlan::Suppressed { existing } => {
                log::debug!(
                    "Weather check: {} still covered by alert {}",
                    snapshot.condition,
                    existing.id
                );
                Ok(WatchOutcome::Suppressed { existing })
            }
            AlertPlan::Create(new_alert) => {
                let alert = self.board.publish(new_alert, now)?;
                Ok(WatchOutcome::Created(alert))
            }
        }
    }

    /// Runs [`Self::run_once`] every `interval` on the tokio runtime,
    /// starting immediately.
    #[must_use]
    pub fn spawn(self, interval: StdDuration) -> JoinHandle<()> {
        tokio::spawn(async move {
            log::info!(
                "Weather watcher started for {} every {}s",
                self.area.name,
                interval.as_secs()
            );
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once(Utc::now()).await {
                    log::error!("Weather watcher run failed: {e}");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use relief_map_alert_models::AUTOMATED_TITLE_MARKER;
    use relief_map_database::Database;
    use relief_map_geography_models::Coordinate;
    use relief_map_weather::WeatherError;

    use super::*;

    fn snapshot(condition: &str, hazardous: bool) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: Some(29),
            condition: condition.to_string(),
            description: Some(format!("heavy {}", condition.to_lowercase())),
            humidity: Some(88),
            wind_speed: Some(12.0),
            is_hazardous: hazardous,
            fetched_at: Utc::now(),
        }
    }

    fn automated(created_ago: Duration, now: DateTime<Utc>) -> Alert {
        let created_at = now - created_ago;
        Alert {
            id: "auto-1".to_string(),
            title: AUTOMATED_TITLE.to_string(),
            message: "m".to_string(),
            severity: AlertSeverity::Orange,
            area: "Hyderabad City".to_string(),
            is_active: true,
            created_at,
            expires_at: Some(created_at + ALERT_LIFETIME),
        }
    }

    #[test]
    fn recent_automated_alert_suppresses() {
        let now = Utc::now();
        let existing = vec![automated(Duration::hours(1), now)];
        assert!(matches!(
            plan_alert(&snapshot("Rain", true), &existing, "Hyderabad City", now),
            AlertPlan::Suppressed { existing } if existing.id == "auto-1"
        ));
    }

    #[test]
    fn old_automated_alert_does_not_suppress_a_tornado() {
        let now = Utc::now();
        let existing = vec![automated(Duration::hours(4), now)];
        match plan_alert(&snapshot("Tornado", true), &existing, "Hyderabad City", now) {
            AlertPlan::Create(new_alert) => {
                assert_eq!(new_alert.severity, AlertSeverity::Red);
                assert_eq!(new_alert.title, URGENT_AUTOMATED_TITLE);
                assert!(new_alert.title.contains(AUTOMATED_TITLE_MARKER));
                assert_eq!(new_alert.expires_at, Some(now + ALERT_LIFETIME));
            }
            other => panic!("expected a new alert, got {other:?}"),
        }
    }

    #[test]
    fn manual_alerts_and_deactivated_ones_do_not_suppress() {
        let now = Utc::now();
        let mut manual = automated(Duration::minutes(10), now);
        manual.title = "Road closure".to_string();
        let mut cleared = automated(Duration::minutes(10), now);
        cleared.is_active = false;

        assert!(matches!(
            plan_alert(&snapshot("Rain", true), &[manual, cleared], "Hyderabad City", now),
            AlertPlan::Create(NewAlert {
                severity: AlertSeverity::Orange,
                ..
            })
        ));
    }

    #[test]
    fn calm_and_offline_weather_create_nothing() {
        let now = Utc::now();
        assert_eq!(
            plan_alert(&snapshot("Clear", false), &[], "Hyderabad City", now),
            AlertPlan::Calm
        );
        assert_eq!(
            plan_alert(&WeatherSnapshot::offline(now), &[], "Hyderabad City", now),
            AlertPlan::Calm
        );
    }

    #[test]
    fn message_names_the_conditions() {
        let now = Utc::now();
        let AlertPlan::Create(new_alert) =
            plan_alert(&snapshot("Rain", true), &[], "Hyderabad City", now)
        else {
            panic!("expected a new alert");
        };
        assert_eq!(
            new_alert.message,
            "Automatic Update: HEAVY RAIN reported. Temperature: 29°C. \
             Avoid low-lying areas and stay indoors."
        );
        assert_eq!(new_alert.area, "Hyderabad City");
    }

    struct Fixed(WeatherSnapshot);

    #[async_trait::async_trait]
    impl WeatherProvider for Fixed {
        async fn fetch_conditions(
            &self,
            _coordinate: Coordinate,
        ) -> Result<WeatherSnapshot, WeatherError> {
            Ok(self.0.clone())
        }
    }

    struct Down;

    #[async_trait::async_trait]
    impl WeatherProvider for Down {
        async fn fetch_conditions(
            &self,
            _coordinate: Coordinate,
        ) -> Result<WeatherSnapshot, WeatherError> {
            Err(WeatherError::Status { status: 500 })
        }
    }

    fn watcher(provider: Arc<dyn WeatherProvider>) -> WeatherWatcher {
        WeatherWatcher::new(
            AlertBoard::new(Database::temporary().unwrap()),
            provider,
            Arc::new(ServiceArea::default_region().unwrap()),
            StdDuration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn second_run_within_window_is_suppressed() {
        let watcher = watcher(Arc::new(Fixed(snapshot("Thunderstorm", true))));
        let now = Utc::now();

        let WatchOutcome::Created(first) = watcher.run_once(now).await.unwrap() else {
            panic!("expected the first run to create an alert");
        };
        assert_eq!(first.severity, AlertSeverity::Red);

        let second = watcher.run_once(now + Duration::hours(1)).await.unwrap();
        assert_eq!(second, WatchOutcome::Suppressed { existing: first });
        assert_eq!(watcher.board.list_all().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn provider_failure_skips_the_run() {
        let watcher = watcher(Arc::new(Down));
        assert_eq!(
            watcher.run_once(Utc::now()).await.unwrap(),
            WatchOutcome::Skipped
        );
        assert!(watcher.board.list_all().unwrap().is_empty());
    }
}
