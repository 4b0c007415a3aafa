#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hazard alerts: the admin broadcast board and the automated weather
//! watcher that posts to it.

pub mod watcher;

use chrono::{DateTime, Utc};
use relief_map_alert_models::{Alert, NewAlert};
use relief_map_database::{Database, DbError, UpdateError};
use relief_map_user_models::{Caller, Role};
use thiserror::Error;

pub use watcher::{WatchOutcome, WeatherWatcher};

/// Errors from alert operations.
#[derive(Debug, Error)]
pub enum AlertError {
    /// Alert payload is malformed.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Only admins manage alerts.
    #[error("A {role} may not {action}")]
    Forbidden {
        /// Attempted action.
        action: &'static str,
        /// Caller's role.
        role: Role,
    },

    /// No alert with this id.
    #[error("Alert {id} not found")]
    NotFound {
        /// Requested id.
        id: String,
    },

    /// Storage error.
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Broadcast alerts backed by the document store.
#[derive(Debug, Clone)]
pub struct AlertBoard {
    db: Database,
}

impl AlertBoard {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Publishes an admin broadcast.
    ///
    /// # Errors
    ///
    /// * [`AlertError::Forbidden`] unless the caller is an admin
    /// * [`AlertError::Validation`] for a blank title or message, or an
    ///   expiry that has already passed
    pub fn create(
        &self,
        caller: &Caller,
        new_alert: NewAlert,
        now: DateTime<Utc>,
    ) -> Result<Alert, AlertError> {
        require_admin(caller, "createAlert")?;

        let title = required("title", &new_alert.title)?;
        let message = required("message", &new_alert.message)?;
        if new_alert.expires_at.is_some_and(|expires| expires <= now) {
            return Err(AlertError::Validation {
                field: "expiresAt",
                message: "must be in the future".to_string(),
            });
        }

        self.publish(
            NewAlert {
                title,
                message,
                ..new_alert
            },
            now,
        )
    }

    /// Stores an alert without a caller check.
    pub(crate) fn publish(
        &self,
        new_alert: NewAlert,
        now: DateTime<Utc>,
    ) -> Result<Alert, AlertError> {
        let alert = Alert {
            id: uuid::Uuid::new_v4().to_string(),
            title: new_alert.title,
            message: new_alert.message,
            severity: new_alert.severity,
            area: new_alert.area,
            is_active: true,
            created_at: now,
            expires_at: new_alert.expires_at,
        };
        self.db.insert_alert(&alert)?;
        log::info!(
            "Alert {} published: [{}] {} ({})",
            alert.id,
            alert.severity,
            alert.title,
            alert.area
        );
        Ok(alert)
    }

    /// Clears the active flag on an alert.
    ///
    /// # Errors
    ///
    /// * [`AlertError::Forbidden`] unless the caller is an admin
    /// * [`AlertError::NotFound`] for an unknown id
    pub fn deactivate(&self, caller: &Caller, id: &str) -> Result<Alert, AlertError> {
        require_admin(caller, "deactivateAlert")?;

        let alert = self
            .db
            .update_alert(id, |mut alert| {
                alert.is_active = false;
                Ok::<_, std::convert::Infallible>(alert)
            })
            .map_err(|e| match e {
                UpdateError::Db(DbError::NotFound { .. }) => AlertError::NotFound {
                    id: id.to_string(),
                },
                UpdateError::Db(e) => AlertError::Database(e),
                UpdateError::Rejected(never) => match never {},
            })?;
        log::info!("Alert {id} deactivated by {}", caller.name);
        Ok(alert)
    }

    /// Alerts that are active and unexpired at `now`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list_active(&self, now: DateTime<Utc>) -> Result<Vec<Alert>, AlertError> {
        Ok(self
            .db
            .list_alerts()?
            .into_iter()
            .filter(|alert| alert.is_live(now))
            .collect())
    }

    /// Every alert ever published, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list_all(&self) -> Result<Vec<Alert>, AlertError> {
        Ok(self.db.list_alerts()?)
    }
}

fn require_admin(caller: &Caller, action: &'static str) -> Result<(), AlertError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AlertError::Forbidden {
            action,
            role: caller.role,
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, AlertError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AlertError::Validation {
            field,
            message: "must not be blank".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use relief_map_alert_models::{AlertSeverity, DEFAULT_AREA};

    use super::*;

    fn admin() -> Caller {
        Caller {
            name: "root".to_string(),
            role: Role::Admin,
        }
    }

    fn broadcast(expires_in: Option<Duration>) -> NewAlert {
        NewAlert {
            title: "Road closure".to_string(),
            message: "Tank Bund closed for repairs".to_string(),
            severity: AlertSeverity::Yellow,
            area: DEFAULT_AREA.to_string(),
            expires_at: expires_in.map(|d| Utc::now() + d),
        }
    }

    #[test]
    fn citizens_cannot_broadcast() {
        let board = AlertBoard::new(Database::temporary().unwrap());
        let citizen = Caller {
            name: "asha".to_string(),
            role: Role::Citizen,
        };
        assert!(matches!(
            board.create(&citizen, broadcast(None), Utc::now()),
            Err(AlertError::Forbidden { .. })
        ));
    }

    #[test]
    fn expired_and_deactivated_alerts_are_not_listed() {
        let board = AlertBoard::new(Database::temporary().unwrap());
        let now = Utc::now();
        let short = board
            .create(&admin(), broadcast(Some(Duration::minutes(30))), now)
            .unwrap();
        let long = board
            .create(&admin(), broadcast(Some(Duration::hours(6))), now)
            .unwrap();
        let open = board.create(&admin(), broadcast(None), now).unwrap();
        board.deactivate(&admin(), &open.id).unwrap();

        let later = now + Duration::hours(1);
        let ids: Vec<_> = board
            .list_active(later)
            .unwrap()
            .into_iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec![long.id]);
        assert!(board.list_all().unwrap().iter().any(|a| a.id == short.id && a.is_active));
    }

    #[test]
    fn past_expiry_is_rejected() {
        let board = AlertBoard::new(Database::temporary().unwrap());
        let now = Utc::now();
        let mut alert = broadcast(None);
        alert.expires_at = Some(now - Duration::minutes(1));
        assert!(matches!(
            board.create(&admin(), alert, now),
            Err(AlertError::Validation { field: "expiresAt", .. })
        ));
    }

    #[test]
    fn deactivating_unknown_alert_is_not_found() {
        let board = AlertBoard::new(Database::temporary().unwrap());
        assert!(matches!(
            board.deactivate(&admin(), "ghost"),
            Err(AlertError::NotFound { .. })
        ));
    }
}
