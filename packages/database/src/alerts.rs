//! Alert collection.

use relief_map_alert_models::Alert;

use crate::{
    Database, DbError, UpdateError, get_document, insert_document, list_documents, update_document,
};

const COLLECTION: &str = "alerts";

impl Database {
    /// Stores a new alert.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::AlreadyExists`] if the id is taken, or a store
    /// error.
    pub fn insert_alert(&self, alert: &Alert) -> Result<(), DbError> {
        insert_document(&self.alerts, COLLECTION, &alert.id, alert)
    }

    /// Fetches an alert by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn get_alert(&self, id: &str) -> Result<Option<Alert>, DbError> {
        get_document(&self.alerts, id)
    }

    /// Returns every alert, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list_alerts(&self) -> Result<Vec<Alert>, DbError> {
        let mut alerts: Vec<Alert> = list_documents(&self.alerts)?;
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    /// Atomically replaces an alert with `apply(current)`.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::Rejected`] if `apply` refuses, or
    /// [`UpdateError::Db`] if the alert is missing or the store fails.
    pub fn update_alert<E, F>(&self, id: &str, apply: F) -> Result<Alert, UpdateError<E>>
    where
        F: FnMut(Alert) -> Result<Alert, E>,
    {
        update_document(&self.alerts, COLLECTION, id, apply)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use relief_map_alert_models::{AlertSeverity, DEFAULT_AREA};

    use super::*;

    fn alert(id: &str, minutes_ago: i64) -> Alert {
        Alert {
            id: id.to_string(),
            title: "Weather Warning".to_string(),
            message: "Stay indoors".to_string(),
            severity: AlertSeverity::Orange,
            area: DEFAULT_AREA.to_string(),
            is_active: true,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
            expires_at: None,
        }
    }

    #[test]
    fn list_is_newest_first() {
        let db = Database::temporary().unwrap();
        db.insert_alert(&alert("a", 60)).unwrap();
        db.insert_alert(&alert("b", 5)).unwrap();
        let ids: Vec<_> = db.list_alerts().unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn deactivation_persists() {
        let db = Database::temporary().unwrap();
        db.insert_alert(&alert("a", 0)).unwrap();
        db.update_alert("a", |mut a| {
            a.is_active = false;
            Ok::<_, ()>(a)
        })
        .unwrap();
        assert!(!db.get_alert("a").unwrap().unwrap().is_active);
    }
}
