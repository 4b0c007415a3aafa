//! Report collection.

use relief_map_report_models::Report;

use crate::{
    Database, DbError, UpdateError, get_document, insert_document, list_documents, update_document,
};

const COLLECTION: &str = "reports";

impl Database {
    /// Stores a new report.
    ///
    /// # Errors
    ///
    /// * [`DbError::AlreadyExists`] if the id is taken
    /// * [`DbError::Storage`] or [`DbError::Serialization`] on store failure
    pub fn insert_report(&self, report: &Report) -> Result<(), DbError> {
        insert_document(&self.reports, COLLECTION, &report.id, report)
    }

    /// Fetches a report by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn get_report(&self, id: &str) -> Result<Option<Report>, DbError> {
        get_document(&self.reports, id)
    }

    /// Returns every report, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list_reports(&self) -> Result<Vec<Report>, DbError> {
        let mut reports: Vec<Report> = list_documents(&self.reports)?;
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    /// Atomically replaces a report with `apply(current)`.
    ///
    /// `apply` may run more than once if another writer updates the
    /// report concurrently; only one of any set of racing updates that
    /// all read the same state can commit.
    ///
    /// # Errors
    ///
    /// * [`UpdateError::Rejected`] with whatever `apply` returned
    /// * [`UpdateError::Db`] if the report is missing or the store fails
    pub fn update_report<E, F>(&self, id: &str, apply: F) -> Result<Report, UpdateError<E>>
    where
        F: FnMut(Report) -> Result<Report, E>,
    {
        update_document(&self.reports, COLLECTION, id, apply)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use relief_map_geography_models::Coordinate;
    use relief_map_report_models::{
        CategoryDetails, Evidence, ReportCategory, ReportSeverity, ReportStatus, Reporter,
    };
    use relief_map_weather_models::WeatherSnapshot;

    use super::*;

    fn report(id: &str, minutes_ago: i64) -> Report {
        let created_at = Utc::now() - Duration::minutes(minutes_ago);
        Report {
            id: id.to_string(),
            category: ReportCategory::Garbage,
            location: Coordinate::new(17.385, 78.4867),
            status: ReportStatus::Pending,
            reporter: Reporter {
                name: "Asha".to_string(),
                phone: "9000000001".to_string(),
                pincode: None,
                landmark: None,
            },
            evidence: Evidence {
                image_url: None,
                video_url: None,
                details: CategoryDetails::Garbage { note: None },
                notes: None,
                resolution: None,
            },
            assigned_worker: None,
            severity: ReportSeverity::Medium,
            weather_context: WeatherSnapshot::offline(created_at),
            arrival: None,
            submitted_by: "asha".to_string(),
            created_at,
            resolved_at: None,
        }
    }

    #[test]
    fn insert_then_get() {
        let db = Database::temporary().unwrap();
        db.insert_report(&report("r1", 0)).unwrap();
        let fetched = db.get_report("r1").unwrap().unwrap();
        assert_eq!(fetched.id, "r1");
        assert!(db.get_report("missing").unwrap().is_none());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let db = Database::temporary().unwrap();
        db.insert_report(&report("r1", 0)).unwrap();
        assert!(matches!(
            db.insert_report(&report("r1", 0)),
            Err(DbError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn list_is_newest_first() {
        let db = Database::temporary().unwrap();
        db.insert_report(&report("old", 30)).unwrap();
        db.insert_report(&report("new", 1)).unwrap();
        db.insert_report(&report("mid", 10)).unwrap();
        let ids: Vec<_> = db
            .list_reports()
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn lost_race_reevaluates_against_the_replaced_document() {
        let db = Database::temporary().unwrap();
        db.insert_report(&report("r1", 0)).unwrap();

        let mut seen = Vec::new();
        let updated = db
            .update_report("r1", |mut current| {
                seen.push(current.status);
                if seen.len() == 1 {
                    let mut racer = current.clone();
                    racer.status = ReportStatus::Assigned;
                    racer.assigned_worker = Some("team-b".to_string());
                    db.reports
                        .insert("r1", crate::encode(&racer).unwrap())
                        .unwrap();
                }
                current.status = ReportStatus::Accepted;
                Ok::<_, &str>(current)
            })
            .unwrap();

        assert_eq!(seen, vec![ReportStatus::Pending, ReportStatus::Assigned]);
        assert_eq!(updated.assigned_worker.as_deref(), Some("team-b"));
        assert_eq!(
            db.get_report("r1").unwrap().unwrap().status,
            ReportStatus::Accepted
        );
    }

    #[test]
    fn rejected_update_leaves_report_untouched() {
        let db = Database::temporary().unwrap();
        db.insert_report(&report("r1", 0)).unwrap();
        let result = db.update_report("r1", |_| Err::<Report, _>("nope"));
        assert!(matches!(result, Err(UpdateError::Rejected("nope"))));
        assert_eq!(
            db.get_report("r1").unwrap().unwrap().status,
            ReportStatus::Pending
        );
    }

    #[test]
    fn updating_missing_report_is_not_found() {
        let db = Database::temporary().unwrap();
        let result = db.update_report("ghost", |r| Ok::<_, ()>(r));
        assert!(matches!(
            result,
            Err(UpdateError::Db(DbError::NotFound { .. }))
        ));
    }

    #[test]
    fn racing_updates_from_same_state_commit_once() {
        let db = Database::temporary().unwrap();
        db.insert_report(&report("r1", 0)).unwrap();

        let barrier = Arc::new(std::sync::Barrier::new(8));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let db = db.clone();
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    db.update_report("r1", |mut r| {
                        if r.status != ReportStatus::Pending {
                            return Err("already assigned");
                        }
                        r.status = ReportStatus::Assigned;
                        r.assigned_worker = Some(format!("worker-{i}"));
                        Ok(r)
                    })
                    .is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(successes, 1);
        assert_eq!(
            db.get_report("r1").unwrap().unwrap().status,
            ReportStatus::Assigned
        );
    }
}
