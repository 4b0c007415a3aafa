//! Report operations against the document store.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use relief_map_database::{Database, DbError, UpdateError};
use relief_map_geography::region::ServiceArea;
use relief_map_geography_models::NamedZone;
use relief_map_report_models::{NewReport, Report, ReportCommand};
use relief_map_user_models::{Caller, Role};
use relief_map_weather::{WeatherProvider, fetch_or_offline};
use relief_map_weather_models::WeatherSnapshot;

use crate::projection::{self, ReportStats};
use crate::{ReportError, lifecycle, submission};

/// Current conditions and open incident count for one named zone.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneWeather {
    pub zone: NamedZone,
    pub weather: WeatherSnapshot,
    pub open_reports: usize,
}

/// Entry point for every report operation.
#[derive(Clone)]
pub struct ReportService {
    db: Database,
    weather: Arc<dyn WeatherProvider>,
    area: Arc<ServiceArea>,
    weather_timeout: Duration,
}

impl ReportService {
    #[must_use]
    pub fn new(
        db: Database,
        weather: Arc<dyn WeatherProvider>,
        area: Arc<ServiceArea>,
        weather_timeout: Duration,
    ) -> Self {
        Self {
            db,
            weather,
            area,
            weather_timeout,
        }
    }

    /// The region reports are accepted in.
    #[must_use]
    pub fn area(&self) -> &ServiceArea {
        &self.area
    }

    /// Validates, enriches, and stores a new report.
    ///
    /// Weather is fetched with a bounded timeout. A slow or failing
    /// provider yields the offline snapshot; it never fails the submission.
    ///
    /// # Errors
    ///
    /// * [`ReportError::Forbidden`] unless the caller is a citizen or admin
    /// * [`ReportError::Validation`] if the submission is malformed
    /// * [`ReportError::Database`] if the report cannot be stored
    pub async fn submit(
        &self,
        caller: &Caller,
        new_report: NewReport,
    ) -> Result<Report, ReportError> {
        let prepared = submission::prepare(new_report, caller, &self.area)?;
        let weather =
            fetch_or_offline(self.weather.as_ref(), prepared.location, self.weather_timeout).await;
        let report = submission::build_report(prepared, caller, weather, Utc::now());

        self.db.insert_report(&report)?;
        log::info!(
            "Report {} filed by {}: {} at ({}, {}), severity {}, weather {}",
            report.id,
            report.submitted_by,
            report.category,
            report.location.latitude,
            report.location.longitude,
            report.severity,
            report.weather_context.condition,
        );
        Ok(report)
    }

    /// All reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list(&self) -> Result<Vec<Report>, ReportError> {
        Ok(self.db.list_reports()?)
    }

    /// Reports filed by, or assigned to, `caller`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list_for(&self, caller: &Caller) -> Result<Vec<Report>, ReportError> {
        Ok(projection::reports_for(self.db.list_reports()?, caller))
    }

    /// # Errors
    ///
    /// Returns [`ReportError::NotFound`] for an unknown id.
    pub fn get(&self, id: &str) -> Result<Report, ReportError> {
        self.db
            .get_report(id)?
            .ok_or_else(|| ReportError::NotFound { id: id.to_string() })
    }

    /// Runs `command` against report `id` as `caller`.
    ///
    /// The transition is evaluated against the stored state and committed
    /// with compare-and-swap. If another request changed the report first,
    /// the command is re-evaluated against the new state.
    ///
    /// # Errors
    ///
    /// * [`ReportError::NotFound`] for an unknown id
    /// * [`ReportError::Validation`] when assigning a name that is not a
    ///   worker account
    /// * [`ReportError::Transition`] when the state machine refuses
    pub fn execute(
        &self,
        caller: &Caller,
        id: &str,
        command: &ReportCommand,
    ) -> Result<Report, ReportError> {
        if let ReportCommand::AssignWorker { worker } = command
            && caller.is_admin()
        {
            self.require_worker(worker.trim())?;
        }

        let now = Utc::now();
        let mut replaced = None;
        let updated = self
            .db
            .update_report(id, |report| {
                replaced = Some(report.status);
                lifecycle::apply(report, caller, command, now)
            })
            .map_err(|e| match e {
                UpdateError::Rejected(e) => ReportError::Transition(e),
                UpdateError::Db(DbError::NotFound { .. }) => ReportError::NotFound {
                    id: id.to_string(),
                },
                UpdateError::Db(e) => ReportError::Database(e),
            })?;

        log::info!(
            "Report {id}: {} by {} ({}), {} -> {}",
            command.action(),
            caller.name,
            caller.role,
            replaced.map_or_else(|| "?".to_string(), |status| status.to_string()),
            updated.status,
        );
        Ok(updated)
    }

    fn require_worker(&self, name: &str) -> Result<(), ReportError> {
        match self.db.find_user(name)? {
            Some(user) if user.role == Role::Worker => Ok(()),
            _ => Err(ReportError::Validation {
                field: "worker",
                message: format!("{name} is not a registered worker"),
            }),
        }
    }

    /// Reports on the live incident map at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn active_map(&self, now: DateTime<Utc>) -> Result<Vec<Report>, ReportError> {
        Ok(projection::active_map(self.db.list_reports()?, now))
    }

    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn stats(&self) -> Result<ReportStats, ReportError> {
        Ok(ReportStats::from_reports(&self.db.list_reports()?))
    }

    /// Fetches weather for every named zone concurrently and counts the
    /// open reports around each.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read. Weather failures show
    /// up as offline snapshots.
    pub async fn zone_overview(&self) -> Result<Vec<ZoneWeather>, ReportError> {
        let reports = self.db.list_reports()?;
        let snapshots = join_all(self.area.zones.iter().map(|zone| {
            fetch_or_offline(self.weather.as_ref(), zone.center, self.weather_timeout)
        }))
        .await;

        Ok(self
            .area
            .zones
            .iter()
            .zip(snapshots)
            .map(|(zone, weather)| ZoneWeather {
                zone: zone.clone(),
                weather,
                open_reports: projection::open_reports_in_zone(&reports, zone),
            })
            .collect())
    }
}
