//! Read-side views over the report collection.

use chrono::{DateTime, Duration, Utc};
use relief_map_geography::distance::distance_between;
use relief_map_geography_models::NamedZone;
use relief_map_report_models::{Report, ReportStatus};
use relief_map_user_models::{Caller, Role};

/// How long a resolved report stays on the live map.
pub const RESOLVED_MAP_WINDOW: Duration = Duration::hours(24);

/// Whether `report` belongs on the live incident map at `now`.
///
/// Open reports always do. Resolved reports do only while
/// `now - resolved_at` is under [`RESOLVED_MAP_WINDOW`].
#[must_use]
pub fn is_on_active_map(report: &Report, now: DateTime<Utc>) -> bool {
    if report.status.is_open() {
        return true;
    }
    report
        .resolved_at
        .is_some_and(|resolved_at| now - resolved_at < RESOLVED_MAP_WINDOW)
}

/// Filters `reports` down to the live incident map.
#[must_use]
pub fn active_map(reports: Vec<Report>, now: DateTime<Utc>) -> Vec<Report> {
    reports
        .into_iter()
        .filter(|r| is_on_active_map(r, now))
        .collect()
}

/// The reports relevant to `caller`.
///
/// Workers see their unresolved assignments; everyone else sees the
/// reports they filed.
#[must_use]
pub fn reports_for(reports: Vec<Report>, caller: &Caller) -> Vec<Report> {
    reports
        .into_iter()
        .filter(|r| match caller.role {
            Role::Worker => r.is_assigned_to(&caller.name) && r.status.is_open(),
            Role::Citizen | Role::Admin => r.submitted_by == caller.name,
        })
        .collect()
}

/// Dashboard counters.
///
/// `in_progress` counts Assigned, Accepted, and Arrived reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportStats {
    pub pending: usize,
    pub in_progress: usize,
    pub under_review: usize,
    pub resolved: usize,
    pub total: usize,
}

impl ReportStats {
    #[must_use]
    pub fn from_reports(reports: &[Report]) -> Self {
        reports.iter().fold(Self::default(), |mut stats, report| {
            match report.status {
                ReportStatus::Pending => stats.pending += 1,
                ReportStatus::Assigned | ReportStatus::Accepted | ReportStatus::Arrived => {
                    stats.in_progress += 1;
                }
                ReportStatus::SubmittedForReview => stats.under_review += 1,
                ReportStatus::Resolved => stats.resolved += 1,
            }
            stats.total += 1;
            stats
        })
    }
}

/// Number of open reports within `zone`'s radius of its center.
#[must_use]
pub fn open_reports_in_zone(reports: &[Report], zone: &NamedZone) -> usize {
    reports
        .iter()
        .filter(|r| r.status.is_open())
        .filter(|r| distance_between(r.location, zone.center) <= zone.radius_meters)
        .count()
}

#[cfg(test)]
mod tests {
    use relief_map_geography_models::Coordinate;
    use relief_map_report_models::{
        CategoryDetails, Evidence, ReportCategory, ReportSeverity, Reporter,
    };
    use relief_map_weather_models::WeatherSnapshot;

    use super::*;

    fn report(status: ReportStatus, resolved_hours_ago: Option<i64>) -> Report {
        let now = Utc::now();
        Report {
            id: format!("{status}"),
            category: ReportCategory::Garbage,
            location: Coordinate::new(17.385, 78.4867),
            status,
            reporter: Reporter {
                name: "Asha".to_string(),
                phone: "1".to_string(),
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
            assigned_worker: Some("team-a".to_string()),
            severity: ReportSeverity::Medium,
            weather_context: WeatherSnapshot::offline(now),
            arrival: None,
            submitted_by: "asha".to_string(),
            created_at: now - Duration::days(3),
            resolved_at: resolved_hours_ago.map(|h| now - Duration::hours(h)),
        }
    }

    #[test]
    fn resolved_reports_leave_the_map_after_a_day() {
        let now = Utc::now();
        assert!(is_on_active_map(&report(ReportStatus::Resolved, Some(23)), now));
        assert!(!is_on_active_map(&report(ReportStatus::Resolved, Some(25)), now));
        assert!(!is_on_active_map(&report(ReportStatus::Resolved, None), now));
        assert!(is_on_active_map(&report(ReportStatus::Pending, None), now));
    }

    #[test]
    fn exactly_twenty_four_hours_is_hidden() {
        let mut resolved = report(ReportStatus::Resolved, None);
        let now = Utc::now();
        resolved.resolved_at = Some(now - RESOLVED_MAP_WINDOW);
        assert!(!is_on_active_map(&resolved, now));
    }

    #[test]
    fn stats_group_in_progress_statuses() {
        let reports: Vec<_> = ReportStatus::all()
            .iter()
            .map(|s| report(*s, Some(1)))
            .collect();
        assert_eq!(
            ReportStats::from_reports(&reports),
            ReportStats {
                pending: 1,
                in_progress: 3,
                under_review: 1,
                resolved: 1,
                total: 6,
            }
        );
    }

    #[test]
    fn workers_see_open_assignments_citizens_see_their_own() {
        let reports = vec![
            report(ReportStatus::Accepted, None),
            report(ReportStatus::Resolved, Some(1)),
        ];
        let worker = Caller {
            name: "team-a".to_string(),
            role: Role::Worker,
        };
        let citizen = Caller {
            name: "asha".to_string(),
            role: Role::Citizen,
        };
        let stranger = Caller {
            name: "ravi".to_string(),
            role: Role::Citizen,
        };
        assert_eq!(reports_for(reports.clone(), &worker).len(), 1);
        assert_eq!(reports_for(reports.clone(), &citizen).len(), 2);
        assert!(reports_for(reports, &stranger).is_empty());
    }

    #[test]
    fn zone_counts_only_open_reports_in_radius() {
        let zone = NamedZone {
            name: "Khairatabad".to_string(),
            center: Coordinate::new(17.385, 78.4867),
            radius_meters: 1_000.0,
        };
        let mut far = report(ReportStatus::Pending, None);
        far.location = Coordinate::new(17.5, 78.4867);
        let reports = vec![
            report(ReportStatus::Pending, None),
            report(ReportStatus::Resolved, Some(1)),
            far,
        ];
        assert_eq!(open_reports_in_zone(&reports, &zone), 1);
    }
}
