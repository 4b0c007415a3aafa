//! Validating, enriching, and building new reports.

use chrono::{DateTime, Utc};
use relief_map_geography::region::ServiceArea;
use relief_map_report_models::{
    Evidence, NewReport, Report, ReportCategory, ReportSeverity, ReportStatus, Reporter,
};
use relief_map_user_models::{Caller, Role};
use relief_map_weather_models::WeatherSnapshot;

use crate::{ReportError, validate_link};

/// Appended to the reporter name when an admin files on a caller's behalf.
pub const ADMIN_ENTRY_SUFFIX: &str = " (Admin Entry)";

/// Checks and normalizes a submission before any side effect.
///
/// # Errors
///
/// * [`ReportError::Forbidden`] unless the caller is a citizen or admin
/// * [`ReportError::Validation`] for out-of-area locations, blank reporter
///   fields, details that do not match the category, or non-http links
pub fn prepare(
    new_report: NewReport,
    caller: &Caller,
    area: &ServiceArea,
) -> Result<NewReport, ReportError> {
    if !matches!(caller.role, Role::Citizen | Role::Admin) {
        return Err(ReportError::Forbidden {
            action: "submitReport",
            role: caller.role,
        });
    }

    let location = new_report.location;
    if !area.is_within_service_area(location.latitude, location.longitude) {
        return Err(ReportError::Validation {
            field: "location",
            message: format!("Location is outside the {} service area", area.name),
        });
    }

    if new_report.evidence.details.category() != new_report.category {
        return Err(ReportError::Validation {
            field: "categoryDetails",
            message: format!(
                "{} details given for a {} report",
                new_report.evidence.details.category().label(),
                new_report.category.label()
            ),
        });
    }

    let reporter = Reporter {
        name: required("reporter.name", &new_report.reporter.name)?,
        phone: required("reporter.phone", &new_report.reporter.phone)?,
        pincode: optional(new_report.reporter.pincode),
        landmark: optional(new_report.reporter.landmark),
    };

    let mut evidence = new_report.evidence;
    evidence.image_url = link("imageUrl", evidence.image_url.as_deref())?;
    evidence.video_url = link("videoUrl", evidence.video_url.as_deref())?;

    Ok(NewReport {
        category: new_report.category,
        location,
        reporter,
        evidence,
        severity: if caller.is_admin() {
            new_report.severity
        } else {
            None
        },
    })
}

/// Severity after correlating the category with current weather.
///
/// Never lowers `initial`. An offline snapshot never escalates.
#[must_use]
pub fn escalate(
    category: ReportCategory,
    weather: &WeatherSnapshot,
    initial: ReportSeverity,
) -> ReportSeverity {
    if weather.is_offline() {
        return initial;
    }

    let correlated = match category {
        ReportCategory::Flooding => weather.is_hazardous && weather.is_precipitating(),
        ReportCategory::BlockedRoad => weather.is_severe() || weather.is_high_wind(),
        ReportCategory::PowerOutage => {
            weather.is_severe() || weather.is_high_wind() || weather.is_extreme_heat()
        }
        ReportCategory::Garbage | ReportCategory::Other => false,
    };

    if correlated {
        ReportSeverity::High
    } else {
        initial
    }
}

/// Builds the stored report from a prepared submission.
#[must_use]
pub fn build_report(
    prepared: NewReport,
    caller: &Caller,
    weather: WeatherSnapshot,
    now: DateTime<Utc>,
) -> Report {
    let initial = prepared.severity.unwrap_or_default();
    let severity = escalate(prepared.category, &weather, initial);

    let mut reporter = prepared.reporter;
    if caller.is_admin() {
        reporter.name.push_str(ADMIN_ENTRY_SUFFIX);
    }

    Report {
        id: uuid::Uuid::new_v4().to_string(),
        category: prepared.category,
        location: prepared.location,
        status: ReportStatus::Pending,
        reporter,
        evidence: Evidence {
            image_url: prepared.evidence.image_url,
            video_url: prepared.evidence.video_url,
            details: prepared.evidence.details,
            notes: None,
            resolution: None,
        },
        assigned_worker: None,
        severity,
        weather_context: weather,
        arrival: None,
        submitted_by: caller.name.clone(),
        created_at: now,
        resolved_at: None,
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ReportError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ReportError::Validation {
            field,
            message: "must not be blank".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn link(field: &'static str, value: Option<&str>) -> Result<Option<String>, ReportError> {
    validate_link(value).map_err(|message| ReportError::Validation { field, message })
}

#[cfg(test)]
mod tests {
    use relief_map_geography_models::Coordinate;
    use relief_map_report_models::{CategoryDetails, NewEvidence, WaterLevel};

    use super::*;

    fn area() -> ServiceArea {
        ServiceArea::default_region().unwrap()
    }

    fn citizen() -> Caller {
        Caller {
            name: "asha".to_string(),
            role: Role::Citizen,
        }
    }

    fn admin() -> Caller {
        Caller {
            name: "control-room".to_string(),
            role: Role::Admin,
        }
    }

    fn flooding(latitude: f64, longitude: f64) -> NewReport {
        NewReport {
            category: ReportCategory::Flooding,
            location: Coordinate::new(latitude, longitude),
            reporter: Reporter {
                name: " Asha ".to_string(),
                phone: "9000000001".to_string(),
                pincode: Some("".to_string()),
                landmark: Some("Near Tank Bund".to_string()),
            },
            evidence: NewEvidence {
                image_url: Some("https://example.org/flood.jpg".to_string()),
                video_url: None,
                details: CategoryDetails::Flooding {
                    water_level: WaterLevel::KneeLevel,
                    area_affected: Some("Two lanes".to_string()),
                },
            },
            severity: Some(ReportSeverity::Low),
        }
    }

    fn weather(condition: &str, hazardous: bool) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature: Some(27),
            condition: condition.to_string(),
            description: None,
            humidity: Some(90),
            wind_speed: Some(4.0),
            is_hazardous: hazardous,
            fetched_at: Utc::now(),
        }
    }

    #[test]
    fn out_of_area_location_is_rejected() {
        let err = prepare(flooding(28.6139, 77.2090), &citizen(), &area()).unwrap_err();
        assert!(matches!(err, ReportError::Validation { field: "location", .. }));
    }

    #[test]
    fn normalizes_reporter_and_drops_citizen_severity() {
        let prepared = prepare(flooding(17.4, 78.5), &citizen(), &area()).unwrap();
        assert_eq!(prepared.reporter.name, "Asha");
        assert_eq!(prepared.reporter.pincode, None);
        assert_eq!(prepared.severity, None);
    }

    #[test]
    fn mismatched_details_are_rejected() {
        let mut report = flooding(17.4, 78.5);
        report.evidence.details = CategoryDetails::Other { note: None };
        assert!(matches!(
            prepare(report, &citizen(), &area()),
            Err(ReportError::Validation {
                field: "categoryDetails",
                ..
            })
        ));
    }

    #[test]
    fn blank_reporter_phone_is_rejected() {
        let mut report = flooding(17.4, 78.5);
        report.reporter.phone = " ".to_string();
        assert!(matches!(
            prepare(report, &citizen(), &area()),
            Err(ReportError::Validation {
                field: "reporter.phone",
                ..
            })
        ));
    }

    #[test]
    fn non_http_links_are_rejected() {
        let mut report = flooding(17.4, 78.5);
        report.evidence.video_url = Some("javascript:alert(1)".to_string());
        assert!(matches!(
            prepare(report, &citizen(), &area()),
            Err(ReportError::Validation { field: "videoUrl", .. })
        ));
    }

    #[test]
    fn workers_cannot_submit() {
        let worker = Caller {
            name: "team-a".to_string(),
            role: Role::Worker,
        };
        assert!(matches!(
            prepare(flooding(17.4, 78.5), &worker, &area()),
            Err(ReportError::Forbidden { .. })
        ));
    }

    #[test]
    fn flooding_in_a_thunderstorm_is_high() {
        let prepared = prepare(flooding(17.4, 78.5), &citizen(), &area()).unwrap();
        let report = build_report(prepared, &citizen(), weather("Thunderstorm", true), Utc::now());
        assert_eq!(report.severity, ReportSeverity::High);
        assert_eq!(report.status, ReportStatus::Pending);
        assert_eq!(report.weather_context.condition, "Thunderstorm");
    }

    #[test]
    fn escalation_is_category_specific() {
        let haze = weather("Haze", true);
        assert_eq!(
            escalate(ReportCategory::Flooding, &haze, ReportSeverity::Medium),
            ReportSeverity::Medium
        );

        let squall = weather("Squall", true);
        assert_eq!(
            escalate(ReportCategory::BlockedRoad, &squall, ReportSeverity::Medium),
            ReportSeverity::High
        );
        assert_eq!(
            escalate(ReportCategory::Garbage, &squall, ReportSeverity::Low),
            ReportSeverity::Low
        );

        let mut heat = weather("Clear", true);
        heat.temperature = Some(45);
        assert_eq!(
            escalate(ReportCategory::PowerOutage, &heat, ReportSeverity::Medium),
            ReportSeverity::High
        );
    }

    #[test]
    fn offline_weather_never_escalates() {
        let offline = WeatherSnapshot::offline(Utc::now());
        assert_eq!(
            escalate(ReportCategory::Flooding, &offline, ReportSeverity::Medium),
            ReportSeverity::Medium
        );
    }

    #[test]
    fn admin_entries_keep_initial_severity_and_are_marked() {
        let prepared = prepare(flooding(17.4, 78.5), &admin(), &area()).unwrap();
        let report = build_report(prepared, &admin(), weather("Clear", false), Utc::now());
        assert_eq!(report.reporter.name, "Asha (Admin Entry)");
        assert_eq!(report.severity, ReportSeverity::Low);
        assert_eq!(report.submitted_by, "control-room");
    }
}
