#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the relief map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the stored document types so the API contract can evolve
//! independently, and so password hashes never leave the server.

use chrono::{DateTime, Utc};
use relief_map_alert_models::{Alert, AlertSeverity, DEFAULT_AREA, NewAlert};
use relief_map_geography_models::Coordinate;
use relief_map_report_models::{
    CategoryDetails, Evidence, NewEvidence, NewReport, Report, ReportCategory, ReportSeverity,
    ReportStatus, Reporter, VerifiedLocation,
};
use relief_map_user_models::{NewUser, Role, User};
use relief_map_weather_models::WeatherSnapshot;
use serde::{Deserialize, Serialize};

pub use relief_map_report_models::ReportCommand as ReportCommandRequest;

/// An incident report as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    /// Unique report ID.
    pub id: String,
    /// Incident category.
    pub category: ReportCategory,
    /// Human-readable category label.
    pub category_label: String,
    /// Incident site.
    pub location: Coordinate,
    /// Lifecycle status.
    pub status: ReportStatus,
    /// Who reported it.
    pub reporter: Reporter,
    /// Evidence links, category details, and resolution notes.
    pub evidence: Evidence,
    /// Assigned worker name, or "Unassigned".
    pub assigned_worker: String,
    /// Triage severity.
    pub severity: ReportSeverity,
    /// Weather at submission time.
    pub weather_context: WeatherSnapshot,
    /// When GPS arrival was verified.
    pub arrival_timestamp: Option<DateTime<Utc>>,
    /// Worker position at verified arrival.
    pub verified_location: Option<VerifiedLocation>,
    /// Account that filed the report.
    pub submitted_by: String,
    /// When the report was filed.
    pub created_at: DateTime<Utc>,
    /// When an admin approved the resolution.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<Report> for ApiReport {
    fn from(report: Report) -> Self {
        let assigned_worker = report.assigned_worker_label().to_string();
        let (arrival_timestamp, verified_location) = report
            .arrival
            .map_or((None, None), |a| (Some(a.timestamp), Some(a.verified_location)));

        Self {
            id: report.id,
            category: report.category,
            category_label: report.category.label().to_string(),
            location: report.location,
            status: report.status,
            reporter: report.reporter,
            evidence: report.evidence,
            assigned_worker,
            severity: report.severity,
            weather_context: report.weather_context,
            arrival_timestamp,
            verified_location,
            submitted_by: report.submitted_by,
            created_at: report.created_at,
            resolved_at: report.resolved_at,
        }
    }
}

/// Evidence links supplied with a new report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEvidence {
    /// Link to a photo.
    pub image_url: Option<String>,
    /// Link to a video.
    pub video_url: Option<String>,
}

/// Body of `POST /api/reports`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportRequest {
    /// Incident category.
    pub category: ReportCategory,
    /// Incident site.
    pub location: Coordinate,
    /// Who is reporting.
    pub reporter: Reporter,
    /// Evidence links.
    #[serde(default)]
    pub evidence: SubmitEvidence,
    /// Category-specific details, tagged with the same category.
    pub category_details: CategoryDetails,
    /// Initial severity for admin call-in entries.
    pub severity: Option<ReportSeverity>,
}

impl From<SubmitReportRequest> for NewReport {
    fn from(request: SubmitReportRequest) -> Self {
        Self {
            category: request.category,
            location: request.location,
            reporter: request.reporter,
            evidence: NewEvidence {
                image_url: request.evidence.image_url,
                video_url: request.evidence.video_url,
                details: request.category_details,
            },
            severity: request.severity,
        }
    }
}

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReportStats {
    /// Reports awaiting triage.
    pub pending: usize,
    /// Assigned, accepted, or arrived reports.
    pub in_progress: usize,
    /// Resolutions awaiting admin review.
    pub under_review: usize,
    /// Approved reports.
    pub resolved: usize,
    /// All reports.
    pub total: usize,
}

/// A user account as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    /// Account name.
    pub name: String,
    /// Account role.
    pub role: Role,
    /// Department for staff.
    pub department: Option<String>,
    /// Contact phone.
    pub phone: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl From<User> for ApiUser {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            role: user.role,
            department: user.department,
            phone: user.phone,
            created_at: user.created_at,
        }
    }
}

/// Body of `POST /api/users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Requested account name.
    pub name: String,
    /// Plaintext password.
    pub password: String,
    /// Requested role; citizens when omitted.
    #[serde(default = "default_role")]
    pub role: Role,
    /// Department (workers and admins).
    pub department: Option<String>,
    /// Contact phone.
    pub phone: String,
    /// Aadhaar number (citizens).
    pub national_id: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Emergency contact number.
    pub emergency_contact: Option<String>,
}

const fn default_role() -> Role {
    Role::Citizen
}

impl From<RegisterRequest> for NewUser {
    fn from(request: RegisterRequest) -> Self {
        Self {
            name: request.name,
            password: request.password,
            role: request.role,
            department: request.department,
            phone: request.phone,
            national_id: request.national_id,
            address: request.address,
            emergency_contact: request.emergency_contact,
        }
    }
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// Bearer token for the `Authorization` header.
    pub token: String,
    /// When the token stops working.
    pub expires_at: DateTime<Utc>,
    /// The logged-in account.
    pub user: ApiUser,
}

/// A hazard alert as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAlert {
    /// Unique alert ID.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Warning level.
    pub severity: AlertSeverity,
    /// Affected area.
    pub area: String,
    /// Whether the alert has not been deactivated.
    pub is_active: bool,
    /// Whether the watcher raised it.
    pub is_automated: bool,
    /// When it was raised.
    pub created_at: DateTime<Utc>,
    /// When it lapses.
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Alert> for ApiAlert {
    fn from(alert: Alert) -> Self {
        let is_automated = alert.is_automated();
        Self {
            id: alert.id,
            title: alert.title,
            message: alert.message,
            severity: alert.severity,
            area: alert.area,
            is_active: alert.is_active,
            is_automated,
            created_at: alert.created_at,
            expires_at: alert.expires_at,
        }
    }
}

/// Body of `POST /api/alerts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    /// Headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Warning level; Yellow when omitted.
    pub severity: Option<AlertSeverity>,
    /// Affected area; city-wide when omitted.
    pub area: Option<String>,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<CreateAlertRequest> for NewAlert {
    fn from(request: CreateAlertRequest) -> Self {
        Self {
            title: request.title,
            message: request.message,
            severity: request.severity.unwrap_or_default(),
            area: request
                .area
                .filter(|a| !a.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AREA.to_string()),
            expires_at: request.expires_at,
        }
    }
}

/// Conditions and open incident count for one named zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiZoneWeather {
    /// Zone name.
    pub zone: String,
    /// Zone centroid.
    pub center: Coordinate,
    /// Radius used for the incident count.
    pub radius_meters: f64,
    /// Current conditions, or the offline sentinel.
    pub weather: WeatherSnapshot,
    /// Unresolved reports within the radius.
    pub open_reports: usize,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorBody {
    /// Error kind, e.g. `INVALID_TRANSITION`.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Offending field for validation and duplicate errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Measured distance for proximity errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_meters: Option<f64>,
    /// Allowed distance for proximity errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance_meters: Option<f64>,
}

#[cfg(test)]
mod tests {
    use relief_map_report_models::WaterLevel;

    use super::*;

    #[test]
    fn submit_request_carries_tagged_details() {
        let body = serde_json::json!({
            "category": "Flooding",
            "location": { "latitude": 17.4, "longitude": 78.5 },
            "reporter": { "name": "Asha", "phone": "9000000001", "pincode": "500004" },
            "evidence": { "imageUrl": "https://example.org/a.jpg" },
            "categoryDetails": { "category": "Flooding", "waterLevel": "KneeLevel" }
        });
        let request: SubmitReportRequest = serde_json::from_value(body).unwrap();
        let new_report = NewReport::from(request);
        assert_eq!(
            new_report.evidence.details,
            CategoryDetails::Flooding {
                water_level: WaterLevel::KneeLevel,
                area_affected: None,
            }
        );
        assert_eq!(new_report.severity, None);
    }

    #[test]
    fn registration_defaults_to_citizen() {
        let request: RegisterRequest = serde_json::from_value(serde_json::json!({
            "name": "asha",
            "password": "pw",
            "phone": "1",
            "nationalId": "1234"
        }))
        .unwrap();
        assert_eq!(NewUser::from(request).role, Role::Citizen);
    }

    #[test]
    fn alert_request_defaults() {
        let request: CreateAlertRequest = serde_json::from_value(serde_json::json!({
            "title": "Heavy rain",
            "message": "Stay indoors"
        }))
        .unwrap();
        let alert = NewAlert::from(request);
        assert_eq!(alert.severity, AlertSeverity::Yellow);
        assert_eq!(alert.area, "All Hyderabad");
    }

    #[test]
    fn unassigned_reports_show_the_placeholder() {
        let now = Utc::now();
        let report = Report {
            id: "r1".to_string(),
            category: ReportCategory::PowerOutage,
            location: Coordinate::new(17.4, 78.5),
            status: ReportStatus::Pending,
            reporter: Reporter {
                name: "Asha".to_string(),
                phone: "1".to_string(),
                pincode: None,
                landmark: None,
            },
            evidence: Evidence {
                image_url: None,
                video_url: None,
                details: CategoryDetails::PowerOutage { note: None },
                notes: None,
                resolution: None,
            },
            assigned_worker: None,
            severity: ReportSeverity::Medium,
            weather_context: WeatherSnapshot::offline(now),
            arrival: None,
            submitted_by: "asha".to_string(),
            created_at: now,
            resolved_at: None,
        };
        let api = ApiReport::from(report);
        assert_eq!(api.assigned_worker, "Unassigned");
        assert_eq!(api.category_label, "Power Outage");
        assert!(api.arrival_timestamp.is_none());
    }
}
