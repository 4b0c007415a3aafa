#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident report types.
//!
//! A [`Report`] moves forward through [`ReportStatus`] one step at a time,
//! driven by [`ReportCommand`]s. Category, location, reporter, and creation
//! time never change after submission.

use chrono::{DateTime, Utc};
use relief_map_geography_models::Coordinate;
use relief_map_weather_models::WeatherSnapshot;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Display value for reports without an assigned worker.
pub const UNASSIGNED: &str = "Unassigned";

/// Kind of incident being reported.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ReportCategory {
    /// Waterlogging or flooding
    Flooding,
    /// Road obstructed by trees, vehicles, or debris
    BlockedRoad,
    /// Uncollected garbage
    Garbage,
    /// Loss of electricity supply
    PowerOutage,
    /// Anything else
    Other,
}

impl ReportCategory {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Flooding => "Flooding",
            Self::BlockedRoad => "Blocked Road",
            Self::Garbage => "Garbage",
            Self::PowerOutage => "Power Outage",
            Self::Other => "Other",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Flooding,
            Self::BlockedRoad,
            Self::Garbage,
            Self::PowerOutage,
            Self::Other,
        ]
    }
}

/// Lifecycle status of a report.
///
/// Ordered: each status may only advance to the next one.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ReportStatus {
    /// Filed, awaiting triage
    Pending,
    /// Admin picked a field team
    Assigned,
    /// Field team started the mission
    Accepted,
    /// Field team verified on site by GPS
    Arrived,
    /// Resolution evidence awaiting admin review
    SubmittedForReview,
    /// Admin approved the resolution
    Resolved,
}

impl ReportStatus {
    /// The status that follows this one, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Pending => Some(Self::Assigned),
            Self::Assigned => Some(Self::Accepted),
            Self::Accepted => Some(Self::Arrived),
            Self::Arrived => Some(Self::SubmittedForReview),
            Self::SubmittedForReview => Some(Self::Resolved),
            Self::Resolved => None,
        }
    }

    /// Whether work on the report is still outstanding.
    #[must_use]
    pub const fn is_open(self) -> bool {
        !matches!(self, Self::Resolved)
    }

    /// Returns all variants of this enum in lifecycle order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Pending,
            Self::Assigned,
            Self::Accepted,
            Self::Arrived,
            Self::SubmittedForReview,
            Self::Resolved,
        ]
    }
}

/// Triage severity of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum ReportSeverity {
    /// Minor inconvenience
    Low,
    /// Default for new reports
    #[default]
    Medium,
    /// Danger to life or property
    High,
}

/// Who filed the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reporter {
    /// Reporter name.
    pub name: String,
    /// Contact phone number.
    pub phone: String,
    /// Postal code.
    pub pincode: Option<String>,
    /// Nearby landmark.
    pub landmark: Option<String>,
}

/// Observed water level at a flooding site.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum WaterLevel {
    /// Ankle deep
    AnkleLevel,
    /// Knee deep
    KneeLevel,
    /// Waist deep
    WaistLevel,
    /// Above waist or entering houses
    AboveWaist,
}

/// What is blocking a road.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum ObstructionType {
    /// Fallen tree or branch
    FallenTree,
    /// Vehicle accident
    VehicleAccident,
    /// Debris or landslide
    Debris,
    /// Pothole or road collapse
    RoadCollapse,
}

/// Category-specific incident details, tagged by category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all_fields = "camelCase")]
pub enum CategoryDetails {
    /// Flooding details.
    Flooding {
        /// Current water level.
        water_level: WaterLevel,
        /// Approximate area affected.
        area_affected: Option<String>,
    },
    /// Road obstruction details.
    BlockedRoad {
        /// Kind of obstruction.
        obstruction_type: ObstructionType,
    },
    /// Garbage details.
    Garbage {
        /// Free-form note.
        note: Option<String>,
    },
    /// Power outage details.
    PowerOutage {
        /// Free-form note.
        note: Option<String>,
    },
    /// Details for anything else.
    Other {
        /// Free-form note.
        note: Option<String>,
    },
}

impl CategoryDetails {
    /// The category these details belong to.
    #[must_use]
    pub const fn category(&self) -> ReportCategory {
        match self {
            Self::Flooding { .. } => ReportCategory::Flooding,
            Self::BlockedRoad { .. } => ReportCategory::BlockedRoad,
            Self::Garbage { .. } => ReportCategory::Garbage,
            Self::PowerOutage { .. } => ReportCategory::PowerOutage,
            Self::Other { .. } => ReportCategory::Other,
        }
    }
}

/// Evidence a worker attaches when submitting a resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionEvidence {
    /// Link to an after photo.
    pub image_url: Option<String>,
    /// Link to an after video.
    pub video_url: Option<String>,
    /// Worker that submitted the resolution.
    pub submitted_by: String,
    /// When the resolution was submitted.
    pub submitted_at: DateTime<Utc>,
}

/// Evidence attached to a report. Only external links are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// Link to a photo of the incident.
    pub image_url: Option<String>,
    /// Link to a video of the incident.
    pub video_url: Option<String>,
    /// Category-specific details.
    pub details: CategoryDetails,
    /// Resolution notes from the field team.
    pub notes: Option<String>,
    /// Resolution evidence from the field team.
    pub resolution: Option<ResolutionEvidence>,
}

/// Where a worker was when arrival was verified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedLocation {
    /// Worker GPS latitude.
    pub latitude: f64,
    /// Worker GPS longitude.
    pub longitude: f64,
    /// Distance from the incident site at arrival.
    pub distance_from_site_meters: f64,
}

/// Arrival record. Timestamp and location are always set together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrival {
    /// When arrival was verified.
    pub timestamp: DateTime<Utc>,
    /// Verified worker position.
    pub verified_location: VerifiedLocation,
}

/// An incident report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Unique identifier.
    pub id: String,
    /// Incident category.
    pub category: ReportCategory,
    /// Incident site.
    pub location: Coordinate,
    /// Lifecycle status.
    pub status: ReportStatus,
    /// Who filed the report.
    pub reporter: Reporter,
    /// Evidence and details.
    pub evidence: Evidence,
    /// Responsible field team, `None` while unassigned.
    pub assigned_worker: Option<String>,
    /// Triage severity.
    pub severity: ReportSeverity,
    /// Weather at the site when the report was filed.
    pub weather_context: WeatherSnapshot,
    /// Set once, on the transition to [`ReportStatus::Arrived`].
    pub arrival: Option<Arrival>,
    /// Account that submitted the report.
    pub submitted_by: String,
    /// When the report was filed.
    pub created_at: DateTime<Utc>,
    /// When an admin approved the resolution.
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Assigned worker name, or [`UNASSIGNED`].
    #[must_use]
    pub fn assigned_worker_label(&self) -> &str {
        self.assigned_worker.as_deref().unwrap_or(UNASSIGNED)
    }

    /// Whether `name` is the assigned worker.
    #[must_use]
    pub fn is_assigned_to(&self, name: &str) -> bool {
        self.assigned_worker.as_deref() == Some(name)
    }
}

/// Evidence supplied with a new report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvidence {
    /// Link to a photo.
    pub image_url: Option<String>,
    /// Link to a video.
    pub video_url: Option<String>,
    /// Category-specific details.
    pub details: CategoryDetails,
}

/// A report as submitted, before validation and enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    /// Incident category.
    pub category: ReportCategory,
    /// Incident site.
    pub location: Coordinate,
    /// Who is reporting.
    pub reporter: Reporter,
    /// Evidence and details.
    pub evidence: NewEvidence,
    /// Initial severity; only honored for admin call-in entries.
    pub severity: Option<ReportSeverity>,
}

/// A state-changing request against an existing report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ReportCommand {
    /// Admin assigns a field team.
    AssignWorker {
        /// Worker account name.
        worker: String,
    },
    /// Assigned worker starts the mission.
    StartMission,
    /// Assigned worker requests GPS arrival verification.
    MarkArrived {
        /// Worker GPS latitude.
        gps_lat: f64,
        /// Worker GPS longitude.
        gps_lng: f64,
    },
    /// Assigned worker submits resolution evidence.
    SubmitResolution {
        /// Resolution notes (required).
        notes: String,
        /// Link to an after photo.
        image_url: Option<String>,
        /// Link to an after video.
        video_url: Option<String>,
    },
    /// Admin approves the resolution.
    Approve,
}

impl ReportCommand {
    /// Short action name for logs and errors.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::AssignWorker { .. } => "assignWorker",
            Self::StartMission => "startMission",
            Self::MarkArrived { .. } => "markArrived",
            Self::SubmitResolution { .. } => "submitResolution",
            Self::Approve => "approve",
        }
    }
}
