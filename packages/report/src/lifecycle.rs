//! The report state machine.
//!
//! [`apply`] is pure: it takes the current report and returns the next
//! one or a [`TransitionError`], leaving persistence to the caller. Checks
//! run in a fixed order: caller role, then current status, then the
//! command's own guard.

use chrono::{DateTime, Utc};
use relief_map_geography::distance::distance_between;
use relief_map_geography_models::Coordinate;
use relief_map_report_models::{
    Arrival, Report, ReportCommand, ReportStatus, ResolutionEvidence, VerifiedLocation,
};
use relief_map_user_models::{Caller, Role};
use thiserror::Error;

use crate::validate_link;

/// Furthest a worker may be from the site when marking arrival.
pub const MAX_ARRIVAL_DISTANCE_METERS: f64 = 200.0;

/// A command the current report state does not allow.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    /// The command is not valid from the current status.
    #[error("Cannot {action} a report that is {from}")]
    InvalidTransition {
        /// Status the report was in.
        from: ReportStatus,
        /// Attempted action.
        action: &'static str,
    },

    /// Worker is too far from the incident site.
    #[error("Too far from site: {distance_meters:.1}m away (must be within {max_distance_meters}m)")]
    Proximity {
        /// Measured distance.
        distance_meters: f64,
        /// Allowed distance.
        max_distance_meters: f64,
    },

    /// Command payload is malformed.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Caller may not perform this action on this report.
    #[error("A {role} may not {action} this report")]
    Forbidden {
        /// Attempted action.
        action: &'static str,
        /// Caller's role.
        role: Role,
    },
}

/// Checks a measured arrival distance against the limit (inclusive).
///
/// # Errors
///
/// Returns [`TransitionError::Proximity`] carrying the measured distance
/// if it exceeds [`MAX_ARRIVAL_DISTANCE_METERS`].
pub fn check_proximity(distance_meters: f64) -> Result<(), TransitionError> {
    if distance_meters <= MAX_ARRIVAL_DISTANCE_METERS {
        Ok(())
    } else {
        Err(TransitionError::Proximity {
            distance_meters,
            max_distance_meters: MAX_ARRIVAL_DISTANCE_METERS,
        })
    }
}

/// Applies `command` to `report` on behalf of `caller` at time `now`.
///
/// # Errors
///
/// * [`TransitionError::Forbidden`] if the caller's role or assignment
///   does not permit the command
/// * [`TransitionError::InvalidTransition`] if the report is not in a
///   status the command may start from
/// * [`TransitionError::Proximity`] if arrival is attempted out of range
/// * [`TransitionError::Validation`] for malformed command payloads
pub fn apply(
    mut report: Report,
    caller: &Caller,
    command: &ReportCommand,
    now: DateTime<Utc>,
) -> Result<Report, TransitionError> {
    let action = command.action();

    match command {
        ReportCommand::AssignWorker { worker } => {
            require_role(caller, Role::Admin, action)?;
            require_status(&report, &[ReportStatus::Pending], action)?;
            let worker = worker.trim();
            if worker.is_empty() {
                return Err(TransitionError::Validation {
                    field: "worker",
                    message: "must not be blank".to_string(),
                });
            }
            report.assigned_worker = Some(worker.to_string());
            report.status = ReportStatus::Assigned;
        }
        ReportCommand::StartMission => {
            require_role(caller, Role::Worker, action)?;
            require_status(
                &report,
                &[ReportStatus::Pending, ReportStatus::Assigned],
                action,
            )?;
            require_assignee(&report, caller, action)?;
            report.status = ReportStatus::Accepted;
        }
        ReportCommand::MarkArrived { gps_lat, gps_lng } => {
            require_role(caller, Role::Worker, action)?;
            require_status(&report, &[ReportStatus::Accepted], action)?;
            require_assignee(&report, caller, action)?;

            let position = Coordinate::new(*gps_lat, *gps_lng);
            if !position.is_finite() {
                return Err(TransitionError::Validation {
                    field: "gps",
                    message: "latitude and longitude must be finite numbers".to_string(),
                });
            }
            let distance = distance_between(position, report.location);
            check_proximity(distance)?;

            report.arrival = Some(Arrival {
                timestamp: now,
                verified_location: VerifiedLocation {
                    latitude: *gps_lat,
                    longitude: *gps_lng,
                    distance_from_site_meters: distance,
                },
            });
            report.status = ReportStatus::Arrived;
        }
        ReportCommand::SubmitResolution {
            notes,
            image_url,
            video_url,
        } => {
            require_role(caller, Role::Worker, action)?;
            require_status(&report, &[ReportStatus::Arrived], action)?;
            require_assignee(&report, caller, action)?;

            let notes = notes.trim();
            if notes.is_empty() {
                return Err(TransitionError::Validation {
                    field: "notes",
                    message: "resolution notes are required".to_string(),
                });
            }
            let image_url = link("imageUrl", image_url.as_deref())?;
            let video_url = link("videoUrl", video_url.as_deref())?;

            report.evidence.notes = Some(notes.to_string());
            report.evidence.resolution = Some(ResolutionEvidence {
                image_url,
                video_url,
                submitted_by: caller.name.clone(),
                submitted_at: now,
            });
            report.status = ReportStatus::SubmittedForReview;
        }
        ReportCommand::Approve => {
            require_role(caller, Role::Admin, action)?;
            require_status(&report, &[ReportStatus::SubmittedForReview], action)?;
            report.resolved_at = Some(now);
            report.status = ReportStatus::Resolved;
        }
    }

    Ok(report)
}

fn require_role(caller: &Caller, role: Role, action: &'static str) -> Result<(), TransitionError> {
    if caller.role == role {
        Ok(())
    } else {
        Err(TransitionError::Forbidden {
            action,
            role: caller.role,
        })
    }
}

fn require_status(
    report: &Report,
    allowed: &[ReportStatus],
    action: &'static str,
) -> Result<(), TransitionError> {
    if allowed.contains(&report.status) {
        Ok(())
    } else {
        Err(TransitionError::InvalidTransition {
            from: report.status,
            action,
        })
    }
}

fn require_assignee(
    report: &Report,
    caller: &Caller,
    action: &'static str,
) -> Result<(), TransitionError> {
    if report.is_assigned_to(&caller.name) {
        Ok(())
    } else {
        Err(TransitionError::Forbidden {
            action,
            role: caller.role,
        })
    }
}

fn link(field: &'static str, value: Option<&str>) -> Result<Option<String>, TransitionError> {
    validate_link(value).map_err(|message| TransitionError::Validation { field, message })
}
