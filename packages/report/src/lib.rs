#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident report workflow.
//!
//! [`lifecycle`] holds the pure state machine, [`submission`] turns a
//! citizen or admin submission into a stored report, [`projection`]
//! provides the dashboard and map views, and [`service::ReportService`]
//! ties them to the document store and weather provider.

pub mod lifecycle;
pub mod projection;
pub mod service;
pub mod submission;

use relief_map_database::DbError;
use relief_map_user_models::Role;
use thiserror::Error;

pub use lifecycle::TransitionError;
pub use service::ReportService;

/// Errors from report operations.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Submission or command payload is malformed.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Caller's role does not permit the operation.
    #[error("A {role} may not {action}")]
    Forbidden {
        /// Attempted action.
        action: &'static str,
        /// Caller's role.
        role: Role,
    },

    /// No report with this id.
    #[error("Report {id} not found")]
    NotFound {
        /// Requested id.
        id: String,
    },

    /// The state machine refused the command.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// Storage error.
    #[error(transparent)]
    Database(#[from] DbError),
}

/// Checks an optional evidence link.
///
/// Blank values become `None`; anything else must be an absolute
/// `http://` or `https://` URL with a host.
pub(crate) fn validate_link(value: Option<&str>) -> Result<Option<String>, String> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"))
        .ok_or_else(|| format!("{value} is not an http(s) URL"))?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() || value.chars().any(char::is_whitespace) {
        return Err(format!("{value} is not a valid URL"));
    }

    Ok(Some(value.to_string()))
}
