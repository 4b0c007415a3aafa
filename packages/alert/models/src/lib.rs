#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hazard alert types.
//!
//! Alerts are broadcast by admins or created automatically by the weather
//! watcher. An alert stops being live when it is deactivated or when its
//! expiry passes, whichever comes first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Substring every automated alert title carries.
pub const AUTOMATED_TITLE_MARKER: &str = "Weather Warning";

/// Title for ordinary automated alerts.
pub const AUTOMATED_TITLE: &str = "Weather Warning";

/// Title for red automated alerts.
pub const URGENT_AUTOMATED_TITLE: &str = "URGENT: Severe Weather Warning";

/// Area used when a broadcast does not name one.
pub const DEFAULT_AREA: &str = "All Hyderabad";

/// Warning level of an alert.
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
pub enum AlertSeverity {
    /// Be aware
    #[default]
    Yellow,
    /// Be prepared
    Orange,
    /// Take action
    Red,
}

/// A broadcast hazard notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    /// Unique identifier.
    pub id: String,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Warning level.
    pub severity: AlertSeverity,
    /// Affected locality or city-wide label.
    pub area: String,
    /// Cleared when an admin deactivates the alert.
    pub is_active: bool,
    /// When the alert was created.
    pub created_at: DateTime<Utc>,
    /// When the alert lapses on its own.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Alert {
    /// Whether the alert is active and not yet expired at `now`.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires| now < expires)
    }

    /// Whether the title follows the automated naming convention.
    #[must_use]
    pub fn is_automated(&self) -> bool {
        self.title.contains(AUTOMATED_TITLE_MARKER)
    }
}

/// An alert before it is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Warning level.
    pub severity: AlertSeverity,
    /// Affected area.
    pub area: String,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
}
