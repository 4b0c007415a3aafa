#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! User account types.
//!
//! Citizens file reports, workers (field teams) carry them out, and admins
//! triage. A [`Caller`] is the already-authenticated identity handed to
//! every role-gated operation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Account role.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Member of the public filing reports.
    Citizen,
    /// Field team carrying out assigned tasks.
    Worker,
    /// Administrator triaging and approving work.
    Admin,
}

impl Role {
    /// Whether accounts with this role must name a department.
    #[must_use]
    pub const fn requires_department(self) -> bool {
        matches!(self, Self::Worker | Self::Admin)
    }
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique account name, also the login username.
    pub name: String,
    /// Argon2id PHC string.
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Department for workers and admins.
    pub department: Option<String>,
    /// Contact phone number (unique).
    pub phone: String,
    /// National ID (Aadhaar) number, citizens only (unique).
    pub national_id: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Emergency contact number.
    pub emergency_contact: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns the identity this account acts as.
    #[must_use]
    pub fn caller(&self) -> Caller {
        Caller {
            name: self.name.clone(),
            role: self.role,
        }
    }
}

/// A registration request before validation and hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Requested account name.
    pub name: String,
    /// Plaintext password; hashed before storage.
    pub password: String,
    /// Requested role.
    pub role: Role,
    /// Department (required for workers and admins).
    pub department: Option<String>,
    /// Contact phone number.
    pub phone: String,
    /// National ID number (citizens only).
    pub national_id: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Emergency contact number.
    pub emergency_contact: Option<String>,
}

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Caller {
    /// Account name.
    pub name: String,
    /// Account role.
    pub role: Role,
}

impl Caller {
    /// Whether the caller is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Account fields that must be unique across the directory.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum UniqueField {
    /// Account name.
    Name,
    /// Phone number.
    Phone,
    /// National ID number.
    NationalId,
}

impl UniqueField {
    /// Human-readable label for error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Phone => "Phone",
            Self::NationalId => "National ID number",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Citizen, Role::Worker, Role::Admin] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert_eq!(
            serde_json::to_value(Role::Worker).unwrap(),
            serde_json::json!("worker")
        );
    }

    #[test]
    fn only_staff_need_departments() {
        assert!(!Role::Citizen.requires_department());
        assert!(Role::Worker.requires_department());
        assert!(Role::Admin.requires_department());
    }

    #[test]
    fn unique_field_names() {
        assert_eq!(UniqueField::NationalId.to_string(), "nationalId");
        assert_eq!(UniqueField::Phone.label(), "Phone");
    }
}
