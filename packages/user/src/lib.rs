#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! User directory: registration, authentication, and role lookup.
//!
//! Names, phone numbers, and citizen national IDs are unique across the
//! directory. Passwords are stored only as Argon2id hashes.

pub mod password;

use chrono::Utc;
use relief_map_database::{Database, DbError};
use relief_map_user_models::{Caller, NewUser, Role, UniqueField, User};
use thiserror::Error;

/// Errors from user directory operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// A registration field is missing or malformed.
    #[error("Invalid {field}: {message}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// Another account already holds a unique value.
    #[error("{} already registered", .field.label())]
    Duplicate {
        /// The conflicting field.
        field: UniqueField,
    },

    /// Unknown user or wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Caller may not register accounts with this role.
    #[error("Only admins may register {role} accounts")]
    Forbidden {
        /// Requested role.
        role: Role,
    },

    /// Password hashing failed.
    #[error("Password hashing error: {message}")]
    Hash {
        /// Underlying error text.
        message: String,
    },

    /// Storage error.
    #[error(transparent)]
    Database(DbError),
}

impl From<DbError> for UserError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Duplicate { field } => Self::Duplicate { field },
            other => Self::Database(other),
        }
    }
}

/// Account registry backed by the document store.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    db: Database,
}

impl UserDirectory {
    /// Creates a directory over `db`.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Registers a new account on behalf of `requested_by`.
    ///
    /// Anyone, including anonymous callers, may register a citizen. Only
    /// admins may register workers and admins.
    ///
    /// # Errors
    ///
    /// * [`UserError::Forbidden`] if a non-admin requests a staff account
    /// * [`UserError::Validation`] for missing or misplaced fields
    /// * [`UserError::Duplicate`] naming the first conflicting field
    pub fn register(
        &self,
        requested_by: Option<&Caller>,
        new_user: NewUser,
    ) -> Result<User, UserError> {
        if new_user.role != Role::Citizen && !requested_by.is_some_and(Caller::is_admin) {
            return Err(UserError::Forbidden {
                role: new_user.role,
            });
        }

        let user = validate(new_user)?;
        self.db.insert_user(&user)?;
        log::info!("Registered {} account {}", user.role, user.name);
        Ok(user)
    }

    /// Verifies credentials and returns the matching account.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::InvalidCredentials`] for an unknown name or a
    /// wrong password alike.
    pub fn authenticate(&self, name: &str, password: &str) -> Result<User, UserError> {
        let Some(user) = self.db.find_user(name.trim())? else {
            // Spend the same hashing effort as a real check.
            let _decoy = password::hash_password(password).ok();
            log::warn!("Rejected login for unknown user");
            return Err(UserError::InvalidCredentials);
        };

        match password::verify_password(password, &user.password_hash) {
            Ok(true) => Ok(user),
            Ok(false) => {
                log::warn!("Rejected login for {}", user.name);
                Err(UserError::InvalidCredentials)
            }
            Err(e) => {
                log::error!("Stored password hash for {} is unreadable: {e}", user.name);
                Err(UserError::InvalidCredentials)
            }
        }
    }

    /// Looks up an account by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn find(&self, name: &str) -> Result<Option<User>, UserError> {
        Ok(self.db.find_user(name)?)
    }

    /// Lists accounts holding `role`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list_by_role(&self, role: Role) -> Result<Vec<User>, UserError> {
        Ok(self.db.list_users_by_role(role)?)
    }

    /// Lists every account.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list_all(&self) -> Result<Vec<User>, UserError> {
        Ok(self.db.list_users()?)
    }

    /// Creates the admin account `name` unless it already exists.
    ///
    /// Returns whether an account was created.
    ///
    /// # Errors
    ///
    /// Returns validation, duplicate, or storage errors from registration.
    pub fn ensure_admin(
        &self,
        name: &str,
        password: &str,
        phone: &str,
        department: &str,
    ) -> Result<bool, UserError> {
        if self.db.find_user(name)?.is_some() {
            return Ok(false);
        }

        let bootstrap = Caller {
            name: name.to_string(),
            role: Role::Admin,
        };
        self.register(
            Some(&bootstrap),
            NewUser {
                name: name.to_string(),
                password: password.to_string(),
                role: Role::Admin,
                department: Some(department.to_string()),
                phone: phone.to_string(),
                national_id: None,
                address: None,
                emergency_contact: None,
            },
        )?;
        Ok(true)
    }
}

fn required(field: &'static str, value: &str) -> Result<String, UserError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(UserError::Validation {
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

fn validate(new_user: NewUser) -> Result<User, UserError> {
    let name = required("name", &new_user.name)?;
    if new_user.password.is_empty() {
        return Err(UserError::Validation {
            field: "password",
            message: "must not be blank".to_string(),
        });
    }
    let phone = required("phone", &new_user.phone)?;
    let department = optional(new_user.department);
    let national_id = optional(new_user.national_id);

    if new_user.role.requires_department() && department.is_none() {
        return Err(UserError::Validation {
            field: "department",
            message: format!("required for {} accounts", new_user.role),
        });
    }
    if new_user.role != Role::Citizen && national_id.is_some() {
        return Err(UserError::Validation {
            field: "nationalId",
            message: "only recorded for citizens".to_string(),
        });
    }

    Ok(User {
        name,
        password_hash: password::hash_password(&new_user.password)?,
        role: new_user.role,
        department: if new_user.role.requires_department() {
            department
        } else {
            None
        },
        phone,
        national_id,
        address: optional(new_user.address),
        emergency_contact: optional(new_user.emergency_contact),
        created_at: Utc::now(),
    })
}
