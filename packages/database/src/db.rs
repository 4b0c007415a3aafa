//! Opening the document store.

use std::path::Path;

use crate::DbError;

const REPORTS_TREE: &str = "reports";
const ALERTS_TREE: &str = "alerts";
const USERS_TREE: &str = "users";
const USER_PHONES_TREE: &str = "user_phones";
const USER_NATIONAL_IDS_TREE: &str = "user_national_ids";

/// Default on-disk location when `DATA_DIR` is not set.
pub const DEFAULT_DATA_DIR: &str = "data/relief_map.sled";

/// Handle to the document store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Database {
    db: sled::Db,
    pub(crate) reports: sled::Tree,
    pub(crate) alerts: sled::Tree,
    pub(crate) users: sled::Tree,
    pub(crate) user_phones: sled::Tree,
    pub(crate) user_national_ids: sled::Tree,
}

impl Database {
    /// Opens (or creates) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Storage`] if the store cannot be opened.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        Self::from_db(sled::open(path)?)
    }

    /// Opens an in-memory store that is discarded on drop.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Storage`] if the store cannot be created.
    pub fn temporary() -> Result<Self, DbError> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    /// Opens the store at `DATA_DIR` (default [`DEFAULT_DATA_DIR`]).
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Storage`] if the store cannot be opened.
    pub fn open_from_env() -> Result<Self, DbError> {
        let dir = std::env::var("DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        log::info!("Opening document store at {dir}");
        Self::open(Path::new(&dir))
    }

    fn from_db(db: sled::Db) -> Result<Self, DbError> {
        Ok(Self {
            reports: db.open_tree(REPORTS_TREE)?,
            alerts: db.open_tree(ALERTS_TREE)?,
            users: db.open_tree(USERS_TREE)?,
            user_phones: db.open_tree(USER_PHONES_TREE)?,
            user_national_ids: db.open_tree(USER_NATIONAL_IDS_TREE)?,
            db,
        })
    }

    /// Flushes dirty pages to disk.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Storage`] if the flush fails.
    pub fn flush(&self) -> Result<(), DbError> {
        self.db.flush()?;
        Ok(())
    }
}
