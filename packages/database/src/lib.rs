#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Embedded document store for the relief map.
//!
//! Reports, users, and alerts are independent collections of JSON
//! documents in `sled` trees, keyed by id. There is no referential
//! integrity between collections. Report and alert updates are atomic
//! compare-and-swap operations on the stored bytes, and user registration
//! writes the account and its unique-field indexes in one transaction.

pub mod alerts;
pub mod db;
pub mod reports;
pub mod users;

use relief_map_user_models::UniqueField;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use db::Database;

/// How many times an update re-reads and retries after losing a race.
const MAX_CAS_ATTEMPTS: usize = 8;

/// Errors that can occur during database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Storage engine error.
    #[error("Storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Document (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document does not exist.
    #[error("{collection} document {id} not found")]
    NotFound {
        /// Collection name.
        collection: &'static str,
        /// Document id.
        id: String,
    },

    /// Document id already taken.
    #[error("{collection} document {id} already exists")]
    AlreadyExists {
        /// Collection name.
        collection: &'static str,
        /// Document id.
        id: String,
    },

    /// A unique field is already registered.
    #[error("{} already registered", .field.label())]
    Duplicate {
        /// The conflicting field.
        field: UniqueField,
    },

    /// Concurrent writers kept winning the compare-and-swap.
    #[error("{collection} document {id} is under contention")]
    Contention {
        /// Collection name.
        collection: &'static str,
        /// Document id.
        id: String,
    },
}

/// Error from a read-modify-write update.
#[derive(Debug, Error)]
pub enum UpdateError<E> {
    /// The store failed.
    #[error(transparent)]
    Db(#[from] DbError),

    /// The update closure refused the current document.
    #[error("update rejected: {0}")]
    Rejected(E),
}

fn encode<T: Serialize>(doc: &T) -> Result<Vec<u8>, DbError> {
    Ok(serde_json::to_vec(doc)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DbError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn get_document<T: DeserializeOwned>(tree: &sled::Tree, id: &str) -> Result<Option<T>, DbError> {
    tree.get(id)?.map(|bytes| decode(&bytes)).transpose()
}

fn list_documents<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>, DbError> {
    tree.iter()
        .values()
        .map(|value| decode(&value?))
        .collect()
}

/// Inserts `doc` under `id`, failing if the id is taken.
fn insert_document<T: Serialize>(
    tree: &sled::Tree,
    collection: &'static str,
    id: &str,
    doc: &T,
) -> Result<(), DbError> {
    let bytes = encode(doc)?;
    match tree.compare_and_swap(id, None::<&[u8]>, Some(bytes))? {
        Ok(()) => Ok(()),
        Err(_) => Err(DbError::AlreadyExists {
            collection,
            id: id.to_string(),
        }),
    }
}

/// Applies `apply` to the stored document and swaps the result in.
///
/// The swap only succeeds if the stored bytes are unchanged since they
/// were read. On a lost race the document is re-read and `apply` is
/// evaluated again against the fresh state, so guards inside `apply`
/// always see the value they replace.
fn update_document<T, E, F>(
    tree: &sled::Tree,
    collection: &'static str,
    id: &str,
    mut apply: F,
) -> Result<T, UpdateError<E>>
where
    T: Serialize + DeserializeOwned,
    F: FnMut(T) -> Result<T, E>,
{
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let current = tree
            .get(id)
            .map_err(DbError::from)?
            .ok_or_else(|| DbError::NotFound {
                collection,
                id: id.to_string(),
            })?;

        let updated = apply(decode(&current)?).map_err(UpdateError::Rejected)?;
        let bytes = encode(&updated)?;

        match tree
            .compare_and_swap(id, Some(current), Some(bytes))
            .map_err(DbError::from)?
        {
            Ok(()) => return Ok(updated),
            Err(_) => {
                log::debug!("{collection} {id}: lost compare-and-swap on attempt {attempt}");
            }
        }
    }

    Err(DbError::Contention {
        collection,
        id: id.to_string(),
    }
    .into())
}
