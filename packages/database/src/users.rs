//! User collection and its unique-field indexes.
//!
//! Accounts are keyed by name. `user_phones` and `user_national_ids` map
//! the other unique fields back to the owning account name, and all three
//! trees are written in a single transaction.

use relief_map_user_models::{Role, UniqueField, User};
use sled::Transactional as _;
use sled::transaction::{ConflictableTransactionError, TransactionError};

use crate::{Database, DbError, encode, get_document, list_documents};

impl Database {
    /// Stores a new account, claiming its name, phone, and national ID.
    ///
    /// Uniqueness is checked inside the same transaction that writes the
    /// account, so concurrent registrations cannot both claim a value.
    ///
    /// # Errors
    ///
    /// * [`DbError::Duplicate`] naming the first field already taken
    /// * [`DbError::Storage`] or [`DbError::Serialization`] on store failure
    pub fn insert_user(&self, user: &User) -> Result<(), DbError> {
        let bytes = encode(user)?;
        let name = user.name.as_str();
        let phone = user.phone.as_str();
        let national_id = user.national_id.as_deref();

        let result = (&self.users, &self.user_phones, &self.user_national_ids).transaction(
            |(users, phones, national_ids)| {
                if let Some(national_id) = national_id
                    && national_ids.get(national_id)?.is_some()
                {
                    return Err(ConflictableTransactionError::Abort(
                        UniqueField::NationalId,
                    ));
                }
                if users.get(name)?.is_some() {
                    return Err(ConflictableTransactionError::Abort(UniqueField::Name));
                }
                if phones.get(phone)?.is_some() {
                    return Err(ConflictableTransactionError::Abort(UniqueField::Phone));
                }

                users.insert(name, bytes.clone())?;
                phones.insert(phone, name)?;
                if let Some(national_id) = national_id {
                    national_ids.insert(national_id, name)?;
                }
                Ok(())
            },
        );

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(field)) => Err(DbError::Duplicate { field }),
            Err(TransactionError::Storage(e)) => Err(DbError::Storage(e)),
        }
    }

    /// Fetches an account by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn find_user(&self, name: &str) -> Result<Option<User>, DbError> {
        get_document(&self.users, name)
    }

    /// Returns every account, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list_users(&self) -> Result<Vec<User>, DbError> {
        list_documents(&self.users)
    }

    /// Returns the accounts holding `role`, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn list_users_by_role(&self, role: Role) -> Result<Vec<User>, DbError> {
        Ok(self
            .list_users()?
            .into_iter()
            .filter(|user| user.role == role)
            .collect())
    }
}
