//! User collection repository over key/value slots.
//!
//! # Responsibility
//! - Serialize the full user collection as a JSON array under one key.
//! - Decode persisted collections and reject malformed ones.
//!
//! # Invariants
//! - Malformed JSON or duplicate ids read back as `None`, which callers treat
//!   as "no durable collection".
//! - Writes always replace the full collection.

use crate::db::{DbError, KeyValueStorage};
use crate::model::user::UserRecord;
use log::{debug, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default slot key holding the user collection.
pub const USERS_STORAGE_KEY: &str = "users";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for user collection persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    Encode(serde_json::Error),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode user collection: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Persistence contract for the canonical user collection.
pub trait UserRepository {
    /// Returns the stored collection, or `None` when nothing usable is stored.
    fn read_users(&self) -> RepoResult<Option<Vec<UserRecord>>>;
    /// Replaces the stored collection.
    fn write_users(&self, users: &[UserRecord]) -> RepoResult<()>;
}

/// JSON-in-a-slot user repository.
pub struct KvUserRepository<S: KeyValueStorage> {
    storage: S,
    key: String,
}

impl<S: KeyValueStorage> KvUserRepository<S> {
    /// Creates a repository using the default `users` key.
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, USERS_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        self.key.as_str()
    }
}

impl<S: KeyValueStorage> UserRepository for KvUserRepository<S> {
    fn read_users(&self) -> RepoResult<Option<Vec<UserRecord>>> {
        let Some(raw) = self.storage.read_slot(&self.key)? else {
            debug!("event=users_read module=repo status=absent key={}", self.key);
            return Ok(None);
        };

        match decode_users(&raw) {
            Ok(users) => {
                debug!(
                    "event=users_read module=repo status=ok key={} count={}",
                    self.key,
                    users.len()
                );
                Ok(Some(users))
            }
            Err(reason) => {
                warn!(
                    "event=users_read module=repo status=invalid key={} reason={}",
                    self.key, reason
                );
                Ok(None)
            }
        }
    }

    fn write_users(&self, users: &[UserRecord]) -> RepoResult<()> {
        let encoded = serde_json::to_string(users).map_err(RepoError::Encode)?;
        self.storage.write_slot(&self.key, &encoded)?;
        debug!(
            "event=users_write module=repo status=ok key={} count={}",
            self.key,
            users.len()
        );
        Ok(())
    }
}

fn decode_users(raw: &str) -> Result<Vec<UserRecord>, String> {
    let users: Vec<UserRecord> =
        serde_json::from_str(raw).map_err(|err| format!("malformed json: {err}"))?;

    let mut seen = HashSet::with_capacity(users.len());
    for user in &users {
        if !seen.insert(user.id.as_str()) {
            return Err(format!("duplicate user id `{}`", user.id));
        }
    }

    Ok(users)
}
