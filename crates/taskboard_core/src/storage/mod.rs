//! Key-value storage media and the persisted task collection adapter.
//!
//! # Responsibility
//! - Define the whole-value get/set/remove contract of a storage medium.
//! - Provide in-memory and SQLite-backed media.
//! - Serialize the full task collection as one JSON blob under one key.
//!
//! # Invariants
//! - Media only support whole-value access per key; no partial writes.
//! - Quota and availability failures are reported as distinct variants.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;
pub mod task_storage;

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by storage media and the task collection adapter.
#[derive(Debug)]
pub enum StorageError {
    /// Medium cannot be used at all.
    Unavailable(String),
    /// Medium rejected a write for capacity reasons.
    QuotaExceeded {
        key: String,
        /// Size of the rejected entry, key included.
        attempted_bytes: u64,
        quota_bytes: Option<u64>,
    },
    /// Stored blob cannot be decoded into a task collection.
    Corrupted(String),
    /// Task collection cannot be encoded.
    Serialize(serde_json::Error),
    /// SQLite medium failure not covered by the variants above.
    Db(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(reason) => write!(f, "storage is not available: {reason}"),
            Self::QuotaExceeded {
                key,
                attempted_bytes,
                quota_bytes: Some(quota),
            } => write!(
                f,
                "storage quota exceeded while writing `{key}` ({attempted_bytes} bytes, limit {quota} bytes)"
            ),
            Self::QuotaExceeded {
                key,
                attempted_bytes,
                quota_bytes: None,
            } => write!(
                f,
                "storage quota exceeded while writing `{key}` ({attempted_bytes} bytes)"
            ),
            Self::Corrupted(details) => write!(f, "corrupted task data: {details}"),
            Self::Serialize(err) => write!(f, "failed to encode tasks: {err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Serialize(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Whole-value string storage addressed by key.
///
/// Mirrors the browser local storage contract: absent keys read as `None`,
/// writes replace the full value.
pub trait KeyValueStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for &T {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}

/// Bytes a key/value pair occupies against a quota.
pub(crate) fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() + value.len()) as u64
}
