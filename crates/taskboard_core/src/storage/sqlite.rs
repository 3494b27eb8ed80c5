//! SQLite-backed storage medium.
//!
//! # Responsibility
//! - Persist whole string values per key in the `kv_store` table.
//! - Enforce an optional byte quota across all stored keys.
//!
//! # Invariants
//! - The connection must come from `db::open_db*` (migrations applied).
//! - SQLite "disk full" surfaces as `QuotaExceeded`; read-only or unopenable
//!   databases surface as `Unavailable`.

use super::{entry_size, KeyValueStorage, StorageError, StorageResult};
use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};

/// Key-value medium over one SQLite connection.
pub struct SqliteStorage {
    conn: Connection,
    quota_bytes: Option<u64>,
}

impl SqliteStorage {
    /// Wraps a migrated connection.
    ///
    /// # Errors
    /// - `Unavailable` when the schema is older than this binary expects.
    pub fn try_new(conn: Connection) -> StorageResult<Self> {
        let actual = current_user_version(&conn)?;
        let expected = latest_version();
        if actual < expected {
            return Err(StorageError::Unavailable(format!(
                "database schema version {actual} is older than required {expected}"
            )));
        }
        Ok(Self {
            conn,
            quota_bytes: None,
        })
    }

    /// Sets the byte quota. `None` removes it.
    pub fn with_quota(mut self, quota_bytes: Option<u64>) -> Self {
        self.quota_bytes = quota_bytes;
        self
    }

    /// Underlying connection, for diagnostics and maintenance.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn used_bytes_excluding(&self, key: &str) -> StorageResult<u64> {
        let used: i64 = self
            .conn
            .query_row(
                "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
                 FROM kv_store
                 WHERE key <> ?1;",
                [key],
                |row| row.get(0),
            )
            .map_err(map_sqlite_error(key, 0))?;
        Ok(u64::try_from(used).unwrap_or(0))
    }
}

impl KeyValueStorage for SqliteStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv_store WHERE key = ?1;", [key], |row| {
                row.get(0)
            })
            .optional()
            .map_err(map_sqlite_error(key, 0))
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let attempted_bytes = entry_size(key, value);
        if let Some(quota) = self.quota_bytes {
            if self.used_bytes_excluding(key)? + attempted_bytes > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    attempted_bytes,
                    quota_bytes: Some(quota),
                });
            }
        }

        self.conn
            .execute(
                "INSERT INTO kv_store (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![key, value],
            )
            .map_err(map_sqlite_error(key, attempted_bytes))?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1;", [key])
            .map_err(map_sqlite_error(key, 0))?;
        Ok(())
    }
}

/// `attempted_bytes` is the entry size for writes and `0` otherwise.
fn map_sqlite_error(
    key: &str,
    attempted_bytes: u64,
) -> impl Fn(rusqlite::Error) -> StorageError + '_ {
    move |err| match err.sqlite_error_code() {
        Some(ErrorCode::DiskFull) => StorageError::QuotaExceeded {
            key: key.to_string(),
            attempted_bytes,
            quota_bytes: None,
        },
        Some(ErrorCode::ReadOnly | ErrorCode::CannotOpen | ErrorCode::PermissionDenied) => {
            StorageError::Unavailable(err.to_string())
        }
        _ => StorageError::Db(DbError::Sqlite(err)),
    }
}
