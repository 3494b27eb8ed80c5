//! Persisted task collection adapter.
//!
//! # Responsibility
//! - Read and write the full task collection as one JSON array under one key.
//! - Probe the medium before every access so failures surface early.
//!   A full medium passes the probe; only the real write reports quota.
//!
//! # Invariants
//! - Reads are fail-closed: one malformed entry rejects the whole collection.
//! - Writes overwrite the blob with a single `set_item` call.

use super::{KeyValueStorage, StorageError, StorageResult};
use crate::model::task::{is_valid_shape, Task};
use log::{debug, error};
use serde_json::Value;

/// Default key under which the collection is stored.
pub const DEFAULT_STORAGE_KEY: &str = "tasks";

const PROBE_KEY: &str = "__test__";
const PROBE_VALUE: &str = "test";

/// Adapter between the task collection and a key-value medium.
pub struct TaskStorage<S: KeyValueStorage> {
    medium: S,
    key: String,
}

impl<S: KeyValueStorage> TaskStorage<S> {
    /// Creates an adapter using [`DEFAULT_STORAGE_KEY`].
    pub fn new(medium: S) -> Self {
        Self::with_key(medium, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(medium: S, key: impl Into<String>) -> Self {
        Self {
            medium,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn medium(&self) -> &S {
        &self.medium
    }

    /// Returns whether a throwaway write/remove round-trip succeeds.
    ///
    /// A medium that is merely full counts as available, so reads and
    /// shrinking writes keep working at the quota edge.
    pub fn is_available(&self) -> bool {
        self.probe().is_ok()
    }

    /// Loads the full collection.
    ///
    /// Returns an empty collection when nothing has been stored yet.
    ///
    /// # Errors
    /// - `Unavailable` when the medium fails the probe.
    /// - `Corrupted` when the blob is not JSON, not an array, or any entry
    ///   fails the structural check.
    pub fn read_all(&self) -> StorageResult<Vec<Task>> {
        self.ensure_available()?;

        let raw = match self.medium.get_item(&self.key)? {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(Vec::new()),
        };

        let tasks = decode_collection(&raw).inspect_err(|err| {
            error!(
                "event=tasks_read module=storage status=error key={} error={}",
                self.key, err
            );
        })?;
        debug!(
            "event=tasks_read module=storage status=ok key={} count={}",
            self.key,
            tasks.len()
        );
        Ok(tasks)
    }

    /// Overwrites the stored collection with `tasks`.
    ///
    /// # Errors
    /// - `Unavailable` when the medium fails the probe.
    /// - `QuotaExceeded` when the medium rejects the write for capacity.
    pub fn write_all(&self, tasks: &[Task]) -> StorageResult<()> {
        self.ensure_available()?;

        let encoded = serde_json::to_string(tasks).map_err(StorageError::Serialize)?;
        self.medium
            .set_item(&self.key, &encoded)
            .inspect_err(|err| {
                error!(
                    "event=tasks_write module=storage status=error key={} bytes={} error={}",
                    self.key,
                    encoded.len(),
                    err
                );
            })?;

        debug!(
            "event=tasks_write module=storage status=ok key={} count={} bytes={}",
            self.key,
            tasks.len(),
            encoded.len()
        );
        Ok(())
    }

    fn probe(&self) -> StorageResult<()> {
        match self.medium.set_item(PROBE_KEY, PROBE_VALUE) {
            Ok(()) => self.medium.remove_item(PROBE_KEY),
            Err(StorageError::QuotaExceeded { .. }) => Ok(()),
            Err(err) => Err(err),
        }
    }

    fn ensure_available(&self) -> StorageResult<()> {
        self.probe().map_err(|err| match err {
            StorageError::Unavailable(_) => err,
            other => StorageError::Unavailable(format!(
                "probe write for `{}` failed: {other}",
                self.key
            )),
        })
    }
}

fn decode_collection(raw: &str) -> StorageResult<Vec<Task>> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| StorageError::Corrupted(format!("blob is not valid JSON ({err})")))?;

    let Value::Array(entries) = value else {
        return Err(StorageError::Corrupted(
            "invalid tasks data format, expected an array".to_string(),
        ));
    };

    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            if !is_valid_shape(&entry) {
                return Err(invalid_structure(index));
            }
            serde_json::from_value::<Task>(entry).map_err(|_| invalid_structure(index))
        })
        .collect()
}

fn invalid_structure(index: usize) -> StorageError {
    StorageError::Corrupted(format!("invalid task structure at index {index}"))
}
