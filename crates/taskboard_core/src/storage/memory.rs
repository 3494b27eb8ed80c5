//! In-process storage medium.
//!
//! Clones share the same contents, like every handle to one browser origin's
//! local storage. The medium can be switched unavailable to model disabled
//! storage (private browsing, blocked cookies).

use super::{entry_size, KeyValueStorage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct MemoryState {
    items: HashMap<String, String>,
    available: bool,
}

/// Shared in-memory key-value medium with an optional byte quota.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    state: Arc<Mutex<MemoryState>>,
    quota_bytes: Option<u64>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Creates an empty, available medium without quota.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState {
                items: HashMap::new(),
                available: true,
            })),
            quota_bytes: None,
        }
    }

    /// Creates an empty medium rejecting writes that push the total size of
    /// all keys and values above `quota_bytes`.
    pub fn with_quota(quota_bytes: u64) -> Self {
        Self {
            quota_bytes: Some(quota_bytes),
            ..Self::new()
        }
    }

    /// Switches the medium on or off for every clone.
    pub fn set_available(&self, available: bool) {
        self.lock().available = available;
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_available(&self) -> StorageResult<MutexGuard<'_, MemoryState>> {
        let state = self.lock();
        if !state.available {
            return Err(StorageError::Unavailable(
                "memory storage is disabled".to_string(),
            ));
        }
        Ok(state)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock_available()?.items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut state = self.lock_available()?;

        if let Some(quota) = self.quota_bytes {
            let others: u64 = state
                .items
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(k, v)| entry_size(k, v))
                .sum();
            let attempted_bytes = entry_size(key, value);
            if others + attempted_bytes > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    attempted_bytes,
                    quota_bytes: Some(quota),
                });
            }
        }

        state.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.lock_available()?.items.remove(key);
        Ok(())
    }
}
