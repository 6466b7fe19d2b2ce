//! Per-key mutual exclusion for lifecycle operations.
//!
//! Each lifecycle call holds the lock for its account for the whole
//! read-compute-pay-persist sequence, so two calls against the same
//! membership observe each other's writes. Purchases additionally hold the
//! lock for their time slot while they check and fill capacity. Entries are
//! dropped once no caller holds or waits on them.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of async mutexes addressed by key.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    entries: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> KeyedLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`.
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            entries.retain(|_, slot| Arc::strong_count(slot) > 1);
            entries.entry(key).or_default().clone()
        };
        slot.lock_owned().await
    }

    /// Number of keys currently held or awaited.
    pub fn active_keys(&self) -> usize {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .values()
            .filter(|slot| Arc::strong_count(slot) > 1)
            .count()
    }
}
