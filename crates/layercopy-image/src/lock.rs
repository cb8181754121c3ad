//! Per-identifier mutual exclusion.
//!
//! Two unpacks of the same layer, or two bundles of the same handle, would
//! interleave their copy and extraction steps. Calls holding a guard for the
//! same key run one at a time; distinct keys never contend.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex, PoisonError};

/// A set of currently held keys plus a condition variable to wait on.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    held: Mutex<HashSet<String>>,
    released: Condvar,
}

impl KeyedLocks {
    /// Creates an empty lock set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocks until no other guard holds `key`, then takes it.
    pub fn acquire(&self, key: &str) -> KeyGuard<'_> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        while held.contains(key) {
            tracing::debug!(key, "waiting for key lock");
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        let _ = held.insert(key.to_string());
        KeyGuard {
            locks: self,
            key: key.to_string(),
        }
    }

    #[cfg(test)]
    fn is_held(&self, key: &str) -> bool {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Releases its key when dropped.
#[derive(Debug)]
#[must_use = "the key is released as soon as the guard is dropped"]
pub struct KeyGuard<'a> {
    locks: &'a KeyedLocks,
    key: String,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        let mut held = self
            .locks
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _ = held.remove(&self.key);
        self.locks.released.notify_all();
    }
}
