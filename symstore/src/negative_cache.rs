//! Negative-result cache for remote symbol stores.
//!
//! Remote lookups are slow, and most modules in a process have no symbols on
//! any given server. Each HTTP and cloud store remembers which keys it has
//! already confirmed absent so repeated lookups skip the network. Entries never
//! expire; a forced load evicts the entry and checks again.

use std::hash::Hash;

use dashmap::DashMap;

/// Concurrent map of lookup keys to their last observed presence.
#[derive(Debug)]
pub struct NegativeCache<K: Eq + Hash> {
    entries: DashMap<K, bool>,
}

impl<K: Eq + Hash> Default for NegativeCache<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> NegativeCache<K> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Returns true if `key` was previously recorded as absent.
    pub fn is_known_absent(&self, key: &K) -> bool {
        self.entries.get(key).map(|present| !*present).unwrap_or(false)
    }

    /// Record the outcome of a live check.
    pub fn record(&self, key: K, present: bool) {
        self.entries.insert(key, present);
    }

    /// Record that `key` does not exist.
    pub fn record_absent(&self, key: K) {
        self.record(key, false);
    }

    /// Forget whatever is known about `key`.
    pub fn evict(&self, key: &K) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of recorded keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
