//! Storage for per-callable registry state.
//!
//! All four strategy registries are maps from callable identity to some
//! outstanding state; this module provides the shared concurrent map they
//! use.

use dashmap::DashMap;
use std::hash::Hash;

/// Thread-safe sharded storage backed by DashMap.
///
/// DashMap provides lock-free reads and fine-grained locking for writes.
/// Decision logic runs inside a single entry guard; callers must drop the
/// guard (return from the closure) before invoking a target so that
/// reentrant calls never deadlock on a shard.
#[derive(Debug)]
pub struct ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    map: DashMap<K, V>,
}

impl<K, V> ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new sharded storage instance.
    pub fn new() -> Self {
        Self {
            map: DashMap::new(),
        }
    }

    /// Access an entry with mutable access, creating it if necessary.
    ///
    /// The factory runs only when the key is absent. The accessor runs
    /// under the entry's shard lock.
    pub fn with_entry_mut<F, R>(&self, key: K, factory: impl FnOnce() -> V, accessor: F) -> R
    where
        F: FnOnce(&mut V) -> R,
    {
        let entry = self.map.entry(key);
        let mut value_ref = entry.or_insert_with(factory);
        accessor(&mut value_ref)
    }

    /// Read an entry without creating it.
    pub fn with_entry<F, R>(&self, key: &K, accessor: F) -> Option<R>
    where
        F: FnOnce(&V) -> R,
    {
        self.map.get(key).map(|value_ref| accessor(value_ref.value()))
    }

    /// Mutate an entry without creating it.
    pub fn with_existing_entry_mut<F, R>(&self, key: &K, accessor: F) -> Option<R>
    where
        F: FnOnce(&mut V) -> R,
    {
        self.map
            .get_mut(key)
            .map(|mut value_ref| accessor(value_ref.value_mut()))
    }

    /// Check if a key exists.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Remove a key and return its value.
    pub fn remove(&self, key: &K) -> Option<(K, V)> {
        self.map.remove(key)
    }

    /// Remove a key only if the predicate holds for its current value.
    ///
    /// The check-and-remove is atomic with respect to other entry access,
    /// which is what timer-fire paths rely on to ignore stale fires.
    pub fn remove_if(&self, key: &K, predicate: impl FnOnce(&K, &V) -> bool) -> Option<(K, V)> {
        self.map.remove_if(key, predicate)
    }

    /// Get the number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if the storage is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.map.clear();
    }
}

impl<K, V> Default for ShardedStorage<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
