//! MemTable implementation
//!
//! BTreeMap-based memtable with RwLock for concurrency.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::types::{Key, KeyRange, Value};

use super::MemTableEntry;

/// In-memory table for recent writes
///
/// Every method takes `&self`; the map sits behind a `parking_lot::RwLock`
/// so reads run concurrently and each mutation is atomic.
pub struct MemTable {
    data: RwLock<BTreeMap<Key, MemTableEntry>>,
    /// Approximate size in bytes: key + value for live entries, key for tombstones
    size: AtomicUsize,
}

impl MemTable {
    /// Create a new empty MemTable
    pub fn new() -> Self {
        Self {
            data: RwLock::new(BTreeMap::new()),
            size: AtomicUsize::new(0),
        }
    }

    /// Get an entry by key (read lock)
    ///
    /// `Some(Tombstone)` means the key was deleted here; `None` means this
    /// table knows nothing about the key.
    pub fn get(&self, key: &[u8]) -> Option<MemTableEntry> {
        self.data.read().get(key).cloned()
    }

    /// Presence check without cloning the value
    ///
    /// `Some(true)` live, `Some(false)` tombstone, `None` unknown here.
    pub fn contains(&self, key: &[u8]) -> Option<bool> {
        self.data
            .read()
            .get(key)
            .map(|entry| matches!(entry, MemTableEntry::Value(_)))
    }

    /// Put a key-value pair (write lock), returning the new approximate size
    pub fn put(&self, key: Key, value: Value) -> usize {
        self.insert(key, MemTableEntry::Value(value))
    }

    /// Delete a key (write lock, inserts tombstone), returning the new size
    pub fn delete(&self, key: Key) -> usize {
        self.insert(key, MemTableEntry::Tombstone)
    }

    fn insert(&self, key: Key, entry: MemTableEntry) -> usize {
        let mut data = self.data.write();

        let added = key.len() + entry.value_len();
        let removed = data
            .get(&key)
            .map(|old| key.len() + old.value_len())
            .unwrap_or(0);
        data.insert(key, entry);

        // Adjust under the write lock so size never disagrees with the map
        self.size.fetch_add(added, Ordering::SeqCst);
        self.size.fetch_sub(removed, Ordering::SeqCst);
        self.size.load(Ordering::SeqCst)
    }

    /// Get approximate size in bytes
    pub fn size(&self) -> usize {
        self.size.load(Ordering::SeqCst)
    }

    /// Get entry count (tombstones included)
    pub fn entry_count(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Snapshot of all entries in sorted key order (for flush)
    pub fn iter(&self) -> Vec<(Key, MemTableEntry)> {
        self.range(&KeyRange::all())
    }

    /// Snapshot of the entries inside `range`, tombstones included
    pub fn range(&self, range: &KeyRange) -> Vec<(Key, MemTableEntry)> {
        if range.is_empty() {
            return Vec::new();
        }

        self.data
            .read()
            .range::<[u8], _>(range.as_bounds())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Clear all entries (after successful flush)
    pub fn clear(&self) {
        let mut data = self.data.write();
        data.clear();
        self.size.store(0, Ordering::SeqCst);
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}
