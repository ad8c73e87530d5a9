//! MemTable Tests
//!
//! Tests verify:
//! - Point reads distinguish live values, tombstones and unknown keys
//! - Size accounting across overwrites and deletes
//! - Ordered range snapshots with open and closed bounds
//! - Concurrent writers on distinct keys

use std::sync::Arc;
use std::thread;

use partledger::memtable::{MemTable, MemTableEntry};
use partledger::types::KeyRange;

// =============================================================================
// Helper Functions
// =============================================================================

fn memtable_with(keys: &[&str]) -> MemTable {
    let memtable = MemTable::new();
    for key in keys {
        memtable.put(key.as_bytes().to_vec(), format!("v-{}", key).into_bytes());
    }
    memtable
}

fn keys_of(entries: &[(Vec<u8>, MemTableEntry)]) -> Vec<String> {
    entries
        .iter()
        .map(|(k, _)| String::from_utf8(k.clone()).unwrap())
        .collect()
}

// =============================================================================
// Point Operation Tests
// =============================================================================

#[test]
fn test_new_memtable_is_empty() {
    let memtable = MemTable::default();
    assert!(memtable.is_empty());
    assert_eq!(memtable.entry_count(), 0);
    assert_eq!(memtable.size(), 0);
}

#[test]
fn test_get_distinguishes_three_states() {
    let memtable = MemTable::new();
    memtable.put(b"live".to_vec(), b"1".to_vec());
    memtable.delete(b"gone".to_vec());

    assert_eq!(memtable.get(b"live"), Some(MemTableEntry::Value(b"1".to_vec())));
    assert_eq!(memtable.get(b"gone"), Some(MemTableEntry::Tombstone));
    assert_eq!(memtable.get(b"never"), None);
}

#[test]
fn test_contains_matches_get() {
    let memtable = MemTable::new();
    memtable.put(b"live".to_vec(), b"1".to_vec());
    memtable.delete(b"gone".to_vec());

    assert_eq!(memtable.contains(b"live"), Some(true));
    assert_eq!(memtable.contains(b"gone"), Some(false));
    assert_eq!(memtable.contains(b"never"), None);
}

#[test]
fn test_overwrite_keeps_one_entry() {
    let memtable = MemTable::new();
    memtable.put(b"key".to_vec(), b"old".to_vec());
    memtable.put(b"key".to_vec(), b"new".to_vec());

    assert_eq!(memtable.entry_count(), 1);
    assert_eq!(memtable.get(b"key"), Some(MemTableEntry::Value(b"new".to_vec())));
}

#[test]
fn test_put_after_delete_revives_key() {
    let memtable = MemTable::new();
    memtable.put(b"key".to_vec(), b"first".to_vec());
    memtable.delete(b"key".to_vec());
    memtable.put(b"key".to_vec(), b"second".to_vec());

    assert_eq!(memtable.get(b"key").and_then(MemTableEntry::into_value), Some(b"second".to_vec()));
}

#[test]
fn test_empty_value_is_present() {
    let memtable = MemTable::new();
    memtable.put(b"key".to_vec(), vec![]);

    assert_eq!(memtable.get(b"key"), Some(MemTableEntry::Value(vec![])));
    assert_eq!(memtable.contains(b"key"), Some(true));
}

// =============================================================================
// Size Tracking Tests
// =============================================================================

#[test]
fn test_put_returns_new_size() {
    let memtable = MemTable::new();

    let after_first = memtable.put(b"ab".to_vec(), b"cde".to_vec());
    let after_second = memtable.put(b"f".to_vec(), b"gh".to_vec());

    assert_eq!(after_first, 5);
    assert_eq!(after_second, 8);
    assert_eq!(memtable.size(), 8);
}

#[test]
fn test_size_follows_overwrite_and_delete() {
    let memtable = MemTable::new();

    memtable.put(b"key".to_vec(), b"short".to_vec());
    assert_eq!(memtable.size(), 3 + 5);

    memtable.put(b"key".to_vec(), b"much_longer_value".to_vec());
    assert_eq!(memtable.size(), 3 + 17);

    // Tombstone accounts for the key only
    let after_delete = memtable.delete(b"key".to_vec());
    assert_eq!(after_delete, 3);
}

#[test]
fn test_clear_resets_everything() {
    let memtable = memtable_with(&["a", "b"]);
    memtable.delete(b"c".to_vec());

    memtable.clear();

    assert!(memtable.is_empty());
    assert_eq!(memtable.size(), 0);
    assert_eq!(memtable.get(b"a"), None);
    assert_eq!(memtable.get(b"c"), None);
}

// =============================================================================
// Ordered Snapshot Tests
// =============================================================================

#[test]
fn test_iter_is_sorted_regardless_of_insert_order() {
    let memtable = memtable_with(&["cherry", "apple", "banana"]);

    assert_eq!(keys_of(&memtable.iter()), vec!["apple", "banana", "cherry"]);
}

#[test]
fn test_iter_includes_tombstones() {
    let memtable = memtable_with(&["a", "c"]);
    memtable.delete(b"b".to_vec());

    let entries = memtable.iter();
    assert_eq!(keys_of(&entries), vec!["a", "b", "c"]);
    assert_eq!(entries[1].1, MemTableEntry::Tombstone);
}

#[test]
fn test_iter_is_a_snapshot() {
    let memtable = memtable_with(&["key"]);

    let entries = memtable.iter();
    memtable.put(b"key".to_vec(), b"modified".to_vec());
    memtable.put(b"other".to_vec(), b"x".to_vec());

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].1, MemTableEntry::Value(b"v-key".to_vec()));
}

#[test]
fn test_range_half_open() {
    let memtable = memtable_with(&["a", "b", "c", "d"]);

    let entries = memtable.range(&KeyRange::new(b"b", b"d"));
    assert_eq!(keys_of(&entries), vec!["b", "c"]);
}

#[test]
fn test_range_open_bounds() {
    let memtable = memtable_with(&["a", "b", "c", "d"]);

    assert_eq!(keys_of(&memtable.range(&KeyRange::new(b"", b"c"))), vec!["a", "b"]);
    assert_eq!(keys_of(&memtable.range(&KeyRange::new(b"c", b""))), vec!["c", "d"]);
    assert_eq!(memtable.range(&KeyRange::new(b"", b"")).len(), 4);
}

#[test]
fn test_range_inverted_is_empty() {
    let memtable = memtable_with(&["a", "b", "c"]);

    assert!(memtable.range(&KeyRange::new(b"c", b"a")).is_empty());
    assert!(memtable.range(&KeyRange::new(b"b", b"b")).is_empty());
}

#[test]
fn test_many_entries_sorted() {
    let memtable = MemTable::new();
    for i in (0..1000).rev() {
        memtable.put(format!("key{:04}", i).into_bytes(), vec![0u8; 8]);
    }

    let entries = memtable.iter();
    assert_eq!(entries.len(), 1000);
    assert!(entries.windows(2).all(|w| w[0].0 < w[1].0));
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_concurrent_writers_distinct_keys() {
    let memtable = Arc::new(MemTable::new());

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let mt = Arc::clone(&memtable);
            thread::spawn(move || {
                for j in 0..50 {
                    let key = format!("t{}_{:02}", t, j).into_bytes();
                    mt.put(key, format!("{}", j).into_bytes());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(memtable.entry_count(), 400);
    assert_eq!(memtable.get(b"t3_07"), Some(MemTableEntry::Value(b"7".to_vec())));
}

#[test]
fn test_readers_see_whole_values_during_writes() {
    let memtable = Arc::new(MemTable::new());
    memtable.put(b"key".to_vec(), vec![b'a'; 64]);

    let writer = {
        let mt = Arc::clone(&memtable);
        thread::spawn(move || {
            for i in 0..200 {
                let fill = if i % 2 == 0 { b'b' } else { b'a' };
                mt.put(b"key".to_vec(), vec![fill; 64]);
            }
        })
    };

    for _ in 0..200 {
        if let Some(MemTableEntry::Value(v)) = memtable.get(b"key") {
            assert_eq!(v.len(), 64);
            assert!(v.iter().all(|&b| b == v[0]));
        } else {
            panic!("key must stay live");
        }
    }

    writer.join().unwrap();
}
