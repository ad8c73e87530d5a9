//! Tests for range scans and the range iterator
//!
//! These tests verify:
//! - Byte-lexicographic order across MemTable and SSTables
//! - Open and half-open bounds
//! - Newest version wins, tombstones are skipped
//! - Open / Exhausted / Closed state transitions
//! - Snapshot isolation from later writes and flushes

use partledger::{IteratorState, KeyRange, LedgerError, RangeIterator};

use super::{collect_keys, setup_temp_store};

// =============================================================================
// Ordering and Bounds
// =============================================================================

#[test]
fn test_full_scan_sorts_keys() {
    let (_temp, store) = setup_temp_store();
    store.put(b"b", b"2").unwrap();
    store.put(b"a", b"1").unwrap();
    store.put(b"c", b"3").unwrap();

    let pairs: Vec<_> = store
        .range_scan(b"", b"")
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(
        pairs,
        vec![
            (b"a".to_vec(), b"1".to_vec()),
            (b"b".to_vec(), b"2".to_vec()),
            (b"c".to_vec(), b"3".to_vec()),
        ]
    );
}

#[test]
fn test_byte_order_not_numeric() {
    let (_temp, store) = setup_temp_store();
    for key in ["10", "9", "100", "1"] {
        store.put(key.as_bytes(), b"v").unwrap();
    }

    let keys = collect_keys(store.range_scan(b"", b"").unwrap());

    assert_eq!(keys, vec!["1", "10", "100", "9"]);
}

#[test]
fn test_bounded_scan_is_half_open() {
    let (_temp, store) = setup_temp_store();
    for key in ["a", "b", "c", "d", "e"] {
        store.put(key.as_bytes(), b"v").unwrap();
    }

    assert_eq!(collect_keys(store.range_scan(b"b", b"d").unwrap()), vec!["b", "c"]);
    assert_eq!(collect_keys(store.range_scan(b"", b"c").unwrap()), vec!["a", "b"]);
    assert_eq!(collect_keys(store.range_scan(b"d", b"").unwrap()), vec!["d", "e"]);
    assert!(collect_keys(store.range_scan(b"d", b"b").unwrap()).is_empty());
    assert_eq!(
        collect_keys(store.scan(&KeyRange::new(b"bb", b"dd")).unwrap()),
        vec!["c", "d"]
    );
}

#[test]
fn test_scan_merges_memtable_and_sstables() {
    let (_temp, store) = setup_temp_store();
    store.put(b"a", b"disk-old").unwrap();
    store.put(b"c", b"disk").unwrap();
    store.put(b"e", b"doomed").unwrap();
    store.flush().unwrap();

    store.put(b"b", b"disk-2").unwrap();
    store.put(b"a", b"disk-new").unwrap();
    store.flush().unwrap();

    store.put(b"d", b"mem").unwrap();
    store.delete(b"e").unwrap();

    let pairs: Vec<_> = store
        .range_scan(b"", b"")
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(
        pairs,
        vec![
            (b"a".to_vec(), b"disk-new".to_vec()),
            (b"b".to_vec(), b"disk-2".to_vec()),
            (b"c".to_vec(), b"disk".to_vec()),
            (b"d".to_vec(), b"mem".to_vec()),
        ]
    );
}

#[test]
fn test_scan_skips_tombstone_over_flushed_value() {
    let (_temp, store) = setup_temp_store();
    store.put(b"a", b"1").unwrap();
    store.put(b"b", b"2").unwrap();
    store.flush().unwrap();
    store.delete(b"a").unwrap();
    store.flush().unwrap();

    assert_eq!(collect_keys(store.range_scan(b"", b"").unwrap()), vec!["b"]);
}

// =============================================================================
// State Machine
// =============================================================================

#[test]
fn test_next_until_exhausted() {
    let (_temp, store) = setup_temp_store();
    store.put(b"only", b"one").unwrap();

    let mut iter = store.range_scan(b"", b"").unwrap();
    assert_eq!(iter.state(), IteratorState::Open);
    assert!(iter.has_next());
    assert!(iter.has_next());

    assert_eq!(iter.next().unwrap(), (b"only".to_vec(), b"one".to_vec()));

    assert!(!iter.has_next());
    assert_eq!(iter.state(), IteratorState::Exhausted);
    assert!(matches!(iter.next(), Err(LedgerError::IteratorExhausted)));
}

#[test]
fn test_empty_scan_starts_exhausted() {
    let (_temp, store) = setup_temp_store();

    let mut iter = store.range_scan(b"", b"").unwrap();

    assert!(!iter.has_next());
    assert!(matches!(iter.next(), Err(LedgerError::IteratorExhausted)));
}

#[test]
fn test_close_is_idempotent_and_final() {
    let (_temp, store) = setup_temp_store();
    store.put(b"a", b"1").unwrap();
    store.put(b"b", b"2").unwrap();
    store.flush().unwrap();

    let mut iter = store.range_scan(b"", b"").unwrap();
    iter.next().unwrap();

    iter.close();
    iter.close();

    assert_eq!(iter.state(), IteratorState::Closed);
    assert!(!iter.has_next());
    assert!(matches!(iter.next(), Err(LedgerError::IteratorClosed)));
}

#[test]
fn test_close_after_exhaustion() {
    let mut iter = RangeIterator::from_pairs(vec![(b"k".to_vec(), b"v".to_vec())]);
    iter.next().unwrap();
    assert_eq!(iter.state(), IteratorState::Exhausted);

    iter.close();

    assert!(matches!(iter.next(), Err(LedgerError::IteratorClosed)));
}

#[test]
fn test_from_pairs_sorts() {
    let iter = RangeIterator::from_pairs(vec![
        (b"b".to_vec(), b"2".to_vec()),
        (b"a".to_vec(), b"1".to_vec()),
    ]);

    assert_eq!(collect_keys(iter), vec!["a", "b"]);
}

// =============================================================================
// Snapshot Semantics
// =============================================================================

#[test]
fn test_scan_ignores_later_writes() {
    let (_temp, store) = setup_temp_store();
    store.put(b"a", b"1").unwrap();
    store.put(b"c", b"3").unwrap();

    let iter = store.range_scan(b"", b"").unwrap();

    store.put(b"b", b"2").unwrap();
    store.delete(b"c").unwrap();

    assert_eq!(collect_keys(iter), vec!["a", "c"]);
}

#[test]
fn test_scan_survives_flush_mid_iteration() {
    let (_temp, store) = setup_temp_store();
    store.put(b"a", b"disk").unwrap();
    store.flush().unwrap();
    store.put(b"b", b"mem").unwrap();
    store.put(b"c", b"mem").unwrap();

    let mut iter = store.range_scan(b"", b"").unwrap();
    assert_eq!(iter.next().unwrap().0, b"a".to_vec());

    store.put(b"bb", b"new").unwrap();
    store.flush().unwrap();

    let rest: Vec<_> = iter.map(|r| r.unwrap().0).collect();
    assert_eq!(rest, vec![b"b".to_vec(), b"c".to_vec()]);
}
