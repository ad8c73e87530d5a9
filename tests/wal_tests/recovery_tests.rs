//! Tests for WAL Recovery
//!
//! These tests verify:
//! - Clean and empty logs recover fully
//! - Partial writes are cut off and flagged
//! - Recovery stops at the first corrupted entry
//! - Verify reports the same numbers without touching the file

use std::fs::{self, File, OpenOptions};
use std::io::Write;

use partledger::wal::{RecoveryResult, WalEntry, WalRecovery};

use super::{put, setup_temp_wal, write_entries, write_raw};

#[test]
fn test_recover_empty_file() {
    let (_temp, path) = setup_temp_wal();
    File::create(&path).unwrap();

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert!(entries.is_empty());
    assert_eq!(result, RecoveryResult::default());
}

#[test]
fn test_recover_clean_log() {
    let (_temp, path) = setup_temp_wal();
    write_entries(&path, 10);
    let len = fs::metadata(&path).unwrap().len();

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert_eq!(entries.len(), 10);
    assert_eq!(result.entries_recovered, 10);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(result.last_lsn, 10);
    assert_eq!(result.valid_bytes, len);
    assert!(!result.was_truncated);
}

#[test]
fn test_recover_truncates_partial_header() {
    let (_temp, path) = setup_temp_wal();
    write_entries(&path, 3);
    let valid_len = fs::metadata(&path).unwrap().len();

    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[0xAA; 7]).unwrap();
    drop(file);

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert_eq!(entries.len(), 3);
    assert!(result.was_truncated);
    assert_eq!(result.entries_corrupted, 0);
    assert_eq!(fs::metadata(&path).unwrap().len(), valid_len);
}

#[test]
fn test_recover_truncates_partial_data() {
    let (_temp, path) = setup_temp_wal();
    write_raw(&path, &[WalEntry::new(1, put("a", "1"))]);
    let valid_len = fs::metadata(&path).unwrap().len();

    let torn = WalEntry::new(2, put("b", "a value that never fully landed"))
        .serialize()
        .unwrap();
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&torn[..torn.len() / 2]).unwrap();
    drop(file);

    let (entries, result) = WalRecovery::recover(&path).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(result.last_lsn, 1);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&path).unwrap().len(), valid_len);
}

#[test]
fn test_recover_stops_at_first_corruption() {
    let (_temp, path) = setup_temp_wal();
    let entries: Vec<WalEntry> = (1..=4)
        .map(|lsn| WalEntry::new(lsn, put(&format!("k{}", lsn), "v")))
        .collect();
    write_raw(&path, &entries);

    // Damage entry 2; entries 3 and 4 are intact but no longer trusted
    let first_len = entries[0].serialized_size().unwrap();
    let mut bytes = fs::read(&path).unwrap();
    bytes[first_len + 8] ^= 0xFF;
    fs::write(&path, &bytes).unwrap();

    let (recovered, result) = WalRecovery::recover(&path).unwrap();

    assert_eq!(recovered.len(), 1);
    assert_eq!(result.entries_recovered, 1);
    assert_eq!(result.entries_corrupted, 1);
    assert_eq!(result.last_lsn, 1);
    assert!(result.was_truncated);
    assert_eq!(fs::metadata(&path).unwrap().len(), first_len as u64);
}

#[test]
fn test_recover_twice_is_stable() {
    let (_temp, path) = setup_temp_wal();
    write_entries(&path, 2);
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[1, 2, 3]).unwrap();
    drop(file);

    let (_, first) = WalRecovery::recover(&path).unwrap();
    let (entries, second) = WalRecovery::recover(&path).unwrap();

    assert!(first.was_truncated);
    assert!(!second.was_truncated);
    assert_eq!(entries.len(), 2);
}

#[test]
fn test_verify_does_not_modify_file() {
    let (_temp, path) = setup_temp_wal();
    write_entries(&path, 3);
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&[9; 5]).unwrap();
    drop(file);
    let len_before = fs::metadata(&path).unwrap().len();

    let report = WalRecovery::verify(&path).unwrap();

    assert_eq!(report.entries_recovered, 3);
    assert!(report.was_truncated);
    assert!(report.valid_bytes < len_before);
    assert_eq!(fs::metadata(&path).unwrap().len(), len_before);
}
