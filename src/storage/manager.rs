//! Storage Manager
//!
//! Manages multiple SSTables and coordinates reads/writes.
//!
//! ## Responsibilities
//! - Discover existing SSTables on startup
//! - Search SSTables newest → oldest for reads
//! - Create new SSTables from MemTable flushes
//! - Merge every SSTable into one during compaction
//! - Hand out range cursors for merged scans
//!
//! ## Files
//! ```text
//! sstables/
//!   ├── compacted_000007.sst   (full merge of tables 1..=6)
//!   ├── sstable_000008.sst     (MemTable flush)
//!   └── sstable_000009.sst.tmp (in progress; removed on open)
//! ```
//! A table only gets its final name once it is complete and synced. A
//! compacted table replaces every table with a lower ID, so leftovers from
//! an interrupted compaction are deleted on open.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};

use crate::error::{LedgerError, Result};
use crate::iterator::RangeIterator;
use crate::memtable::{MemTable, MemTableEntry};
use crate::types::{Key, KeyRange};

use super::{SSTable, SSTableBuilder, SSTableIterator, SSTableReader};

const FLUSHED_PREFIX: &str = "sstable_";
const COMPACTED_PREFIX: &str = "compacted_";

/// A table file found in the storage directory
struct TableFile {
    id: u64,
    compacted: bool,
    path: PathBuf,
}

/// Manages the storage layer
///
/// ## Concurrency:
/// - `sstables`: Protected by RwLock (many concurrent readers, exclusive writer)
/// - `next_sstable_id`: Atomic counter (lock-free)
/// - `publish_lock`: flushes and compactions never overlap
/// - All methods use `&self` (no exclusive access needed)
pub struct StorageManager {
    /// Directory where SSTables are stored
    data_dir: PathBuf,

    /// Open SSTable readers, ordered newest → oldest
    sstables: RwLock<Vec<SSTableReader>>,

    /// Next ID for creating new SSTables (atomic, lock-free)
    next_sstable_id: AtomicU64,

    /// Held while a new table is built and published
    publish_lock: Mutex<()>,
}

impl StorageManager {
    /// Open or create storage in the given directory
    ///
    /// On startup:
    /// 1. Create directory if it doesn't exist
    /// 2. Remove unfinished `.tmp` tables and tables superseded by a compaction
    /// 3. Open readers for the rest (loads indexes into RAM)
    /// 4. Order by ID descending (newest first)
    pub fn open(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;

        let mut tables = Vec::new();
        for entry in fs::read_dir(path)? {
            let file_path = entry?.path();
            if !file_path.is_file() {
                continue;
            }
            if file_path.extension().is_some_and(|ext| ext == "tmp") {
                tracing::warn!(path = %file_path.display(), "Removing unfinished SSTable");
                fs::remove_file(&file_path)?;
                continue;
            }
            if let Some(table) = Self::parse_table_file(file_path) {
                tables.push(table);
            }
        }

        let base_id = tables
            .iter()
            .filter(|t| t.compacted)
            .map(|t| t.id)
            .max()
            .unwrap_or(0);
        let mut live = Vec::with_capacity(tables.len());
        for table in tables {
            if table.id < base_id {
                tracing::debug!(path = %table.path.display(), "Removing compacted-away SSTable");
                fs::remove_file(&table.path)?;
            } else {
                live.push(table);
            }
        }

        // Highest ID first
        live.sort_unstable_by(|a, b| b.id.cmp(&a.id));

        let mut sstables = Vec::with_capacity(live.len());
        for table in &live {
            sstables.push(SSTableReader::open(&table.path)?);
        }

        let next_id = live.first().map(|t| t.id + 1).unwrap_or(1);

        tracing::debug!(
            dir = %path.display(),
            sstables = sstables.len(),
            next_id,
            "Storage opened"
        );

        Ok(Self {
            data_dir: path.to_path_buf(),
            sstables: RwLock::new(sstables),
            next_sstable_id: AtomicU64::new(next_id),
            publish_lock: Mutex::new(()),
        })
    }

    /// Get a value by key (searches all SSTables newest → oldest)
    ///
    /// Returns:
    /// - `Ok(Some(value))` — key found with value
    /// - `Ok(None)` — key not found, or newest entry is a tombstone
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let sstables = self.sstables.read();

        for reader in sstables.iter() {
            if !reader.might_contain(key) {
                continue;
            }
            if let Some(entry) = reader.get(key)? {
                return Ok(entry.into_value());
            }
        }

        Ok(None)
    }

    /// Presence check without reading the value payload
    pub fn contains(&self, key: &[u8]) -> Result<bool> {
        let sstables = self.sstables.read();

        for reader in sstables.iter() {
            if !reader.might_contain(key) {
                continue;
            }
            if let Some(live) = reader.contains(key)? {
                return Ok(live);
            }
        }

        Ok(false)
    }

    /// Open a cursor over `range` in every SSTable, newest first
    ///
    /// Tombstones are included; the caller merges and filters.
    pub fn range_cursors(&self, range: &KeyRange) -> Result<Vec<SSTableIterator>> {
        let sstables = self.sstables.read();
        sstables.iter().map(|reader| reader.range(range)).collect()
    }

    /// Flush a MemTable to a new SSTable
    ///
    /// Creates a new SSTable file from the MemTable's sorted entries,
    /// opens a reader for it, and adds it to the front of the list.
    pub fn flush(&self, memtable: &MemTable) -> Result<SSTable> {
        if memtable.is_empty() {
            return Err(LedgerError::Storage(
                "Cannot flush empty MemTable".to_string(),
            ));
        }

        let _publishing = self.publish_lock.lock();

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.table_path(FLUSHED_PREFIX, id);

        // Entries are already sorted (BTreeMap)
        let entries = memtable.iter().into_iter().map(Ok::<_, LedgerError>);
        let metadata = self.publish(&path, entries)?;

        let reader = SSTableReader::open(&path)?;
        self.sstables.write().insert(0, reader);

        tracing::debug!(
            id,
            entries = metadata.entry_count,
            bytes = metadata.file_size,
            "MemTable flushed to SSTable"
        );

        Ok(metadata)
    }

    /// Merge every SSTable into one
    ///
    /// Newer versions shadow older ones and tombstones are dropped, since
    /// nothing older remains for them to hide. The merged table is written
    /// even when empty: it marks every lower ID as superseded. Returns
    /// `None` if there was nothing to compact.
    pub fn compact(&self) -> Result<Option<SSTable>> {
        let _publishing = self.publish_lock.lock();

        let (inputs, cursors) = {
            let sstables = self.sstables.read();
            let inputs: Vec<PathBuf> = sstables.iter().map(|r| r.path().to_path_buf()).collect();
            let cursors = sstables
                .iter()
                .map(SSTableReader::iter)
                .collect::<Result<Vec<_>>>()?;
            (inputs, cursors)
        };
        if inputs.is_empty() {
            return Ok(None);
        }

        let id = self.next_sstable_id.fetch_add(1, Ordering::SeqCst);
        let path = self.table_path(COMPACTED_PREFIX, id);

        let merged = RangeIterator::new(Vec::new(), cursors)
            .map(|item| item.map(|(key, value)| (key, MemTableEntry::Value(value))));
        let metadata = self.publish(&path, merged)?;

        let reader = SSTableReader::open(&path)?;
        *self.sstables.write() = vec![reader];

        for input in &inputs {
            if let Err(e) = fs::remove_file(input) {
                // Removed again on the next open
                tracing::warn!(path = %input.display(), error = %e, "Failed to remove compacted SSTable");
            }
        }

        tracing::debug!(
            id,
            inputs = inputs.len(),
            entries = metadata.entry_count,
            "SSTables compacted"
        );

        Ok(Some(metadata))
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.sstables.read().len()
    }

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Get the next SSTable ID (for testing/debugging)
    pub fn next_sstable_id(&self) -> u64 {
        self.next_sstable_id.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Build a table under a `.tmp` name, then move it into place
    fn publish<I>(&self, path: &Path, entries: I) -> Result<SSTable>
    where
        I: Iterator<Item = Result<(Key, MemTableEntry)>>,
    {
        let tmp_path = path.with_extension("sst.tmp");

        let mut metadata = match Self::build(&tmp_path, entries) {
            Ok(metadata) => metadata,
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(e);
            }
        };

        fs::rename(&tmp_path, path)?;
        sync_dir(&self.data_dir)?;

        metadata.path = path.to_path_buf();
        Ok(metadata)
    }

    fn build<I>(path: &Path, entries: I) -> Result<SSTable>
    where
        I: Iterator<Item = Result<(Key, MemTableEntry)>>,
    {
        let mut builder = SSTableBuilder::new(path)?;
        for item in entries {
            match item? {
                (key, MemTableEntry::Value(v)) => builder.add(&key, &v)?,
                (key, MemTableEntry::Tombstone) => builder.add_tombstone(&key)?,
            }
        }
        builder.finish()
    }

    fn table_path(&self, prefix: &str, id: u64) -> PathBuf {
        self.data_dir.join(format!("{}{:06}.sst", prefix, id))
    }

    /// "sstable_000042.sst" → flushed table 42, "compacted_000042.sst" → compacted
    fn parse_table_file(path: PathBuf) -> Option<TableFile> {
        if path.extension()? != "sst" {
            return None;
        }
        let name = path.file_stem()?.to_string_lossy().into_owned();

        let (digits, compacted) = match name.strip_prefix(FLUSHED_PREFIX) {
            Some(digits) => (digits, false),
            None => (name.strip_prefix(COMPACTED_PREFIX)?, true),
        };
        let id = digits.parse().ok()?;

        Some(TableFile { id, compacted, path })
    }
}

/// Make a rename in `dir` durable
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
