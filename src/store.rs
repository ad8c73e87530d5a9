//! Store Module
//!
//! The world-state store that coordinates all storage components.
//!
//! ## Responsibilities
//! - Coordinate WAL, MemTable, and Storage
//! - Serialize point mutations per key with striped locks
//! - Trigger flushes when MemTable is full
//! - Compact SSTables once too many accumulate
//! - Open snapshot range scans
//! - Manage crash recovery on startup

use std::fs;
use std::path::{Path, PathBuf};

use crossbeam::utils::CachePadded;
use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::error::Result;
use crate::iterator::RangeIterator;
use crate::memtable::MemTable;
use crate::storage::StorageManager;
use crate::types::KeyRange;
use crate::wal::{Operation, WalRecovery, WalWriter};

/// The ordered key-value world-state store
///
/// ## Concurrency Model
///
/// - **Point writes** (put/delete): hold `flush_lock` shared and the key's
///   stripe lock across the WAL append and the MemTable insert, so two
///   mutations of the same key never interleave while different keys
///   proceed in parallel.
///
/// - **Flush**: holds `flush_lock` exclusively, so no write is half applied
///   while the MemTable moves to disk and the WAL is truncated.
///
/// - **Reads** (get/exists): lock-free at this level; MemTable and
///   StorageManager use internal read locks. A flush publishes the new
///   SSTable before clearing the MemTable, so a key is always visible in
///   one of the two.
///
/// - **Range scans**: snapshot the MemTable range and open SSTable cursors
///   under `flush_lock` shared, giving a consistent view as of scan start.
///
/// - **Compaction**: runs after a flush, outside `flush_lock`. Readers swap
///   to the merged table atomically; open cursors keep their own handles.
pub struct Store {
    /// Store configuration
    config: Config,

    /// Directory holding SSTables
    storage_dir: PathBuf,

    /// Write-ahead log for durability (exclusive access needed)
    wal: Mutex<WalWriter>,

    /// In-memory table for recent writes (internal RwLock)
    memtable: MemTable,

    /// Persistent storage manager (internal RwLock on sstables vec)
    storage: StorageManager,

    /// Writers and scans share it; flush takes it exclusively
    flush_lock: RwLock<()>,

    /// Per-key mutation locks, indexed by key hash
    key_locks: Vec<CachePadded<Mutex<()>>>,
}

impl Store {
    // =========================================================================
    // Internal Path Constants
    // =========================================================================
    const WAL_FILENAME: &'static str = "wal.log";
    const SSTABLE_DIR: &'static str = "sstables";

    /// Open or create a store with the given config
    ///
    /// On startup:
    /// 1. Validate config, create data directory
    /// 2. Load existing SSTables
    /// 3. Replay the WAL, flush what it held, truncate it
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        fs::create_dir_all(&config.data_dir)?;

        let storage_dir = config.data_dir.join(Self::SSTABLE_DIR);
        let wal_path = Self::wal_path(&config.data_dir);

        let storage = StorageManager::open(&storage_dir)?;
        let memtable = MemTable::new();

        let mut replayed = false;
        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    recovered = recovery.entries_recovered,
                    corrupted = recovery.entries_corrupted,
                    last_lsn = recovery.last_lsn,
                    truncated = recovery.was_truncated,
                    "WAL recovery complete"
                );
            }

            for entry in entries {
                match entry.operation {
                    Operation::Put { key, value } => {
                        memtable.put(key, value);
                    }
                    Operation::Delete { key } => {
                        memtable.delete(key);
                    }
                }
            }

            // Recovered data must be durable before the WAL goes away
            if !memtable.is_empty() {
                tracing::info!(
                    entries = memtable.entry_count(),
                    "Flushing recovered entries to SSTable"
                );
                storage.flush(&memtable)?;
                memtable.clear();
                replayed = true;
            }
        }

        let mut wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;
        if replayed {
            wal.truncate()?;
        }

        let key_locks = (0..config.lock_stripes)
            .map(|_| CachePadded::new(Mutex::new(())))
            .collect();

        let store = Self {
            config,
            storage_dir,
            wal: Mutex::new(wal),
            memtable,
            storage,
            flush_lock: RwLock::new(()),
            key_locks,
        };
        store.maybe_compact();

        tracing::info!(
            data_dir = %store.config.data_dir.display(),
            sstables = store.storage.sstable_count(),
            "Store opened"
        );

        Ok(store)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Location of the WAL inside a data directory
    pub fn wal_path(data_dir: &Path) -> PathBuf {
        data_dir.join(Self::WAL_FILENAME)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Get a value by key
    ///
    /// Search order:
    /// 1. MemTable (most recent writes)
    /// 2. SSTables (newest to oldest)
    ///
    /// `Ok(None)` means absent; `Ok(Some(vec![]))` is a present empty value.
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(entry) = self.memtable.get(key) {
            return Ok(entry.into_value());
        }

        self.storage.get(key)
    }

    /// Check whether a key is present
    ///
    /// Never reads value bytes: the MemTable is checked without cloning and
    /// SSTables only decode the entry header.
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        if let Some(live) = self.memtable.contains(key) {
            return Ok(live);
        }

        self.storage.contains(key)
    }

    /// Scan `[start, end)` in byte order over a snapshot taken now
    ///
    /// An empty `start` reads from the first key, an empty `end` to the last.
    pub fn range_scan(&self, start: &[u8], end: &[u8]) -> Result<RangeIterator> {
        self.scan(&KeyRange::new(start, end))
    }

    /// Scan an explicit [`KeyRange`]
    pub fn scan(&self, range: &KeyRange) -> Result<RangeIterator> {
        let _shared = self.flush_lock.read();

        let memtable_entries = self.memtable.range(range);
        let cursors = self.storage.range_cursors(range)?;

        tracing::trace!(
            start = ?range.start,
            end = ?range.end,
            memtable_entries = memtable_entries.len(),
            sstables = cursors.len(),
            "Range scan opened"
        );

        Ok(RangeIterator::new(memtable_entries, cursors))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Put a key-value pair, overwriting any previous value
    ///
    /// Steps:
    /// 1. Acquire flush lock (shared) and the key's stripe
    /// 2. Write to WAL (durability)
    /// 3. Write to MemTable
    /// 4. Flush once the locks are released, if the MemTable is full
    ///
    /// Once step 2 succeeds the write is committed, so a failed automatic
    /// flush is logged and retried later instead of being returned.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let new_size = self.apply(key, Some(value))?;
        self.maybe_flush(new_size);
        Ok(())
    }

    /// Delete a key
    ///
    /// Deleting an absent key is a no-op as far as readers can tell; a
    /// tombstone is still logged so an older SSTable value stays hidden.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        let new_size = self.apply(key, None)?;
        self.maybe_flush(new_size);
        Ok(())
    }

    /// Log then apply one mutation; `None` is a delete
    fn apply(&self, key: &[u8], value: Option<&[u8]>) -> Result<usize> {
        let _shared = self.flush_lock.read();
        let _key_guard = self.key_lock(key).lock();

        let operation = match value {
            Some(v) => Operation::Put {
                key: key.to_vec(),
                value: v.to_vec(),
            },
            None => Operation::Delete { key: key.to_vec() },
        };
        let lsn = self.wal.lock().append(operation)?;

        let new_size = match value {
            Some(v) => self.memtable.put(key.to_vec(), v.to_vec()),
            None => self.memtable.delete(key.to_vec()),
        };

        tracing::trace!(lsn, memtable_size = new_size, "Mutation applied");

        Ok(new_size)
    }

    /// Flush if full; on failure the MemTable and WAL stay as they are
    /// and the next write or `close` tries again
    fn maybe_flush(&self, new_size: usize) {
        if new_size < self.config.memtable_size_limit {
            return;
        }
        if let Err(e) = self.flush() {
            tracing::warn!(
                error = %e,
                memtable_size = self.memtable.size(),
                "Automatic flush failed; retrying on a later write"
            );
        }
    }

    fn maybe_compact(&self) {
        if self.storage.sstable_count() < self.config.compaction_threshold {
            return;
        }
        if let Err(e) = self.storage.compact() {
            tracing::warn!(error = %e, "Compaction failed; retrying after the next flush");
        }
    }

    fn key_lock(&self, key: &[u8]) -> &Mutex<()> {
        let stripe = crc32fast::hash(key) as usize % self.key_locks.len();
        &self.key_locks[stripe]
    }

    // =========================================================================
    // Flush & Shutdown
    // =========================================================================

    /// Flush memtable to disk
    ///
    /// Forces a flush regardless of memtable size, then compacts if the
    /// SSTable count reached `compaction_threshold`.
    pub fn flush(&self) -> Result<()> {
        {
            let _exclusive = self.flush_lock.write();

            // Another writer may have flushed while we waited
            if self.memtable.is_empty() {
                return Ok(());
            }

            self.storage.flush(&self.memtable)?;
            self.memtable.clear();

            // Entries are now durable in an SSTable
            self.wal.lock().truncate()?;
        }

        self.maybe_compact();
        Ok(())
    }

    /// Merge every SSTable into one, dropping shadowed versions and tombstones
    ///
    /// Scans already open keep reading the tables they started on.
    pub fn compact(&self) -> Result<()> {
        self.storage.compact()?;
        Ok(())
    }

    /// Close the store gracefully
    ///
    /// Flushes any pending data and syncs to disk
    pub fn close(self) -> Result<()> {
        self.flush()?;
        self.wal.lock().sync()?;

        tracing::info!(
            data_dir = %self.config.data_dir.display(),
            sstables = self.storage.sstable_count(),
            "Store closed"
        );

        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the storage directory path (where SSTables are stored)
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Get the current memtable size
    pub fn memtable_size(&self) -> usize {
        self.memtable.size()
    }

    /// Get the memtable entry count
    pub fn memtable_entry_count(&self) -> usize {
        self.memtable.entry_count()
    }

    /// Get the number of SSTables
    pub fn sstable_count(&self) -> usize {
        self.storage.sstable_count()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
