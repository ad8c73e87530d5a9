//! WAL Writer
//!
//! Handles appending entries to the WAL file.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::mem;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{LedgerError, Result};

use super::{Operation, WalEntry, WalRecovery};

/// Writes entries to the WAL file
///
/// Every append reaches the OS before it returns. If it fails, the file is
/// cut back to the end of the previous entry, so a torn frame never sits in
/// front of later entries. If that cut fails too the writer refuses further
/// appends until the log is truncated.
pub struct WalWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    /// LSN that the next appended entry will receive
    current_lsn: u64,
    sync_strategy: WalSyncStrategy,
    /// Entries written since the last fsync
    uncommitted: usize,
    /// File length up to the end of the last complete entry
    end_offset: u64,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

impl WalWriter {
    /// Open or create a WAL file
    ///
    /// An existing log is validated first: a torn or corrupted tail is cut
    /// off and numbering continues after the last valid LSN.
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let next_lsn = if path.exists() {
            let (_, recovery) = WalRecovery::recover(path)?;
            recovery.last_lsn + 1
        } else {
            1
        };

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)?;
        let end_offset = file.seek(SeekFrom::End(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
            current_lsn: next_lsn,
            sync_strategy,
            uncommitted: 0,
            end_offset,
            poisoned: false,
        })
    }

    /// Append an operation to the WAL, returning its LSN
    ///
    /// On error nothing of the entry remains in the log.
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        if self.poisoned {
            return Err(LedgerError::WalWrite(format!(
                "{} has a torn tail that could not be removed; reopen the store",
                self.path.display()
            )));
        }

        let lsn = self.current_lsn;
        let bytes = WalEntry::new(lsn, operation).serialize()?;

        let pending = self.uncommitted + 1;
        let sync = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => pending >= count,
        };

        if let Err(e) = self.write_frame(&bytes, sync) {
            return Err(self.rollback(lsn, e));
        }

        self.end_offset += bytes.len() as u64;
        self.current_lsn += 1;
        self.uncommitted = if sync { 0 } else { pending };

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_data()?;
        self.uncommitted = 0;
        Ok(())
    }

    /// Discard every entry (called once they are durable elsewhere)
    pub fn truncate(&mut self) -> Result<()> {
        self.discard_unflushed()?;

        let file = self.writer.get_mut();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.sync_all()?;

        self.current_lsn = 1;
        self.uncommitted = 0;
        self.end_offset = 0;
        self.poisoned = false;

        tracing::trace!("WAL {} truncated", self.path.display());
        Ok(())
    }

    /// Get the LSN the next entry will receive
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Number of entries written but not yet fsynced
    pub fn uncommitted_count(&self) -> usize {
        self.uncommitted
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn write_frame(&mut self, bytes: &[u8], sync: bool) -> io::Result<()> {
        self.writer.write_all(bytes)?;
        self.writer.flush()?;
        if sync {
            self.writer.get_ref().sync_data()?;
        }
        Ok(())
    }

    /// Undo a failed append and build the error reported for it
    fn rollback(&mut self, lsn: u64, cause: io::Error) -> LedgerError {
        match self.cut_to_end_offset() {
            Ok(()) => LedgerError::WalWrite(format!("LSN {}: {}", lsn, cause)),
            Err(e) => {
                self.poisoned = true;
                tracing::error!(
                    path = %self.path.display(),
                    lsn,
                    error = %e,
                    "Could not remove torn WAL entry"
                );
                LedgerError::WalWrite(format!("LSN {}: {} (rollback failed: {})", lsn, cause, e))
            }
        }
    }

    fn cut_to_end_offset(&mut self) -> io::Result<()> {
        self.discard_unflushed()?;

        let file = self.writer.get_mut();
        file.set_len(self.end_offset)?;
        file.seek(SeekFrom::Start(self.end_offset))?;
        Ok(())
    }

    /// Drop bytes still sitting in the buffer without writing them
    fn discard_unflushed(&mut self) -> io::Result<()> {
        let file = self.writer.get_ref().try_clone()?;
        let stale = mem::replace(&mut self.writer, BufWriter::new(file));
        let (_handle, _unflushed) = stale.into_parts();
        Ok(())
    }
}
