//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{LedgerError, Result};

use super::entry::HEADER_SIZE;
use super::WalEntry;

/// Outcome of reading one frame from the log
pub(super) enum Frame {
    /// A complete, checksum-valid entry
    Entry(WalEntry),
    /// Clean end of file
    Eof,
    /// Incomplete header or data at the tail (torn write)
    Partial,
    /// Complete frame whose checksum or payload is bad
    Corrupt(String),
}

/// Reads entries from the WAL file
pub struct WalReader {
    reader: BufReader<File>,
    /// Offset just past the last complete, valid entry
    position: u64,
    file_len: u64,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();

        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            file_len,
        })
    }

    /// Read the next entry from the WAL
    ///
    /// Returns `Ok(None)` at end of file and at a torn tail write;
    /// a checksum failure is reported as `WalCorruption`.
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        match self.read_frame()? {
            Frame::Entry(entry) => Ok(Some(entry)),
            Frame::Eof | Frame::Partial => Ok(None),
            Frame::Corrupt(reason) => Err(LedgerError::WalCorruption(reason)),
        }
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Byte offset just past the last valid entry read so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read and classify the next frame
    pub(super) fn read_frame(&mut self) -> Result<Frame> {
        let remaining = self.file_len.saturating_sub(self.position);
        if remaining == 0 {
            return Ok(Frame::Eof);
        }
        if remaining < HEADER_SIZE as u64 {
            return Ok(Frame::Partial);
        }

        let mut header = [0u8; HEADER_SIZE];
        self.reader.read_exact(&mut header)?;
        let (lsn, crc, len) = WalEntry::parse_header(&header);

        if (len as u64) > remaining - HEADER_SIZE as u64 {
            return Ok(Frame::Partial);
        }

        let mut data = vec![0u8; len as usize];
        self.reader.read_exact(&mut data)?;

        match WalEntry::from_parts(lsn, crc, &data) {
            Ok(entry) => {
                self.position += (HEADER_SIZE + data.len()) as u64;
                Ok(Frame::Entry(entry))
            }
            Err(LedgerError::WalCorruption(reason)) => Ok(Frame::Corrupt(reason)),
            Err(e) => Err(e),
        }
    }
}

/// Iterator over WAL entries
///
/// Stops after the first error.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
