//! SSTable Iterator
//!
//! Sequential iteration over a contiguous run of entries in an SSTable.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Result;
use crate::memtable::MemTableEntry;
use crate::types::Key;

use super::TOMBSTONE_MARKER;

/// Iterator over SSTable entries in sorted key order
///
/// Owns its own file handle, so it stays valid independently of the
/// reader that created it. Dropping it closes the file.
pub struct SSTableIterator {
    file: BufReader<File>,
    /// Stop reading when we reach this offset
    end_offset: u64,
    /// Current position in file
    current_offset: u64,
}

impl SSTableIterator {
    /// Open `path` and position at `start_offset`, yielding entries until
    /// `end_offset`
    pub(super) fn open(path: &Path, start_offset: u64, end_offset: u64) -> Result<Self> {
        let mut file = BufReader::new(File::open(path)?);
        file.seek(SeekFrom::Start(start_offset))?;

        Ok(Self {
            file,
            end_offset,
            current_offset: start_offset,
        })
    }

    fn read_entry(&mut self) -> Result<(Key, MemTableEntry)> {
        let mut header = [0u8; 8];
        self.file.read_exact(&mut header)?;

        let key_len = super::read_u32(&header, 0) as usize;
        let val_len = super::read_u32(&header, 4);

        let mut key = vec![0u8; key_len];
        self.file.read_exact(&mut key)?;

        let mut entry_size = 8 + key_len as u64;

        let entry = if val_len == TOMBSTONE_MARKER {
            MemTableEntry::Tombstone
        } else {
            let mut value = vec![0u8; val_len as usize];
            self.file.read_exact(&mut value)?;
            entry_size += val_len as u64;
            MemTableEntry::Value(value)
        };

        self.current_offset += entry_size;

        Ok((key, entry))
    }
}

impl Iterator for SSTableIterator {
    type Item = Result<(Key, MemTableEntry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_offset >= self.end_offset {
            return None;
        }

        match self.read_entry() {
            Ok(item) => Some(Ok(item)),
            Err(e) => {
                // Never retry past a bad entry
                self.current_offset = self.end_offset;
                Some(Err(e))
            }
        }
    }
}
