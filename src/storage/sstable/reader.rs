//! SSTable Reader
//!
//! Opens SSTable files and provides O(log n) key lookups via in-memory index.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Bound;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{LedgerError, Result};
use crate::memtable::MemTableEntry;
use crate::types::KeyRange;

use super::iterator::SSTableIterator;
use super::{read_u32, read_u64, FOOTER_SIZE, HEADER_SIZE, MAGIC, TOMBSTONE_MARKER, VERSION};

/// Reader for SSTable files with in-memory index for O(log n) lookups
///
/// The file handle sits behind a mutex so lookups take `&self` and many
/// threads can share one reader.
pub struct SSTableReader {
    path: PathBuf,
    /// File handle for point lookups
    file: Mutex<BufReader<File>>,
    /// In-memory index: key → file offset
    index: BTreeMap<Vec<u8>, u64>,
    entry_count: u64,
    /// Index block starting offset (end of the data block)
    index_offset: u64,
}

impl SSTableReader {
    /// Open an SSTable for reading
    ///
    /// Validates header and data checksum, then loads the index into memory.
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let file_size = file.metadata()?.len();

        if file_size < HEADER_SIZE + FOOTER_SIZE {
            return Err(LedgerError::Storage(format!(
                "SSTable {} too small: {} bytes",
                path.display(),
                file_size
            )));
        }

        let mut header = [0u8; HEADER_SIZE as usize];
        file.read_exact(&mut header)?;

        if &header[0..4] != MAGIC {
            return Err(LedgerError::Storage(format!(
                "Invalid SSTable magic: expected PLSS, got {:?}",
                &header[0..4]
            )));
        }

        let version = u16::from_le_bytes([header[4], header[5]]);
        if version != VERSION {
            return Err(LedgerError::Storage(format!(
                "Unsupported SSTable version: {}",
                version
            )));
        }

        let entry_count = read_u64(&header, 6);

        file.seek(SeekFrom::End(-(FOOTER_SIZE as i64)))?;
        let mut footer = [0u8; FOOTER_SIZE as usize];
        file.read_exact(&mut footer)?;

        let index_offset = read_u64(&footer, 0);
        let data_crc = read_u32(&footer, 8);

        if index_offset < HEADER_SIZE || index_offset > file_size - FOOTER_SIZE {
            return Err(LedgerError::Storage(format!(
                "SSTable {} has out-of-bounds index offset {}",
                path.display(),
                index_offset
            )));
        }

        // Data block checksum
        file.seek(SeekFrom::Start(HEADER_SIZE))?;
        let mut data = vec![0u8; (index_offset - HEADER_SIZE) as usize];
        file.read_exact(&mut data)?;
        if crc32fast::hash(&data) != data_crc {
            return Err(LedgerError::Storage(format!(
                "SSTable {} data checksum mismatch",
                path.display()
            )));
        }

        // Index block: [key_len(4)][offset(8)][key]
        let index_block_size = file_size - FOOTER_SIZE - index_offset;
        let mut index_data = vec![0u8; index_block_size as usize];
        file.read_exact(&mut index_data)?;

        let mut index = BTreeMap::new();
        let mut pos = 0;
        while pos < index_data.len() {
            if pos + 12 > index_data.len() {
                return Err(LedgerError::Storage(format!(
                    "SSTable {} index block truncated",
                    path.display()
                )));
            }
            let key_len = read_u32(&index_data, pos) as usize;
            let offset = read_u64(&index_data, pos + 4);
            pos += 12;

            if pos + key_len > index_data.len() {
                return Err(LedgerError::Storage(format!(
                    "SSTable {} index key truncated",
                    path.display()
                )));
            }
            index.insert(index_data[pos..pos + key_len].to_vec(), offset);
            pos += key_len;
        }

        if index.len() as u64 != entry_count {
            return Err(LedgerError::Storage(format!(
                "SSTable {} index holds {} keys, header says {}",
                path.display(),
                index.len(),
                entry_count
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(BufReader::new(file)),
            index,
            entry_count,
            index_offset,
        })
    }

    /// Get an entry by key — O(log n) lookup via in-memory index
    ///
    /// Returns:
    /// - `Ok(Some(Value(v)))` — key found with value
    /// - `Ok(Some(Tombstone))` — key found but deleted
    /// - `Ok(None)` — key not in this SSTable
    pub fn get(&self, key: &[u8]) -> Result<Option<MemTableEntry>> {
        let offset = match self.index.get(key) {
            Some(&off) => off,
            None => return Ok(None),
        };

        let mut file = self.file.lock();
        let (key_len, val_len) = Self::read_entry_header(&mut file, offset)?;

        if val_len == TOMBSTONE_MARKER {
            return Ok(Some(MemTableEntry::Tombstone));
        }

        // Skip the key (we already know it matches)
        file.seek_relative(key_len as i64)?;

        let mut value = vec![0u8; val_len as usize];
        file.read_exact(&mut value)?;

        Ok(Some(MemTableEntry::Value(value)))
    }

    /// Presence check that reads only the entry header, never the value
    ///
    /// `Some(true)` live, `Some(false)` tombstone, `None` not in this table.
    pub fn contains(&self, key: &[u8]) -> Result<Option<bool>> {
        let offset = match self.index.get(key) {
            Some(&off) => off,
            None => return Ok(None),
        };

        let mut file = self.file.lock();
        let (_, val_len) = Self::read_entry_header(&mut file, offset)?;

        Ok(Some(val_len != TOMBSTONE_MARKER))
    }

    fn read_entry_header(file: &mut BufReader<File>, offset: u64) -> Result<(u32, u32)> {
        file.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        file.read_exact(&mut header)?;
        Ok((read_u32(&header, 0), read_u32(&header, 4)))
    }

    /// Get entry count
    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the minimum key in this SSTable (for range filtering)
    pub fn min_key(&self) -> Option<&[u8]> {
        self.index.keys().next().map(|k| k.as_slice())
    }

    /// Get the maximum key in this SSTable (for range filtering)
    pub fn max_key(&self) -> Option<&[u8]> {
        self.index.keys().next_back().map(|k| k.as_slice())
    }

    /// Quick check if a key might be in this SSTable (range check)
    /// Returns false only if the key is definitely outside [min_key, max_key]
    pub fn might_contain(&self, key: &[u8]) -> bool {
        match (self.min_key(), self.max_key()) {
            (Some(min), Some(max)) => key >= min && key <= max,
            _ => false, // Empty SSTable
        }
    }

    /// Create an iterator over all entries (for debugging and tests)
    pub fn iter(&self) -> Result<SSTableIterator> {
        self.range(&KeyRange::all())
    }

    /// Create an iterator over the entries inside `range`, tombstones included
    ///
    /// Entries are contiguous in the data block, so the iterator streams from
    /// the first key in range up to the first key past it.
    pub fn range(&self, range: &KeyRange) -> Result<SSTableIterator> {
        if range.is_empty() {
            return SSTableIterator::open(&self.path, self.index_offset, self.index_offset);
        }

        let start_offset = self
            .index
            .range::<[u8], _>(range.as_bounds())
            .next()
            .map(|(_, &off)| off)
            .unwrap_or(self.index_offset);

        let end_offset = match &range.end {
            Some(end) => self
                .index
                .range::<[u8], _>((Bound::Included(end.as_slice()), Bound::Unbounded))
                .next()
                .map(|(_, &off)| off)
                .unwrap_or(self.index_offset),
            None => self.index_offset,
        };

        SSTableIterator::open(&self.path, start_offset, end_offset.max(start_offset))
    }
}
