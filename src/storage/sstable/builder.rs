//! SSTable Builder
//!
//! Writes sorted key-value entries to a new SSTable file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{LedgerError, Result};

use super::{SSTable, FOOTER_SIZE, HEADER_SIZE, MAGIC, TOMBSTONE_MARKER, VERSION};

/// Builder for creating new SSTables from sorted entries
pub struct SSTableBuilder {
    /// Output file path
    path: PathBuf,
    /// Buffered writer for performance
    writer: BufWriter<File>,
    /// Number of entries written
    entry_count: u64,
    /// Current write position (for index)
    current_offset: u64,
    /// Index: key → file offset of entry
    index: Vec<(Vec<u8>, u64)>,
    /// Track min/max keys for metadata
    min_key: Option<Vec<u8>>,
    max_key: Option<Vec<u8>>,
    /// Running CRC hasher for data section
    data_hasher: crc32fast::Hasher,
}

impl SSTableBuilder {
    /// Create a new SSTable builder
    ///
    /// Writes header immediately; call `add()`/`add_tombstone()` in sorted order,
    /// then `finish()` to write index and footer.
    pub fn new(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);

        // Entry count is patched in finish()
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            entry_count: 0,
            current_offset: HEADER_SIZE,
            index: Vec::new(),
            min_key: None,
            max_key: None,
            data_hasher: crc32fast::Hasher::new(),
        })
    }

    /// Add a key-value pair (must be called in sorted key order)
    pub fn add(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.write_entry(key, Some(value))
    }

    /// Add a tombstone (must be called in sorted key order)
    pub fn add_tombstone(&mut self, key: &[u8]) -> Result<()> {
        self.write_entry(key, None)
    }

    /// Write one entry (value=None means tombstone)
    fn write_entry(&mut self, key: &[u8], value: Option<&[u8]>) -> Result<()> {
        if let Some(last) = &self.max_key {
            if key <= last.as_slice() {
                return Err(LedgerError::Storage(format!(
                    "SSTable keys must be strictly increasing: {:?} after {:?}",
                    key, last
                )));
            }
        }
        if let Some(v) = value {
            if v.len() >= TOMBSTONE_MARKER as usize {
                return Err(LedgerError::Storage(format!(
                    "Value of {} bytes exceeds the SSTable entry limit",
                    v.len()
                )));
            }
        }

        let val_len = match value {
            Some(v) => v.len() as u32,
            None => TOMBSTONE_MARKER,
        };

        // [key_len(4)][val_len(4)][key][value]
        let mut frame = Vec::with_capacity(8 + key.len() + value.map_or(0, <[u8]>::len));
        frame.extend_from_slice(&(key.len() as u32).to_le_bytes());
        frame.extend_from_slice(&val_len.to_le_bytes());
        frame.extend_from_slice(key);
        frame.extend_from_slice(value.unwrap_or_default());

        self.writer.write_all(&frame)?;
        self.data_hasher.update(&frame);

        self.index.push((key.to_vec(), self.current_offset));
        self.min_key.get_or_insert_with(|| key.to_vec());
        self.max_key = Some(key.to_vec());
        self.current_offset += frame.len() as u64;
        self.entry_count += 1;

        Ok(())
    }

    /// Finish building: write index block, footer, and return metadata
    pub fn finish(mut self) -> Result<SSTable> {
        let index_offset = self.current_offset;

        // Index block: [key_len(4)][offset(8)][key] per entry
        for (key, offset) in &self.index {
            let mut record = Vec::with_capacity(12 + key.len());
            record.extend_from_slice(&(key.len() as u32).to_le_bytes());
            record.extend_from_slice(&offset.to_le_bytes());
            record.extend_from_slice(key);
            self.writer.write_all(&record)?;
        }

        // Footer: [index_offset(8)][data_crc(4)][padding(4)]
        let mut footer = [0u8; FOOTER_SIZE as usize];
        footer[..8].copy_from_slice(&index_offset.to_le_bytes());
        footer[8..12].copy_from_slice(&self.data_hasher.clone().finalize().to_le_bytes());
        self.writer.write_all(&footer)?;
        self.writer.flush()?;

        let mut file = self.writer.into_inner().map_err(|e| {
            LedgerError::Storage(format!("Failed to flush SSTable: {}", e))
        })?;
        // Entry count lives right after magic + version
        file.seek(SeekFrom::Start(MAGIC.len() as u64 + 2))?;
        file.write_all(&self.entry_count.to_le_bytes())?;
        file.sync_all()?;

        let file_size = file.metadata()?.len();

        Ok(SSTable {
            path: self.path,
            entry_count: self.entry_count,
            min_key: self.min_key.unwrap_or_default(),
            max_key: self.max_key.unwrap_or_default(),
            file_size,
        })
    }
}
