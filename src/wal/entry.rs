//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries and their
//! on-disk framing.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

/// Header size: LSN (8) + CRC (4) + Len (4) = 16 bytes
pub const HEADER_SIZE: usize = 16;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: Vec<u8>, value: Vec<u8> },

    /// Delete a key
    Delete { key: Vec<u8> },
}

impl Operation {
    /// The key this operation touches
    pub fn key(&self) -> &[u8] {
        match self {
            Operation::Put { key, .. } => key,
            Operation::Delete { key } => key,
        }
    }
}

impl WalEntry {
    /// Create a new entry stamped with the current wall-clock time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Serialize to the framed on-disk form:
    /// `[LSN (8)][CRC (4)][Len (4)][Data]`, all little-endian.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = self.encode_data()?;
        let crc = Self::checksum(self.lsn, &data);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
        bytes.extend_from_slice(&self.lsn.to_le_bytes());
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&data);

        Ok(bytes)
    }

    /// Deserialize a single framed entry, verifying its checksum
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(LedgerError::WalCorruption(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let (lsn, crc, len) = Self::parse_header(&bytes[..HEADER_SIZE]);

        let total = HEADER_SIZE + len as usize;
        if bytes.len() < total {
            return Err(LedgerError::WalCorruption(format!(
                "Truncated entry: expected {} bytes, got {}",
                total,
                bytes.len()
            )));
        }

        Self::from_parts(lsn, crc, &bytes[HEADER_SIZE..total])
    }

    /// Total number of bytes `serialize` will produce
    pub fn serialized_size(&self) -> Result<usize> {
        let data_len = bincode::serialized_size(&(&self.operation, self.timestamp))?;
        Ok(HEADER_SIZE + data_len as usize)
    }

    /// CRC32 over the LSN and the encoded data section
    pub fn compute_crc(&self) -> Result<u32> {
        let data = self.encode_data()?;
        Ok(Self::checksum(self.lsn, &data))
    }

    // =========================================================================
    // Framing helpers (shared with the reader)
    // =========================================================================

    /// Split a header into (lsn, crc, data_len)
    pub(super) fn parse_header(header: &[u8]) -> (u64, u32, u32) {
        let mut lsn = [0u8; 8];
        let mut crc = [0u8; 4];
        let mut len = [0u8; 4];
        lsn.copy_from_slice(&header[0..8]);
        crc.copy_from_slice(&header[8..12]);
        len.copy_from_slice(&header[12..16]);

        (
            u64::from_le_bytes(lsn),
            u32::from_le_bytes(crc),
            u32::from_le_bytes(len),
        )
    }

    /// Rebuild an entry from a parsed header and its data section
    pub(super) fn from_parts(lsn: u64, expected_crc: u32, data: &[u8]) -> Result<Self> {
        let actual_crc = Self::checksum(lsn, data);
        if actual_crc != expected_crc {
            return Err(LedgerError::WalCorruption(format!(
                "CRC mismatch at LSN {}: expected {:08x}, got {:08x}",
                lsn, expected_crc, actual_crc
            )));
        }

        let (operation, timestamp): (Operation, u64) = bincode::deserialize(data)
            .map_err(|e| LedgerError::WalCorruption(format!("Undecodable entry: {}", e)))?;

        Ok(Self {
            lsn,
            operation,
            timestamp,
        })
    }

    fn encode_data(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&(&self.operation, self.timestamp))?)
    }

    fn checksum(lsn: u64, data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&lsn.to_le_bytes());
        hasher.update(data);
        hasher.finalize()
    }
}
