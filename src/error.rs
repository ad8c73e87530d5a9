//! Error types for partledger
//!
//! Provides a unified error type for the world-state store and the asset
//! registry built on top of it.

use thiserror::Error;

/// Result type alias using LedgerError
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Unified error type for partledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    // -------------------------------------------------------------------------
    // I/O Errors (storage medium failures)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Record Codec Errors
    // -------------------------------------------------------------------------
    #[error("Failed to encode asset: {0}")]
    Encoding(String),

    #[error("Failed to decode asset: {0}")]
    Decoding(String),

    // -------------------------------------------------------------------------
    // Asset Registry Errors
    // -------------------------------------------------------------------------
    #[error("the asset {0} does not exist")]
    NotFound(String),

    #[error("the asset {0} already exists")]
    AlreadyExists(String),

    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    #[error("Unknown transaction function: {0}")]
    UnknownTransaction(String),

    #[error("Transaction {0} modifies state and cannot be evaluated as a query")]
    NotReadOnly(String),

    #[error("Invalid arguments for {function}: expected {expected}, got {actual}")]
    InvalidArguments {
        function: String,
        expected: usize,
        actual: usize,
    },

    // -------------------------------------------------------------------------
    // Iterator Errors
    // -------------------------------------------------------------------------
    #[error("Iterator exhausted")]
    IteratorExhausted,

    #[error("Iterator closed")]
    IteratorClosed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for LedgerError {
    fn from(e: bincode::Error) -> Self {
        LedgerError::Serialization(e.to_string())
    }
}
