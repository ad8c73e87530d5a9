//! Storage Module
//!
//! Persistent storage layer built from immutable SSTables.
//!
//! ## Responsibilities
//! - Persist flushed MemTables to disk in sorted format
//! - Point lookups and presence checks searching newest → oldest
//! - Range cursors over every table for merged scans
//!
//! Tables are never rewritten once published, so a cursor opened on one
//! stays valid for as long as the file exists.

mod manager;
mod sstable;

pub use manager::StorageManager;
pub use sstable::{SSTable, SSTableBuilder, SSTableIterator, SSTableReader};
