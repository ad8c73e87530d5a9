//! Write-Ahead Log
//!
//! Every world-state mutation is appended here before it reaches the
//! MemTable. The log only ever holds mutations that are not yet in an
//! SSTable: a flush truncates it, and so does a successful replay on open.
//!
//! ## Layout
//! ```text
//! wal.log
//! ┌──────────┬──────────┬──────────┬────────────────────────────────┐
//! │ LSN u64  │ CRC u32  │ Len u32  │ bincode((Operation, timestamp))│ ...
//! └──────────┴──────────┴──────────┴────────────────────────────────┘
//!  little-endian, 16-byte header; CRC over LSN and payload
//! ```
//!
//! Reading stops at the first entry that is short or fails its CRC. Whatever
//! follows is treated as a torn write and cut off by [`WalRecovery::recover`].

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{Operation, WalEntry, HEADER_SIZE};
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;
