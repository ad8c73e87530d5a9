//! # partledger
//!
//! An embeddable, ordered key-value world state with a car-part
//! certificate registry on top:
//! - Write-Ahead Logging (WAL) for durability
//! - Crash recovery with partial write handling
//! - Per-key striped locking for concurrent writers on different keys
//! - Snapshot range scans in byte-lexicographic key order
//! - Asset CRUD with existence checks, driven by named transactions
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              AssetService (CRUD, Transactions)               │
//! │                 Asset codec (JSON records)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ WorldState
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                         Store                                │
//! │          (striped key locks, flush lock, scans)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │ flush
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Storage   │
//!                           │  (SSTable)  │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod types;

pub mod memtable;
pub mod storage;
pub mod wal;

pub mod iterator;
pub mod state;
pub mod store;

pub mod asset;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use asset::{decode_asset, encode_asset, Asset, AssetService, Transaction};
pub use config::{Config, WalSyncStrategy};
pub use error::{LedgerError, Result};
pub use iterator::{IteratorState, RangeIterator};
pub use state::WorldState;
pub use store::Store;
pub use types::{Key, KeyRange, KeyValue, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of partledger
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
