//! World State Interface
//!
//! The four primitives business logic uses to read and write ledger state.
//! [`Store`] is the production implementation; the asset service only ever
//! sees this trait, so any backing that honors it can be injected.

use std::sync::Arc;

use crate::error::Result;
use crate::iterator::RangeIterator;
use crate::store::Store;

/// Key-value world state addressed by string keys
pub trait WorldState {
    /// Current value for `key`, `None` if absent
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Upsert `key`
    fn put_state(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove `key`; absent keys are not an error
    fn del_state(&self, key: &str) -> Result<()>;

    /// Snapshot scan over `[start, end)`, empty bounds being open
    fn get_state_by_range(&self, start: &str, end: &str) -> Result<RangeIterator>;

    /// Presence check
    fn state_exists(&self, key: &str) -> Result<bool> {
        Ok(self.get_state(key)?.is_some())
    }
}

impl WorldState for Store {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.get(key.as_bytes())
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<()> {
        self.put(key.as_bytes(), value)
    }

    fn del_state(&self, key: &str) -> Result<()> {
        self.delete(key.as_bytes())
    }

    fn get_state_by_range(&self, start: &str, end: &str) -> Result<RangeIterator> {
        self.range_scan(start.as_bytes(), end.as_bytes())
    }

    fn state_exists(&self, key: &str) -> Result<bool> {
        self.exists(key.as_bytes())
    }
}

impl<T: WorldState + ?Sized> WorldState for &T {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<()> {
        (**self).put_state(key, value)
    }

    fn del_state(&self, key: &str) -> Result<()> {
        (**self).del_state(key)
    }

    fn get_state_by_range(&self, start: &str, end: &str) -> Result<RangeIterator> {
        (**self).get_state_by_range(start, end)
    }

    fn state_exists(&self, key: &str) -> Result<bool> {
        (**self).state_exists(key)
    }
}

impl<T: WorldState + ?Sized> WorldState for Arc<T> {
    fn get_state(&self, key: &str) -> Result<Option<Vec<u8>>> {
        (**self).get_state(key)
    }

    fn put_state(&self, key: &str, value: &[u8]) -> Result<()> {
        (**self).put_state(key, value)
    }

    fn del_state(&self, key: &str) -> Result<()> {
        (**self).del_state(key)
    }

    fn get_state_by_range(&self, start: &str, end: &str) -> Result<RangeIterator> {
        (**self).get_state_by_range(start, end)
    }

    fn state_exists(&self, key: &str) -> Result<bool> {
        (**self).state_exists(key)
    }
}
