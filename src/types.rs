//! Core type definitions shared by the store layers.

use std::ops::Bound;

/// Key type: arbitrary bytes, ordered byte-lexicographically.
pub type Key = Vec<u8>;

/// Value type: opaque bytes.
pub type Value = Vec<u8>;

/// A key/value pair produced by a range scan.
pub type KeyValue = (Key, Value);

/// Half-open key interval `[start, end)`.
///
/// A missing bound is open-ended; an empty byte string passed to
/// [`KeyRange::new`] means "no bound" on that side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Option<Key>,
    pub end: Option<Key>,
}

impl KeyRange {
    /// Build a range from raw bounds, treating empty bounds as open
    pub fn new(start: &[u8], end: &[u8]) -> Self {
        Self {
            start: (!start.is_empty()).then(|| start.to_vec()),
            end: (!end.is_empty()).then(|| end.to_vec()),
        }
    }

    /// The whole keyspace
    pub fn all() -> Self {
        Self::default()
    }

    /// True when no key can fall inside the range
    pub fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => start >= end,
            _ => false,
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        let after_start = self.start.as_deref().map_or(true, |s| key >= s);
        let before_end = self.end.as_deref().map_or(true, |e| key < e);
        after_start && before_end
    }

    /// Bounds in the form `BTreeMap::range` accepts
    ///
    /// Callers must check [`is_empty`](Self::is_empty) first: an inverted
    /// range makes `BTreeMap::range` panic.
    pub fn as_bounds(&self) -> (Bound<&[u8]>, Bound<&[u8]>) {
        let start = match &self.start {
            Some(s) => Bound::Included(s.as_slice()),
            None => Bound::Unbounded,
        };
        let end = match &self.end {
            Some(e) => Bound::Excluded(e.as_slice()),
            None => Bound::Unbounded,
        };
        (start, end)
    }
}
