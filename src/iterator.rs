//! Range Iterator
//!
//! Snapshot cursor returned by range scans.
//!
//! ## Merge
//! A scan combines one MemTable snapshot with a cursor per SSTable. Sources
//! are ordered newest first (MemTable, then SSTables newest → oldest); when
//! several hold the same key, the newest wins and the others are skipped.
//! Tombstones hide the key entirely.
//!
//! ## States
//! ```text
//!            next()                  exhausted
//!   Open ───────────► Open ─────────────────────► Exhausted
//!     │                                               │
//!     └──────────── close() ──► Closed ◄── close() ───┘
//! ```

use crate::error::{LedgerError, Result};
use crate::memtable::MemTableEntry;
use crate::storage::SSTableIterator;
use crate::types::{Key, KeyValue};

/// Lifecycle state of a [`RangeIterator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IteratorState {
    /// More items may be read
    Open,
    /// Every item was read; resources are already released
    Exhausted,
    /// Closed by the caller
    Closed,
}

type Entries = Box<dyn Iterator<Item = Result<(Key, MemTableEntry)>> + Send>;

/// One input of the merge, with its next entry peeked
struct Source {
    entries: Entries,
    head: Option<(Key, MemTableEntry)>,
}

impl Source {
    fn new(entries: Entries) -> Result<Self> {
        let mut source = Self { entries, head: None };
        source.advance()?;
        Ok(source)
    }

    fn advance(&mut self) -> Result<()> {
        self.head = self.entries.next().transpose()?;
        Ok(())
    }

    fn head_key(&self) -> Option<&Key> {
        self.head.as_ref().map(|(key, _)| key)
    }
}

/// K-way merge across sources, newest first
struct MergeCursor {
    sources: Vec<Source>,
}

impl MergeCursor {
    /// Next live pair, skipping shadowed versions and tombstones
    fn next_live(&mut self) -> Result<Option<KeyValue>> {
        loop {
            // Smallest key; ties go to the lowest index, which is the newest
            let winner = self
                .sources
                .iter()
                .enumerate()
                .filter_map(|(i, source)| source.head_key().map(|key| (key, i)))
                .min()
                .map(|(_, i)| i);

            let Some(winner) = winner else {
                return Ok(None);
            };

            let Some((key, entry)) = self.sources[winner].head.take() else {
                return Ok(None);
            };
            self.sources[winner].advance()?;

            // Each source holds a key at most once
            for source in self.sources.iter_mut() {
                if source.head_key() == Some(&key) {
                    source.advance()?;
                }
            }

            if let MemTableEntry::Value(value) = entry {
                return Ok(Some((key, value)));
            }
        }
    }
}

/// Ordered cursor over a snapshot of a key range
///
/// The next item is always prefetched, so [`has_next`](Self::has_next) is a
/// pure check. Dropping the iterator closes it.
pub struct RangeIterator {
    merge: Option<MergeCursor>,
    pending: Option<Result<KeyValue>>,
    state: IteratorState,
}

impl RangeIterator {
    /// Build from a MemTable snapshot and SSTable cursors ordered newest first
    pub(crate) fn new(
        memtable_entries: Vec<(Key, MemTableEntry)>,
        cursors: Vec<SSTableIterator>,
    ) -> Self {
        let mut sources: Vec<Entries> = Vec::with_capacity(cursors.len() + 1);
        sources.push(Box::new(
            memtable_entries.into_iter().map(Ok::<_, LedgerError>),
        ));
        for cursor in cursors {
            sources.push(Box::new(cursor));
        }
        Self::from_sources(sources)
    }

    /// Iterator over a fixed set of live pairs, yielded in key order
    pub fn from_pairs(mut pairs: Vec<KeyValue>) -> Self {
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let entries = pairs
            .into_iter()
            .map(|(key, value)| Ok::<_, LedgerError>((key, MemTableEntry::Value(value))));
        let source: Entries = Box::new(entries);
        Self::from_sources(vec![source])
    }

    fn from_sources(sources: Vec<Entries>) -> Self {
        let mut iter = Self {
            merge: None,
            pending: None,
            state: IteratorState::Open,
        };

        match sources.into_iter().map(Source::new).collect::<Result<Vec<_>>>() {
            Ok(sources) => {
                iter.merge = Some(MergeCursor { sources });
                iter.prefetch();
            }
            // Surfaced by the first next()
            Err(e) => iter.pending = Some(Err(e)),
        }
        iter
    }

    /// Current lifecycle state
    pub fn state(&self) -> IteratorState {
        self.state
    }

    /// True if a call to [`next`](Self::next) would yield an item
    ///
    /// A read error also counts: `next` will return it.
    pub fn has_next(&self) -> bool {
        self.state == IteratorState::Open && self.pending.is_some()
    }

    /// Advance and return the next pair
    ///
    /// Fails with `IteratorExhausted` after the last pair and with
    /// `IteratorClosed` after [`close`](Self::close). A storage error ends
    /// the iteration.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<KeyValue> {
        match self.state {
            IteratorState::Closed => return Err(LedgerError::IteratorClosed),
            IteratorState::Exhausted => return Err(LedgerError::IteratorExhausted),
            IteratorState::Open => {}
        }

        match self.pending.take() {
            Some(Ok(pair)) => {
                self.prefetch();
                Ok(pair)
            }
            Some(Err(e)) => {
                self.finish(IteratorState::Exhausted);
                Err(e)
            }
            None => {
                self.finish(IteratorState::Exhausted);
                Err(LedgerError::IteratorExhausted)
            }
        }
    }

    /// Release file handles and buffered entries; safe to call repeatedly
    pub fn close(&mut self) {
        self.finish(IteratorState::Closed);
    }

    fn prefetch(&mut self) {
        self.pending = match self.merge.as_mut() {
            Some(merge) => merge.next_live().transpose(),
            None => None,
        };

        if self.pending.is_none() {
            self.finish(IteratorState::Exhausted);
        }
    }

    fn finish(&mut self, state: IteratorState) {
        self.merge = None;
        if state == IteratorState::Closed {
            self.pending = None;
        }
        self.state = state;
    }
}

impl Iterator for RangeIterator {
    type Item = Result<KeyValue>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.has_next() {
            return None;
        }
        Some(RangeIterator::next(self))
    }
}

impl Drop for RangeIterator {
    fn drop(&mut self) {
        self.close();
    }
}
