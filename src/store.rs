//! Backing-store interfaces the scan orchestrator consumes.
//!
//! This crate ships no concrete backing store — it accelerates range scans
//! against *some* sorted key-value store, not implementing one. The traits
//! below are the consumed-interface shape the original's `lorc.h`/
//! `ref_range.h` describe: a snapshotted, seekable iterator over
//! `(user_key, value)` pairs. A `BTreeMap`-backed [`mock`] implementation is
//! provided for tests only.

use crate::byte_slice::ByteSlice;
use crate::cache::RangeCache;

/// Opaque read-consistency token, analogous to a storage engine's
/// snapshot sequence number.
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct Snapshot(pub u64);

/// Knobs on a backing-store write, analogous to the original's
/// `WriteOptions`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    /// Skip the write-ahead log, matching the original's `disableWAL` knob
    /// the btest harnesses toggle for throughput runs.
    pub disable_wal: bool,
}

/// A sorted key-value store the cache can scan to fill a gap.
pub trait BackingStore {
    /// The iterator type returned by `scan`.
    type Iter<'a>: StoreIterator
    where
        Self: 'a;

    /// Opens an iterator positioned before the first entry `>= start`,
    /// bounded above by `end` (exclusive), as of `snapshot`.
    fn scan<'a>(&'a self, start: &[u8], end: &[u8], snapshot: Snapshot) -> Self::Iter<'a>;

    /// The store's current snapshot, for callers that don't pin one of
    /// their own.
    fn current_snapshot(&self) -> Snapshot;

    /// Writes `key -> value` to the store and, when `cache` is given,
    /// patches whichever cached physical range already covers `key` via
    /// `update_entry` — the live-write path a backing store takes when it
    /// owns a handle to the attached range cache.
    fn put(&mut self, key: &[u8], value: &[u8], write_opts: WriteOptions, cache: Option<&RangeCache>) -> Snapshot;
}

/// A forward cursor over a backing store's sorted entries.
pub trait StoreIterator {
    /// Advances to the next entry and returns whether one exists.
    fn next(&mut self) -> bool;
    /// The current entry's user key. Panics if not positioned on a valid
    /// entry.
    fn user_key(&self) -> ByteSlice<'_>;
    /// The current entry's value. Panics if not positioned on a valid
    /// entry.
    fn value(&self) -> ByteSlice<'_>;
    /// The sequence number the current entry was written under.
    fn sequence(&self) -> u64;
}

/// A minimal in-memory [`BackingStore`] used only by this crate's own
/// tests, exercising [`crate::scan::ScanOrchestrator`] without a real
/// storage engine.
pub mod mock {
    use std::collections::BTreeMap;

    use super::{BackingStore, Snapshot, StoreIterator, WriteOptions};
    use crate::byte_slice::ByteSlice;
    use crate::cache::RangeCache;
    use crate::internal_key::{self, KeyKind};

    /// An in-memory sorted store keyed by user key.
    #[derive(Debug, Default)]
    pub struct MockStore {
        entries: BTreeMap<Vec<u8>, (Vec<u8>, u64)>,
        sequence: u64,
    }

    impl MockStore {
        /// Creates an empty store.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Writes `key -> value` without touching any cache, stamping it
        /// with the next sequence number. A thin convenience for seeding a
        /// store in tests and benchmarks; real callers go through
        /// [`BackingStore::put`].
        pub fn seed(&mut self, key: &[u8], value: &[u8]) {
            self.sequence += 1;
            self.entries
                .insert(key.to_vec(), (value.to_vec(), self.sequence));
        }
    }

    impl BackingStore for MockStore {
        type Iter<'a> = MockIterator;

        fn scan<'a>(&'a self, start: &[u8], end: &[u8], _snapshot: Snapshot) -> Self::Iter<'a> {
            let items: Vec<_> = self
                .entries
                .range(start.to_vec()..end.to_vec())
                .map(|(k, (v, s))| (k.clone(), v.clone(), *s))
                .collect();
            MockIterator { items, pos: None }
        }

        fn current_snapshot(&self) -> Snapshot {
            Snapshot(self.sequence)
        }

        fn put(&mut self, key: &[u8], value: &[u8], _write_opts: WriteOptions, cache: Option<&RangeCache>) -> Snapshot {
            self.sequence += 1;
            self.entries
                .insert(key.to_vec(), (value.to_vec(), self.sequence));
            if let Some(cache) = cache {
                let internal_key = internal_key::encode(key, self.sequence, KeyKind::Value);
                cache.update_entry(&internal_key, value);
            }
            Snapshot(self.sequence)
        }
    }

    /// Iterator over a [`MockStore`] scan window.
    pub struct MockIterator {
        items: Vec<(Vec<u8>, Vec<u8>, u64)>,
        pos: Option<usize>,
    }

    impl StoreIterator for MockIterator {
        fn next(&mut self) -> bool {
            let next_pos = self.pos.map_or(0, |p| p + 1);
            if next_pos < self.items.len() {
                self.pos = Some(next_pos);
                true
            } else {
                false
            }
        }

        fn user_key(&self) -> ByteSlice<'_> {
            let pos = self.pos.expect("iterator not positioned");
            ByteSlice::new(&self.items[pos].0)
        }

        fn value(&self) -> ByteSlice<'_> {
            let pos = self.pos.expect("iterator not positioned");
            ByteSlice::new(&self.items[pos].1)
        }

        fn sequence(&self) -> u64 {
            let pos = self.pos.expect("iterator not positioned");
            self.items[pos].2
        }
    }
}
