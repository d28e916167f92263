//! Forward/reverse cursor over a cache's ordered physical ranges.
//!
//! Grounded on the original's `rbtree_lorc_iter` cursor pattern — an outer
//! position among physical ranges plus an inner index within the current
//! range — and, for lock discipline, on the teacher's `RwLock`-guarded
//! `LruCache` access pattern: each positioning/advance call takes the
//! cache's shared lock just long enough to read the snapshot it needs.

use crate::arena::Arena;
use crate::byte_slice::ByteSlice;
use crate::cache::RangeCache;

/// A key or value snapshot copied out from behind the cache's lock: either
/// a plain heap allocation, or a slice copied into a caller-supplied
/// [`Arena`] when one was given to [`RangeCache::new_iterator_with_arena`].
enum Bytes<'a> {
    Owned(Vec<u8>),
    Arena(&'a [u8]),
}

impl Bytes<'_> {
    fn as_slice(&self) -> &[u8] {
        match self {
            Self::Owned(v) => v,
            Self::Arena(s) => s,
        }
    }
}

impl Default for Bytes<'_> {
    fn default() -> Self {
        Self::Owned(Vec::new())
    }
}

/// A cursor over a [`RangeCache`]'s cached entries, ascending or
/// descending.
pub struct CacheIterator<'a> {
    cache: &'a RangeCache,
    arena: Option<&'a Arena>,
    range_start_key: Option<Vec<u8>>,
    inner_index: usize,
    valid: bool,
    current_user_key: Bytes<'a>,
    current_value: Bytes<'a>,
}

impl<'a> CacheIterator<'a> {
    pub(crate) fn new(cache: &'a RangeCache) -> Self {
        Self::with_arena(cache, None)
    }

    pub(crate) fn with_arena(cache: &'a RangeCache, arena: Option<&'a Arena>) -> Self {
        Self {
            cache,
            arena,
            range_start_key: None,
            inner_index: 0,
            valid: false,
            current_user_key: Bytes::default(),
            current_value: Bytes::default(),
        }
    }

    /// True if the cursor is positioned on a valid entry.
    #[must_use]
    pub const fn valid(&self) -> bool {
        self.valid
    }

    /// The current entry's user key. Panics if `!valid()`.
    #[must_use]
    pub fn user_key(&self) -> ByteSlice<'_> {
        assert!(self.valid, "iterator not positioned on a valid entry");
        ByteSlice::new(self.current_user_key.as_slice())
    }

    /// The current entry's value. Panics if `!valid()`.
    #[must_use]
    pub fn value(&self) -> ByteSlice<'_> {
        assert!(self.valid, "iterator not positioned on a valid entry");
        ByteSlice::new(self.current_value.as_slice())
    }

    fn copy_bytes(&self, bytes: &[u8]) -> Bytes<'a> {
        match self.arena {
            Some(arena) => Bytes::Arena(arena.alloc_slice(bytes)),
            None => Bytes::Owned(bytes.to_vec()),
        }
    }

    fn load_at(&mut self, start_key: Vec<u8>, inner_index: usize) -> bool {
        let inner = self.cache.inner_for_iter();
        let Some(range) = inner.ordered_set.get(&start_key) else {
            self.valid = false;
            return false;
        };
        if inner_index >= range.length() {
            self.valid = false;
            return false;
        }
        self.current_user_key = self.copy_bytes(range.user_key_at(inner_index).as_bytes());
        self.current_value = self.copy_bytes(range.value_at(inner_index).as_bytes());
        self.range_start_key = Some(start_key);
        self.inner_index = inner_index;
        self.valid = true;
        true
    }

    /// Positions on the smallest cached entry.
    pub fn seek_to_first(&mut self) {
        let inner = self.cache.inner_for_iter();
        let Some((start_key, _)) = inner.ordered_set.iter().next() else {
            self.valid = false;
            return;
        };
        let start_key = start_key.to_vec();
        drop(inner);
        self.load_at(start_key, 0);
    }

    /// Positions on the largest cached entry.
    pub fn seek_to_last(&mut self) {
        let inner = self.cache.inner_for_iter();
        let Some((start_key, range)) = inner.ordered_set.iter().next_back() else {
            self.valid = false;
            return;
        };
        let start_key = start_key.to_vec();
        let last_index = range.length() - 1;
        drop(inner);
        self.load_at(start_key, last_index);
    }

    /// Positions on the first entry with user key `>= target`.
    pub fn seek(&mut self, target: ByteSlice<'_>) {
        let inner = self.cache.inner_for_iter();
        let Some((start_key, range)) = inner.ordered_set.floor(target) else {
            // No range starts at or before target: fall back to the first
            // range entirely, if any, since its start key is > target.
            let Some((start_key, _)) = inner.ordered_set.ceiling(target) else {
                drop(inner);
                self.valid = false;
                return;
            };
            let start_key = start_key.to_vec();
            drop(inner);
            self.load_at(start_key, 0);
            return;
        };
        if target > range.end_user_key() {
            let Some((next_key, _)) = inner.ordered_set.ceiling(target) else {
                drop(inner);
                self.valid = false;
                return;
            };
            let next_key = next_key.to_vec();
            drop(inner);
            self.load_at(next_key, 0);
            return;
        }
        let index = range.find(target).unwrap_or(0);
        let start_key = start_key.to_vec();
        drop(inner);
        self.load_at(start_key, index);
    }

    /// Positions on the last entry with user key `<= target`.
    pub fn seek_for_prev(&mut self, target: ByteSlice<'_>) {
        let inner = self.cache.inner_for_iter();
        let Some((start_key, range)) = inner.ordered_set.floor(target) else {
            drop(inner);
            self.valid = false;
            return;
        };
        let start_key = start_key.to_vec();
        let index = match range.find(target) {
            Some(idx) if range.user_key_at(idx) == target => idx,
            Some(idx) if idx > 0 => idx - 1,
            Some(_) => {
                drop(inner);
                self.valid = false;
                return;
            }
            None => range.length() - 1,
        };
        drop(inner);
        self.load_at(start_key, index);
    }

    /// Advances to the next entry, ascending. Becomes invalid past the
    /// last entry.
    pub fn next(&mut self) {
        let Some(start_key) = self.range_start_key.clone() else {
            self.valid = false;
            return;
        };
        let inner = self.cache.inner_for_iter();
        let Some(range) = inner.ordered_set.get(&start_key) else {
            drop(inner);
            self.valid = false;
            return;
        };
        if self.inner_index + 1 < range.length() {
            let idx = self.inner_index + 1;
            drop(inner);
            self.load_at(start_key, idx);
            return;
        }
        let Some((next_key, _)) = inner
            .ordered_set
            .iter()
            .find(|(k, _)| *k > &start_key[..])
        else {
            drop(inner);
            self.valid = false;
            return;
        };
        let next_key = next_key.to_vec();
        drop(inner);
        self.load_at(next_key, 0);
    }

    /// Steps back to the previous entry, descending. Becomes invalid
    /// before the first entry.
    pub fn prev(&mut self) {
        let Some(start_key) = self.range_start_key.clone() else {
            self.valid = false;
            return;
        };
        if self.inner_index > 0 {
            let idx = self.inner_index - 1;
            self.load_at(start_key, idx);
            return;
        }
        let inner = self.cache.inner_for_iter();
        let Some((prev_key, prev_range)) = inner
            .ordered_set
            .iter()
            .rev()
            .find(|(k, _)| *k < &start_key[..])
        else {
            drop(inner);
            self.valid = false;
            return;
        };
        let prev_key = prev_key.to_vec();
        let last_index = prev_range.length() - 1;
        drop(inner);
        self.load_at(prev_key, last_index);
    }

    /// True iff the next `next()` call stays inside the current physical
    /// range — used by the scan orchestrator to detect the point the
    /// cache's coverage ends and the backing store must take over, without
    /// an extra `next()` round trip into the following range.
    #[must_use]
    pub fn has_next_in_range(&self) -> bool {
        if !self.valid {
            return false;
        }
        let inner = self.cache.inner_for_iter();
        let Some(range) = self
            .range_start_key
            .as_ref()
            .and_then(|k| inner.ordered_set.get(k))
        else {
            return false;
        };
        self.inner_index + 1 < range.length()
    }
}
