//! Range cache core: merge/split protocol, gap installation, eviction.
//!
//! `RangeCache` owns the [`crate::ordered_set::OrderedRangeSet`], the
//! [`crate::logical_range::LogicalRangesView`] and the cache-wide byte
//! budget behind a single `parking_lot::RwLock`, mirroring the teacher's
//! `LruCache` convention of one lock per table rather than per-entry
//! locking. Mutators (`put_overlapping`, `put_gap`, `update_entry`,
//! `victim`) take the exclusive side; reads (`divide`, iteration, `get`)
//! take the shared side.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use tracing::level_filters::LevelFilter;
use tracing::{debug, trace, Level};

use crate::byte_slice::ByteSlice;
use crate::error::{Result, UpdateResult};
use crate::logical_range::{LogicalRange, LogicalRangesView};
use crate::metrics::Telemetry;
use crate::ordered_set::OrderedRangeSet;
use crate::physical_range::{self, Layout, PhysicalRange};
use crate::referring_range::ReferringRange;
use crate::release_pool::ReleasePool;

/// Evicted physical ranges at or above this size are handed to the
/// background [`ReleasePool`] instead of being dropped on the exclusive
/// lock hold.
pub const ASYNC_RELEASE_THRESHOLD_BYTES: usize = 16 * 1024 * 1024;

pub(crate) struct Inner {
    pub(crate) ordered_set: OrderedRangeSet,
    pub(crate) logical_view: LogicalRangesView,
    current_size_bytes: usize,
    total_range_length: usize,
    /// Start key -> timestamp of its most recent `pin` call, consulted by
    /// `victim_locked` to break length ties in favor of evicting the least
    /// recently pinned range.
    pinned: std::collections::BTreeMap<Vec<u8>, u64>,
}

/// An in-memory cache of contiguous, sorted key-value segments.
pub struct RangeCache {
    inner: RwLock<Inner>,
    capacity_bytes: usize,
    layout: Layout,
    cache_seq_num: AtomicU64,
    lru_clock: AtomicU64,
    telemetry: Telemetry,
    release_pool: Option<ReleasePool>,
    logger_level: LevelFilter,
}

impl RangeCache {
    /// Builds an empty cache with the given byte capacity, logging level
    /// and layout.
    ///
    /// `logger_level` gates every `trace!`/`debug!` call this cache makes —
    /// passing [`LevelFilter::OFF`] skips the format/macro overhead of those
    /// calls entirely rather than relying on the subscriber to discard them.
    ///
    /// If `background_release` is true, evictions above
    /// [`ASYNC_RELEASE_THRESHOLD_BYTES`] are dropped on a worker thread
    /// instead of inline; this affects latency only, never correctness.
    #[must_use]
    pub fn new(capacity_bytes: usize, logger_level: LevelFilter, layout: Layout, background_release: bool) -> Self {
        Self {
            inner: RwLock::new(Inner {
                ordered_set: OrderedRangeSet::new(),
                logical_view: LogicalRangesView::new(),
                current_size_bytes: 0,
                total_range_length: 0,
                pinned: std::collections::BTreeMap::new(),
            }),
            capacity_bytes,
            layout,
            cache_seq_num: AtomicU64::new(0),
            lru_clock: AtomicU64::new(0),
            telemetry: Telemetry::default(),
            release_pool: background_release.then(ReleasePool::spawn),
            logger_level,
        }
    }

    fn log_enabled(&self, level: Level) -> bool {
        self.logger_level >= level
    }

    /// Telemetry counters accumulated since construction.
    #[must_use]
    pub const fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// Bytes currently held by cached ranges.
    #[must_use]
    pub fn current_size_bytes(&self) -> usize {
        self.inner.read().current_size_bytes
    }

    /// The byte budget this cache was constructed with (`0` means
    /// unbounded).
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity_bytes
    }

    /// Total number of `(key, value)` entries held across every cached
    /// physical range.
    #[must_use]
    pub fn total_range_length(&self) -> usize {
        self.inner.read().total_range_length
    }

    /// The next sequence number this cache will hand out to a mutator.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.cache_seq_num.load(Ordering::Relaxed)
    }

    /// Opens a forward/reverse cursor over this cache's entries.
    #[must_use]
    pub fn new_iterator(&self) -> crate::iter::CacheIterator<'_> {
        crate::iter::CacheIterator::new(self)
    }

    /// Opens a cursor that copies keys and values into `arena` instead of
    /// allocating a fresh `Vec` per step, for callers that open many
    /// short-lived iterators in a loop (such as [`crate::scan::scan`]'s
    /// per-segment walk) and want to amortize allocator traffic by resetting
    /// one arena between them.
    #[must_use]
    pub fn new_iterator_with_arena<'a>(
        &'a self,
        arena: &'a crate::arena::Arena,
    ) -> crate::iter::CacheIterator<'a> {
        crate::iter::CacheIterator::with_arena(self, Some(arena))
    }

    pub(crate) fn inner_for_iter(&self) -> parking_lot::RwLockReadGuard<'_, Inner> {
        self.inner.read()
    }

    fn next_sequence(&self) -> u64 {
        self.cache_seq_num.fetch_add(1, Ordering::Relaxed)
    }

    fn tick_lru(&self) -> u64 {
        self.lru_clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Point lookup: returns the value for `user_key` if a cached range
    /// covers it and contains the key.
    #[must_use]
    pub fn get(&self, user_key: ByteSlice<'_>) -> Option<Vec<u8>> {
        let started = Instant::now();
        let result = self.get_locked(user_key);
        self.telemetry.record_get(started.elapsed());
        result
    }

    fn get_locked(&self, user_key: ByteSlice<'_>) -> Option<Vec<u8>> {
        let inner = self.inner.read();
        let Some((_, range)) = inner.ordered_set.floor(user_key) else {
            self.telemetry.record_miss(user_key.len());
            return None;
        };
        if user_key > range.end_user_key() {
            self.telemetry.record_miss(user_key.len());
            return None;
        }
        let Some(idx) = range.find(user_key) else {
            self.telemetry.record_miss(user_key.len());
            return None;
        };
        if range.user_key_at(idx) != user_key {
            self.telemetry.record_miss(user_key.len());
            return None;
        }
        let value = range.value_at(idx).to_vec();
        self.telemetry.record_hit(value.len());
        Some(value)
    }

    /// Marks the range starting exactly at `start_key` as recently used. The
    /// cache does not expose a separate LRU chain; instead `victim_locked`
    /// consults the pin timestamp this stamps so eviction tie-breaking among
    /// equal-length ranges prefers the least recently pinned one first. A
    /// `start_key` with no range starting there is a no-op.
    pub fn pin(&self, start_key: ByteSlice<'_>) {
        let timestamp = self.tick_lru();
        let mut inner = self.inner.write();
        if inner.ordered_set.get(start_key.as_bytes()).is_some() {
            inner.pinned.insert(start_key.to_vec(), timestamp);
        }
    }

    /// Installs the result of a scan that overlapped one or more existing
    /// cached ranges, replacing everything in `[start, end]` with a single
    /// merged set of ranges built from `referring` plus whatever existing
    /// data fell inside the window, following the original's left-overhang
    /// detection and trailing-gap materialization walk.
    ///
    /// # Errors
    ///
    /// Propagates [`ErrorKind::InvariantViolation`] from the logical view
    /// if coalescing would overlap an existing interval, and
    /// [`ErrorKind::Empty`] if no entries fall within `[start, end]`.
    pub fn put_overlapping(
        &self,
        referring: &ReferringRange<'_>,
        start: ByteSlice<'_>,
        end: ByteSlice<'_>,
    ) -> Result<()> {
        let started = Instant::now();
        let result = self.put_overlapping_locked(referring, start, end);
        self.telemetry.record_put(started.elapsed());
        result
    }

    fn put_overlapping_locked(
        &self,
        referring: &ReferringRange<'_>,
        start: ByteSlice<'_>,
        end: ByteSlice<'_>,
    ) -> Result<()> {
        let sequence = self.next_sequence();
        let mut inner = self.inner.write();

        let left_overhang_key: Option<Vec<u8>> = inner
            .ordered_set
            .floor(start)
            .filter(|(k, r)| *k < start.as_bytes() && r.end_user_key() >= start)
            .map(|(k, _)| k.to_vec());

        let overlapping_keys: Vec<Vec<u8>> = left_overhang_key
            .into_iter()
            .chain(
                inner
                    .ordered_set
                    .iter_span(start, end)
                    .map(|(k, _)| k.to_vec()),
            )
            .collect();

        let mut last_start_key = start.to_vec();
        let mut left_inclusive = true;
        let mut fresh_ranges: Vec<Box<dyn PhysicalRange + Send>> = Vec::new();

        for key in &overlapping_keys {
            let removed = inner
                .ordered_set
                .remove(key)
                .expect("key came from the same ordered set iteration");
            inner.current_size_bytes -= removed.byte_size();
            inner.total_range_length -= removed.length();
            inner.logical_view.remove_starting_at(ByteSlice::new(key));
            inner.pinned.remove(key);

            let gap_start = ByteSlice::new(&last_start_key);
            let removed_start = removed.start_user_key().to_vec();
            if gap_start.as_bytes() < removed_start.as_slice() {
                let gap = physical_range::build_from_referring(
                    referring,
                    sequence,
                    gap_start,
                    ByteSlice::new(&removed_start),
                    left_inclusive,
                    false,
                    self.layout,
                )
                .ok();
                if let Some(gap) = gap {
                    let logical = LogicalRange::new(
                        gap_start.to_vec(),
                        removed_start.clone(),
                        gap.length(),
                        true,
                        left_inclusive,
                        false,
                    );
                    inner.current_size_bytes += gap.byte_size();
                    inner.total_range_length += gap.length();
                    inner.logical_view.put(logical, !left_inclusive, true)?;
                    fresh_ranges.push(gap);
                }
            }

            last_start_key = removed.end_user_key().to_vec();
            left_inclusive = false;
            let logical = LogicalRange::new(
                removed.start_user_key().to_vec(),
                removed.end_user_key().to_vec(),
                removed.length(),
                true,
                true,
                true,
            );
            inner.current_size_bytes += removed.byte_size();
            inner.total_range_length += removed.length();
            inner.logical_view.put(logical, false, false)?;
            fresh_ranges.push(removed);
        }

        let last_end = ByteSlice::new(&last_start_key);
        if last_end < end || (last_end == end && !left_inclusive) {
            if let Ok(tail) = physical_range::build_from_referring(
                referring,
                sequence,
                last_end,
                end,
                left_inclusive,
                true,
                self.layout,
            ) {
                let logical = LogicalRange::new(
                    last_start_key.clone(),
                    end.to_vec(),
                    tail.length(),
                    true,
                    left_inclusive,
                    true,
                );
                inner.current_size_bytes += tail.byte_size();
                inner.total_range_length += tail.length();
                inner.logical_view.put(logical, !left_inclusive, true)?;
                fresh_ranges.push(tail);
            }
        }

        for range in fresh_ranges {
            inner.ordered_set.insert(range);
        }

        if self.log_enabled(Level::TRACE) {
            trace!(overlaps = overlapping_keys.len(), "put_overlapping merged scan result");
        }
        self.evict_while_over_capacity(&mut inner);
        Ok(())
    }

    /// Installs a referring range that did not overlap any cached data —
    /// either a freshly scanned non-empty segment, or (when `empty_concat`
    /// is set) a zero-length bridge marking `[left_bridge_key,
    /// right_bridge_key)` as a confirmed-empty gap.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Empty`] if the non-bridge branch finds no
    /// entries in `[start, end]`.
    #[allow(clippy::too_many_arguments)]
    pub fn put_gap(
        &self,
        referring: &ReferringRange<'_>,
        start: ByteSlice<'_>,
        end: ByteSlice<'_>,
        left_concat: bool,
        right_concat: bool,
        empty_concat: Option<(ByteSlice<'_>, ByteSlice<'_>)>,
    ) -> Result<()> {
        let started = Instant::now();
        let result = self.put_gap_locked(referring, start, end, left_concat, right_concat, empty_concat);
        self.telemetry.record_put(started.elapsed());
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn put_gap_locked(
        &self,
        referring: &ReferringRange<'_>,
        start: ByteSlice<'_>,
        end: ByteSlice<'_>,
        left_concat: bool,
        right_concat: bool,
        empty_concat: Option<(ByteSlice<'_>, ByteSlice<'_>)>,
    ) -> Result<()> {
        let mut inner = self.inner.write();

        if let Some((left_bridge_key, right_bridge_key)) = empty_concat {
            debug_assert!(!left_bridge_key.is_empty() && !right_bridge_key.is_empty());
            let logical = LogicalRange::new(
                left_bridge_key.to_vec(),
                right_bridge_key.to_vec(),
                0,
                false,
                true,
                true,
            );
            inner.logical_view.put(logical, true, true)?;
            return Ok(());
        }

        let sequence = self.next_sequence();
        let range = physical_range::build_from_referring(
            referring, sequence, start, end, true, true, self.layout,
        )?;
        let logical = LogicalRange::new(
            range.start_user_key().to_vec(),
            range.end_user_key().to_vec(),
            range.length(),
            true,
            true,
            true,
        );
        inner.current_size_bytes += range.byte_size();
        inner.total_range_length += range.length();
        inner.logical_view.put(logical, left_concat, right_concat)?;
        inner.ordered_set.insert(range);

        if self.log_enabled(Level::DEBUG) {
            debug!(start = ?start, end = ?end, "put_gap installed cache segment");
        }
        self.evict_while_over_capacity(&mut inner);
        Ok(())
    }

    /// Applies a live write to whichever cached physical range, if any,
    /// covers `internal_key`'s user-key portion.
    ///
    /// Returns `None` if no cached range covers the key (nothing to
    /// update); otherwise the layout-specific [`UpdateResult`].
    pub fn update_entry(&self, internal_key: &[u8], value: &[u8]) -> Option<UpdateResult> {
        let user_key = crate::internal_key::user_key_of(internal_key).ok()?;
        let mut inner = self.inner.write();
        let start_key = inner
            .ordered_set
            .floor(user_key)
            .filter(|(_, r)| user_key <= r.end_user_key())
            .map(|(k, _)| k.to_vec())?;

        let before = inner
            .ordered_set
            .get(&start_key)
            .map(PhysicalRange::byte_size)
            .unwrap_or(0);

        let result = {
            let mut range = inner.ordered_set.remove(&start_key)?;
            let outcome = range.update(internal_key, value);
            inner.ordered_set.insert(range);
            outcome
        };

        if let Ok(outcome) = &result {
            let after = inner
                .ordered_set
                .get(&start_key)
                .map(PhysicalRange::byte_size)
                .unwrap_or(before);
            inner.current_size_bytes = inner.current_size_bytes + after - before;
            if matches!(outcome, UpdateResult::Inserted) {
                inner.total_range_length += 1;
            }
        }

        result.ok()
    }

    /// Tiles `[start, end]` into the cached and non-cached spans the scan
    /// orchestrator needs, stopping once `max_len` cached entries have been
    /// emitted (a budget of `0` means unbounded).
    #[must_use]
    pub fn divide(&self, start: ByteSlice<'_>, end: ByteSlice<'_>, max_len: usize) -> Vec<LogicalRange> {
        let inner = self.inner.read();
        let mut out = Vec::new();
        let mut cursor = start.to_vec();
        let mut budget_used = 0usize;

        for logical in inner.logical_view.iter() {
            if logical.end_user_key() < ByteSlice::new(&cursor) {
                continue;
            }
            if logical.start_user_key() > end {
                break;
            }
            let cursor_slice = ByteSlice::new(&cursor);
            if cursor_slice < logical.start_user_key() {
                out.push(LogicalRange::new(
                    cursor.clone(),
                    logical.start_user_key().to_vec(),
                    0,
                    false,
                    true,
                    false,
                ));
            }
            let seg_end = if logical.end_user_key() > end {
                end.to_vec()
            } else {
                logical.end_user_key().to_vec()
            };
            out.push(LogicalRange::new(
                logical.start_user_key().to_vec(),
                seg_end.clone(),
                logical.length(),
                logical.in_range_cache(),
                logical.left_included(),
                true,
            ));
            cursor = seg_end;
            if logical.in_range_cache() {
                budget_used += logical.length();
                if max_len != 0 && budget_used >= max_len {
                    break;
                }
            }
            if ByteSlice::new(&cursor) >= end {
                break;
            }
        }

        if ByteSlice::new(&cursor) < end {
            out.push(LogicalRange::new(cursor, end.to_vec(), 0, false, false, true));
        }

        out
    }

    /// Evicts the shortest cached range, unless doing so would leave the
    /// cache with zero ranges while `capacity_bytes == 0` (Open Question 1,
    /// see `DESIGN.md`). Returns the evicted range's start key, if any.
    pub fn try_victim(&self) -> Option<Vec<u8>> {
        let mut inner = self.inner.write();
        self.victim_locked(&mut inner)
    }

    fn victim_locked(&self, inner: &mut Inner) -> Option<Vec<u8>> {
        if inner.ordered_set.len() <= 1 && self.capacity_bytes == 0 {
            return None;
        }
        let start_key = inner.ordered_set.shortest_start_key(&inner.pinned)?.to_vec();
        let removed = inner.ordered_set.remove(&start_key)?;
        inner.current_size_bytes -= removed.byte_size();
        inner.total_range_length -= removed.length();
        inner.logical_view.remove_starting_at(ByteSlice::new(&start_key));
        inner.pinned.remove(&start_key);
        self.telemetry.record_eviction(removed.byte_size());

        if removed.byte_size() >= ASYNC_RELEASE_THRESHOLD_BYTES {
            if let Some(pool) = &self.release_pool {
                pool.release(removed);
                return Some(start_key);
            }
        }
        drop(removed);
        Some(start_key)
    }

    fn evict_while_over_capacity(&self, inner: &mut Inner) {
        if self.capacity_bytes == 0 {
            return;
        }
        while inner.current_size_bytes > self.capacity_bytes {
            if self.victim_locked(inner).is_none() {
                break;
            }
        }
    }
}
