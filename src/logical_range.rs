//! Logical range view: metadata-only coverage intervals.
//!
//! A [`LogicalRange`] records a `[start, end]` user-key span that is either
//! backed by a cached physical range (`in_range_cache == true`) or a known
//! gap the backing store has already confirmed to be empty. The
//! [`LogicalRangesView`] keeps these spans sorted, contiguous and coalesced
//! so `divide` can answer "what, if anything, is cached here?" in one scan.

use std::collections::BTreeMap;

use crate::byte_slice::ByteSlice;
use crate::error::{ErrorKind, Result};

/// One interval of the key space the cache has an opinion about.
#[derive(Debug, Clone)]
pub struct LogicalRange {
    start_user_key: Vec<u8>,
    end_user_key: Vec<u8>,
    /// Number of entries the backing physical range holds, or 0 for a gap.
    length_hint: usize,
    in_range_cache: bool,
    left_included: bool,
    right_included: bool,
}

impl LogicalRange {
    /// Builds a new logical range.
    #[must_use]
    pub fn new(
        start_user_key: Vec<u8>,
        end_user_key: Vec<u8>,
        length_hint: usize,
        in_range_cache: bool,
        left_included: bool,
        right_included: bool,
    ) -> Self {
        Self {
            start_user_key,
            end_user_key,
            length_hint,
            in_range_cache,
            left_included,
            right_included,
        }
    }

    /// Start user key of this interval.
    #[must_use]
    pub fn start_user_key(&self) -> ByteSlice<'_> {
        ByteSlice::new(&self.start_user_key)
    }

    /// End user key of this interval.
    #[must_use]
    pub fn end_user_key(&self) -> ByteSlice<'_> {
        ByteSlice::new(&self.end_user_key)
    }

    /// Entries covered, if this interval is backed by a cached range.
    #[must_use]
    pub const fn length(&self) -> usize {
        self.length_hint
    }

    /// True if this interval is backed by a physical range in the cache.
    #[must_use]
    pub const fn in_range_cache(&self) -> bool {
        self.in_range_cache
    }

    /// Whether the start key itself is covered.
    #[must_use]
    pub const fn left_included(&self) -> bool {
        self.left_included
    }

    /// Whether the end key itself is covered.
    #[must_use]
    pub const fn right_included(&self) -> bool {
        self.right_included
    }
}

/// An ordered, coalesced set of [`LogicalRange`]s covering disjoint spans.
#[derive(Debug, Default)]
pub struct LogicalRangesView {
    ranges: BTreeMap<Vec<u8>, LogicalRange>,
}

impl LogicalRangesView {
    /// Creates an empty view.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ranges: BTreeMap::new(),
        }
    }

    /// Number of distinct intervals currently tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True if no intervals are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Iterates intervals in ascending start-key order.
    pub fn iter(&self) -> impl Iterator<Item = &LogicalRange> {
        self.ranges.values()
    }

    /// The interval, if any, whose start key is `<=` key and whose span
    /// reaches at least `key` (a "contains" probe used by `divide`).
    #[must_use]
    pub fn range_containing(&self, key: ByteSlice<'_>) -> Option<&LogicalRange> {
        self.ranges
            .range(..=key.to_vec())
            .next_back()
            .map(|(_, r)| r)
            .filter(|r| key.as_bytes() <= r.end_user_key.as_slice())
    }

    /// Removes the interval starting exactly at `key`, if present.
    pub fn remove_starting_at(&mut self, key: ByteSlice<'_>) -> Option<LogicalRange> {
        self.ranges.remove(key.as_bytes())
    }

    /// Installs `range`, absorbing an adjacent left and/or right neighbor
    /// when instructed (`left_concat`/`right_concat`), following the same
    /// lower-bound-then-erase-then-insert coalescing protocol the range
    /// cache core uses when materializing a gap or merge result.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvariantViolation`] if, after coalescing, the
    /// predecessor interval's end key is not strictly less than the new
    /// range's start key — the view would otherwise overlap itself.
    pub fn put(&mut self, mut range: LogicalRange, left_concat: bool, right_concat: bool) -> Result<()> {
        if left_concat {
            if let Some((_, left)) = self
                .ranges
                .range(..range.start_user_key.clone())
                .next_back()
                .map(|(k, v)| (k.clone(), v.clone()))
            {
                if left.end_user_key.as_slice() >= range.start_user_key.as_slice()
                    || (left.right_included && left.end_user_key == range.start_user_key)
                {
                    range.start_user_key = left.start_user_key.clone();
                    range.left_included = left.left_included;
                    range.length_hint += left.length_hint;
                    self.ranges.remove(&left.start_user_key);
                }
            }
        }

        if right_concat {
            if let Some((_, right)) = self
                .ranges
                .range(range.end_user_key.clone()..)
                .next()
                .map(|(k, v)| (k.clone(), v.clone()))
            {
                if range.start_user_key.as_slice() <= right.start_user_key.as_slice() {
                    range.end_user_key = right.end_user_key.clone();
                    range.right_included = right.right_included;
                    range.length_hint += right.length_hint;
                    self.ranges.remove(&right.start_user_key);
                }
            }
        }

        if let Some((_, prev)) = self
            .ranges
            .range(..range.start_user_key.clone())
            .next_back()
        {
            if prev.end_user_key.as_slice() >= range.start_user_key.as_slice() {
                return Err(ErrorKind::InvariantViolation(
                    "logical ranges view would overlap an existing interval".into(),
                ));
            }
        }

        self.ranges.insert(range.start_user_key.clone(), range);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: &str, end: &str, len: usize, cached: bool) -> LogicalRange {
        LogicalRange::new(start.as_bytes().to_vec(), end.as_bytes().to_vec(), len, cached, true, true)
    }

    #[test]
    fn put_without_concat_inserts_standalone() {
        let mut view = LogicalRangesView::new();
        view.put(range("a", "c", 3, true), false, false).unwrap();
        assert_eq!(view.len(), 1);
    }

    #[test]
    fn put_with_right_concat_merges_adjacent() {
        let mut view = LogicalRangesView::new();
        view.put(range("d", "f", 3, true), false, false).unwrap();
        view.put(range("a", "c", 3, true), false, true).unwrap();
        assert_eq!(view.len(), 1);
        let merged = view.iter().next().unwrap();
        assert_eq!(merged.start_user_key().as_bytes(), b"a");
        assert_eq!(merged.end_user_key().as_bytes(), b"f");
        assert_eq!(merged.length(), 6);
    }

    #[test]
    fn put_with_left_concat_merges_adjacent() {
        let mut view = LogicalRangesView::new();
        view.put(range("a", "c", 3, true), false, false).unwrap();
        view.put(range("d", "f", 3, true), true, false).unwrap();
        assert_eq!(view.len(), 1);
        let merged = view.iter().next().unwrap();
        assert_eq!(merged.start_user_key().as_bytes(), b"a");
        assert_eq!(merged.end_user_key().as_bytes(), b"f");
    }

    #[test]
    fn remove_starting_at_drops_interval() {
        let mut view = LogicalRangesView::new();
        view.put(range("a", "c", 3, true), false, false).unwrap();
        assert!(view.remove_starting_at(ByteSlice::from("a")).is_some());
        assert!(view.is_empty());
    }
}
