//! Ordered set of physical ranges, indexed two ways.
//!
//! The primary index is a `BTreeMap` keyed by each range's start user key,
//! giving the cache core and the iterator ordered traversal and
//! heterogeneous `&[u8]` lookup without allocating a probe key. The
//! secondary index is a length-to-start-keys multimap that turns "find the
//! shortest cached range" — the eviction victim search — into an O(log N)
//! lookup of the first entry instead of a full scan.
//!
//! `shortest_start_key` also takes the cache's pin-timestamp table so ties
//! among equal-length ranges break in favor of evicting the least recently
//! pinned one.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use crate::byte_slice::ByteSlice;
use crate::physical_range::PhysicalRange;

/// Indexes owned physical ranges by start user key and by length.
#[derive(Default)]
pub struct OrderedRangeSet {
    by_start_key: BTreeMap<Vec<u8>, Box<dyn PhysicalRange + Send>>,
    by_length: BTreeMap<usize, BTreeSet<Vec<u8>>>,
}

impl OrderedRangeSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_start_key: BTreeMap::new(),
            by_length: BTreeMap::new(),
        }
    }

    /// Number of ranges held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_start_key.len()
    }

    /// True if no ranges are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_start_key.is_empty()
    }

    /// Inserts a range, keyed by its current start user key.
    ///
    /// Panics if a range with the same start key is already present — the
    /// cache core is responsible for never calling this with an overlapping
    /// range, since the whole point of `put_overlapping`/`put_gap` is to
    /// guarantee disjointness before insertion.
    pub fn insert(&mut self, range: Box<dyn PhysicalRange + Send>) {
        let start_key = range.start_user_key().to_vec();
        let length = range.length();
        let previous = self.by_start_key.insert(start_key.clone(), range);
        assert!(
            previous.is_none(),
            "ordered range set already has a range starting at this key"
        );
        self.by_length.entry(length).or_default().insert(start_key);
    }

    /// Removes and returns the range starting exactly at `start_key`.
    pub fn remove(&mut self, start_key: &[u8]) -> Option<Box<dyn PhysicalRange + Send>> {
        let range = self.by_start_key.remove(start_key)?;
        let length = range.length();
        if let Some(keys) = self.by_length.get_mut(&length) {
            keys.remove(start_key);
            if keys.is_empty() {
                self.by_length.remove(&length);
            }
        }
        Some(range)
    }

    /// The range starting exactly at `start_key`, if present.
    #[must_use]
    pub fn get(&self, start_key: &[u8]) -> Option<&(dyn PhysicalRange + Send)> {
        self.by_start_key.get(start_key).map(AsRef::as_ref)
    }

    /// The last range whose start key is `<= key`.
    #[must_use]
    pub fn floor(&self, key: ByteSlice<'_>) -> Option<(&[u8], &(dyn PhysicalRange + Send))> {
        self.by_start_key
            .range::<[u8], _>((Bound::Unbounded, Bound::Included(key.as_bytes())))
            .next_back()
            .map(|(k, v)| (k.as_slice(), v.as_ref()))
    }

    /// The first range whose start key is `>= key`.
    #[must_use]
    pub fn ceiling(&self, key: ByteSlice<'_>) -> Option<(&[u8], &(dyn PhysicalRange + Send))> {
        self.by_start_key
            .range::<[u8], _>((Bound::Included(key.as_bytes()), Bound::Unbounded))
            .next()
            .map(|(k, v)| (k.as_slice(), v.as_ref()))
    }

    /// Iterates ranges in ascending start-key order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&[u8], &(dyn PhysicalRange + Send))> {
        self.by_start_key.iter().map(|(k, v)| (k.as_slice(), v.as_ref()))
    }

    /// Iterates ranges whose start key lies in `[lo, hi]`, ascending.
    pub fn iter_span(
        &self,
        lo: ByteSlice<'_>,
        hi: ByteSlice<'_>,
    ) -> impl DoubleEndedIterator<Item = (&[u8], &(dyn PhysicalRange + Send))> {
        self.by_start_key
            .range::<[u8], _>((Bound::Included(lo.as_bytes()), Bound::Included(hi.as_bytes())))
            .map(|(k, v)| (k.as_slice(), v.as_ref()))
    }

    /// The start key of the shortest range currently held, if any.
    ///
    /// Among ranges tied for the shortest length, the one with the lowest
    /// entry in `pinned` (an absent entry counts as `0`, i.e. never pinned)
    /// wins — the least recently pinned range is evicted first. Remaining
    /// ties break on start-key order via the `BTreeSet`'s own ordering.
    #[must_use]
    pub fn shortest_start_key(&self, pinned: &BTreeMap<Vec<u8>, u64>) -> Option<&[u8]> {
        let keys = self.by_length.iter().next().map(|(_, keys)| keys)?;
        keys.iter()
            .min_by_key(|k| pinned.get(k.as_slice()).copied().unwrap_or(0))
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physical_range::vec_range::VecPhysicalRange;
    use crate::referring_range::ReferringRange;

    fn bs(s: &'static str) -> ByteSlice<'static> {
        ByteSlice::from(s)
    }

    fn range(keys: &[&'static str]) -> Box<dyn PhysicalRange + Send> {
        let mut rr = ReferringRange::new();
        for k in keys {
            rr.emplace(bs(k), bs("v")).unwrap();
        }
        let entries = rr
            .dump_subrange(bs(keys[0]), bs(keys[keys.len() - 1]), true, true)
            .unwrap();
        Box::new(VecPhysicalRange::from_entries(&entries, 1))
    }

    #[test]
    fn insert_and_lookup_by_floor_ceiling() {
        let mut set = OrderedRangeSet::new();
        set.insert(range(&["a", "b"]));
        set.insert(range(&["d", "e"]));
        assert_eq!(set.len(), 2);
        assert_eq!(set.floor(bs("c")).unwrap().0, b"a");
        assert_eq!(set.ceiling(bs("c")).unwrap().0, b"d");
    }

    #[test]
    fn shortest_start_key_tracks_length() {
        let mut set = OrderedRangeSet::new();
        set.insert(range(&["a", "b", "c"]));
        set.insert(range(&["x", "y"]));
        assert_eq!(set.shortest_start_key(&BTreeMap::new()), Some(b"x".as_slice()));
    }

    #[test]
    fn shortest_start_key_breaks_ties_on_pin_timestamp() {
        let mut set = OrderedRangeSet::new();
        set.insert(range(&["a", "b"]));
        set.insert(range(&["x", "y"]));
        let mut pinned = BTreeMap::new();
        pinned.insert(b"a".to_vec(), 5);
        assert_eq!(set.shortest_start_key(&pinned), Some(b"x".as_slice()));
    }

    #[test]
    fn remove_updates_both_indexes() {
        let mut set = OrderedRangeSet::new();
        set.insert(range(&["a", "b"]));
        set.remove(b"a");
        assert!(set.is_empty());
        assert_eq!(set.shortest_start_key(&BTreeMap::new()), None);
    }
}
