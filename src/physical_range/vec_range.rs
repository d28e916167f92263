//! Vector-layout physical range: parallel owned-string containers.
//!
//! Supports in-place update of an existing key and in-order or random
//! insertion of a new one, at the cost of one `Vec` shift per insertion —
//! the layout to prefer when a range is expected to receive scattered live
//! writes rather than being read-mostly.

use crate::byte_slice::ByteSlice;
use crate::error::{ErrorKind, Result, UpdateResult};
use crate::internal_key::{self, KeyKind};
use crate::referring_range::ReferringEntry;

use super::PhysicalRange;

/// A physical range backed by parallel `Vec<Vec<u8>>` key/value storage.
#[derive(Debug, Default)]
pub struct VecPhysicalRange {
    internal_keys: Vec<Vec<u8>>,
    values: Vec<Vec<u8>>,
}

impl VecPhysicalRange {
    /// Builds a range from a contiguous slice of referring entries, tagging
    /// every encoded internal key with `sequence` and
    /// [`KeyKind::RangeCacheValue`].
    #[must_use]
    pub fn from_entries(entries: &[ReferringEntry<'_>], sequence: u64) -> Self {
        let mut range = Self {
            internal_keys: Vec::with_capacity(entries.len()),
            values: Vec::with_capacity(entries.len()),
        };
        for entry in entries {
            range.internal_keys.push(internal_key::encode(
                entry.user_key.as_bytes(),
                sequence,
                KeyKind::RangeCacheValue,
            ));
            range.values.push(entry.value.to_vec());
        }
        range
    }

    fn user_key_at_raw(&self, index: usize) -> &[u8] {
        let ik = &self.internal_keys[index];
        &ik[..ik.len() - internal_key::TRAILER_LEN]
    }
}

impl PhysicalRange for VecPhysicalRange {
    fn start_user_key(&self) -> ByteSlice<'_> {
        ByteSlice::new(self.user_key_at_raw(0))
    }

    fn end_user_key(&self) -> ByteSlice<'_> {
        ByteSlice::new(self.user_key_at_raw(self.internal_keys.len() - 1))
    }

    fn length(&self) -> usize {
        self.internal_keys.len()
    }

    fn byte_size(&self) -> usize {
        self.internal_keys
            .iter()
            .zip(self.values.iter())
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    fn user_key_at(&self, index: usize) -> ByteSlice<'_> {
        ByteSlice::new(self.user_key_at_raw(index))
    }

    fn internal_key_at(&self, index: usize) -> ByteSlice<'_> {
        ByteSlice::new(&self.internal_keys[index])
    }

    fn value_at(&self, index: usize) -> ByteSlice<'_> {
        ByteSlice::new(&self.values[index])
    }

    fn find(&self, key: ByteSlice<'_>) -> Option<usize> {
        let len = self.internal_keys.len();
        if len == 0 {
            return None;
        }
        let mut lo = 0usize;
        let mut hi = len;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.user_key_at_raw(mid) < key.as_bytes() {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo >= len {
            None
        } else {
            Some(lo)
        }
    }

    fn update(&mut self, internal_key: &[u8], value: &[u8]) -> Result<UpdateResult> {
        if internal_key.len() <= internal_key::TRAILER_LEN {
            return Err(ErrorKind::CorruptInternalKey(
                "internal key too short to carry a user key".into(),
            ));
        }
        let decoded = internal_key::decode(internal_key)?;
        let user_key = decoded.user_key;
        let new_key = internal_key::encode(user_key.as_bytes(), decoded.sequence, KeyKind::RangeCacheValue);

        match self.find(user_key) {
            Some(idx) if self.user_key_at_raw(idx) == user_key.as_bytes() => {
                self.internal_keys[idx] = new_key;
                self.values[idx] = value.to_vec();
                Ok(UpdateResult::Updated)
            }
            Some(idx) => {
                self.internal_keys.insert(idx, new_key);
                self.values.insert(idx, value.to_vec());
                Ok(UpdateResult::Inserted)
            }
            None => {
                self.internal_keys.push(new_key);
                self.values.push(value.to_vec());
                Ok(UpdateResult::Inserted)
            }
        }
    }

    fn reserve(&mut self, len: usize) {
        self.internal_keys.reserve(len);
        self.values.reserve(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::referring_range::ReferringRange;

    fn bs(s: &'static str) -> ByteSlice<'static> {
        ByteSlice::from(s)
    }

    fn build(keys: &[&'static str]) -> VecPhysicalRange {
        let mut rr = ReferringRange::new();
        for k in keys {
            rr.emplace(bs(k), bs("v")).unwrap();
        }
        let entries = rr
            .dump_subrange(bs(keys[0]), bs(keys[keys.len() - 1]), true, true)
            .unwrap();
        VecPhysicalRange::from_entries(&entries, 1)
    }

    #[test]
    fn update_replaces_existing_in_place() {
        let mut range = build(&["a", "c", "e"]);
        let ik = internal_key::encode(b"c", 99, KeyKind::RangeCacheValue);
        let result = range.update(&ik, b"new").unwrap();
        assert_eq!(result, UpdateResult::Updated);
        assert_eq!(range.value_at(1).as_bytes(), b"new");
        assert_eq!(range.length(), 3);
    }

    #[test]
    fn update_inserts_new_key_in_order() {
        let mut range = build(&["a", "c", "e"]);
        let ik = internal_key::encode(b"b", 5, KeyKind::RangeCacheValue);
        let result = range.update(&ik, b"new").unwrap();
        assert_eq!(result, UpdateResult::Inserted);
        assert_eq!(range.length(), 4);
        assert_eq!(range.user_key_at(1).as_bytes(), b"b");
    }

    #[test]
    fn update_tail_insertion() {
        let mut range = build(&["a", "c"]);
        let ik = internal_key::encode(b"z", 5, KeyKind::RangeCacheValue);
        let result = range.update(&ik, b"new").unwrap();
        assert_eq!(result, UpdateResult::Inserted);
        assert_eq!(range.end_user_key().as_bytes(), b"z");
    }
}
