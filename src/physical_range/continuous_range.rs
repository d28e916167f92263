//! Continuous-layout physical range: monolithic byte buffers.
//!
//! Keys and values live in two contiguous `bytes::Bytes` buffers addressed
//! by per-entry offset/length tables. This is cheaper to build and scan
//! than the vector layout, but it cannot shift bytes in the middle of the
//! buffer, so a same-size key update happens in place while a value whose
//! new size differs from its original slot spills into an `overflow_values`
//! side-table instead of growing the buffer; a live write for a user key
//! that falls outside the range's span is rejected with
//! [`UpdateResult::OutOfRange`], and one that falls inside the span but
//! isn't already present is rejected with [`UpdateResult::UnableToInsert`]
//! rather than attempted.

use bytes::BytesMut;

use crate::byte_slice::ByteSlice;
use crate::error::{ErrorKind, Result, UpdateResult};
use crate::internal_key::{self, KeyKind};
use crate::referring_range::ReferringEntry;

#[derive(Debug, Clone, Copy)]
struct Span {
    offset: usize,
    len: usize,
}

/// A physical range backed by monolithic key/value buffers.
#[derive(Debug, Default)]
pub struct ContinuousPhysicalRange {
    keys_buffer: Vec<u8>,
    key_spans: Vec<Span>,
    /// Original (buffer) value span, kept even once an entry overflows so a
    /// later same-size write can move it back in place.
    value_spans: Vec<Span>,
    values_buffer: BytesMut,
    is_overflow: Vec<bool>,
    overflow_values: Vec<Option<Vec<u8>>>,
}

impl ContinuousPhysicalRange {
    /// Builds a range from a contiguous slice of referring entries.
    #[must_use]
    pub fn from_entries(entries: &[ReferringEntry<'_>], sequence: u64) -> Self {
        let mut keys_buffer = Vec::new();
        let mut key_spans = Vec::with_capacity(entries.len());
        let mut values_buffer = Vec::new();
        let mut value_spans = Vec::with_capacity(entries.len());

        for entry in entries {
            let encoded = internal_key::encode(
                entry.user_key.as_bytes(),
                sequence,
                KeyKind::RangeCacheValue,
            );
            key_spans.push(Span {
                offset: keys_buffer.len(),
                len: encoded.len(),
            });
            keys_buffer.extend_from_slice(&encoded);

            let value = entry.value.as_bytes();
            value_spans.push(Span {
                offset: values_buffer.len(),
                len: value.len(),
            });
            values_buffer.extend_from_slice(value);
        }

        let len = entries.len();
        Self {
            keys_buffer,
            key_spans,
            value_spans,
            values_buffer: BytesMut::from(&values_buffer[..]),
            is_overflow: vec![false; len],
            overflow_values: vec![None; len],
        }
    }

    fn key_slice(&self, index: usize) -> &[u8] {
        let span = self.key_spans[index];
        &self.keys_buffer[span.offset..span.offset + span.len]
    }

    fn user_key_slice(&self, index: usize) -> &[u8] {
        let key = self.key_slice(index);
        &key[..key.len() - internal_key::TRAILER_LEN]
    }

    fn find_index(&self, key: &[u8]) -> Option<usize> {
        let len = self.key_spans.len();
        if len == 0 {
            return None;
        }
        let mut lo = 0usize;
        let mut hi = len;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.user_key_slice(mid) < key {
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
}

impl super::PhysicalRange for ContinuousPhysicalRange {
    fn start_user_key(&self) -> ByteSlice<'_> {
        ByteSlice::new(self.user_key_slice(0))
    }

    fn end_user_key(&self) -> ByteSlice<'_> {
        ByteSlice::new(self.user_key_slice(self.key_spans.len() - 1))
    }

    fn length(&self) -> usize {
        self.key_spans.len()
    }

    fn byte_size(&self) -> usize {
        let keys: usize = self.key_spans.iter().map(|s| s.len).sum();
        let values: usize = (0..self.value_spans.len())
            .map(|i| super::PhysicalRange::value_at(self, i).len())
            .sum();
        keys + values
    }

    fn user_key_at(&self, index: usize) -> ByteSlice<'_> {
        ByteSlice::new(self.user_key_slice(index))
    }

    fn internal_key_at(&self, index: usize) -> ByteSlice<'_> {
        ByteSlice::new(self.key_slice(index))
    }

    fn value_at(&self, index: usize) -> ByteSlice<'_> {
        if self.is_overflow[index] {
            ByteSlice::new(
                self.overflow_values[index]
                    .as_deref()
                    .expect("is_overflow implies overflow_values is populated"),
            )
        } else {
            let span = self.value_spans[index];
            ByteSlice::new(&self.values_buffer[span.offset..span.offset + span.len])
        }
    }

    fn find(&self, key: ByteSlice<'_>) -> Option<usize> {
        self.find_index(key.as_bytes())
    }

    fn update(&mut self, internal_key: &[u8], value: &[u8]) -> Result<UpdateResult> {
        if internal_key.len() <= internal_key::TRAILER_LEN {
            return Err(ErrorKind::CorruptInternalKey(
                "internal key too short to carry a user key".into(),
            ));
        }
        let decoded = internal_key::decode(internal_key)?;
        let user_key = decoded.user_key;

        let Some(index) = self.find_index(user_key.as_bytes()) else {
            return Ok(UpdateResult::OutOfRange);
        };
        if self.user_key_slice(index) != user_key.as_bytes() {
            return Ok(UpdateResult::UnableToInsert);
        }

        let new_key = internal_key::encode(user_key.as_bytes(), decoded.sequence, KeyKind::RangeCacheValue);
        let span = self.key_spans[index];
        debug_assert_eq!(new_key.len(), span.len, "sequence encoding never changes key length");
        self.keys_buffer[span.offset..span.offset + span.len].copy_from_slice(&new_key);

        let original_span = self.value_spans[index];
        if value.len() == original_span.len {
            // Fits back into the original slot: drop any overflow.
            self.overflow_values[index] = None;
            self.is_overflow[index] = false;
            self.values_buffer[original_span.offset..original_span.offset + original_span.len]
                .copy_from_slice(value);
        } else {
            self.overflow_values[index] = Some(value.to_vec());
            self.is_overflow[index] = true;
        }

        Ok(UpdateResult::Updated)
    }

    fn reserve(&mut self, len: usize) {
        self.key_spans.reserve(len);
        self.value_spans.reserve(len);
        self.is_overflow.reserve(len);
        self.overflow_values.reserve(len);
    }
}
