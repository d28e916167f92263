//! Internal-key codec: `(user_key, sequence_number, type_tag)`.
//!
//! The wire form is `user_key || big_endian_u64((sequence << 8) | type)`, so
//! that among internal keys sharing a user key, larger sequence numbers sort
//! first (newest wins) — the trailer is ordered in the same direction as the
//! sequence number, and it is the *low* byte that carries the type, so a
//! higher sequence always dominates the comparison regardless of type.

use crate::byte_slice::ByteSlice;
use crate::error::{ErrorKind, Result};

/// Number of trailer bytes appended after the user key.
pub const TRAILER_LEN: usize = 8;

/// Distinguishes entries materialized from a scan from live MVCC entries.
///
/// Only [`KeyKind::RangeCacheValue`] is ever produced by this crate's own
/// encoders; `decode` accepts both so an iterator joining cache output with
/// foreign internal keys from a backing store never misparses them.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KeyKind {
    /// A live MVCC entry as produced by the backing store's write path.
    Value,
    /// An entry materialized into the range cache from a scan result.
    RangeCacheValue,
}

impl KeyKind {
    const fn to_tag(self) -> u8 {
        match self {
            Self::Value => 1,
            Self::RangeCacheValue => 2,
        }
    }

    const fn from_tag(tag: u8) -> Self {
        match tag {
            2 => Self::RangeCacheValue,
            _ => Self::Value,
        }
    }
}

/// A decoded internal key: a borrowed user-key slice plus its trailer.
#[derive(Debug, Clone, Copy)]
pub struct InternalKey<'a> {
    /// The user-visible key bytes, without the trailer.
    pub user_key: ByteSlice<'a>,
    /// Sequence number under which the entry was written.
    pub sequence: u64,
    /// Whether this is a live value or a cached scan entry.
    pub kind: KeyKind,
}

/// Encodes `(user_key, sequence, type)` into its wire form.
#[must_use]
pub fn encode(user_key: &[u8], sequence: u64, kind: KeyKind) -> Vec<u8> {
    let mut out = Vec::with_capacity(user_key.len() + TRAILER_LEN);
    out.extend_from_slice(user_key);
    let trailer = (sequence << 8) | u64::from(kind.to_tag());
    out.extend_from_slice(&trailer.to_be_bytes());
    out
}

/// Decodes an internal key, validating the input is at least
/// [`TRAILER_LEN`] bytes long.
///
/// # Errors
///
/// Returns [`ErrorKind::CorruptInternalKey`] if `input.len() < TRAILER_LEN`.
pub fn decode(input: &[u8]) -> Result<InternalKey<'_>> {
    if input.len() < TRAILER_LEN {
        return Err(ErrorKind::CorruptInternalKey(format!(
            "internal key is {} bytes, need at least {TRAILER_LEN}",
            input.len()
        )));
    }
    let split = input.len() - TRAILER_LEN;
    let (user_key, trailer) = input.split_at(split);
    let trailer = u64::from_be_bytes(trailer.try_into().expect("trailer is exactly 8 bytes"));
    let sequence = trailer >> 8;
    #[allow(clippy::cast_possible_truncation)]
    let tag = (trailer & 0xFF) as u8;
    Ok(InternalKey {
        user_key: ByteSlice::new(user_key),
        sequence,
        kind: KeyKind::from_tag(tag),
    })
}

/// Extracts just the user-key portion of an encoded internal key.
///
/// # Errors
///
/// Returns [`ErrorKind::CorruptInternalKey`] if `input.len() < TRAILER_LEN`.
pub fn user_key_of(input: &[u8]) -> Result<ByteSlice<'_>> {
    if input.len() < TRAILER_LEN {
        return Err(ErrorKind::CorruptInternalKey(format!(
            "internal key is {} bytes, need at least {TRAILER_LEN}",
            input.len()
        )));
    }
    Ok(ByteSlice::new(&input[..input.len() - TRAILER_LEN]))
}
