//! Error types for the range cache.
//!
//! Mirrors the teacher's `thiserror`-based convention of a single flat enum
//! with a stable, loggable error code per variant.

use thiserror::Error;

/// Result type alias for range-cache operations.
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Errors produced by the range cache.
///
/// Every variant except [`ErrorKind::InvariantViolation`] is recovered
/// locally by the caller (a boolean, an `Option`, or an enum return code);
/// `InvariantViolation` indicates a logic error that risks silent
/// corruption and is not meant to be recovered from.
#[derive(Error, Debug)]
pub enum ErrorKind {
    /// Internal-key decode failed because the input was shorter than the
    /// 8-byte `(sequence, type)` trailer (LORC-001).
    #[error("[LORC-001] corrupt internal key: {0}")]
    CorruptInternalKey(String),

    /// A caller emplaced a non-ascending key into a referring range
    /// (LORC-002).
    #[error("[LORC-002] order violation: key {new:?} is not strictly greater than previous key {previous:?}")]
    OrderViolation {
        /// The offending key.
        new: Vec<u8>,
        /// The last key already present.
        previous: Vec<u8>,
    },

    /// `update` was called with a key outside the physical range's span
    /// (LORC-003).
    #[error("[LORC-003] key out of range")]
    OutOfRange,

    /// The continuous layout refused a random insertion; the caller must
    /// fall back to whole-range re-materialization (LORC-004).
    #[error("[LORC-004] continuous layout cannot insert a new key in place")]
    UnableToInsert,

    /// A factory call yielded a zero-length range (LORC-005).
    #[error("[LORC-005] resulting range is empty")]
    Empty,

    /// Internal logic error: non-monotonic logical ranges, double
    /// insertion into the ordered set, or any other condition that should
    /// be structurally impossible (LORC-006).
    #[error("[LORC-006] invariant violation: {0}")]
    InvariantViolation(String),
}

impl ErrorKind {
    /// Returns the stable error code (e.g. `"LORC-001"`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::CorruptInternalKey(_) => "LORC-001",
            Self::OrderViolation { .. } => "LORC-002",
            Self::OutOfRange => "LORC-003",
            Self::UnableToInsert => "LORC-004",
            Self::Empty => "LORC-005",
            Self::InvariantViolation(_) => "LORC-006",
        }
    }

    /// Returns true if this error is recoverable by the caller.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvariantViolation(_))
    }
}

/// The return code of [`crate::physical_range::PhysicalRange::update`].
///
/// Kept as a standalone enum (rather than folded into `ErrorKind`) because
/// `OutOfRange`/`UnableToInsert` are expected, frequent outcomes on the hot
/// write path, not exceptional ones — the scan orchestrator branches on this
/// value every time it routes a live write into the cache.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum UpdateResult {
    /// An existing entry's value (and internal key trailer) was replaced.
    Updated,
    /// A new entry was inserted in sorted order (vector layout only).
    Inserted,
    /// The layout cannot insert a new key in place (continuous layout).
    UnableToInsert,
    /// The key's user-key portion falls outside the range's span.
    OutOfRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(ErrorKind::OutOfRange.code(), "LORC-003");
        assert_eq!(ErrorKind::Empty.code(), "LORC-005");
    }

    #[test]
    fn only_invariant_violation_is_unrecoverable() {
        assert!(ErrorKind::OutOfRange.is_recoverable());
        assert!(ErrorKind::UnableToInsert.is_recoverable());
        assert!(!ErrorKind::InvariantViolation("x".into()).is_recoverable());
    }
}
