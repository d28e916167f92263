//! Physical range: an owned, sorted, contiguous cached segment.
//!
//! Two layouts implement the same [`PhysicalRange`] contract:
//! [`vec_range::VecPhysicalRange`] (parallel owned-string containers,
//! supports in-place update and random insertion) and
//! [`continuous_range::ContinuousPhysicalRange`] (monolithic byte buffers
//! with an offset/length table and an overflow side-table, update-only).

pub mod continuous_range;
pub mod vec_range;

use crate::byte_slice::ByteSlice;
use crate::error::{Result, UpdateResult};
use crate::referring_range::ReferringRange;

/// Which concrete layout a cache instance uses for newly built ranges.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Layout {
    /// Parallel `Vec<Vec<u8>>` storage; supports in-place random insertion.
    Vector,
    /// Monolithic byte buffers with an offset table; update-only.
    Continuous,
}

/// The common contract both physical-range layouts implement.
///
/// All methods panic (via `assert!`/indexing) on misuse — `length() == 0`,
/// or an out-of-bounds `index` — mirroring the original's `assert`-guarded
/// accessors, which are never reached on a cache-internal call path because
/// every caller first checks `length()`.
pub trait PhysicalRange {
    /// First (smallest) user key covered by this range.
    fn start_user_key(&self) -> ByteSlice<'_>;
    /// Last (largest) user key covered by this range.
    fn end_user_key(&self) -> ByteSlice<'_>;
    /// Number of entries in the range.
    fn length(&self) -> usize;
    /// Total bytes occupied by encoded keys and values.
    fn byte_size(&self) -> usize;
    /// User key at `index`.
    fn user_key_at(&self, index: usize) -> ByteSlice<'_>;
    /// Encoded internal key at `index`.
    fn internal_key_at(&self, index: usize) -> ByteSlice<'_>;
    /// Value at `index`.
    fn value_at(&self, index: usize) -> ByteSlice<'_>;
    /// Lower-bound binary search by user key; `None` if every entry's user
    /// key is smaller than `key`.
    fn find(&self, key: ByteSlice<'_>) -> Option<usize>;
    /// Applies a live write: updates in place if `user_key` is present,
    /// otherwise attempts an insertion (layout-dependent).
    fn update(&mut self, internal_key: &[u8], value: &[u8]) -> Result<UpdateResult>;
    /// Pre-allocates storage for `len` additional entries.
    fn reserve(&mut self, len: usize);
}

/// Materializes an owned range from the given slice of a scan's
/// [`ReferringRange`], choosing the concrete layout per `layout`.
///
/// # Errors
///
/// Returns [`crate::error::ErrorKind::Empty`] if `start..=end`
/// (inclusivity per the flags) yields no entries.
pub fn build_from_referring(
    referring: &ReferringRange<'_>,
    sequence: u64,
    start: ByteSlice<'_>,
    end: ByteSlice<'_>,
    left_inclusive: bool,
    right_inclusive: bool,
    layout: Layout,
) -> Result<Box<dyn PhysicalRange + Send>> {
    let entries = referring.dump_subrange(start, end, left_inclusive, right_inclusive)?;
    Ok(match layout {
        Layout::Vector => Box::new(vec_range::VecPhysicalRange::from_entries(&entries, sequence)),
        Layout::Continuous => Box::new(continuous_range::ContinuousPhysicalRange::from_entries(
            &entries, sequence,
        )),
    })
}
