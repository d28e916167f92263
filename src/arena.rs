//! Monotonic allocation arena backing short-lived iterator state.
//!
//! [`crate::iter::CacheIterator`] needs to hand back `(user_key, value)`
//! pairs that outlive a single lock acquisition without copying into a
//! fresh heap allocation per step. `Arena` wraps `bumpalo::Bump` to give it
//! a bump-allocated scratch space that is reset between scans instead of
//! freed entry-by-entry.

use bumpalo::Bump;

/// A reusable bump allocator for copying borrowed bytes into buffers whose
/// lifetime the caller controls explicitly.
#[derive(Default)]
pub struct Arena {
    bump: Bump,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Copies `bytes` into the arena and returns a slice borrowed from it.
    #[must_use]
    pub fn alloc_slice(&self, bytes: &[u8]) -> &[u8] {
        self.bump.alloc_slice_copy(bytes)
    }

    /// Releases all allocations made so far, reusing the underlying chunks
    /// for the next scan instead of returning memory to the allocator.
    pub fn reset(&mut self) {
        self.bump.reset();
    }
}
