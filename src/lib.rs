//! # LORC — Logically Ordered Range Cache
//!
//! An in-memory cache of contiguous, sorted key-value segments that
//! accelerates range scans against a sorted key-value store. The cache
//! never talks to storage itself — callers splice
//! [`RangeCache::new_iterator`] with their own backing-store iterator (or
//! use [`scan::scan`] against anything implementing
//! [`store::BackingStore`]) and feed freshly scanned data back in with
//! [`RangeCache::put_overlapping`]/[`RangeCache::put_gap`].
//!
//! ## Quick start
//!
//! ```
//! use lorc::{LevelFilter, RangeCache, Layout};
//! use lorc::store::mock::MockStore;
//! use lorc::scan::scan;
//!
//! let mut store = MockStore::new();
//! store.seed(b"a", b"1");
//! store.seed(b"b", b"2");
//!
//! let cache = RangeCache::new(64 * 1024 * 1024, LevelFilter::OFF, Layout::Vector, false);
//! let first = scan(&cache, &store, b"a", b"c");
//! assert_eq!(first.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod arena;
pub mod byte_slice;
pub mod cache;
pub mod config;
pub mod error;
pub mod internal_key;
pub mod iter;
pub mod logical_range;
pub mod metrics;
pub mod ordered_set;
pub mod physical_range;
pub mod referring_range;
pub mod release_pool;
pub mod scan;
pub mod store;

pub use byte_slice::ByteSlice;
pub use cache::RangeCache;
pub use config::RangeCacheConfig;
pub use error::{ErrorKind, Result, UpdateResult};
pub use physical_range::Layout;
pub use tracing::level_filters::LevelFilter;

/// Builds a [`RangeCache`] from a loaded [`RangeCacheConfig`].
#[must_use]
pub fn new_cache(config: &RangeCacheConfig) -> RangeCache {
    RangeCache::new(
        config.capacity_bytes,
        config.level_filter(),
        config.layout.into(),
        config.background_release,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan;
    use crate::store::mock::MockStore;

    #[test]
    fn new_cache_from_config_is_usable() {
        let config = RangeCacheConfig::default();
        let cache = new_cache(&config);

        let mut store = MockStore::new();
        store.seed(b"k1", b"v1");

        let entries = scan(&cache, &store, b"k0", b"k2");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, b"v1");
    }
}
