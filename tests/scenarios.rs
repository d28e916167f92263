//! End-to-end scenarios over the public `RangeCache` API.
//!
//! Each test mirrors one of the crate's documented design scenarios:
//! a scan that misses then hits, an overlap merge, an in-place update, a
//! continuous-layout overflow, shortest-range eviction, and an
//! empty-bridge concat.

use lorc::byte_slice::ByteSlice;
use lorc::internal_key::{self, KeyKind};
use lorc::physical_range::Layout;
use lorc::referring_range::ReferringRange;
use lorc::{LevelFilter, RangeCache};

fn bs(s: &'static str) -> ByteSlice<'static> {
    ByteSlice::from(s)
}

fn referring_over(keys: &[&'static str]) -> ReferringRange<'static> {
    let mut referring = ReferringRange::new();
    for key in keys {
        referring.emplace(bs(key), bs("v")).unwrap();
    }
    referring
}

#[test]
fn s1_simple_miss_then_hit() {
    let cache = RangeCache::new(1024 * 1024, LevelFilter::OFF, Layout::Vector, false);
    let referring = referring_over(&["k03", "k04", "k05", "k06", "k07"]);
    cache
        .put_gap(&referring, bs("k03"), bs("k07"), false, false, None)
        .unwrap();

    let segments = cache.divide(bs("k01"), bs("k10"), 0);
    assert_eq!(segments.len(), 3);
    assert!(!segments[0].in_range_cache());
    assert_eq!(segments[0].start_user_key().as_bytes(), b"k01");
    assert_eq!(segments[0].end_user_key().as_bytes(), b"k03");

    assert!(segments[1].in_range_cache());
    assert_eq!(segments[1].start_user_key().as_bytes(), b"k03");
    assert_eq!(segments[1].end_user_key().as_bytes(), b"k07");
    assert_eq!(segments[1].length(), 5);

    assert!(!segments[2].in_range_cache());
    assert_eq!(segments[2].end_user_key().as_bytes(), b"k10");
}

#[test]
fn s2_overlap_merge() {
    let cache = RangeCache::new(1024 * 1024, LevelFilter::OFF, Layout::Vector, false);
    let first = referring_over(&["k03", "k04", "k05", "k06", "k07"]);
    cache
        .put_gap(&first, bs("k03"), bs("k07"), false, false, None)
        .unwrap();

    let second = referring_over(&["k05", "k06", "k07", "k08", "k09"]);
    cache.put_overlapping(&second, bs("k05"), bs("k09")).unwrap();

    let segments = cache.divide(bs("k03"), bs("k09"), 0);
    let cached: Vec<_> = segments.iter().filter(|s| s.in_range_cache()).collect();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].start_user_key().as_bytes(), b"k03");
    assert_eq!(cached[0].end_user_key().as_bytes(), b"k09");
    assert!(cache.current_size_bytes() > 0);
}

#[test]
fn s3_update_in_place_then_scan_sees_new_value() {
    let cache = RangeCache::new(1024 * 1024, LevelFilter::OFF, Layout::Vector, false);
    let referring = referring_over(&["k03", "k04", "k05", "k06", "k07"]);
    cache
        .put_gap(&referring, bs("k03"), bs("k07"), false, false, None)
        .unwrap();

    let ik = internal_key::encode(b"k05", 42, KeyKind::RangeCacheValue);
    let result = cache.update_entry(&ik, b"NEW");
    assert!(result.is_some());

    let mut iter = cache.new_iterator();
    iter.seek(bs("k05"));
    assert!(iter.valid());
    assert_eq!(iter.user_key().as_bytes(), b"k05");
    assert_eq!(iter.value().as_bytes(), b"NEW");
}

#[test]
fn s4_continuous_layout_overflow_on_update() {
    let cache = RangeCache::new(1024 * 1024, LevelFilter::OFF, Layout::Continuous, false);
    let referring = referring_over(&["a", "b", "c"]);
    cache
        .put_gap(&referring, bs("a"), bs("c"), false, false, None)
        .unwrap();

    let before = cache.current_size_bytes();
    let big_value = vec![b'x'; 1024];
    let ik = internal_key::encode(b"b", 2, KeyKind::RangeCacheValue);
    let result = cache.update_entry(&ik, &big_value);
    assert!(result.is_some());

    let mut iter = cache.new_iterator();
    iter.seek(bs("b"));
    assert_eq!(iter.value().len(), 1024);
    assert!(cache.current_size_bytes() > before);
}

#[test]
fn s5_eviction_of_shortest_range() {
    let cache = RangeCache::new(usize::MAX, LevelFilter::OFF, Layout::Vector, false);

    cache
        .put_gap(&referring_over(&["a", "b", "c"]), bs("a"), bs("c"), false, false, None)
        .unwrap();
    cache
        .put_gap(
            &referring_over(&["e", "f", "g", "h", "i"]),
            bs("e"),
            bs("i"),
            false,
            false,
            None,
        )
        .unwrap();
    cache
        .put_gap(
            &referring_over(&["k", "l", "m", "n", "o", "p", "q"]),
            bs("k"),
            bs("q"),
            false,
            false,
            None,
        )
        .unwrap();

    let victim = cache.try_victim();
    assert_eq!(victim, Some(b"a".to_vec()));

    let segments = cache.divide(bs("a"), bs("q"), 0);
    let cached: Vec<_> = segments.iter().filter(|s| s.in_range_cache()).collect();
    assert_eq!(cached.len(), 2);
    assert_eq!(cached[0].start_user_key().as_bytes(), b"e");
    assert_eq!(cached[1].start_user_key().as_bytes(), b"k");
}

#[test]
fn pinning_a_range_defers_its_eviction_among_equal_length_ties() {
    let cache = RangeCache::new(usize::MAX, LevelFilter::OFF, Layout::Vector, false);

    cache
        .put_gap(&referring_over(&["a", "b", "c"]), bs("a"), bs("c"), false, false, None)
        .unwrap();
    cache
        .put_gap(&referring_over(&["e", "f", "g"]), bs("e"), bs("g"), false, false, None)
        .unwrap();
    cache
        .put_gap(
            &referring_over(&["k", "l", "m", "n", "o", "p", "q"]),
            bs("k"),
            bs("q"),
            false,
            false,
            None,
        )
        .unwrap();

    // Without any pin, the two length-3 ranges tie and "a" wins on start-key
    // order. Pinning it should defer its eviction in favor of "e".
    cache.pin(bs("a"));
    let victim = cache.try_victim();
    assert_eq!(victim, Some(b"e".to_vec()));
}

#[test]
fn s6_empty_bridge_coalesces_logical_view() {
    let cache = RangeCache::new(1024 * 1024, LevelFilter::OFF, Layout::Vector, false);
    cache
        .put_gap(&referring_over(&["a", "b", "c"]), bs("a"), bs("c"), false, false, None)
        .unwrap();
    cache
        .put_gap(&referring_over(&["e", "f", "g"]), bs("e"), bs("g"), false, false, None)
        .unwrap();

    let empty = ReferringRange::new();
    cache
        .put_gap(&empty, bs("c"), bs("e"), true, true, Some((bs("c"), bs("e"))))
        .unwrap();

    let segments = cache.divide(bs("a"), bs("g"), 0);
    let cached: Vec<_> = segments.iter().filter(|s| s.in_range_cache()).collect();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].start_user_key().as_bytes(), b"a");
    assert_eq!(cached[0].end_user_key().as_bytes(), b"g");
    assert_eq!(cached[0].length(), 6);
}
