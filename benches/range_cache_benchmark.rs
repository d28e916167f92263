//! Benchmarks for `RangeCache` scan, merge and eviction paths.
//!
//! Run with: cargo bench --bench range_cache_benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lorc::physical_range::Layout;
use lorc::referring_range::ReferringRange;
use lorc::scan::scan;
use lorc::store::mock::MockStore;
use lorc::{ByteSlice, LevelFilter, RangeCache};

fn key(i: u64) -> Vec<u8> {
    format!("k{i:08}").into_bytes()
}

fn store_with_entries(count: u64) -> MockStore {
    let mut store = MockStore::new();
    for i in 0..count {
        store.seed(&key(i), b"v");
    }
    store
}

fn referring_over(count: u64, offset: u64) -> ReferringRange<'static> {
    let mut referring = ReferringRange::new();
    for i in 0..count {
        let k: &'static [u8] = Box::leak(key(offset + i).into_boxed_slice());
        referring.emplace(ByteSlice::new(k), ByteSlice::new(b"v")).unwrap();
    }
    referring
}

fn bench_scan_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("RangeCache::scan_cold");
    for size in [100u64, 1_000, 10_000].iter() {
        let store = store_with_entries(*size);
        group.bench_with_input(BenchmarkId::new("entries", size), size, |b, &size| {
            b.iter(|| {
                let cache = RangeCache::new(64 * 1024 * 1024, LevelFilter::OFF, Layout::Vector, false);
                black_box(scan(&cache, &store, &key(0), &key(size)));
            })
        });
    }
    group.finish();
}

fn bench_scan_warm(c: &mut Criterion) {
    let mut group = c.benchmark_group("RangeCache::scan_warm");
    for size in [100u64, 1_000, 10_000].iter() {
        let store = store_with_entries(*size);
        let cache = RangeCache::new(64 * 1024 * 1024, LevelFilter::OFF, Layout::Vector, false);
        scan(&cache, &store, &key(0), &key(*size));

        group.bench_with_input(BenchmarkId::new("entries", size), size, |b, &size| {
            b.iter(|| black_box(scan(&cache, &store, &key(0), &key(size))))
        });
    }
    group.finish();
}

fn bench_put_gap(c: &mut Criterion) {
    c.bench_function("RangeCache::put_gap", |b| {
        b.iter_batched(
            || (RangeCache::new(0, LevelFilter::OFF, Layout::Vector, false), referring_over(200, 0)),
            |(cache, referring)| {
                cache
                    .put_gap(
                        &referring,
                        ByteSlice::new(&key(0)),
                        ByteSlice::new(&key(199)),
                        false,
                        false,
                        None,
                    )
                    .unwrap();
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_put_overlapping(c: &mut Criterion) {
    c.bench_function("RangeCache::put_overlapping", |b| {
        b.iter_batched(
            || {
                let cache = RangeCache::new(0, LevelFilter::OFF, Layout::Vector, false);
                let base = referring_over(200, 0);
                cache
                    .put_gap(&base, ByteSlice::new(&key(0)), ByteSlice::new(&key(199)), false, false, None)
                    .unwrap();
                (cache, referring_over(200, 100))
            },
            |(cache, referring)| {
                cache
                    .put_overlapping(&referring, ByteSlice::new(&key(100)), ByteSlice::new(&key(299)))
                    .unwrap();
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_iterate_all(c: &mut Criterion) {
    let store = store_with_entries(10_000);
    let cache = RangeCache::new(64 * 1024 * 1024, LevelFilter::OFF, Layout::Vector, false);
    scan(&cache, &store, &key(0), &key(10_000));

    c.bench_function("CacheIterator::full_scan_10k", |b| {
        b.iter(|| {
            let mut iter = cache.new_iterator();
            iter.seek_to_first();
            let mut count = 0usize;
            while iter.valid() {
                black_box(iter.value());
                iter.next();
                count += 1;
            }
            count
        })
    });
}

fn bench_eviction(c: &mut Criterion) {
    c.bench_function("RangeCache::try_victim_under_pressure", |b| {
        b.iter_batched(
            || {
                let cache = RangeCache::new(8 * 1024, LevelFilter::OFF, Layout::Vector, false);
                for segment in 0..50u64 {
                    let referring = referring_over(20, segment * 20);
                    let _ = cache.put_gap(
                        &referring,
                        ByteSlice::new(&key(segment * 20)),
                        ByteSlice::new(&key(segment * 20 + 19)),
                        false,
                        false,
                        None,
                    );
                }
                cache
            },
            |cache| black_box(cache.try_victim()),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_scan_cold,
    bench_scan_warm,
    bench_put_gap,
    bench_put_overlapping,
    bench_iterate_all,
    bench_eviction,
);
criterion_main!(benches);
