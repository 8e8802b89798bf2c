//! Criterion benchmarks for the hot paths of each primitive

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::time::Duration;
use tether::{MemoryCache, MemoryCounter, MemoryKv, MemoryLock};

fn bench_cache(c: &mut Criterion) {
    let cache = MemoryCache::new(1024);
    for i in 0..1024 {
        cache.put(&format!("k{i}"), "s", vec![0u8; 64], None);
    }

    c.bench_function("cache_fetch_hit", |b| {
        b.iter(|| black_box(cache.fetch("k512", "s")))
    });

    c.bench_function("cache_put_evicting", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i += 1;
            cache.put(&format!("fresh{i}"), "s", vec![0u8; 64], None);
        })
    });
}

fn bench_counter(c: &mut Criterion) {
    let counter = MemoryCounter::new();
    c.bench_function("counter_increment", |b| {
        b.iter(|| black_box(counter.increment("c", 1, None)))
    });
}

fn bench_kv(c: &mut Criterion) {
    let kv = MemoryKv::new();
    kv.set("k", vec![0u8; 64], None);
    c.bench_function("kv_get_hit", |b| b.iter(|| black_box(kv.get("k"))));
    c.bench_function("kv_set", |b| {
        b.iter(|| kv.set("k", vec![0u8; 64], Some(Duration::from_secs(60))))
    });
}

fn bench_lock(c: &mut Criterion) {
    let lock = MemoryLock::new();
    c.bench_function("lock_acquire_release_uncontended", |b| {
        b.iter(|| {
            let token = lock
                .acquire("r", Duration::from_secs(10), Duration::ZERO)
                .unwrap();
            lock.release("r", &token);
        })
    });
}

criterion_group!(benches, bench_cache, bench_counter, bench_kv, bench_lock);
criterion_main!(benches);
