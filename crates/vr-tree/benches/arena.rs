//! Benchmarks for generational arena insert/lookup/remove.
//!
//! Run with: cargo bench -p vr-tree

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vr_tree::Arena;

struct BenchTag;

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("sequential", size), &size, |b, &size| {
            b.iter(|| {
                let mut arena: Arena<u32, BenchTag> = Arena::with_capacity(size);
                for i in 0..size as u32 {
                    black_box(arena.insert(i));
                }
                arena
            });
        });
    }

    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let mut group = c.benchmark_group("get");

    for size in [100, 1_000, 10_000] {
        let mut arena: Arena<u32, BenchTag> = Arena::with_capacity(size);
        let handles: Vec<_> = (0..size as u32).map(|i| arena.insert(i)).collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("live_handles", size), &(&arena, &handles), |b, (arena, handles)| {
            b.iter(|| {
                for h in handles.iter() {
                    black_box(arena.get(*h));
                }
            });
        });
    }

    group.finish();
}

fn bench_remove_and_reinsert(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove_and_reinsert");

    for size in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("churn", size), &size, |b, &size| {
            b.iter(|| {
                let mut arena: Arena<u32, BenchTag> = Arena::with_capacity(size);
                let handles: Vec<_> = (0..size as u32).map(|i| arena.insert(i)).collect();
                for h in &handles {
                    black_box(arena.remove(*h));
                }
                for i in 0..size as u32 {
                    black_box(arena.insert(i));
                }
                arena
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_get, bench_remove_and_reinsert);
criterion_main!(benches);
