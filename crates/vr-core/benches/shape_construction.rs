//! Benchmarks for the two allocation-heavy construction paths a real
//! embedding host drives on every new template/instance pair: building a
//! `TView`'s shape table, and allocating the `LView`/`LContainer` pair a
//! factory hands back for it.
//!
//! Run with: cargo bench -p vr-core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use vr_core::shape::tnode::{TNode, TNodeType};
use vr_core::shape::tview::{TData, TView};
use vr_core::{ViewEngine, ViewFactory};

fn bench_tview_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("tview_construction");

    for decls in [10, 100, 1_000] {
        group.throughput(Throughput::Elements(decls as u64));
        group.bench_with_input(BenchmarkId::new("new", decls), &decls, |b, &decls| {
            b.iter(|| black_box(TView::new(decls, decls / 2)));
        });
    }

    group.finish();
}

fn bench_tview_push_slot(c: &mut Criterion) {
    let mut group = c.benchmark_group("tview_push_slot");

    for extra_slots in [10, 100, 1_000] {
        group.throughput(Throughput::Elements(extra_slots as u64));
        group.bench_with_input(BenchmarkId::new("expando_growth", extra_slots), &extra_slots, |b, &extra_slots| {
            b.iter(|| {
                let mut tview = TView::new(1, 0);
                for i in 0..extra_slots {
                    let node = TNode::new((i as usize).into(), TNodeType::Element, None, Vec::new());
                    black_box(tview.push_slot(TData::Node(node), Default::default()));
                }
                tview
            });
        });
    }

    group.finish();
}

fn bench_root_view_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("root_view_allocation");

    for count in [10, 100, 1_000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("create_root_view", count), &count, |b, &count| {
            b.iter(|| {
                let mut engine = ViewEngine::new();
                let mut factory = ViewFactory::new();
                for _ in 0..count {
                    black_box(factory.create_root_view(&mut engine, 20, 10));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tview_construction, bench_tview_push_slot, bench_root_view_allocation);
criterion_main!(benches);
