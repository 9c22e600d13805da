//! Commit-engine benchmarks: reconciliation cost across tree shapes.
//!
//! Run with: `cargo bench -p core-runtime --bench commit_benchmarks`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use core_runtime::commit::CommitEngine;
use core_runtime::instance::InstanceTree;
use core_runtime::vnode::{ContainerKind, ContainerPayload, LeafKind, LeafPayload, TextOverflow, VNode};

fn row_of_text(count: usize, label: &str) -> VNode {
    VNode::container(
        ContainerKind::Row,
        ContainerPayload::Plain,
        (0..count)
            .map(|i| {
                VNode::leaf(
                    LeafKind::Text,
                    LeafPayload::Text {
                        content: format!("{label}-{i}"),
                        overflow: TextOverflow::Clip,
                        max_width: None,
                    },
                )
                .with_key(format!("row-{i}"))
            })
            .collect(),
    )
}

fn bench_first_commit(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_first_mount");

    for count in [10, 50, 200, 1000] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("mount", count), &count, |b, &count| {
            b.iter(|| {
                let mut engine = CommitEngine::new();
                let mut tree = InstanceTree::new();
                let root = row_of_text(count, "a");
                engine.commit(&mut tree, &(), 0, black_box(root)).unwrap()
            })
        });
    }
    group.finish();
}

fn bench_unchanged_commit_reuses(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_unchanged_reuse");

    for count in [10, 50, 200, 1000] {
        let mut engine = CommitEngine::new();
        let mut tree = InstanceTree::new();
        engine.commit(&mut tree, &(), 0, row_of_text(count, "a")).unwrap();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("reuse", count), &count, |b, &count| {
            b.iter(|| engine.commit(&mut tree, &(), 0, black_box(row_of_text(count, "a"))).unwrap())
        });
    }
    group.finish();
}

fn bench_keyed_reorder(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_keyed_reorder");

    for count in [10, 50, 200] {
        let mut engine = CommitEngine::new();
        let mut tree = InstanceTree::new();
        engine.commit(&mut tree, &(), 0, row_of_text(count, "a")).unwrap();

        let reversed = VNode::container(
            ContainerKind::Row,
            ContainerPayload::Plain,
            (0..count)
                .rev()
                .map(|i| {
                    VNode::leaf(
                        LeafKind::Text,
                        LeafPayload::Text {
                            content: format!("a-{i}"),
                            overflow: TextOverflow::Clip,
                            max_width: None,
                        },
                    )
                    .with_key(format!("row-{i}"))
                })
                .collect(),
        );

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("reorder", count), &count, |b, _| {
            b.iter(|| engine.commit(&mut tree, &(), 0, black_box(reversed.clone())).unwrap())
        });
    }
    group.finish();
}

fn bench_single_leaf_change(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_single_leaf_change");

    for count in [10, 50, 200, 1000] {
        let mut engine = CommitEngine::new();
        let mut tree = InstanceTree::new();
        engine.commit(&mut tree, &(), 0, row_of_text(count, "a")).unwrap();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("one_changed", count), &count, |b, &count| {
            b.iter(|| engine.commit(&mut tree, &(), 0, black_box(row_of_text(count, "b"))).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_first_commit,
    bench_unchanged_commit_reuses,
    bench_keyed_reorder,
    bench_single_leaf_change
);
criterion_main!(benches);
