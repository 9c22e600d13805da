//! Layout and damage-decision benchmarks.
//!
//! Run with: `cargo bench -p core-runtime --bench layout_benchmarks`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use core_runtime::commit::CommitEngine;
use core_runtime::instance::InstanceTree;
use core_runtime::layout::damage::{DamageTracker, RenderContext};
use core_runtime::layout::{self, Rect};
use core_runtime::vnode::{ContainerKind, ContainerPayload, LeafKind, LeafPayload, TextOverflow, VNode};

const VIEWPORT: Rect = Rect { x: 0, y: 0, width: 120, height: 40 };

fn column_of_rows(rows: usize, cols: usize, label: &str) -> VNode {
    VNode::container(
        ContainerKind::Column,
        ContainerPayload::Plain,
        (0..rows)
            .map(|r| {
                VNode::container(
                    ContainerKind::Row,
                    ContainerPayload::Plain,
                    (0..cols)
                        .map(|c| {
                            VNode::leaf(
                                LeafKind::Text,
                                LeafPayload::Text {
                                    content: format!("{label}-{r}-{c}"),
                                    overflow: TextOverflow::Clip,
                                    max_width: None,
                                },
                            )
                            .with_key(format!("cell-{r}-{c}"))
                        })
                        .collect(),
                )
                .with_key(format!("row-{r}"))
            })
            .collect(),
    )
}

fn bench_compute_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_layout");

    for (rows, cols) in [(5, 5), (20, 10), (50, 20)] {
        let mut engine = CommitEngine::new();
        let mut tree = InstanceTree::new();
        let outcome = engine.commit(&mut tree, &(), 0, column_of_rows(rows, cols, "a")).unwrap();

        let elements = (rows * cols) as u64;
        group.throughput(Throughput::Elements(elements));
        group.bench_with_input(BenchmarkId::new("grid", format!("{rows}x{cols}")), &outcome.root, |b, &root| {
            b.iter(|| layout::compute_layout(black_box(&tree), root, VIEWPORT))
        });
    }
    group.finish();
}

fn bench_damage_decide_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("damage_decide");

    for (rows, cols) in [(5, 5), (20, 10), (50, 20)] {
        let mut engine = CommitEngine::new();
        let mut tree = InstanceTree::new();
        let first = engine.commit(&mut tree, &(), 0, column_of_rows(rows, cols, "a")).unwrap();
        let first_layout = layout::compute_layout(&tree, first.root, VIEWPORT);

        // One changed leaf out of rows*cols; everything else reused.
        let second = engine.commit(&mut tree, &(), 1, column_of_rows(rows, cols, "b")).unwrap();
        let second_layout = layout::compute_layout(&tree, second.root, VIEWPORT);

        let elements = (rows * cols) as u64;
        group.throughput(Throughput::Elements(elements));
        group.bench_with_input(
            BenchmarkId::new("incremental_eligible", format!("{rows}x{cols}")),
            &(),
            |b, _| {
                b.iter(|| {
                    let mut tracker = DamageTracker::new();
                    // warm up `rendered_before`/viewport/theme so the second
                    // `decide` call is incremental-eligible.
                    let _ = tracker.decide(&RenderContext {
                        tree: &tree,
                        outcome: &first,
                        layout: &first_layout,
                        prev_layout: None,
                        viewport: VIEWPORT,
                        theme_id: 0,
                        explicit_layout_requested: false,
                        transitions_active: false,
                        overlay_open: false,
                        prev_focus_public_id: None,
                        next_focus_public_id: None,
                    });
                    black_box(tracker.decide(&RenderContext {
                        tree: &tree,
                        outcome: &second,
                        layout: &second_layout,
                        prev_layout: Some(&first_layout),
                        viewport: VIEWPORT,
                        theme_id: 0,
                        explicit_layout_requested: false,
                        transitions_active: false,
                        overlay_open: false,
                        prev_focus_public_id: None,
                        next_focus_public_id: None,
                    }))
                })
            },
        );
    }
    group.finish();
}

fn bench_merge_rects(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_rects");

    for count in [5, 20, 100] {
        let rects: Vec<Rect> = (0..count)
            .map(|i| Rect { x: (i % 10) * 4, y: (i / 10) * 2, width: 4, height: 2 })
            .collect();

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("rects", count), &rects, |b, rects| {
            b.iter(|| core_runtime::layout::damage::merge_rects(black_box(rects.clone())))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compute_layout, bench_damage_decide_incremental, bench_merge_rects);
criterion_main!(benches);
