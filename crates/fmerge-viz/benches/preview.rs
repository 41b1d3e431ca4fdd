//! Benchmark merge previews and divergence trees.
//!
//! A preview of two 50-frame stacks (detection included) is expected to
//! finish well under 50ms in release builds.

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fmerge_types::{Frame, FrameStack, StrategyKind};
use fmerge_viz::{DiffVisualizer, LayoutMode};
use serde_json::json;

// ============================================================================
// FIXTURES
// ============================================================================

fn fixture_stack(prefix: &str, size: usize) -> FrameStack {
    let at = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let frames = (0..size).map(|i| {
        let parent = if i == 0 {
            "base".to_owned()
        } else {
            format!("{prefix}-{}", (i - 1) / 3)
        };
        Frame::new(format!("{prefix}-{i}"), "task", format!("Step {i} of {prefix}"), at)
            .with_parent(parent, 1)
            .with_output("result", json!(i))
    });
    FrameStack::new(prefix, at).with_frames(frames)
}

fn base() -> Frame {
    Frame::new("base", "session", "Session", Utc.timestamp_opt(1_700_000_000, 0).unwrap())
}

// ============================================================================
// BENCHMARKS
// ============================================================================

fn bench_preview(c: &mut Criterion) {
    let viz = DiffVisualizer::new();
    let mut group = c.benchmark_group("merge_preview");

    for size in [10usize, 50] {
        let a = fixture_stack("a", size);
        let b = fixture_stack("b", size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |bench, _| {
            bench.iter(|| {
                black_box(viz.generate_merge_preview(
                    black_box(&a),
                    black_box(&b),
                    Some(StrategyKind::KeepBoth),
                ))
            });
        });
    }

    group.finish();
}

fn bench_divergence(c: &mut Criterion) {
    let a = fixture_stack("a", 50);
    let b = fixture_stack("b", 50);
    let base = base();

    for mode in [LayoutMode::Tree, LayoutMode::Timeline] {
        let viz = DiffVisualizer::new().with_layout(mode);
        c.bench_function(&format!("divergence_{}", mode.as_str()), |bench| {
            bench.iter(|| black_box(viz.visualize_divergence(&base, black_box(&a), black_box(&b))));
        });
    }
}

criterion_group!(benches, bench_preview, bench_divergence);
criterion_main!(benches);
