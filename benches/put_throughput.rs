//! Greedy put throughput benchmarks
//!
//! Measures how fast a builder materializes paths with varying:
//! - Numbers of effects (10, 100, 1000)
//! - Tree models (XML document, raw JSON value)
//! - Path shapes (plain, attribute predicate, positional)
//!
//! Run benchmarks: `cargo bench --bench put_throughput`

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use pathwright::{PathBuilder, XmlDocument};
use serde_json::json;
use std::hint::black_box;

/// One `put_value` per record, each adding a sibling through an attribute predicate.
fn record_builder(count: usize) -> PathBuilder {
    let mut builder = PathBuilder::new();
    for i in 0..count {
        builder = builder
            .put_value(&format!("/records/record[@id='{}']/name", i), format!("Record {}", i))
            .expect("benchmark paths are valid");
    }
    builder
}

fn bench_tree_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("tree_model");

    for count in [10, 100, 1000] {
        let builder = record_builder(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("xml", count), &builder, |b, builder| {
            b.iter(|| black_box(builder.build(XmlDocument::new()).expect("build succeeds")));
        });

        group.bench_with_input(BenchmarkId::new("json", count), &builder, |b, builder| {
            b.iter(|| black_box(builder.build(json!({})).expect("build succeeds")));
        });
    }

    group.finish();
}

fn bench_path_shapes(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_shape");

    let shapes = [
        ("plain", "/a/b/c/d/e"),
        ("predicate", "/a/b[@k='v']/c[d='x']/e"),
        ("positional", "/a/b[100]"),
    ];
    for (name, path) in shapes {
        let builder = PathBuilder::new().put(path).expect("benchmark paths are valid");
        group.bench_function(name, |b| {
            b.iter(|| black_box(builder.build(XmlDocument::new()).expect("build succeeds")));
        });
    }

    group.finish();
}

fn bench_idempotent_replay(c: &mut Criterion) {
    let builder = record_builder(100);
    let populated = builder.build(XmlDocument::new()).expect("build succeeds");

    c.bench_function("replay_on_populated_tree", |b| {
        b.iter(|| black_box(builder.build(populated.clone()).expect("build succeeds")));
    });
}

criterion_group!(
    benches,
    bench_tree_models,
    bench_path_shapes,
    bench_idempotent_replay
);
criterion_main!(benches);
