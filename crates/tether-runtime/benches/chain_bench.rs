//! Benchmarks for chain resolution, memoized reads, and the observer sweep.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use tether_runtime::{ComputedProperty, ObjectId, Runtime, Value};

fn build_chain(rt: &mut Runtime, depth: usize) -> (ObjectId, String) {
    let mut objects = Vec::with_capacity(depth + 1);
    for _ in 0..=depth {
        objects.push(rt.create_object());
    }
    for i in 0..depth {
        let next = objects[i + 1];
        rt.set(objects[i], "next", Value::from(next)).unwrap();
    }
    rt.set(objects[depth], "leaf", Value::from(0)).unwrap();

    let mut path = "next.".repeat(depth);
    path.push_str("leaf");
    (objects[0], path)
}

fn bench_chain_resolution(c: &mut Criterion) {
    let mut rt = Runtime::new();
    let (root, path) = build_chain(&mut rt, 8);

    c.bench_function("chain_tag depth-8", |b| {
        b.iter(|| {
            let tag = rt.chain_tag_str(black_box(root), black_box(&path)).unwrap();
            black_box(tag.value())
        });
    });
}

fn bench_validate(c: &mut Criterion) {
    let mut rt = Runtime::new();
    let (root, path) = build_chain(&mut rt, 8);
    let tag = rt.chain_tag_str(root, &path).unwrap();
    let baseline = tag.value();

    c.bench_function("validate depth-8", |b| {
        b.iter(|| black_box(tag.validate(black_box(baseline))));
    });
}

fn bench_memoized_get(c: &mut Criterion) {
    let mut rt = Runtime::new();
    let obj = rt.create_object_with([("base", Value::from(21))]);
    rt.define_computed(
        obj,
        "doubled",
        ComputedProperty::new(|rt, this| match rt.get(this, "base") {
            Value::Int(n) => Value::Int(n * 2),
            _ => Value::Null,
        }),
    )
    .unwrap();
    let _ = rt.get(obj, "doubled");

    c.bench_function("computed_get cached", |b| {
        b.iter(|| black_box(rt.get(black_box(obj), "doubled")));
    });
}

fn bench_sweep(c: &mut Criterion) {
    let mut rt = Runtime::new();
    let mut targets = Vec::new();
    for _ in 0..100 {
        let obj = rt.create_object_with([("x", Value::from(0))]);
        rt.add_observer(obj, "x", |_, _, _| {}).unwrap();
        targets.push(obj);
    }

    c.bench_function("sweep 100 observers, 1 stale", |b| {
        let mut flip = 0i64;
        b.iter(|| {
            flip += 1;
            rt.set(targets[0], "x", Value::from(flip)).unwrap();
            rt.sweep();
        });
    });
}

criterion_group!(
    benches,
    bench_chain_resolution,
    bench_validate,
    bench_memoized_get,
    bench_sweep
);
criterion_main!(benches);
