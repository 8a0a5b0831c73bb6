//! Inline Cache (IC) Performance Benchmarks
//!
//! Measures property access performance across different IC states.

use criterion::{Criterion, criterion_group, criterion_main};
use kestrel_vm_core::{Function, InlineCache, JsObject, PropertyKey, Realm, Value};
use std::hint::black_box;
use std::sync::Arc;

fn object(realm: &Realm, names: &[&str]) -> Arc<JsObject> {
    let obj = realm.new_object();
    for (i, name) in names.iter().enumerate() {
        obj.put(PropertyKey::string(name), Value::int32(i as i32));
    }
    obj
}

/// Benchmark: Monomorphic property access (IC hits consistently)
/// Accesses the same property on objects with identical shapes.
fn bench_monomorphic_property_access(c: &mut Criterion) {
    let realm = Realm::new();
    let objects: Vec<_> = (0..16).map(|_| object(&realm, &["a", "b", "x"])).collect();
    let ic = InlineCache::new(PropertyKey::string("x"));

    c.bench_function("ic_monomorphic_1000_reads", |b| {
        b.iter(|| {
            for i in 0..1000 {
                black_box(ic.fetch(&objects[i % objects.len()]));
            }
        })
    });
}

/// Benchmark: Full name lookup on every access (no cache)
fn bench_uncached_property_access(c: &mut Criterion) {
    let realm = Realm::new();
    let objects: Vec<_> = (0..16).map(|_| object(&realm, &["a", "b", "x"])).collect();
    let key = PropertyKey::string("x");

    c.bench_function("uncached_1000_reads", |b| {
        b.iter(|| {
            for i in 0..1000 {
                black_box(objects[i % objects.len()].get(black_box(&key)));
            }
        })
    });
}

/// Benchmark: Two shapes alternating at one site (miss on every access)
fn bench_alternating_shapes(c: &mut Criterion) {
    let realm = Realm::new();
    let xy = object(&realm, &["x", "y"]);
    let yx = object(&realm, &["y", "x"]);
    let ic = InlineCache::new(PropertyKey::string("x"));

    c.bench_function("ic_alternating_1000_reads", |b| {
        b.iter(|| {
            for i in 0..1000 {
                let target = if i % 2 == 0 { &xy } else { &yx };
                black_box(ic.fetch(target));
            }
        })
    });
}

/// Benchmark: Indexed local access through an activation record
fn bench_activation_access(c: &mut Criterion) {
    let realm = Realm::new();
    let function = Arc::new(
        Function::builder()
            .name("f")
            .param_name("a")
            .param_name("b")
            .local_name("sum")
            .build(),
    );
    let args: Arc<[Value]> = vec![Value::int32(1), Value::int32(2)].into();

    c.bench_function("activation_1000_local_writes", |b| {
        b.iter(|| {
            let frame = realm.activate(function.clone(), args.clone());
            for i in 0..1000 {
                frame.set(2, Value::int32(i));
                black_box(frame.get(2));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_monomorphic_property_access,
    bench_uncached_property_access,
    bench_alternating_shapes,
    bench_activation_access
);
criterion_main!(benches);
