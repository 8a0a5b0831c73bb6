//! Property Access Integration Tests
//!
//! Exercises shapes, inline caches and dictionary fallback together through
//! a [`Realm`]:
//! - Shape sharing between objects built the same way
//! - Cache hits, misses and rebinding
//! - Concurrent transitions racing on one table, and readers racing a writer

use kestrel_vm_core::{
    Function, InlineCache, JsObject, LayoutConfig, PropertyKey, Realm, Value,
};
use std::sync::{Arc, Barrier};
use std::thread;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn point(realm: &Realm, x: i32, y: i32) -> Arc<JsObject> {
    let obj = realm.new_object();
    obj.put(PropertyKey::string("x"), Value::int32(x));
    obj.put(PropertyKey::string("y"), Value::int32(y));
    obj
}

// ============================================================================
// Shape Sharing
// ============================================================================

#[test]
fn test_warmed_cache_serves_second_object() {
    init_tracing();
    let realm = Realm::new();
    let p1 = point(&realm, 1, 2);
    let p2 = point(&realm, 4, 5);
    assert!(Arc::ptr_eq(&p1.shape().unwrap(), &p2.shape().unwrap()));

    let ic = InlineCache::new(PropertyKey::string("x"));
    assert_eq!(ic.fetch(&p1), Some(Value::int32(1)));
    assert_eq!(ic.slow_path_count(), 1);

    assert_eq!(ic.fetch(&p2), Some(Value::int32(4)));
    assert_eq!(ic.slow_path_count(), 1);
    assert_eq!(ic.hit_count(), 1);
}

#[test]
fn test_repeated_reads_take_one_slow_path() {
    let realm = Realm::new();
    let p = point(&realm, 3, 9);
    let ic = InlineCache::new(PropertyKey::string("y"));

    for _ in 0..1000 {
        assert_eq!(ic.fetch(&p), Some(Value::int32(9)));
    }
    assert_eq!(ic.slow_path_count(), 1);
    assert_eq!(ic.hit_count(), 999);
}

#[test]
fn test_cache_sees_writes_through_other_paths() {
    let realm = Realm::new();
    let p = point(&realm, 1, 2);
    let ic = InlineCache::new(PropertyKey::string("x"));
    ic.fetch(&p);

    p.put(PropertyKey::string("x"), Value::int32(11));
    assert_eq!(ic.fetch(&p), Some(Value::int32(11)));
    assert_eq!(ic.slow_path_count(), 1);
}

// ============================================================================
// Shape Changes
// ============================================================================

#[test]
fn test_added_property_invalidates_cache() {
    let realm = Realm::new();
    let p = point(&realm, 1, 2);
    let ic = InlineCache::new(PropertyKey::string("x"));
    ic.fetch(&p);

    p.put(PropertyKey::string("z"), Value::int32(3));
    assert_eq!(ic.fetch(&p), Some(Value::int32(1)));
    assert_eq!(ic.slow_path_count(), 2);
}

#[test]
fn test_different_order_gets_correct_slot() {
    let realm = Realm::new();
    let xy = point(&realm, 1, 2);
    let yx = realm.new_object();
    yx.put(PropertyKey::string("y"), Value::int32(20));
    yx.put(PropertyKey::string("x"), Value::int32(10));
    assert!(!Arc::ptr_eq(&xy.shape().unwrap(), &yx.shape().unwrap()));

    let ic = InlineCache::new(PropertyKey::string("x"));
    for _ in 0..3 {
        assert_eq!(ic.fetch(&xy), Some(Value::int32(1)));
        assert_eq!(ic.fetch(&yx), Some(Value::int32(10)));
    }
    assert_eq!(ic.slow_path_count(), 6);
}

#[test]
fn test_deleted_property_misses_then_stays_correct() {
    let realm = Realm::new();
    let p = point(&realm, 1, 2);
    let ic = InlineCache::new(PropertyKey::string("y"));
    ic.fetch(&p);

    assert!(p.delete(&PropertyKey::string("x")));
    assert!(p.is_dictionary_mode());
    assert_eq!(ic.fetch(&p), Some(Value::int32(2)));
    assert_eq!(ic.fetch(&p), Some(Value::int32(2)));
    assert!(!ic.is_bound());
}

#[test]
fn test_missing_property_reads_none() {
    let realm = Realm::new();
    let p = point(&realm, 1, 2);
    let ic = InlineCache::new(PropertyKey::string("w"));
    assert_eq!(ic.fetch(&p), None);
    assert!(!ic.is_bound());
}

#[test]
fn test_store_site_builds_shared_shape() {
    let realm = Realm::new();
    let set_x = InlineCache::new(PropertyKey::string("x"));
    let set_y = InlineCache::new(PropertyKey::string("y"));

    let objects: Vec<_> = (0..4)
        .map(|i| {
            let obj = realm.new_object();
            set_x.store(&obj, Value::int32(i));
            set_y.store(&obj, Value::int32(i * 2));
            obj
        })
        .collect();

    for obj in &objects[1..] {
        assert!(Arc::ptr_eq(&obj.shape().unwrap(), &objects[0].shape().unwrap()));
    }
    assert_eq!(objects[3].get(&PropertyKey::string("y")), Some(Value::int32(6)));
}

// ============================================================================
// Feedback Vectors
// ============================================================================

#[test]
fn test_feedback_vector_per_site() {
    let realm = Realm::new();
    let function = Function::builder()
        .name("sum")
        .property_site("x")
        .property_site("y")
        .build();
    let feedback = realm.feedback_vector(&function);
    assert_eq!(feedback.len(), 2);

    let points: Vec<_> = (0..10).map(|i| point(&realm, i, i + 1)).collect();
    let mut total = 0;
    for p in &points {
        for site in 0..feedback.len() {
            if let Some(Value::Int32(n)) = feedback.get(site).and_then(|ic| ic.fetch(p)) {
                total += n;
            }
        }
    }
    assert_eq!(total, (0..10).map(|i| 2 * i + 1).sum::<i32>());
    assert_eq!(feedback.slow_path_count(), 2);
}

// ============================================================================
// Class Limits
// ============================================================================

#[test]
fn test_table_limit_falls_back_to_dictionary() {
    let realm = Realm::with_config(LayoutConfig {
        max_shape_properties: 2,
        ..LayoutConfig::default()
    });
    let obj = realm.new_object();
    for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
        obj.put(PropertyKey::string(name), Value::int32(i as i32));
    }
    assert!(obj.is_dictionary_mode());
    assert_eq!(obj.get(&PropertyKey::string("c")), Some(Value::int32(2)));
    assert_eq!(obj.property_count(), 4);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_transitions_share_shape() {
    init_tracing();
    let realm = Arc::new(Realm::new());
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let realm = realm.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let obj = realm.new_object();
                for name in ["a", "b", "c", "d"] {
                    obj.put(PropertyKey::string(name), Value::int32(i as i32));
                }
                obj.shape().unwrap()
            })
        })
        .collect();

    let shapes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for shape in &shapes[1..] {
        assert!(Arc::ptr_eq(shape, &shapes[0]));
    }
    assert_eq!(realm.shapes().shape_count(), 5);
}

#[test]
fn test_concurrent_cache_readers() {
    let realm = Realm::new();
    let p = point(&realm, 5, 6);
    let ic = InlineCache::new(PropertyKey::string("y"));

    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..250 {
                    assert_eq!(ic.fetch(&p), Some(Value::int32(6)));
                }
            });
        }
    });
    assert_eq!(ic.hit_count() + ic.slow_path_count(), 1000);
    assert!(ic.is_bound());
}

#[test]
fn test_readers_never_see_shape_ahead_of_slots() {
    let realm = Realm::new();
    let obj = realm.new_object();
    let names: Vec<String> = (0..64).map(|i| format!("p{i}")).collect();

    thread::scope(|s| {
        s.spawn(|| {
            for (i, name) in names.iter().enumerate() {
                obj.put(PropertyKey::string(name), Value::int32(i as i32));
            }
        });
        for reader in 0..4 {
            let (obj, names) = (&obj, &names);
            s.spawn(move || {
                let sites: Vec<_> = names
                    .iter()
                    .skip(reader)
                    .step_by(4)
                    .map(|name| InlineCache::new(PropertyKey::string(name)))
                    .collect();
                for _ in 0..200 {
                    for ic in &sites {
                        let expected = ic.key().as_str().and_then(|n| n[1..].parse::<i32>().ok());
                        let expected = expected.map(Value::int32);
                        let fetched = ic.fetch(obj);
                        assert!(fetched.is_none() || fetched == expected);
                        let read = obj.get(ic.key());
                        assert!(read.is_none() || read == expected);
                    }
                }
            });
        }
    });

    assert_eq!(obj.property_count(), 64);
    assert_eq!(obj.get(&PropertyKey::string("p63")), Some(Value::int32(63)));
}
