// Persisted-state tests (feature `serde`).
//
// The stream is a sequence of (key, value) pairs whose length is the entry
// count. Reading re-inserts every pair, so only the content round-trips,
// never the order.
#![cfg(feature = "serde")]

use transposed_hash::{HashedMap, IntMap, LongSet, ObjectMap};

// Test: serialize, clear, deserialize.
// Verifies: both entries come back with their values and count is 2,
// independent of the order they were written in.
#[test]
fn serialize_clear_deserialize() {
    let mut m: IntMap<String> = IntMap::default();
    m.put(1, "x".to_string()).unwrap();
    m.put(2, "y".to_string()).unwrap();
    let stream = serde_json::to_string(&m).unwrap();
    m.clear_all();
    assert!(m.is_empty());

    let back: IntMap<String> = serde_json::from_str(&stream).unwrap();
    assert_eq!(back.get(&1).map(String::as_str), Some("x"));
    assert_eq!(back.get(&2).map(String::as_str), Some("y"));
    assert_eq!(back.count(), 2);
}

// Test: on-disk order does not matter.
// Verifies: a hand-written stream in reverse order reads back the same content.
#[test]
fn order_independent_read() {
    let back: ObjectMap<String, u32> = serde_json::from_str(r#"[["b",2],["a",1]]"#).unwrap();
    assert_eq!(back.get("a"), Some(&1));
    assert_eq!(back.get("b"), Some(&2));
}

// Test: a duplicated key in the stream keeps the last value.
#[test]
fn duplicate_keys_last_wins() {
    let back: ObjectMap<String, u32> = serde_json::from_str(r#"[["a",1],["a",2]]"#).unwrap();
    assert_eq!(back.count(), 1);
    assert_eq!(back.get("a"), Some(&2));
}

// Test: round trip across layouts and a larger table.
// Verifies: a hash-caching map and a primitive set keep their content.
#[test]
fn large_round_trips() {
    let mut m: HashedMap<String, Vec<u16>> = HashedMap::default();
    for k in 0..500u16 {
        m.put(format!("key-{k}"), vec![k; (k % 4) as usize]).unwrap();
    }
    let back: HashedMap<String, Vec<u16>> = serde_json::from_str(&serde_json::to_string(&m).unwrap()).unwrap();
    assert_eq!(back.count(), 500);
    for (k, v) in m.iter() {
        assert_eq!(back.get(k.as_str()), v);
    }

    let mut s: LongSet = LongSet::default();
    for k in [i64::MIN, -1, 0, 1, i64::MAX] {
        s.put_key(k).unwrap();
    }
    let back: LongSet = serde_json::from_value(serde_json::to_value(&s).unwrap()).unwrap();
    assert_eq!(back.count(), 5);
    assert!(back.contains_key(&i64::MIN) && back.contains_key(&i64::MAX));
}
