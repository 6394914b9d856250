#![cfg(test)]

// Property tests for HashTable kept inside the crate so they can check the
// structural invariants of the topology after every step.

use crate::hash_table::HashTable;
use crate::hooks::{Hooks, Lookup};
use crate::strategy::{HashedMap, ObjectMap};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hasher;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier keys,
// pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Put(usize, i32),
    PutKey(usize),
    Remove(usize),
    Take(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    Update(usize, Option<i32>),
    CursorRemove(usize),
    Allocate(usize),
    Compact,
    Clear,
    Iterate,
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=24).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            (idx.clone(), any::<i32>()).prop_map(|(i, v)| OpI::Put(i, v)),
            idx.clone().prop_map(OpI::PutKey),
            (idx.clone(), any::<bool>()).prop_map(|(i, take)| if take { OpI::Take(i) } else { OpI::Remove(i) }),
            idx.clone().prop_map(OpI::Find),
            prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            (idx.clone(), any::<i32>()).prop_map(|(i, d)| OpI::Mutate(i, d)),
            (idx.clone(), proptest::option::of(-3i32..3)).prop_map(|(i, d)| OpI::Update(i, d)),
            (1usize..4).prop_map(OpI::CursorRemove),
            (0usize..20).prop_map(OpI::Allocate),
            prop_oneof![Just(OpI::Compact), Just(OpI::Clear), Just(OpI::Iterate)],
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
    })
}

// State-machine equivalence against std::collections::HashMap. A model value
// of `None` stands for a key stored without a value.
fn run<H>(sut: &mut HashTable<H>, pool: &[String], ops: Vec<OpI>) -> Result<(), TestCaseError>
where
    H: Hooks<Key = Key, Value = i32> + Lookup<Key> + Lookup<str>,
{
    let mut model: HashMap<Key, Option<i32>> = HashMap::new();
    for op in ops {
        match op {
            OpI::Put(i, v) => {
                let k = key_from(pool, i);
                let prev = sut.put(k.clone(), v).expect("growth");
                prop_assert_eq!(prev, model.insert(k, Some(v)).flatten());
            }
            OpI::PutKey(i) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                prop_assert_eq!(sut.put_key(k.clone()).expect("growth"), !already);
                model.entry(k).or_insert(None);
            }
            OpI::Remove(i) => {
                let k = key_from(pool, i);
                prop_assert_eq!(sut.remove(&k).is_some(), model.remove(&k).is_some());
                prop_assert!(sut.find(&k).is_none());
            }
            OpI::Take(i) => {
                let k = key_from(pool, i);
                let expected = model.remove(&k).map(|v| (k.clone(), v));
                prop_assert_eq!(sut.take(&k), expected);
            }
            OpI::Find(i) => {
                let k = key_from(pool, i);
                match (sut.find(&k), model.get(&k)) {
                    (Some(slot), Some(v)) => {
                        prop_assert_eq!(sut.key(slot), Some(&k));
                        prop_assert_eq!(sut.value(slot).copied(), *v);
                    }
                    (None, None) => {}
                    (s, m) => prop_assert!(false, "find {:?} vs model {:?}", s, m),
                }
            }
            OpI::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains_key(s.as_str()), has_model);
            }
            OpI::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.saturating_add(d);
                }
                if let Some(Some(v)) = model.get_mut(&k) {
                    *v = v.saturating_add(d);
                }
            }
            OpI::Update(i, delta) => {
                let k = key_from(pool, i);
                let old = model.get(&k).copied().flatten();
                let new = delta.map(|d| old.unwrap_or(0).saturating_add(d));
                let got = sut
                    .update(k.clone(), |k| k, |_, old| delta.map(|d| old.unwrap_or(0).saturating_add(d)))
                    .expect("growth")
                    .copied();
                prop_assert_eq!(got, new);
                match new {
                    Some(v) => {
                        model.insert(k, Some(v));
                    }
                    None => {
                        model.remove(&k);
                    }
                }
            }
            OpI::CursorRemove(every) => {
                let mut removed = Vec::new();
                let mut cursor = sut.cursor();
                let mut n = 0;
                while let Some(slot) = cursor.next() {
                    if n % every == 0 {
                        removed.push(cursor.table().key(slot).cloned().expect("occupied"));
                        cursor.remove().expect("remove after next");
                    }
                    n += 1;
                }
                prop_assert_eq!(n, model.len());
                for k in removed {
                    prop_assert!(model.remove(&k).is_some());
                }
            }
            OpI::Allocate(extra) => {
                let target = sut.count() + extra;
                sut.allocate(target).expect("allocate above count");
                prop_assert_eq!(sut.capacity(), target);
            }
            OpI::Compact => {
                sut.compact().expect("compact");
                prop_assert_eq!(sut.capacity(), model.len());
            }
            OpI::Clear => {
                let capacity = sut.capacity();
                sut.clear_all();
                model.clear();
                prop_assert_eq!(sut.capacity(), capacity);
            }
            OpI::Iterate => {
                let s: BTreeMap<Key, Option<i32>> = sut.iter().map(|(k, v)| (k.clone(), v.copied())).collect();
                let m: BTreeMap<Key, Option<i32>> = model.iter().map(|(k, v)| (k.clone(), *v)).collect();
                prop_assert_eq!(s, m);
            }
        }

        sut.check_invariants();
        prop_assert_eq!(sut.count(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        prop_assert!(sut.bucket_count() >= 1);
    }
    Ok(())
}

// Collision variant: every key hashes to bucket 0.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl std::hash::BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

// Property: after any sequence of puts, removals, cursor removals, resizes
// and clears, the table agrees with the model and the chains plus the free
// list partition the slots.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: ObjectMap<Key, i32> = ObjectMap::default();
        run(&mut sut, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_hashed((pool, ops) in arb_scenario()) {
        let mut sut: HashedMap<Key, i32> = HashedMap::default();
        run(&mut sut, &pool, ops)?;
    }

    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        let mut sut: ObjectMap<Key, i32, ConstBuildHasher> = ObjectMap::with_hasher(ConstBuildHasher);
        run(&mut sut, &pool, ops)?;
    }
}
