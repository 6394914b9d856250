//! Column-backed hook strategies and the containers built from them.
//!
//! `Columns` keeps one key column and one value column and recomputes a
//! key's hash whenever it needs one. `HashedColumns` adds a `u32` hash per
//! slot: rehashing reads the stored hash and lookups skip the key
//! comparison on a hash mismatch.

use crate::columns::{Column, IntColumn, LongColumn, NoColumn, ObjectColumn, PrimitiveColumn};
use crate::error::{Error, Result};
use crate::hash_table::HashTable;
use crate::hooks::{Allocator, Hooks, Lookup};
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::ops::AddAssign;
use hashbrown::hash_map::DefaultHashBuilder;

/// Fold a 64-bit hash into the 32 bits the table addresses buckets with.
#[inline]
fn fold(hash: u64) -> u32 {
    (hash ^ (hash >> 32)) as u32
}

/// Key and value columns plus the hasher.
#[derive(Clone, Debug, Default)]
pub struct Columns<KC, VC, S = DefaultHashBuilder> {
    keys: KC,
    values: VC,
    hasher: S,
}

impl<KC: Column, VC: Column, S> Columns<KC, VC, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            keys: KC::default(),
            values: VC::default(),
            hasher,
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }
}

impl<KC, VC, S, Q> Lookup<Q> for Columns<KC, VC, S>
where
    KC: Column,
    KC::Item: Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &Q) -> u32 {
        fold(self.hasher.hash_one(key))
    }

    #[inline]
    fn equals_key(&self, slot: usize, key: &Q, _hash: u32) -> bool {
        self.keys.get(slot).is_some_and(|stored| stored.borrow() == key)
    }
}

impl<KC, VC, S> Hooks for Columns<KC, VC, S>
where
    KC: Column,
    KC::Item: Hash + Eq,
    VC: Column,
    S: BuildHasher,
{
    type Key = KC::Item;
    type Value = VC::Item;
    type Allocator = ColumnsAllocator<KC, VC>;

    fn hash_slot(&self, slot: usize) -> u32 {
        self.keys
            .get(slot)
            .map_or(0, |key| fold(self.hasher.hash_one(key)))
    }

    fn key(&self, slot: usize) -> Option<&KC::Item> {
        self.keys.get(slot)
    }

    fn set_key(&mut self, slot: usize, key: KC::Item, _hash: u32) {
        self.keys.set(slot, key);
    }

    fn clear_key(&mut self, slot: usize) -> Option<KC::Item> {
        self.keys.take(slot)
    }

    fn value(&self, slot: usize) -> Option<&VC::Item> {
        self.values.get(slot)
    }

    fn value_mut(&mut self, slot: usize) -> Option<&mut VC::Item> {
        self.values.get_mut(slot)
    }

    fn set_value(&mut self, slot: usize, value: VC::Item) -> Option<VC::Item> {
        self.values.set(slot, value)
    }

    fn clear_value(&mut self, slot: usize) -> Option<VC::Item> {
        self.values.take(slot)
    }

    fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    fn new_allocator(&self, capacity: usize) -> Result<Self::Allocator> {
        Ok(ColumnsAllocator {
            keys: KC::allocate(capacity)?,
            values: VC::allocate(capacity)?,
        })
    }
}

/// Replacement columns filled during a resize of a [`Columns`] table.
#[derive(Debug)]
pub struct ColumnsAllocator<KC, VC> {
    keys: KC,
    values: VC,
}

impl<KC: Column, VC: Column, S> Allocator<Columns<KC, VC, S>> for ColumnsAllocator<KC, VC> {
    fn copy(&mut self, source: &mut Columns<KC, VC, S>, old_slot: usize, new_slot: usize) {
        self.keys.move_from(&mut source.keys, old_slot, new_slot);
        self.values.move_from(&mut source.values, old_slot, new_slot);
    }

    fn apply(self, target: &mut Columns<KC, VC, S>) {
        target.keys = self.keys;
        target.values = self.values;
    }
}

/// [`Columns`] with a cached hash per slot.
#[derive(Clone, Debug, Default)]
pub struct HashedColumns<KC, VC, S = DefaultHashBuilder> {
    keys: KC,
    values: VC,
    hashes: Vec<u32>,
    hasher: S,
}

impl<KC: Column, VC: Column, S> HashedColumns<KC, VC, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            keys: KC::default(),
            values: VC::default(),
            hashes: Vec::new(),
            hasher,
        }
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }
}

impl<KC, VC, S, Q> Lookup<Q> for HashedColumns<KC, VC, S>
where
    KC: Column,
    KC::Item: Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    #[inline]
    fn hash(&self, key: &Q) -> u32 {
        fold(self.hasher.hash_one(key))
    }

    #[inline]
    fn equals_key(&self, slot: usize, key: &Q, hash: u32) -> bool {
        self.hashes.get(slot) == Some(&hash)
            && self.keys.get(slot).is_some_and(|stored| stored.borrow() == key)
    }
}

impl<KC, VC, S> Hooks for HashedColumns<KC, VC, S>
where
    KC: Column,
    KC::Item: Hash + Eq,
    VC: Column,
    S: BuildHasher,
{
    type Key = KC::Item;
    type Value = VC::Item;
    type Allocator = HashedColumnsAllocator<KC, VC>;

    #[inline]
    fn hash_slot(&self, slot: usize) -> u32 {
        self.hashes.get(slot).copied().unwrap_or(0)
    }

    fn key(&self, slot: usize) -> Option<&KC::Item> {
        self.keys.get(slot)
    }

    fn set_key(&mut self, slot: usize, key: KC::Item, hash: u32) {
        if let Some(stored) = self.hashes.get_mut(slot) {
            *stored = hash;
        }
        self.keys.set(slot, key);
    }

    fn clear_key(&mut self, slot: usize) -> Option<KC::Item> {
        self.keys.take(slot)
    }

    fn value(&self, slot: usize) -> Option<&VC::Item> {
        self.values.get(slot)
    }

    fn value_mut(&mut self, slot: usize) -> Option<&mut VC::Item> {
        self.values.get_mut(slot)
    }

    fn set_value(&mut self, slot: usize, value: VC::Item) -> Option<VC::Item> {
        self.values.set(slot, value)
    }

    fn clear_value(&mut self, slot: usize) -> Option<VC::Item> {
        self.values.take(slot)
    }

    fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    fn new_allocator(&self, capacity: usize) -> Result<Self::Allocator> {
        let mut hashes = Vec::new();
        hashes
            .try_reserve_exact(capacity)
            .map_err(|_| Error::OutOfMemory { requested: capacity })?;
        hashes.resize(capacity, 0);
        Ok(HashedColumnsAllocator {
            keys: KC::allocate(capacity)?,
            values: VC::allocate(capacity)?,
            hashes,
        })
    }
}

/// Replacement columns filled during a resize of a [`HashedColumns`] table.
#[derive(Debug)]
pub struct HashedColumnsAllocator<KC, VC> {
    keys: KC,
    values: VC,
    hashes: Vec<u32>,
}

impl<KC: Column, VC: Column, S> Allocator<HashedColumns<KC, VC, S>> for HashedColumnsAllocator<KC, VC> {
    fn copy(&mut self, source: &mut HashedColumns<KC, VC, S>, old_slot: usize, new_slot: usize) {
        self.keys.move_from(&mut source.keys, old_slot, new_slot);
        self.values.move_from(&mut source.values, old_slot, new_slot);
        if let (Some(&hash), Some(dest)) = (source.hashes.get(old_slot), self.hashes.get_mut(new_slot)) {
            *dest = hash;
        }
    }

    fn apply(self, target: &mut HashedColumns<KC, VC, S>) {
        target.keys = self.keys;
        target.values = self.values;
        target.hashes = self.hashes;
    }
}

impl<KC, VC, S> HashTable<Columns<KC, VC, S>>
where
    KC: Column,
    KC::Item: Hash + Eq,
    VC: Column,
    S: BuildHasher,
{
    /// Empty table hashing with `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Self::new(Columns::with_hasher(hasher))
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self> {
        Self::with_capacity(Columns::with_hasher(hasher), capacity)
    }
}

impl<KC, VC, S> HashTable<HashedColumns<KC, VC, S>>
where
    KC: Column,
    KC::Item: Hash + Eq,
    VC: Column,
    S: BuildHasher,
{
    /// Empty table hashing with `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        Self::new(HashedColumns::with_hasher(hasher))
    }

    pub fn with_capacity_and_hasher(capacity: usize, hasher: S) -> Result<Self> {
        Self::with_capacity(HashedColumns::with_hasher(hasher), capacity)
    }
}

impl<KC, T, S> HashTable<Columns<KC, PrimitiveColumn<T>, S>>
where
    KC: Column,
    KC::Item: Hash + Eq,
    T: Copy + Default + AddAssign,
    S: BuildHasher,
{
    /// Add `delta` to the value under `key`; a missing key starts from zero.
    /// Returns the new value.
    pub fn add(&mut self, key: KC::Item, delta: T) -> Result<T> {
        let slot = self.insert_or_find(key)?;
        match self.value_mut(slot) {
            Some(value) => {
                *value += delta;
                Ok(*value)
            }
            None => {
                self.set_value(slot, delta);
                Ok(delta)
            }
        }
    }
}

/// Map with owned keys and values.
pub type ObjectMap<K, V, S = DefaultHashBuilder> = HashTable<Columns<ObjectColumn<K>, ObjectColumn<V>, S>>;

/// Set of owned keys.
pub type ObjectSet<K, S = DefaultHashBuilder> = HashTable<Columns<ObjectColumn<K>, NoColumn, S>>;

/// [`ObjectMap`] caching each key's hash.
pub type HashedMap<K, V, S = DefaultHashBuilder> = HashTable<HashedColumns<ObjectColumn<K>, ObjectColumn<V>, S>>;

/// [`ObjectSet`] caching each key's hash.
pub type HashedSet<K, S = DefaultHashBuilder> = HashTable<HashedColumns<ObjectColumn<K>, NoColumn, S>>;

/// Owned keys mapped to raw `i32` values.
pub type ObjectIntMap<K, S = DefaultHashBuilder> = HashTable<Columns<ObjectColumn<K>, IntColumn, S>>;

/// Owned keys mapped to raw `i64` values.
pub type ObjectLongMap<K, S = DefaultHashBuilder> = HashTable<Columns<ObjectColumn<K>, LongColumn, S>>;

pub type IntSet<S = DefaultHashBuilder> = HashTable<Columns<IntColumn, NoColumn, S>>;

pub type LongSet<S = DefaultHashBuilder> = HashTable<Columns<LongColumn, NoColumn, S>>;

/// Raw `i32` keys mapped to owned values.
pub type IntMap<V, S = DefaultHashBuilder> = HashTable<Columns<IntColumn, ObjectColumn<V>, S>>;

/// Raw `i64` keys mapped to owned values.
pub type LongMap<V, S = DefaultHashBuilder> = HashTable<Columns<LongColumn, ObjectColumn<V>, S>>;
