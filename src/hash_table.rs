//! HashTable: the topology core, generic over a `Hooks` storage layout.

use crate::error::{Error, Result};
use crate::hooks::{Allocator, Hooks, Lookup};
use crate::iter::{Cursor, Iter, Slots};
use crate::topology::{Topology, MAX_CAPACITY, NIL};
use core::fmt;
use log::{debug, trace};

/// Outcome of placing a key: the slot it already had, or a freshly linked one.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Placement {
    Found(usize),
    Inserted(usize),
}

impl Placement {
    pub fn slot(self) -> usize {
        match self {
            Placement::Found(slot) | Placement::Inserted(slot) => slot,
        }
    }

    pub fn is_inserted(self) -> bool {
        matches!(self, Placement::Inserted(_))
    }
}

/// Transposed, index-based hash table.
///
/// The table owns the bucket and chain arrays plus two counters: the number
/// of occupied slots and the head of the free list. Payload columns belong
/// to `H`.
#[derive(Clone)]
pub struct HashTable<H> {
    pub(crate) topology: Topology,
    empty: u32,
    count: usize,
    hooks: H,
}

impl<H> Default for HashTable<H>
where
    H: Hooks + Default,
{
    fn default() -> Self {
        Self::new(H::default())
    }
}

impl<H: Hooks> HashTable<H> {
    /// Empty table without capacity; allocates nothing.
    pub fn new(hooks: H) -> Self {
        Self {
            topology: Topology::empty(),
            empty: 0,
            count: 0,
            hooks,
        }
    }

    pub fn with_capacity(hooks: H, capacity: usize) -> Result<Self> {
        let mut table = Self::new(hooks);
        table.allocate(capacity)?;
        Ok(table)
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Number of occupied slots.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of reserved slots.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.topology.capacity()
    }

    /// Length of the bucket array; always a power of two.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.topology.bucket_len()
    }

    /// Resize to exactly `capacity` slots, renumbering occupied slots densely
    /// from 0 in bucket order.
    ///
    /// Fails with [`Error::InvalidCapacity`] below [`count`](Self::count) and
    /// with an out-of-memory kind error past [`MAX_CAPACITY`] or when the
    /// buffers cannot be reserved. The table is unchanged on failure.
    pub fn allocate(&mut self, capacity: usize) -> Result<()> {
        if capacity < self.count {
            return Err(Error::InvalidCapacity {
                requested: capacity,
                count: self.count,
            });
        }
        if capacity == self.capacity() {
            return Ok(());
        }
        let mut topology = Topology::with_capacity(capacity)?;
        let mut allocator = self.hooks.new_allocator(capacity)?;

        // Walk old chains in bucket order; each occupied slot lands at the
        // next dense index, at the head of its new bucket.
        let mut moved: u32 = 0;
        for bucket in 0..self.topology.bucket_len() {
            let mut old = self.topology.head(bucket);
            while old != NIL {
                let hash = self.hooks.hash_slot(old as usize);
                let target = topology.bucket_of(hash);
                topology.push_head(target, moved);
                allocator.copy(&mut self.hooks, old as usize, moved as usize);
                moved += 1;
                old = self.topology.next(old);
            }
        }
        allocator.apply(&mut self.hooks);

        debug!(
            "resized table: {} -> {} slots, {} buckets, {} entries migrated",
            self.capacity(),
            capacity,
            topology.bucket_len(),
            moved
        );
        self.topology = topology;
        self.empty = moved;
        Ok(())
    }

    /// Release all capacity not holding an entry.
    pub fn compact(&mut self) -> Result<()> {
        self.allocate(self.count)
    }

    /// Empty every bucket and return all slots to the free list. Capacity is
    /// kept.
    pub fn clear_all(&mut self) {
        if self.count == 0 {
            return;
        }
        trace!("clearing {} entries, keeping {} slots", self.count, self.capacity());
        self.topology.reset();
        self.empty = 0;
        self.hooks.clear();
        self.count = 0;
    }

    pub fn key(&self, slot: usize) -> Option<&H::Key> {
        self.hooks.key(slot)
    }

    pub fn value(&self, slot: usize) -> Option<&H::Value> {
        self.hooks.value(slot)
    }

    pub fn value_mut(&mut self, slot: usize) -> Option<&mut H::Value> {
        self.hooks.value_mut(slot)
    }

    /// Overwrite the value stored at an occupied `slot`.
    pub fn set_value(&mut self, slot: usize, value: H::Value) -> Option<H::Value> {
        self.hooks.set_value(slot, value)
    }

    /// Slot holding `key`, if present.
    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        H: Lookup<Q>,
        Q: ?Sized,
    {
        let hash = self.hooks.hash(key);
        self.find_hashed(key, hash)
    }

    /// As [`find`](Self::find), with a hash the caller already computed.
    pub fn find_hashed<Q>(&self, key: &Q, hash: u32) -> Option<usize>
    where
        H: Lookup<Q>,
        Q: ?Sized,
    {
        let mut slot = self.topology.head(self.topology.bucket_of(hash));
        while slot != NIL {
            if self.hooks.equals_key(slot as usize, key, hash) {
                return Some(slot as usize);
            }
            slot = self.topology.next(slot);
        }
        None
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        H: Lookup<Q>,
        Q: ?Sized,
    {
        self.find(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&H::Value>
    where
        H: Lookup<Q>,
        Q: ?Sized,
    {
        self.find(key).and_then(|slot| self.hooks.value(slot))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut H::Value>
    where
        H: Lookup<Q>,
        Q: ?Sized,
    {
        let slot = self.find(key)?;
        self.hooks.value_mut(slot)
    }

    /// Remove `key`, returning the slot it occupied. The slot's key and value
    /// are released through the clear hooks.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<usize>
    where
        H: Lookup<Q>,
        Q: ?Sized,
    {
        let slot = self.unlink(key)?;
        self.hooks.clear_key(slot);
        self.hooks.clear_value(slot);
        Some(slot)
    }

    /// Remove `key`, returning the stored key and value.
    pub fn take<Q>(&mut self, key: &Q) -> Option<(H::Key, Option<H::Value>)>
    where
        H: Lookup<Q>,
        Q: ?Sized,
    {
        let slot = self.unlink(key)?;
        let value = self.hooks.clear_value(slot);
        self.hooks.clear_key(slot).map(|key| (key, value))
    }

    /// Remove `slot` from the chain of `bucket`. Returns false when `slot` is
    /// not a member of that chain.
    pub fn remove_at(&mut self, bucket: usize, slot: usize) -> bool {
        if slot >= self.capacity() {
            return false;
        }
        let target = slot as u32;
        match self.topology.unlink_where(bucket, |s| s == target) {
            Some(_) => {
                self.release(target);
                self.hooks.clear_key(slot);
                self.hooks.clear_value(slot);
                true
            }
            None => false,
        }
    }

    /// Whether `key` is stored with a value equal to `value`.
    pub fn contains_entry<Q>(&self, key: &Q, value: &H::Value) -> bool
    where
        H: Lookup<Q>,
        Q: ?Sized,
        H::Value: PartialEq,
    {
        self.get(key).is_some_and(|stored| stored == value)
    }

    /// Remove `key` only if it is stored with a value equal to `value`.
    pub fn remove_entry<Q>(&mut self, key: &Q, value: &H::Value) -> bool
    where
        H: Lookup<Q>,
        Q: ?Sized,
        H::Value: PartialEq,
    {
        let hash = self.hooks.hash(key);
        let bucket = self.topology.bucket_of(hash);
        let hooks = &self.hooks;
        let hit = self.topology.unlink_where(bucket, |s| {
            let s = s as usize;
            hooks.equals_key(s, key, hash) && hooks.value(s) == Some(value)
        });
        match hit {
            Some(slot) => {
                self.release(slot);
                self.hooks.clear_key(slot as usize);
                self.hooks.clear_value(slot as usize);
                true
            }
            None => false,
        }
    }

    /// Whether any entry holds a value equal to `value`. Linear scan.
    pub fn contains_value(&self, value: &H::Value) -> bool
    where
        H::Value: PartialEq,
    {
        self.position_of_value(value).is_some()
    }

    /// Remove the first entry holding `value`, scanning buckets from the
    /// highest index down.
    pub fn remove_value(&mut self, value: &H::Value) -> bool
    where
        H::Value: PartialEq,
    {
        match self.position_of_value(value) {
            Some((bucket, slot)) => self.remove_at(bucket, slot),
            None => false,
        }
    }

    fn position_of_value(&self, value: &H::Value) -> Option<(usize, usize)>
    where
        H::Value: PartialEq,
    {
        for bucket in (0..self.topology.bucket_len()).rev() {
            let mut slot = self.topology.head(bucket);
            while slot != NIL {
                if self.hooks.value(slot as usize) == Some(value) {
                    return Some((bucket, slot as usize));
                }
                slot = self.topology.next(slot);
            }
        }
        None
    }

    /// Occupied slots in bucket order, most recent first within a bucket.
    pub fn slots(&self) -> Slots<'_, H> {
        Slots::new(self)
    }

    /// Entries in [`slots`](Self::slots) order.
    pub fn iter(&self) -> Iter<'_, H> {
        Iter::new(self)
    }

    /// Iterator over slots that can remove the slot it last returned.
    pub fn cursor(&mut self) -> Cursor<'_, H> {
        Cursor::new(self)
    }

    fn unlink<Q>(&mut self, key: &Q) -> Option<usize>
    where
        H: Lookup<Q>,
        Q: ?Sized,
    {
        let hash = self.hooks.hash(key);
        let bucket = self.topology.bucket_of(hash);
        let hooks = &self.hooks;
        let slot = self
            .topology
            .unlink_where(bucket, |s| hooks.equals_key(s as usize, key, hash))?;
        self.release(slot);
        Some(slot as usize)
    }

    /// Push an unlinked slot onto the free list.
    fn release(&mut self, slot: u32) {
        self.topology.set_next(slot, self.empty);
        self.empty = slot;
        self.count -= 1;
    }

    /// Make sure one more entry fits, growing by half again if it does not.
    fn reserve_one(&mut self) -> Result<()> {
        let count = self.count + 1;
        if count > MAX_CAPACITY {
            return Err(Error::CapacityOverflow { requested: count });
        }
        if count <= self.capacity() {
            return Ok(());
        }
        let target = count.saturating_add(count / 2).min(MAX_CAPACITY);
        trace!("growing table from {} to {} slots", self.capacity(), target);
        self.allocate(target)
    }

    /// Pop the free-list head and link it in front of `hash`'s bucket.
    /// Callers run `reserve_one` first.
    fn link(&mut self, hash: u32) -> usize {
        let slot = self.empty;
        self.empty = self.topology.next(slot);
        let bucket = self.topology.bucket_of(hash);
        self.topology.push_head(bucket, slot);
        self.count += 1;
        slot as usize
    }
}

impl<H> HashTable<H>
where
    H: Hooks + Lookup<<H as Hooks>::Key>,
{
    /// Slot of `key`, linking a new one at the head of its bucket on a miss.
    /// A new slot's key is written through `set_key`; its value stays unset.
    pub fn insert_or_find(&mut self, key: H::Key) -> Result<usize> {
        self.place(key).map(Placement::slot)
    }

    /// As [`insert_or_find`](Self::insert_or_find), reporting whether the
    /// key was inserted.
    pub fn place(&mut self, key: H::Key) -> Result<Placement> {
        let hash = self.hooks.hash(&key);
        if let Some(slot) = self.find_hashed(&key, hash) {
            return Ok(Placement::Found(slot));
        }
        self.reserve_one()?;
        let slot = self.link(hash);
        self.hooks.set_key(slot, key, hash);
        Ok(Placement::Inserted(slot))
    }

    /// Store `value` under `key`, returning the value it replaced.
    pub fn put(&mut self, key: H::Key, value: H::Value) -> Result<Option<H::Value>> {
        match self.place(key)? {
            Placement::Found(slot) => Ok(self.hooks.set_value(slot, value)),
            Placement::Inserted(slot) => {
                self.hooks.set_value(slot, value);
                Ok(None)
            }
        }
    }

    /// Insert `key` without touching any value. Returns whether it was new.
    pub fn put_key(&mut self, key: H::Key) -> Result<bool> {
        self.place(key).map(Placement::is_inserted)
    }

    /// Find-or-create driven by the hooks: `reuse_entry` on a hit,
    /// `install_key` then `install_value` on a miss. The derived key is
    /// looked up again, so an entry already stored under it is reused.
    pub fn install(&mut self, key: H::Key) -> Result<usize> {
        let hash = self.hooks.hash(&key);
        if let Some(slot) = self.find_hashed(&key, hash) {
            self.hooks.reuse_entry(slot);
            return Ok(slot);
        }
        let key = self.hooks.install_key(key);
        let hash = self.hooks.hash(&key);
        if let Some(slot) = self.find_hashed(&key, hash) {
            self.hooks.reuse_entry(slot);
            return Ok(slot);
        }
        self.reserve_one()?;
        let value = self.hooks.install_value(&key);
        Ok(self.link_entry(hash, key, value))
    }

    /// As [`install`](Self::install) with the key and value derived by
    /// closures. A hit returns the existing slot untouched.
    pub fn install_with<F, G>(&mut self, key: H::Key, install_key: F, install_value: G) -> Result<usize>
    where
        F: FnOnce(H::Key) -> H::Key,
        G: FnOnce(&H::Key) -> Option<H::Value>,
    {
        let hash = self.hooks.hash(&key);
        if let Some(slot) = self.find_hashed(&key, hash) {
            return Ok(slot);
        }
        let key = install_key(key);
        let hash = self.hooks.hash(&key);
        if let Some(slot) = self.find_hashed(&key, hash) {
            return Ok(slot);
        }
        self.reserve_one()?;
        let value = install_value(&key);
        Ok(self.link_entry(hash, key, value))
    }

    /// Upsert-or-delete in one pass.
    ///
    /// On a miss, `update_value(install_key(key), None)` decides: `None`
    /// creates nothing, `Some(v)` is stored under the derived key, replacing
    /// the value of an entry already stored there. On a hit the stored
    /// value is moved into `update_value(stored_key, Some(old))`: `None`
    /// removes the entry, `Some(v)` replaces the value. Returns the value now
    /// stored.
    pub fn update<F, G>(
        &mut self,
        key: H::Key,
        install_key: F,
        update_value: G,
    ) -> Result<Option<&H::Value>>
    where
        F: FnOnce(H::Key) -> H::Key,
        G: FnOnce(&H::Key, Option<H::Value>) -> Option<H::Value>,
    {
        let hash = self.hooks.hash(&key);
        let Some(slot) = self.find_hashed(&key, hash) else {
            let key = install_key(key);
            let Some(value) = update_value(&key, None) else {
                return Ok(None);
            };
            let hash = self.hooks.hash(&key);
            if let Some(slot) = self.find_hashed(&key, hash) {
                self.hooks.set_value(slot, value);
                return Ok(self.hooks.value(slot));
            }
            self.reserve_one()?;
            let slot = self.link_entry(hash, key, Some(value));
            return Ok(self.hooks.value(slot));
        };

        let current = self.hooks.clear_value(slot);
        let updated = match self.hooks.key(slot) {
            Some(stored) => update_value(stored, current),
            None => None,
        };
        match updated {
            Some(value) => {
                self.hooks.set_value(slot, value);
                Ok(self.hooks.value(slot))
            }
            None => {
                let bucket = self.topology.bucket_of(hash);
                self.remove_at(bucket, slot);
                Ok(None)
            }
        }
    }

    fn link_entry(&mut self, hash: u32, key: H::Key, value: Option<H::Value>) -> usize {
        let slot = self.link(hash);
        self.hooks.set_key(slot, key, hash);
        if let Some(value) = value {
            self.hooks.set_value(slot, value);
        }
        slot
    }
}

impl<H> fmt::Debug for HashTable<H>
where
    H: Hooks,
    H::Key: fmt::Debug,
    H::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
impl<H: Hooks> HashTable<H> {
    /// Panic unless chains and the free list partition the slots and every
    /// occupied slot sits in the bucket its hash selects.
    pub(crate) fn check_invariants(&self) {
        let capacity = self.capacity();
        assert!(self.count <= capacity, "count exceeds capacity");
        assert!(self.bucket_count().is_power_of_two());
        let mut seen = vec![false; capacity];

        let mut occupied = 0;
        for bucket in 0..self.bucket_count() {
            let mut slot = self.topology.head(bucket);
            while slot != NIL {
                let s = slot as usize;
                assert!(!seen[s], "slot {s} linked twice");
                seen[s] = true;
                assert_eq!(
                    self.topology.bucket_of(self.hooks.hash_slot(s)),
                    bucket,
                    "slot {s} in wrong bucket"
                );
                occupied += 1;
                slot = self.topology.next(slot);
            }
        }
        assert_eq!(occupied, self.count, "chains do not hold count slots");

        let mut slot = self.empty;
        for _ in 0..capacity - self.count {
            let s = slot as usize;
            assert!(s < capacity, "free list ends early");
            assert!(!seen[s], "free slot {s} also reachable elsewhere");
            seen[s] = true;
            slot = self.topology.next(slot);
        }
        assert_eq!(slot as usize, capacity, "free list does not end at capacity");
        assert!(seen.iter().all(|&s| s), "unreachable slot");
    }
}
