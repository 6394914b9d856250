//! The customization seam between the table core and a storage layout.
//!
//! The core only manages topology (which slot sits in which chain, which
//! slots are free). Keys and values live in columns owned by a `Hooks`
//! implementation and are reached exclusively through the methods below,
//! addressed by slot index.
//!
//! Contract for implementors:
//! - Hooks are called while the table is mid-operation. They must not
//!   reach back into the table; the table is exclusively borrowed for the
//!   duration of every mutating call, so safe code cannot do so anyway.
//! - `Lookup::hash` and `Hooks::hash_slot` must agree: a stored key hashes
//!   to the same value as any query that compares equal to it.
//! - `install_key` must return a key equal to (and hashing like) its input;
//!   the slot is placed by the input's hash.

use crate::error::Result;

/// Hashing and equality for a query type `Q`.
///
/// Split from [`Hooks`] so that lookups can use a borrowed form of the key
/// (e.g. `&str` against stored `String`s).
pub trait Lookup<Q: ?Sized> {
    /// 32-bit hash of `key`; the low bits select the bucket.
    fn hash(&self, key: &Q) -> u32;

    /// Whether the key stored at `slot` equals `key`. `hash` is `self.hash(key)`,
    /// passed so hash-caching layouts can reject mismatches without comparing.
    fn equals_key(&self, slot: usize, key: &Q, hash: u32) -> bool;
}

/// Payload storage and per-slot callbacks for one concrete layout.
pub trait Hooks {
    type Key;
    type Value;
    type Allocator: Allocator<Self>;

    /// Hash of the key stored at an occupied `slot`. Used when rehashing.
    fn hash_slot(&self, slot: usize) -> u32;

    fn key(&self, slot: usize) -> Option<&Self::Key>;

    /// Store `key` at a freshly linked `slot`; `hash` is the key's hash.
    fn set_key(&mut self, slot: usize, key: Self::Key, hash: u32);

    /// Release the key of a slot that just left its chain.
    fn clear_key(&mut self, slot: usize) -> Option<Self::Key>;

    fn value(&self, slot: usize) -> Option<&Self::Value>;

    fn value_mut(&mut self, slot: usize) -> Option<&mut Self::Value>;

    /// Overwrite the value at `slot`, returning the previous one.
    fn set_value(&mut self, slot: usize, value: Self::Value) -> Option<Self::Value>;

    /// Release the value of `slot`.
    fn clear_value(&mut self, slot: usize) -> Option<Self::Value>;

    /// Release every key and value at once; capacity stays reserved.
    fn clear(&mut self);

    /// Transform a key about to be stored by `install`.
    fn install_key(&mut self, key: Self::Key) -> Self::Key {
        key
    }

    /// Initial value for a key stored by `install`. `None` leaves it unset.
    fn install_value(&mut self, _key: &Self::Key) -> Option<Self::Value> {
        None
    }

    /// Called by `install` when the key was already present.
    fn reuse_entry(&mut self, _slot: usize) {}

    /// Buffers for `capacity` slots, filled by the next resize.
    fn new_allocator(&self, capacity: usize) -> Result<Self::Allocator>;
}

/// Two-phase payload migration used by a resize.
///
/// The core calls `copy` once per occupied slot, in the new slot order, and
/// then `apply` exactly once. Until `apply`, the live columns are only read
/// (or moved out of) by `copy`; nothing else observes the new buffers.
pub trait Allocator<H: ?Sized> {
    /// Move the payload of `source`'s `old_slot` into this buffer at `new_slot`.
    fn copy(&mut self, source: &mut H, old_slot: usize, new_slot: usize);

    /// Swap the filled buffers into `target`.
    fn apply(self, target: &mut H);
}
