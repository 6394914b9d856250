//! transposed-hash: a transposed, index-based hash table core. Entries are
//! addressed by slot index and their keys and values live in parallel
//! columns rather than in per-entry nodes.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep per-entry overhead at two `u32` links plus payload, while
//!   letting each container choose how its payload is stored.
//! - Layers:
//!   - Topology: the bucket array (chain heads) and the chain array. For
//!     an occupied slot the chain array holds the next slot of the same
//!     chain; for a free slot it holds the next free slot.
//!   - HashTable<H>: find/insert/remove/resize over the topology, plus
//!     the occupied-slot count and the free-list head. Keys and values are
//!     reached only through the `Hooks` value `H`.
//!   - Strategies: `Columns` and the hash-caching `HashedColumns` implement
//!     `Hooks` over slot-indexed columns (`ObjectColumn`, `IntColumn`,
//!     `LongColumn`, `NoColumn`). The container aliases (`ObjectMap`,
//!     `IntSet`, ...) pick one combination each.
//!
//! Constraints
//! - Single-threaded; no locking, no atomics.
//! - Slot indices are `u32`; at most `MAX_CAPACITY` slots.
//! - The bucket array length is a power of two covering the capacity,
//!   capped at `MAX_BUCKETS`. A table without capacity shares one static
//!   single-bucket array and allocates nothing.
//! - New entries are linked at the head of their chain, so iteration within
//!   a bucket sees the most recent entry first.
//!
//! Resizing
//! - `allocate(n)` builds a fresh topology and asks the hooks for an
//!   `Allocator` holding new columns. The old chains are walked in bucket
//!   order; each occupied slot is renumbered to the next dense index and
//!   its payload is moved with `Allocator::copy`. `Allocator::apply` swaps
//!   the new columns in once every entry has moved, so no partially filled
//!   column is ever visible.
//! - A failed allocation leaves the table untouched.
//! - Automatic growth targets `count + count / 2` slots.
//!
//! Reentrancy policy
//! - Hooks and closures handed to `install_with`/`update` run while the
//!   table is exclusively borrowed, so they cannot reach back into it.
//! - `Cursor` holds the same exclusive borrow for its whole life; the only
//!   structural change possible during iteration is `Cursor::remove`.
//!
//! Notes and non-goals
//! - No concurrent access, no fail-fast revision counter.
//! - Iteration order is stable only between resizes.
//! - Persisted form (feature `serde`): a sequence of `(key, value)` pairs
//!   whose length is the entry count. Only the content round-trips.

pub mod columns;
mod error;
mod hash_table;
#[cfg(test)]
mod hash_table_proptest;
mod hooks;
mod iter;
#[cfg(feature = "serde")]
mod serde_impl;
pub mod strategy;
mod topology;

// Public surface
pub use columns::{Column, IntColumn, LongColumn, NoColumn, ObjectColumn, PrimitiveColumn};
pub use error::{Error, ErrorKind, Result};
pub use hash_table::{HashTable, Placement};
pub use hooks::{Allocator, Hooks, Lookup};
pub use iter::{Cursor, Iter, Slots};
pub use strategy::{
    Columns, HashedColumns, HashedMap, HashedSet, IntMap, IntSet, LongMap, LongSet, ObjectIntMap,
    ObjectLongMap, ObjectMap, ObjectSet,
};
pub use topology::{bucket_count, MAX_BUCKETS, MAX_CAPACITY};
