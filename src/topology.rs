//! Topology: the bucket array and the chain array.
//!
//! `buckets[b]` holds the first slot of bucket `b`'s collision chain, or
//! `NIL`. `nexts[s]` is read in one of two ways depending on whether `s` is
//! occupied: for an occupied slot it is the next slot of the same chain (or
//! `NIL` at the chain's end); for a free slot it is the next free slot. The
//! free list built by `reset` links `s -> s + 1`, so its terminal is the
//! capacity itself, never `NIL`.
//!
//! Pure data: occupancy is tracked by the table, not here.

use crate::error::{Error, Result};
use std::borrow::Cow;

/// Empty bucket / end of chain.
pub(crate) const NIL: u32 = u32::MAX;

/// Largest number of slots a table can reserve.
pub const MAX_CAPACITY: usize = (u32::MAX - 8) as usize;

/// Upper bound on the bucket array length; larger tables share buckets.
pub const MAX_BUCKETS: usize = 1 << 29;

/// Shared bucket array of every table without capacity.
const EMPTY_BUCKETS: &[u32] = &[NIL];

/// Bucket array length for `capacity` slots: the smallest power of two that
/// covers `capacity`, at least 1 and at most [`MAX_BUCKETS`].
pub fn bucket_count(capacity: usize) -> usize {
    capacity
        .max(1)
        .checked_next_power_of_two()
        .map_or(MAX_BUCKETS, |len| len.min(MAX_BUCKETS))
}

#[derive(Clone, Debug)]
pub(crate) struct Topology {
    buckets: Cow<'static, [u32]>,
    nexts: Vec<u32>,
}

impl Topology {
    /// No slots and the shared one-bucket array; allocates nothing.
    pub(crate) fn empty() -> Self {
        Self {
            buckets: Cow::Borrowed(EMPTY_BUCKETS),
            nexts: Vec::new(),
        }
    }

    /// Fresh topology for `capacity` slots: every bucket empty, every slot on
    /// the free list.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Ok(Self::empty());
        }
        if capacity > MAX_CAPACITY {
            return Err(Error::CapacityOverflow { requested: capacity });
        }
        let oom = |_| Error::OutOfMemory { requested: capacity };
        let bucket_len = bucket_count(capacity);
        let mut buckets = Vec::new();
        buckets.try_reserve_exact(bucket_len).map_err(oom)?;
        buckets.resize(bucket_len, NIL);
        let mut nexts = Vec::new();
        nexts.try_reserve_exact(capacity).map_err(oom)?;
        nexts.extend(1..=capacity as u32);
        Ok(Self {
            buckets: Cow::Owned(buckets),
            nexts,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.nexts.len()
    }

    #[inline]
    pub(crate) fn bucket_len(&self) -> usize {
        self.buckets.len()
    }

    #[inline]
    pub(crate) fn bucket_of(&self, hash: u32) -> usize {
        hash as usize & (self.buckets.len() - 1)
    }

    #[inline]
    pub(crate) fn head(&self, bucket: usize) -> u32 {
        self.buckets.get(bucket).copied().unwrap_or(NIL)
    }

    #[inline]
    pub(crate) fn next(&self, slot: u32) -> u32 {
        self.nexts[slot as usize]
    }

    #[inline]
    pub(crate) fn set_next(&mut self, slot: u32, next: u32) {
        self.nexts[slot as usize] = next;
    }

    /// Link `slot` in front of `bucket`'s chain.
    #[inline]
    pub(crate) fn push_head(&mut self, bucket: usize, slot: u32) {
        let buckets = self.buckets.to_mut();
        self.nexts[slot as usize] = buckets[bucket];
        buckets[bucket] = slot;
    }

    /// Splice the first slot of `bucket`'s chain accepted by `hit` out of the
    /// chain. The spliced slot's link is left dangling for the caller to
    /// repoint at the free list.
    pub(crate) fn unlink_where<F>(&mut self, bucket: usize, mut hit: F) -> Option<u32>
    where
        F: FnMut(u32) -> bool,
    {
        let mut prev = NIL;
        let mut slot = self.head(bucket);
        while slot != NIL {
            let next = self.nexts[slot as usize];
            if hit(slot) {
                if prev == NIL {
                    self.buckets.to_mut()[bucket] = next;
                } else {
                    self.nexts[prev as usize] = next;
                }
                return Some(slot);
            }
            prev = slot;
            slot = next;
        }
        None
    }

    /// Empty every bucket and thread all slots onto the free list again.
    pub(crate) fn reset(&mut self) {
        if self.nexts.is_empty() {
            return;
        }
        self.buckets.to_mut().fill(NIL);
        for (slot, next) in self.nexts.iter_mut().enumerate() {
            *next = slot as u32 + 1;
        }
    }
}
