//! Iteration over occupied slots: buckets in ascending order, each chain
//! from its head.
//!
//! `Slots` and `Iter` borrow the table shared. `Cursor` borrows it
//! exclusively so that it can remove the slot it last returned; the borrow
//! rules out any other structural change while it is alive.

use crate::error::{Error, Result};
use crate::hash_table::HashTable;
use crate::hooks::Hooks;
use crate::topology::{Topology, NIL};

/// Position of the next slot to return and the bucket whose chain holds it.
#[derive(Clone, Debug)]
struct Walk {
    bucket: usize,
    pending: u32,
}

impl Walk {
    fn new(topology: &Topology) -> Self {
        let mut walk = Walk {
            bucket: 0,
            pending: NIL,
        };
        walk.seek(topology, 0);
        walk
    }

    fn seek(&mut self, topology: &Topology, from: usize) {
        let len = topology.bucket_len();
        for bucket in from..len {
            let head = topology.head(bucket);
            if head != NIL {
                self.bucket = bucket;
                self.pending = head;
                return;
            }
        }
        self.bucket = len;
        self.pending = NIL;
    }

    #[inline]
    fn has_next(&self) -> bool {
        self.pending != NIL
    }

    /// Return `(bucket, slot)` of the pending slot and locate the one after it.
    fn advance(&mut self, topology: &Topology) -> Option<(usize, u32)> {
        if self.pending == NIL {
            return None;
        }
        let current = (self.bucket, self.pending);
        let next = topology.next(self.pending);
        if next != NIL {
            self.pending = next;
        } else {
            self.seek(topology, self.bucket + 1);
        }
        Some(current)
    }
}

/// Iterator over occupied slot indices.
pub struct Slots<'a, H> {
    table: &'a HashTable<H>,
    walk: Walk,
    remaining: usize,
}

impl<'a, H: Hooks> Slots<'a, H> {
    pub(crate) fn new(table: &'a HashTable<H>) -> Self {
        Self {
            walk: Walk::new(&table.topology),
            remaining: table.count(),
            table,
        }
    }
}

impl<'a, H: Hooks> Iterator for Slots<'a, H> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        let (_, slot) = self.walk.advance(&self.table.topology)?;
        self.remaining = self.remaining.saturating_sub(1);
        Some(slot as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, H: Hooks> ExactSizeIterator for Slots<'a, H> {}

/// Iterator over `(key, value)` references; the value is `None` where none
/// was stored.
pub struct Iter<'a, H> {
    slots: Slots<'a, H>,
}

impl<'a, H: Hooks> Iter<'a, H> {
    pub(crate) fn new(table: &'a HashTable<H>) -> Self {
        Self {
            slots: Slots::new(table),
        }
    }
}

impl<'a, H: Hooks> Iterator for Iter<'a, H> {
    type Item = (&'a H::Key, Option<&'a H::Value>);

    fn next(&mut self) -> Option<Self::Item> {
        let table = self.slots.table;
        for slot in self.slots.by_ref() {
            if let Some(key) = table.key(slot) {
                return Some((key, table.value(slot)));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.slots.size_hint()
    }
}

/// Iterator over occupied slots that supports removing the slot it returned
/// last.
///
/// ```
/// use transposed_hash::ObjectMap;
///
/// let mut m: ObjectMap<u32, u32> = ObjectMap::default();
/// for i in 0..10 {
///     m.put(i, i).unwrap();
/// }
/// let mut cursor = m.cursor();
/// while let Some(slot) = cursor.next() {
///     if cursor.table().value(slot).is_some_and(|v| v % 2 == 0) {
///         cursor.remove().unwrap();
///     }
/// }
/// assert_eq!(m.count(), 5);
/// ```
pub struct Cursor<'a, H> {
    table: &'a mut HashTable<H>,
    walk: Walk,
    last: Option<(usize, u32)>,
}

impl<'a, H: Hooks> Cursor<'a, H> {
    pub(crate) fn new(table: &'a mut HashTable<H>) -> Self {
        Self {
            walk: Walk::new(&table.topology),
            last: None,
            table,
        }
    }

    /// Whether another slot is pending.
    pub fn has_next(&self) -> bool {
        self.walk.has_next()
    }

    pub fn table(&self) -> &HashTable<H> {
        self.table
    }

    pub fn value_mut(&mut self, slot: usize) -> Option<&mut H::Value> {
        self.table.value_mut(slot)
    }

    /// Remove the slot returned by the last `next`.
    ///
    /// Fails with [`Error::IllegalState`] before the first `next`, and when
    /// called a second time for the same `next`.
    pub fn remove(&mut self) -> Result<()> {
        let (bucket, slot) = self.last.take().ok_or(Error::IllegalState)?;
        if self.table.remove_at(bucket, slot as usize) {
            Ok(())
        } else {
            Err(Error::IllegalState)
        }
    }
}

impl<'a, H: Hooks> Iterator for Cursor<'a, H> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let Some((bucket, slot)) = self.walk.advance(&self.table.topology) else {
            self.last = None;
            return None;
        };
        self.last = Some((bucket, slot));
        Some(slot as usize)
    }
}
