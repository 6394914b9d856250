//! Payload columns: one array per key or value, indexed by slot.
//!
//! A column does not know which of its slots are occupied. It only stores,
//! hands out and releases items; the table decides which slots are live.

use crate::error::{Error, Result};

/// Slot-indexed storage for one kind of item.
pub trait Column: Default {
    type Item;

    /// A column of `capacity` empty slots.
    fn allocate(capacity: usize) -> Result<Self>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, slot: usize) -> Option<&Self::Item>;

    fn get_mut(&mut self, slot: usize) -> Option<&mut Self::Item>;

    /// Store `item` at `slot`, returning what was there.
    fn set(&mut self, slot: usize, item: Self::Item) -> Option<Self::Item>;

    /// Move the item out of `slot`, leaving the slot empty.
    fn take(&mut self, slot: usize) -> Option<Self::Item>;

    /// Empty every slot; the length is kept.
    fn clear(&mut self);

    /// Move `source[from]` into `self[to]`.
    fn move_from(&mut self, source: &mut Self, from: usize, to: usize);
}

fn reserve<T>(capacity: usize) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity)
        .map_err(|_| Error::OutOfMemory { requested: capacity })?;
    Ok(buf)
}

/// Owned items; an empty slot holds `None` and drops its item on release.
#[derive(Clone, Debug)]
pub struct ObjectColumn<T>(Vec<Option<T>>);

impl<T> Default for ObjectColumn<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Column for ObjectColumn<T> {
    type Item = T;

    fn allocate(capacity: usize) -> Result<Self> {
        let mut buf = reserve(capacity)?;
        buf.resize_with(capacity, || None);
        Ok(Self(buf))
    }

    #[inline]
    fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    fn get(&self, slot: usize) -> Option<&T> {
        self.0.get(slot)?.as_ref()
    }

    #[inline]
    fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.0.get_mut(slot)?.as_mut()
    }

    fn set(&mut self, slot: usize, item: T) -> Option<T> {
        self.0.get_mut(slot)?.replace(item)
    }

    fn take(&mut self, slot: usize) -> Option<T> {
        self.0.get_mut(slot)?.take()
    }

    fn clear(&mut self) {
        self.0.iter_mut().for_each(|item| *item = None);
    }

    fn move_from(&mut self, source: &mut Self, from: usize, to: usize) {
        if let (Some(item), Some(dest)) = (source.0.get_mut(from), self.0.get_mut(to)) {
            *dest = item.take();
        }
    }
}

/// Raw `Copy` items without an empty marker. Every slot reads as a value;
/// released slots read as `T::default()`.
#[derive(Clone, Debug)]
pub struct PrimitiveColumn<T>(Vec<T>);

/// 32-bit integer column.
pub type IntColumn = PrimitiveColumn<i32>;

/// 64-bit integer column.
pub type LongColumn = PrimitiveColumn<i64>;

impl<T> Default for PrimitiveColumn<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T: Copy + Default> Column for PrimitiveColumn<T> {
    type Item = T;

    fn allocate(capacity: usize) -> Result<Self> {
        let mut buf = reserve(capacity)?;
        buf.resize(capacity, T::default());
        Ok(Self(buf))
    }

    #[inline]
    fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    fn get(&self, slot: usize) -> Option<&T> {
        self.0.get(slot)
    }

    #[inline]
    fn get_mut(&mut self, slot: usize) -> Option<&mut T> {
        self.0.get_mut(slot)
    }

    fn set(&mut self, slot: usize, item: T) -> Option<T> {
        self.0.get_mut(slot).map(|dest| core::mem::replace(dest, item))
    }

    fn take(&mut self, slot: usize) -> Option<T> {
        self.0.get_mut(slot).map(core::mem::take)
    }

    fn clear(&mut self) {
        self.0.fill(T::default());
    }

    fn move_from(&mut self, source: &mut Self, from: usize, to: usize) {
        if let (Some(&item), Some(dest)) = (source.0.get(from), self.0.get_mut(to)) {
            *dest = item;
        }
    }
}

/// Value column of a set: stores nothing, every slot reads as `()`.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoColumn(());

impl Column for NoColumn {
    type Item = ();

    fn allocate(_capacity: usize) -> Result<Self> {
        Ok(Self(()))
    }

    fn len(&self) -> usize {
        0
    }

    fn get(&self, _slot: usize) -> Option<&()> {
        Some(&self.0)
    }

    fn get_mut(&mut self, _slot: usize) -> Option<&mut ()> {
        Some(&mut self.0)
    }

    fn set(&mut self, _slot: usize, _item: ()) -> Option<()> {
        Some(())
    }

    fn take(&mut self, _slot: usize) -> Option<()> {
        Some(())
    }

    fn clear(&mut self) {}

    fn move_from(&mut self, _source: &mut Self, _from: usize, _to: usize) {}
}
