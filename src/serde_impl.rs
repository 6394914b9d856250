//! Persisted layout: a sequence whose length is the entry count, holding one
//! `(key, value)` pair per entry in iteration order. A missing value is
//! written as `None`.
//!
//! Reading reserves the stated count up front, capped at about a megabyte of
//! entries, and re-inserts every pair, so bucket placement is derived afresh;
//! only the content round-trips, not the order.

use crate::hash_table::HashTable;
use crate::hooks::{Hooks, Lookup};
use core::fmt;
use core::marker::PhantomData;
use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const MAX_PREALLOC_BYTES: usize = 1024 * 1024;

// A length prefix is untrusted input; past the cap the table grows as
// elements actually arrive.
fn cautious<T>(hint: Option<usize>) -> usize {
    hint.unwrap_or(0)
        .min(MAX_PREALLOC_BYTES / core::mem::size_of::<T>().max(1))
}

impl<H> Serialize for HashTable<H>
where
    H: Hooks,
    H::Key: Serialize,
    H::Value: Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.count()))?;
        for entry in self.iter() {
            seq.serialize_element(&entry)?;
        }
        seq.end()
    }
}

impl<'de, H> Deserialize<'de> for HashTable<H>
where
    H: Hooks + Lookup<<H as Hooks>::Key> + Default,
    H::Key: Deserialize<'de>,
    H::Value: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TableVisitor<H>(PhantomData<H>);

        impl<'de, H> Visitor<'de> for TableVisitor<H>
        where
            H: Hooks + Lookup<<H as Hooks>::Key> + Default,
            H::Key: Deserialize<'de>,
            H::Value: Deserialize<'de>,
        {
            type Value = HashTable<H>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "sequence of (key, value) pairs")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut table = HashTable::new(H::default());
                let reserve = cautious::<(H::Key, Option<H::Value>)>(seq.size_hint());
                if reserve > 0 {
                    table.allocate(reserve).map_err(<A::Error as de::Error>::custom)?;
                }
                while let Some((key, value)) = seq.next_element::<(H::Key, Option<H::Value>)>()? {
                    let slot = table.insert_or_find(key).map_err(<A::Error as de::Error>::custom)?;
                    if let Some(value) = value {
                        table.set_value(slot, value);
                    }
                }
                Ok(table)
            }
        }

        deserializer.deserialize_seq(TableVisitor(PhantomData))
    }
}
