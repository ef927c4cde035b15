//! Slab-backed append-only vectors (SPEC_FULL §3, §4.8).
//!
//! A `TypedSlabVector<T, S>` owns a [`SlabList`] and appends `T` tuples
//! end-to-end through the `S: Serializer<T>` specialization; iterating it
//! reifies nothing until the caller asks for a specific element.
//! `PersistentTypedSlabVector<T, S>` is the same shape over slabs the
//! manager has marked persistent, so the garbage collector never reclaims
//! them. The serializer is a separate type parameter (mirroring
//! `write_vec`/`read_vec` in `serializer.rs`) rather than `T: Serializer<T>`,
//! since not every `T` can serialize itself (`String` goes through
//! `StringSerializer`).

use crate::storage::slab::error::SlabResult;
use crate::storage::slab::list::{SlabList, SlabListReader, SlabListWriter};
use crate::storage::slab::manager::SlabManager;
use crate::storage::slab::serializer::{ByteReader, ByteWriter, Reader, Serializer, Writer};
use std::marker::PhantomData;
use std::sync::Arc;

/// An append-only sequence of `T` tuples serialized contiguously across a
/// slab list (SPEC_FULL §3, "Persistent typed slab vector").
pub struct TypedSlabVector<T, S: Serializer<T>> {
    manager: Arc<SlabManager>,
    writer: SlabListWriter,
    len: usize,
    _marker: PhantomData<(T, S)>,
}

impl<T, S: Serializer<T>> TypedSlabVector<T, S> {
    pub fn new(manager: Arc<SlabManager>) -> SlabResult<Self> {
        let writer = SlabListWriter::new(manager.clone())?;
        Ok(TypedSlabVector { manager, writer, len: 0, _marker: PhantomData })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn list(&self) -> SlabList {
        self.writer.list()
    }

    /// Appends `value`, length-prefixing it when `T` is not fixed-size so
    /// iteration can skip elements without fully decoding them.
    pub fn push(&mut self, value: &T) -> SlabResult<()> {
        let mut byte_writer = ByteWriter::new();
        if !S::IS_FIXED_SIZE {
            byte_writer.write_size(S::size_in_bytes(value));
        }
        S::write(&mut byte_writer, value);
        self.writer.write_bytes(&byte_writer.into_bytes())?;
        self.len += 1;
        Ok(())
    }

    /// Iterates every element in append order, reading lazily from the
    /// backing slab list.
    pub fn iter(&self) -> TypedSlabVectorIter<T, S> {
        TypedSlabVectorIter {
            reader: SlabListReader::new(self.manager.clone(), self.writer.list()),
            remaining: self.len,
            _marker: PhantomData,
        }
    }
}

pub struct TypedSlabVectorIter<T, S: Serializer<T>> {
    reader: SlabListReader,
    remaining: usize,
    _marker: PhantomData<(T, S)>,
}

impl<T, S: Serializer<T>> Iterator for TypedSlabVectorIter<T, S> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let bytes = if S::IS_FIXED_SIZE {
            self.reader.read_bytes(fixed_width::<T, S>())
        } else {
            let header = self.reader.read_bytes(8);
            let len = u64::from_le_bytes(header.try_into().unwrap()) as usize;
            self.reader.read_bytes(len)
        };
        let mut r = ByteReader::new(&bytes);
        Some(S::read(&mut r))
    }
}

/// The constant encoded width of a fixed-size `T`, keyed off `size_of::<T>()`
/// since every `impl_fixed_serializer!` type (the only fixed-size types this
/// framework defines) serializes to its in-memory width.
fn fixed_width<T, S: Serializer<T>>() -> usize {
    std::mem::size_of::<T>()
}

/// A [`TypedSlabVector`] whose slabs are marked persistent so the manager's
/// garbage collector never reclaims them and the super-block walks them on
/// restart (SPEC_FULL §3, §4.8, §6).
pub struct PersistentTypedSlabVector<T, S: Serializer<T>> {
    inner: TypedSlabVector<T, S>,
}

impl<T, S: Serializer<T>> PersistentTypedSlabVector<T, S> {
    pub fn new(manager: Arc<SlabManager>) -> SlabResult<Self> {
        let inner = TypedSlabVector::new(manager.clone())?;
        manager.mark_persistent(inner.list().first);
        Ok(PersistentTypedSlabVector { inner })
    }

    /// Reopens a persistent vector whose slab list is already known (restart
    /// path, SPEC_FULL §6 "Restart").
    pub fn open(manager: Arc<SlabManager>, list: SlabList, len: usize) -> Self {
        manager.mark_persistent(list.first);
        let inner = TypedSlabVector {
            manager: manager.clone(),
            writer: SlabListWriter::reopen(manager, list),
            len,
            _marker: PhantomData,
        };
        PersistentTypedSlabVector { inner }
    }

    pub fn push(&mut self, value: &T) -> SlabResult<()> {
        self.inner.push(value)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn list(&self) -> SlabList {
        self.inner.list()
    }

    pub fn iter(&self) -> TypedSlabVectorIter<T, S> {
        self.inner.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::slab::slab::{SlabStoreKind, SlabStoreSize};
    use crate::storage::slab::serializer::StringSerializer;

    fn manager() -> Arc<SlabManager> {
        Arc::new(SlabManager::create(SlabStoreKind::InMemory, SlabStoreSize::Tiny, 1).unwrap())
    }

    #[test]
    fn fixed_size_elements_round_trip_in_order() {
        let m = manager();
        let mut v: TypedSlabVector<i64, i64> = TypedSlabVector::new(m).unwrap();
        v.push(&1).unwrap();
        v.push(&2).unwrap();
        v.push(&3).unwrap();
        assert_eq!(v.len(), 3);
        let collected: Vec<i64> = v.iter().collect();
        assert_eq!(collected, vec![1, 2, 3]);
    }

    #[test]
    fn variable_size_elements_round_trip_in_order() {
        let m = manager();
        let mut v: TypedSlabVector<String, StringSerializer> = TypedSlabVector::new(m).unwrap();
        v.push(&"a".to_string()).unwrap();
        v.push(&"bcd".to_string()).unwrap();
        let collected: Vec<String> = v.iter().collect();
        assert_eq!(collected, vec!["a".to_string(), "bcd".to_string()]);
    }

    #[test]
    fn persistent_vector_marks_its_first_slab() {
        let m = manager();
        let mut v: PersistentTypedSlabVector<i64, i64> = PersistentTypedSlabVector::new(m.clone()).unwrap();
        v.push(&42).unwrap();
        // Persistent slabs ignore decref; incref/decref to zero should not free it.
        m.incref(v.list().first);
        m.decref(v.list().first);
        assert_eq!(m.stats().num_free_slabs, 0);
    }
}
