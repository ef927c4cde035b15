//! Slab-backed tables (SPEC_FULL §4.8): the persistence layer under a
//! program's `StateCheck`/`StateChange` operations.
//!
//! A `Table<K, S>` is a persistent append log of `(key bytes, state byte)`
//! rows plus an in-memory associative secondary index — an ordered vector of
//! `(key bytes, key reference, state cell)` triples, mirroring the "ordered
//! vector of (key-reference, state-reference) pairs" the persistent layout
//! describes. Looked up by binary search over the encoded key bytes.
//! Absent→present transitions append a new row; present→absent and
//! present→unknown transitions mutate the existing state cell in place,
//! since `TupleState` is fixed-size and never crosses a slab boundary.

use crate::storage::slab::error::SlabResult;
use crate::storage::slab::list::SlabListWriter;
use crate::storage::slab::manager::SlabManager;
use crate::storage::slab::reference::{Fundamental, Mutable, SizedSlabReference};
use crate::storage::slab::serializer::{ByteWriter, HashingWriter, Reader, Serializer, Writer};
use std::marker::PhantomData;
use std::sync::Arc;

/// Whether a tuple is currently provable. Distinct from a `Result`: this is
/// an ordinary three-way domain value inspected by the generated checker
/// procedures, not an error condition (SPEC_FULL §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum TupleState {
    Absent = 0,
    Present = 1,
    Unknown = 2,
}

impl TupleState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TupleState::Absent,
            1 => TupleState::Present,
            _ => TupleState::Unknown,
        }
    }
}

impl Serializer<TupleState> for TupleState {
    const IS_FIXED_SIZE: bool = true;

    fn size_in_bytes(_value: &TupleState) -> u64 {
        1
    }

    fn write<W: Writer>(writer: &mut W, value: &TupleState) {
        writer.write_u8(*value as u8);
    }

    fn read<R: Reader>(reader: &mut R) -> TupleState {
        TupleState::from_u8(reader.read_u8())
    }
}

impl Fundamental for TupleState {}

fn encode_key<K, S: Serializer<K>>(key: &K) -> Vec<u8> {
    let mut w = ByteWriter::new();
    S::write(&mut w, key);
    w.into_bytes()
}

/// One row's slot in the secondary index: the encoded key (for ordering and
/// lookup), a reference to the key's stored bytes, and a mutable cell over
/// its state byte.
struct Row {
    key_bytes: Vec<u8>,
    #[allow(dead_code)]
    key_ref: SizedSlabReference,
    state: Mutable<TupleState>,
}

/// A persistent table keyed by `K`, backed by one append-only slab list
/// (SPEC_FULL §4.8, §6 "Persistent on-disk layout").
pub struct Table<K, S: Serializer<K>> {
    manager: Arc<SlabManager>,
    writer: SlabListWriter,
    index: Vec<Row>,
    present_count: usize,
    _marker: PhantomData<(K, S)>,
}

impl<K, S: Serializer<K>> Table<K, S> {
    pub fn new(manager: Arc<SlabManager>) -> SlabResult<Self> {
        let writer = SlabListWriter::new(manager.clone())?;
        manager.mark_persistent(writer.list().first);
        Ok(Table { manager, writer, index: Vec::new(), present_count: 0, _marker: PhantomData })
    }

    pub fn list(&self) -> crate::storage::slab::list::SlabList {
        self.writer.list()
    }

    /// Number of rows currently in the `Present` state.
    pub fn len(&self) -> usize {
        self.present_count
    }

    pub fn is_empty(&self) -> bool {
        self.present_count == 0
    }

    fn position(&self, key_bytes: &[u8]) -> Result<usize, usize> {
        self.index.binary_search_by(|row| row.key_bytes.as_slice().cmp(key_bytes))
    }

    /// `StateCheck`: the tuple's current provability.
    pub fn check(&self, key: &K) -> TupleState {
        let key_bytes = encode_key::<K, S>(key);
        match self.position(&key_bytes) {
            Ok(i) => self.index[i].state.get(),
            Err(_) => TupleState::Absent,
        }
    }

    /// `StateChange` to `Present`. Returns `true` if this changed the
    /// tuple's state (i.e. it was not already present).
    pub fn insert(&mut self, key: &K) -> SlabResult<bool> {
        self.set_state(key, TupleState::Present)
    }

    /// `StateChange` to `Absent`.
    pub fn remove(&mut self, key: &K) -> SlabResult<bool> {
        self.set_state(key, TupleState::Absent)
    }

    fn set_state(&mut self, key: &K, target: TupleState) -> SlabResult<bool> {
        let key_bytes = encode_key::<K, S>(key);
        match self.position(&key_bytes) {
            Ok(i) => {
                let row = &self.index[i];
                let changed = row.state.get() != target;
                if changed {
                    let was_present = row.state.get() == TupleState::Present;
                    row.state.set(target);
                    if was_present && target != TupleState::Present {
                        self.present_count -= 1;
                    } else if !was_present && target == TupleState::Present {
                        self.present_count += 1;
                    }
                }
                Ok(changed)
            }
            Err(pos) => {
                let key_ref = self.append_row(&key_bytes, target)?;
                self.index.insert(pos, Row { key_bytes, key_ref: key_ref.0, state: key_ref.1 });
                if target == TupleState::Present {
                    self.present_count += 1;
                }
                Ok(true)
            }
        }
    }

    fn append_row(&mut self, key_bytes: &[u8], initial: TupleState) -> SlabResult<(SizedSlabReference, Mutable<TupleState>)> {
        let key_addr = self.writer.current_address();
        self.writer.write_bytes(key_bytes)?;

        let mut hasher = HashingWriter::new(0);
        hasher.write_bytes(key_bytes);
        let full_hash = hasher.finish();
        let key_ref = SizedSlabReference::new(key_addr, key_bytes.len() as u32, full_hash);

        let state_addr = self.writer.current_address();
        self.writer.write_bytes(&[initial as u8])?;
        let state = Mutable::new(self.manager.clone(), state_addr);

        Ok((key_ref, state))
    }
}
