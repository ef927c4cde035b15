//! Typed references into slab bytes (SPEC_FULL §3, §4.7).
//!
//! [`SlabReference`] is the untyped 48-bit-address/16-bit-hash handle;
//! [`SizedSlabReference`] extends it with the byte length and full hash a
//! variable-width object needs. [`TypedSlabReference<T>`] wraps one of these
//! so it behaves as a value of `T`: fundamental types are held inline (no
//! slab access needed to compare or dereference them), composite types read
//! lazily from slab bytes through the [`super::serializer`] framework.
//! [`InternReference<T>`] is the non-owning counterpart for values kept in a
//! process-wide intern table rather than a slab.

use crate::storage::slab::manager::SlabManager;
use crate::storage::slab::serializer::{
    ByteEqualityComparingWriter, ByteReader, ComparisonOutcome, HashingWriter,
    LexicographicComparingWriter, OrderedKeyBytes, Reader, Serializer, Writer,
};
use crate::storage::slab::slab::SlabAddress;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::marker::PhantomData;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};

const ADDRESS_BITS: u32 = 48;
const ADDRESS_MASK: u64 = (1u64 << ADDRESS_BITS) - 1;

/// A packed (48-bit address, 16-bit truncated hash) handle into slab bytes
/// (SPEC_FULL §3, design note "arena + index for slab references").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlabReference(u64);

impl SlabReference {
    pub fn new(address: SlabAddress, full_hash: u64) -> Self {
        debug_assert!(address.0 <= ADDRESS_MASK, "slab address overflows 48 bits");
        let truncated = (full_hash >> 48) as u16;
        SlabReference((address.0 & ADDRESS_MASK) | ((truncated as u64) << ADDRESS_BITS))
    }

    pub fn address(self) -> SlabAddress {
        SlabAddress(self.0 & ADDRESS_MASK)
    }

    pub fn truncated_hash(self) -> u16 {
        (self.0 >> ADDRESS_BITS) as u16
    }
}

/// A [`SlabReference`] plus the byte length and full hash a variable-width
/// object needs (SPEC_FULL §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizedSlabReference {
    base: SlabReference,
    byte_len: u32,
    full_hash: u32,
}

impl SizedSlabReference {
    pub fn new(address: SlabAddress, byte_len: u32, full_hash: u64) -> Self {
        SizedSlabReference { base: SlabReference::new(address, full_hash), byte_len, full_hash: full_hash as u32 }
    }

    pub fn address(self) -> SlabAddress {
        self.base.address()
    }

    pub fn byte_len(self) -> u32 {
        self.byte_len
    }

    pub fn full_hash(self) -> u32 {
        self.full_hash
    }

    /// Reads the referenced bytes directly, assuming they do not cross a
    /// slab boundary — true for any value smaller than a slab's payload
    /// written right after a rotation, which is how
    /// [`TypedSlabReference::store`] always positions a write. A value
    /// large enough to span slabs needs the chain-rejoining
    /// [`super::list::SlabListReader`] instead of a bare sized reference.
    fn bytes(self, manager: &SlabManager) -> Vec<u8> {
        manager.read_at(self.address(), self.byte_len as usize)
    }
}

/// Types that can live inline in a [`TypedSlabReference`] without a slab
/// read — the "fundamental" types of SPEC_FULL §4.6/§9.
pub trait Fundamental: Serializer<Self> + Copy + PartialEq + PartialOrd + std::fmt::Debug {}

impl Fundamental for u8 {}
impl Fundamental for u16 {}
impl Fundamental for u32 {}
impl Fundamental for u64 {}
impl Fundamental for i8 {}
impl Fundamental for i16 {}
impl Fundamental for i32 {}
impl Fundamental for i64 {}
impl Fundamental for f32 {}
impl Fundamental for f64 {}
impl Fundamental for bool {}

/// Behaves as a value of `T`: a fundamental `T` is stored inline; a
/// composite `T` reads lazily from slab bytes via `manager` on first access
/// (SPEC_FULL §3, "`Typed slab reference<T>`").
pub enum TypedSlabReference<T> {
    Inline(T),
    Lazy { manager: Arc<SlabManager>, reference: SizedSlabReference, _marker: PhantomData<T> },
}

impl<T> Clone for TypedSlabReference<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            TypedSlabReference::Inline(v) => TypedSlabReference::Inline(v.clone()),
            TypedSlabReference::Lazy { manager, reference, .. } => {
                TypedSlabReference::Lazy { manager: manager.clone(), reference: *reference, _marker: PhantomData }
            }
        }
    }
}

impl<T: Fundamental> TypedSlabReference<T> {
    pub fn inline(value: T) -> Self {
        TypedSlabReference::Inline(value)
    }
}

impl<T: Serializer<T> + Clone> TypedSlabReference<T> {
    /// Writes `value` into `manager` via `writer`, recording its hash and
    /// byte length, and returns a lazy reference to it. Used for composite
    /// `T`; callers of `Fundamental` `T` should prefer [`Self::inline`].
    pub fn store(manager: Arc<SlabManager>, writer: &mut crate::storage::slab::list::SlabListWriter, value: &T) -> crate::storage::slab::error::SlabResult<Self> {
        let mut byte_writer = crate::storage::slab::serializer::ByteWriter::new();
        T::write(&mut byte_writer, value);
        let bytes = byte_writer.into_bytes();

        let mut hasher = HashingWriter::new(0);
        hasher.write_bytes(&bytes);
        let full_hash = hasher.finish();

        let address = writer.current_address();
        writer.write_bytes(&bytes)?;
        let reference = SizedSlabReference::new(address, bytes.len() as u32, full_hash);
        Ok(TypedSlabReference::Lazy { manager, reference, _marker: PhantomData })
    }

    /// Reifies the referenced value, reading from slab bytes if this is a
    /// lazy (composite) reference.
    pub fn get(&self) -> T {
        match self {
            TypedSlabReference::Inline(v) => v.clone(),
            TypedSlabReference::Lazy { manager, reference, .. } => {
                let bytes = reference.bytes(manager);
                let mut reader = ByteReader::new(&bytes);
                T::read(&mut reader)
            }
        }
    }

    fn raw_bytes(&self) -> Vec<u8> {
        match self {
            TypedSlabReference::Inline(v) => {
                let mut w = crate::storage::slab::serializer::ByteWriter::new();
                T::write(&mut w, v);
                w.into_bytes()
            }
            TypedSlabReference::Lazy { manager, reference, .. } => reference.bytes(manager),
        }
    }

    /// Re-walks the serializer against a comparing writer rather than
    /// materializing both sides, short-circuiting on the first differing
    /// byte (SPEC_FULL §3, invariant 6).
    pub fn equals(&self, other: &Self) -> bool {
        let reference_bytes = other.raw_bytes();
        let mut w = ByteEqualityComparingWriter::new(&reference_bytes);
        w.write_bytes(&self.raw_bytes());
        w.matches()
    }
}

impl<T: Serializer<T> + Clone + OrderedKeyBytes> TypedSlabReference<T> {
    /// Compares the *reified* values' order-preserving encodings
    /// (`OrderedKeyBytes`), not the raw little-endian `Serializer` bytes:
    /// little-endian bytes compare the low byte of a multi-byte integer
    /// first and treat a signed integer's sign bit as just another high
    /// bit, so lexicographic order over them is not value order (SPEC_FULL
    /// §3 invariant 6 requires it to be). `OrderedKeyBytes` fixes both by
    /// encoding big-endian with the sign/exponent bit adjusted.
    pub fn cmp_bytes(&self, other: &Self) -> Ordering {
        let reference_bytes = T::ordered_key_bytes(&other.get());
        let mut w = LexicographicComparingWriter::new(&reference_bytes);
        w.write_bytes(&T::ordered_key_bytes(&self.get()));
        match w.outcome() {
            ComparisonOutcome::Less => Ordering::Less,
            ComparisonOutcome::Equal => Ordering::Equal,
            ComparisonOutcome::Greater => Ordering::Greater,
        }
    }
}

/// Marks a slab reference as writable in place (SPEC_FULL §5): a scoped
/// "slab lock" on the enclosing slab is implied by holding `&SlabManager`
/// through `SlabManager::write_at`, which serializes via its internal mutex.
/// Only valid for fixed-size fundamental types that do not cross a slab
/// boundary.
pub struct Mutable<T: Fundamental> {
    manager: Arc<SlabManager>,
    address: SlabAddress,
    _marker: PhantomData<T>,
}

impl<T: Fundamental> Mutable<T> {
    pub fn new(manager: Arc<SlabManager>, address: SlabAddress) -> Self {
        Mutable { manager, address, _marker: PhantomData }
    }

    pub fn get(&self) -> T {
        let bytes = self.manager.read_at(self.address, std::mem::size_of::<T>());
        let mut reader = ByteReader::new(&bytes);
        T::read(&mut reader)
    }

    /// In-place write: fixed-size, non-boundary-crossing, so it never
    /// invalidates any outstanding `TypedSlabReference` to this cell
    /// (SPEC_FULL §4.8).
    pub fn set(&self, value: T) {
        let mut writer = crate::storage::slab::serializer::ByteWriter::new();
        T::write(&mut writer, &value);
        self.manager.write_at(self.address, writer.bytes());
    }
}

/// A type tagged as addressable-for-writing at a given in-slab position,
/// used by the slab-backed table's state cells (SPEC_FULL §4.8).
pub struct Addressable<T: Fundamental> {
    pub mutable: Mutable<T>,
}

/// A non-owning pointer into a process-wide intern table of deduplicated `T`
/// values (SPEC_FULL §3). Equality is pointer equality; dereferencing reads
/// the interned payload. Distinct `T`s get distinct tables, each lazily
/// created on first use.
pub struct InternReference<T> {
    index: usize,
    _marker: PhantomData<T>,
}

impl<T> Clone for InternReference<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for InternReference<T> {}

impl<T> PartialEq for InternReference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}
impl<T> Eq for InternReference<T> {}

struct InternTable<T> {
    by_value: HashMap<T, usize>,
    values: Vec<Arc<T>>,
}

impl<T> Default for InternTable<T> {
    fn default() -> Self {
        InternTable { by_value: HashMap::new(), values: Vec::new() }
    }
}

/// One process-wide intern table per concrete `T`, keyed by Rust's
/// `TypeId`-free monomorphization (each `T` gets its own `OnceLock`).
struct InternRegistry<T>(OnceLock<Mutex<InternTable<T>>>);

impl<T> InternRegistry<T> {
    const fn new() -> Self {
        InternRegistry(OnceLock::new())
    }
}

/// Holds the registry for one `T`; declared as a trait so `InternReference`
/// can be generic without a `static` per monomorphization living outside
/// this module's control.
pub trait Internable: std::hash::Hash + Eq + Clone + Sized + 'static {
    fn registry() -> &'static InternRegistry<Self>;
}

impl<T> InternReference<T>
where
    T: Internable,
{
    /// Interns `value`, returning a reference that is pointer-equal to any
    /// previously interned equal value.
    pub fn intern(value: T) -> Self {
        let registry = T::registry().0.get_or_init(|| Mutex::new(InternTable::default()));
        let mut table = registry.lock();
        if let Some(&index) = table.by_value.get(&value) {
            return InternReference { index, _marker: PhantomData };
        }
        let index = table.values.len();
        table.by_value.insert(value.clone(), index);
        table.values.push(Arc::new(value));
        InternReference { index, _marker: PhantomData }
    }

    pub fn get(self) -> Arc<T> {
        let registry = T::registry().0.get().expect("dereferenced an InternReference before any intern() call");
        let table = registry.lock();
        table.values[self.index].clone()
    }
}
