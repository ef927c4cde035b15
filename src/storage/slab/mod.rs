//! The slab-based persistent storage runtime (SPEC_FULL §4.6–§4.8, §5–§6).
//!
//! A 2 MiB-aligned slab allocator ([`manager`]) backs append-only byte
//! streams ([`list`]); a serializer capability layer ([`serializer`])
//! encodes/decodes values across those streams; typed references
//! ([`reference`]) give values an address and a comparable/hashable identity
//! without always reifying their bytes; and [`vector`]/[`table`] build the
//! two persistent collection shapes (`TypedSlabVector`/`Table`) the rest of
//! the runtime stores tuples in.

pub mod error;
pub mod list;
pub mod manager;
pub mod reference;
pub mod serializer;
pub mod slab;
pub mod table;
pub mod vector;

pub use error::{SlabError, SlabResult};
pub use list::{SlabList, SlabListReader, SlabListWriter, UnsafeSlabListReader, UnsafeSlabListWriter};
pub use manager::{SlabManager, SlabStats};
pub use reference::{
    Addressable, Fundamental, InternReference, Internable, Mutable, SizedSlabReference, SlabReference,
    TypedSlabReference,
};
pub use serializer::{
    ByteCountingWriter, ByteEqualityComparingWriter, ByteReader, ByteWriter, ComparisonOutcome,
    HashingWriter, LexicographicComparingWriter, Reader, Serializer, StringSerializer, Writer,
};
pub use slab::{SlabAddress, SlabLifecycle, SlabStoreKind, SlabStoreSize};
pub use table::{Table, TupleState};
pub use vector::{PersistentTypedSlabVector, TypedSlabVector};
