//! Property tests for the slab serializer framework and reference ordering
//! (SPEC_FULL §8, invariants 5 and 6).

use proptest::prelude::*;
use stratalog::storage::slab::{
    ByteReader, ByteWriter, Serializer, SlabAddress, SlabListWriter, SlabManager, SlabReference,
    SlabStoreKind, SlabStoreSize, StringSerializer, TypedSlabReference,
};
use std::sync::Arc;

fn roundtrip_i64(value: i64) -> i64 {
    let mut writer = ByteWriter::new();
    i64::write(&mut writer, &value);
    let bytes = writer.into_bytes();
    let mut reader = ByteReader::new(&bytes);
    i64::read(&mut reader)
}

fn roundtrip_f64(value: f64) -> f64 {
    let mut writer = ByteWriter::new();
    f64::write(&mut writer, &value);
    let bytes = writer.into_bytes();
    let mut reader = ByteReader::new(&bytes);
    f64::read(&mut reader)
}

fn roundtrip_string(value: &str) -> String {
    let mut writer = ByteWriter::new();
    StringSerializer::write(&mut writer, &value.to_string());
    let bytes = writer.into_bytes();
    let mut reader = ByteReader::new(&bytes);
    StringSerializer::read(&mut reader)
}

proptest! {
    #[test]
    fn i64_serializer_roundtrips_any_value(value: i64) {
        prop_assert_eq!(roundtrip_i64(value), value);
    }

    #[test]
    fn f64_serializer_roundtrips_any_finite_value(value in any::<f64>().prop_filter("finite", |v| v.is_finite())) {
        prop_assert_eq!(roundtrip_f64(value).to_bits(), value.to_bits());
    }

    #[test]
    fn string_serializer_roundtrips_any_utf8_value(value in ".*") {
        prop_assert_eq!(roundtrip_string(&value), value);
    }

    /// Two addresses within the same 48-bit address space, hashed with the
    /// same full hash (so the truncated-hash bits tie), order the same way
    /// as their raw addresses — the packed `SlabReference`'s `Ord` impl must
    /// agree with address order whenever the hash component can't break the
    /// tie (SPEC_FULL §3, invariant 6).
    #[test]
    fn slab_reference_ordering_agrees_with_address_when_hash_ties(
        a in 0u64..(1u64 << 48),
        b in 0u64..(1u64 << 48),
    ) {
        let ra = SlabReference::new(SlabAddress(a), 0);
        let rb = SlabReference::new(SlabAddress(b), 0);
        prop_assert_eq!(ra.cmp(&rb), a.cmp(&b));
    }

    /// `TypedSlabReference::inline(v).get()` is the identity for any
    /// fundamental `i64`, with no manager needed.
    #[test]
    fn inline_typed_reference_is_identity(value: i64) {
        let r: TypedSlabReference<i64> = TypedSlabReference::inline(value);
        prop_assert_eq!(r.get(), value);
    }

    /// A value stored through a slab list and read back lazily equals the
    /// original, for any `i64` (SPEC_FULL §3, "typed slab reference").
    #[test]
    fn lazy_typed_reference_roundtrips_through_a_slab(value: i64) {
        let manager = Arc::new(
            SlabManager::create(SlabStoreKind::InMemory, SlabStoreSize::Tiny, 1).expect("manager"),
        );
        let mut writer = SlabListWriter::new(manager.clone()).expect("writer");
        let stored: TypedSlabReference<i64> =
            TypedSlabReference::store(manager, &mut writer, &value).expect("store");
        prop_assert_eq!(stored.get(), value);
    }
}
