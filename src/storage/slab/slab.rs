//! The slab itself: a 2 MiB-aligned contiguous region of mapped memory
//! (SPEC_FULL §3, §4.7).

/// Every slab is exactly this many bytes, aligned to its own size.
pub const SLAB_SIZE: u64 = 2 * 1024 * 1024;

/// 8-byte forward pointer (displacement from slab base) + 4-byte used-bytes
/// cursor precede every slab's payload (SPEC_FULL §6, "Persistent on-disk
/// layout").
pub const SLAB_HEADER_SIZE: u64 = 8 + 4;

pub const SLAB_PAYLOAD_SIZE: u64 = SLAB_SIZE - SLAB_HEADER_SIZE;

/// The coarse size scale a `SlabManager` is created with, bounding the total
/// address range it reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlabStoreSize {
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
}

impl SlabStoreSize {
    /// Address-range size in bytes: 1 GiB .. 4 TiB.
    pub fn address_range_bytes(self) -> u64 {
        const GIB: u64 = 1024 * 1024 * 1024;
        match self {
            SlabStoreSize::Tiny => GIB,
            SlabStoreSize::Small => 16 * GIB,
            SlabStoreSize::Medium => 256 * GIB,
            SlabStoreSize::Large => 1024 * GIB,
            SlabStoreSize::Huge => 4 * 1024 * GIB,
        }
    }
}

/// Whether the manager's address range is anonymous (in-memory only) or
/// backed by a file on disk.
#[derive(Debug, Clone)]
pub enum SlabStoreKind {
    InMemory,
    FileBacked { path: std::path::PathBuf },
}

/// A slab's identity is its base address within the manager's mapped range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlabAddress(pub u64);

impl SlabAddress {
    /// The ref-count projection from SPEC_FULL invariant 6: a slab
    /// reference's implicit reference count is obtained by projecting its
    /// address onto the containing slab's base.
    pub fn containing_slab(self) -> SlabAddress {
        SlabAddress((self.0 / SLAB_SIZE) * SLAB_SIZE)
    }

    pub fn offset_within_slab(self) -> u64 {
        self.0 % SLAB_SIZE
    }
}

/// Lifecycle state of one slab within the manager's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlabLifecycle {
    /// Currently being written; not yet linked into any slab list.
    Open,
    /// Linked into a live slab list with a non-zero reference count (or
    /// marked persistent).
    Allocated,
    /// On the free list, available for reuse.
    Free,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_slab_rounds_down_to_slab_boundary() {
        let addr = SlabAddress(SLAB_SIZE * 3 + 128);
        assert_eq!(addr.containing_slab(), SlabAddress(SLAB_SIZE * 3));
        assert_eq!(addr.offset_within_slab(), 128);
    }

    #[test]
    fn huge_range_is_largest() {
        assert!(SlabStoreSize::Huge.address_range_bytes() > SlabStoreSize::Tiny.address_range_bytes());
    }
}
