//! The slab manager: an mmap-backed, fixed-size slab allocator (SPEC_FULL
//! §4.7, §5).
//!
//! Allocation and free-list bookkeeping are the one piece of the storage
//! runtime that must be serialized across workers (SPEC_FULL §5); everything
//! else a worker does to a slab it already owns needs no lock. We use
//! `parking_lot::Mutex` for that bookkeeping, consistent with the slab lock
//! `Mutable<T>` writes take (see [`super::reference::Mutable`]).

use crate::storage::slab::error::{SlabError, SlabResult};
use crate::storage::slab::slab::{SlabAddress, SlabLifecycle, SlabStoreKind, SlabStoreSize, SLAB_SIZE};
use memmap2::{MmapMut, MmapOptions};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::OpenOptions;

struct Bookkeeping {
    /// High-water mark of the next never-before-allocated slab, relative to
    /// the mapping's base.
    next_fresh_offset: u64,
    free_list: Vec<SlabAddress>,
    lifecycle: BTreeMap<SlabAddress, SlabLifecycle>,
    /// Slabs excluded from reference-count collection (SPEC_FULL §3, §4.7).
    persistent: std::collections::BTreeSet<SlabAddress>,
    /// Implicit reference counts for non-persistent slabs (SPEC_FULL
    /// invariant 6).
    ref_counts: BTreeMap<SlabAddress, u32>,
}

/// Owns one mmap-ed address range and the allocator state over it.
pub struct SlabManager {
    mmap: Mutex<MmapMut>,
    range_bytes: u64,
    book: Mutex<Bookkeeping>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SlabStats {
    pub num_allocated_slabs: u64,
    pub num_free_slabs: u64,
    pub num_open_slabs: u64,
}

impl SlabManager {
    /// Create a manager sized per `size` and backed per `kind`.
    pub fn create(kind: SlabStoreKind, size: SlabStoreSize, _num_workers: usize) -> SlabResult<Self> {
        let range_bytes = size.address_range_bytes();
        let mmap = match kind {
            SlabStoreKind::InMemory => MmapOptions::new().len(range_bytes as usize).map_anon()?,
            SlabStoreKind::FileBacked { path } => {
                let file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;
                file.set_len(range_bytes)?;
                // SAFETY: the file is exclusively owned by this manager for
                // its lifetime; concurrent external mutation is outside the
                // contract this runtime makes (as with any mmap-backed
                // store).
                unsafe { MmapOptions::new().map_mut(&file)? }
            }
        };

        tracing::debug!(range_bytes, "slab manager created");

        Ok(SlabManager {
            mmap: Mutex::new(mmap),
            range_bytes,
            book: Mutex::new(Bookkeeping {
                next_fresh_offset: 0,
                free_list: Vec::new(),
                lifecycle: BTreeMap::new(),
                persistent: std::collections::BTreeSet::new(),
                ref_counts: BTreeMap::new(),
            }),
        })
    }

    /// Allocate a fresh 2 MiB slab, reusing a freed slab if one is
    /// available. Returns the slab's base address.
    pub fn allocate(&self) -> SlabResult<SlabAddress> {
        let mut book = self.book.lock();
        let addr = if let Some(reused) = book.free_list.pop() {
            reused
        } else {
            let offset = book.next_fresh_offset;
            if offset + SLAB_SIZE > self.range_bytes {
                tracing::error!(store_size = self.range_bytes, "slab address space exhausted");
                return Err(SlabError::AddressSpaceExhausted { store_size: self.range_bytes });
            }
            book.next_fresh_offset += SLAB_SIZE;
            SlabAddress(offset)
        };
        book.lifecycle.insert(addr, SlabLifecycle::Open);
        book.ref_counts.insert(addr, 0);
        Ok(addr)
    }

    /// Mark a slab as allocated (linked into a live slab list) after its
    /// header has been written.
    pub fn finalize_open(&self, addr: SlabAddress) {
        let mut book = self.book.lock();
        book.lifecycle.insert(addr, SlabLifecycle::Allocated);
    }

    pub fn mark_persistent(&self, addr: SlabAddress) {
        let mut book = self.book.lock();
        book.persistent.insert(addr);
    }

    pub fn incref(&self, addr: SlabAddress) {
        let containing = addr.containing_slab();
        let mut book = self.book.lock();
        if book.persistent.contains(&containing) {
            return;
        }
        *book.ref_counts.entry(containing).or_insert(0) += 1;
    }

    /// Decrement a slab's reference count; returns it to the free list when
    /// it drops to zero, unless the slab is persistent (SPEC_FULL invariant
    /// 6).
    pub fn decref(&self, addr: SlabAddress) {
        let containing = addr.containing_slab();
        let mut book = self.book.lock();
        if book.persistent.contains(&containing) {
            return;
        }
        if let Some(count) = book.ref_counts.get_mut(&containing) {
            if *count > 0 {
                *count -= 1;
            }
            if *count == 0 {
                book.lifecycle.insert(containing, SlabLifecycle::Free);
                book.free_list.push(containing);
            }
        }
    }

    /// Walk all persistent slab lists and free any non-persistent slab
    /// whose reference count has reached zero but was not yet reclaimed
    /// (SPEC_FULL §4.7). In this implementation ref-count decrements
    /// reclaim eagerly, so `garbage_collect` is a sweep that reconciles any
    /// slabs whose owning reference was dropped without an explicit
    /// `decref` (e.g. after a crash-recovery replay) and reports how many
    /// it reclaimed.
    pub fn garbage_collect(&self) -> u64 {
        let mut book = self.book.lock();
        let mut reclaimed = 0u64;
        let stale: Vec<SlabAddress> = book
            .ref_counts
            .iter()
            .filter(|(addr, &count)| count == 0 && !book.persistent.contains(addr))
            .map(|(addr, _)| *addr)
            .filter(|addr| book.lifecycle.get(addr) == Some(&SlabLifecycle::Allocated))
            .collect();
        for addr in stale {
            book.lifecycle.insert(addr, SlabLifecycle::Free);
            book.free_list.push(addr);
            reclaimed += 1;
        }
        if reclaimed > 0 {
            tracing::warn!(reclaimed, "garbage collection freed slabs");
        }
        reclaimed
    }

    pub fn stats(&self) -> SlabStats {
        let book = self.book.lock();
        let mut stats = SlabStats::default();
        for lifecycle in book.lifecycle.values() {
            match lifecycle {
                SlabLifecycle::Open => stats.num_open_slabs += 1,
                SlabLifecycle::Allocated => stats.num_allocated_slabs += 1,
                SlabLifecycle::Free => stats.num_free_slabs += 1,
            }
        }
        stats
    }

    /// Read `len` bytes at `addr` from the mapped range.
    pub fn read_at(&self, addr: SlabAddress, len: usize) -> Vec<u8> {
        let mmap = self.mmap.lock();
        let start = addr.0 as usize;
        mmap[start..start + len].to_vec()
    }

    /// Write `bytes` at `addr`, bounds-checked against the mapped range.
    ///
    /// The caller holds the scoped slab lock implied by taking `&self` and
    /// serializing through this one entry point; `Mutable<T>` in-place
    /// writes (SPEC_FULL §5) go through this same path.
    pub fn write_at(&self, addr: SlabAddress, bytes: &[u8]) {
        let mut mmap = self.mmap.lock();
        let start = addr.0 as usize;
        mmap[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SlabManager {
        SlabManager::create(SlabStoreKind::InMemory, SlabStoreSize::Tiny, 1).unwrap()
    }

    #[test]
    fn fresh_allocations_are_slab_aligned() {
        let m = manager();
        let a = m.allocate().unwrap();
        let b = m.allocate().unwrap();
        assert_eq!(a.0 % SLAB_SIZE, 0);
        assert_eq!(b.0 - a.0, SLAB_SIZE);
    }

    #[test]
    fn decref_to_zero_frees_and_reallocate_reuses() {
        let m = manager();
        let a = m.allocate().unwrap();
        m.finalize_open(a);
        m.incref(a);
        m.decref(a);
        let stats = m.stats();
        assert_eq!(stats.num_free_slabs, 1);

        let b = m.allocate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn persistent_slabs_ignore_decref() {
        let m = manager();
        let a = m.allocate().unwrap();
        m.finalize_open(a);
        m.mark_persistent(a);
        m.incref(a);
        m.decref(a);
        m.decref(a);
        assert_eq!(m.stats().num_free_slabs, 0);
    }

    #[test]
    fn write_then_read_round_trips() {
        let m = manager();
        let a = m.allocate().unwrap();
        m.write_at(a, &[1, 2, 3, 4]);
        assert_eq!(m.read_at(a, 4), vec![1, 2, 3, 4]);
    }
}
