//! A slab list: a singly-linked chain of slabs forming one append-only byte
//! stream (SPEC_FULL §3, §4.7).
//!
//! Four cooperating types walk this stream: a bounds-checked
//! [`SlabListWriter`]/[`SlabListReader`] pair for the common case, and an
//! [`UnsafeSlabListWriter`]/[`UnsafeSlabListReader`] pair for callers that
//! have already proven (typically via a preceding `ByteCountingWriter` pass)
//! exactly how many bytes they are about to move.

use crate::storage::slab::manager::SlabManager;
use crate::storage::slab::slab::{SlabAddress, SLAB_HEADER_SIZE, SLAB_PAYLOAD_SIZE, SLAB_SIZE};
use std::sync::Arc;

/// A (first, last) pair of slab addresses: the identity of one logical
/// append-only byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlabList {
    pub first: SlabAddress,
    pub last: SlabAddress,
}

fn read_header(manager: &SlabManager, slab: SlabAddress) -> (u64, u32) {
    let bytes = manager.read_at(slab, SLAB_HEADER_SIZE as usize);
    let fwd = u64::from_le_bytes(bytes[0..8].try_into().unwrap());
    let used = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
    (fwd, used)
}

fn write_header(manager: &SlabManager, slab: SlabAddress, forward: u64, used: u32) {
    let mut bytes = [0u8; SLAB_HEADER_SIZE as usize];
    bytes[0..8].copy_from_slice(&forward.to_le_bytes());
    bytes[8..12].copy_from_slice(&used.to_le_bytes());
    manager.write_at(slab, &bytes);
}

fn payload_addr(slab: SlabAddress, offset_in_payload: u64) -> SlabAddress {
    SlabAddress(slab.0 + SLAB_HEADER_SIZE + offset_in_payload)
}

/// Bounds-checked writer: rotates to a new slab whenever the current one is
/// exhausted, validating remaining capacity on every write.
pub struct SlabListWriter {
    manager: Arc<SlabManager>,
    first: SlabAddress,
    current: SlabAddress,
    cursor: u64,
}

impl SlabListWriter {
    pub fn new(manager: Arc<SlabManager>) -> crate::storage::slab::error::SlabResult<Self> {
        let first = manager.allocate()?;
        write_header(&manager, first, 0, 0);
        manager.finalize_open(first);
        Ok(SlabListWriter { manager, first, current: first, cursor: 0 })
    }

    pub fn list(&self) -> SlabList {
        SlabList { first: self.first, last: self.current }
    }

    /// The address the next byte written by [`Self::write_bytes`] will land
    /// at, assuming it fits in the current slab (true immediately after a
    /// rotation, and true for any write small enough not to trigger one).
    /// Used by [`super::reference::TypedSlabReference::store`] to record
    /// where a value's bytes begin.
    pub fn current_address(&self) -> SlabAddress {
        payload_addr(self.current, self.cursor)
    }

    /// Reopens a writer positioned at the true tail of an already-written
    /// list, by walking forward pointers from `list.first` (SPEC_FULL §6,
    /// "Restart"). `list.last` is used as a hint but not trusted blindly,
    /// since a writer can be reopened after a crash mid-append.
    pub fn reopen(manager: Arc<SlabManager>, list: SlabList) -> Self {
        let mut current = list.first;
        let mut used;
        loop {
            let (fwd, u) = read_header(&manager, current);
            used = u;
            if fwd == 0 {
                break;
            }
            current = SlabAddress(fwd);
        }
        SlabListWriter { manager, first: list.first, current, cursor: used as u64 }
    }

    fn remaining(&self) -> u64 {
        SLAB_PAYLOAD_SIZE - self.cursor
    }

    /// Allocate a new slab, link it from the current slab's forward
    /// pointer, and make it current.
    fn rotate(&mut self) -> crate::storage::slab::error::SlabResult<()> {
        let next = self.manager.allocate()?;
        write_header(&self.manager, next, 0, 0);
        self.manager.finalize_open(next);
        write_header(&self.manager, self.current, next.0, self.cursor as u32);
        self.current = next;
        self.cursor = 0;
        Ok(())
    }

    /// Append `bytes`, splitting across slab boundaries as needed.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> crate::storage::slab::error::SlabResult<()> {
        let mut remaining_bytes = bytes;
        while !remaining_bytes.is_empty() {
            let room = self.remaining();
            if room == 0 {
                self.rotate()?;
                continue;
            }
            let chunk_len = room.min(remaining_bytes.len() as u64) as usize;
            let (chunk, rest) = remaining_bytes.split_at(chunk_len);
            let addr = payload_addr(self.current, self.cursor);
            self.manager.write_at(addr, chunk);
            self.cursor += chunk_len as u64;
            write_header(&self.manager, self.current, 0, self.cursor as u32);
            remaining_bytes = rest;
        }
        Ok(())
    }

    /// Advance the write cursor by `n` bytes without writing (used to
    /// reserve space the caller will fill via a later `Mutable<T>` write).
    pub fn skip(&mut self, n: u64) -> crate::storage::slab::error::SlabResult<()> {
        let zeros = vec![0u8; n as usize];
        self.write_bytes(&zeros)
    }
}

/// Unsafe writer: the caller has already computed (typically via
/// `ByteCountingWriter`) exactly how many bytes remain in the current slab
/// and guarantees no rotation is needed for this write. Skipping the
/// rotation check removes the branch from the hot append path; calling it
/// when the claim is false writes past the slab's logical payload into the
/// next slab's header, corrupting the list.
pub struct UnsafeSlabListWriter<'a> {
    inner: &'a mut SlabListWriter,
}

impl<'a> UnsafeSlabListWriter<'a> {
    pub fn new(inner: &'a mut SlabListWriter) -> Self {
        UnsafeSlabListWriter { inner }
    }

    /// # Safety
    /// `bytes.len()` must be less than or equal to the number of bytes
    /// remaining in the writer's current slab.
    pub unsafe fn write_bytes_unchecked(&mut self, bytes: &[u8]) {
        let addr = payload_addr(self.inner.current, self.inner.cursor);
        self.inner.manager.write_at(addr, bytes);
        self.inner.cursor += bytes.len() as u64;
        write_header(&self.inner.manager, self.inner.current, 0, self.inner.cursor as u32);
    }

    pub fn remaining_in_slab(&self) -> u64 {
        self.inner.remaining()
    }
}

/// Whether a bounds-checked reader observed an out-of-range access. The
/// caller is expected to check this before trusting the last value read
/// (SPEC_FULL §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderStatus {
    Ok,
    OutOfBounds,
}

/// Bounds-checked reader: walks the slab list from `first`, rejoining across
/// slab boundaries by following forward pointers, and never reads past a
/// slab's reported used-bytes cursor.
pub struct SlabListReader {
    manager: Arc<SlabManager>,
    current: SlabAddress,
    cursor: u64,
    status: ReaderStatus,
}

impl SlabListReader {
    pub fn new(manager: Arc<SlabManager>, list: SlabList) -> Self {
        SlabListReader { manager, current: list.first, cursor: 0, status: ReaderStatus::Ok }
    }

    pub fn status(&self) -> ReaderStatus {
        self.status
    }

    pub fn is_ok(&self) -> bool {
        self.status == ReaderStatus::Ok
    }

    /// True if more data has been written into the current slab beyond the
    /// reader's cursor (does not imply there is more data in a slab not yet
    /// linked).
    pub fn soft_has_more(&self) -> bool {
        let (_, used) = read_header(&self.manager, self.current);
        self.cursor < used as u64
    }

    /// True if there is more data anywhere ahead, including across a slab
    /// boundary this reader has not yet crossed.
    pub fn hard_has_more(&self) -> bool {
        if self.soft_has_more() {
            return true;
        }
        let (fwd, _) = read_header(&self.manager, self.current);
        fwd != 0
    }

    fn advance_if_exhausted(&mut self) {
        while !self.soft_has_more() {
            let (fwd, _) = read_header(&self.manager, self.current);
            if fwd == 0 {
                return;
            }
            self.current = SlabAddress(fwd);
            self.cursor = 0;
        }
    }

    /// Read exactly `len` bytes, crossing slab boundaries transparently.
    /// Sets `status` to `OutOfBounds` and returns a zero-filled buffer if
    /// fewer than `len` bytes are actually available.
    pub fn read_bytes(&mut self, len: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(len);
        let mut remaining = len;
        while remaining > 0 {
            self.advance_if_exhausted();
            let (_, used) = read_header(&self.manager, self.current);
            let available = (used as u64).saturating_sub(self.cursor);
            if available == 0 {
                self.status = ReaderStatus::OutOfBounds;
                out.resize(len, 0);
                return out;
            }
            let take = available.min(remaining as u64) as usize;
            let addr = payload_addr(self.current, self.cursor);
            out.extend_from_slice(&self.manager.read_at(addr, take));
            self.cursor += take as u64;
            remaining -= take;
        }
        out
    }
}

/// Unsafe reader: trusts the caller's claimed length without checking the
/// slab's used-bytes cursor, and does not rejoin across a slab boundary.
/// Used when `CanReadUnsafely` has already established the read stays within
/// one already-fully-written slab.
pub struct UnsafeSlabListReader<'a> {
    inner: &'a SlabListReader,
}

impl<'a> UnsafeSlabListReader<'a> {
    pub fn new(inner: &'a SlabListReader) -> Self {
        UnsafeSlabListReader { inner }
    }

    /// Whether the next `len` bytes are known to lie within the current
    /// slab without crossing a boundary, making an unchecked read safe.
    pub fn can_read_unsafely(&self, len: u64) -> bool {
        let remaining_in_slab = SLAB_PAYLOAD_SIZE - self.inner.cursor;
        remaining_in_slab >= len
    }

    /// # Safety
    /// `can_read_unsafely(len)` must have returned `true` for this exact
    /// `len` with no intervening mutation of `inner`'s cursor.
    pub unsafe fn read_bytes_unchecked(&self, len: usize) -> Vec<u8> {
        let addr = payload_addr(self.inner.current, self.inner.cursor);
        self.inner.manager.read_at(addr, len)
    }
}

/// Copy every byte of `src` into a freshly created list owned by `dst_manager`.
/// Used when migrating a slab list across managers (e.g. compaction).
pub fn transfer_data(
    src_manager: &Arc<SlabManager>,
    src: SlabList,
    dst_manager: Arc<SlabManager>,
) -> crate::storage::slab::error::SlabResult<SlabList> {
    let mut reader = SlabListReader::new(src_manager.clone(), src);
    let mut writer = SlabListWriter::new(dst_manager)?;
    loop {
        reader.advance_if_exhausted();
        let (_, used) = read_header(&reader.manager, reader.current);
        let available = (used as u64).saturating_sub(reader.cursor);
        if available > 0 {
            let chunk = reader.read_bytes(available as usize);
            writer.write_bytes(&chunk)?;
        }
        if !reader.hard_has_more() {
            break;
        }
    }
    Ok(writer.list())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::slab::slab::{SlabStoreKind, SlabStoreSize};

    fn manager() -> Arc<SlabManager> {
        Arc::new(SlabManager::create(SlabStoreKind::InMemory, SlabStoreSize::Tiny, 1).unwrap())
    }

    #[test]
    fn write_then_read_within_one_slab() {
        let m = manager();
        let mut w = SlabListWriter::new(m.clone()).unwrap();
        w.write_bytes(b"hello world").unwrap();

        let mut r = SlabListReader::new(m, w.list());
        assert_eq!(r.read_bytes(11), b"hello world");
        assert!(r.is_ok());
    }

    #[test]
    fn write_across_slab_boundary_rejoins_on_read() {
        let m = manager();
        let mut w = SlabListWriter::new(m.clone()).unwrap();
        let payload = vec![7u8; (SLAB_PAYLOAD_SIZE + 1000) as usize];
        w.write_bytes(&payload).unwrap();
        assert_ne!(w.list().first, w.list().last);

        let mut r = SlabListReader::new(m, w.list());
        let read_back = r.read_bytes(payload.len());
        assert_eq!(read_back, payload);
        assert!(r.is_ok());
    }

    #[test]
    fn reading_past_end_sets_out_of_bounds() {
        let m = manager();
        let mut w = SlabListWriter::new(m.clone()).unwrap();
        w.write_bytes(b"abc").unwrap();

        let mut r = SlabListReader::new(m, w.list());
        let _ = r.read_bytes(10);
        assert_eq!(r.status(), ReaderStatus::OutOfBounds);
    }

    #[test]
    fn unsafe_writer_matches_safe_writer_when_capacity_is_correct() {
        let m = manager();
        let mut w = SlabListWriter::new(m.clone()).unwrap();
        {
            let mut unsafe_w = UnsafeSlabListWriter::new(&mut w);
            assert!(unsafe_w.remaining_in_slab() >= 5);
            unsafe { unsafe_w.write_bytes_unchecked(b"abcde") };
        }
        let mut r = SlabListReader::new(m, w.list());
        assert_eq!(r.read_bytes(5), b"abcde");
    }
}
