//! Fatal storage-runtime error conditions (SPEC_FULL §7, §10).
//!
//! Per the error-handling design, these are the *only* conditions the slab
//! runtime propagates as `Result::Err` rather than as an ordinary
//! three-way/boolean branch: they represent states from which the
//! allocator's invariants cannot be recovered in-process. Tuple-state
//! checks, checker booleans, and safe-reader bounds flags are deliberately
//! *not* modeled here — see [`crate::cfg::operation::OperationKind`] and
//! [`ReaderStatus`](super::list::ReaderStatus).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlabError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("slab address space exhausted (store size {store_size} bytes)")]
    AddressSpaceExhausted { store_size: u64 },

    #[error("slab size mismatch: expected {expected} bytes, found {found}")]
    SlabSizeMismatch { expected: u64, found: u64 },

    #[error("corrupt super-block: {reason}")]
    CorruptSuperBlock { reason: String },
}

pub type SlabResult<T> = Result<T, SlabError>;
