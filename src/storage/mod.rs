//! Storage Module
//!
//! The slab-based persistent storage runtime (SPEC_FULL §4.6-§4.8): a
//! custom allocator with content-addressed serialization and typed
//! references into discontiguous byte storage. Tables, indices, and
//! vectors produced by the control-flow IR (`crate::cfg`) are realized at
//! runtime as slab-backed structures from this module.

pub mod slab;
