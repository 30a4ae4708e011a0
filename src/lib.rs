//! oxidesc - Compact binary I/O descriptors for a key-addressed object store
//!
//! This crate implements the descriptor protocol used to batch record-level
//! fetch and update operations across a boundary where only flat memory
//! buffers can be exchanged: one side encodes the batch into a Description
//! Buffer, an opaque external engine decodes it, moves payload bytes through
//! per-entry Data Buffers, and writes result metadata back into the same
//! region.
//!
//! # Features
//!
//! - Two-phase encoding: a first-time encode writes every field; reuse
//!   encodes rewrite only what changed and skip invariant slots, so a
//!   descriptor serves many call cycles without reallocating any buffer
//! - Precomputed buffer geometry: every buffer length is known at
//!   construction, before any key or payload exists
//! - Handle-based wire format: data buffers are addressed by opaque handles
//!   resolved through a side table, never by raw memory addresses
//! - Deterministic, idempotent teardown with explicit engine notification
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use oxidesc::{FetchDescriptor, UpdateDescriptor};
//!
//! // Update two records under one top key
//! let mut desc = UpdateDescriptor::new(8, 2, 4096)?;
//! desc.set_top_key("dk01")?;
//! desc.entry_buffer(0)?.put_slice(b"hello");
//! desc.set_entry(0, Some("ak01"), 0)?;
//! desc.encode()?;
//! desc.execute(&mut engine)?;
//! assert!(desc.is_succeeded());
//!
//! // Reuse the same descriptor for the next call
//! desc.reuse()?;
//! ```

#![warn(missing_docs)]

pub mod buffer;
pub mod config;
pub mod desc;
pub mod engine;
pub mod entry;
pub mod error;
pub mod keys;
pub mod pool;

// Re-exports for convenience
pub use buffer::IoBuffer;
pub use desc::{FetchDescriptor, IoDescriptor, UpdateDescriptor};
pub use engine::{BufferHandle, EngineError, EngineRequest, ObjectEngine};
pub use entry::{Entry, Mode};
pub use error::{DescError, Result};

/// Wire-layout constants shared with engine implementations.
pub mod constants {
    /// Width of the native descriptor handle slot at offset 0.
    pub const NATIVE_HANDLE_BYTES: usize = 8;

    /// Width of a key-length or entry-count field.
    pub const LEN_FIELD_BYTES: usize = 2;

    /// Width of an offset or payload-size field.
    pub const RANGE_FIELD_BYTES: usize = 4;

    /// Width of a data-buffer handle slot.
    pub const HANDLE_SLOT_BYTES: usize = 8;

    /// Width of one actual-size slot in the fetch result region.
    pub const ACTUAL_SIZE_BYTES: usize = 4;

    /// Bytes each key character (UTF-16 unit) occupies on the wire.
    pub const BYTES_PER_KEY_CHAR: usize = 2;
}

/// Prelude module for common imports
pub mod prelude {
    pub use crate::buffer::IoBuffer;
    pub use crate::desc::{FetchDescriptor, IoDescriptor, UpdateDescriptor};
    pub use crate::engine::{BufferHandle, EngineRequest, ObjectEngine};
    pub use crate::entry::{Entry, Mode};
    pub use crate::error::{DescError, Result};
}
