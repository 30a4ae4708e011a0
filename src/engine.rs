//! Boundary layer between descriptors and the external storage engine.
//!
//! The engine is an opaque collaborator: it receives the encoded Description
//! Buffer, performs the batched operation, and writes result metadata and
//! payload back into the same buffers. The wire format never carries raw
//! memory addresses; each entry's 8-byte slot holds a [`BufferHandle`], an
//! opaque id resolved through the descriptor's [`HandleTable`]. Translating
//! handles into raw pointers for a native engine happens only in the [`raw`]
//! submodule.

use std::num::NonZeroU64;

use thiserror::Error;

use crate::buffer::IoBuffer;
use crate::entry::Mode;

/// Errors reported by an external engine call or by handle resolution.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The engine rejected or failed the batched operation.
    #[error("engine rejected the request: {0}")]
    Rejected(String),

    /// I/O failure inside the engine.
    #[error("engine i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A data-buffer handle did not resolve, or its buffer was released.
    #[error("unknown or released buffer handle {0}")]
    UnknownHandle(u64),

    /// The engine could not decode the Description Buffer.
    #[error("malformed description buffer: {0}")]
    MalformedDescriptor(String),
}

/// Opaque, non-zero id of one entry's Data Buffer.
///
/// Handles are assigned when a descriptor is constructed and never change,
/// so the 8-byte wire slot they occupy stays valid across reuse cycles
/// without being rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(NonZeroU64);

impl BufferHandle {
    /// Handle for the entry at `index`. Handles are dense: index 0 maps to
    /// handle 1, and so on, keeping 0 free as the "no handle" wire value.
    pub(crate) fn from_index(index: usize) -> Self {
        Self(NonZeroU64::MIN.saturating_add(index as u64))
    }

    /// Reconstruct a handle from its wire value. Returns `None` for zero.
    pub fn from_wire(value: u64) -> Option<Self> {
        NonZeroU64::new(value).map(Self)
    }

    /// The value written into the 8-byte wire slot.
    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// The entry index this handle denotes.
    #[inline]
    pub(crate) fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

/// Side table mapping [`BufferHandle`]s to entry slots for one descriptor.
#[derive(Debug, Clone, Copy)]
pub struct HandleTable {
    count: usize,
}

impl HandleTable {
    pub(crate) fn with_capacity(count: usize) -> Self {
        Self { count }
    }

    /// Handle of the entry at `index`, or `None` past the table's end.
    pub fn handle(&self, index: usize) -> Option<BufferHandle> {
        (index < self.count).then(|| BufferHandle::from_index(index))
    }

    /// Entry index a handle denotes, or `None` if it is not in this table.
    pub fn resolve(&self, handle: BufferHandle) -> Option<usize> {
        let index = handle.index();
        (index < self.count).then_some(index)
    }

    /// Number of slots in the table.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// One engine call's view of a descriptor: the encoded Description Buffer
/// plus handle-addressed access to the entries' Data Buffers.
pub struct EngineRequest<'a> {
    mode: Mode,
    request_len: usize,
    table: HandleTable,
    desc: &'a mut IoBuffer,
    data: Vec<Option<&'a mut IoBuffer>>,
}

impl<'a> EngineRequest<'a> {
    pub(crate) fn new(
        mode: Mode,
        request_len: usize,
        table: HandleTable,
        desc: &'a mut IoBuffer,
        data: Vec<Option<&'a mut IoBuffer>>,
    ) -> Self {
        Self {
            mode,
            request_len,
            table,
            desc,
            data,
        }
    }

    /// Whether the batched operation is an update or a fetch.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Length of the request region. For fetch descriptors the result region
    /// starts at exactly this offset within the Description Buffer.
    #[inline]
    pub fn request_len(&self) -> usize {
        self.request_len
    }

    /// Number of entry slots (active or not) behind this request.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.data.len()
    }

    /// The Description Buffer.
    #[inline]
    pub fn descriptor(&mut self) -> &mut IoBuffer {
        self.desc
    }

    /// Full byte view of the Description Buffer.
    #[inline]
    pub fn descriptor_bytes(&mut self) -> &mut [u8] {
        self.desc.as_mut_slice()
    }

    /// Resolve a handle read from the wire to its Data Buffer.
    pub fn data_buffer(&mut self, handle: BufferHandle) -> Result<&mut IoBuffer, EngineError> {
        let index = self
            .table
            .resolve(handle)
            .ok_or(EngineError::UnknownHandle(handle.get()))?;
        match self.data.get_mut(index) {
            Some(Some(buffer)) => Ok(buffer),
            _ => Err(EngineError::UnknownHandle(handle.get())),
        }
    }
}

/// The external engine the protocol batches operations against.
///
/// Implementations decode the Description Buffer per the wire layout, move
/// payload bytes, write per-entry actual sizes into the result region (fetch
/// only), and write a non-zero native handle into the buffer's first eight
/// bytes if they allocate engine-side state that needs explicit release.
pub trait ObjectEngine {
    /// Perform the batched operation described by `request`.
    fn execute(&mut self, request: EngineRequest<'_>) -> Result<(), EngineError>;

    /// Release engine-side state previously advertised through a non-zero
    /// native handle. Must tolerate handles it no longer knows.
    fn release_descriptor(&mut self, native_handle: u64);
}

pub mod raw {
    //! Raw-pointer resolution for native engines.
    //!
    //! This is the only place where buffer handles become addresses. A
    //! native engine binding resolves each handle it reads from the wire to
    //! a [`RawRegion`] and passes the pointer across the FFI boundary; the
    //! core protocol never sees an address.

    use super::{BufferHandle, EngineError, EngineRequest};

    /// A raw view of one buffer: base pointer and capacity in bytes.
    ///
    /// The pointer is valid only while the originating [`EngineRequest`]
    /// (and therefore the descriptor's borrow) is alive. Reading or writing
    /// through it is `unsafe` FFI territory; the engine must stay within
    /// `len` bytes.
    #[derive(Debug, Clone, Copy)]
    pub struct RawRegion {
        /// Base address of the region.
        pub ptr: *mut u8,
        /// Capacity of the region in bytes.
        pub len: usize,
    }

    /// Raw view of the Description Buffer.
    pub fn descriptor_region(request: &mut EngineRequest<'_>) -> RawRegion {
        let bytes = request.descriptor_bytes();
        RawRegion {
            ptr: bytes.as_mut_ptr(),
            len: bytes.len(),
        }
    }

    /// Raw view of the Data Buffer behind `handle`.
    pub fn data_region(
        request: &mut EngineRequest<'_>,
        handle: BufferHandle,
    ) -> Result<RawRegion, EngineError> {
        let buffer = request.data_buffer(handle)?;
        let bytes = buffer.as_mut_slice();
        Ok(RawRegion {
            ptr: bytes.as_mut_ptr(),
            len: bytes.len(),
        })
    }
}
