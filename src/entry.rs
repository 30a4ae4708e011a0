//! Per-akey entries of an I/O descriptor.
//!
//! An [`Entry`] describes one contiguous record range under the
//! descriptor's top key: the entry key (akey), the record offset, the
//! payload size, and the owned Data Buffer carrying the payload (update) or
//! receiving it (fetch). Entries know how to encode themselves into the
//! Description Buffer and how to reuse a prior encoding slot.
//!
//! Wire footprint per entry, identical regardless of content:
//!
//! ```text
//! 2 bytes   key length (encoded bytes)
//! N bytes   key slot (N = max_key_encoded_len, cursor-padded)
//! 4 bytes   record offset
//! 4 bytes   payload size
//! 8 bytes   data-buffer handle (invariant; skipped on reuse encode)
//! ```

use std::fmt;

use crate::buffer::IoBuffer;
use crate::engine::BufferHandle;
use crate::error::{DescError, Result};
use crate::keys;

/// Whether a descriptor (and all of its entries) updates records or fetches
/// them. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Payloads flow from the Data Buffers into the store.
    Update,
    /// Payloads flow from the store into the Data Buffers.
    Fetch,
}

impl Mode {
    /// Whether this is update mode.
    #[inline]
    pub fn is_update(self) -> bool {
        matches!(self, Mode::Update)
    }

    /// Whether this is fetch mode.
    #[inline]
    pub fn is_fetch(self) -> bool {
        matches!(self, Mode::Fetch)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Update => "update",
            Mode::Fetch => "fetch",
        })
    }
}

/// One record range of a descriptor: entry key, offset, size, Data Buffer.
///
/// Entries are created by their descriptor and live for its lifetime. The
/// Data Buffer is allocated once and never reallocated; its capacity bounds
/// every payload this entry can carry.
#[derive(Debug)]
pub struct Entry {
    key: Option<String>,
    key_encoded_len: u16,
    key_changed: bool,
    offset: u32,
    data_size: u32,
    data_buffer: Option<IoBuffer>,
    handle: BufferHandle,
    mode: Mode,
    max_key_encoded_len: u16,
    actual_size: u32,
    active: bool,
}

impl Entry {
    pub(crate) fn new(
        mode: Mode,
        buffer_capacity: usize,
        max_key_encoded_len: u16,
        handle: BufferHandle,
    ) -> Self {
        Self {
            key: None,
            key_encoded_len: 0,
            key_changed: false,
            offset: 0,
            data_size: 0,
            data_buffer: Some(IoBuffer::zeroed(buffer_capacity)),
            handle,
            mode,
            max_key_encoded_len,
            actual_size: 0,
            active: false,
        }
    }

    /// The entry key, if one has been assigned.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Record offset for the current call.
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Payload size requested for the current call.
    #[inline]
    pub fn request_size(&self) -> u32 {
        self.data_size
    }

    /// Handle the engine uses to address this entry's Data Buffer.
    #[inline]
    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    /// Whether this entry carries data for the current call.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Fixed encoded footprint of this entry in the Description Buffer.
    #[inline]
    pub fn desc_len(&self) -> usize {
        // key len(2) + key slot + offset(4) + size(4) + handle(8)
        18 + usize::from(self.max_key_encoded_len)
    }

    /// The Data Buffer, unless it has been released.
    pub fn data_buffer(&self) -> Option<&IoBuffer> {
        self.data_buffer.as_ref()
    }

    pub(crate) fn data_buffer_mut(&mut self) -> Option<&mut IoBuffer> {
        self.data_buffer.as_mut()
    }

    /// Clear the Data Buffer's cursors and hand it back for refilling.
    ///
    /// Call this before staging a new update payload; the buffer keeps its
    /// capacity and identity, so the engine-side handle stays valid.
    pub fn reuse_buffer(&mut self) -> Result<&mut IoBuffer> {
        let buffer = self.data_buffer.as_mut().ok_or_else(|| {
            DescError::InvalidState("data buffer has been released".to_string())
        })?;
        buffer.clear();
        Ok(buffer)
    }

    /// Configure this entry for update: payload is whatever is readable in
    /// the Data Buffer. Pass `None` to keep the previously assigned key.
    pub(crate) fn configure_for_update(&mut self, key: Option<&str>, offset: u32) -> Result<u32> {
        let buffer = self.data_buffer.as_ref().ok_or_else(|| {
            DescError::InvalidState("data buffer has been released".to_string())
        })?;
        if buffer.reader_index() != 0 {
            return Err(DescError::InvalidBufferState(format!(
                "buffer's read cursor should be 0, got {}",
                buffer.reader_index()
            )));
        }
        let data_size = buffer.readable_bytes();
        if data_size == 0 {
            return Err(DescError::InvalidArgument(
                "data size should be positive".to_string(),
            ));
        }
        self.assign_key(key)?;
        self.offset = offset;
        self.data_size = data_size as u32;
        self.active = true;
        Ok(self.data_size)
    }

    /// Configure this entry for fetch of up to `fetch_size` bytes. Resets
    /// the Data Buffer to empty. Pass `None` to keep the previous key.
    pub(crate) fn configure_for_fetch(
        &mut self,
        key: Option<&str>,
        offset: u32,
        fetch_size: u32,
    ) -> Result<u32> {
        let buffer = self.data_buffer.as_mut().ok_or_else(|| {
            DescError::InvalidState("data buffer has been released".to_string())
        })?;
        if fetch_size == 0 {
            return Err(DescError::InvalidArgument(
                "data size should be positive".to_string(),
            ));
        }
        if fetch_size as usize > buffer.capacity() {
            return Err(DescError::InvalidArgument(format!(
                "data size {fetch_size} should not exceed buffer capacity {}",
                buffer.capacity()
            )));
        }
        buffer.clear();
        self.assign_key(key)?;
        self.offset = offset;
        self.data_size = fetch_size;
        self.active = true;
        Ok(fetch_size)
    }

    fn assign_key(&mut self, key: Option<&str>) -> Result<()> {
        match key {
            Some(key) => {
                self.key_encoded_len =
                    keys::check_key_len(key, self.max_key_encoded_len, "entry key")?;
                self.key = Some(key.to_string());
                self.key_changed = true;
                Ok(())
            }
            None if self.key.is_some() => Ok(()),
            None => Err(DescError::InvalidArgument(
                "entry has no key assigned".to_string(),
            )),
        }
    }

    /// Encode this entry into the Description Buffer.
    ///
    /// First-time encode writes every field, including the 8-byte handle.
    /// Reuse encode rewrites only offset and size, skips the handle slot,
    /// and rewrites the key slot only when the key changed since the prior
    /// encode; unchanged slots are valid from before and are passed over by
    /// cursor arithmetic alone.
    pub(crate) fn encode(&self, desc: &mut IoBuffer, first_time: bool) {
        if first_time {
            self.encode_first_time(desc);
        } else {
            self.encode_reused(desc);
        }
    }

    fn encode_first_time(&self, desc: &mut IoBuffer) {
        desc.put_u16(self.key_encoded_len);
        let slot_start = desc.writer_index();
        if let Some(key) = &self.key {
            keys::write_key(desc, key, self.max_key_encoded_len);
        } else {
            // Inactive slot: fixed geometry, empty key.
            desc.set_writer_index(slot_start + usize::from(self.max_key_encoded_len));
        }
        desc.put_u32(self.offset);
        desc.put_u32(self.data_size);
        desc.put_u64(self.handle.get());
    }

    fn encode_reused(&self, desc: &mut IoBuffer) {
        if self.key_changed {
            desc.put_u16(self.key_encoded_len);
            if let Some(key) = &self.key {
                keys::write_key(desc, key, self.max_key_encoded_len);
            }
        } else {
            keys::skip_key_slot(desc, self.max_key_encoded_len);
        }
        desc.put_u32(self.offset);
        desc.put_u32(self.data_size);
        // The handle slot is invariant across reuse cycles.
        desc.set_writer_index(desc.writer_index() + 8);
    }

    /// Actual bytes transferred by the last fetch, as reported by the
    /// engine. Fetch mode only.
    pub fn actual_size(&self) -> Result<u32> {
        if self.mode.is_fetch() {
            Ok(self.actual_size)
        } else {
            Err(DescError::UnsupportedForMode { mode: self.mode })
        }
    }

    /// Record the transferred byte count for this entry. Fetch mode only.
    pub fn set_actual_size(&mut self, actual_size: u32) -> Result<()> {
        if self.mode.is_fetch() {
            self.actual_size = actual_size;
            Ok(())
        } else {
            Err(DescError::UnsupportedForMode { mode: self.mode })
        }
    }

    /// The Data Buffer after a parsed fetch, exposing exactly the
    /// transferred bytes between its cursors. Fetch mode only.
    pub fn fetched_data(&self) -> Result<&IoBuffer> {
        if !self.mode.is_fetch() {
            return Err(DescError::UnsupportedForMode { mode: self.mode });
        }
        self.data_buffer.as_ref().ok_or_else(|| {
            DescError::InvalidState("data buffer has been released".to_string())
        })
    }

    /// Whether the fetch Data Buffer has been released. Fetch mode only.
    pub fn is_fetch_buffer_released(&self) -> Result<bool> {
        if self.mode.is_fetch() {
            Ok(self.data_buffer.is_none())
        } else {
            Err(DescError::UnsupportedForMode { mode: self.mode })
        }
    }

    /// Release the owned Data Buffer. Idempotent.
    pub fn release_buffer(&mut self) {
        self.data_buffer = None;
    }

    pub(crate) fn reset_for_reuse(&mut self) {
        self.active = false;
        self.key_changed = false;
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entry: {}|{}|{}",
            self.mode,
            self.key.as_deref().unwrap_or("<unset>"),
            self.offset,
            self.data_size
        )
    }
}
