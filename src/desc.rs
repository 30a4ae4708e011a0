//! I/O descriptors: batched record operations under one top key.
//!
//! An [`IoDescriptor`] owns a fixed-size ordered set of [`Entry`]s sharing a
//! single top key (dkey), plus the Description Buffer the whole batch is
//! encoded into. One call cycle is:
//!
//! 1. configure the top key and an active prefix of entries,
//! 2. [`encode`](IoDescriptor::encode) the batch,
//! 3. [`execute`](IoDescriptor::execute) it against the engine,
//! 4. [`parse_result`](IoDescriptor::parse_result) (fetch only),
//! 5. [`reuse`](IoDescriptor::reuse) for the next cycle, or
//!    [`release`](IoDescriptor::release) when done.
//!
//! A descriptor may be reused indefinitely without reallocating any buffer:
//! the reuse encode rewrites only the fields that can change and passes
//! over invariant slots (unchanged keys, buffer handles) by cursor
//! arithmetic. This trades a branch per entry for avoided allocation and
//! copying, which is the point of the whole protocol.
//!
//! Request-region wire layout (native byte order):
//!
//! ```text
//! offset 0    8 bytes              native descriptor handle (engine-written)
//! offset 8    2 bytes              max_key_encoded_len
//! offset 10   2 bytes              top key length (encoded bytes)
//! offset 12   max_key_encoded_len  top key slot
//! offset X    2 bytes              active entry count
//! offset X+2  per entry            fixed-footprint entry slots (see entry.rs)
//! ```
//!
//! For fetch descriptors a result region of `entry_count * 4` bytes follows
//! the request region; the engine writes each active entry's transferred
//! byte count there in encode order.
//!
//! Descriptors are not safe for concurrent use; distinct descriptors are
//! fully independent.

use std::fmt;

use crate::buffer::IoBuffer;
use crate::engine::{EngineError, EngineRequest, HandleTable, ObjectEngine};
use crate::entry::{Entry, Mode};
use crate::error::{DescError, Result};
use crate::keys;

/// Where a descriptor is within one call cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallState {
    /// Configurable; nothing encoded for the current cycle yet.
    Fresh,
    /// Encoded and ready for (or back from) the engine call.
    Encoded,
    /// Fetch results parsed; `reuse` starts the next cycle.
    Parsed,
    /// Buffers torn down; terminal.
    Released,
}

/// Batched fetch/update descriptor for records under one top key.
#[derive(Debug)]
pub struct IoDescriptor {
    top_key: Option<String>,
    top_key_encoded_len: u16,
    top_key_changed: bool,
    max_key_encoded_len: u16,
    mode: Mode,
    entries: Vec<Entry>,
    handles: HandleTable,
    total_request_buf_len: usize,
    total_desc_buffer_len: usize,
    total_request_size: u64,
    active_entry_count: u16,
    desc_buffer: Option<IoBuffer>,
    state: CallState,
    result_parsed: bool,
    cause: Option<EngineError>,
}

/// Maximum top or entry key length in characters.
pub const MAX_KEY_CHARS: u16 = i16::MAX as u16 / 2;

/// Maximum number of entries per descriptor.
pub const MAX_ENTRIES: u16 = i16::MAX as u16;

/// Per-entry result slot width in the fetch result region.
const ACTUAL_SIZE_BYTES: usize = 4;

/// Bytes of the request header that never change after the first encode:
/// the 8-byte native handle slot plus the 2-byte max key length.
const REUSE_HEADER_BYTES: usize = 10;

impl IoDescriptor {
    /// Create a descriptor with `entry_count` entries, each owning a Data
    /// Buffer of `entry_buffer_len` bytes.
    ///
    /// `max_key_chars` caps every key (top-level and per-entry) at that many
    /// characters; the cap is shared and fixed for the descriptor's
    /// lifetime. All buffer lengths are precomputed here, before any key or
    /// payload is known.
    pub fn new(
        max_key_chars: u16,
        entry_count: u16,
        entry_buffer_len: usize,
        mode: Mode,
    ) -> Result<Self> {
        if max_key_chars == 0 || max_key_chars > MAX_KEY_CHARS {
            return Err(DescError::InvalidArgument(format!(
                "max key length should be positive and no larger than {MAX_KEY_CHARS}, got {max_key_chars}"
            )));
        }
        if entry_count > MAX_ENTRIES {
            return Err(DescError::InvalidArgument(format!(
                "number of entries should be no larger than {MAX_ENTRIES}, got {entry_count}"
            )));
        }
        if entry_buffer_len == 0 {
            return Err(DescError::InvalidArgument(
                "entry buffer length should be positive".to_string(),
            ));
        }
        let max_key_encoded_len = max_key_chars * 2;
        let handles = HandleTable::with_capacity(usize::from(entry_count));
        let mut entries = Vec::with_capacity(usize::from(entry_count));
        // 8 native handle + 2 max key len + 2 top key len + key slot + 2 count
        let mut total_request_buf_len = 8 + 2 + 2 + usize::from(max_key_encoded_len) + 2;
        for index in 0..usize::from(entry_count) {
            let handle = handles
                .handle(index)
                .ok_or_else(|| DescError::InvalidArgument("handle table underflow".to_string()))?;
            let entry = Entry::new(mode, entry_buffer_len, max_key_encoded_len, handle);
            total_request_buf_len += entry.desc_len();
            entries.push(entry);
        }
        let mut total_desc_buffer_len = total_request_buf_len;
        if mode.is_fetch() {
            // Reserved for returned actual sizes, one slot per entry.
            total_desc_buffer_len += usize::from(entry_count) * ACTUAL_SIZE_BYTES;
        }
        Ok(Self {
            top_key: None,
            top_key_encoded_len: 0,
            top_key_changed: false,
            max_key_encoded_len,
            mode,
            entries,
            handles,
            total_request_buf_len,
            total_desc_buffer_len,
            total_request_size: 0,
            active_entry_count: 0,
            desc_buffer: None,
            state: CallState::Fresh,
            result_parsed: false,
            cause: None,
        })
    }

    /// The descriptor's mode; every entry shares it.
    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The shared encoded-length cap for all keys, in bytes.
    #[inline]
    pub fn max_key_encoded_len(&self) -> u16 {
        self.max_key_encoded_len
    }

    /// The top key, if one has been set.
    pub fn top_key(&self) -> Option<&str> {
        self.top_key.as_deref()
    }

    /// Set the top key shared by the whole batch.
    pub fn set_top_key(&mut self, key: &str) -> Result<()> {
        self.check_not_released()?;
        self.top_key_encoded_len = keys::check_key_len(key, self.max_key_encoded_len, "top key")?;
        self.top_key = Some(key.to_string());
        self.top_key_changed = true;
        Ok(())
    }

    /// Number of entry slots.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of entries carrying data for the current call.
    #[inline]
    pub fn active_entry_count(&self) -> u16 {
        self.active_entry_count
    }

    /// Sum of payload sizes across active entries for the current call.
    #[inline]
    pub fn total_request_size(&self) -> u64 {
        self.total_request_size
    }

    /// Length of the request region in bytes.
    #[inline]
    pub fn request_buf_len(&self) -> usize {
        self.total_request_buf_len
    }

    /// Full Description Buffer length: the request region plus, for fetch
    /// descriptors, the result region.
    #[inline]
    pub fn desc_buffer_len(&self) -> usize {
        self.total_desc_buffer_len
    }

    /// The entry at `index`.
    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// All entry slots in encode order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Clear the entry's Data Buffer cursors and hand it back for staging
    /// the next update payload.
    pub fn entry_buffer(&mut self, index: usize) -> Result<&mut IoBuffer> {
        self.check_not_released()?;
        self.entry_mut(index)?.reuse_buffer()
    }

    /// Configure the entry at `index` for update: the payload is whatever
    /// is currently readable in its Data Buffer (staged through
    /// [`entry_buffer`](Self::entry_buffer)). `key` may be `None` to keep
    /// the entry's previous key across reuse cycles.
    pub fn set_entry_for_update(
        &mut self,
        index: usize,
        key: Option<&str>,
        offset: u32,
    ) -> Result<()> {
        if !self.mode.is_update() {
            return Err(DescError::UnsupportedForMode { mode: self.mode });
        }
        self.check_configurable(index)?;
        let size = self.entry_mut(index)?.configure_for_update(key, offset)?;
        self.account_entry(size);
        Ok(())
    }

    /// Configure the entry at `index` to fetch up to `fetch_size` bytes.
    /// `key` may be `None` to keep the entry's previous key.
    pub fn set_entry_for_fetch(
        &mut self,
        index: usize,
        key: Option<&str>,
        offset: u32,
        fetch_size: u32,
    ) -> Result<()> {
        if !self.mode.is_fetch() {
            return Err(DescError::UnsupportedForMode { mode: self.mode });
        }
        self.check_configurable(index)?;
        let size = self
            .entry_mut(index)?
            .configure_for_fetch(key, offset, fetch_size)?;
        self.account_entry(size);
        Ok(())
    }

    /// Encode the top key and all entry descriptions into the Description
    /// Buffer.
    ///
    /// The first encode allocates the buffer at its precomputed capacity
    /// and writes every field. Later encodes reuse the buffer: the header's
    /// invariant bytes and any unchanged key slots are passed over without
    /// being rewritten.
    pub fn encode(&mut self) -> Result<()> {
        self.check_not_released()?;
        if self.state == CallState::Parsed {
            return Err(DescError::InvalidState(
                "call reuse() before encoding the next cycle".to_string(),
            ));
        }
        if self.active_entry_count == 0 {
            return Err(DescError::InvalidState(
                "at least one entry should have data".to_string(),
            ));
        }
        if usize::from(self.active_entry_count) > self.entries.len() {
            return Err(DescError::InvalidState(format!(
                "number of active entries {} should not exceed total entries {}",
                self.active_entry_count,
                self.entries.len()
            )));
        }
        self.check_active_prefix()?;
        if self.top_key.is_none() {
            return Err(DescError::InvalidState("top key is not set".to_string()));
        }
        if self.desc_buffer.is_none() {
            self.encode_first_time();
        } else {
            self.encode_reused();
        }
        self.state = CallState::Encoded;
        if tracing::enabled!(tracing::Level::DEBUG) {
            tracing::debug!(
                mode = %self.mode,
                active_entries = self.active_entry_count,
                request_bytes = self.total_request_buf_len,
                payload_bytes = self.total_request_size,
                "descriptor encoded"
            );
        }
        Ok(())
    }

    fn encode_first_time(&mut self) {
        let mut buf = IoBuffer::zeroed(self.total_desc_buffer_len);
        // Placeholder for the native descriptor handle the engine may write.
        buf.put_u64(0);
        buf.put_u16(self.max_key_encoded_len);
        buf.put_u16(self.top_key_encoded_len);
        if let Some(key) = &self.top_key {
            keys::write_key(&mut buf, key, self.max_key_encoded_len);
        }
        buf.put_u16(self.active_entry_count);
        for entry in &self.entries {
            entry.encode(&mut buf, true);
        }
        self.desc_buffer = Some(buf);
    }

    fn encode_reused(&mut self) {
        let Some(buf) = self.desc_buffer.as_mut() else {
            return;
        };
        buf.set_reader_index(0);
        buf.set_writer_index(REUSE_HEADER_BYTES);
        if self.top_key_changed {
            buf.put_u16(self.top_key_encoded_len);
            if let Some(key) = &self.top_key {
                keys::write_key(buf, key, self.max_key_encoded_len);
            }
        } else {
            keys::skip_key_slot(buf, self.max_key_encoded_len);
        }
        buf.put_u16(self.active_entry_count);
        for entry in &self.entries {
            if !entry.is_active() {
                break;
            }
            entry.encode(buf, false);
        }
    }

    /// Start the next call cycle: clears per-call state only. The
    /// Description Buffer, Data Buffers, keys, and handles are all kept.
    pub fn reuse(&mut self) -> Result<()> {
        self.check_not_released()?;
        self.result_parsed = false;
        self.active_entry_count = 0;
        self.total_request_size = 0;
        self.top_key_changed = false;
        self.cause = None;
        for entry in &mut self.entries {
            entry.reset_for_reuse();
        }
        self.state = CallState::Fresh;
        Ok(())
    }

    /// Run the encoded batch against the engine.
    ///
    /// Engine failures are not raised: they are recorded and queried through
    /// [`is_succeeded`](Self::is_succeeded) and [`cause`](Self::cause). The
    /// returned error reports only ordering misuse (calling before
    /// [`encode`](Self::encode)).
    pub fn execute<E: ObjectEngine>(&mut self, engine: &mut E) -> Result<()> {
        if self.state != CallState::Encoded {
            return Err(DescError::InvalidState(
                "encode() must precede the engine call".to_string(),
            ));
        }
        let mode = self.mode;
        let request_len = self.total_request_buf_len;
        let table = self.handles;
        let Some(buf) = self.desc_buffer.as_mut() else {
            return Err(DescError::InvalidState(
                "description buffer is absent".to_string(),
            ));
        };
        let data = self
            .entries
            .iter_mut()
            .map(Entry::data_buffer_mut)
            .collect();
        let request = EngineRequest::new(mode, request_len, table, buf, data);
        match engine.execute(request) {
            Ok(()) => {
                if mode.is_update() {
                    // Update has no result region to parse; the call
                    // completing is the whole outcome.
                    self.result_parsed = true;
                }
                self.cause = None;
            }
            Err(err) => {
                if tracing::enabled!(tracing::Level::WARN) {
                    tracing::warn!(mode = %mode, error = %err, "engine call failed");
                }
                self.cause = Some(err);
            }
        }
        Ok(())
    }

    /// Whether the last call cycle completed and (for fetch) was parsed.
    #[inline]
    pub fn is_succeeded(&self) -> bool {
        self.result_parsed
    }

    /// The recorded engine failure for the current cycle, if any.
    pub fn cause(&self) -> Option<&EngineError> {
        self.cause.as_ref()
    }

    /// Record an engine failure observed outside [`execute`](Self::execute),
    /// e.g. by an async boundary integration.
    pub fn set_cause(&mut self, cause: EngineError) {
        self.cause = Some(cause);
    }

    /// Mark the current cycle successful without parsing. Counterpart of
    /// [`set_cause`](Self::set_cause) for boundary integrations.
    pub fn mark_succeeded(&mut self) {
        self.result_parsed = true;
    }

    /// Recover each active entry's transferred byte count from the result
    /// region and adjust its Data Buffer so exactly those bytes are
    /// readable. Fetch mode only; a no-op when already parsed.
    pub fn parse_result(&mut self) -> Result<()> {
        if !self.mode.is_fetch() {
            return Err(DescError::UnsupportedForMode { mode: self.mode });
        }
        if self.result_parsed {
            return Ok(());
        }
        if self.state != CallState::Encoded {
            return Err(DescError::InvalidState(
                "encode() and the engine call must precede parse_result()".to_string(),
            ));
        }
        let Some(buf) = self.desc_buffer.as_mut() else {
            return Err(DescError::InvalidState(
                "description buffer is absent".to_string(),
            ));
        };
        let mut slot = self.total_request_buf_len;
        buf.set_writer_index(buf.capacity());
        let active = usize::from(self.active_entry_count);
        for entry in self.entries.iter_mut().take(active) {
            buf.set_reader_index(slot);
            let actual = buf.read_u32();
            entry.set_actual_size(actual)?;
            if let Some(data) = entry.data_buffer_mut() {
                let reader = data.reader_index();
                data.set_writer_index(reader + actual as usize);
            }
            slot += ACTUAL_SIZE_BYTES;
        }
        self.result_parsed = true;
        self.state = CallState::Parsed;
        Ok(())
    }

    /// Tear down the Description Buffer, notifying the engine if it wrote a
    /// non-zero native handle, and release the entries' Data Buffers (for
    /// update descriptors always; for fetch only when
    /// `release_fetch_buffers` is true, letting callers keep fetched data
    /// alive past the descriptor). Idempotent; never fails.
    pub fn release<E: ObjectEngine>(&mut self, engine: &mut E, release_fetch_buffers: bool) {
        if let Some(buf) = self.desc_buffer.take() {
            let native_handle = if buf.capacity() >= 8 { buf.get_u64(0) } else { 0 };
            if native_handle != 0 {
                engine.release_descriptor(native_handle);
            }
        }
        if self.mode.is_update() || release_fetch_buffers {
            for entry in &mut self.entries {
                entry.release_buffer();
            }
        }
        self.state = CallState::Released;
    }

    /// The Description Buffer after an encode. Boundary integrations that
    /// change its cursors must restore them.
    pub fn desc_buffer(&self) -> Option<&IoBuffer> {
        self.desc_buffer.as_ref()
    }

    /// Mutable access to the Description Buffer for boundary integrations.
    pub fn desc_buffer_mut(&mut self) -> Option<&mut IoBuffer> {
        self.desc_buffer.as_mut()
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut Entry> {
        let count = self.entries.len();
        self.entries.get_mut(index).ok_or_else(|| {
            DescError::InvalidArgument(format!(
                "entry index {index} out of range, descriptor has {count} entries"
            ))
        })
    }

    fn account_entry(&mut self, size: u32) {
        self.active_entry_count += 1;
        self.total_request_size += u64::from(size);
    }

    fn check_configurable(&self, index: usize) -> Result<()> {
        self.check_not_released()?;
        if self.state == CallState::Parsed {
            return Err(DescError::InvalidState(
                "call reuse() before reconfiguring entries".to_string(),
            ));
        }
        if let Some(entry) = self.entries.get(index) {
            if entry.is_active() {
                return Err(DescError::InvalidState(format!(
                    "entry {index} is already configured for this call"
                )));
            }
        }
        Ok(())
    }

    fn check_active_prefix(&self) -> Result<()> {
        let mut boundary = None;
        for (index, entry) in self.entries.iter().enumerate() {
            match (entry.is_active(), boundary) {
                (false, None) => boundary = Some(index),
                (true, Some(first_inactive)) => {
                    return Err(DescError::InvalidState(format!(
                        "active entries must form a contiguous prefix: entry {index} is active \
                         but entry {first_inactive} is not"
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn check_not_released(&self) -> Result<()> {
        if self.state == CallState::Released {
            return Err(DescError::InvalidState(
                "descriptor has been released".to_string(),
            ));
        }
        Ok(())
    }
}

impl Drop for IoDescriptor {
    fn drop(&mut self) {
        // Host memory is reclaimed unconditionally; engine-side state needs
        // an explicit release() with the engine.
        if let Some(buf) = self.desc_buffer.as_ref() {
            if buf.capacity() >= 8 && buf.get_u64(0) != 0 && tracing::enabled!(tracing::Level::WARN)
            {
                tracing::warn!(
                    mode = %self.mode,
                    "descriptor dropped without release(); engine-side state leaked"
                );
            }
        }
    }
}

impl fmt::Display for IoDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} descriptor, top key: {}, entries:",
            self.mode,
            self.top_key.as_deref().unwrap_or("<unset>")
        )?;
        const MAX_RENDERED: usize = 8;
        for entry in self.entries.iter().take(MAX_RENDERED) {
            write!(f, " [{entry}]")?;
        }
        if self.entries.len() > MAX_RENDERED {
            write!(f, " ...")?;
        }
        Ok(())
    }
}

/// Update-mode descriptor facade exposing only the operations valid for
/// updates, so mode misuse is unrepresentable at the type level.
#[derive(Debug)]
pub struct UpdateDescriptor {
    inner: IoDescriptor,
}

impl UpdateDescriptor {
    /// Create an update descriptor. See [`IoDescriptor::new`].
    pub fn new(max_key_chars: u16, entry_count: u16, entry_buffer_len: usize) -> Result<Self> {
        Ok(Self {
            inner: IoDescriptor::new(max_key_chars, entry_count, entry_buffer_len, Mode::Update)?,
        })
    }

    /// Set the shared top key.
    pub fn set_top_key(&mut self, key: &str) -> Result<()> {
        self.inner.set_top_key(key)
    }

    /// Stage the next payload for the entry at `index`.
    pub fn entry_buffer(&mut self, index: usize) -> Result<&mut IoBuffer> {
        self.inner.entry_buffer(index)
    }

    /// Configure the entry at `index` with its staged payload.
    pub fn set_entry(&mut self, index: usize, key: Option<&str>, offset: u32) -> Result<()> {
        self.inner.set_entry_for_update(index, key, offset)
    }

    /// Encode the batch. See [`IoDescriptor::encode`].
    pub fn encode(&mut self) -> Result<()> {
        self.inner.encode()
    }

    /// Run the batch against the engine. See [`IoDescriptor::execute`].
    pub fn execute<E: ObjectEngine>(&mut self, engine: &mut E) -> Result<()> {
        self.inner.execute(engine)
    }

    /// Start the next call cycle.
    pub fn reuse(&mut self) -> Result<()> {
        self.inner.reuse()
    }

    /// Release all buffers. Idempotent.
    pub fn release<E: ObjectEngine>(&mut self, engine: &mut E) {
        self.inner.release(engine, true);
    }

    /// Whether the last cycle completed.
    pub fn is_succeeded(&self) -> bool {
        self.inner.is_succeeded()
    }

    /// The recorded engine failure, if any.
    pub fn cause(&self) -> Option<&EngineError> {
        self.inner.cause()
    }

    /// The underlying mode-checked descriptor.
    pub fn as_raw(&self) -> &IoDescriptor {
        &self.inner
    }

    /// The underlying mode-checked descriptor, mutably.
    pub fn as_raw_mut(&mut self) -> &mut IoDescriptor {
        &mut self.inner
    }
}

/// Fetch-mode descriptor facade; the statically-typed counterpart of
/// [`UpdateDescriptor`].
#[derive(Debug)]
pub struct FetchDescriptor {
    inner: IoDescriptor,
}

impl FetchDescriptor {
    /// Create a fetch descriptor. See [`IoDescriptor::new`].
    pub fn new(max_key_chars: u16, entry_count: u16, entry_buffer_len: usize) -> Result<Self> {
        Ok(Self {
            inner: IoDescriptor::new(max_key_chars, entry_count, entry_buffer_len, Mode::Fetch)?,
        })
    }

    /// Set the shared top key.
    pub fn set_top_key(&mut self, key: &str) -> Result<()> {
        self.inner.set_top_key(key)
    }

    /// Configure the entry at `index` to fetch up to `fetch_size` bytes.
    pub fn set_entry(
        &mut self,
        index: usize,
        key: Option<&str>,
        offset: u32,
        fetch_size: u32,
    ) -> Result<()> {
        self.inner.set_entry_for_fetch(index, key, offset, fetch_size)
    }

    /// Encode the batch. See [`IoDescriptor::encode`].
    pub fn encode(&mut self) -> Result<()> {
        self.inner.encode()
    }

    /// Run the batch against the engine. See [`IoDescriptor::execute`].
    pub fn execute<E: ObjectEngine>(&mut self, engine: &mut E) -> Result<()> {
        self.inner.execute(engine)
    }

    /// Parse the engine-written result region. See
    /// [`IoDescriptor::parse_result`].
    pub fn parse_result(&mut self) -> Result<()> {
        self.inner.parse_result()
    }

    /// The transferred byte count for the entry at `index`.
    pub fn actual_size(&self, index: usize) -> Result<u32> {
        self.entry(index)?.actual_size()
    }

    /// The fetched bytes for the entry at `index`.
    pub fn fetched_data(&self, index: usize) -> Result<&IoBuffer> {
        self.entry(index)?.fetched_data()
    }

    /// Start the next call cycle.
    pub fn reuse(&mut self) -> Result<()> {
        self.inner.reuse()
    }

    /// Release buffers; pass `false` to keep fetched Data Buffers alive
    /// past the descriptor. Idempotent.
    pub fn release<E: ObjectEngine>(&mut self, engine: &mut E, release_fetch_buffers: bool) {
        self.inner.release(engine, release_fetch_buffers);
    }

    /// Whether the last cycle completed and was parsed.
    pub fn is_succeeded(&self) -> bool {
        self.inner.is_succeeded()
    }

    /// The recorded engine failure, if any.
    pub fn cause(&self) -> Option<&EngineError> {
        self.inner.cause()
    }

    /// The underlying mode-checked descriptor.
    pub fn as_raw(&self) -> &IoDescriptor {
        &self.inner
    }

    /// The underlying mode-checked descriptor, mutably.
    pub fn as_raw_mut(&mut self) -> &mut IoDescriptor {
        &mut self.inner
    }

    fn entry(&self, index: usize) -> Result<&Entry> {
        self.inner.entry(index).ok_or_else(|| {
            DescError::InvalidArgument(format!(
                "entry index {index} out of range, descriptor has {} entries",
                self.inner.entry_count()
            ))
        })
    }
}
