//! Shared test engine for descriptor integration tests.
//!
//! `MemoryEngine` is a faithful in-memory implementation of the engine side
//! of the protocol: it decodes the Description Buffer byte-by-byte per the
//! wire layout, moves payload bytes through the handle table, writes actual
//! sizes into the fetch result region, advertises a native handle, and
//! records release notifications for assertions.

#![allow(dead_code)]

use std::collections::HashMap;

use oxidesc::engine::{EngineError, EngineRequest, ObjectEngine};
use oxidesc::{BufferHandle, Mode};

/// Native handle value the engine advertises after a successful call.
pub const NATIVE_HANDLE: u64 = 0xDA05;

/// One decoded entry slot from the active prefix.
struct WireEntry {
    key: String,
    offset: u32,
    size: u32,
    handle: u64,
}

/// In-memory object store keyed by `(top key, entry key)`.
#[derive(Default)]
pub struct MemoryEngine {
    store: HashMap<(String, String), Vec<u8>>,
    /// Native handles passed to `release_descriptor`, in call order.
    pub released: Vec<u64>,
    /// When set, the next `execute` fails with this message.
    pub fail_next: Option<String>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a record, as if written by an earlier update.
    pub fn seed(&mut self, top_key: &str, entry_key: &str, bytes: &[u8]) {
        self.store
            .insert((top_key.to_string(), entry_key.to_string()), bytes.to_vec());
    }

    /// A record's current content.
    pub fn get(&self, top_key: &str, entry_key: &str) -> Option<&[u8]> {
        self.store
            .get(&(top_key.to_string(), entry_key.to_string()))
            .map(Vec::as_slice)
    }

    fn decode(bytes: &[u8]) -> Result<(String, Vec<WireEntry>), EngineError> {
        // offset 0..8 holds the native handle slot; nothing to read there.
        let max_key_len = usize::from(read_u16(bytes, 8));
        let top_key_len = usize::from(read_u16(bytes, 10));
        let top_key = decode_key(&bytes[12..12 + top_key_len])?;
        let mut pos = 12 + max_key_len;
        let count = usize::from(read_u16(bytes, pos));
        pos += 2;
        let mut entries = Vec::with_capacity(count);
        for _ in 0..count {
            let key_len = usize::from(read_u16(bytes, pos));
            if key_len > max_key_len {
                return Err(EngineError::MalformedDescriptor(format!(
                    "entry key length {key_len} exceeds slot width {max_key_len}"
                )));
            }
            let key = decode_key(&bytes[pos + 2..pos + 2 + key_len])?;
            let fields = pos + 2 + max_key_len;
            entries.push(WireEntry {
                key,
                offset: read_u32(bytes, fields),
                size: read_u32(bytes, fields + 4),
                handle: read_u64(bytes, fields + 8),
            });
            pos += 2 + max_key_len + 16;
        }
        Ok((top_key, entries))
    }
}

impl ObjectEngine for MemoryEngine {
    fn execute(&mut self, mut request: EngineRequest<'_>) -> Result<(), EngineError> {
        if let Some(message) = self.fail_next.take() {
            return Err(EngineError::Rejected(message));
        }
        let snapshot = request.descriptor_bytes().to_vec();
        let (top_key, entries) = Self::decode(&snapshot)?;

        let mut actual_sizes = Vec::with_capacity(entries.len());
        for entry in &entries {
            let handle = BufferHandle::from_wire(entry.handle).ok_or_else(|| {
                EngineError::MalformedDescriptor("zero data-buffer handle".to_string())
            })?;
            match request.mode() {
                Mode::Update => {
                    let buffer = request.data_buffer(handle)?;
                    let payload = &buffer.readable()[..entry.size as usize];
                    let record = self
                        .store
                        .entry((top_key.clone(), entry.key.clone()))
                        .or_default();
                    let end = entry.offset as usize + payload.len();
                    if record.len() < end {
                        record.resize(end, 0);
                    }
                    record[entry.offset as usize..end].copy_from_slice(payload);
                }
                Mode::Fetch => {
                    let stored = self
                        .store
                        .get(&(top_key.clone(), entry.key.clone()))
                        .map(Vec::as_slice)
                        .unwrap_or(&[]);
                    let available = stored.len().saturating_sub(entry.offset as usize);
                    let n = available.min(entry.size as usize);
                    let buffer = request.data_buffer(handle)?;
                    buffer.as_mut_slice()[..n]
                        .copy_from_slice(&stored[entry.offset as usize..entry.offset as usize + n]);
                    actual_sizes.push(n as u32);
                }
            }
        }

        if request.mode() == Mode::Fetch {
            let result_offset = request.request_len();
            let bytes = request.descriptor_bytes();
            for (i, actual) in actual_sizes.iter().enumerate() {
                let slot = result_offset + i * 4;
                bytes[slot..slot + 4].copy_from_slice(&actual.to_ne_bytes());
            }
        }
        request.descriptor_bytes()[..8].copy_from_slice(&NATIVE_HANDLE.to_ne_bytes());
        Ok(())
    }

    fn release_descriptor(&mut self, native_handle: u64) {
        self.released.push(native_handle);
    }
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    let mut b = [0u8; 2];
    b.copy_from_slice(&bytes[at..at + 2]);
    u16::from_ne_bytes(b)
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&bytes[at..at + 4]);
    u32::from_ne_bytes(b)
}

fn read_u64(bytes: &[u8], at: usize) -> u64 {
    let mut b = [0u8; 8];
    b.copy_from_slice(&bytes[at..at + 8]);
    u64::from_ne_bytes(b)
}

fn decode_key(bytes: &[u8]) -> Result<String, EngineError> {
    let units: Vec<u16> = bytes.chunks_exact(2).map(|c| read_u16(c, 0)).collect();
    String::from_utf16(&units)
        .map_err(|_| EngineError::MalformedDescriptor("key is not valid UTF-16".to_string()))
}
