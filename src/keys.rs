//! Fixed-width key encoding for the Description Buffer.
//!
//! Keys are written as UTF-16 code units, two bytes per unit in native
//! order, into a slot that is always exactly `max_key_encoded_len` bytes
//! wide. Only `len(key) * 2` content bytes are written; the remainder of the
//! slot is covered by cursor arithmetic, so the engine can skip fixed
//! offsets without knowing any key's actual length. Decoding is the engine's
//! side of the contract.

use crate::buffer::IoBuffer;
use crate::error::{DescError, Result};

/// Length of `key` once encoded, in bytes (two per UTF-16 unit).
#[inline]
pub fn encoded_key_len(key: &str) -> usize {
    key.encode_utf16().count() * 2
}

/// Validate `key` against the shared encoded-length cap.
///
/// Returns the encoded length in bytes. `key_kind` names the key in the
/// error ("top key" or "entry key"); the reported limits are in characters,
/// not bytes.
pub fn check_key_len(key: &str, max_key_encoded_len: u16, key_kind: &'static str) -> Result<u16> {
    let units = key.encode_utf16().count();
    let encoded = units * 2;
    if encoded > usize::from(max_key_encoded_len) {
        return Err(DescError::KeyTooLong {
            key_kind,
            max_chars: max_key_encoded_len / 2,
            actual_chars: units,
        });
    }
    Ok(encoded as u16)
}

/// Encode `key` into the slot at the current write cursor, then advance the
/// cursor to the slot boundary regardless of the key's actual length.
///
/// The caller must have validated the key with [`check_key_len`]; a key
/// longer than the slot panics via the buffer's bounds check.
pub fn write_key(buf: &mut IoBuffer, key: &str, max_key_encoded_len: u16) {
    let slot_start = buf.writer_index();
    for unit in key.encode_utf16() {
        buf.put_u16(unit);
    }
    buf.set_writer_index(slot_start + usize::from(max_key_encoded_len));
}

/// Advance the write cursor past an already-encoded `[key_len][key slot]`
/// pair without touching its content. Used on reuse cycles for keys that
/// have not changed since the prior encode.
#[inline]
pub fn skip_key_slot(buf: &mut IoBuffer, max_key_encoded_len: u16) {
    buf.set_writer_index(buf.writer_index() + 2 + usize::from(max_key_encoded_len));
}
