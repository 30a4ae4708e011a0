//! Error types for the descriptor protocol.
//!
//! Configuration and validation problems fail fast at the call site. Failures
//! reported by the external engine are never raised from this layer; they are
//! recorded on the descriptor and queried through
//! [`IoDescriptor::is_succeeded`](crate::desc::IoDescriptor::is_succeeded) and
//! [`IoDescriptor::cause`](crate::desc::IoDescriptor::cause).

use thiserror::Error;

use crate::engine::EngineError;
use crate::entry::Mode;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DescError>;

/// Errors raised by descriptor and entry operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DescError {
    /// Bad constructor bounds, a non-positive size, or a size exceeding a
    /// buffer's fixed capacity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A key exceeds the shared encoded-length cap. The limits are reported
    /// in characters (UTF-16 units), not encoded bytes.
    #[error("{key_kind} length should not exceed {max_chars} characters, got {actual_chars}")]
    KeyTooLong {
        /// Which key violated the cap ("top key" or "entry key").
        key_kind: &'static str,
        /// The shared cap, in characters.
        max_chars: u16,
        /// The offending key's length, in characters.
        actual_chars: usize,
    },

    /// A caller-supplied buffer was in a state the protocol cannot accept,
    /// e.g. a non-zero read cursor where zero is required.
    #[error("invalid buffer state: {0}")]
    InvalidBufferState(String),

    /// The operation is not legal in the descriptor's current call state:
    /// encoding with no active entries, a non-prefix active set, or calls
    /// made out of the encode / call / parse / release order.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A fetch-only operation was invoked on an update-mode descriptor or
    /// entry, or vice versa.
    #[error("operation is not supported in {mode} mode")]
    UnsupportedForMode {
        /// The mode the descriptor or entry actually has.
        mode: Mode,
    },

    /// The external engine call failed. Returned only by accessors that
    /// surface a recorded cause, never raised by the call itself.
    #[error("engine call failed: {0}")]
    ExternalCallFailure(#[from] EngineError),
}

impl DescError {
    /// Whether this error reports a call-state violation.
    #[inline]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, DescError::InvalidState(_))
    }

    /// Whether this error reports a mode mismatch.
    #[inline]
    pub fn is_unsupported_for_mode(&self) -> bool {
        matches!(self, DescError::UnsupportedForMode { .. })
    }
}
