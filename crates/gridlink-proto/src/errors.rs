//! Wire-layer error types.

use thiserror::Error;

/// Errors produced while encoding or decoding wire data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A byte outside `0-9A-F` where a score hex digit was expected.
    #[error("invalid hex digit 0x{digit:02x} at position {position}")]
    InvalidHexDigit {
        /// The offending byte.
        digit: u8,
        /// Zero-based digit position within the pair.
        position: usize,
    },

    /// A score line that is too short or does not carry the score tag.
    #[error("malformed score line ({len} bytes)")]
    MalformedScoreLine {
        /// Assembled length of the rejected line.
        len: usize,
    },

    /// A peer address that is not exactly 12 printable ASCII characters.
    #[error("invalid peer address ({len} bytes)")]
    InvalidPeerAddr {
        /// Length of the rejected slice.
        len: usize,
    },
}

/// Convenience alias for wire-layer results.
pub type Result<T> = core::result::Result<T, ProtocolError>;
