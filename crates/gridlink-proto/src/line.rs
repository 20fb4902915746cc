//! Receive-line assembly.
//!
//! The radio module emits an unframed byte stream; the only structure is
//! the 0x0A line terminator. [`LineAssembler`] accumulates bytes into a
//! bounded buffer and hands out completed lines with the terminator (and
//! a preceding carriage return, if any) stripped.
//!
//! Overflow policy: once the buffer is full, further bytes are silently
//! discarded until the next terminator, and the completed line is the
//! truncated prefix. A lost tail surfaces downstream as an unrecognized
//! line, which every caller already ignores.

use bytes::{BufMut, Bytes, BytesMut};

/// Default receive-buffer capacity; covers the module's longest response
/// with slack.
pub const DEFAULT_LINE_CAPACITY: usize = 40;

/// Line terminator byte.
pub const LINE_TERMINATOR: u8 = 0x0A;

/// Accumulates raw received bytes into terminator-delimited lines.
///
/// Exactly one assembler owns the receive side of a link at a time; it is
/// handed from engine to engine rather than shared.
#[derive(Debug)]
pub struct LineAssembler {
    buf: BytesMut,
    capacity: usize,
}

impl LineAssembler {
    /// Assembler with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LINE_CAPACITY)
    }

    /// Assembler with a custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: BytesMut::with_capacity(capacity), capacity }
    }

    /// Number of bytes accumulated since the last completed line.
    pub fn pending_len(&self) -> usize {
        self.buf.len()
    }

    /// Feed one received byte.
    ///
    /// Returns the completed line when `byte` is the terminator; otherwise
    /// the byte is appended, or silently dropped if the buffer is full.
    pub fn feed(&mut self, byte: u8) -> Option<Bytes> {
        if byte == LINE_TERMINATOR {
            if self.buf.last() == Some(&b'\r') {
                self.buf.truncate(self.buf.len() - 1);
            }
            return Some(self.buf.split().freeze());
        }
        if self.buf.len() < self.capacity {
            self.buf.put_u8(byte);
        }
        None
    }
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}
