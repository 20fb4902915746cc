//! Serial transport abstraction.

use std::io;

/// Half-duplex, byte-oriented serial port to the radio module.
///
/// No flow control is assumed. The receive side is interrupt-fed
/// elsewhere; `poll_byte` only drains what has already arrived and never
/// blocks.
pub trait SerialPort {
    /// Queue a byte sequence for transmission.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Next received byte, if one is pending.
    fn poll_byte(&mut self) -> Option<u8>;
}
