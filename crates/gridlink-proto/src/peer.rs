//! Peer addresses as reported by the radio module.

use core::fmt;

use crate::errors::ProtocolError;

/// A Bluetooth device address in the module's 12-character form.
///
/// The module reports addresses as 12 ASCII characters with no separators
/// (e.g. `AABBCCDDEEFF`) and expects the same form back in dial and
/// service-query commands, so the raw wire form is kept rather than
/// parsing into octets.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerAddr([u8; Self::LEN]);

impl PeerAddr {
    /// Length of an address on the wire.
    pub const LEN: usize = 12;

    /// Parse an address from a 12-byte ASCII slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let Ok(raw) = <[u8; Self::LEN]>::try_from(bytes) else {
            return Err(ProtocolError::InvalidPeerAddr { len: bytes.len() });
        };
        if !raw.iter().all(u8::is_ascii_graphic) {
            return Err(ProtocolError::InvalidPeerAddr { len: bytes.len() });
        }
        Ok(Self(raw))
    }

    /// The address bytes as sent on the wire.
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl fmt::Display for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Constructor guarantees ASCII.
        let s = core::str::from_utf8(&self.0).map_err(|_| fmt::Error)?;
        f.write_str(s)
    }
}

impl fmt::Debug for PeerAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PeerAddr({self})")
    }
}
