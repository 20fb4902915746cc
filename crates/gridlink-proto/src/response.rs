//! Classification of response lines from the radio module.
//!
//! The module's responses share prefixes at different lengths, so
//! fixed-width matches guard on both prefix and exact assembled length.
//! Everything a caller can observe is one of the [`Response`] variants;
//! unknown lines classify as [`Response::Unrecognized`] and are ignored
//! by every engine, which is what keeps the protocol robust against
//! noise and truncated lines.

use crate::peer::PeerAddr;

/// Disconnect sentinel. The module emits it asynchronously whenever the
/// underlying link drops, irrespective of what was being awaited.
pub const CARRIER_LOST: &[u8] = b"NO CARRIER";

/// Application handshake line, exchanged exactly once per connection.
pub const HANDSHAKE_LINE: &[u8] = b"LETS START PLAYING";

/// Service name advertised locally and required of remote peers.
pub const SERVICE_NAME: &str = "2048Server";

const INQUIRY_PREFIX: &[u8] = b"+BTINQ: ";
const INQUIRY_COMPLETE: &[u8] = b"+BTINQ: COMPLETE";
const SERVICE_PREFIX: &[u8] = b"+BTSDP: ";
const SERVICE_COMPLETE: &[u8] = b"+BTSDP: COMPLETE";
const CONNECT_PREFIX: &[u8] = b"CONNECT ";

/// Assembled length of an inquiry result line: the 8-byte prefix, the
/// 12-byte address, and the module's comma-separated class-of-device
/// field.
pub const INQUIRY_RESULT_LEN: usize = 28;

/// Assembled length of a `CONNECT <addr>` line: the 8-byte prefix plus
/// the 12-byte address.
pub const CONNECT_LEN: usize = 20;

/// Offset of the 12-byte address in both inquiry and connect lines.
const ADDR_OFFSET: usize = 8;

/// One response line, classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The link dropped. Takes precedence over every other match.
    CarrierLost,
    /// One discovered peer from an ongoing inquiry.
    InquiryResult {
        /// Address of the discovered peer.
        addr: PeerAddr,
    },
    /// The inquiry finished before its window elapsed.
    InquiryComplete,
    /// One record from an ongoing service query. `service` is the first
    /// quoted substring of the record, if any.
    ServiceRecord {
        /// Advertised service name, when the record carries one.
        service: Option<String>,
    },
    /// The service query finished.
    ServiceComplete,
    /// The module reports an established link, incoming or outgoing.
    Connected {
        /// Address of the peer on the other end.
        addr: PeerAddr,
    },
    /// The peer's session-start handshake.
    HandshakeStart,
    /// Anything else; absorbed silently by callers.
    Unrecognized,
}

/// True iff `line` starts with `prefix` and, when `exact_len` is given,
/// has exactly that assembled length.
///
/// The exact-length guard keeps fixed-width matches from accepting other
/// lines that share the prefix (`+BTINQ: <addr>...` vs
/// `+BTINQ: COMPLETE`).
pub fn prefix_matches(line: &[u8], prefix: &[u8], exact_len: Option<usize>) -> bool {
    if let Some(len) = exact_len {
        if line.len() != len {
            return false;
        }
    }
    line.len() >= prefix.len() && &line[..prefix.len()] == prefix
}

/// Classify one assembled line.
///
/// The carrier-loss sentinel is checked first: the module emits it at any
/// point, so it must win over whatever pattern the caller happens to be
/// awaiting.
pub fn classify(line: &[u8]) -> Response {
    if prefix_matches(line, CARRIER_LOST, None) {
        return Response::CarrierLost;
    }
    if line == INQUIRY_COMPLETE {
        return Response::InquiryComplete;
    }
    if prefix_matches(line, INQUIRY_PREFIX, Some(INQUIRY_RESULT_LEN)) {
        return match PeerAddr::from_bytes(&line[ADDR_OFFSET..ADDR_OFFSET + PeerAddr::LEN]) {
            Ok(addr) => Response::InquiryResult { addr },
            Err(_) => Response::Unrecognized,
        };
    }
    if line == SERVICE_COMPLETE {
        return Response::ServiceComplete;
    }
    if prefix_matches(line, SERVICE_PREFIX, None) {
        return Response::ServiceRecord {
            service: quoted_substring(&line[SERVICE_PREFIX.len()..]),
        };
    }
    if prefix_matches(line, CONNECT_PREFIX, Some(CONNECT_LEN)) {
        return match PeerAddr::from_bytes(&line[ADDR_OFFSET..ADDR_OFFSET + PeerAddr::LEN]) {
            Ok(addr) => Response::Connected { addr },
            Err(_) => Response::Unrecognized,
        };
    }
    if prefix_matches(line, HANDSHAKE_LINE, None) {
        return Response::HandshakeStart;
    }
    Response::Unrecognized
}

fn quoted_substring(bytes: &[u8]) -> Option<String> {
    let open = bytes.iter().position(|&b| b == b'"')?;
    let rest = &bytes[open + 1..];
    let close = rest.iter().position(|&b| b == b'"').unwrap_or(rest.len());
    Some(String::from_utf8_lossy(&rest[..close]).into_owned())
}
