//! Wire format for the gridlink protocol.
//!
//! The radio module speaks an AT-style command set over a raw, unframed,
//! half-duplex serial stream; the only structure on the wire is the 0x0A
//! line terminator. This crate owns everything byte-shaped: assembling
//! received bytes into lines, encoding commands (together with the settle
//! delay each one needs), classifying response lines into a closed set of
//! variants that callers match exhaustively, and the four-byte score
//! message.
//!
//! Engines that give these bytes meaning over time (deadlines, retries,
//! state machines) live in `gridlink-core`.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod errors;
pub mod line;
pub mod peer;
pub mod response;
pub mod score;

pub use command::Command;
pub use errors::{ProtocolError, Result};
pub use line::LineAssembler;
pub use peer::PeerAddr;
pub use response::{Response, classify};
pub use score::{decode_score, encode_score};
