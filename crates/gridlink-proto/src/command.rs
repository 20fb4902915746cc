//! AT command surface for the radio module.
//!
//! Every command knows its own wire encoding and the settle delay the
//! module needs after it before it will accept the next command. The
//! delays are module latency requirements, not tuning knobs.

use std::time::Duration;

use crate::peer::PeerAddr;

/// RFCOMM channel used for both listening and dialing.
pub const RFCOMM_CHANNEL: u8 = 20;

/// Connection attempts the module makes per dial.
pub const DIAL_ATTEMPTS: u8 = 3;

/// A command issued to the radio module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave data mode for command mode (`+++`, sent without terminator).
    Escape,
    /// Cancel the current module operation.
    Cancel,
    /// Listen for incoming connections, advertising a service name.
    Listen {
        /// Service name to advertise.
        service: String,
    },
    /// Inquire for discoverable peers for the given number of seconds.
    Inquire {
        /// Inquiry duration in seconds.
        seconds: u8,
    },
    /// Query the service records advertised by a peer.
    QueryServices {
        /// Peer to query.
        addr: PeerAddr,
    },
    /// Dial a peer.
    Dial {
        /// Peer to connect to.
        addr: PeerAddr,
    },
}

impl Command {
    /// Encode the command for the wire.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Escape => b"+++".to_vec(),
            Self::Cancel => b"AT+BTCAN\r".to_vec(),
            Self::Listen { service } => {
                format!("AT+BTSRV={RFCOMM_CHANNEL},\"{service}\"\r").into_bytes()
            },
            Self::Inquire { seconds } => format!("AT+BTINQ={seconds}\r").into_bytes(),
            Self::QueryServices { addr } => format!("AT+BTSDP={addr}\r").into_bytes(),
            Self::Dial { addr } => {
                format!("AT+BTCLT=\"{addr}\",{RFCOMM_CHANNEL},{DIAL_ATTEMPTS}\r").into_bytes()
            },
        }
    }

    /// Settle delay the module needs after this command.
    pub fn settle(&self) -> Duration {
        match self {
            Self::Escape | Self::Dial { .. } => Duration::from_millis(100),
            Self::Cancel => Duration::from_millis(50),
            Self::Listen { .. } | Self::Inquire { .. } | Self::QueryServices { .. } => {
                Duration::ZERO
            },
        }
    }
}
