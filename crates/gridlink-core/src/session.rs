//! Score-sync session.
//!
//! Runs over the connected channel: sends the local score as a tagged
//! hex line, drains inbound lines, and tracks the relative standing
//! against the opponent. Carrier loss ends the session immediately; an
//! undecodable score line only skips that one update.

use gridlink_proto::{Response, classify, decode_score, encode_score};
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::env::Environment;
use crate::error::LinkError;
use crate::panel::Panel;
use crate::port::SerialPort;

/// Peers put the score on the wire in 1/16th display units; the decoded
/// byte is divided back before comparison. Compatibility quirk of the
/// deployed encoding - do not "fix".
pub const SCORE_SCALE: u8 = 16;

/// Relative standing against the opponent; drives the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Standing {
    /// Local score is at least the opponent's.
    Leading,
    /// Opponent is ahead.
    Trailing,
}

/// One event from draining the inbound side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    /// Nothing new arrived.
    Idle,
    /// The opponent reported a score (already scaled to display units).
    OpponentScore(u8),
    /// The peer disconnected; the session is over.
    Disconnected,
}

/// Score-sync state for one connected session.
#[derive(Debug, Default)]
pub struct ScoreSync {
    opponent: Option<u8>,
    standing: Option<Standing>,
}

impl ScoreSync {
    /// Fresh state; nothing heard from the opponent yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last opponent score seen, in display units.
    pub fn opponent(&self) -> Option<u8> {
        self.opponent
    }

    /// Current standing, once at least one opponent score arrived.
    pub fn standing(&self) -> Option<Standing> {
        self.standing
    }

    /// Send the local score on the open channel.
    pub fn send_score<P, E, U>(
        &mut self,
        ep: &mut Endpoint<P, E, U>,
        score: u8,
    ) -> Result<(), LinkError>
    where
        P: SerialPort,
        E: Environment,
        U: Panel,
    {
        ep.send_raw(&encode_score(score))
    }

    /// Drain inbound lines once, without blocking.
    ///
    /// Returns the most significant event seen this drain: a disconnect
    /// wins over a score update, which wins over nothing.
    pub fn poll<P, E, U>(&mut self, ep: &mut Endpoint<P, E, U>, local_score: u8) -> SyncEvent
    where
        P: SerialPort,
        E: Environment,
        U: Panel,
    {
        let mut event = SyncEvent::Idle;
        while let Some(line) = ep.poll_line() {
            if classify(&line) == Response::CarrierLost {
                debug!("peer disconnected");
                return SyncEvent::Disconnected;
            }
            match decode_score(&line) {
                Ok(raw) => {
                    let scaled = raw / SCORE_SCALE;
                    self.opponent = Some(scaled);
                    let standing = if scaled > local_score {
                        Standing::Trailing
                    } else {
                        Standing::Leading
                    };
                    self.standing = Some(standing);
                    ep.panel_mut().render_standing(standing);
                    event = SyncEvent::OpponentScore(scaled);
                },
                Err(err) => {
                    // Noise or a truncated line; skip this update only.
                    debug!(%err, "undecodable line during score sync");
                },
            }
        }
        event
    }

    /// Send then drain: the per-move exchange.
    pub fn exchange<P, E, U>(
        &mut self,
        ep: &mut Endpoint<P, E, U>,
        local_score: u8,
    ) -> Result<SyncEvent, LinkError>
    where
        P: SerialPort,
        E: Environment,
        U: Panel,
    {
        self.send_score(ep, local_score)?;
        Ok(self.poll(ep, local_score))
    }
}
