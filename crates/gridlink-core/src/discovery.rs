//! Peer discovery engine.
//!
//! Drives an inquiry, resolves each candidate's advertised services, and
//! filters to peers advertising this application's service name. Every
//! failure mode - nothing discovered, no name match, a timeout at any
//! stage - degrades to [`DiscoveryOutcome::NoneFound`]; discovery is
//! never fatal.

use gridlink_proto::{Command, PeerAddr, Response};
use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::env::Environment;
use crate::error::LinkError;
use crate::panel::{Key, Panel};
use crate::port::SerialPort;

/// Capacity of the peer table; inquiry results beyond it are silently
/// dropped.
pub const MAX_PEERS: usize = 5;

/// One discovered peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerRecord {
    /// Address reported by the inquiry.
    pub addr: PeerAddr,
    /// First advertised service name seen for the peer, if any.
    pub service: Option<String>,
    /// True once a service record matched the wanted service name.
    pub verified: bool,
}

/// Phase the engine is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryPhase {
    /// Not started.
    Idle,
    /// Inquiry in progress.
    Inquiring,
    /// Resolving service names of discovered peers.
    Resolving,
    /// Awaiting operator selection.
    Selecting,
    /// Finished.
    Done,
}

/// Outcome of a discovery run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// The operator selected a verified peer.
    Found(PeerRecord),
    /// Nothing usable was discovered or selected.
    NoneFound,
}

/// Discovery engine: the bounded peer table plus the current phase.
///
/// The table is created empty at the start of each run and mutated only
/// during that run.
#[derive(Debug)]
pub struct Discovery {
    peers: Vec<PeerRecord>,
    phase: DiscoveryPhase,
}

impl Discovery {
    /// New engine with an empty peer table.
    pub fn new() -> Self {
        Self { peers: Vec::new(), phase: DiscoveryPhase::Idle }
    }

    /// The peer table as of the last run.
    pub fn peers(&self) -> &[PeerRecord] {
        &self.peers
    }

    /// Current phase.
    pub fn phase(&self) -> DiscoveryPhase {
        self.phase
    }

    /// Run one full discovery round: inquiry, service resolution,
    /// operator selection.
    pub fn run<P, E, U>(
        &mut self,
        ep: &mut Endpoint<P, E, U>,
        service: &str,
    ) -> Result<DiscoveryOutcome, LinkError>
    where
        P: SerialPort,
        E: Environment,
        U: Panel,
    {
        self.peers.clear();
        self.inquire(ep)?;
        self.resolve(ep, service)?;
        let outcome = self.select(ep);
        self.phase = DiscoveryPhase::Done;
        Ok(outcome)
    }

    fn inquire<P, E, U>(&mut self, ep: &mut Endpoint<P, E, U>) -> Result<(), LinkError>
    where
        P: SerialPort,
        E: Environment,
        U: Panel,
    {
        self.phase = DiscoveryPhase::Inquiring;
        ep.panel_mut().render_status("Inquiry");
        ep.reset_modem()?;
        let seconds = ep.config().inquiry_window_secs;
        ep.command(&Command::Inquire { seconds })?;

        let deadline = ep.now() + ep.config().inquiry_deadline;
        loop {
            match ep.await_response(deadline) {
                Some((_, Response::InquiryResult { addr })) => {
                    if self.peers.len() < MAX_PEERS {
                        debug!(%addr, "peer discovered");
                        self.peers.push(PeerRecord { addr, service: None, verified: false });
                    }
                },
                Some((_, Response::InquiryComplete)) => break,
                Some(_) => {},
                // Window elapsed without the completion marker; keep
                // whatever was collected.
                None => break,
            }
        }
        info!(count = self.peers.len(), "inquiry finished");
        Ok(())
    }

    fn resolve<P, E, U>(
        &mut self,
        ep: &mut Endpoint<P, E, U>,
        wanted: &str,
    ) -> Result<(), LinkError>
    where
        P: SerialPort,
        E: Environment,
        U: Panel,
    {
        self.phase = DiscoveryPhase::Resolving;
        for peer in &mut self.peers {
            ep.command(&Command::QueryServices { addr: peer.addr })?;
            let deadline = ep.now() + ep.config().resolve_deadline;
            loop {
                match ep.await_response(deadline) {
                    Some((_, Response::ServiceRecord { service })) => {
                        if let Some(name) = service {
                            if name == wanted {
                                debug!(addr = %peer.addr, "service match");
                                peer.verified = true;
                            }
                            if peer.service.is_none() {
                                peer.service = Some(name);
                            }
                        }
                    },
                    Some((_, Response::ServiceComplete)) => break,
                    Some(_) => {},
                    // Resolution timed out for this peer; move on.
                    None => break,
                }
            }
        }
        Ok(())
    }

    /// Operator selection over the table. Unbounded by design (selection
    /// has no natural timeout); the cursor wraps over the full table
    /// capacity, empty slots included.
    fn select<P, E, U>(&mut self, ep: &mut Endpoint<P, E, U>) -> DiscoveryOutcome
    where
        P: SerialPort,
        E: Environment,
        U: Panel,
    {
        self.phase = DiscoveryPhase::Selecting;
        let mut cursor = 0usize;
        ep.panel_mut().render_peers(&self.peers, cursor);
        loop {
            match ep.panel_mut().poll_key() {
                Some(Key::Center) => break,
                Some(Key::Up) => {
                    cursor = if cursor == 0 { MAX_PEERS - 1 } else { cursor - 1 };
                    ep.panel_mut().render_peers(&self.peers, cursor);
                },
                Some(Key::Down) => {
                    cursor = if cursor + 1 >= MAX_PEERS { 0 } else { cursor + 1 };
                    ep.panel_mut().render_peers(&self.peers, cursor);
                },
                _ => {},
            }
            ep.idle_tick();
        }
        match self.peers.get(cursor) {
            Some(peer) if peer.verified => DiscoveryOutcome::Found(peer.clone()),
            _ => DiscoveryOutcome::NoneFound,
        }
    }
}

impl Default for Discovery {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{KeyPanel, ScriptPort, endpoint_with};

    const SERVICE: &str = "2048Server";

    #[test]
    fn empty_inquiry_yields_none_found() {
        let port = ScriptPort::with_lines(&[b"+BTINQ: COMPLETE"]);
        let panel = KeyPanel::with_keys(&[Key::Center]);
        let mut ep = endpoint_with(port, panel);

        let mut discovery = Discovery::new();
        let outcome = discovery.run(&mut ep, SERVICE).unwrap();

        assert!(discovery.peers().is_empty());
        assert_eq!(outcome, DiscoveryOutcome::NoneFound);
    }

    #[test]
    fn inquiry_collects_and_service_match_verifies() {
        let port = ScriptPort::with_lines(&[
            b"+BTINQ: AABBCCDDEEFF,201F040",
            b"+BTINQ: COMPLETE",
            b"+BTSDP: 1 \"2048Server\" RFCOMM",
            b"+BTSDP: COMPLETE",
        ]);
        let panel = KeyPanel::with_keys(&[Key::Center]);
        let mut ep = endpoint_with(port, panel);

        let mut discovery = Discovery::new();
        let outcome = discovery.run(&mut ep, SERVICE).unwrap();

        assert_eq!(discovery.peers().len(), 1);
        let peer = &discovery.peers()[0];
        assert_eq!(peer.addr.as_bytes(), b"AABBCCDDEEFF");
        assert!(peer.verified);
        match outcome {
            DiscoveryOutcome::Found(found) => {
                assert_eq!(found.addr.as_bytes(), b"AABBCCDDEEFF");
            },
            DiscoveryOutcome::NoneFound => panic!("expected a verified peer"),
        }
    }

    #[test]
    fn unrelated_service_does_not_verify() {
        let port = ScriptPort::with_lines(&[
            b"+BTINQ: AABBCCDDEEFF,201F040",
            b"+BTINQ: COMPLETE",
            b"+BTSDP: 1 \"OBEX Push\" RFCOMM",
            b"+BTSDP: COMPLETE",
        ]);
        let panel = KeyPanel::with_keys(&[Key::Center]);
        let mut ep = endpoint_with(port, panel);

        let mut discovery = Discovery::new();
        let outcome = discovery.run(&mut ep, SERVICE).unwrap();

        assert_eq!(discovery.peers().len(), 1);
        assert!(!discovery.peers()[0].verified);
        assert_eq!(discovery.peers()[0].service.as_deref(), Some("OBEX Push"));
        assert_eq!(outcome, DiscoveryOutcome::NoneFound);
    }

    #[test]
    fn table_is_capped_at_capacity() {
        let mut lines: Vec<Vec<u8>> = Vec::new();
        for i in 0..7u8 {
            lines.push(format!("+BTINQ: AABBCCDDEE{i:02X},201F040").into_bytes());
        }
        lines.push(b"+BTINQ: COMPLETE".to_vec());
        let refs: Vec<&[u8]> = lines.iter().map(Vec::as_slice).collect();

        let port = ScriptPort::with_lines(&refs);
        let panel = KeyPanel::with_keys(&[Key::Center]);
        let mut ep = endpoint_with(port, panel);

        let mut discovery = Discovery::new();
        // No peers answer the service query; outcome is NoneFound but the
        // table keeps the first five entries.
        let _ = discovery.run(&mut ep, SERVICE).unwrap();
        assert_eq!(discovery.peers().len(), MAX_PEERS);
    }

    #[test]
    fn cursor_wraps_over_the_table_capacity() {
        let port = ScriptPort::with_lines(&[b"+BTINQ: COMPLETE"]);
        let panel = KeyPanel::with_keys(&[Key::Up, Key::Center]);
        let mut ep = endpoint_with(port, panel);

        let mut discovery = Discovery::new();
        let _ = discovery.run(&mut ep, SERVICE).unwrap();

        let (_, _, panel) = ep.into_parts();
        // Initial render at slot 0, then one wrap up to the last slot.
        assert_eq!(panel.peer_renders, vec![(0, 0), (0, MAX_PEERS - 1)]);
    }
}
