//! Connection state machine.
//!
//! Two roles reach the same connected channel. The responder advertises
//! the service, waits (unbounded, cancellable) for a connection request,
//! and confirms an accept/refuse prompt; the initiator dials and waits
//! out two bounded deadlines, one for the module's connect report and
//! one for the peer's handshake line. Timeouts, carrier loss, and
//! operator cancellation are results, never aborts: the caller treats
//! them all as "no connection" and falls back to single-player.

use gridlink_proto::{Command, PeerAddr, Response, classify};
use tracing::{debug, info};

use crate::endpoint::Endpoint;
use crate::env::Environment;
use crate::error::LinkError;
use crate::panel::{Key, Panel};
use crate::port::SerialPort;

/// Handshake line as sent, framed by terminators so the peer's assembler
/// sees it as its own line regardless of what preceded it.
const HANDSHAKE_SEND: &[u8] = b"\nLETS START PLAYING\n";

/// Role of this endpoint in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRole {
    /// Dials a discovered peer.
    Initiator,
    /// Advertises and waits for an incoming connection.
    Responder,
}

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No connection attempt yet.
    Idle,
    /// Responder: advertising, waiting for a connection request.
    Listening,
    /// Responder: request received, operator prompt pending.
    Accepting,
    /// Initiator: dial issued, waiting for the connect report.
    Dialing,
    /// Initiator: connected, waiting for the peer's handshake.
    AwaitingHandshake,
    /// Channel open; score sync may begin.
    Connected,
    /// Responder refused the request.
    Refused,
    /// Timed out, cancelled, or lost carrier.
    Failed,
}

/// Outcome of a responder listen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenOutcome {
    /// Operator accepted; the channel is open.
    Accepted(PeerAddr),
    /// Operator refused the request.
    Refused(PeerAddr),
    /// Operator cancelled before any request arrived.
    Cancelled,
}

/// One link session: role, peer, current state.
///
/// At most one session may exist per endpoint at a time; starting a
/// second drive while one is in progress is a caller bug.
#[derive(Debug)]
pub struct LinkSession {
    role: LinkRole,
    peer: Option<PeerAddr>,
    state: LinkState,
}

impl LinkSession {
    /// New idle session for the given role.
    pub fn new(role: LinkRole) -> Self {
        Self { role, peer: None, state: LinkState::Idle }
    }

    /// This endpoint's role.
    pub fn role(&self) -> LinkRole {
        self.role
    }

    /// Peer address, once one is known.
    pub fn peer(&self) -> Option<PeerAddr> {
        self.peer
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Responder drive: advertise, wait for a connection request, confirm
    /// with the operator, and open the channel or refuse.
    ///
    /// The wait is unbounded by design - listening has no natural
    /// timeout - and stays cancellable because every iteration polls the
    /// key source.
    pub fn listen<P, E, U>(
        &mut self,
        ep: &mut Endpoint<P, E, U>,
        service: &str,
    ) -> Result<ListenOutcome, LinkError>
    where
        P: SerialPort,
        E: Environment,
        U: Panel,
    {
        ep.reset_modem()?;
        ep.command(&Command::Listen { service: service.to_owned() })?;
        self.state = LinkState::Listening;
        ep.panel_mut().render_status("Waiting for peer");

        let addr = loop {
            if let Some(line) = ep.poll_line() {
                match classify(&line) {
                    Response::Connected { addr } => break addr,
                    // A carrier drop while nothing is connected is stale
                    // module chatter; everything else is noise too.
                    _ => {},
                }
            }
            if ep.panel_mut().poll_key().is_some() {
                debug!("listen cancelled by operator");
                self.state = LinkState::Failed;
                return Ok(ListenOutcome::Cancelled);
            }
            ep.idle_tick();
        };

        self.state = LinkState::Accepting;
        self.peer = Some(addr);
        info!(%addr, "connection request");

        if self.confirm(ep, addr) {
            ep.send_raw(HANDSHAKE_SEND)?;
            self.state = LinkState::Connected;
            info!(%addr, "accepted");
            Ok(ListenOutcome::Accepted(addr))
        } else {
            // Drop back to command mode and abandon the request.
            ep.command(&Command::Escape)?;
            self.state = LinkState::Refused;
            info!(%addr, "refused");
            Ok(ListenOutcome::Refused(addr))
        }
    }

    /// Accept/refuse prompt. Center confirms the highlighted choice;
    /// Up/Down toggle between the two.
    fn confirm<P, E, U>(&mut self, ep: &mut Endpoint<P, E, U>, addr: PeerAddr) -> bool
    where
        P: SerialPort,
        E: Environment,
        U: Panel,
    {
        const CHOICES: [&str; 2] = ["Start playing", "Refuse"];
        let title = format!("Accept {addr}?");
        let mut cursor = 0usize;
        ep.panel_mut().render_choices(&title, &CHOICES, cursor);
        loop {
            match ep.panel_mut().poll_key() {
                Some(Key::Center) => return cursor == 0,
                Some(Key::Up | Key::Down) => {
                    cursor ^= 1;
                    ep.panel_mut().render_choices(&title, &CHOICES, cursor);
                },
                _ => {},
            }
            ep.idle_tick();
        }
    }

    /// Initiator drive: dial, await the module's connect report, then
    /// the peer's handshake line.
    pub fn dial<P, E, U>(
        &mut self,
        ep: &mut Endpoint<P, E, U>,
        addr: PeerAddr,
    ) -> Result<(), LinkError>
    where
        P: SerialPort,
        E: Environment,
        U: Panel,
    {
        ep.reset_modem()?;
        ep.command(&Command::Dial { addr })?;
        self.state = LinkState::Dialing;
        self.peer = Some(addr);
        ep.panel_mut().render_status("Connecting");

        let deadline = ep.now() + ep.config().connect_deadline;
        loop {
            match ep.await_response(deadline) {
                Some((_, Response::CarrierLost)) => return self.fail(LinkError::CarrierLost),
                Some((_, Response::Connected { .. })) => break,
                Some(_) => {},
                None => return self.fail(LinkError::Timeout { operation: "connect report" }),
            }
        }

        self.state = LinkState::AwaitingHandshake;
        let deadline = ep.now() + ep.config().handshake_deadline;
        loop {
            match ep.await_response(deadline) {
                Some((_, Response::CarrierLost)) => return self.fail(LinkError::CarrierLost),
                Some((_, Response::HandshakeStart)) => break,
                Some(_) => {},
                None => return self.fail(LinkError::Timeout { operation: "session handshake" }),
            }
        }

        self.state = LinkState::Connected;
        info!(%addr, "connected");
        Ok(())
    }

    fn fail(&mut self, err: LinkError) -> Result<(), LinkError> {
        self.state = LinkState::Failed;
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{KeyPanel, ScriptPort, endpoint_with};

    const SERVICE: &str = "2048Server";

    fn addr() -> PeerAddr {
        PeerAddr::from_bytes(b"AABBCCDDEEFF").unwrap()
    }

    #[test]
    fn responder_accepts_and_sends_handshake() {
        let port = ScriptPort::with_lines(&[b"CONNECT AABBCCDDEEFF"]);
        let panel = KeyPanel::with_keys(&[Key::Center]);
        let mut ep = endpoint_with(port, panel);

        let mut session = LinkSession::new(LinkRole::Responder);
        let outcome = session.listen(&mut ep, SERVICE).unwrap();

        assert_eq!(outcome, ListenOutcome::Accepted(addr()));
        assert_eq!(session.state(), LinkState::Connected);
        assert_eq!(session.peer(), Some(addr()));

        let (port, _, panel) = ep.into_parts();
        let sent = String::from_utf8_lossy(&port.sent).into_owned();
        assert!(sent.contains("AT+BTSRV=20,\"2048Server\"\r"));
        assert!(sent.ends_with("\nLETS START PLAYING\n"));
        assert!(panel.statuses.iter().any(|status| status == "Waiting for peer"));
    }

    #[test]
    fn responder_refuses_with_escape() {
        let port = ScriptPort::with_lines(&[b"CONNECT AABBCCDDEEFF"]);
        // Toggle down to "Refuse", then confirm.
        let panel = KeyPanel::with_keys(&[Key::Down, Key::Center]);
        let mut ep = endpoint_with(port, panel);

        let mut session = LinkSession::new(LinkRole::Responder);
        let outcome = session.listen(&mut ep, SERVICE).unwrap();

        assert_eq!(outcome, ListenOutcome::Refused(addr()));
        assert_eq!(session.state(), LinkState::Refused);

        let (port, _, _) = ep.into_parts();
        let sent = String::from_utf8_lossy(&port.sent).into_owned();
        assert!(sent.ends_with("+++"));
        assert!(!sent.contains("LETS START PLAYING"));
    }

    #[test]
    fn responder_wait_is_cancellable() {
        let port = ScriptPort::default();
        let panel = KeyPanel::with_keys(&[Key::Left]);
        let mut ep = endpoint_with(port, panel);

        let mut session = LinkSession::new(LinkRole::Responder);
        let outcome = session.listen(&mut ep, SERVICE).unwrap();

        assert_eq!(outcome, ListenOutcome::Cancelled);
        assert_eq!(session.state(), LinkState::Failed);
    }

    #[test]
    fn responder_ignores_short_connect_lines() {
        // Shares the prefix but not the exact length; must not be taken
        // for a request. The operator cancels afterwards.
        let port = ScriptPort::with_lines(&[b"CONNECT AABB"]);
        let panel = KeyPanel::with_keys(&[Key::Center]);
        let mut ep = endpoint_with(port, panel);

        let mut session = LinkSession::new(LinkRole::Responder);
        let outcome = session.listen(&mut ep, SERVICE).unwrap();
        assert_eq!(outcome, ListenOutcome::Cancelled);
    }

    #[test]
    fn initiator_connects_after_handshake() {
        let port = ScriptPort::with_lines(&[b"CONNECT AABBCCDDEEFF", b"LETS START PLAYING"]);
        let mut ep = endpoint_with(port, KeyPanel::default());

        let mut session = LinkSession::new(LinkRole::Initiator);
        session.dial(&mut ep, addr()).unwrap();

        assert_eq!(session.state(), LinkState::Connected);

        let (port, _, _) = ep.into_parts();
        let sent = String::from_utf8_lossy(&port.sent).into_owned();
        assert!(sent.contains("AT+BTCLT=\"AABBCCDDEEFF\",20,3\r"));
    }

    #[test]
    fn initiator_times_out_without_connect_report() {
        let mut ep = endpoint_with(ScriptPort::default(), KeyPanel::default());

        let mut session = LinkSession::new(LinkRole::Initiator);
        let err = session.dial(&mut ep, addr()).unwrap_err();

        assert!(matches!(err, LinkError::Timeout { .. }));
        assert_eq!(session.state(), LinkState::Failed);
    }

    #[test]
    fn initiator_fails_fast_on_carrier_loss() {
        let port = ScriptPort::with_lines(&[b"NO CARRIER"]);
        let mut ep = endpoint_with(port, KeyPanel::default());

        let mut session = LinkSession::new(LinkRole::Initiator);
        let err = session.dial(&mut ep, addr()).unwrap_err();

        assert!(matches!(err, LinkError::CarrierLost));
        assert_eq!(session.state(), LinkState::Failed);
    }

    #[test]
    fn initiator_fails_when_handshake_never_arrives() {
        let port = ScriptPort::with_lines(&[b"CONNECT AABBCCDDEEFF"]);
        let mut ep = endpoint_with(port, KeyPanel::default());

        let mut session = LinkSession::new(LinkRole::Initiator);
        let err = session.dial(&mut ep, addr()).unwrap_err();

        assert!(matches!(err, LinkError::Timeout { operation: "session handshake" }));
        assert_eq!(session.state(), LinkState::Failed);
    }
}
