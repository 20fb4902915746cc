//! In-crate test doubles for the engine unit tests.
//!
//! The harness crate carries the full scripted modem; these are the
//! minimal fakes the unit tests need: a pre-scripted receive queue, a
//! virtual clock that advances only on yields, and a panel that replays
//! queued keys and records what was rendered.

use std::collections::VecDeque;
use std::io;
use std::time::{Duration, Instant};

use crate::config::LinkConfig;
use crate::discovery::PeerRecord;
use crate::endpoint::Endpoint;
use crate::env::Environment;
use crate::panel::{Key, Panel};
use crate::port::SerialPort;
use crate::session::Standing;

/// Serial port with a pre-scripted receive queue.
#[derive(Debug, Default)]
pub struct ScriptPort {
    /// Bytes still to be received.
    pub rx: VecDeque<u8>,
    /// Everything the engine sent.
    pub sent: Vec<u8>,
}

impl ScriptPort {
    /// Port whose receive queue holds the given lines, CRLF-terminated.
    pub fn with_lines(lines: &[&[u8]]) -> Self {
        let mut rx = VecDeque::new();
        for line in lines {
            rx.extend(line.iter().copied());
            rx.push_back(b'\r');
            rx.push_back(b'\n');
        }
        Self { rx, sent: Vec::new() }
    }
}

impl SerialPort for ScriptPort {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.sent.extend_from_slice(bytes);
        Ok(())
    }

    fn poll_byte(&mut self) -> Option<u8> {
        self.rx.pop_front()
    }
}

/// Clock that advances only when the engine yields.
#[derive(Debug)]
pub struct VirtualEnv {
    now: Instant,
}

impl VirtualEnv {
    /// Virtual clock anchored at an arbitrary point.
    pub fn new() -> Self {
        Self { now: Instant::now() }
    }
}

impl Environment for VirtualEnv {
    fn now(&self) -> Instant {
        self.now
    }

    fn yield_for(&mut self, duration: Duration) {
        self.now += duration;
    }
}

/// Panel that replays queued keys and records renders.
#[derive(Debug, Default)]
pub struct KeyPanel {
    /// Keys handed out by `poll_key`, in order.
    pub keys: VecDeque<Key>,
    /// Recorded status lines.
    pub statuses: Vec<String>,
    /// Recorded standing updates.
    pub standings: Vec<Standing>,
    /// Peer tables rendered, with the cursor position.
    pub peer_renders: Vec<(usize, usize)>,
}

impl KeyPanel {
    /// Panel that will replay the given keys.
    pub fn with_keys(keys: &[Key]) -> Self {
        Self { keys: keys.iter().copied().collect(), ..Self::default() }
    }
}

impl Panel for KeyPanel {
    fn poll_key(&mut self) -> Option<Key> {
        self.keys.pop_front()
    }

    fn render_activity(&mut self, _phase: usize) {}

    fn render_peers(&mut self, peers: &[PeerRecord], cursor: usize) {
        self.peer_renders.push((peers.len(), cursor));
    }

    fn render_choices(&mut self, _title: &str, _choices: &[&str], _cursor: usize) {}

    fn render_status(&mut self, status: &str) {
        self.statuses.push(status.to_owned());
    }

    fn render_standing(&mut self, standing: Standing) {
        self.standings.push(standing);
    }
}

/// Endpoint over the fakes with the default configuration.
pub fn endpoint_with(port: ScriptPort, panel: KeyPanel) -> Endpoint<ScriptPort, VirtualEnv, KeyPanel> {
    Endpoint::new(port, VirtualEnv::new(), panel, LinkConfig::default())
}
