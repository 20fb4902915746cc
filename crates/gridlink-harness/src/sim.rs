//! Simulated collaborators over shared virtual-time state.
//!
//! All three trait objects ([`SimPort`], [`SimEnv`], [`SimPanel`]) are
//! thin handles onto one [`SimWorld`]. The clock advances only inside
//! `yield_for`, and scheduled bytes and keys become visible exactly when
//! the virtual clock passes their timestamps, so scenarios are
//! deterministic regardless of host load.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use gridlink_core::{Environment, Key, Panel, PeerRecord, SerialPort, Standing};
use tracing::trace;

struct Injection {
    at: Duration,
    seq: u64,
    bytes: Vec<u8>,
    delivered: bool,
}

struct Reply {
    trigger: String,
    delay: Duration,
    lines: Vec<String>,
    consumed: bool,
}

struct KeyEvent {
    at: Duration,
    key: Key,
    delivered: bool,
}

struct Inner {
    base: Instant,
    elapsed: Duration,
    seq: u64,
    rx: VecDeque<u8>,
    injections: Vec<Injection>,
    replies: Vec<Reply>,
    keys: Vec<KeyEvent>,
    tx_raw: Vec<u8>,
    tx_partial: Vec<u8>,
    tx_lines: Vec<String>,
    statuses: Vec<String>,
    choice_prompts: Vec<String>,
    standings: Vec<Standing>,
    peer_renders: Vec<(usize, usize)>,
    activity_frames: usize,
}

impl Inner {
    fn new() -> Self {
        Self {
            base: Instant::now(),
            elapsed: Duration::ZERO,
            seq: 0,
            rx: VecDeque::new(),
            injections: Vec::new(),
            replies: Vec::new(),
            keys: Vec::new(),
            tx_raw: Vec::new(),
            tx_partial: Vec::new(),
            tx_lines: Vec::new(),
            statuses: Vec::new(),
            choice_prompts: Vec::new(),
            standings: Vec::new(),
            peer_renders: Vec::new(),
            activity_frames: 0,
        }
    }

    fn schedule(&mut self, at: Duration, bytes: Vec<u8>) {
        let seq = self.seq;
        self.seq += 1;
        self.injections.push(Injection { at, seq, bytes, delivered: false });
    }

    /// Move every injection whose time has come onto the receive queue,
    /// in (time, insertion) order.
    fn deliver_due(&mut self) {
        let elapsed = self.elapsed;
        let mut due: Vec<usize> = self
            .injections
            .iter()
            .enumerate()
            .filter(|(_, inj)| !inj.delivered && inj.at <= elapsed)
            .map(|(i, _)| i)
            .collect();
        due.sort_by_key(|&i| (self.injections[i].at, self.injections[i].seq));
        for i in due {
            self.injections[i].delivered = true;
            let bytes = self.injections[i].bytes.clone();
            self.rx.extend(bytes);
        }
    }

    /// Record outgoing bytes and parse them into command/data chunks.
    ///
    /// The escape sequence is the one command without a terminator, so
    /// it is matched as a complete partial buffer.
    fn transmit(&mut self, bytes: &[u8]) {
        self.tx_raw.extend_from_slice(bytes);
        self.tx_partial.extend_from_slice(bytes);
        loop {
            if self.tx_partial == b"+++" {
                self.tx_partial.clear();
                self.complete_chunk("+++".to_owned());
                continue;
            }
            let Some(pos) = self.tx_partial.iter().position(|&b| b == b'\r' || b == b'\n') else {
                break;
            };
            let chunk: Vec<u8> = self.tx_partial.drain(..=pos).take(pos).collect();
            if chunk.is_empty() {
                continue;
            }
            self.complete_chunk(String::from_utf8_lossy(&chunk).into_owned());
        }
    }

    fn complete_chunk(&mut self, chunk: String) {
        trace!(%chunk, "outgoing chunk");
        let matched = self
            .replies
            .iter_mut()
            .find(|reply| !reply.consumed && chunk.starts_with(&reply.trigger));
        let scheduled: Option<(Duration, Vec<String>)> =
            matched.map(|reply| {
                reply.consumed = true;
                (reply.delay, reply.lines.clone())
            });
        if let Some((delay, lines)) = scheduled {
            let at = self.elapsed + delay;
            for line in lines {
                let mut bytes = line.into_bytes();
                bytes.extend_from_slice(b"\r\n");
                self.schedule(at, bytes);
            }
        }
        self.tx_lines.push(chunk);
    }

    fn next_key(&mut self) -> Option<Key> {
        let elapsed = self.elapsed;
        let due = self
            .keys
            .iter_mut()
            .filter(|event| !event.delivered && event.at <= elapsed)
            .min_by_key(|event| event.at)?;
        due.delivered = true;
        Some(due.key)
    }
}

/// Shared simulation state; cloning yields another handle to the same
/// world.
#[derive(Clone)]
pub struct SimWorld {
    inner: Rc<RefCell<Inner>>,
}

impl SimWorld {
    /// New empty world at virtual time zero.
    pub fn new() -> Self {
        Self { inner: Rc::new(RefCell::new(Inner::new())) }
    }

    /// Serial-port handle for an endpoint.
    pub fn port(&self) -> SimPort {
        SimPort { inner: Rc::clone(&self.inner) }
    }

    /// Environment handle for an endpoint.
    pub fn env(&self) -> SimEnv {
        SimEnv { inner: Rc::clone(&self.inner) }
    }

    /// Panel handle for an endpoint.
    pub fn panel(&self) -> SimPanel {
        SimPanel { inner: Rc::clone(&self.inner) }
    }

    /// Schedule a CRLF-terminated line at an absolute virtual time.
    pub fn schedule_line(&self, at: Duration, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.extend_from_slice(b"\r\n");
        self.inner.borrow_mut().schedule(at, bytes);
    }

    /// Schedule raw bytes at an absolute virtual time.
    pub fn schedule_bytes(&self, at: Duration, bytes: &[u8]) {
        self.inner.borrow_mut().schedule(at, bytes.to_vec());
    }

    /// Schedule a key press at an absolute virtual time.
    pub fn schedule_key(&self, at: Duration, key: Key) {
        self.inner.borrow_mut().keys.push(KeyEvent { at, key, delivered: false });
    }

    /// Script the modem: when an outgoing chunk starts with `trigger`,
    /// deliver `lines` after `delay`. Each registration fires once, in
    /// registration order.
    pub fn reply(&self, trigger: &str, delay: Duration, lines: &[&str]) {
        self.inner.borrow_mut().replies.push(Reply {
            trigger: trigger.to_owned(),
            delay,
            lines: lines.iter().map(|&line| line.to_owned()).collect(),
            consumed: false,
        });
    }

    /// Virtual time elapsed so far.
    pub fn elapsed(&self) -> Duration {
        self.inner.borrow().elapsed
    }

    /// Every outgoing command/data chunk, in order.
    pub fn tx_lines(&self) -> Vec<String> {
        self.inner.borrow().tx_lines.clone()
    }

    /// Raw outgoing byte stream.
    pub fn tx_raw(&self) -> Vec<u8> {
        self.inner.borrow().tx_raw.clone()
    }

    /// Status lines the engines rendered.
    pub fn statuses(&self) -> Vec<String> {
        self.inner.borrow().statuses.clone()
    }

    /// Choice prompts the engines rendered.
    pub fn choice_prompts(&self) -> Vec<String> {
        self.inner.borrow().choice_prompts.clone()
    }

    /// Standing updates the engines rendered.
    pub fn standings(&self) -> Vec<Standing> {
        self.inner.borrow().standings.clone()
    }

    /// (table length, cursor) for each peer-table render.
    pub fn peer_renders(&self) -> Vec<(usize, usize)> {
        self.inner.borrow().peer_renders.clone()
    }

    /// Number of activity-indicator frames rendered.
    pub fn activity_frames(&self) -> usize {
        self.inner.borrow().activity_frames
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulated serial port.
pub struct SimPort {
    inner: Rc<RefCell<Inner>>,
}

impl SerialPort for SimPort {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.borrow_mut().transmit(bytes);
        Ok(())
    }

    fn poll_byte(&mut self) -> Option<u8> {
        let mut inner = self.inner.borrow_mut();
        inner.deliver_due();
        inner.rx.pop_front()
    }
}

/// Simulated environment: virtual time that advances on yields.
pub struct SimEnv {
    inner: Rc<RefCell<Inner>>,
}

impl Environment for SimEnv {
    fn now(&self) -> Instant {
        let inner = self.inner.borrow();
        inner.base + inner.elapsed
    }

    fn yield_for(&mut self, duration: Duration) {
        let mut inner = self.inner.borrow_mut();
        inner.elapsed += duration;
        inner.deliver_due();
    }
}

/// Simulated panel: scheduled keys in, recorded renders out.
pub struct SimPanel {
    inner: Rc<RefCell<Inner>>,
}

impl Panel for SimPanel {
    fn poll_key(&mut self) -> Option<Key> {
        self.inner.borrow_mut().next_key()
    }

    fn render_activity(&mut self, _phase: usize) {
        self.inner.borrow_mut().activity_frames += 1;
    }

    fn render_peers(&mut self, peers: &[PeerRecord], cursor: usize) {
        self.inner.borrow_mut().peer_renders.push((peers.len(), cursor));
    }

    fn render_choices(&mut self, title: &str, _choices: &[&str], _cursor: usize) {
        self.inner.borrow_mut().choice_prompts.push(title.to_owned());
    }

    fn render_status(&mut self, status: &str) {
        self.inner.borrow_mut().statuses.push(status.to_owned());
    }

    fn render_standing(&mut self, standing: Standing) {
        self.inner.borrow_mut().standings.push(standing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduled_bytes_arrive_when_time_passes() {
        let world = SimWorld::new();
        world.schedule_bytes(Duration::from_millis(5), b"A");

        let mut port = world.port();
        let mut env = world.env();

        assert_eq!(port.poll_byte(), None);
        env.yield_for(Duration::from_millis(4));
        assert_eq!(port.poll_byte(), None);
        env.yield_for(Duration::from_millis(1));
        assert_eq!(port.poll_byte(), Some(b'A'));
    }

    #[test]
    fn reply_fires_on_command_prefix() {
        let world = SimWorld::new();
        world.reply("AT+BTINQ", Duration::from_millis(10), &["+BTINQ: COMPLETE"]);

        let mut port = world.port();
        let mut env = world.env();

        port.send(b"AT+BTINQ=6\r").unwrap();
        assert_eq!(port.poll_byte(), None);
        env.yield_for(Duration::from_millis(10));
        let mut line = Vec::new();
        while let Some(byte) = port.poll_byte() {
            line.push(byte);
        }
        assert_eq!(line, b"+BTINQ: COMPLETE\r\n");
    }

    #[test]
    fn escape_is_parsed_without_terminator() {
        let world = SimWorld::new();
        let mut port = world.port();
        port.send(b"+++").unwrap();
        port.send(b"AT+BTCAN\r").unwrap();
        assert_eq!(world.tx_lines(), vec!["+++".to_owned(), "AT+BTCAN".to_owned()]);
    }

    #[test]
    fn data_lines_are_split_on_newline() {
        let world = SimWorld::new();
        let mut port = world.port();
        port.send(b"\nLETS START PLAYING\n").unwrap();
        port.send(b"SA2\n").unwrap();
        assert_eq!(
            world.tx_lines(),
            vec!["LETS START PLAYING".to_owned(), "SA2".to_owned()]
        );
    }

    #[test]
    fn keys_are_delivered_in_time_order() {
        let world = SimWorld::new();
        world.schedule_key(Duration::from_millis(20), Key::Center);
        world.schedule_key(Duration::from_millis(10), Key::Down);

        let mut env = world.env();
        let mut panel = world.panel();

        assert_eq!(panel.poll_key(), None);
        env.yield_for(Duration::from_millis(25));
        assert_eq!(panel.poll_key(), Some(Key::Down));
        assert_eq!(panel.poll_key(), Some(Key::Center));
    }
}
