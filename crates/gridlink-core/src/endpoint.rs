//! Command/response matcher.
//!
//! [`Endpoint`] bundles the serial port, the clock, the display, and the
//! single receive-line buffer, and provides the one deadline-poll loop
//! every engine uses: drain the port into the line assembler, yield for
//! the poll interval, re-check the deadline. While idling it rotates a
//! six-phase activity indicator; that is cosmetic and does not affect
//! timing.

use std::time::{Duration, Instant};

use bytes::Bytes;
use gridlink_proto::{Command, LineAssembler, Response, classify};
use tracing::trace;

use crate::config::LinkConfig;
use crate::env::Environment;
use crate::error::LinkError;
use crate::panel::{ACTIVITY_PHASES, Panel};
use crate::port::SerialPort;

/// Poll ticks per indicator phase: one full rotation every 150 ticks.
const TICKS_PER_PHASE: u32 = 25;

/// The protocol endpoint: transport, clock, display, receive buffer.
///
/// Exactly one endpoint owns a link at a time; the receive-line buffer
/// and the poll-tick counter are its private state.
pub struct Endpoint<P, E, U> {
    port: P,
    env: E,
    panel: U,
    assembler: LineAssembler,
    config: LinkConfig,
    ticks: u32,
}

impl<P: SerialPort, E: Environment, U: Panel> Endpoint<P, E, U> {
    /// New endpoint over the given collaborators.
    pub fn new(port: P, env: E, panel: U, config: LinkConfig) -> Self {
        Self { port, env, panel, assembler: LineAssembler::new(), config, ticks: 0 }
    }

    /// The active configuration.
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Current time, from the environment.
    pub fn now(&self) -> Instant {
        self.env.now()
    }

    /// Yield control cooperatively.
    pub fn yield_for(&mut self, duration: Duration) {
        self.env.yield_for(duration);
    }

    /// The display/key collaborator.
    pub fn panel_mut(&mut self) -> &mut U {
        &mut self.panel
    }

    /// Send one command and wait out its settle delay.
    pub fn command(&mut self, command: &Command) -> Result<(), LinkError> {
        trace!(?command, "send command");
        self.port.send(&command.encode())?;
        let settle = command.settle();
        if settle > Duration::ZERO {
            self.env.yield_for(settle);
        }
        Ok(())
    }

    /// Put the module back into command mode and cancel whatever it was
    /// doing. Required before every listen, inquiry, or dial.
    pub fn reset_modem(&mut self) -> Result<(), LinkError> {
        let delay = self.config.reset_preamble_delay;
        self.env.yield_for(delay);
        self.command(&Command::Escape)?;
        self.command(&Command::Cancel)
    }

    /// Send raw bytes on the open channel.
    pub fn send_raw(&mut self, bytes: &[u8]) -> Result<(), LinkError> {
        self.port.send(bytes)?;
        Ok(())
    }

    /// Drain pending receive bytes and return the next completed line,
    /// if one completed. Never blocks.
    pub fn poll_line(&mut self) -> Option<Bytes> {
        while let Some(byte) = self.port.poll_byte() {
            if let Some(line) = self.assembler.feed(byte) {
                trace!(line = %String::from_utf8_lossy(&line), "line");
                return Some(line);
            }
        }
        None
    }

    /// One cooperative wait step: advance the activity indicator and
    /// yield for the poll interval.
    pub fn idle_tick(&mut self) {
        let phase = (self.ticks / TICKS_PER_PHASE) as usize % ACTIVITY_PHASES;
        self.panel.render_activity(phase);
        self.ticks = self.ticks.wrapping_add(1);
        let interval = self.config.poll_interval;
        self.env.yield_for(interval);
    }

    /// Next completed line before `deadline`, or `None` on timeout.
    pub fn await_line(&mut self, deadline: Instant) -> Option<Bytes> {
        loop {
            if let Some(line) = self.poll_line() {
                return Some(line);
            }
            if self.env.now() >= deadline {
                return None;
            }
            self.idle_tick();
        }
    }

    /// Next line before `deadline`, classified.
    pub fn await_response(&mut self, deadline: Instant) -> Option<(Bytes, Response)> {
        self.await_line(deadline).map(|line| {
            let response = classify(&line);
            (line, response)
        })
    }

    /// Tear the endpoint down into its collaborators, e.g. to hand the
    /// port to a different engine once the session is over.
    pub fn into_parts(self) -> (P, E, U) {
        (self.port, self.env, self.panel)
    }
}
