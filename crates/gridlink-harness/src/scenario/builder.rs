//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that
//! enforce the Oracle Pattern: the world is scripted up front, one drive
//! closure exercises an engine against it, and the oracle verifies the
//! outcome. A scenario without an oracle cannot be run.

use std::time::Duration;

use gridlink_core::{Endpoint, Key, LinkConfig};

use crate::scenario::OracleFn;
use crate::sim::{SimEnv, SimPanel, SimPort, SimWorld};

/// Scenario builder.
///
/// Script modem replies, free-running lines, and key presses, then call
/// `.oracle()` to get a [`RunnableScenario`].
pub struct Scenario {
    name: String,
    config: LinkConfig,
    replies: Vec<(String, Duration, Vec<String>)>,
    lines: Vec<(Duration, String)>,
    bytes: Vec<(Duration, Vec<u8>)>,
    keys: Vec<(Duration, Key)>,
}

impl Scenario {
    /// Create a new scenario with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: LinkConfig::default(),
            replies: Vec::new(),
            lines: Vec::new(),
            bytes: Vec::new(),
            keys: Vec::new(),
        }
    }

    /// Override the link configuration.
    pub fn with_config(mut self, config: LinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Script a modem reply: when an outgoing chunk starts with
    /// `trigger`, deliver `lines` after `delay`. Fires once.
    pub fn reply(mut self, trigger: &str, delay: Duration, lines: &[&str]) -> Self {
        self.replies.push((
            trigger.to_owned(),
            delay,
            lines.iter().map(|&line| line.to_owned()).collect(),
        ));
        self
    }

    /// Schedule a free-running line at an absolute virtual time.
    pub fn line_at(mut self, at: Duration, line: &str) -> Self {
        self.lines.push((at, line.to_owned()));
        self
    }

    /// Schedule raw bytes at an absolute virtual time.
    pub fn bytes_at(mut self, at: Duration, bytes: &[u8]) -> Self {
        self.bytes.push((at, bytes.to_vec()));
        self
    }

    /// Schedule a key press at an absolute virtual time.
    pub fn key_at(mut self, at: Duration, key: Key) -> Self {
        self.keys.push((at, key));
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute the scenario.
    ///
    /// Builds the world, hands an endpoint over it to `drive`, then runs
    /// the oracle against the final world state. Returns whatever the
    /// drive closure returned.
    pub fn run<F, R>(self, drive: F) -> Result<R, String>
    where
        F: FnOnce(&mut Endpoint<SimPort, SimEnv, SimPanel>) -> R,
    {
        let world = SimWorld::new();
        for (trigger, delay, lines) in &self.scenario.replies {
            let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
            world.reply(trigger, *delay, &refs);
        }
        for (at, line) in &self.scenario.lines {
            world.schedule_line(*at, line);
        }
        for (at, bytes) in &self.scenario.bytes {
            world.schedule_bytes(*at, bytes);
        }
        for (at, key) in &self.scenario.keys {
            world.schedule_key(*at, *key);
        }

        let mut endpoint = Endpoint::new(
            world.port(),
            world.env(),
            world.panel(),
            self.scenario.config.clone(),
        );
        let result = drive(&mut endpoint);

        (self.oracle)(&world)
            .map_err(|reason| format!("Scenario '{}': {}", self.scenario.name, reason))?;
        Ok(result)
    }
}
