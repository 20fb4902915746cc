//! Link timing configuration.
//!
//! Defaults mirror the radio module's latency envelope; the inquiry and
//! resolution deadlines in particular are module properties, not tuning
//! choices.

use std::time::Duration;

/// Timing knobs for the link engines.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Delay before the escape sequence when re-entering command mode.
    pub reset_preamble_delay: Duration,
    /// Interval between receive polls; the cooperative scheduling unit.
    pub poll_interval: Duration,
    /// Inquiry duration requested from the module, in seconds.
    pub inquiry_window_secs: u8,
    /// Deadline for collecting inquiry results. Slightly longer than the
    /// requested window so the completion marker can still arrive.
    pub inquiry_deadline: Duration,
    /// Deadline for one peer's service-record query. Generous: name
    /// resolution over the air is slow and variable.
    pub resolve_deadline: Duration,
    /// Deadline for the module to report an outgoing connection.
    pub connect_deadline: Duration,
    /// Deadline for the peer's handshake line once connected.
    pub handshake_deadline: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            reset_preamble_delay: Duration::from_millis(100),
            poll_interval: Duration::from_millis(1),
            inquiry_window_secs: 6,
            inquiry_deadline: Duration::from_millis(6_500),
            resolve_deadline: Duration::from_secs(100),
            connect_deadline: Duration::from_secs(10),
            handshake_deadline: Duration::from_secs(10),
        }
    }
}
