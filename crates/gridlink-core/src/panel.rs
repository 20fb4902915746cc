//! Display and key-input collaborator.
//!
//! The engines only need a narrow surface: non-blocking key polling (so
//! unbounded waits stay cancellable), and a handful of render calls.
//! Rendering is cosmetic and must not alter protocol timing.

use crate::discovery::PeerRecord;
use crate::session::Standing;

/// Number of activity-indicator phases in one rotation.
pub const ACTIVITY_PHASES: usize = 6;

/// A key event from the input collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Cursor up.
    Up,
    /// Cursor down.
    Down,
    /// Cursor left.
    Left,
    /// Cursor right.
    Right,
    /// Confirm.
    Center,
}

/// Display and key-input surface the engines drive.
pub trait Panel {
    /// Next pending key event, if any. Never blocks.
    fn poll_key(&mut self) -> Option<Key>;

    /// Render one frame of the rotating activity indicator.
    fn render_activity(&mut self, phase: usize);

    /// Render the discovered peer table with the selection cursor.
    ///
    /// `cursor` ranges over the table capacity, not just the filled
    /// entries; empty slots render as placeholders.
    fn render_peers(&mut self, peers: &[PeerRecord], cursor: usize);

    /// Render a titled list of choices with a cursor.
    fn render_choices(&mut self, title: &str, choices: &[&str], cursor: usize);

    /// Render a one-line status message.
    fn render_status(&mut self, status: &str);

    /// Render the winning/losing indicator.
    fn render_standing(&mut self, standing: Standing);
}
