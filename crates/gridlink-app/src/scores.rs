//! Best-score table.
//!
//! Eight slots, keep-if-better: a finished game's score replaces the
//! first stored entry it beats. The table is not kept sorted; slot order
//! is the order scores were recorded in.

use serde::{Deserialize, Serialize};

/// Number of score slots.
pub const SCORE_SLOTS: usize = 8;

/// The best-score table. Frontends own persistence; this is just the
/// replacement policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBoard {
    entries: [u8; SCORE_SLOTS],
}

impl ScoreBoard {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored scores, slot order.
    pub fn entries(&self) -> &[u8; SCORE_SLOTS] {
        &self.entries
    }

    /// Record a score if it beats any stored entry; returns whether it
    /// was kept.
    pub fn record(&mut self, score: u8) -> bool {
        match self.entries.iter_mut().find(|entry| **entry < score) {
            Some(slot) => {
                *slot = score;
                true
            },
            None => false,
        }
    }

    /// Best stored score, if any slot is non-zero.
    pub fn best(&self) -> Option<u8> {
        self.entries.iter().copied().filter(|&score| score > 0).max()
    }

    /// Reset every slot.
    pub fn clear(&mut self) {
        self.entries = [0; SCORE_SLOTS];
    }
}
