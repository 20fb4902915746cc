//! Game layer for gridlink.
//!
//! The 4×4 sliding-tile game, the best-score table, and the duel loop
//! that feeds the local score into the link layer's score-sync session.
//! Everything here is pure state plus the same three collaborator traits
//! the protocol engines use, so the whole game runs under the simulation
//! harness.
//!
//! # Components
//!
//! - [`Grid`]: board state, moves, merges, scoring
//! - [`ScoreBoard`]: eight-entry keep-if-better table
//! - [`Duel`]: per-keypress orchestration loop, single or dual mode

pub mod duel;
pub mod grid;
pub mod scores;

pub use duel::{Duel, GameEnd, GameKind, GameScreen};
pub use grid::{Direction, Grid};
pub use scores::ScoreBoard;
