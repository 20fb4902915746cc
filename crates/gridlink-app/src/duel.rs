//! Duel orchestration.
//!
//! The per-keypress game loop: apply the move, spawn tiles, render, and
//! in dual mode exchange scores over the open channel. The score goes
//! out after every keypress; inbound lines are drained at the same time.
//! An opponent disconnect ends the duel with the score so far, which the
//! caller can still record.

use gridlink_core::{Endpoint, Environment, Key, LinkError, Panel, ScoreSync, SerialPort, SyncEvent};
use rand::Rng;
use tracing::{debug, info};

use crate::grid::{Direction, Grid};

/// Pause between input polls in the game loop.
const INPUT_POLL: std::time::Duration = std::time::Duration::from_millis(20);

/// Whether a session plays alone or against a connected peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameKind {
    /// Local game; no link traffic.
    Single,
    /// Score-synced game over an open channel.
    Duel,
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEnd {
    /// The board finished (win or full).
    Finished {
        /// Final score.
        score: u8,
    },
    /// The peer disconnected mid-game.
    PeerDisconnected {
        /// Score at the moment of disconnect.
        score: u8,
    },
}

/// Game rendering surface, on top of the protocol panel.
pub trait GameScreen: Panel {
    /// Render the board.
    fn render_grid(&mut self, grid: &Grid);

    /// Render both scores.
    fn render_scores(&mut self, local: u8, opponent: Option<u8>);
}

/// One game, single or dual.
#[derive(Debug)]
pub struct Duel {
    kind: GameKind,
    grid: Grid,
    sync: ScoreSync,
}

impl Duel {
    /// New game of the given kind with an empty board.
    pub fn new(kind: GameKind) -> Self {
        Self::with_grid(kind, Grid::new())
    }

    /// New game over an existing board, e.g. a restored one.
    pub fn with_grid(kind: GameKind, grid: Grid) -> Self {
        Self { kind, grid, sync: ScoreSync::new() }
    }

    /// The board.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Last opponent score seen, in display units.
    pub fn opponent_score(&self) -> Option<u8> {
        self.sync.opponent()
    }

    /// Run the game loop to completion.
    pub fn run<P, E, U, R>(
        &mut self,
        ep: &mut Endpoint<P, E, U>,
        rng: &mut R,
    ) -> Result<GameEnd, LinkError>
    where
        P: SerialPort,
        E: Environment,
        U: GameScreen,
        R: Rng,
    {
        self.grid.spawn_round(rng);
        ep.panel_mut().render_grid(&self.grid);

        loop {
            if let Some(key) = ep.panel_mut().poll_key() {
                if let Some(direction) = direction_of(key) {
                    self.grid.shift(direction);
                    self.grid.spawn_round(rng);
                    ep.panel_mut().render_grid(&self.grid);
                    debug!(score = self.grid.score(), "move applied");
                }

                if self.kind == GameKind::Duel {
                    let score = self.grid.score();
                    if self.sync.exchange(ep, score)? == SyncEvent::Disconnected {
                        info!(score, "peer disconnected");
                        return Ok(GameEnd::PeerDisconnected { score });
                    }
                    ep.panel_mut().render_scores(score, self.sync.opponent());
                }
            }

            if self.grid.is_finished() {
                let score = self.grid.score();
                info!(score, "game finished");
                return Ok(GameEnd::Finished { score });
            }

            ep.yield_for(INPUT_POLL);
        }
    }
}

fn direction_of(key: Key) -> Option<Direction> {
    match key {
        Key::Up => Some(Direction::Up),
        Key::Down => Some(Direction::Down),
        Key::Left => Some(Direction::Left),
        Key::Right => Some(Direction::Right),
        Key::Center => None,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gridlink_core::{LinkConfig, PeerRecord, Standing};
    use gridlink_harness::{SimPanel, SimWorld};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    /// SimPanel plus the two game render calls.
    struct Screen {
        panel: SimPanel,
        grids: usize,
        scores: Vec<(u8, Option<u8>)>,
    }

    impl Screen {
        fn new(panel: SimPanel) -> Self {
            Self { panel, grids: 0, scores: Vec::new() }
        }
    }

    impl Panel for Screen {
        fn poll_key(&mut self) -> Option<Key> {
            self.panel.poll_key()
        }

        fn render_activity(&mut self, phase: usize) {
            self.panel.render_activity(phase);
        }

        fn render_peers(&mut self, peers: &[PeerRecord], cursor: usize) {
            self.panel.render_peers(peers, cursor);
        }

        fn render_choices(&mut self, title: &str, choices: &[&str], cursor: usize) {
            self.panel.render_choices(title, choices, cursor);
        }

        fn render_status(&mut self, status: &str) {
            self.panel.render_status(status);
        }

        fn render_standing(&mut self, standing: Standing) {
            self.panel.render_standing(standing);
        }
    }

    impl GameScreen for Screen {
        fn render_grid(&mut self, _grid: &Grid) {
            self.grids += 1;
        }

        fn render_scores(&mut self, local: u8, opponent: Option<u8>) {
            self.scores.push((local, opponent));
        }
    }

    fn endpoint(world: &SimWorld) -> Endpoint<gridlink_harness::SimPort, gridlink_harness::SimEnv, Screen> {
        Endpoint::new(world.port(), world.env(), Screen::new(world.panel()), LinkConfig::default())
    }

    #[test]
    fn duel_sends_score_after_each_keypress() {
        let world = SimWorld::new();
        world.schedule_key(Duration::from_millis(20), Key::Left);
        // The hangup lands between the two moves, so the second
        // exchange is the one that sees it.
        world.schedule_line(Duration::from_millis(40), "NO CARRIER");
        world.schedule_key(Duration::from_millis(60), Key::Up);

        let mut ep = endpoint(&world);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut duel = Duel::new(GameKind::Duel);
        let end = duel.run(&mut ep, &mut rng).unwrap();

        assert!(matches!(end, GameEnd::PeerDisconnected { .. }));
        // One score line per keypress before the disconnect.
        let score_lines: Vec<String> = world
            .tx_lines()
            .into_iter()
            .filter(|line| line.starts_with('S'))
            .collect();
        assert_eq!(score_lines.len(), 2);
    }

    #[test]
    fn duel_tracks_opponent_score() {
        let world = SimWorld::new();
        world.schedule_line(Duration::from_millis(10), "SA0");
        world.schedule_key(Duration::from_millis(20), Key::Left);
        world.schedule_line(Duration::from_millis(30), "NO CARRIER");
        world.schedule_key(Duration::from_millis(40), Key::Right);

        let mut ep = endpoint(&world);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut duel = Duel::new(GameKind::Duel);
        let end = duel.run(&mut ep, &mut rng).unwrap();

        // 0xA0 = 160 raw = 10 display units, seen on the first exchange;
        // the second exchange hits the carrier drop.
        assert_eq!(duel.opponent_score(), Some(10));
        assert!(matches!(end, GameEnd::PeerDisconnected { .. }));
    }

    #[test]
    fn single_player_sends_nothing() {
        let world = SimWorld::new();
        world.schedule_key(Duration::from_millis(20), Key::Left);

        // Board with two free cells and no mergeable neighbors: the
        // opening spawn fills it and the game ends immediately.
        let grid = Grid::from_cells([
            [2, 4, 2, 4],
            [4, 2, 4, 2],
            [2, 4, 2, 4],
            [4, 2, 4, 0],
        ]);

        let mut ep = endpoint(&world);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        let mut duel = Duel::with_grid(GameKind::Single, grid);
        let end = duel.run(&mut ep, &mut rng).unwrap();

        assert!(matches!(end, GameEnd::Finished { .. }));
        assert!(world.tx_lines().is_empty());
    }
}
