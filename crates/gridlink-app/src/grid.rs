//! Board state and move mechanics.
//!
//! A move shifts every tile one step in the chosen direction, merging a
//! tile into an equal neighbor it collides with; each merge adds one
//! point. Tiles therefore travel one cell per keypress rather than
//! sliding to the wall - that is the deployed game's behavior and peers
//! compare scores produced by it, so it is kept as-is.

use rand::Rng;

/// Board edge length.
pub const GRID_SIZE: usize = 4;

/// Tile value that wins the game.
pub const WIN_TILE: u32 = 2048;

/// A move direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward row 0.
    Up,
    /// Toward the last row.
    Down,
    /// Toward column 0.
    Left,
    /// Toward the last column.
    Right,
}

/// The 4×4 board plus the running score.
///
/// The score counts merges, not tile values, and saturates at 255 - it
/// has to fit the single-byte wire encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cells: [[u32; GRID_SIZE]; GRID_SIZE],
    score: u8,
}

impl Grid {
    /// Empty board, zero score.
    pub fn new() -> Self {
        Self { cells: [[0; GRID_SIZE]; GRID_SIZE], score: 0 }
    }

    /// Board with the given cells, for tests and restores.
    pub fn from_cells(cells: [[u32; GRID_SIZE]; GRID_SIZE]) -> Self {
        Self { cells, score: 0 }
    }

    /// Current cells, row-major.
    pub fn cells(&self) -> &[[u32; GRID_SIZE]; GRID_SIZE] {
        &self.cells
    }

    /// Current score (merge count).
    pub fn score(&self) -> u8 {
        self.score
    }

    /// True when no cell is empty.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|row| row.iter().all(|&cell| cell != 0))
    }

    /// True when any cell reached the winning tile.
    pub fn has_won(&self) -> bool {
        self.cells.iter().any(|row| row.iter().any(|&cell| cell == WIN_TILE))
    }

    /// True when the game is over, by win or by a full board.
    pub fn is_finished(&self) -> bool {
        self.is_full() || self.has_won()
    }

    /// Place up to two 2-tiles on random empty cells.
    pub fn spawn_round<R: Rng>(&mut self, rng: &mut R) {
        for _ in 0..2 {
            if self.is_full() {
                return;
            }
            loop {
                let row = rng.gen_range(0..GRID_SIZE);
                let col = rng.gen_range(0..GRID_SIZE);
                if self.cells[row][col] == 0 {
                    self.cells[row][col] = 2;
                    break;
                }
            }
        }
    }

    /// Apply one move.
    pub fn shift(&mut self, direction: Direction) {
        match direction {
            Direction::Up => {
                for row in (1..GRID_SIZE).rev() {
                    for col in (0..GRID_SIZE).rev() {
                        self.collide(row, col, row - 1, col);
                    }
                }
            },
            Direction::Down => {
                for row in 0..GRID_SIZE - 1 {
                    for col in 0..GRID_SIZE {
                        self.collide(row, col, row + 1, col);
                    }
                }
            },
            Direction::Left => {
                for row in 0..GRID_SIZE {
                    for col in (1..GRID_SIZE).rev() {
                        self.collide(row, col, row, col - 1);
                    }
                }
            },
            Direction::Right => {
                for row in 0..GRID_SIZE {
                    for col in 0..GRID_SIZE - 1 {
                        self.collide(row, col, row, col + 1);
                    }
                }
            },
        }
    }

    /// Move the tile at `(row, col)` into `(to_row, to_col)`: merge if
    /// the values are equal, step into the cell if it is empty, stay put
    /// otherwise.
    fn collide(&mut self, row: usize, col: usize, to_row: usize, to_col: usize) {
        let value = self.cells[row][col];
        if value == 0 {
            return;
        }
        let target = self.cells[to_row][to_col];
        if target == 0 {
            self.cells[to_row][to_col] = value;
            self.cells[row][col] = 0;
        } else if target == value {
            self.score = self.score.saturating_add(1);
            self.cells[to_row][to_col] = value * 2;
            self.cells[row][col] = 0;
        }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}
