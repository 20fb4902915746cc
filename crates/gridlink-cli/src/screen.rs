//! Terminal front end for local play.
//!
//! A raw-mode crossterm screen implementing the panel and game surfaces,
//! plus the do-nothing serial port used when no radio is attached.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::{cursor, execute};
use gridlink_app::{GameScreen, Grid};
use gridlink_core::{Key, Panel, PeerRecord, SerialPort, Standing};

const ACTIVITY_FRAMES: [&str; 6] = ["   ", ".  ", ".. ", "...", " ..", "  ."];

/// Serial port for offline play: sends nowhere, receives nothing.
pub struct NullPort;

impl SerialPort for NullPort {
    fn send(&mut self, _bytes: &[u8]) -> io::Result<()> {
        Ok(())
    }

    fn poll_byte(&mut self) -> Option<u8> {
        None
    }
}

/// Raw-mode terminal screen. Restores the terminal on drop.
pub struct TerminalScreen {
    out: Stdout,
}

impl TerminalScreen {
    /// Enter raw mode and clear the screen.
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, Clear(ClearType::All), cursor::MoveTo(0, 0), cursor::Hide)?;
        Ok(Self { out })
    }

    fn put(&mut self, row: u16, text: &str) {
        let _ = execute!(self.out, cursor::MoveTo(0, row), Clear(ClearType::CurrentLine));
        let _ = write!(self.out, "{text}");
        let _ = self.out.flush();
    }
}

impl Drop for TerminalScreen {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show, cursor::MoveTo(0, 12));
        let _ = terminal::disable_raw_mode();
    }
}

fn leave_and_exit() -> ! {
    let _ = execute!(io::stdout(), cursor::Show);
    let _ = terminal::disable_raw_mode();
    std::process::exit(0)
}

impl Panel for TerminalScreen {
    fn poll_key(&mut self) -> Option<Key> {
        if !event::poll(Duration::ZERO).ok()? {
            return None;
        }
        match event::read().ok()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Up => Some(Key::Up),
                KeyCode::Down => Some(Key::Down),
                KeyCode::Left => Some(Key::Left),
                KeyCode::Right => Some(Key::Right),
                KeyCode::Enter => Some(Key::Center),
                KeyCode::Esc | KeyCode::Char('q') => leave_and_exit(),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    leave_and_exit()
                },
                _ => None,
            },
            _ => None,
        }
    }

    fn render_activity(&mut self, phase: usize) {
        self.put(10, ACTIVITY_FRAMES[phase % ACTIVITY_FRAMES.len()]);
    }

    fn render_peers(&mut self, peers: &[PeerRecord], cursor: usize) {
        for (slot, row) in (0..5u16).enumerate() {
            let marker = if slot == cursor { ">" } else { " " };
            let entry = match peers.get(slot) {
                Some(peer) => peer.addr.to_string(),
                None => "-".to_owned(),
            };
            self.put(2 + row, &format!("{marker} {entry}"));
        }
    }

    fn render_choices(&mut self, title: &str, choices: &[&str], cursor: usize) {
        self.put(2, title);
        for (slot, choice) in choices.iter().enumerate() {
            let marker = if slot == cursor { ">" } else { " " };
            self.put(3 + slot as u16, &format!("{marker} {choice}"));
        }
    }

    fn render_status(&mut self, status: &str) {
        self.put(0, status);
    }

    fn render_standing(&mut self, standing: Standing) {
        let text = match standing {
            Standing::Leading => "ahead",
            Standing::Trailing => "behind",
        };
        self.put(9, text);
    }
}

impl GameScreen for TerminalScreen {
    fn render_grid(&mut self, grid: &Grid) {
        self.put(0, "2048  (arrows move, q quits)");
        for (index, row) in grid.cells().iter().enumerate() {
            let mut line = String::new();
            for &cell in row {
                if cell == 0 {
                    line.push_str("    .");
                } else {
                    line.push_str(&format!("{cell:>5}"));
                }
            }
            self.put(2 + index as u16, &line);
        }
        self.put(7, &format!("score: {}", grid.score()));
    }

    fn render_scores(&mut self, local: u8, opponent: Option<u8>) {
        let line = match opponent {
            Some(opponent) => format!("you: {local}  peer: {opponent}"),
            None => format!("you: {local}"),
        };
        self.put(8, &line);
    }
}
