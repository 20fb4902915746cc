//! gridlink command line.
//!
//! `play` runs the single-player game in the terminal, `demo` drives a
//! full discovery → dial → score-sync exchange against the simulated
//! modem, and `scores`/`clear-scores` manage the persisted best-score
//! table.
#![allow(clippy::print_stdout)]

mod screen;

use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use gridlink_app::{Duel, GameEnd, GameKind, ScoreBoard};
use gridlink_core::{
    Discovery, DiscoveryOutcome, Endpoint, Key, LinkConfig, LinkRole, LinkSession, SERVICE_NAME,
    ScoreSync, StdEnvironment, SyncEvent,
};
use gridlink_harness::SimWorld;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::screen::{NullPort, TerminalScreen};

#[derive(Parser)]
#[command(name = "gridlink", about = "Two-player 2048 over a serial Bluetooth link")]
struct Cli {
    /// Score-board file.
    #[arg(long, default_value = "gridlink-scores.cbor")]
    scores: PathBuf,

    #[command(subcommand)]
    command: CommandLine,
}

#[derive(Subcommand)]
enum CommandLine {
    /// Play a single-player game in the terminal.
    Play,
    /// Run a scripted two-role exchange against the simulated modem.
    Demo,
    /// Show the saved score board.
    Scores,
    /// Clear the saved score board.
    ClearScores,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        CommandLine::Play => play(&cli.scores),
        CommandLine::Demo => demo(),
        CommandLine::Scores => show_scores(&cli.scores),
        CommandLine::ClearScores => clear_scores(&cli.scores),
    }
}

fn play(scores_path: &Path) -> Result<(), Box<dyn Error>> {
    let screen = TerminalScreen::new()?;
    let mut endpoint =
        Endpoint::new(NullPort, StdEnvironment, screen, LinkConfig::default());
    let mut rng = rand::thread_rng();

    let mut duel = Duel::new(GameKind::Single);
    let end = duel.run(&mut endpoint, &mut rng)?;

    let (_, _, screen) = endpoint.into_parts();
    drop(screen); // leaves raw mode before printing the summary

    let score = match end {
        GameEnd::Finished { score } | GameEnd::PeerDisconnected { score } => score,
    };
    println!("Game over. Score: {score}");

    let mut board = load_scores(scores_path)?;
    if board.record(score) {
        save_scores(scores_path, &board)?;
        println!("New entry on the score board.");
    }
    Ok(())
}

/// Scripted end-to-end exchange: discovery, dial, handshake, three score
/// rounds, carrier drop. The peer is the harness's modem script; the
/// transcript goes to stdout.
fn demo() -> Result<(), Box<dyn Error>> {
    let world = SimWorld::new();
    world.reply(
        "AT+BTINQ",
        Duration::from_millis(400),
        &["+BTINQ: AABBCCDDEEFF,201F040", "+BTINQ: COMPLETE"],
    );
    world.reply(
        "AT+BTSDP=AABBCCDDEEFF",
        Duration::from_millis(600),
        &["+BTSDP: 1 \"2048Server\" RFCOMM", "+BTSDP: COMPLETE"],
    );
    world.reply("AT+BTCLT", Duration::from_millis(300), &["CONNECT AABBCCDDEEFF"]);
    world.schedule_key(Duration::from_secs(2), Key::Center);
    world.schedule_line(Duration::from_millis(3_500), "LETS START PLAYING");
    world.schedule_line(Duration::from_millis(4_500), "S20");
    world.schedule_line(Duration::from_millis(5_500), "SA0");
    world.schedule_line(Duration::from_millis(6_500), "NO CARRIER");

    let mut endpoint =
        Endpoint::new(world.port(), world.env(), world.panel(), LinkConfig::default());

    let mut discovery = Discovery::new();
    let peer = match discovery.run(&mut endpoint, SERVICE_NAME)? {
        DiscoveryOutcome::Found(peer) => peer,
        DiscoveryOutcome::NoneFound => return Err("demo modem script found no peer".into()),
    };
    info!(addr = %peer.addr, "demo peer discovered");

    let mut session = LinkSession::new(LinkRole::Initiator);
    session.dial(&mut endpoint, peer.addr)?;
    info!("demo link connected");

    let mut sync = ScoreSync::new();
    for local in [3u8, 7, 12] {
        endpoint.yield_for(Duration::from_secs(1));
        match sync.exchange(&mut endpoint, local)? {
            SyncEvent::Disconnected => {
                info!("demo peer disconnected");
                break;
            },
            SyncEvent::OpponentScore(score) => info!(score, "opponent score"),
            SyncEvent::Idle => {},
        }
    }

    println!("-- transcript (sent) --");
    for line in world.tx_lines() {
        println!("> {line}");
    }
    println!("-- renders --");
    for status in world.statuses() {
        println!("status: {status}");
    }
    for standing in world.standings() {
        println!("standing: {standing:?}");
    }
    println!("elapsed (virtual): {:?}", world.elapsed());
    Ok(())
}

fn show_scores(path: &Path) -> Result<(), Box<dyn Error>> {
    let board = load_scores(path)?;
    match board.best() {
        Some(best) => {
            println!("best: {best}");
            for (slot, score) in board.entries().iter().enumerate() {
                println!("{:>2}: {score}", slot + 1);
            }
        },
        None => println!("no scores recorded"),
    }
    Ok(())
}

fn clear_scores(path: &Path) -> Result<(), Box<dyn Error>> {
    save_scores(path, &ScoreBoard::new())?;
    println!("score board cleared");
    Ok(())
}

fn load_scores(path: &Path) -> Result<ScoreBoard, Box<dyn Error>> {
    if !path.exists() {
        return Ok(ScoreBoard::new());
    }
    let file = File::open(path)?;
    Ok(ciborium::de::from_reader(file)?)
}

fn save_scores(path: &Path, board: &ScoreBoard) -> Result<(), Box<dyn Error>> {
    let file = File::create(path)?;
    ciborium::ser::into_writer(board, file)?;
    Ok(())
}
