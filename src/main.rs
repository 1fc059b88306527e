//! Michi-Libmap: developer front end for the tactical libmap.
//!
//! ## Usage
//!
//! - `michi-libmap` - Run the demo with default settings
//! - `michi-libmap demo --playouts 5000 --threads 8` - Learn from playouts
//! - `michi-libmap --libmap pick_mode=ucb:eval=global config` - Show the
//!   resolved libmap configuration
//!
//! Set `RUST_LOG=debug` (or `trace`) to follow the tactics and the store.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use michi_libmap::board::{Color, Move};
use michi_libmap::config::LibmapConfig;
use michi_libmap::constants::{DEFAULT_PLAYOUTS, DEFAULT_SIZE, MAX_SIZE};
use michi_libmap::libmap::LibmapStore;
use michi_libmap::playout::run_playouts;
use michi_libmap::position::Board;

/// Michi-Libmap: tactical memoization for Go playouts
#[derive(Parser)]
#[command(name = "michi-libmap")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Libmap options, colon-separated `name[=value]` pairs
    #[arg(long, global = true, default_value = "")]
    libmap: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run playouts from an empty board and report what the libmap learned
    Demo {
        #[arg(long, default_value_t = DEFAULT_PLAYOUTS)]
        playouts: usize,
        #[arg(long, default_value_t = 4)]
        threads: usize,
        #[arg(long, default_value_t = DEFAULT_SIZE)]
        size: usize,
        #[arg(long, default_value_t = 1)]
        seed: u64,
    },
    /// Print the resolved libmap configuration
    Config,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // A bad option string is fatal.
    let config = LibmapConfig::parse(&cli.libmap).context("invalid --libmap options")?;

    match cli.command {
        Some(Commands::Config) => {
            println!("{config}");
            Ok(())
        }
        Some(Commands::Demo {
            playouts,
            threads,
            size,
            seed,
        }) => run_demo(&config, playouts, threads, size, seed),
        None => run_demo(&config, DEFAULT_PLAYOUTS, 4, DEFAULT_SIZE, 1),
    }
}

fn run_demo(
    config: &LibmapConfig,
    playouts: usize,
    threads: usize,
    size: usize,
    seed: u64,
) -> Result<()> {
    if !(2..=MAX_SIZE).contains(&size) {
        bail!("board size {size} not supported (2..={MAX_SIZE})");
    }
    println!("Michi-Libmap: tactical memoization demo\n");
    println!("libmap: {config}");

    let start = Board::new(size);
    let store = LibmapStore::new(&start);

    println!("Running {playouts} playouts on {threads} threads...");
    let summary = run_playouts(&start, Color::Black, &store, config, playouts, threads, seed);
    let occupancy = store.summary();

    println!(
        "Black won {} of {} playouts ({:.1}%)",
        summary.black_wins,
        summary.playouts,
        100.0 * summary.black_wins as f64 / summary.playouts.max(1) as f64
    );
    println!(
        "Tactical moves: {} of {} played",
        summary.tactical, summary.moves
    );
    println!(
        "Libmap: {} tables, {} contexts, {} recorded results",
        occupancy.tables, occupancy.contexts, occupancy.visits
    );

    // Query the store from a small fight: White's C4 stone has two liberties.
    if size >= 5 {
        let mut fight = Board::new(size);
        for (color, pt) in [(Color::Black, "B4"), (Color::White, "C4"), (Color::Black, "D4")] {
            let c = fight.parse_coord(pt);
            fight.play(color, c)?;
        }
        for pt in ["C5", "C3"] {
            let c = fight.parse_coord(pt);
            let s = store.board_move_stats(&fight, Move::new(c, Color::Black));
            println!(
                "  black {pt}: {} playouts, value {:.3}",
                s.playouts, s.value
            );
        }
    }

    if store.release() {
        println!("Libmap released.");
    }
    Ok(())
}
