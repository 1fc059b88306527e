//! Michi-Libmap: tactical memoization for a Go MCTS engine.
//!
//! The libmap remembers, across many playouts, how tactical moves around
//! groups with two liberties worked out, keyed by the local shape of the
//! group. The 2-liberty tactics generate those moves and the playouts feed
//! their outcomes back.
//!
//! ## Modules
//!
//! - [`constants`] - Table layout, defaults and playout parameters
//! - [`board`] - Board-facing types and the [`board::TacticalBoard`] interface
//! - [`position`] - A Go board implementing that interface
//! - [`stats`] - Playout statistics of a move
//! - [`config`] - The libmap option string
//! - [`libmap`] - The shared per-session store
//! - [`queue`] - Per-playout move queue and outcome feedback
//! - [`tactics`] - 2-liberty candidate generation
//! - [`pick`] - Choosing a candidate with the store's help
//! - [`playout`] - Random playouts that learn into the store
//!
//! ## Example
//!
//! ```
//! use michi_libmap::board::{Color, TacticalBoard};
//! use michi_libmap::config::LibmapConfig;
//! use michi_libmap::libmap::LibmapStore;
//! use michi_libmap::position::Board;
//! use michi_libmap::queue::LibmapQueue;
//! use michi_libmap::tactics::group_2lib_check;
//!
//! let config = LibmapConfig::parse("eval=global").unwrap();
//! let board = Board::from_diagram(&[
//!     ".....",
//!     ".OX..",
//!     ".XO..",
//!     ".....",
//!     ".....",
//! ]);
//! let store = LibmapStore::new(&board);
//! let mut queue = LibmapQueue::new(&config);
//!
//! let group = board.group_at(board.parse_coord("C4")).unwrap();
//! group_2lib_check(&board, group, Color::White, &mut queue, 1, false, true, &config);
//! assert!(!queue.is_empty());
//!
//! queue.finalize(&store, &board, Color::White, &config);
//! assert!(store.summary().visits > 0);
//! assert!(store.release());
//! ```

pub mod board;
pub mod config;
pub mod constants;
pub mod libmap;
pub mod pick;
pub mod playout;
pub mod position;
pub mod queue;
pub mod stats;
pub mod tactics;
