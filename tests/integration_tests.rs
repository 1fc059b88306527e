//! Integration tests for michi-libmap
//!
//! These exercise the public API end to end: set up a position, generate
//! tactical candidates, feed playout outcomes back and query the store.

use michi_libmap::board::{Color, Move, Stone, TacticalBoard};
use michi_libmap::config::{ConfigError, EvalMode, LibmapConfig};
use michi_libmap::constants::{CONTEXT_MOVES, PASS_MOVE};
use michi_libmap::libmap::LibmapStore;
use michi_libmap::playout::run_playouts;
use michi_libmap::position::{Board, MoveError};
use michi_libmap::queue::LibmapQueue;
use michi_libmap::tactics::group_2lib_check;

// =============================================================================
// Helper functions for setting up test positions
// =============================================================================

/// Set up stones on the board by placing them directly.
/// Example: setpos(5, &["C4", "B3"], &["B4", "C3"]) places black at C4, B3
/// and white at B4, C3.
fn setpos(size: usize, black: &[&str], white: &[&str]) -> Board {
    let mut board = Board::new(size);
    for (color, stones) in [(Color::Black, black), (Color::White, white)] {
        for s in stones {
            let c = board.parse_coord(s);
            assert_ne!(c, PASS_MOVE, "bad coordinate {s}");
            board.place(color, c);
        }
    }
    board
}

/// Black C4 with two liberties (C5, D4), hemmed in by white B4 and C3.
fn two_liberty_fight() -> Board {
    setpos(5, &["C4", "B3"], &["B4", "C3"])
}

/// Queue White's ataris on C4 and commit them as one finished playout.
fn feed_back(board: &Board, store: &LibmapStore, winner: Color, config: &LibmapConfig) -> usize {
    let group = board.group_at(board.parse_coord("C4")).unwrap();
    let mut queue = LibmapQueue::new(config);
    group_2lib_check(board, group, Color::White, &mut queue, 1, false, true, config);
    let n = queue.len();
    queue.finalize(store, board, winner, config);
    assert!(queue.is_empty());
    n
}

fn white(board: &Board, s: &str) -> Move {
    Move::new(board.parse_coord(s), Color::White)
}

// =============================================================================
// Board basics
// =============================================================================

#[test]
fn test_setpos_and_liberties() {
    let board = two_liberty_fight();
    let c4 = board.parse_coord("C4");
    let g = board.group_at(c4).unwrap();
    assert_eq!(board.at(c4), Stone::Black);
    assert_eq!(board.group_color(g), Some(Color::Black));
    assert_eq!(
        board.group_libs(g),
        &[board.parse_coord("C5"), board.parse_coord("D4")]
    );
}

#[test]
fn test_capture_group_with_play() {
    let mut board = setpos(5, &["A5", "A4"], &["B5", "B4"]);
    assert_eq!(board.play(Color::White, board.parse_coord("A3")), Ok(()));
    assert_eq!(board.at(board.parse_coord("A5")), Stone::Empty);
    assert_eq!(board.at(board.parse_coord("A4")), Stone::Empty);
    assert_eq!(
        board.play(Color::White, board.parse_coord("B5")),
        Err(MoveError::Occupied)
    );
}

// =============================================================================
// Feedback and queries
// =============================================================================

#[test]
fn test_global_eval_feedback() {
    let config = LibmapConfig::parse("eval=global").unwrap();
    let board = two_liberty_fight();
    let store = LibmapStore::new(&board);

    assert_eq!(feed_back(&board, &store, Color::White, &config), 2);
    let s = store.board_move_stats(&board, white(&board, "C5"));
    assert_eq!(s.playouts, 1);
    assert_eq!(s.value, 1.0);

    feed_back(&board, &store, Color::Black, &config);
    let s = store.board_move_stats(&board, white(&board, "D4"));
    assert_eq!(s.playouts, 2);
    assert!((s.value - 0.5).abs() < 1e-9);

    let g = board.group_at(board.parse_coord("C4")).unwrap();
    assert_eq!(
        store.context_visits(g, Color::Black, board.libmap_hash(g)),
        4
    );
    assert!(store.release());
}

#[test]
fn test_local_eval_feedback() {
    let board = two_liberty_fight();

    let config = LibmapConfig::parse("eval=local").unwrap();
    assert_eq!(config.eval, EvalMode::Local);
    let store = LibmapStore::new(&board);
    feed_back(&board, &store, Color::White, &config);
    // The region is the black group itself, owned by the other side.
    let s = store.board_move_stats(&board, white(&board, "C5"));
    assert_eq!(s.playouts, 1);
    assert_eq!(s.value, 0.0);

    // With neighbors: C4 black, C3 and B4 white, C5 and D4 neutral.
    let config = LibmapConfig::default();
    assert_eq!(config.eval, EvalMode::LocalValue);
    let store = LibmapStore::new(&board);
    feed_back(&board, &store, Color::White, &config);
    let s = store.board_move_stats(&board, white(&board, "C5"));
    assert!((s.value - 0.6).abs() < 1e-9, "got {}", s.value);
}

#[test]
fn test_query_depends_on_shape() {
    let config = LibmapConfig::parse("eval=global").unwrap();
    let board = two_liberty_fight();
    let store = LibmapStore::new(&board);
    feed_back(&board, &store, Color::White, &config);

    // Same point, other color: nothing known.
    let black_c5 = Move::new(board.parse_coord("C5"), Color::Black);
    assert!(store.board_move_stats(&board, black_c5).is_empty());
    assert!(store.board_move_stats(&board, Move::pass(Color::White)).is_empty());

    // A stone next to the liberties changes the shape.
    let mut changed = board.clone();
    changed.place(Color::White, changed.parse_coord("D5"));
    assert!(store.board_move_stats(&changed, white(&changed, "C5")).is_empty());
    assert_eq!(store.board_move_stats(&board, white(&board, "C5")).playouts, 1);
}

#[test]
fn test_new_store_has_tables_for_existing_groups() {
    let board = two_liberty_fight();
    let store = LibmapStore::new(&board);
    let summary = store.summary();
    assert_eq!(summary.tables, 4);
    assert_eq!(summary.contexts, 0);
    let c4 = board.group_at(board.parse_coord("C4")).unwrap();
    assert!(store.group(c4, Color::Black).is_some());
    assert!(store.group(c4, Color::White).is_none());
}

#[test]
fn test_context_move_capacity() {
    let store = LibmapStore::with_size2(49);
    let (group, hash) = (10, 0xabcd);
    for i in 0..=CONTEXT_MOVES {
        store.add_result(group, Color::White, hash, Move::new(20 + i, Color::Black), 1.0, 1);
    }
    assert_eq!(store.context_visits(group, Color::White, hash), CONTEXT_MOVES as u32 + 1);
    for i in 0..CONTEXT_MOVES {
        let s = store
            .move_stats(group, Color::White, hash, Move::new(20 + i, Color::Black))
            .unwrap();
        assert_eq!(s.playouts, 1);
    }
    let dropped = Move::new(20 + CONTEXT_MOVES, Color::Black);
    assert_eq!(store.move_stats(group, Color::White, hash, dropped), None);
    // Tables are per color.
    assert!(store.group(group, Color::Black).is_none());
}

// =============================================================================
// Sharing and lifecycle
// =============================================================================

#[test]
fn test_handles_across_threads() {
    let store = LibmapStore::with_size2(49);
    let weak = store.downgrade();
    let workers: Vec<_> = (0..4)
        .map(|t| {
            let view = store.acquire();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    view.add_result(10, Color::Black, 77, Move::new(20 + t, Color::White), 0.5, 1);
                }
                view.release()
            })
        })
        .collect();
    for w in workers {
        assert!(!w.join().unwrap(), "the creator still holds a handle");
    }
    assert_eq!(store.ref_count(), 1);
    assert_eq!(store.context_visits(10, Color::Black, 77), 400);

    assert!(store.release());
    assert!(weak.upgrade().is_none());
}

#[test]
fn test_playouts_learn_into_shared_store() {
    let config = LibmapConfig::default();
    let start = Board::new(5);
    let store = LibmapStore::new(&start);
    let summary = run_playouts(&start, Color::Black, &store, &config, 40, 4, 3);
    assert_eq!(summary.playouts, 40);
    assert!(summary.moves >= 40);
    if summary.tactical > 0 {
        assert!(store.summary().visits > 0);
    }
    assert_eq!(store.ref_count(), 1);
    assert!(store.release());
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_config_errors() {
    assert_eq!(
        LibmapConfig::parse("bogus=1"),
        Err(ConfigError::UnknownOption("bogus".into()))
    );
    assert!(matches!(
        LibmapConfig::parse("pick_mode=random"),
        Err(ConfigError::InvalidValue { option: "pick_mode", .. })
    ));
    assert!("counterattack=dq".parse::<LibmapConfig>().is_err());
}

#[test]
fn test_config_display_parses_back() {
    let config = LibmapConfig::parse("pick_mode=ucb:tenuki:prior=0.6x3:counterattack=ax").unwrap();
    let again = LibmapConfig::parse(&config.to_string()).unwrap();
    assert_eq!(again, config);
}
