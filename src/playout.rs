//! Monte Carlo playouts that learn into the libmap.
//!
//! A playout plays random legal moves until two consecutive passes or the
//! game length limit. Before each move it usually looks at every two-liberty
//! group on the board, asks the 2-liberty tactics for candidates and lets the
//! libmap pick one. Played tactical moves are queued and, once the winner is
//! known, committed to the shared store.

use log::debug;

use crate::board::{Color, Coord, Move, Stone, TacticalBoard};
use crate::config::LibmapConfig;
use crate::constants::{MAX_GAME_LEN_FACTOR, PROB_TACTICS};
use crate::libmap::{LibmapHandle, LibmapStore};
use crate::pick::{Pick, queue_pick};
use crate::position::Board;
use crate::queue::LibmapQueue;
use crate::tactics::group_2lib_check;

/// Tag of moves proposed by the 2-liberty tactics.
pub const TAG_2LIB: u32 = 1 << 0;

/// Outcome of one playout.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlayoutResult {
    pub winner: Color,
    /// Moves played, passes included.
    pub moves: usize,
    /// Moves suggested by the tactics, "elsewhere" decisions included.
    pub tactical: usize,
}

/// Totals over a batch of playouts.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayoutSummary {
    pub playouts: usize,
    pub black_wins: usize,
    pub moves: usize,
    pub tactical: usize,
}

impl PlayoutSummary {
    fn record(&mut self, r: &PlayoutResult) {
        self.playouts += 1;
        self.black_wins += usize::from(r.winner == Color::Black);
        self.moves += r.moves;
        self.tactical += r.tactical;
    }

    fn absorb(&mut self, other: &PlayoutSummary) {
        self.playouts += other.playouts;
        self.black_wins += other.black_wins;
        self.moves += other.moves;
        self.tactical += other.tactical;
    }
}

/// Ask the tactics about every two-liberty group and pick a candidate.
///
/// The picked move (or the decision to play elsewhere, recorded as a pass) is
/// queued in `record` for feedback. Returns the point to play, if any.
fn tactical_move(
    board: &Board,
    to_play: Color,
    store: &LibmapStore,
    record: &mut LibmapQueue,
    config: &LibmapConfig,
    rng: &mut fastrand::Rng,
) -> Option<Option<Coord>> {
    let mut candidates = LibmapQueue::new(config);
    for g in board.groups() {
        if board.group_lib_count(g) == 2 {
            group_2lib_check(board, g, to_play, &mut candidates, TAG_2LIB, true, true, config);
        }
    }
    match queue_pick(store, &candidates, config, rng)? {
        Pick::Candidate(i) => {
            let q = candidates.get(i)?;
            record.add(q.mv, q.tag, q.info);
            Some(Some(q.mv.coord))
        }
        Pick::Elsewhere => {
            let q = candidates.get(0)?;
            record.add(Move::pass(to_play), q.tag, q.info);
            Some(None)
        }
    }
}

/// Choose a random legal move that does not fill one of our own true eyes.
///
/// Scans from a random starting point and tries candidates in random order.
fn choose_random_move(board: &Board, to_play: Color, rng: &mut fastrand::Rng) -> Option<Coord> {
    let points: Vec<Coord> = board.points().collect();
    let start = rng.usize(..points.len());
    let mut candidates: Vec<Coord> = points[start..]
        .iter()
        .chain(&points[..start])
        .copied()
        .filter(|&pt| board.at(pt) == Stone::Empty && !board.is_eye(pt, to_play))
        .collect();

    let n = candidates.len();
    for i in 0..n {
        let j = i + rng.usize(..n - i);
        candidates.swap(i, j);
        let pt = candidates[i];
        if board.is_valid_play(to_play, pt) {
            return Some(pt);
        }
    }
    None
}

/// Play one playout from `board` with `to_play` to move and feed its outcome
/// back into `store`.
pub fn mcplayout(
    board: &mut Board,
    to_play: Color,
    store: &LibmapStore,
    config: &LibmapConfig,
    rng: &mut fastrand::Rng,
) -> PlayoutResult {
    let max_len = board.size() * board.size() * MAX_GAME_LEN_FACTOR;
    let start = board.move_number();
    let mut queue = LibmapQueue::new(config);
    let mut color = to_play;
    let mut passes = 0;
    let mut tactical = 0;

    while passes < 2 && board.move_number() - start < max_len {
        let mut pt = None;
        let mut decided = false;
        if rng.f64() < PROB_TACTICS {
            if let Some(choice) = tactical_move(board, color, store, &mut queue, config, rng) {
                pt = choice;
                decided = choice.is_some();
                tactical += 1;
            }
        }
        if !decided {
            pt = choose_random_move(board, color, rng);
        }

        let played = pt.is_some_and(|pt| board.play(color, pt).is_ok());
        if played {
            passes = 0;
        } else {
            board.pass();
            passes += 1;
        }
        color = color.other();
    }

    let winner = board.winner();
    queue.finalize(store, board, winner, config);
    PlayoutResult {
        winner,
        moves: board.move_number() - start,
        tactical,
    }
}

/// Run `playouts` playouts from `start` spread over `threads` threads, all
/// learning into the same store.
///
/// Every thread works through its own handle and private queues; thread `t`
/// seeds its generator with `seed + t`.
pub fn run_playouts(
    start: &Board,
    to_play: Color,
    store: &LibmapHandle,
    config: &LibmapConfig,
    playouts: usize,
    threads: usize,
    seed: u64,
) -> PlayoutSummary {
    let threads = threads.clamp(1, playouts.max(1));
    let mut summary = PlayoutSummary::default();

    std::thread::scope(|s| {
        let workers: Vec<_> = (0..threads)
            .map(|t| {
                let view = store.acquire();
                let share = playouts / threads + usize::from(t < playouts % threads);
                s.spawn(move || {
                    let mut rng = fastrand::Rng::with_seed(seed.wrapping_add(t as u64));
                    let mut local = PlayoutSummary::default();
                    for _ in 0..share {
                        let mut board = start.clone();
                        let r = mcplayout(&mut board, to_play, &view, config, &mut rng);
                        local.record(&r);
                    }
                    view.release();
                    local
                })
            })
            .collect();
        for w in workers {
            match w.join() {
                Ok(local) => summary.absorb(&local),
                Err(e) => std::panic::resume_unwind(e),
            }
        }
    });

    debug!(
        "{} playouts done, black won {}, {} tactical moves",
        summary.playouts, summary.black_wins, summary.tactical
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playout_terminates_and_learns() {
        let config = LibmapConfig::parse("eval=global").unwrap();
        let start = Board::new(7);
        let store = LibmapStore::new(&start);
        let mut rng = fastrand::Rng::with_seed(42);
        let mut tactical = 0;
        for _ in 0..20 {
            let mut board = start.clone();
            let r = mcplayout(&mut board, Color::Black, &store, &config, &mut rng);
            assert!(r.moves <= 7 * 7 * MAX_GAME_LEN_FACTOR);
            tactical += r.tactical;
        }
        if tactical > 0 {
            assert!(store.summary().visits > 0);
        }
    }

    #[test]
    fn test_playout_counts_only_its_own_moves() {
        let config = LibmapConfig::default();
        let mut board = Board::new(5);
        board.play(Color::Black, board.parse_coord("C3")).unwrap();
        board.pass();
        let store = LibmapStore::new(&board);
        let mut rng = fastrand::Rng::with_seed(9);
        let r = mcplayout(&mut board, Color::Black, &store, &config, &mut rng);
        assert_eq!(r.moves, board.move_number() - 2);
        assert!(r.moves >= 2, "a playout ends with two passes at the earliest");
    }

    #[test]
    fn test_random_move_respects_eyes() {
        let board = Board::from_diagram(&[
            ".X.", //
            "XXX", //
            "...",
        ]);
        let mut rng = fastrand::Rng::with_seed(1);
        for _ in 0..20 {
            let pt = choose_random_move(&board, Color::Black, &mut rng).unwrap();
            assert_ne!(pt, board.parse_coord("A3"));
            assert_ne!(pt, board.parse_coord("C3"));
        }
    }

    #[test]
    fn test_run_playouts_shares_store() {
        let config = LibmapConfig::default();
        let start = Board::new(5);
        let store = LibmapStore::new(&start);
        let summary = run_playouts(&start, Color::Black, &store, &config, 9, 3, 11);
        assert_eq!(summary.playouts, 9);
        assert!(summary.black_wins <= 9);
        assert_eq!(store.ref_count(), 1);
    }
}
