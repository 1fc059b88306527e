//! Per-playout queue of tactical moves waiting for the playout's outcome.
//!
//! Each queued move carries enough about its origin (group, shape hash, goal
//! color) to find the right libmap context once the playout is over. The queue
//! is private to its playout; only [`LibmapQueue::finalize`] touches the
//! shared store.

use log::{debug, trace};

use crate::board::{Color, GroupId, Hash, Move, TacticalBoard};
use crate::config::{EvalMode, LibmapConfig};
use crate::constants::QUEUE_CAPACITY;
use crate::libmap::LibmapStore;

/// Where a queued move's result should be recorded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GroupInfo {
    pub group: GroupId,
    /// Color of `group`; selects the table.
    pub color: Color,
    /// Shape the move is remembered under.
    pub hash: Hash,
    /// Whose success the move is evaluated for.
    pub goal: Color,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct QueuedMove {
    pub mv: Move,
    /// Bit set of the heuristics that proposed the move.
    pub tag: u32,
    pub info: GroupInfo,
}

/// Bounded list of tactical moves gathered during one playout.
#[derive(Clone, Debug)]
pub struct LibmapQueue {
    moves: Vec<QueuedMove>,
    merge_groups: bool,
}

impl LibmapQueue {
    pub fn new(config: &LibmapConfig) -> Self {
        Self {
            moves: Vec::with_capacity(QUEUE_CAPACITY),
            merge_groups: config.mq_merge_groups,
        }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&QueuedMove> {
        self.moves.get(i)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedMove> {
        self.moves.iter()
    }

    /// Queue a move, folding it into the previous entry if it repeats it.
    ///
    /// Returns false if the queue was full and the move was dropped.
    pub fn add(&mut self, mv: Move, tag: u32, info: GroupInfo) -> bool {
        if self.moves.len() >= QUEUE_CAPACITY {
            trace!("libmap queue full, dropping {mv:?}");
            return false;
        }
        self.moves.push(QueuedMove { mv, tag, info });
        self.nodup();
        true
    }

    /// Coalesce the last entry into the one before it when both name the same
    /// move and either cross-group merging is on or they share their origin.
    fn nodup(&mut self) {
        let n = self.moves.len();
        if n < 2 {
            return;
        }
        let (prev, last) = (self.moves[n - 2], self.moves[n - 1]);
        if prev.mv != last.mv || !(self.merge_groups || prev.info == last.info) {
            return;
        }
        self.moves[n - 2].tag |= last.tag;
        self.moves.pop();
    }

    /// Drop entries past `len`.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.moves.truncate(len);
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// Abandon the playout: nothing queued reaches the store.
    pub fn discard(self) {
        trace!("libmap queue discarded with {} moves", self.moves.len());
    }

    /// Commit every queued move's outcome to the store, then empty the queue.
    ///
    /// `board` is the final position of the playout and `winner` its winner.
    pub fn finalize<B: TacticalBoard>(
        &mut self,
        store: &LibmapStore,
        board: &B,
        winner: Color,
        config: &LibmapConfig,
    ) {
        for q in &self.moves {
            let value = match config.eval {
                EvalMode::Local | EvalMode::LocalValue => board.local_value(
                    config.eval == EvalMode::LocalValue,
                    q.info.group,
                    q.info.goal,
                ),
                EvalMode::Global => {
                    if q.info.goal == winner {
                        1.0
                    } else {
                        0.0
                    }
                }
            };
            store.add_result(q.info.group, q.info.color, q.info.hash, q.mv, value, 1);
        }
        debug!("libmap queue committed {} moves, winner {winner}", self.moves.len());
        self.moves.clear();
    }
}
