//! The libmap: per-session memory of how tactical moves fared in playouts.
//!
//! For every (group, color) pair seen during the session the store keeps a
//! fixed-size open-addressed table. A table slot ([`LibmapContext`]) is keyed
//! by the group's local-shape hash and remembers a handful of moves with their
//! playout statistics.
//!
//! Playouts update the tables concurrently. Slot fields are relaxed atomics
//! and no lock is taken, so two racing writers may lose one of the updates;
//! the statistics only need to converge over many playouts. The store itself
//! is shared through a reference-counted [`LibmapHandle`] and released exactly
//! once, when the last handle goes.

use std::ops::Deref;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering::Relaxed};
use std::sync::{Arc, OnceLock, Weak};

use log::{debug, trace};

use crate::board::{Color, Coord, GroupId, Hash, Move, Stone, TacticalBoard};
use crate::constants::{CONTEXT_MOVES, HASH_MASK, HASH_SIZE, MAXLINE};
use crate::stats::MoveStats;

#[inline]
fn pack_move(mv: Move) -> u32 {
    ((mv.coord as u32) << 1) | mv.color.index() as u32
}

#[inline]
fn unpack_move(key: u32) -> Move {
    let color = if key & 1 == 0 { Color::Black } else { Color::White };
    Move::new((key >> 1) as Coord, color)
}

#[inline]
fn table_index(hash: Hash) -> usize {
    (hash & HASH_MASK) as usize
}

/// One remembered move and its statistics.
#[derive(Default)]
struct MoveSlot {
    mv: AtomicU32,
    playouts: AtomicU32,
    value: AtomicU64,
}

impl MoveSlot {
    fn stats(&self) -> MoveStats {
        MoveStats {
            playouts: self.playouts.load(Relaxed),
            value: f64::from_bits(self.value.load(Relaxed)),
        }
    }

    fn add_result(&self, result: f64, playouts: u32) {
        let mut s = self.stats();
        s.add_result(result, playouts);
        self.value.store(s.value.to_bits(), Relaxed);
        self.playouts.store(s.playouts, Relaxed);
    }

    fn clear(&self) {
        self.mv.store(0, Relaxed);
        self.playouts.store(0, Relaxed);
        self.value.store(0, Relaxed);
    }
}

/// A table slot: the statistics of moves tried in one local shape.
#[derive(Default)]
pub struct LibmapContext {
    hash: AtomicU64,
    visits: AtomicU32,
    moves: AtomicU32,
    slots: [MoveSlot; CONTEXT_MOVES],
}

impl LibmapContext {
    pub fn hash(&self) -> Hash {
        self.hash.load(Relaxed)
    }

    /// How many results were recorded in this context.
    pub fn visits(&self) -> u32 {
        self.visits.load(Relaxed)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.visits() == 0
    }

    fn move_count(&self) -> usize {
        (self.moves.load(Relaxed) as usize).min(CONTEXT_MOVES)
    }

    /// Remembered moves with their statistics, in insertion order.
    pub fn moves(&self) -> impl Iterator<Item = (Move, MoveStats)> + '_ {
        self.slots[..self.move_count()]
            .iter()
            .map(|s| (unpack_move(s.mv.load(Relaxed)), s.stats()))
    }

    /// Playouts of the first remembered move; eviction picks the smallest.
    fn primary_playouts(&self) -> u32 {
        self.slots[0].playouts.load(Relaxed)
    }

    fn find(&self, mv: Move) -> Option<&MoveSlot> {
        let key = pack_move(mv);
        self.slots[..self.move_count()]
            .iter()
            .find(|s| s.mv.load(Relaxed) == key)
    }

    pub fn move_stats(&self, mv: Move) -> Option<MoveStats> {
        self.find(mv).map(MoveSlot::stats)
    }

    fn clear(&self) {
        self.hash.store(0, Relaxed);
        self.visits.store(0, Relaxed);
        self.moves.store(0, Relaxed);
        for s in &self.slots {
            s.clear();
        }
    }
}

/// The table of one group as seen by one color.
pub struct LibmapGroup {
    pub group: GroupId,
    pub color: Color,
    contexts: Box<[LibmapContext]>,
}

impl LibmapGroup {
    fn new(group: GroupId, color: Color) -> Self {
        Self {
            group,
            color,
            contexts: (0..HASH_SIZE).map(|_| LibmapContext::default()).collect(),
        }
    }

    /// The context stored at the hash's home index, if it holds that hash.
    ///
    /// Reads do not follow the search line.
    pub fn context(&self, hash: Hash) -> Option<&LibmapContext> {
        let lc = &self.contexts[table_index(hash)];
        (!lc.is_empty() && lc.hash() == hash).then_some(lc)
    }

    /// Record `playouts` results averaging `result` for `mv` in shape `hash`.
    ///
    /// The slot is found by linear probing over at most [`MAXLINE`] slots from
    /// the home index. When the whole line is taken by other shapes, the slot
    /// whose first move has the fewest playouts is wiped and reused; ties are
    /// settled by a coin flip. A context remembers at most [`CONTEXT_MOVES`]
    /// moves; results for further moves are dropped. A result worth no
    /// playouts changes nothing.
    pub fn add_result(&self, hash: Hash, mv: Move, result: f64, playouts: u32) {
        if playouts == 0 {
            return;
        }
        let mut min_playouts = u32::MAX;
        let mut min_index = table_index(hash);
        let mut chosen = None;

        for offset in 0..MAXLINE {
            let index = table_index(hash.wrapping_add(offset as Hash));
            let lc = &self.contexts[index];
            if lc.hash() == hash && !lc.is_empty() {
                chosen = Some(index);
                break;
            }
            if lc.is_empty() {
                lc.hash.store(hash, Relaxed);
                chosen = Some(index);
                break;
            }
            let hp = lc.primary_playouts();
            if hp < min_playouts || (hp == min_playouts && fastrand::bool()) {
                min_playouts = hp;
                min_index = index;
            }
        }

        let index = chosen.unwrap_or_else(|| {
            trace!(
                "group {} line of {hash:#x} full, evicting slot {min_index} ({min_playouts} playouts)",
                self.group
            );
            let lc = &self.contexts[min_index];
            lc.clear();
            lc.hash.store(hash, Relaxed);
            min_index
        });

        let lc = &self.contexts[index];
        lc.visits.fetch_add(1, Relaxed);

        if let Some(slot) = lc.find(mv) {
            slot.add_result(result, playouts);
            return;
        }

        let moves = lc.move_count();
        if moves >= CONTEXT_MOVES {
            trace!("group {} context {hash:#x}: too many moves", self.group);
            return;
        }
        let slot = &lc.slots[moves];
        slot.clear();
        slot.mv.store(pack_move(mv), Relaxed);
        slot.add_result(result, playouts);
        lc.moves.store(moves as u32 + 1, Relaxed);
    }

    /// Statistics of `mv` in shape `hash`, if remembered.
    pub fn move_stats(&self, hash: Hash, mv: Move) -> Option<MoveStats> {
        self.context(hash)?.move_stats(mv)
    }

    /// Number of contexts in use.
    pub fn used_contexts(&self) -> usize {
        self.contexts.iter().filter(|lc| !lc.is_empty()).count()
    }
}

/// Aggregate occupancy of a store.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub tables: usize,
    pub contexts: usize,
    pub visits: u64,
}

/// All libmap tables of one board session.
pub struct LibmapStore {
    /// Per color, indexed by group id.
    groups: [Box<[OnceLock<LibmapGroup>]>; 2],
}

impl LibmapStore {
    /// Create a store for a board session; the returned handle holds the only
    /// reference. Groups already on the board get their tables right away.
    pub fn new<B: TacticalBoard>(board: &B) -> LibmapHandle {
        let store = Self::with_size2(board.size2());
        for c in 0..board.size2() {
            if board.group_at(c) != Some(c) {
                continue;
            }
            if let Some(color) = board.group_color(c) {
                store.ensure_group(c, color);
            }
        }
        store
    }

    /// Create a store for group ids below `size2`.
    pub fn with_size2(size2: usize) -> LibmapHandle {
        let table = || (0..size2).map(|_| OnceLock::new()).collect::<Box<[_]>>();
        debug!("libmap store created for {size2} group ids");
        LibmapHandle(Arc::new(LibmapStore {
            groups: [table(), table()],
        }))
    }

    /// Table for (`group`, `color`), created on first use.
    ///
    /// # Panics
    /// If `group` lies outside the board the store was created for.
    pub fn ensure_group(&self, group: GroupId, color: Color) -> &LibmapGroup {
        self.groups[color.index()][group].get_or_init(|| {
            trace!("libmap table for {color} group {group}");
            LibmapGroup::new(group, color)
        })
    }

    /// Table for (`group`, `color`) if it was ever created.
    pub fn group(&self, group: GroupId, color: Color) -> Option<&LibmapGroup> {
        self.groups[color.index()].get(group)?.get()
    }

    pub fn add_result(
        &self,
        group: GroupId,
        color: Color,
        hash: Hash,
        mv: Move,
        result: f64,
        playouts: u32,
    ) {
        self.ensure_group(group, color)
            .add_result(hash, mv, result, playouts);
    }

    /// Statistics of `mv` for one group in shape `hash`.
    pub fn move_stats(&self, group: GroupId, color: Color, hash: Hash, mv: Move) -> Option<MoveStats> {
        self.group(group, color)?.move_stats(hash, mv)
    }

    /// Visits of the context for `hash`, 0 if there is none.
    pub fn context_visits(&self, group: GroupId, color: Color, hash: Hash) -> u32 {
        self.group(group, color)
            .and_then(|lg| lg.context(hash))
            .map_or(0, LibmapContext::visits)
    }

    /// Statistics of `mv` merged over all groups adjacent to its point, each
    /// looked up under the group's current local-shape hash.
    ///
    /// A pass or a point whose neighbors have nothing remembered yields empty
    /// statistics.
    pub fn board_move_stats<B: TacticalBoard>(&self, board: &B, mv: Move) -> MoveStats {
        let mut total = MoveStats::default();
        if mv.is_pass() {
            return total;
        }
        debug_assert_ne!(board.at(mv.coord), Stone::Offboard);

        for g in board.neighboring_groups(mv.coord) {
            let Some(color) = board.group_color(g) else {
                continue;
            };
            if let Some(s) = self.move_stats(g, color, board.libmap_hash(g), mv) {
                total.merge(&s);
            }
        }
        total
    }

    pub fn summary(&self) -> StoreSummary {
        let mut summary = StoreSummary::default();
        for lg in self.groups.iter().flat_map(|t| t.iter()).filter_map(OnceLock::get) {
            summary.tables += 1;
            for lc in lg.contexts.iter().filter(|lc| !lc.is_empty()) {
                summary.contexts += 1;
                summary.visits += u64::from(lc.visits());
            }
        }
        summary
    }
}

impl Drop for LibmapStore {
    fn drop(&mut self) {
        let tables = self
            .groups
            .iter()
            .flat_map(|t| t.iter())
            .filter(|g| g.get().is_some())
            .count();
        debug!("libmap store released with {tables} tables");
    }
}

/// Shared reference to a [`LibmapStore`].
///
/// Each concurrent session view holds its own handle. The store is dropped
/// when the last handle is released.
pub struct LibmapHandle(Arc<LibmapStore>);

impl LibmapHandle {
    /// Check out another reference to the same store.
    pub fn acquire(&self) -> LibmapHandle {
        LibmapHandle(Arc::clone(&self.0))
    }

    /// Give this reference back. Returns true if it was the last one, in which
    /// case the store and all its tables have been freed.
    pub fn release(self) -> bool {
        match Arc::into_inner(self.0) {
            Some(store) => {
                drop(store);
                true
            }
            None => false,
        }
    }

    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// A non-owning reference that stops resolving once the store is freed.
    pub fn downgrade(&self) -> Weak<LibmapStore> {
        Arc::downgrade(&self.0)
    }
}

impl Deref for LibmapHandle {
    type Target = LibmapStore;

    fn deref(&self) -> &LibmapStore {
        &self.0
    }
}
