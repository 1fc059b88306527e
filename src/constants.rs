//! Constants for board geometry, libmap table layout, and playouts.
//!
//! The board uses a 1D array representation with one point of padding around
//! the playable area, so every playable point has four addressable neighbors.
//! Unlike the table layout below, the board size is chosen at runtime.

// =============================================================================
// Board Geometry
// =============================================================================

/// Default board size (NxN) used by the demo.
pub const DEFAULT_SIZE: usize = 9;

/// Largest supported board size.
pub const MAX_SIZE: usize = 19;

/// Maximum game length as a multiple of the board area.
pub const MAX_GAME_LEN_FACTOR: usize = 3;

/// Pass move marker (index 0 is padding, so safe to use).
pub const PASS_MOVE: usize = 0;

// =============================================================================
// Libmap Table Layout
// =============================================================================

/// Each per-group table holds `1 << HASH_BITS` contexts.
pub const HASH_BITS: u32 = 11;

/// Number of contexts in one per-group table.
pub const HASH_SIZE: usize = 1 << HASH_BITS;

/// Mask turning a local-shape hash into a table index.
pub const HASH_MASK: u64 = (HASH_SIZE as u64) - 1;

/// Number of slots searched from the home index before evicting.
pub const MAXLINE: usize = 32;

/// Moves remembered per context; further distinct moves are dropped.
pub const CONTEXT_MOVES: usize = 5;

/// Capacity of the per-playout move queue.
pub const QUEUE_CAPACITY: usize = 512;

// =============================================================================
// Libmap Configuration Defaults
// =============================================================================

/// Minimum value a remembered move must reach to be preferred in threshold mode.
pub const DEFAULT_PICK_THRESHOLD: f64 = 0.7;

/// Playouts below which a remembered move is still considered unproven.
pub const DEFAULT_PICK_EPSILON: u32 = 10;

/// Probability of picking a random candidate without consulting the table.
pub const DEFAULT_EXPLORE_P: f64 = 0.2;

/// Prior (value, playouts) mixed into statistics of candidate moves.
pub const DEFAULT_PRIOR: (f64, u32) = (0.5, 1);

/// Prior (value, playouts) for playing elsewhere.
pub const DEFAULT_TENUKI_PRIOR: (f64, u32) = (0.4, 1);

// =============================================================================
// Playout Parameters
// =============================================================================

/// Default number of playouts run by the demo.
pub const DEFAULT_PLAYOUTS: usize = 2000;

/// Probability that a playout move consults the 2-liberty tactics at all.
pub const PROB_TACTICS: f64 = 0.9;

/// Komi used for playout scoring.
pub const KOMI: f64 = 7.5;
