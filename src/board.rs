//! Board-facing types and the collaborator interface consumed by the libmap.
//!
//! The tactical code never looks at a concrete board. Everything it needs
//! (groups, liberties, legality, self-atari reading, local-shape hashing and
//! local evaluation) goes through [`TacticalBoard`]. [`crate::position::Board`]
//! is the implementation shipped with this crate.

use std::fmt;

/// A point on the board, represented as an index into the padded 1D array.
pub type Coord = usize;

/// Group identity: the coordinate of the group's base stone.
pub type GroupId = usize;

/// Local-shape hash used as a libmap key.
pub type Hash = u64;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    Black,
    White,
}

impl Color {
    #[inline]
    pub fn other(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    /// Index into per-color arrays.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Color::Black => 0,
            Color::White => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

/// Content of a board point.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Stone {
    Empty,
    Black,
    White,
    Offboard,
}

impl Stone {
    /// The stone's color, if it is a stone at all.
    #[inline]
    pub fn color(self) -> Option<Color> {
        match self {
            Stone::Black => Some(Color::Black),
            Stone::White => Some(Color::White),
            Stone::Empty | Stone::Offboard => None,
        }
    }
}

impl From<Color> for Stone {
    fn from(c: Color) -> Self {
        match c {
            Color::Black => Stone::Black,
            Color::White => Stone::White,
        }
    }
}

/// A move: coordinate plus the color playing it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub coord: Coord,
    pub color: Color,
}

impl Move {
    pub fn new(coord: Coord, color: Color) -> Self {
        Self { coord, color }
    }

    pub fn pass(color: Color) -> Self {
        Self::new(crate::constants::PASS_MOVE, color)
    }

    #[inline]
    pub fn is_pass(&self) -> bool {
        self.coord == crate::constants::PASS_MOVE
    }
}

/// Board services the 2-liberty tactics and the libmap rely on.
///
/// Implementations guarantee that liberty lists only contain empty points and
/// that group identities are stable for as long as the group exists.
pub trait TacticalBoard {
    /// Size of the coordinate space; every [`Coord`] and [`GroupId`] is below it.
    fn size2(&self) -> usize;

    fn at(&self, c: Coord) -> Stone;

    /// Group occupying `c`, if `c` holds a stone.
    fn group_at(&self, c: Coord) -> Option<GroupId>;

    /// Liberties of `group`, in a stable order.
    fn group_libs(&self, group: GroupId) -> &[Coord];

    fn group_stones(&self, group: GroupId) -> Vec<Coord>;

    /// The four orthogonal neighbors, off-board padding included.
    fn neighbors(&self, c: Coord) -> [Coord; 4];

    /// Number of empty points adjacent to `c`.
    fn immediate_liberty_count(&self, c: Coord) -> usize;

    fn is_valid_play(&self, color: Color, c: Coord) -> bool;

    /// Whether playing `c` leaves `color`'s new group with one liberty
    /// without capturing anything.
    fn is_bad_selfatari(&self, color: Color, c: Coord) -> bool;

    /// A substitute for the self-atari `c`: filling the other liberty of a
    /// neighboring two-liberty group (false-eye fill or connection). Returns
    /// the substitute coordinate and the group it belongs to.
    fn selfatari_cousin(&self, color: Color, c: Coord) -> Option<(Coord, GroupId)>;

    /// Hash of the group's identity and liberty configuration.
    fn libmap_hash(&self, group: GroupId) -> Hash;

    /// Share of the area around `group` owned by `goal`, in `[0, 1]`. With
    /// `scan_neighbors` the neighbors of the area count as well.
    fn local_value(&self, scan_neighbors: bool, group: GroupId, goal: Color) -> f64;

    #[inline]
    fn group_color(&self, group: GroupId) -> Option<Color> {
        self.at(group).color()
    }

    #[inline]
    fn group_lib_count(&self, group: GroupId) -> usize {
        self.group_libs(group).len()
    }

    fn neighbor_count_at(&self, c: Coord, stone: Stone) -> usize {
        self.neighbors(c)
            .iter()
            .filter(|&&n| self.at(n) == stone)
            .count()
    }

    fn is_adjacent(&self, a: Coord, b: Coord) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Distinct groups adjacent to `c`, of either color.
    fn neighboring_groups(&self, c: Coord) -> Vec<GroupId> {
        let mut groups = Vec::with_capacity(4);
        for n in self.neighbors(c) {
            if let Some(g) = self.group_at(n) {
                if !groups.contains(&g) {
                    groups.push(g);
                }
            }
        }
        groups
    }
}
