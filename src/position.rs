//! Go board used as the tactical collaborator of the libmap.
//!
//! This module provides a plain Go board:
//! - Board state in a 1D array with one point of off-board padding
//! - Stone placement, captures, suicide and simple ko
//! - Group bookkeeping (base-stone identity, sorted liberty lists)
//! - The [`TacticalBoard`] services: self-atari reading, cousin lookup,
//!   local-shape hashing and local evaluation
//!
//! Groups are recomputed from scratch after every change. That keeps the
//! board simple and is cheap enough at the sizes playouts use.

use std::fmt;

use thiserror::Error;

use crate::board::{Color, Coord, GroupId, Hash, Stone, TacticalBoard};
use crate::constants::{KOMI, MAX_SIZE, PASS_MOVE};

/// Result of attempting to play a move.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("illegal move: point not empty")]
    Occupied,
    #[error("illegal move: retakes ko")]
    Ko,
    #[error("illegal move: suicide")]
    Suicide,
}

/// A Go position.
///
/// Coordinates index a `(size + 2)^2` array; the outer ring is off-board.
#[derive(Clone)]
pub struct Board {
    size: usize,
    stride: usize,
    color: Vec<Stone>,
    /// Group id (base stone) per point, 0 if the point holds no stone.
    group: Vec<GroupId>,
    /// Sorted liberties, indexed by group id.
    libs: Vec<Vec<Coord>>,
    /// Point the given color may not play because it retakes a ko.
    ko: Option<(Coord, Color)>,
    /// Number of moves played (passes included)
    n: usize,
    pub komi: f64,
}

impl Board {
    /// Create an empty board.
    ///
    /// # Panics
    /// If `size` is zero or larger than [`MAX_SIZE`].
    pub fn new(size: usize) -> Self {
        assert!(
            (1..=MAX_SIZE).contains(&size),
            "board size {size} out of range"
        );
        let stride = size + 2;
        let mut color = vec![Stone::Offboard; stride * stride];
        for y in 1..=size {
            for x in 1..=size {
                color[y * stride + x] = Stone::Empty;
            }
        }
        Self {
            size,
            stride,
            color,
            group: vec![0; stride * stride],
            libs: vec![Vec::new(); stride * stride],
            ko: None,
            n: 0,
            komi: KOMI,
        }
    }

    /// Build a position from a diagram, top row first.
    ///
    /// `X` is black, `O` is white, `.` is empty; spaces are ignored.
    ///
    /// # Panics
    /// If the diagram is not square or contains other characters.
    pub fn from_diagram(rows: &[&str]) -> Self {
        let mut board = Board::new(rows.len());
        for (r, row) in rows.iter().enumerate() {
            let cells: Vec<char> = row.chars().filter(|c| !c.is_whitespace()).collect();
            assert_eq!(cells.len(), board.size, "diagram row {r} has wrong width");
            for (x, ch) in cells.into_iter().enumerate() {
                let pt = (r + 1) * board.stride + x + 1;
                board.color[pt] = match ch {
                    'X' => Stone::Black,
                    'O' => Stone::White,
                    '.' => Stone::Empty,
                    other => panic!("unexpected diagram character {other:?}"),
                };
            }
        }
        board.recompute_groups();
        board
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// All playable coordinates, top-left first.
    pub fn points(&self) -> impl Iterator<Item = Coord> + '_ {
        (1..=self.size).flat_map(move |y| (1..=self.size).map(move |x| y * self.stride + x))
    }

    /// All groups currently on the board.
    pub fn groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.points().filter(move |&pt| self.group[pt] == pt)
    }

    /// Put a stone down without capture or legality processing (position setup).
    pub fn place(&mut self, color: Color, c: Coord) {
        debug_assert_eq!(self.at(c), Stone::Empty);
        self.color[c] = color.into();
        self.recompute_groups();
    }

    /// Number of moves played since the board was set up, passes included.
    pub fn move_number(&self) -> usize {
        self.n
    }

    /// Pass; clears any ko.
    pub fn pass(&mut self) {
        self.ko = None;
        self.n += 1;
    }

    /// Play a move for `color`, resolving captures, suicide and ko.
    pub fn play(&mut self, color: Color, c: Coord) -> Result<(), MoveError> {
        if c == PASS_MOVE {
            self.pass();
            return Ok(());
        }
        if self.at(c) != Stone::Empty {
            return Err(MoveError::Occupied);
        }
        if self.ko == Some((c, color)) {
            return Err(MoveError::Ko);
        }

        self.color[c] = color.into();

        // Group ids and liberties still describe the position before the move.
        let enemy = Stone::from(color.other());
        let mut dead_groups: Vec<GroupId> = Vec::new();
        for n in self.neighbors(c) {
            if self.at(n) == enemy {
                let g = self.group[n];
                if self.libs[g] == [c] && !dead_groups.contains(&g) {
                    dead_groups.push(g);
                }
            }
        }
        let mut captured = Vec::new();
        for g in dead_groups {
            captured.extend(self.group_stones(g));
        }
        for &pt in &captured {
            self.color[pt] = Stone::Empty;
        }
        self.recompute_groups();

        let own = self.group[c];
        if captured.is_empty() && self.libs[own].is_empty() {
            self.color[c] = Stone::Empty;
            self.recompute_groups();
            return Err(MoveError::Suicide);
        }

        self.ko = if captured.len() == 1 && self.libs[own].len() == 1 && self.group_size(own) == 1
        {
            Some((captured[0], color.other()))
        } else {
            None
        };
        self.n += 1;
        Ok(())
    }

    fn group_size(&self, group: GroupId) -> usize {
        self.group.iter().filter(|&&g| g == group).count()
    }

    /// Rebuild group ids and liberty lists by flood fill.
    fn recompute_groups(&mut self) {
        self.group.fill(0);
        for libs in &mut self.libs {
            libs.clear();
        }
        let mut stack = Vec::new();
        for start in 0..self.color.len() {
            let stone = self.color[start];
            if self.group[start] != 0 || stone.color().is_none() {
                continue;
            }
            let mut libs = Vec::new();
            self.group[start] = start;
            stack.push(start);
            while let Some(pt) = stack.pop() {
                for n in self.neighbors(pt) {
                    match self.at(n) {
                        Stone::Empty => {
                            if !libs.contains(&n) {
                                libs.push(n);
                            }
                        }
                        s if s == stone && self.group[n] == 0 => {
                            self.group[n] = start;
                            stack.push(n);
                        }
                        _ => {}
                    }
                }
            }
            libs.sort_unstable();
            self.libs[start] = libs;
        }
    }

    /// Color owning `c` for area scoring: the stone, or the color surrounding
    /// an empty point on all sides.
    fn owner(&self, c: Coord) -> Option<Color> {
        match self.at(c) {
            Stone::Black => Some(Color::Black),
            Stone::White => Some(Color::White),
            Stone::Offboard => None,
            Stone::Empty => self.eyeish(c),
        }
    }

    /// Color of the stones surrounding `c`, if they are all one color.
    ///
    /// Off-board neighbors are ignored. This also accepts false eyes.
    pub fn eyeish(&self, c: Coord) -> Option<Color> {
        let mut eyecolor = None;
        for n in self.neighbors(c) {
            match self.at(n) {
                Stone::Offboard => continue,
                Stone::Empty => return None,
                s => {
                    let col = s.color();
                    if eyecolor.is_none() {
                        eyecolor = col;
                    } else if eyecolor != col {
                        return None;
                    }
                }
            }
        }
        eyecolor
    }

    /// Whether `c` is a true eye of `color`.
    ///
    /// At the edge one enemy diagonal is tolerated, in the center none.
    pub fn is_eye(&self, c: Coord, color: Color) -> bool {
        if self.eyeish(c) != Some(color) {
            return false;
        }
        let s = self.stride;
        let diagonals = [c.wrapping_sub(s + 1), c.wrapping_sub(s - 1), c + s - 1, c + s + 1];
        let mut at_edge = false;
        let mut false_count = 0;
        for d in diagonals {
            match self.at(d) {
                Stone::Offboard => at_edge = true,
                st if st == Stone::from(color.other()) => false_count += 1,
                _ => {}
            }
        }
        false_count <= usize::from(at_edge)
    }

    /// Area score from Black's perspective, komi included.
    pub fn score(&self) -> f64 {
        let mut s = -self.komi;
        for pt in self.points() {
            match self.owner(pt) {
                Some(Color::Black) => s += 1.0,
                Some(Color::White) => s -= 1.0,
                None => {}
            }
        }
        s
    }

    pub fn winner(&self) -> Color {
        if self.score() > 0.0 {
            Color::Black
        } else {
            Color::White
        }
    }

    /// Parse a coordinate string (e.g., "D4", "pass") into a point.
    ///
    /// Columns use letters A-T skipping I; rows count from the bottom.
    /// Returns `PASS_MOVE` for "pass" or invalid input.
    pub fn parse_coord(&self, s: &str) -> Coord {
        if s.eq_ignore_ascii_case("pass") {
            return PASS_MOVE;
        }
        let bytes = s.as_bytes();
        if bytes.len() < 2 || !bytes[0].is_ascii_alphabetic() {
            return PASS_MOVE;
        }
        let col_char = bytes[0].to_ascii_uppercase();
        if col_char == b'I' {
            return PASS_MOVE;
        }
        let mut col = (col_char - b'A' + 1) as usize;
        if col_char > b'I' {
            col -= 1;
        }
        let row = match s[1..].parse::<usize>() {
            Ok(r) => r,
            Err(_) => return PASS_MOVE,
        };
        if col > self.size || row == 0 || row > self.size {
            return PASS_MOVE;
        }
        (self.size + 1 - row) * self.stride + col
    }

    /// Convert a point to a coordinate string (e.g., "D4").
    pub fn str_coord(&self, c: Coord) -> String {
        if c == PASS_MOVE {
            return "pass".into();
        }
        let row = c / self.stride;
        let col = c % self.stride;
        let mut letter = b'A' + (col - 1) as u8;
        if letter >= b'I' {
            letter += 1;
        }
        format!("{}{}", letter as char, self.size + 1 - row)
    }
}

/// Finalizer of splitmix64; spreads coordinates over the whole hash space.
#[inline]
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

impl TacticalBoard for Board {
    fn size2(&self) -> usize {
        self.color.len()
    }

    #[inline]
    fn at(&self, c: Coord) -> Stone {
        self.color.get(c).copied().unwrap_or(Stone::Offboard)
    }

    fn group_at(&self, c: Coord) -> Option<GroupId> {
        match self.group.get(c) {
            Some(&g) if g != 0 => Some(g),
            _ => None,
        }
    }

    fn group_libs(&self, group: GroupId) -> &[Coord] {
        &self.libs[group]
    }

    fn group_stones(&self, group: GroupId) -> Vec<Coord> {
        self.points().filter(|&pt| self.group[pt] == group).collect()
    }

    #[inline]
    fn neighbors(&self, c: Coord) -> [Coord; 4] {
        [
            c.wrapping_sub(self.stride),
            c + 1,
            c + self.stride,
            c.wrapping_sub(1),
        ]
    }

    fn immediate_liberty_count(&self, c: Coord) -> usize {
        self.neighbor_count_at(c, Stone::Empty)
    }

    fn is_valid_play(&self, color: Color, c: Coord) -> bool {
        if self.at(c) != Stone::Empty || self.ko == Some((c, color)) {
            return false;
        }
        self.neighbors(c).into_iter().any(|n| match self.at(n) {
            Stone::Empty => true,
            Stone::Offboard => false,
            s => {
                let libs = self.group_lib_count(self.group[n]);
                if s.color() == Some(color) { libs > 1 } else { libs == 1 }
            }
        })
    }

    fn is_bad_selfatari(&self, color: Color, c: Coord) -> bool {
        if self.immediate_liberty_count(c) > 1 {
            return false;
        }
        let mut libs: Vec<Coord> = self
            .neighbors(c)
            .into_iter()
            .filter(|&n| self.at(n) == Stone::Empty)
            .collect();
        for n in self.neighbors(c) {
            let Some(g) = self.group_at(n) else {
                continue;
            };
            if self.group_color(g) == Some(color) {
                for &l in self.group_libs(g) {
                    if l != c && !libs.contains(&l) {
                        libs.push(l);
                    }
                }
            } else if self.group_lib_count(g) == 1 {
                // Capturing always gains liberties.
                return false;
            }
            if libs.len() > 1 {
                return false;
            }
        }
        true
    }

    fn selfatari_cousin(&self, color: Color, c: Coord) -> Option<(Coord, GroupId)> {
        let mut enemy_group = None;
        let mut own_group = None;
        for g in self.neighboring_groups(c) {
            if self.group_lib_count(g) != 2 {
                continue;
            }
            if self.group_color(g) == Some(color) {
                own_group.get_or_insert(g);
            } else {
                enemy_group.get_or_insert(g);
            }
        }
        // Filling the other liberty of an enemy group beats connecting our own.
        let group = enemy_group.or(own_group)?;
        let lib2 = self.group_libs(group).iter().copied().find(|&l| l != c)?;
        if !self.is_valid_play(color, lib2) || self.is_bad_selfatari(color, lib2) {
            return None;
        }
        Some((lib2, group))
    }

    fn libmap_hash(&self, group: GroupId) -> Hash {
        let own = self.at(group);
        let mut h = mix(group as u64);
        for &lib in self.group_libs(group) {
            let mut env = lib as u64;
            for n in self.neighbors(lib) {
                let code = match self.at(n) {
                    Stone::Empty => 0,
                    Stone::Offboard => 3,
                    s if s == own => 1,
                    _ => 2,
                };
                env = (env << 2) | code;
            }
            h ^= mix(env ^ 0x6c69_626d_6170);
        }
        h
    }

    fn local_value(&self, scan_neighbors: bool, group: GroupId, goal: Color) -> f64 {
        let mut area: Vec<Coord> = match self.group_at(group) {
            Some(g) => self.group_stones(g),
            None => vec![group],
        };
        if scan_neighbors {
            let core = area.clone();
            for pt in core {
                for n in self.neighbors(pt) {
                    if self.at(n) != Stone::Offboard && !area.contains(&n) {
                        area.push(n);
                    }
                }
            }
        }
        if area.is_empty() {
            return 0.5;
        }
        let total: f64 = area
            .iter()
            .map(|&pt| match self.owner(pt) {
                Some(c) if c == goal => 1.0,
                Some(_) => 0.0,
                None => 0.5,
            })
            .sum();
        total / area.len() as f64
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 1..=self.size {
            for x in 1..=self.size {
                let ch = match self.color[y * self.stride + x] {
                    Stone::Black => 'X',
                    Stone::White => 'O',
                    _ => '.',
                };
                write!(f, "{ch} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_board() {
        let b = Board::new(9);
        assert_eq!(b.points().count(), 81);
        assert_eq!(b.groups().count(), 0);
        assert_eq!(b.at(PASS_MOVE), Stone::Offboard);
    }

    #[test]
    fn test_parse_str_coord_roundtrip() {
        let b = Board::new(9);
        for pt in b.points() {
            let s = b.str_coord(pt);
            assert_eq!(b.parse_coord(&s), pt, "Failed roundtrip for {s}");
        }
        assert_eq!(b.parse_coord("I5"), PASS_MOVE);
        assert_eq!(b.parse_coord("K1"), PASS_MOVE);
        assert_eq!(b.parse_coord("A10"), PASS_MOVE);
    }

    #[test]
    fn test_diagram_groups_and_liberties() {
        let b = Board::from_diagram(&[
            ".....", //
            ".XX..", //
            ".O...", //
            ".....", //
            ".....",
        ]);
        let b4 = b.parse_coord("B4");
        let g = b.group_at(b4).unwrap();
        assert_eq!(b.group_at(b.parse_coord("C4")), Some(g));
        assert_eq!(g, b4, "base stone is the lowest coordinate");
        assert_eq!(b.group_lib_count(g), 5);
        let w = b.group_at(b.parse_coord("B3")).unwrap();
        assert_eq!(b.group_lib_count(w), 3);
    }

    #[test]
    fn test_capture_and_ko() {
        let mut b = Board::from_diagram(&[
            ".....", //
            ".XO..", //
            "X.XO.", //
            ".XO..", //
            ".....",
        ]);
        let b3 = b.parse_coord("B3");
        let c3 = b.parse_coord("C3");
        b.play(Color::White, b3).unwrap();
        assert_eq!(b.at(c3), Stone::Empty, "C3 captured");
        // Black may not retake immediately.
        assert_eq!(b.play(Color::Black, c3), Err(MoveError::Ko));
        assert!(!b.is_valid_play(Color::Black, c3));
        b.play(Color::Black, b.parse_coord("E1")).unwrap();
        b.play(Color::White, b.parse_coord("E5")).unwrap();
        assert!(b.play(Color::Black, c3).is_ok());
    }

    #[test]
    fn test_move_number_counts_passes() {
        let mut b = Board::new(5);
        assert_eq!(b.move_number(), 0);
        b.play(Color::Black, b.parse_coord("C3")).unwrap();
        b.pass();
        b.play(Color::Black, PASS_MOVE).unwrap();
        assert_eq!(b.move_number(), 3);
        // Illegal moves and setup stones do not count.
        assert!(b.play(Color::White, b.parse_coord("C3")).is_err());
        b.place(Color::White, b.parse_coord("A1"));
        assert_eq!(b.move_number(), 3);
    }

    #[test]
    fn test_suicide() {
        let mut b = Board::from_diagram(&[
            ".X...", //
            "X....", //
            ".....", //
            ".....", //
            ".....",
        ]);
        let a5 = b.parse_coord("A5");
        assert!(!b.is_valid_play(Color::White, a5));
        assert_eq!(b.play(Color::White, a5), Err(MoveError::Suicide));
        assert_eq!(b.at(a5), Stone::Empty);
        assert!(b.is_valid_play(Color::Black, a5));
    }

    #[test]
    fn test_bad_selfatari() {
        let b = Board::from_diagram(&[
            ".X...", //
            "XO...", //
            "O....", //
            ".....", //
            ".....",
        ]);
        // Black A5 joins B5 and A4 into a group left with C5 only.
        let a5 = b.parse_coord("A5");
        assert!(b.is_bad_selfatari(Color::Black, a5));
        // White A5 captures A4, so it is fine.
        assert!(b.is_valid_play(Color::White, a5));
        assert!(!b.is_bad_selfatari(Color::White, a5));
        let c3 = b.parse_coord("C3");
        assert!(!b.is_bad_selfatari(Color::White, c3));
    }

    #[test]
    fn test_hash_tracks_liberties() {
        let mut b = Board::from_diagram(&[
            ".....", //
            ".....", //
            "..X..", //
            ".....", //
            ".....",
        ]);
        let g = b.group_at(b.parse_coord("C3")).unwrap();
        let before = b.libmap_hash(g);
        assert_eq!(before, b.libmap_hash(g));
        b.place(Color::White, b.parse_coord("C4"));
        assert_ne!(before, b.libmap_hash(g));
    }

    #[test]
    fn test_local_value() {
        let b = Board::from_diagram(&[
            "..X", //
            "...", //
            "...",
        ]);
        let g = b.group_at(b.parse_coord("C3")).unwrap();
        assert_eq!(b.local_value(false, g, Color::Black), 1.0);
        assert_eq!(b.local_value(false, g, Color::White), 0.0);
        // Two empty neighbors count as neutral.
        let v = b.local_value(true, g, Color::Black);
        assert!((v - 2.0 / 3.0).abs() < 1e-9);
    }
}
