//! Two-liberty group tactics.
//!
//! For a group with exactly two liberties, generate the moves worth trying
//! and remembering: ataris when the acting color is the attacker, escapes
//! when it is the owner. A defender also looks one hop out for counter-ataris
//! on adjacent enemy groups. Candidates go into a [`LibmapQueue`] together
//! with the shape they are remembered under.

use log::{debug, trace};

use crate::board::{Color, Coord, GroupId, Hash, Move, Stone, TacticalBoard};
use crate::config::LibmapConfig;
use crate::queue::{GroupInfo, LibmapQueue};

/// Whether a liberty offers a connection to a healthy friendly group and
/// whether it has an empty point to extend to (other than `other_lib`).
fn escape_routes<B: TacticalBoard>(
    board: &B,
    group: GroupId,
    color: Color,
    lib: Coord,
    other_lib: Coord,
) -> (bool, bool) {
    let mut can_connect = false;
    let mut can_pull_out = false;
    for c in board.neighbors(lib) {
        if c == other_lib {
            continue;
        }
        match board.at(c) {
            Stone::Empty => can_pull_out = true,
            s if s == Stone::from(color) => {
                if let Some(cg) = board.group_at(c) {
                    if cg != group && board.group_lib_count(cg) > 1 {
                        can_connect = true;
                    }
                }
            }
            _ => {}
        }
    }
    (can_connect, can_pull_out)
}

/// Whether the two-liberty `group` of `color` is safe without answering an
/// atari: it can connect out on both liberties, or connect on one and pull
/// out on the other. Two pull-outs are not enough.
///
/// A pull-out never counts the other liberty, so
///
/// ```text
/// X X X O
/// X . . O
/// O O X O
/// ```
///
/// is not miai for `X`: the left dot only extends into the right one.
pub fn miai_2lib<B: TacticalBoard>(board: &B, group: GroupId, color: Color) -> bool {
    let libs = board.group_libs(group);
    debug_assert_eq!(libs.len(), 2);
    let (lib0, lib1) = (libs[0], libs[1]);
    let (connect0, pull0) = escape_routes(board, group, color, lib0, lib1);
    let (connect1, pull1) = escape_routes(board, group, color, lib1, lib0);
    (connect0 && connect1) || (connect0 && pull1) || (pull0 && connect1)
}

/// Whether the defender escaping at `lib` gains nothing: the new stone
/// touches the group only once and brings a single fresh liberty, or two of
/// which one is shared with `other_lib`'s neighborhood.
///
/// Connecting to a friendly group that is itself short of liberties is not
/// detected.
pub fn defense_is_hopeless<B: TacticalBoard>(
    board: &B,
    owner: Color,
    to_play: Color,
    lib: Coord,
    other_lib: Coord,
    enabled: bool,
) -> bool {
    if !enabled || to_play != owner || board.neighbor_count_at(lib, owner.into()) != 1 {
        return false;
    }
    match board.immediate_liberty_count(lib) {
        1 => true,
        2 => board.is_adjacent(lib, other_lib),
        _ => false,
    }
}

/// Queue `mv` under each hash framing enabled in the configuration.
///
/// The attack framings only exist when a counter-atari target hash is given.
fn commit_candidate(
    queue: &mut LibmapQueue,
    mv: Move,
    tag: u32,
    info: GroupInfo,
    ca_hash: Option<Hash>,
    config: &LibmapConfig,
) {
    let ca = config.counterattack;
    if ca.defense {
        queue.add(mv, tag, info);
    }
    if let Some(ca_hash) = ca_hash {
        if ca.attack {
            queue.add(mv, tag, GroupInfo { hash: ca_hash, ..info });
        }
        if ca.defense_attack {
            queue.add(
                mv,
                tag,
                GroupInfo {
                    hash: info.hash ^ ca_hash,
                    ..info
                },
            );
        }
    }
}

/// Queue the moves `to_play` should consider on the liberties of the
/// two-liberty `group` owned by `owner`.
///
/// `info` names the context the moves are remembered in; `ca_hash` is the
/// shape hash of `group` when it is a counter-atari target of another group.
///
/// Per liberty: illegal plays and hopeless escapes are skipped; a bad
/// self-atari is skipped by the defender while the attacker tries its cousin
/// (typically filling a false eye first) at lower preference; a point
/// crowded by own stones and edge ("lumpy") is also less preferred. When the
/// two liberties end up with different preference only the preferred one is
/// kept.
#[allow(clippy::too_many_arguments)]
pub fn can_atari_group<B: TacticalBoard>(
    board: &B,
    group: GroupId,
    owner: Color,
    to_play: Color,
    queue: &mut LibmapQueue,
    tag: u32,
    info: GroupInfo,
    ca_hash: Option<Hash>,
    use_def_no_hopeless: bool,
    config: &LibmapConfig,
) {
    let libs = board.group_libs(group);
    debug_assert_eq!(libs.len(), 2);
    let libs = [libs[0], libs[1]];
    let mut have = [false; 2];
    let mut preference = [true; 2];
    // Queue length before the first liberty was committed.
    let mark = queue.len();

    for i in 0..2 {
        let mut lib = libs[i];
        debug_assert_eq!(board.at(lib), Stone::Empty);
        if !board.is_valid_play(to_play, lib) {
            continue;
        }
        trace!("- checking liberty {lib} of {owner} {group}, filled by {to_play}");

        if defense_is_hopeless(board, owner, to_play, lib, libs[1 - i], use_def_no_hopeless) {
            continue;
        }

        if board.is_bad_selfatari(to_play, lib) {
            trace!("\tliberty {lib} is selfatari");
            if to_play == owner {
                continue;
            }
            let Some((cousin, bygroup)) = board.selfatari_cousin(to_play, lib) else {
                continue;
            };
            let Some(byowner) = board.group_color(bygroup) else {
                continue;
            };
            trace!("\treluctantly switching to cousin {cousin} (group {bygroup} {byowner})");
            if defense_is_hopeless(board, byowner, to_play, cousin, lib, use_def_no_hopeless) {
                continue;
            }
            lib = cousin;
            preference[i] = false;
        }

        have[i] = true;

        //  #######
        //  ..O.X.X   <- always play the left one
        //  OXXXXXX
        let crowd =
            board.neighbor_count_at(lib, to_play.into()) + board.neighbor_count_at(lib, Stone::Offboard);
        if crowd >= 3 {
            trace!("\tlumpy: {crowd} own or edge neighbors");
            preference[i] = false;
        }

        trace!("+ liberty {lib} ready with preference {}", preference[i]);

        if i == 1 && have[0] && preference[0] != preference[1] {
            if preference[0] {
                continue;
            }
            queue.truncate(mark);
        }

        commit_candidate(queue, Move::new(lib, to_play), tag, info, ca_hash, config);
    }
}

/// Generate tactical moves for `to_play` around the two-liberty `group`.
///
/// With `use_miai_safe`, a group that already has miai is left alone. When
/// `to_play` owns the group, enemy groups touching it are examined too: one in
/// atari contributes its capturing point, one with two liberties goes
/// through [`can_atari_group`] with the defender's context and the enemy's
/// hash as counter-atari framing. This look-around is one hop deep only.
#[allow(clippy::too_many_arguments)]
pub fn group_2lib_check<B: TacticalBoard>(
    board: &B,
    group: GroupId,
    to_play: Color,
    queue: &mut LibmapQueue,
    tag: u32,
    use_miai_safe: bool,
    use_def_no_hopeless: bool,
    config: &LibmapConfig,
) {
    let Some(color) = board.group_color(group) else {
        debug_assert!(false, "2lib check of empty point {group}");
        return;
    };
    debug!("[{group}] 2lib check of {color} for {to_play}");

    if use_miai_safe && miai_2lib(board, group, color) {
        return;
    }

    let info = GroupInfo {
        group,
        color,
        hash: board.libmap_hash(group),
        goal: to_play,
    };
    can_atari_group(
        board,
        group,
        color,
        to_play,
        queue,
        tag,
        info,
        None,
        use_def_no_hopeless,
        config,
    );

    if to_play != color {
        return;
    }

    let enemy = Stone::from(color.other());
    let mut seen: Vec<GroupId> = Vec::new();
    for stone in board.group_stones(group) {
        for c in board.neighbors(stone) {
            if board.at(c) != enemy {
                continue;
            }
            let Some(g2) = board.group_at(c) else {
                continue;
            };
            if seen.contains(&g2) {
                continue;
            }
            seen.push(g2);

            match board.group_lib_count(g2) {
                1 => {
                    let capture = Move::new(board.group_libs(g2)[0], to_play);
                    queue.add(capture, tag, info);
                }
                2 => can_atari_group(
                    board,
                    g2,
                    color.other(),
                    to_play,
                    queue,
                    tag,
                    info,
                    Some(board.libmap_hash(g2)),
                    use_def_no_hopeless,
                    config,
                ),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Board;

    #[test]
    fn test_hopeless_needs_defender() {
        let b = Board::from_diagram(&[
            ".....", //
            ".....", //
            ".OX..", //
            "..O..", //
            ".....",
        ]);
        let lib = b.parse_coord("B2");
        let other = b.parse_coord("D3");
        // Attackers are never pruned, and the flag gates everything.
        assert!(!defense_is_hopeless(&b, Color::White, Color::Black, lib, other, true));
        assert!(!defense_is_hopeless(&b, Color::White, Color::White, lib, other, false));
    }

    #[test]
    fn test_commit_framings() {
        let config = LibmapConfig::default();
        let mut q = LibmapQueue::new(&LibmapConfig::parse("mq_merge_groups=0").unwrap());
        let info = GroupInfo {
            group: 10,
            color: Color::Black,
            hash: 0b1100,
            goal: Color::Black,
        };
        let mv = Move::new(20, Color::Black);
        commit_candidate(&mut q, mv, 1, info, None, &config);
        assert_eq!(q.len(), 1);
        q.clear();
        commit_candidate(&mut q, mv, 1, info, Some(0b1010), &config);
        let hashes: Vec<Hash> = q.iter().map(|m| m.info.hash).collect();
        assert_eq!(hashes, vec![0b1100, 0b1010, 0b0110]);

        let only_attack = LibmapConfig::parse("counterattack=a").unwrap();
        q.clear();
        commit_candidate(&mut q, mv, 1, info, None, &only_attack);
        assert!(q.is_empty());
    }
}
