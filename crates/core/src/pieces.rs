//! Pieces module - spawn layouts, pivots and the SRS offset tables
//!
//! Rotation is pivot based: every block is rotated 90° about a designated
//! pivot block, then the result is translated by the first legal "kick"
//! taken from the offset tables. A kick for entry `i` is
//! `offset[i][old_facing] - offset[i][new_facing]`.
//! Reference: https://tetris.wiki/SRS (offset formulation)

use crate::types::{Facing, PieceKind, Pos};

/// Four block coordinates. Block order is fixed by the spawn layout and is
/// preserved by every translation and rotation.
pub type Blocks = [Pos; 4];

/// `(column, row)` offsets indexed `[entry][facing]`
pub type OffsetTable = [[(i8, i8); 4]; 5];

/// Spawn layout at facing North, straddling rows 20 and 21.
///
/// Blocks are numbered top to bottom, left to right.
pub const fn spawn_layout(kind: PieceKind) -> Blocks {
    const fn p(col: i8, row: i8) -> Pos {
        Pos::new(col, row)
    }
    match kind {
        PieceKind::I => [p(4, 20), p(5, 20), p(6, 20), p(7, 20)],
        PieceKind::O => [p(5, 21), p(6, 21), p(5, 20), p(6, 20)],
        PieceKind::T => [p(5, 21), p(4, 20), p(5, 20), p(6, 20)],
        PieceKind::L => [p(6, 21), p(4, 20), p(5, 20), p(6, 20)],
        PieceKind::J => [p(4, 21), p(4, 20), p(5, 20), p(6, 20)],
        PieceKind::S => [p(5, 21), p(6, 21), p(4, 20), p(5, 20)],
        PieceKind::Z => [p(4, 21), p(5, 21), p(5, 20), p(6, 20)],
    }
}

/// Index of the block the piece rotates about; `None` for O, which never rotates.
pub const fn pivot_index(kind: PieceKind) -> Option<usize> {
    match kind {
        PieceKind::O => None,
        PieceKind::I => Some(1),
        PieceKind::S => Some(3),
        PieceKind::T | PieceKind::L | PieceKind::J | PieceKind::Z => Some(2),
    }
}

/// Offsets shared by J, L, S, T and Z
static JLSTZ_OFFSETS: OffsetTable = [
    //  N        E         S        W
    [(0, 0), (0, 0), (0, 0), (0, 0)],
    [(0, 0), (1, 0), (0, 0), (-1, 0)],
    [(0, 0), (1, -1), (0, 0), (-1, -1)],
    [(0, 0), (0, 2), (0, 0), (0, 2)],
    [(0, 0), (1, 2), (0, 0), (-1, 2)],
];

/// I piece offsets (different from JLSTZ)
static I_OFFSETS: OffsetTable = [
    //  N         E         S         W
    [(0, 0), (-1, 0), (-1, 1), (0, 1)],
    [(-1, 0), (0, 0), (1, 1), (0, 1)],
    [(2, 0), (0, 0), (-2, 1), (0, 1)],
    [(-1, 0), (0, 1), (1, 0), (0, -1)],
    [(2, 0), (0, -2), (-2, 0), (0, 1)],
];

/// Offset table for a piece kind; `None` for O.
pub fn offset_table(kind: PieceKind) -> Option<&'static OffsetTable> {
    match kind {
        PieceKind::O => None,
        PieceKind::I => Some(&I_OFFSETS),
        _ => Some(&JLSTZ_OFFSETS),
    }
}

/// The five kicks to try for a rotation, in table order.
pub fn kicks(table: &OffsetTable, from: Facing, to: Facing) -> [(i8, i8); 5] {
    let mut out = [(0, 0); 5];
    for (kick, entry) in out.iter_mut().zip(table.iter()) {
        let (fc, fr) = entry[from.index()];
        let (tc, tr) = entry[to.index()];
        *kick = (fc - tc, fr - tr);
    }
    out
}

/// Rotate one position 90° about `pivot`.
///
/// Clockwise applies `[[0, 1], [-1, 0]]`, counter-clockwise `[[0, -1], [1, 0]]`
/// to the position relative to the pivot.
pub const fn rotate_about(pos: Pos, pivot: Pos, clockwise: bool) -> Pos {
    let dc = pos.col - pivot.col;
    let dr = pos.row - pivot.row;
    let (nc, nr) = if clockwise { (dr, -dc) } else { (-dr, dc) };
    Pos::new(pivot.col + nc, pivot.row + nr)
}

/// Raw rotated blocks before any kick. `None` for O.
pub fn rotated_blocks(kind: PieceKind, blocks: &Blocks, clockwise: bool) -> Option<Blocks> {
    let pivot = blocks[pivot_index(kind)?];
    Some(blocks.map(|b| rotate_about(b, pivot, clockwise)))
}

pub fn translate(blocks: &Blocks, dc: i8, dr: i8) -> Blocks {
    blocks.map(|b| b.offset(dc, dr))
}

/// Canonical blocks for `(kind, facing)`: the spawn layout turned clockwise
/// about its pivot, without kicks. Any legal piece equals this up to translation.
pub fn canonical_blocks(kind: PieceKind, facing: Facing) -> Blocks {
    let mut blocks = spawn_layout(kind);
    for _ in 0..facing.quarter_turns() {
        if let Some(next) = rotated_blocks(kind, &blocks, true) {
            blocks = next;
        }
    }
    blocks
}

/// Whether `blocks` are a translated copy of the canonical shape, block for block.
pub fn matches_shape(kind: PieceKind, facing: Facing, blocks: &Blocks) -> bool {
    if kind == PieceKind::O && facing != Facing::North {
        return false;
    }
    let canonical = canonical_blocks(kind, facing);
    let dc = blocks[0].col - canonical[0].col;
    let dr = blocks[0].row - canonical[0].row;
    blocks
        .iter()
        .zip(canonical.iter())
        .all(|(b, c)| b.col - c.col == dc && b.row - c.row == dr)
}

/// Result of a successful rotation search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotated {
    pub blocks: Blocks,
    pub facing: Facing,
    /// 1-based offset entry that passed
    pub entry: usize,
    pub kick: (i8, i8),
}

/// Try to rotate with the SRS offset search.
///
/// `fits` decides legality of a candidate block set. Returns `None` when
/// the piece is O or when none of the five kicks pass.
pub fn try_rotate(
    kind: PieceKind,
    facing: Facing,
    blocks: &Blocks,
    clockwise: bool,
    fits: impl Fn(&Blocks) -> bool,
) -> Option<Rotated> {
    let table = offset_table(kind)?;
    let candidates = rotated_blocks(kind, blocks, clockwise)?;
    let new_facing = if clockwise {
        facing.rotate_cw()
    } else {
        facing.rotate_ccw()
    };

    kicks(table, facing, new_facing)
        .into_iter()
        .enumerate()
        .find_map(|(i, (dc, dr))| {
            let kicked = translate(&candidates, dc, dr);
            fits(&kicked).then_some(Rotated {
                blocks: kicked,
                facing: new_facing,
                entry: i + 1,
                kick: (dc, dr),
            })
        })
}

/// Whether a locked block at `pos` sits in the spawn zone
/// (row 20, columns 4-7; or row 21, columns 4-6).
pub const fn in_spawn_zone(pos: Pos) -> bool {
    match pos.row {
        20 => pos.col >= 4 && pos.col <= 7,
        21 => pos.col >= 4 && pos.col <= 6,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_about_quarter_turns() {
        let pivot = Pos::new(5, 5);
        // Right of pivot goes below it clockwise, above it counter-clockwise.
        assert_eq!(rotate_about(Pos::new(6, 5), pivot, true), Pos::new(5, 4));
        assert_eq!(rotate_about(Pos::new(6, 5), pivot, false), Pos::new(5, 6));
        assert_eq!(rotate_about(pivot, pivot, true), pivot);
    }

    #[test]
    fn test_four_turns_return_to_spawn() {
        for kind in PieceKind::ALL {
            let spawn = spawn_layout(kind);
            let mut blocks = spawn;
            for _ in 0..4 {
                if let Some(next) = rotated_blocks(kind, &blocks, true) {
                    blocks = next;
                }
            }
            assert_eq!(blocks, spawn, "{kind:?}");
        }
    }

    #[test]
    fn test_jlstz_kicks_north_to_east() {
        let k = kicks(&JLSTZ_OFFSETS, Facing::North, Facing::East);
        assert_eq!(k, [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)]);
    }

    #[test]
    fn test_i_kicks_first_entry_is_not_zero() {
        let k = kicks(&I_OFFSETS, Facing::North, Facing::East);
        assert_eq!(k[0], (1, 0));
    }

    #[test]
    fn test_o_piece_never_rotates() {
        let blocks = spawn_layout(PieceKind::O);
        assert!(try_rotate(PieceKind::O, Facing::North, &blocks, true, |_| true).is_none());
        assert!(try_rotate(PieceKind::O, Facing::North, &blocks, false, |_| true).is_none());
    }

    #[test]
    fn test_try_rotate_takes_first_legal_entry() {
        let blocks = translate(&spawn_layout(PieceKind::T), 0, -10);
        let first = try_rotate(PieceKind::T, Facing::North, &blocks, true, |_| true).unwrap();
        assert_eq!(first.entry, 1);
        assert_eq!(first.facing, Facing::East);

        // Reject the unkicked candidate; entry 2 is (-1, 0).
        let unkicked = first.blocks;
        let second =
            try_rotate(PieceKind::T, Facing::North, &blocks, true, |b| *b != unkicked).unwrap();
        assert_eq!(second.entry, 2);
        assert_eq!(second.blocks, translate(&unkicked, -1, 0));
    }

    #[test]
    fn test_matches_shape() {
        for kind in PieceKind::ALL {
            for facing in Facing::ALL {
                if kind == PieceKind::O && facing != Facing::North {
                    continue;
                }
                let moved = translate(&canonical_blocks(kind, facing), -2, -7);
                assert!(matches_shape(kind, facing, &moved), "{kind:?} {facing:?}");
            }
        }
        let mut broken = spawn_layout(PieceKind::L);
        broken[0] = Pos::new(0, 0);
        assert!(!matches_shape(PieceKind::L, Facing::North, &broken));
    }

    #[test]
    fn test_spawn_zone() {
        assert!(in_spawn_zone(Pos::new(4, 20)));
        assert!(in_spawn_zone(Pos::new(7, 20)));
        assert!(!in_spawn_zone(Pos::new(7, 21)));
        assert!(!in_spawn_zone(Pos::new(3, 20)));
        assert!(!in_spawn_zone(Pos::new(5, 19)));
    }
}
