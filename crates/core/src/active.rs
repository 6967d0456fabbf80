//! Active piece model and collision checks
//!
//! The active piece's blocks are also written into the grid, so every
//! legality check must exclude the piece's own current footprint: a target
//! cell is legal if it is inside the grid and either free (empty or ghost)
//! or one of the piece's own blocks.

use crate::grid::Grid;
use crate::pieces::{self, Blocks};
use crate::types::{Direction, Facing, PieceKind, Pos};

/// The piece under player control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub facing: Facing,
    pub blocks: Blocks,
}

impl ActivePiece {
    /// A piece at its raw North spawn layout
    pub fn spawn(kind: PieceKind) -> Self {
        Self {
            kind,
            facing: Facing::North,
            blocks: pieces::spawn_layout(kind),
        }
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.blocks.contains(&pos)
    }

    /// Copy moved one step in `direction` (no legality check)
    pub fn moved(&self, direction: Direction) -> Self {
        let (dc, dr) = direction.delta();
        Self {
            blocks: pieces::translate(&self.blocks, dc, dr),
            ..*self
        }
    }

    /// Whether any block is below the skyline
    pub fn any_below_skyline(&self) -> bool {
        self.blocks.iter().any(|b| !b.above_skyline())
    }
}

/// Whether `candidate` can replace `own` on the grid.
pub fn fits(grid: &Grid, candidate: &Blocks, own: &Blocks) -> bool {
    candidate
        .iter()
        .all(|&pos| grid.is_free(pos) || (pos.in_bounds() && own.contains(&pos)))
}

/// Whether the piece can move one step in `direction`
pub fn can_move(grid: &Grid, piece: &ActivePiece, direction: Direction) -> bool {
    fits(grid, &piece.moved(direction).blocks, &piece.blocks)
}

/// How many rows the piece can fall before resting
pub fn drop_distance(grid: &Grid, piece: &ActivePiece) -> u32 {
    let mut distance = 0u32;
    let mut probe = *piece;
    while fits(grid, &probe.moved(Direction::Down).blocks, &piece.blocks) {
        probe = probe.moved(Direction::Down);
        distance += 1;
    }
    distance
}

/// Blocks at the landing position (where a hard drop would leave the piece)
pub fn landing_blocks(grid: &Grid, piece: &ActivePiece) -> Blocks {
    let distance = drop_distance(grid, piece) as i8;
    pieces::translate(&piece.blocks, 0, -distance)
}
