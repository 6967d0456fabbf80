use crate::active::ActivePiece;
use crate::engine::Phase;
use crate::grid::GridCodes;
use crate::pieces::Blocks;
use crate::scoring::Stats;
use crate::types::{Facing, PieceKind, GRID_HEIGHT, GRID_WIDTH, NEXT_QUEUE_LEN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub facing: Facing,
    pub blocks: Blocks,
}

impl From<ActivePiece> for ActiveSnapshot {
    fn from(value: ActivePiece) -> Self {
        Self {
            kind: value.kind,
            facing: value.facing,
            blocks: value.blocks,
        }
    }
}

/// Everything a presentation layer reads after each command or tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineSnapshot {
    /// Cell codes `[row][col]`, row 0 at the bottom
    pub grid: GridCodes,
    pub active: Option<ActiveSnapshot>,
    pub hold: Option<PieceKind>,
    pub hold_available: bool,
    pub next_queue: [PieceKind; NEXT_QUEUE_LEN],
    pub stats: Stats,
    pub running: bool,
    pub paused: bool,
    pub fall_speed_ms: u32,
    pub phase: Phase,
}

impl EngineSnapshot {
    /// Whether the external scheduler should deliver ticks
    pub fn wants_ticks(&self) -> bool {
        self.running && !self.paused
    }

    /// Visible rows only, top row first (the order a renderer draws them)
    pub fn visible_rows_top_down(&self) -> impl Iterator<Item = &[u8; GRID_WIDTH as usize]> {
        self.grid[..crate::types::VISIBLE_HEIGHT as usize].iter().rev()
    }
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            grid: [[0u8; GRID_WIDTH as usize]; GRID_HEIGHT as usize],
            active: None,
            hold: None,
            hold_available: true,
            next_queue: [PieceKind::O; NEXT_QUEUE_LEN],
            stats: Stats::new(),
            running: false,
            paused: false,
            fall_speed_ms: 0,
            phase: Phase::Idle,
        }
    }
}
