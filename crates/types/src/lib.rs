//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the engine.
//! All types are pure data with no external dependencies, so they can be
//! used by the simulation, the persistence layer and any presentation layer.
//!
//! # Grid Dimensions
//!
//! The playfield is 10 columns by 22 rows. Rows 0-19 are visible; rows 20
//! and 21 are the hidden spawn buffer above the skyline.
//!
//! - **Origin**: bottom-left corner, column first then row
//! - **Skyline**: row 20
//!
//! # Cell Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Empty |
//! | 1-7 | Locked (or active) block of O, I, T, L, J, S, Z |
//! | 11-17 | Ghost projection of the same piece kinds |
//!
//! # Examples
//!
//! ```
//! use line_clear_types::{Cell, Facing, PieceKind, GRID_HEIGHT, GRID_WIDTH};
//!
//! let kind = PieceKind::from_str("t").unwrap();
//! assert_eq!(kind, PieceKind::T);
//! assert_eq!(Cell::Block(kind).code(), 3);
//! assert_eq!(Cell::Ghost(kind).code(), 13);
//!
//! assert_eq!(Facing::North.rotate_cw(), Facing::East);
//! assert_eq!(GRID_WIDTH, 10);
//! assert_eq!(GRID_HEIGHT, 22);
//! ```

/// Grid width in cells (10 columns)
pub const GRID_WIDTH: u8 = 10;

/// Grid height in cells, including the two hidden rows (22 rows)
pub const GRID_HEIGHT: u8 = 22;

/// Number of visible rows; also the index of the skyline row
pub const VISIBLE_HEIGHT: u8 = 20;

/// First hidden row. Blocks at or above it are above the skyline.
pub const SKYLINE: i8 = VISIBLE_HEIGHT as i8;

/// Number of upcoming pieces exposed by the next queue
pub const NEXT_QUEUE_LEN: usize = 6;

/// Number of piece kinds in one bag cycle
pub const BAG_SIZE: usize = 7;

/// Value added to a piece code to mark a ghost cell
pub const GHOST_OFFSET: u8 = 10;

/// Fall speed at level 1 (milliseconds per row)
pub const BASE_FALL_MS: u32 = 1000;

/// Goal increment multiplier: on level up the goal grows by `level * GOAL_STEP`
pub const GOAL_STEP: u32 = 5;

/// Maximum lock-down resets per piece under the Extended policy
pub const EXTENDED_LOCK_RESETS: u8 = 15;

/// Line clear points at level 1, indexed by lines cleared.
///
/// Points are multiplied by the current level.
pub const LINE_SCORES: [u32; 5] = [0, 100, 300, 500, 800];

/// Points per row for a player-issued downward move
pub const SOFT_DROP_POINTS: u32 = 1;

/// Points per row for a hard drop
pub const HARD_DROP_POINTS: u32 = 2;

/// The seven tetromino piece kinds
///
/// The declaration order matches the cell codes 1-7 used by the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    O,
    I,
    T,
    L,
    J,
    S,
    Z,
}

impl PieceKind {
    /// All kinds in cell-code order.
    pub const ALL: [PieceKind; BAG_SIZE] = [
        PieceKind::O,
        PieceKind::I,
        PieceKind::T,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
    ];

    /// Grid code for a locked block of this kind (1-7).
    pub const fn code(self) -> u8 {
        match self {
            PieceKind::O => 1,
            PieceKind::I => 2,
            PieceKind::T => 3,
            PieceKind::L => 4,
            PieceKind::J => 5,
            PieceKind::S => 6,
            PieceKind::Z => 7,
        }
    }

    /// Inverse of [`PieceKind::code`].
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(PieceKind::O),
            2 => Some(PieceKind::I),
            3 => Some(PieceKind::T),
            4 => Some(PieceKind::L),
            5 => Some(PieceKind::J),
            6 => Some(PieceKind::S),
            7 => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Parse piece kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use line_clear_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("O"), Some(PieceKind::O));
    /// assert_eq!(PieceKind::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "O" => Some(PieceKind::O),
            "I" => Some(PieceKind::I),
            "T" => Some(PieceKind::T),
            "L" => Some(PieceKind::L),
            "J" => Some(PieceKind::J),
            "S" => Some(PieceKind::S),
            "Z" => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Single uppercase letter
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::O => "O",
            PieceKind::I => "I",
            PieceKind::T => "T",
            PieceKind::L => "L",
            PieceKind::J => "J",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
        }
    }
}

/// Rotation states following the Super Rotation System (SRS)
///
/// - **North**: spawn orientation
/// - **East**: rotated 90° clockwise
/// - **South**: rotated 180°
/// - **West**: rotated 90° counter-clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facing {
    North,
    East,
    South,
    West,
}

impl Facing {
    /// All facings in clockwise order starting from spawn.
    pub const ALL: [Facing; 4] = [Facing::North, Facing::East, Facing::South, Facing::West];

    /// Rotate clockwise (90°)
    ///
    /// ```
    /// use line_clear_types::Facing;
    ///
    /// assert_eq!(Facing::North.rotate_cw(), Facing::East);
    /// assert_eq!(Facing::West.rotate_cw(), Facing::North);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        match self {
            Facing::North => Facing::East,
            Facing::East => Facing::South,
            Facing::South => Facing::West,
            Facing::West => Facing::North,
        }
    }

    /// Rotate counter-clockwise (-90°)
    ///
    /// ```
    /// use line_clear_types::Facing;
    ///
    /// assert_eq!(Facing::North.rotate_ccw(), Facing::West);
    /// assert_eq!(Facing::East.rotate_ccw(), Facing::North);
    /// ```
    pub fn rotate_ccw(&self) -> Self {
        match self {
            Facing::North => Facing::West,
            Facing::West => Facing::South,
            Facing::South => Facing::East,
            Facing::East => Facing::North,
        }
    }

    /// Column index into the offset tables.
    pub const fn index(self) -> usize {
        match self {
            Facing::North => 0,
            Facing::East => 1,
            Facing::South => 2,
            Facing::West => 3,
        }
    }

    /// Number of clockwise quarter turns from North.
    pub const fn quarter_turns(self) -> usize {
        self.index()
    }

    /// Parse facing from string
    ///
    /// Accepts full names or single letters (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "north" | "n" => Some(Facing::North),
            "east" | "e" => Some(Facing::East),
            "south" | "s" => Some(Facing::South),
            "west" | "w" => Some(Facing::West),
            _ => None,
        }
    }

    /// Single uppercase letter
    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::North => "N",
            Facing::East => "E",
            Facing::South => "S",
            Facing::West => "W",
        }
    }
}

/// Translation directions accepted by `move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    Left,
    Right,
}

impl Direction {
    /// Per-block `(column, row)` delta.
    pub const fn delta(self) -> (i8, i8) {
        match self {
            Direction::Down => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }
}

/// Absolute grid coordinate. Origin bottom-left, column first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pos {
    pub col: i8,
    pub row: i8,
}

impl Pos {
    pub const fn new(col: i8, row: i8) -> Self {
        Self { col, row }
    }

    pub const fn offset(self, dc: i8, dr: i8) -> Self {
        Self {
            col: self.col + dc,
            row: self.row + dr,
        }
    }

    pub const fn in_bounds(self) -> bool {
        self.col >= 0 && self.col < GRID_WIDTH as i8 && self.row >= 0 && self.row < GRID_HEIGHT as i8
    }

    /// Whether this position is at or above the skyline.
    pub const fn above_skyline(self) -> bool {
        self.row >= SKYLINE
    }
}

/// A cell on the grid
///
/// Both locked blocks and the active piece's footprint are `Block`; the
/// engine tells them apart by comparing against the active piece's blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Block(PieceKind),
    Ghost(PieceKind),
}

impl Cell {
    /// Grid code: 0, 1-7 or 11-17.
    pub const fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Block(kind) => kind.code(),
            Cell::Ghost(kind) => kind.code() + GHOST_OFFSET,
        }
    }

    /// Inverse of [`Cell::code`]. Returns `None` for codes outside 0, 1-7, 11-17.
    pub const fn from_code(code: u8) -> Option<Self> {
        if code == 0 {
            return Some(Cell::Empty);
        }
        if let Some(kind) = PieceKind::from_code(code) {
            return Some(Cell::Block(kind));
        }
        if code > GHOST_OFFSET {
            if let Some(kind) = PieceKind::from_code(code - GHOST_OFFSET) {
                return Some(Cell::Ghost(kind));
            }
        }
        None
    }

    pub const fn is_block(self) -> bool {
        matches!(self, Cell::Block(_))
    }

    pub const fn is_ghost(self) -> bool {
        matches!(self, Cell::Ghost(_))
    }
}

/// Lock-down policy
///
/// - **Extended**: grounded lateral moves and rotations grant one extra tick, up to 15 times
/// - **Infinite**: as Extended without the cap
/// - **Classic**: lock on the first tick the piece cannot fall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LockDown {
    #[default]
    Extended,
    Infinite,
    Classic,
}

impl LockDown {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "extended" => Some(LockDown::Extended),
            "infinite" => Some(LockDown::Infinite),
            "classic" => Some(LockDown::Classic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LockDown::Extended => "Extended",
            LockDown::Infinite => "Infinite",
            LockDown::Classic => "Classic",
        }
    }

    /// Maximum grants per piece, `None` when unlimited.
    pub const fn reset_limit(self) -> Option<u8> {
        match self {
            LockDown::Extended => Some(EXTENDED_LOCK_RESETS),
            LockDown::Infinite => None,
            LockDown::Classic => Some(0),
        }
    }
}

/// Engine options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Options {
    /// Whether the hold slot can be used
    pub hold_enabled: bool,
    /// Whether ghost cells (11-17) are projected onto the grid
    pub ghost_piece: bool,
    pub lock_down: LockDown,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            hold_enabled: true,
            ghost_piece: true,
            lock_down: LockDown::Extended,
        }
    }
}

/// Commands accepted by the engine
///
/// These are what a presentation layer or tick driver sends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Move piece one cell down (soft drop scoring)
    MoveDown,
    /// Rotate piece 90° clockwise
    RotateCw,
    /// Rotate piece 90° counter-clockwise
    RotateCcw,
    /// Swap the active piece with the hold slot
    Hold,
    /// Drop the piece as far as it goes (lock happens on the next tick)
    HardDrop,
    /// Advance the falling phase one step
    Tick,
    TogglePause,
    Start,
    Reset,
}

impl Command {
    /// Parse command from string
    ///
    /// ```
    /// use line_clear_types::Command;
    ///
    /// assert_eq!(Command::from_str("moveLeft"), Some(Command::MoveLeft));
    /// assert_eq!(Command::from_str("hardDrop"), Some(Command::HardDrop));
    /// assert_eq!(Command::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(Command::MoveLeft),
            "moveright" => Some(Command::MoveRight),
            "movedown" => Some(Command::MoveDown),
            "rotatecw" => Some(Command::RotateCw),
            "rotateccw" => Some(Command::RotateCcw),
            "hold" => Some(Command::Hold),
            "harddrop" => Some(Command::HardDrop),
            "tick" => Some(Command::Tick),
            "togglepause" | "pause" => Some(Command::TogglePause),
            "start" => Some(Command::Start),
            "reset" => Some(Command::Reset),
            _ => None,
        }
    }

    /// camelCase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MoveLeft => "moveLeft",
            Command::MoveRight => "moveRight",
            Command::MoveDown => "moveDown",
            Command::RotateCw => "rotateCw",
            Command::RotateCcw => "rotateCcw",
            Command::Hold => "hold",
            Command::HardDrop => "hardDrop",
            Command::Tick => "tick",
            Command::TogglePause => "togglePause",
            Command::Start => "start",
            Command::Reset => "reset",
        }
    }
}
