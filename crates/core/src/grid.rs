//! Grid module - the 10x22 occupancy matrix
//!
//! The grid stores one [`Cell`] per position in a flat array for cache
//! locality and zero allocation.
//! Coordinates: (col, row) where col ranges 0..9 (left to right) and row
//! ranges 0..21 (bottom to top). Rows 20 and 21 are the hidden spawn buffer
//! and are never scanned for line clears.

use arrayvec::ArrayVec;

use crate::types::{Cell, PieceKind, Pos, GRID_HEIGHT, GRID_WIDTH, VISIBLE_HEIGHT};

/// Total number of cells on the grid
const GRID_SIZE: usize = (GRID_WIDTH as usize) * (GRID_HEIGHT as usize);

const WIDTH: usize = GRID_WIDTH as usize;

/// Row indices collected by a pattern-match scan (bottom to top)
pub type FullRows = ArrayVec<usize, { VISIBLE_HEIGHT as usize }>;

/// Grid cell codes, `[row][col]`, row 0 at the bottom
pub type GridCodes = [[u8; GRID_WIDTH as usize]; GRID_HEIGHT as usize];

/// The playfield - 10 columns x 22 rows using flat array storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grid {
    /// Flat array of cells, row-major order (row * WIDTH + col)
    cells: [Cell; GRID_SIZE],
}

impl Grid {
    /// Create a new empty grid
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; GRID_SIZE],
        }
    }

    /// Calculate flat index from a position
    #[inline(always)]
    fn index(pos: Pos) -> Option<usize> {
        if !pos.in_bounds() {
            return None;
        }
        Some((pos.row as usize) * WIDTH + (pos.col as usize))
    }

    pub fn width(&self) -> u8 {
        GRID_WIDTH
    }

    pub fn height(&self) -> u8 {
        GRID_HEIGHT
    }

    /// Get cell at position. Returns None if out of bounds
    pub fn get(&self, pos: Pos) -> Option<Cell> {
        Self::index(pos).map(|idx| self.cells[idx])
    }

    /// Set cell at position. Returns false if out of bounds
    pub fn set(&mut self, pos: Pos, cell: Cell) -> bool {
        match Self::index(pos) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Write a piece cell; `ghost` stores the projection code (+10) instead.
    ///
    /// Panics if `pos` is outside the grid: callers only write positions
    /// that already passed a collision check.
    pub fn put(&mut self, pos: Pos, kind: PieceKind, ghost: bool) {
        let cell = if ghost {
            Cell::Ghost(kind)
        } else {
            Cell::Block(kind)
        };
        assert!(self.set(pos, cell), "piece cell out of grid: {pos:?}");
    }

    /// Empty a cell. Panics if `pos` is outside the grid.
    pub fn erase(&mut self, pos: Pos) {
        assert!(self.set(pos, Cell::Empty), "erase out of grid: {pos:?}");
    }

    /// Whether the position is inside the grid and holds no block.
    ///
    /// Ghost cells count as free.
    pub fn is_free(&self, pos: Pos) -> bool {
        matches!(self.get(pos), Some(Cell::Empty) | Some(Cell::Ghost(_)))
    }

    /// Whether the position is inside the grid and holds a block
    pub fn is_block(&self, pos: Pos) -> bool {
        matches!(self.get(pos), Some(Cell::Block(_)))
    }

    /// A row is full iff all 10 cells hold a block; ghosts do not count.
    pub fn is_row_full(&self, row: usize) -> bool {
        if row >= GRID_HEIGHT as usize {
            return false;
        }
        let start = row * WIDTH;
        self.cells[start..start + WIDTH]
            .iter()
            .all(|cell| cell.is_block())
    }

    /// Scan the visible rows and return the full ones, bottom to top.
    pub fn full_rows(&self) -> FullRows {
        (0..VISIBLE_HEIGHT as usize)
            .filter(|&row| self.is_row_full(row))
            .collect()
    }

    /// Remove one row, shift everything above it down by one and append an
    /// empty row at the top.
    pub fn clear_row(&mut self, row: usize) {
        if row >= GRID_HEIGHT as usize {
            return;
        }
        let top = GRID_HEIGHT as usize - 1;
        for r in row..top {
            let src = (r + 1) * WIDTH;
            self.cells.copy_within(src..src + WIDTH, r * WIDTH);
        }
        for cell in &mut self.cells[top * WIDTH..] {
            *cell = Cell::Empty;
        }
    }

    /// Remove every listed row in one pass, preserving the relative order of
    /// the rows that stay, and fill the top with empty rows.
    ///
    /// `rows` may be in any order; duplicates and out-of-range rows are ignored.
    /// Returns the number of rows removed.
    pub fn compact(&mut self, rows: &[usize]) -> usize {
        let height = GRID_HEIGHT as usize;
        let mut write = 0usize;
        for read in 0..height {
            if rows.contains(&read) {
                continue;
            }
            if write != read {
                let src = read * WIDTH;
                self.cells.copy_within(src..src + WIDTH, write * WIDTH);
            }
            write += 1;
        }
        for cell in &mut self.cells[write * WIDTH..] {
            *cell = Cell::Empty;
        }
        height - write
    }

    /// Erase every ghost cell
    pub fn clear_ghosts(&mut self) {
        for cell in &mut self.cells {
            if cell.is_ghost() {
                *cell = Cell::Empty;
            }
        }
    }

    /// Count of block cells (locked plus active)
    pub fn block_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_block()).count()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Clear the entire grid
    pub fn clear(&mut self) {
        self.cells = [Cell::Empty; GRID_SIZE];
    }

    /// Export cell codes, `[row][col]`
    pub fn write_codes(&self, out: &mut GridCodes) {
        for (row, line) in out.iter_mut().enumerate() {
            for (col, code) in line.iter_mut().enumerate() {
                *code = self.cells[row * WIDTH + col].code();
            }
        }
    }

    pub fn to_codes(&self) -> GridCodes {
        let mut out = [[0u8; GRID_WIDTH as usize]; GRID_HEIGHT as usize];
        self.write_codes(&mut out);
        out
    }

    /// Build a grid from cell codes. Returns None if any code is not 0, 1-7 or 11-17.
    pub fn from_codes(codes: &GridCodes) -> Option<Self> {
        let mut grid = Self::new();
        for (row, line) in codes.iter().enumerate() {
            for (col, &code) in line.iter().enumerate() {
                grid.cells[row * WIDTH + col] = Cell::from_code(code)?;
            }
        }
        Some(grid)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}
