//! Save module - versioned text snapshot of the full engine state
//!
//! A snapshot is seven lines, each a tag followed by one JSON value:
//!
//! | # | Tag | Value |
//! |---|-----|-------|
//! | 1 | `header` | `{"format":"line-clear","version":1,"timestamp":<unix secs>}` |
//! | 2 | `active` | `null` or `{"kind":"T","facing":"N","blocks":[[c,r],..4]}` |
//! | 3 | `hold` | `{"piece":null\|"T","available":true}` |
//! | 4 | `next` | `{"queue":[6 kinds],"bag":[remaining kinds]}` |
//! | 5 | `stats` | `{"score":0,"lines":0,"level":1,"goal":0}` |
//! | 6 | `options` | `{"hold_enabled":true,"ghost_piece":true,"lock_down":"Extended"}` |
//! | 7 | `grid` | 22 rows of 10 cell codes, row 0 first |
//!
//! Decoding parses every line into a [`SaveState`] and validates it before
//! anything touches the engine, so a bad file never leaves a half-loaded
//! game behind.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::active::ActivePiece;
use crate::grid::{Grid, GridCodes};
use crate::pieces;
use crate::rng::Bag;
use crate::scoring::Stats;
use crate::types::{
    Cell, Facing, LockDown, Options, PieceKind, Pos, BAG_SIZE, GRID_HEIGHT, GRID_WIDTH,
    NEXT_QUEUE_LEN,
};

pub const FORMAT: &str = "line-clear";
pub const VERSION: u32 = 1;

const TAG_HEADER: &str = "header";
const TAG_ACTIVE: &str = "active";
const TAG_HOLD: &str = "hold";
const TAG_NEXT: &str = "next";
const TAG_STATS: &str = "stats";
const TAG_OPTIONS: &str = "options";
const TAG_GRID: &str = "grid";

/// Everything a save file records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveState {
    /// Unix seconds at save time
    pub timestamp: u64,
    pub grid: Grid,
    pub active: Option<ActivePiece>,
    pub hold: Option<PieceKind>,
    pub hold_available: bool,
    pub next: [PieceKind; NEXT_QUEUE_LEN],
    pub bag: Bag,
    pub stats: Stats,
    pub options: Options,
}

impl SaveState {
    /// Check the cross-field invariants a decoded file cannot express by shape alone.
    pub fn validate(&self) -> Result<(), SaveError> {
        if self.stats.level == 0 {
            return Err(SaveError::InvalidStats {
                reason: "level must be at least 1".to_string(),
            });
        }

        for (i, kind) in self.bag.iter().enumerate() {
            if self.bag[..i].contains(kind) {
                return Err(SaveError::DuplicateInBag { kind: *kind });
            }
        }

        if let Some(piece) = self.active {
            if let Some(&pos) = piece.blocks.iter().find(|b| !b.in_bounds()) {
                return Err(SaveError::ActiveOutOfGrid { pos });
            }
            if !pieces::matches_shape(piece.kind, piece.facing, &piece.blocks) {
                return Err(SaveError::ActiveShape {
                    kind: piece.kind,
                    facing: piece.facing,
                });
            }
            if let Some(&pos) = piece
                .blocks
                .iter()
                .find(|&&b| self.grid.get(b) != Some(Cell::Block(piece.kind)))
            {
                return Err(SaveError::ActiveNotInGrid { pos });
            }
        }

        Ok(())
    }
}

/// Why a snapshot could not be encoded or decoded
#[derive(Debug)]
pub enum SaveError {
    /// The file ended before this tag
    MissingLine { tag: &'static str },
    /// Lines are out of order or mislabelled
    UnexpectedTag {
        expected: &'static str,
        found: String,
    },
    /// A value failed to (de)serialize
    Json {
        tag: &'static str,
        source: serde_json::Error,
    },
    UnknownFormat { format: String },
    UnsupportedVersion { version: u32 },
    /// Extra non-empty lines after the grid
    TrailingData { line: String },
    QueueLength { len: usize },
    BagTooLarge { len: usize },
    DuplicateInBag { kind: PieceKind },
    InvalidStats { reason: String },
    GridShape { rows: usize, bad_row: Option<usize> },
    CellCode { row: usize, col: usize, code: u8 },
    ActiveOutOfGrid { pos: Pos },
    ActiveShape { kind: PieceKind, facing: Facing },
    /// An active block is missing from the grid
    ActiveNotInGrid { pos: Pos },
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::MissingLine { tag } => write!(f, "snapshot ends before `{tag}` line"),
            SaveError::UnexpectedTag { expected, found } => {
                write!(f, "expected `{expected}` line, found `{found}`")
            }
            SaveError::Json { tag, source } => write!(f, "bad `{tag}` value: {source}"),
            SaveError::UnknownFormat { format } => write!(f, "unknown snapshot format `{format}`"),
            SaveError::UnsupportedVersion { version } => {
                write!(f, "unsupported snapshot version {version} (expected {VERSION})")
            }
            SaveError::TrailingData { line } => write!(f, "trailing data after grid: `{line}`"),
            SaveError::QueueLength { len } => {
                write!(f, "next queue has {len} pieces, expected {NEXT_QUEUE_LEN}")
            }
            SaveError::BagTooLarge { len } => {
                write!(f, "bag has {len} pieces, at most {BAG_SIZE} allowed")
            }
            SaveError::DuplicateInBag { kind } => {
                write!(f, "bag holds {} more than once", kind.as_str())
            }
            SaveError::InvalidStats { reason } => write!(f, "invalid stats: {reason}"),
            SaveError::GridShape { rows, bad_row } => match bad_row {
                Some(row) => write!(f, "grid row {row} does not have {GRID_WIDTH} cells"),
                None => write!(f, "grid has {rows} rows, expected {GRID_HEIGHT}"),
            },
            SaveError::CellCode { row, col, code } => {
                write!(f, "unknown cell code {code} at row {row}, column {col}")
            }
            SaveError::ActiveOutOfGrid { pos } => {
                write!(f, "active block ({}, {}) is outside the grid", pos.col, pos.row)
            }
            SaveError::ActiveShape { kind, facing } => write!(
                f,
                "active blocks are not a {} piece facing {}",
                kind.as_str(),
                facing.as_str()
            ),
            SaveError::ActiveNotInGrid { pos } => write!(
                f,
                "grid cell ({}, {}) does not hold the active piece",
                pos.col, pos.row
            ),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Json { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ============== Line values ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum KindTag {
    O,
    I,
    T,
    L,
    J,
    S,
    Z,
}

impl From<PieceKind> for KindTag {
    fn from(value: PieceKind) -> Self {
        match value {
            PieceKind::O => Self::O,
            PieceKind::I => Self::I,
            PieceKind::T => Self::T,
            PieceKind::L => Self::L,
            PieceKind::J => Self::J,
            PieceKind::S => Self::S,
            PieceKind::Z => Self::Z,
        }
    }
}

impl From<KindTag> for PieceKind {
    fn from(value: KindTag) -> Self {
        match value {
            KindTag::O => PieceKind::O,
            KindTag::I => PieceKind::I,
            KindTag::T => PieceKind::T,
            KindTag::L => PieceKind::L,
            KindTag::J => PieceKind::J,
            KindTag::S => PieceKind::S,
            KindTag::Z => PieceKind::Z,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum FacingTag {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "W")]
    West,
}

impl From<Facing> for FacingTag {
    fn from(value: Facing) -> Self {
        match value {
            Facing::North => Self::North,
            Facing::East => Self::East,
            Facing::South => Self::South,
            Facing::West => Self::West,
        }
    }
}

impl From<FacingTag> for Facing {
    fn from(value: FacingTag) -> Self {
        match value {
            FacingTag::North => Facing::North,
            FacingTag::East => Facing::East,
            FacingTag::South => Facing::South,
            FacingTag::West => Facing::West,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum LockDownTag {
    Extended,
    Infinite,
    Classic,
}

impl From<LockDown> for LockDownTag {
    fn from(value: LockDown) -> Self {
        match value {
            LockDown::Extended => Self::Extended,
            LockDown::Infinite => Self::Infinite,
            LockDown::Classic => Self::Classic,
        }
    }
}

impl From<LockDownTag> for LockDown {
    fn from(value: LockDownTag) -> Self {
        match value {
            LockDownTag::Extended => LockDown::Extended,
            LockDownTag::Infinite => LockDown::Infinite,
            LockDownTag::Classic => LockDown::Classic,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HeaderLine {
    format: String,
    version: u32,
    timestamp: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct ActiveLine {
    kind: KindTag,
    facing: FacingTag,
    /// `[col, row]` per block, in block order
    blocks: [[i8; 2]; 4],
}

#[derive(Debug, Serialize, Deserialize)]
struct HoldLine {
    piece: Option<KindTag>,
    available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct NextLine {
    queue: Vec<KindTag>,
    bag: Vec<KindTag>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StatsLine {
    score: u32,
    lines: u32,
    level: u32,
    goal: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OptionsLine {
    hold_enabled: bool,
    ghost_piece: bool,
    lock_down: LockDownTag,
}

// ============== Encode ==============

fn push_line<T: Serialize>(out: &mut String, tag: &'static str, value: &T) -> Result<(), SaveError> {
    let json = serde_json::to_string(value).map_err(|source| SaveError::Json { tag, source })?;
    out.push_str(tag);
    out.push(' ');
    out.push_str(&json);
    out.push('\n');
    Ok(())
}

/// Encode a state as seven tagged lines
pub fn encode(state: &SaveState) -> Result<String, SaveError> {
    let mut out = String::with_capacity(1024);

    push_line(
        &mut out,
        TAG_HEADER,
        &HeaderLine {
            format: FORMAT.to_string(),
            version: VERSION,
            timestamp: state.timestamp,
        },
    )?;

    let active = state.active.map(|piece| ActiveLine {
        kind: piece.kind.into(),
        facing: piece.facing.into(),
        blocks: piece.blocks.map(|b| [b.col, b.row]),
    });
    push_line(&mut out, TAG_ACTIVE, &active)?;

    push_line(
        &mut out,
        TAG_HOLD,
        &HoldLine {
            piece: state.hold.map(Into::into),
            available: state.hold_available,
        },
    )?;

    push_line(
        &mut out,
        TAG_NEXT,
        &NextLine {
            queue: state.next.iter().map(|&k| k.into()).collect(),
            bag: state.bag.iter().map(|&k| k.into()).collect(),
        },
    )?;

    push_line(
        &mut out,
        TAG_STATS,
        &StatsLine {
            score: state.stats.score,
            lines: state.stats.lines,
            level: state.stats.level,
            goal: state.stats.goal,
        },
    )?;

    push_line(
        &mut out,
        TAG_OPTIONS,
        &OptionsLine {
            hold_enabled: state.options.hold_enabled,
            ghost_piece: state.options.ghost_piece,
            lock_down: state.options.lock_down.into(),
        },
    )?;

    push_line(&mut out, TAG_GRID, &state.grid.to_codes())?;

    Ok(out)
}

// ============== Decode ==============

fn read_line<'a, T, I>(lines: &mut I, tag: &'static str) -> Result<T, SaveError>
where
    T: DeserializeOwned,
    I: Iterator<Item = &'a str>,
{
    let line = lines.next().ok_or(SaveError::MissingLine { tag })?;
    let (found, body) = line.split_once(' ').unwrap_or((line, ""));
    if found != tag {
        return Err(SaveError::UnexpectedTag {
            expected: tag,
            found: found.to_string(),
        });
    }
    serde_json::from_str(body).map_err(|source| SaveError::Json { tag, source })
}

fn decode_grid(rows: Vec<Vec<u8>>) -> Result<Grid, SaveError> {
    if rows.len() != GRID_HEIGHT as usize {
        return Err(SaveError::GridShape {
            rows: rows.len(),
            bad_row: None,
        });
    }

    let mut codes: GridCodes = [[0u8; GRID_WIDTH as usize]; GRID_HEIGHT as usize];
    for (row, (line, out)) in rows.iter().zip(codes.iter_mut()).enumerate() {
        if line.len() != GRID_WIDTH as usize {
            return Err(SaveError::GridShape {
                rows: rows.len(),
                bad_row: Some(row),
            });
        }
        for (col, (&code, slot)) in line.iter().zip(out.iter_mut()).enumerate() {
            if Cell::from_code(code).is_none() {
                return Err(SaveError::CellCode { row, col, code });
            }
            *slot = code;
        }
    }

    // Every code was checked above.
    Grid::from_codes(&codes).ok_or(SaveError::GridShape {
        rows: rows.len(),
        bad_row: None,
    })
}

/// Decode and validate a snapshot. Blank lines are ignored.
pub fn decode(text: &str) -> Result<SaveState, SaveError> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let header: HeaderLine = read_line(&mut lines, TAG_HEADER)?;
    if header.format != FORMAT {
        return Err(SaveError::UnknownFormat {
            format: header.format,
        });
    }
    if header.version != VERSION {
        return Err(SaveError::UnsupportedVersion {
            version: header.version,
        });
    }

    let active: Option<ActiveLine> = read_line(&mut lines, TAG_ACTIVE)?;
    let hold: HoldLine = read_line(&mut lines, TAG_HOLD)?;
    let next: NextLine = read_line(&mut lines, TAG_NEXT)?;
    let stats: StatsLine = read_line(&mut lines, TAG_STATS)?;
    let options: OptionsLine = read_line(&mut lines, TAG_OPTIONS)?;
    let grid: Vec<Vec<u8>> = read_line(&mut lines, TAG_GRID)?;

    if let Some(extra) = lines.next() {
        return Err(SaveError::TrailingData {
            line: extra.to_string(),
        });
    }

    let queue: Vec<PieceKind> = next.queue.into_iter().map(Into::into).collect();
    let queue: [PieceKind; NEXT_QUEUE_LEN] = queue
        .try_into()
        .map_err(|q: Vec<PieceKind>| SaveError::QueueLength { len: q.len() })?;

    if next.bag.len() > BAG_SIZE {
        return Err(SaveError::BagTooLarge {
            len: next.bag.len(),
        });
    }
    let bag: Bag = next.bag.into_iter().map(Into::into).collect();

    let state = SaveState {
        timestamp: header.timestamp,
        grid: decode_grid(grid)?,
        active: active.map(|line| ActivePiece {
            kind: line.kind.into(),
            facing: line.facing.into(),
            blocks: line.blocks.map(|[col, row]| Pos::new(col, row)),
        }),
        hold: hold.piece.map(Into::into),
        hold_available: hold.available,
        next: queue,
        bag,
        stats: Stats {
            score: stats.score,
            lines: stats.lines,
            level: stats.level,
            goal: stats.goal,
        },
        options: Options {
            hold_enabled: options.hold_enabled,
            ghost_piece: options.ghost_piece,
            lock_down: options.lock_down.into(),
        },
    };
    state.validate()?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;

    fn started() -> Engine<()> {
        let mut engine = Engine::with_observer(42, ());
        engine.start();
        engine.try_move(crate::types::Direction::Left);
        engine.hard_drop();
        engine.tick();
        engine.hold();
        engine
    }

    #[test]
    fn test_encode_has_seven_tagged_lines() {
        let text = encode(&started().save_state(1_700_000_000)).unwrap();
        let tags: Vec<&str> = text
            .lines()
            .map(|l| l.split_once(' ').unwrap().0)
            .collect();
        assert_eq!(
            tags,
            ["header", "active", "hold", "next", "stats", "options", "grid"]
        );
        assert!(text.starts_with(
            r#"header {"format":"line-clear","version":1,"timestamp":1700000000}"#
        ));
    }

    #[test]
    fn test_decode_restores_the_same_state() {
        let state = started().save_state(5);
        let decoded = decode(&encode(&state).unwrap()).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_rejects_wrong_version() {
        let text = encode(&started().save_state(5))
            .unwrap()
            .replace("\"version\":1", "\"version\":2");
        assert!(matches!(
            decode(&text),
            Err(SaveError::UnsupportedVersion { version: 2 })
        ));
    }

    #[test]
    fn test_rejects_swapped_lines() {
        let text = encode(&started().save_state(5)).unwrap();
        let mut lines: Vec<&str> = text.lines().collect();
        lines.swap(2, 3);
        let err = decode(&lines.join("\n")).unwrap_err();
        assert!(matches!(
            err,
            SaveError::UnexpectedTag {
                expected: "hold",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let text = encode(&started().save_state(5)).unwrap();
        let truncated: Vec<&str> = text.lines().take(6).collect();
        assert!(matches!(
            decode(&truncated.join("\n")),
            Err(SaveError::MissingLine { tag: "grid" })
        ));
    }

    #[test]
    fn test_rejects_bad_cell_code() {
        let mut state = started().save_state(5);
        state.active = None;
        let text = encode(&state).unwrap();
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        lines[6] = lines[6].replacen("[0,", "[9,", 1);
        assert!(matches!(
            decode(&lines.join("\n")),
            Err(SaveError::CellCode { code: 9, .. })
        ));
    }

    #[test]
    fn test_rejects_short_queue() {
        let text = encode(&started().save_state(5)).unwrap();
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        lines[3] = r#"next {"queue":["T","O"],"bag":[]}"#.to_string();
        assert!(matches!(
            decode(&lines.join("\n")),
            Err(SaveError::QueueLength { len: 2 })
        ));
    }

    #[test]
    fn test_validate_rejects_active_missing_from_grid() {
        let mut state = started().save_state(5);
        let piece = state.active.unwrap();
        state.grid.erase(piece.blocks[0]);
        assert!(matches!(
            state.validate(),
            Err(SaveError::ActiveNotInGrid { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bent_piece() {
        let mut state = started().save_state(5);
        let mut piece = state.active.unwrap();
        piece.blocks[0] = piece.blocks[0].offset(0, -5);
        state.active = Some(piece);
        assert!(matches!(state.validate(), Err(SaveError::ActiveShape { .. })));
    }

    #[test]
    fn test_validate_rejects_duplicate_bag_entry() {
        let mut state = started().save_state(5);
        state.bag.clear();
        state.bag.push(PieceKind::S);
        state.bag.push(PieceKind::S);
        assert!(matches!(
            state.validate(),
            Err(SaveError::DuplicateInBag {
                kind: PieceKind::S
            })
        ));
    }

    #[test]
    fn test_json_error_has_source() {
        use std::error::Error;
        let err = decode("header {not json}").unwrap_err();
        assert!(err.source().is_some());
        assert!(err.to_string().contains("header"));
    }
}
