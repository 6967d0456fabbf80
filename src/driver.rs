//! Headless reference driver
//!
//! Plays a full game without a presentation layer: a seeded bot picks a
//! rotation and a column for every piece, hard-drops it and ticks once to
//! lock. Used by the `line-clear` binary and as an end-to-end smoke test
//! of the engine, the save store and the leaderboard.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::EngineConfig;
use crate::core::active::ActivePiece;
use crate::core::pieces::{self, Blocks};
use crate::core::{Engine, Grid, Observer, Stats};
use crate::store::{FileLeaderboard, Leaderboard, SaveStore};
use crate::types::{Direction, Pos, GRID_WIDTH, VISIBLE_HEIGHT};

/// Pieces placed when no `--pieces` limit is given
pub const DEFAULT_PIECE_LIMIT: u32 = 500;

pub const USAGE: &str = "\
usage: line-clear [--seed N] [--pieces N] [--save-dir DIR] [--load FILE]
                  [--initials ABC] [--leaderboard FILE]";

/// Command-line flags
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunArgs {
    pub seed: Option<u64>,
    pub pieces: Option<u32>,
    pub save_dir: Option<PathBuf>,
    pub load: Option<PathBuf>,
    pub initials: Option<String>,
    pub leaderboard: Option<PathBuf>,
    pub help: bool,
}

fn flag_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a String> {
    *i += 1;
    args.get(*i)
        .ok_or_else(|| anyhow!("missing value for {}", flag))
}

pub fn parse_run_args(args: &[String]) -> Result<RunArgs> {
    let mut out = RunArgs::default();
    let mut i = 0usize;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                let v = flag_value(args, &mut i, "--seed")?;
                out.seed = Some(v.parse().map_err(|_| anyhow!("invalid --seed value: {}", v))?);
            }
            "--pieces" => {
                let v = flag_value(args, &mut i, "--pieces")?;
                out.pieces = Some(v.parse().map_err(|_| anyhow!("invalid --pieces value: {}", v))?);
            }
            "--save-dir" => out.save_dir = Some(PathBuf::from(flag_value(args, &mut i, "--save-dir")?)),
            "--load" => out.load = Some(PathBuf::from(flag_value(args, &mut i, "--load")?)),
            "--initials" => out.initials = Some(flag_value(args, &mut i, "--initials")?.clone()),
            "--leaderboard" => {
                out.leaderboard = Some(PathBuf::from(flag_value(args, &mut i, "--leaderboard")?))
            }
            "-h" | "--help" => out.help = true,
            other => return Err(anyhow!("unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(out)
}

/// Clockwise turns then a column shift, applied before the hard drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placement {
    pub turns: u8,
    pub shift: i8,
}

/// Greedy one-piece lookahead bot
#[derive(Debug, Clone)]
pub struct Bot {
    rng: Pcg32,
}

impl Bot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Best reachable placement for `piece`; ties are broken at random.
    pub fn choose(&mut self, grid: &Grid, piece: &ActivePiece) -> Placement {
        let mut base = grid.clone();
        for &b in &piece.blocks {
            base.erase(b);
        }
        base.clear_ghosts();
        let free = |blocks: &Blocks| blocks.iter().all(|&p| base.is_free(p));

        let mut best_score = i64::MIN;
        let mut best: Vec<Placement> = Vec::new();
        let mut rotated = *piece;
        for turns in 0..4u8 {
            if turns > 0 {
                let Some(r) =
                    pieces::try_rotate(rotated.kind, rotated.facing, &rotated.blocks, true, free)
                else {
                    break;
                };
                rotated = ActivePiece {
                    facing: r.facing,
                    blocks: r.blocks,
                    ..rotated
                };
            }

            for shift in reachable_shifts(&rotated.blocks, free) {
                let mut landed = pieces::translate(&rotated.blocks, shift, 0);
                loop {
                    let lower = pieces::translate(&landed, 0, -1);
                    if !free(&lower) {
                        break;
                    }
                    landed = lower;
                }

                let score = evaluate(&base, &landed, rotated);
                let placement = Placement { turns, shift };
                if score > best_score {
                    best_score = score;
                    best.clear();
                    best.push(placement);
                } else if score == best_score {
                    best.push(placement);
                }
            }
        }

        if best.is_empty() {
            return Placement::default();
        }
        best[self.rng.random_range(0..best.len())]
    }

    /// Place the active piece and lock it. Returns false without an active piece.
    pub fn play<O: Observer>(&mut self, engine: &mut Engine<O>) -> bool {
        let Some(piece) = engine.active() else {
            return false;
        };
        let placement = self.choose(engine.grid(), &piece);

        for _ in 0..placement.turns {
            if !engine.try_rotate(true) {
                break;
            }
        }
        let direction = if placement.shift < 0 {
            Direction::Left
        } else {
            Direction::Right
        };
        for _ in 0..placement.shift.unsigned_abs() {
            if !engine.try_move(direction) {
                break;
            }
        }
        engine.hard_drop();
        engine.tick();
        true
    }
}

fn reachable_shifts(blocks: &Blocks, free: impl Fn(&Blocks) -> bool) -> Vec<i8> {
    let mut shifts = vec![0];
    for step in [-1i8, 1] {
        let mut shift = step;
        while free(&pieces::translate(blocks, shift, 0)) {
            shifts.push(shift);
            shift += step;
        }
    }
    shifts
}

/// Weighted board features after placing `blocks`; higher is better.
fn evaluate(base: &Grid, blocks: &Blocks, piece: ActivePiece) -> i64 {
    let mut grid = base.clone();
    for &b in blocks {
        grid.put(b, piece.kind, false);
    }
    let rows = grid.full_rows();
    let lines = grid.compact(&rows) as i64;

    let width = GRID_WIDTH as usize;
    let mut heights = [0i64; GRID_WIDTH as usize];
    let mut holes = 0i64;
    for (col, height) in heights.iter_mut().enumerate() {
        let mut seen_block = false;
        for row in (0..grid.height() as usize).rev() {
            let pos = Pos::new(col as i8, row as i8);
            if grid.is_block(pos) {
                if !seen_block {
                    *height = row as i64 + 1;
                    seen_block = true;
                }
            } else if seen_block {
                holes += 1;
            }
        }
    }
    let aggregate: i64 = heights.iter().sum();
    let bumpiness: i64 = (1..width).map(|c| (heights[c] - heights[c - 1]).abs()).sum();
    let above_skyline = blocks.iter().filter(|b| b.row >= VISIBLE_HEIGHT as i8).count() as i64;

    lines * 760 - aggregate * 510 - holes * 360 - bumpiness * 180 - above_skyline * 100_000
}

/// Outcome of a driver run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub seed: u64,
    pub stats: Stats,
    pub pieces: u32,
    pub game_over: bool,
    pub saved: Option<PathBuf>,
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

/// Play one game to completion (or the piece limit)
pub fn run(config: &EngineConfig, args: &RunArgs) -> Result<RunReport> {
    let seed = args.seed.or(config.seed).unwrap_or_else(clock_seed);
    let save_dir = args.save_dir.clone().or_else(|| config.save_dir.clone());
    let limit = args.pieces.unwrap_or(DEFAULT_PIECE_LIMIT);

    let mut engine = Engine::new(seed);
    engine.set_options(config.options);

    if let Some(path) = &args.load {
        let store = SaveStore::new(save_dir.clone().unwrap_or_else(|| PathBuf::from(".")));
        store.load(path, &mut engine)?;
    }
    if !engine.running() {
        engine.start();
    }

    let mut bot = Bot::new(seed.rotate_left(17) ^ 0x9E37_79B9_7F4A_7C15);
    let mut placed = 0u32;
    while engine.running() && placed < limit {
        if !bot.play(&mut engine) {
            break;
        }
        placed += 1;
    }

    let stats = engine.stats();
    let game_over = !engine.running();
    log::info!(
        "run finished seed={} pieces={} score={} lines={} level={} game_over={}",
        seed,
        placed,
        stats.score,
        stats.lines,
        stats.level,
        game_over
    );

    let saved = match save_dir {
        Some(dir) => Some(SaveStore::new(dir).save(&engine)?),
        None => None,
    };

    let board_path = args.leaderboard.clone().or_else(|| config.leaderboard.clone());
    match (&args.initials, board_path) {
        (Some(initials), Some(path)) => {
            FileLeaderboard::new(path).append(initials, stats.score)?;
        }
        (Some(_), None) => log::warn!("--initials given without a leaderboard path"),
        _ => {}
    }

    Ok(RunReport {
        seed,
        stats,
        pieces: placed,
        game_over,
        saved,
    })
}
