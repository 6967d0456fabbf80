//! Engine module - the phase controller
//!
//! Ties together the grid, pieces, randomizer and scoring. Every entry
//! point is synchronous and runs to completion: a tick that locks a piece
//! also runs pattern match, completion and the next generation before it
//! returns, so callers never observe an intermediate phase.
//!
//! # Phase cycle
//!
//! ```text
//! Generation -> Falling -> Lock -> PatternMatch -> Completion -> Generation
//!                                                            \-> GameOver
//! ```
//!
//! The engine never runs a clock. An external driver calls [`Engine::tick`]
//! every [`Engine::fall_speed_ms`] milliseconds while [`Engine::running`]
//! is true and [`Engine::paused`] is false.

use crate::active::{self, ActivePiece};
use crate::grid::Grid;
use crate::observe::{EngineEvent, GameOverReason, LogObserver, Observer};
use crate::pieces;
use crate::rng::Randomizer;
use crate::save::{self, SaveError, SaveState};
use crate::scoring::{self, Stats};
use crate::snapshot::EngineSnapshot;
use crate::types::{Command, Direction, Options, PieceKind, NEXT_QUEUE_LEN};

/// Where the engine is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Not started, or reset
    #[default]
    Idle,
    Generation,
    Falling,
    Lock,
    PatternMatch,
    Completion,
    GameOver,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Generation => "generation",
            Phase::Falling => "falling",
            Phase::Lock => "lock",
            Phase::PatternMatch => "pattern_match",
            Phase::Completion => "completion",
            Phase::GameOver => "game_over",
        }
    }
}

/// Complete engine state
#[derive(Debug, Clone)]
pub struct Engine<O = LogObserver> {
    grid: Grid,
    active: Option<ActivePiece>,
    hold: Option<PieceKind>,
    hold_available: bool,
    randomizer: Randomizer,
    stats: Stats,
    options: Options,
    running: bool,
    paused: bool,
    fall_speed_ms: u32,
    phase: Phase,
    /// Grants used by the current piece under the lock-down policy
    lock_resets: u8,
    /// One extra tick before locking
    lock_grace: bool,
    observer: O,
}

impl Engine {
    /// Create an engine that logs its events, with the given RNG seed
    pub fn new(seed: u64) -> Self {
        Self::with_observer(seed, LogObserver)
    }
}

impl<O: Observer> Engine<O> {
    pub fn with_observer(seed: u64, observer: O) -> Self {
        let stats = Stats::new();
        Self {
            grid: Grid::new(),
            active: None,
            hold: None,
            hold_available: true,
            randomizer: Randomizer::new(seed),
            fall_speed_ms: scoring::fall_speed_ms(stats.level),
            stats,
            options: Options::default(),
            running: false,
            paused: false,
            phase: Phase::Idle,
            lock_resets: 0,
            lock_grace: false,
            observer,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active(&self) -> Option<ActivePiece> {
        self.active
    }

    pub fn hold_piece(&self) -> Option<PieceKind> {
        self.hold
    }

    pub fn hold_available(&self) -> bool {
        self.hold_available
    }

    pub fn next_queue(&self) -> &[PieceKind; NEXT_QUEUE_LEN] {
        self.randomizer.next_queue()
    }

    pub fn randomizer(&self) -> &Randomizer {
        &self.randomizer
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn score(&self) -> u32 {
        self.stats.score
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn fall_speed_ms(&self) -> u32 {
        self.fall_speed_ms
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn snapshot_into(&self, out: &mut EngineSnapshot) {
        self.grid.write_codes(&mut out.grid);
        out.active = self.active.map(Into::into);
        out.hold = self.hold;
        out.hold_available = self.hold_available;
        out.next_queue = *self.randomizer.next_queue();
        out.stats = self.stats;
        out.running = self.running;
        out.paused = self.paused;
        out.fall_speed_ms = self.fall_speed_ms;
        out.phase = self.phase;
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let mut out = EngineSnapshot::default();
        self.snapshot_into(&mut out);
        out
    }

    /// Replace the options. Ghost cells are redrawn (or removed) at once.
    pub fn set_options(&mut self, options: Options) {
        self.options = options;
        self.refresh_ghost();
    }

    /// Start the game and spawn the first piece.
    ///
    /// Returns false if already running or the game is over (reset first).
    pub fn start(&mut self) -> bool {
        if self.running || self.phase == Phase::GameOver {
            return false;
        }
        self.running = true;
        self.paused = false;
        self.fall_speed_ms = scoring::fall_speed_ms(self.stats.level);
        log::info!("start level={} next={:?}", self.stats.level, self.next_queue());
        self.generation_phase(None);
        true
    }

    /// Return to the initial state, keeping options and observer.
    ///
    /// The randomizer starts a fresh sequence from its current stream.
    pub fn reset(&mut self) {
        self.grid.clear();
        self.active = None;
        self.hold = None;
        self.hold_available = true;
        self.randomizer.restart();
        self.stats = Stats::new();
        self.running = false;
        self.paused = false;
        self.fall_speed_ms = scoring::fall_speed_ms(self.stats.level);
        self.phase = Phase::Idle;
        self.lock_resets = 0;
        self.lock_grace = false;
    }

    /// Flip the pause flag and return the new value
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        self.paused
    }

    /// One gravity step: fall one row, or lock when the piece cannot fall.
    ///
    /// Returns true if the state changed.
    pub fn tick(&mut self) -> bool {
        if !self.running || self.paused {
            return false;
        }
        let Some(piece) = self.active else {
            return false;
        };

        if active::can_move(&self.grid, &piece, Direction::Down) {
            self.shift(piece, piece.moved(Direction::Down));
            self.lock_grace = false;
            return true;
        }

        if self.lock_grace {
            self.lock_grace = false;
            return false;
        }

        self.lock_phase();
        true
    }

    /// Whether the active piece can move one step. False without an active piece.
    pub fn can_move(&self, direction: Direction) -> bool {
        self.active
            .is_some_and(|piece| active::can_move(&self.grid, &piece, direction))
    }

    /// Move the active piece one step. A player move down scores as a soft drop.
    pub fn try_move(&mut self, direction: Direction) -> bool {
        let Some(piece) = self.active else {
            return false;
        };
        if !active::can_move(&self.grid, &piece, direction) {
            return false;
        }

        self.shift(piece, piece.moved(direction));
        match direction {
            Direction::Down => {
                self.lock_grace = false;
                let points = scoring::drop_points(1, false);
                self.stats.score = self.stats.score.saturating_add(points);
            }
            Direction::Left | Direction::Right => self.grant_lock_delay(),
        }
        true
    }

    /// Rotate with the SRS offset search. The O piece never rotates.
    pub fn try_rotate(&mut self, clockwise: bool) -> bool {
        let Some(piece) = self.active else {
            return false;
        };

        let grid = &self.grid;
        let result = pieces::try_rotate(piece.kind, piece.facing, &piece.blocks, clockwise, |c| {
            active::fits(grid, c, &piece.blocks)
        });

        let Some(rotated) = result else {
            return false;
        };
        if rotated.entry > 1 {
            log::trace!(
                "kick kind={} entry={} offset={:?}",
                piece.kind.as_str(),
                rotated.entry,
                rotated.kick
            );
        }

        self.shift(
            piece,
            ActivePiece {
                facing: rotated.facing,
                blocks: rotated.blocks,
                ..piece
            },
        );
        self.grant_lock_delay();
        true
    }

    /// Drop the active piece as far as it goes. The lock happens on the next tick.
    ///
    /// Returns the number of rows dropped.
    pub fn hard_drop(&mut self) -> u32 {
        let Some(piece) = self.active else {
            return 0;
        };

        let distance = active::drop_distance(&self.grid, &piece);
        if distance > 0 {
            let landed = ActivePiece {
                blocks: active::landing_blocks(&self.grid, &piece),
                ..piece
            };
            self.shift(piece, landed);
        }
        self.lock_grace = false;
        let points = scoring::drop_points(distance, true);
        self.stats.score = self.stats.score.saturating_add(points);
        distance
    }

    /// Swap the active piece into the hold slot.
    ///
    /// An empty slot takes the piece and the next one is drawn; an occupied
    /// slot swaps and spawns the held kind. Only once per locked piece.
    pub fn hold(&mut self) -> bool {
        if !self.options.hold_enabled || !self.hold_available {
            return false;
        }
        let Some(piece) = self.active.take() else {
            return false;
        };

        for &b in &piece.blocks {
            self.grid.erase(b);
        }
        self.grid.clear_ghosts();

        let held = self.hold.replace(piece.kind);
        self.hold_available = false;
        self.generation_phase(held);
        true
    }

    /// Apply a command
    pub fn apply_command(&mut self, command: Command) -> bool {
        match command {
            Command::MoveLeft => self.try_move(Direction::Left),
            Command::MoveRight => self.try_move(Direction::Right),
            Command::MoveDown => self.try_move(Direction::Down),
            Command::RotateCw => self.try_rotate(true),
            Command::RotateCcw => self.try_rotate(false),
            Command::Hold => self.hold(),
            Command::HardDrop => {
                let had_piece = self.active.is_some();
                self.hard_drop();
                had_piece
            }
            Command::Tick => self.tick(),
            Command::TogglePause => {
                self.toggle_pause();
                true
            }
            Command::Start => self.start(),
            Command::Reset => {
                self.reset();
                true
            }
        }
    }

    /// Replace the active footprint with `to` and redraw the ghost
    fn shift(&mut self, from: ActivePiece, to: ActivePiece) {
        for &b in &from.blocks {
            self.grid.erase(b);
        }
        for &b in &to.blocks {
            self.grid.put(b, to.kind, false);
        }
        self.active = Some(to);
        self.refresh_ghost();
    }

    /// Grounded lateral moves and rotations may postpone the lock by one tick
    fn grant_lock_delay(&mut self) {
        if self.can_move(Direction::Down) {
            return;
        }
        match self.options.lock_down.reset_limit() {
            None => self.lock_grace = true,
            Some(limit) if self.lock_resets < limit => {
                self.lock_resets += 1;
                self.lock_grace = true;
            }
            Some(_) => {}
        }
    }

    fn refresh_ghost(&mut self) {
        self.grid.clear_ghosts();
        if !self.options.ghost_piece {
            return;
        }
        let Some(piece) = self.active else {
            return;
        };
        for b in active::landing_blocks(&self.grid, &piece) {
            if !piece.contains(b) {
                self.grid.put(b, piece.kind, true);
            }
        }
    }

    /// Spawn `kind` (from hold) or the next drawn piece.
    fn generation_phase(&mut self, kind: Option<PieceKind>) {
        self.phase = Phase::Generation;
        let (kind, from_hold) = match kind {
            Some(kind) => (kind, true),
            None => (self.randomizer.draw(), false),
        };

        let piece = ActivePiece::spawn(kind);
        if piece.blocks.iter().any(|&b| self.grid.is_block(b)) {
            self.game_over(GameOverReason::BlockOut);
            return;
        }

        for &b in &piece.blocks {
            self.grid.put(b, kind, false);
        }
        self.active = Some(piece);
        self.lock_resets = 0;
        self.lock_grace = false;
        self.observer
            .on_event(&EngineEvent::Spawned { kind, from_hold });

        if active::can_move(&self.grid, &piece, Direction::Down) {
            self.shift(piece, piece.moved(Direction::Down));
        } else {
            self.refresh_ghost();
        }
        self.phase = Phase::Falling;
    }

    fn lock_phase(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        self.phase = Phase::Lock;
        self.grid.clear_ghosts();
        self.hold_available = true;
        self.observer.on_event(&EngineEvent::Locked {
            kind: piece.kind,
            blocks: piece.blocks,
        });

        self.pattern_match_phase();
        self.completion_phase(&piece);
        if self.running {
            self.generation_phase(None);
        }
    }

    fn pattern_match_phase(&mut self) {
        self.phase = Phase::PatternMatch;
        let rows = self.grid.full_rows();
        if rows.is_empty() {
            return;
        }

        let count = self.grid.compact(&rows);
        let points = scoring::line_clear_points(count, self.stats.level);
        self.stats.lines = self.stats.lines.saturating_add(count as u32);
        self.stats.score = self.stats.score.saturating_add(points);
        self.observer.on_event(&EngineEvent::LinesCleared {
            count: count as u32,
            total: self.stats.lines,
            points,
        });
    }

    fn completion_phase(&mut self, locked: &ActivePiece) {
        self.phase = Phase::Completion;
        if self.stats.try_level_up() {
            self.fall_speed_ms = scoring::fall_speed_ms(self.stats.level);
            self.observer.on_event(&EngineEvent::LevelUp {
                level: self.stats.level,
                goal: self.stats.goal,
                fall_speed_ms: self.fall_speed_ms,
            });
        }

        if let Some(reason) = lock_out_reason(locked) {
            self.game_over(reason);
        }
    }

    fn game_over(&mut self, reason: GameOverReason) {
        self.running = false;
        self.paused = false;
        self.active = None;
        self.grid.clear_ghosts();
        self.phase = Phase::GameOver;
        self.observer.on_event(&EngineEvent::GameOver {
            reason,
            score: self.stats.score,
        });
    }

    /// Capture everything a save file records
    pub fn save_state(&self, timestamp: u64) -> SaveState {
        SaveState {
            timestamp,
            grid: self.grid.clone(),
            active: self.active,
            hold: self.hold,
            hold_available: self.hold_available,
            next: *self.randomizer.next_queue(),
            bag: self.randomizer.bag().iter().copied().collect(),
            stats: self.stats,
            options: self.options,
        }
    }

    /// Replace the whole state with `state`, or leave the engine untouched
    /// if it fails validation.
    ///
    /// A restored game with an active piece is running and unpaused; one
    /// without is idle and waits for [`Engine::start`].
    pub fn restore(&mut self, state: SaveState) -> Result<(), SaveError> {
        state.validate()?;

        self.grid = state.grid;
        self.active = state.active;
        self.hold = state.hold;
        self.hold_available = state.hold_available;
        self.randomizer.set_state(state.next, state.bag);
        self.stats = state.stats;
        self.options = state.options;
        self.running = state.active.is_some();
        self.paused = false;
        self.fall_speed_ms = scoring::fall_speed_ms(self.stats.level);
        self.phase = if self.running {
            Phase::Falling
        } else {
            Phase::Idle
        };
        self.lock_resets = 0;
        self.lock_grace = false;
        self.refresh_ghost();
        log::info!(
            "restored score={} level={} running={}",
            self.stats.score,
            self.stats.level,
            self.running
        );
        Ok(())
    }

    /// Encode the current state in the save-file text format
    pub fn save_snapshot(&self, timestamp: u64) -> Result<String, SaveError> {
        save::encode(&self.save_state(timestamp))
    }

    /// Decode and restore a save file. On error nothing changes.
    pub fn load_snapshot(&mut self, text: &str) -> Result<(), SaveError> {
        let state = save::decode(text)?;
        self.restore(state)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Lock out: any block in the spawn zone, or the whole piece above the skyline
fn lock_out_reason(locked: &ActivePiece) -> Option<GameOverReason> {
    if locked.blocks.iter().any(|&b| pieces::in_spawn_zone(b)) {
        Some(GameOverReason::SpawnZone)
    } else if !locked.any_below_skyline() {
        Some(GameOverReason::AboveSkyline)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::EventLog;
    use crate::types::{Cell, Facing, LockDown, Pos};

    fn engine() -> Engine<EventLog> {
        Engine::with_observer(12345, EventLog::new())
    }

    /// Seed whose first piece is `kind`
    fn engine_starting_with(kind: PieceKind) -> Engine<EventLog> {
        (0..500u64)
            .map(|seed| Engine::with_observer(seed, EventLog::new()))
            .find(|e| e.next_queue()[0] == kind)
            .unwrap()
    }

    fn fill_row_except(engine: &mut Engine<EventLog>, row: i8, hole: &[i8]) {
        for col in 0..10 {
            if !hole.contains(&col) {
                engine.grid.put(Pos::new(col, row), PieceKind::Z, false);
            }
        }
    }

    #[test]
    fn test_new_engine_is_idle() {
        let e = engine();
        assert_eq!(e.phase(), Phase::Idle);
        assert!(!e.running());
        assert!(!e.paused());
        assert!(e.active().is_none());
        assert_eq!(e.stats(), Stats::new());
        assert_eq!(e.fall_speed_ms(), 1000);
        assert_eq!(e.grid().block_count(), 0);
    }

    #[test]
    fn test_start_spawns_and_steps_down() {
        let mut e = engine_starting_with(PieceKind::T);
        assert!(e.start());
        assert!(e.running());
        assert_eq!(e.phase(), Phase::Falling);

        let piece = e.active().unwrap();
        assert_eq!(piece.kind, PieceKind::T);
        assert_eq!(piece.facing, Facing::North);
        assert_eq!(
            piece.blocks,
            [Pos::new(5, 20), Pos::new(4, 19), Pos::new(5, 19), Pos::new(6, 19)]
        );
        assert_eq!(e.grid().block_count(), 4);
        assert!(matches!(
            e.observer().events()[0],
            EngineEvent::Spawned {
                kind: PieceKind::T,
                from_hold: false
            }
        ));
    }

    #[test]
    fn test_start_twice_is_noop() {
        let mut e = engine();
        assert!(e.start());
        let before = e.active();
        assert!(!e.start());
        assert_eq!(e.active(), before);
    }

    #[test]
    fn test_tick_falls_then_locks() {
        let mut e = engine_starting_with(PieceKind::O);
        e.set_options(Options {
            lock_down: LockDown::Classic,
            ..Options::default()
        });
        e.start();

        let mut ticks = 0;
        while e.active().unwrap().blocks.iter().all(|b| b.row > 0) {
            assert!(e.tick());
            ticks += 1;
        }
        assert_eq!(ticks, 19);

        // Grounded: the next tick locks and spawns the next piece.
        assert!(e.tick());
        let o_cells = e
            .grid()
            .cells()
            .iter()
            .filter(|c| **c == Cell::Block(PieceKind::O))
            .count();
        assert!(o_cells >= 4);
        assert!(e
            .observer()
            .events()
            .iter()
            .any(|ev| matches!(ev, EngineEvent::Locked { .. })));
        assert!(e.hold_available());
    }

    #[test]
    fn test_tick_ignored_when_paused_or_stopped() {
        let mut e = engine();
        assert!(!e.tick());
        e.start();
        assert!(e.toggle_pause());
        let before = e.active();
        assert!(!e.tick());
        assert_eq!(e.active(), before);
        assert!(!e.toggle_pause());
        assert!(e.tick());
    }

    #[test]
    fn test_try_move_walls_and_soft_drop_points() {
        let mut e = engine_starting_with(PieceKind::I);
        e.start();
        assert!(e.try_move(Direction::Right));
        assert!(e.try_move(Direction::Right));
        assert!(!e.try_move(Direction::Right));
        assert_eq!(e.stats().score, 0);

        assert!(e.try_move(Direction::Down));
        assert_eq!(e.stats().score, 1);
    }

    #[test]
    fn test_commands_without_active_piece_are_noops() {
        let mut e = engine();
        assert!(!e.try_move(Direction::Left));
        assert!(!e.try_rotate(true));
        assert!(!e.hold());
        assert_eq!(e.hard_drop(), 0);
        assert!(!e.can_move(Direction::Down));
        assert_eq!(e.grid().block_count(), 0);
    }

    #[test]
    fn test_rotate_t_in_open_space() {
        let mut e = engine_starting_with(PieceKind::T);
        e.start();
        assert!(e.try_rotate(true));
        let piece = e.active().unwrap();
        assert_eq!(piece.facing, Facing::East);
        assert!(pieces::matches_shape(PieceKind::T, Facing::East, &piece.blocks));
        assert_eq!(e.grid().block_count(), 4);
    }

    #[test]
    fn test_o_never_rotates() {
        let mut e = engine_starting_with(PieceKind::O);
        e.start();
        let before = e.active();
        assert!(!e.try_rotate(true));
        assert!(!e.try_rotate(false));
        assert_eq!(e.active(), before);
    }

    #[test]
    fn test_hard_drop_waits_for_tick_to_lock() {
        let mut e = engine_starting_with(PieceKind::I);
        e.start();
        let rows = e.hard_drop();
        assert_eq!(rows, 19);
        assert_eq!(e.stats().score, 38);

        let piece = e.active().unwrap();
        assert!(piece.blocks.iter().all(|b| b.row == 0));

        assert!(e.tick());
        assert_ne!(e.active().map(|p| p.blocks), Some(piece.blocks));
        assert_eq!(e.grid().get(Pos::new(4, 0)), Some(Cell::Block(PieceKind::I)));
    }

    #[test]
    fn test_hold_empty_then_swap() {
        let mut e = engine();
        e.start();
        let first = e.active().unwrap().kind;
        let next = e.next_queue()[0];

        assert!(e.hold());
        assert_eq!(e.hold_piece(), Some(first));
        assert_eq!(e.active().unwrap().kind, next);
        assert!(!e.hold_available());
        assert_eq!(e.grid().block_count(), 4);

        // Second hold before locking is refused.
        assert!(!e.hold());

        e.hard_drop();
        e.tick();
        assert!(e.hold_available());

        let current = e.active().unwrap().kind;
        let queue_before = *e.next_queue();
        assert!(e.hold());
        assert_eq!(e.active().unwrap().kind, first);
        assert_eq!(e.hold_piece(), Some(current));
        // Swapping does not draw.
        assert_eq!(*e.next_queue(), queue_before);
        assert!(matches!(
            e.observer().events().last(),
            Some(EngineEvent::Spawned { from_hold: true, .. })
        ));
    }

    #[test]
    fn test_hold_disabled() {
        let mut e = engine();
        e.set_options(Options {
            hold_enabled: false,
            ..Options::default()
        });
        e.start();
        assert!(!e.hold());
        assert!(e.hold_piece().is_none());
    }

    #[test]
    fn test_ghost_cells_follow_piece() {
        let mut e = engine_starting_with(PieceKind::O);
        e.start();
        assert_eq!(e.grid().get(Pos::new(5, 0)), Some(Cell::Ghost(PieceKind::O)));
        assert_eq!(e.grid().get(Pos::new(6, 1)), Some(Cell::Ghost(PieceKind::O)));

        e.try_move(Direction::Left);
        assert_eq!(e.grid().get(Pos::new(6, 0)), Some(Cell::Empty));
        assert_eq!(e.grid().get(Pos::new(4, 0)), Some(Cell::Ghost(PieceKind::O)));

        e.set_options(Options {
            ghost_piece: false,
            ..Options::default()
        });
        assert!(e.grid().cells().iter().all(|c| !c.is_ghost()));
    }

    #[test]
    fn test_single_line_clear_scores_and_levels() {
        let mut e = engine_starting_with(PieceKind::I);
        fill_row_except(&mut e, 0, &[3, 4, 5, 6]);
        e.start();

        // I spans columns 4-7; shift left once so it covers 3-6.
        assert!(e.try_move(Direction::Left));
        e.hard_drop();
        let drop_score = e.stats().score;
        e.tick();

        let stats = e.stats();
        assert_eq!(stats.lines, 1);
        assert_eq!(stats.score, drop_score + 100);
        // Goal 0 is met on the first lock.
        assert_eq!(stats.level, 2);
        assert_eq!(stats.goal, 10);
        assert_eq!(e.fall_speed_ms(), 793);
        // Only the next active piece is left.
        assert_eq!(e.grid().block_count(), 4);
    }

    #[test]
    fn test_first_lock_levels_up_without_lines() {
        let mut e = engine();
        e.start();
        e.hard_drop();
        e.tick();
        assert_eq!(e.stats().level, 2);
        assert!(e
            .observer()
            .events()
            .iter()
            .any(|ev| matches!(ev, EngineEvent::LevelUp { level: 2, .. })));
    }

    #[test]
    fn test_block_out_on_spawn() {
        let mut e = engine_starting_with(PieceKind::T);
        e.grid.put(Pos::new(5, 20), PieceKind::Z, false);
        e.start();
        assert_eq!(e.phase(), Phase::GameOver);
        assert!(!e.running());
        assert!(e.active().is_none());
        assert!(matches!(
            e.observer().events().last(),
            Some(EngineEvent::GameOver {
                reason: GameOverReason::BlockOut,
                ..
            })
        ));
        // Game over needs a reset before starting again.
        assert!(!e.start());
    }

    #[test]
    fn test_lock_in_spawn_zone_ends_game() {
        let mut e = engine_starting_with(PieceKind::O);
        e.set_options(Options {
            lock_down: LockDown::Classic,
            ..Options::default()
        });
        // Stack up to row 19 under the O so it cannot leave the buffer.
        for row in 0..20 {
            e.grid.put(Pos::new(5, row), PieceKind::I, false);
            e.grid.put(Pos::new(6, row), PieceKind::I, false);
        }
        e.start();
        assert!(e.running());
        assert!(e.tick());
        assert_eq!(e.phase(), Phase::GameOver);
        assert!(matches!(
            e.observer().events().last(),
            Some(EngineEvent::GameOver {
                reason: GameOverReason::SpawnZone,
                ..
            })
        ));
    }

    #[test]
    fn test_extended_lock_grants_one_tick_per_move() {
        let mut e = engine_starting_with(PieceKind::O);
        e.start();
        e.hard_drop();
        assert!(e.try_move(Direction::Left));
        // Grace consumed instead of locking.
        assert!(!e.tick());
        assert!(e.active().is_some());
        assert_eq!(e.lock_resets, 1);
        assert!(e.tick());
        assert!(e
            .observer()
            .events()
            .iter()
            .any(|ev| matches!(ev, EngineEvent::Locked { .. })));
    }

    #[test]
    fn test_extended_lock_cap() {
        let mut e = engine_starting_with(PieceKind::O);
        e.start();
        e.hard_drop();
        for i in 0..20 {
            let dir = if i % 2 == 0 {
                Direction::Left
            } else {
                Direction::Right
            };
            e.try_move(dir);
        }
        assert_eq!(e.lock_resets, 15);
    }

    #[test]
    fn test_classic_lock_ignores_moves() {
        let mut e = engine_starting_with(PieceKind::O);
        e.set_options(Options {
            lock_down: LockDown::Classic,
            ..Options::default()
        });
        e.start();
        e.hard_drop();
        e.try_move(Direction::Left);
        assert!(e.tick());
        assert!(e
            .observer()
            .events()
            .iter()
            .any(|ev| matches!(ev, EngineEvent::Locked { .. })));
    }

    #[test]
    fn test_reset_keeps_options() {
        let mut e = engine();
        let options = Options {
            hold_enabled: false,
            ghost_piece: false,
            lock_down: LockDown::Infinite,
        };
        e.set_options(options);
        e.start();
        e.hard_drop();
        e.tick();

        e.reset();
        assert_eq!(e.options(), options);
        assert_eq!(e.phase(), Phase::Idle);
        assert_eq!(e.stats(), Stats::new());
        assert_eq!(e.grid().block_count(), 0);
        assert!(e.hold_piece().is_none());
        assert!(e.start());
    }

    #[test]
    fn test_apply_command() {
        let mut e = engine_starting_with(PieceKind::T);
        assert!(e.apply_command(Command::Start));
        assert!(e.apply_command(Command::MoveLeft));
        assert!(e.apply_command(Command::RotateCcw));
        assert!(e.apply_command(Command::HardDrop));
        assert!(e.apply_command(Command::Tick));
        assert!(e.apply_command(Command::TogglePause));
        assert!(e.paused());
        assert!(e.apply_command(Command::Reset));
        assert_eq!(e.phase(), Phase::Idle);
    }

    #[test]
    fn test_snapshot_matches_state() {
        let mut e = engine();
        e.start();
        let snap = e.snapshot();
        assert_eq!(snap.grid, e.grid().to_codes());
        assert_eq!(snap.active.map(|a| a.kind), e.active().map(|p| p.kind));
        assert_eq!(&snap.next_queue, e.next_queue());
        assert_eq!(snap.phase, Phase::Falling);
        assert!(snap.wants_ticks());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut e = engine();
        e.start();
        e.try_move(Direction::Right);
        e.hard_drop();
        e.tick();
        e.hold();
        let text = e.save_snapshot(99).unwrap();

        let mut other = Engine::with_observer(7, EventLog::new());
        other.load_snapshot(&text).unwrap();
        assert_eq!(other.grid(), e.grid());
        assert_eq!(other.active(), e.active());
        assert_eq!(other.hold_piece(), e.hold_piece());
        assert_eq!(other.hold_available(), e.hold_available());
        assert_eq!(other.next_queue(), e.next_queue());
        assert_eq!(other.randomizer().bag(), e.randomizer().bag());
        assert_eq!(other.stats(), e.stats());
        assert!(other.running());
        assert!(!other.paused());
        assert_eq!(other.phase(), Phase::Falling);
        assert_eq!(other.fall_speed_ms(), e.fall_speed_ms());
    }

    #[test]
    fn test_failed_load_changes_nothing() {
        let mut e = engine();
        e.start();
        let before = e.snapshot();

        let mut other = engine();
        other.start();
        other.hard_drop();
        other.tick();
        let text = other.save_snapshot(1).unwrap();
        let broken: Vec<&str> = text.lines().take(5).collect();

        assert!(e.load_snapshot(&broken.join("\n")).is_err());
        assert_eq!(e.snapshot(), before);
    }
}
