//! Observer hook - structured events at phase transitions
//!
//! The engine calls [`Observer::on_event`] at exactly five points: spawn,
//! lock, line clear, level up and game over. Nothing else is reported.

use crate::pieces::Blocks;
use crate::types::PieceKind;

/// Why the game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameOverReason {
    /// A spawn cell was already occupied by a locked block
    BlockOut,
    /// The piece locked with a block in the spawn zone
    SpawnZone,
    /// The piece locked entirely above the skyline
    AboveSkyline,
}

impl GameOverReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOverReason::BlockOut => "block_out",
            GameOverReason::SpawnZone => "spawn_zone",
            GameOverReason::AboveSkyline => "above_skyline",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineEvent {
    Spawned {
        kind: PieceKind,
        /// Spawned from the hold slot rather than the randomizer
        from_hold: bool,
    },
    Locked {
        kind: PieceKind,
        blocks: Blocks,
    },
    LinesCleared {
        count: u32,
        total: u32,
        points: u32,
    },
    LevelUp {
        level: u32,
        goal: u32,
        fall_speed_ms: u32,
    },
    GameOver {
        reason: GameOverReason,
        score: u32,
    },
}

/// Receives engine events
pub trait Observer {
    fn on_event(&mut self, event: &EngineEvent);
}

/// No-op observer
impl Observer for () {
    fn on_event(&mut self, _event: &EngineEvent) {}
}

/// Forwards events to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl Observer for LogObserver {
    fn on_event(&mut self, event: &EngineEvent) {
        match *event {
            EngineEvent::Spawned { kind, from_hold } => {
                log::debug!("spawn kind={} from_hold={}", kind.as_str(), from_hold);
            }
            EngineEvent::Locked { kind, blocks } => {
                log::debug!("lock kind={} blocks={:?}", kind.as_str(), blocks);
            }
            EngineEvent::LinesCleared {
                count,
                total,
                points,
            } => {
                log::info!("line clear count={count} total={total} points={points}");
            }
            EngineEvent::LevelUp {
                level,
                goal,
                fall_speed_ms,
            } => {
                log::info!("level up level={level} goal={goal} fall_speed_ms={fall_speed_ms}");
            }
            EngineEvent::GameOver { reason, score } => {
                log::info!("game over reason={} score={}", reason.as_str(), score);
            }
        }
    }
}

/// Records every event in order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<EngineEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    /// Take and clear the recorded events.
    pub fn drain(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}

impl Observer for EventLog {
    fn on_event(&mut self, event: &EngineEvent) {
        self.events.push(*event);
    }
}
