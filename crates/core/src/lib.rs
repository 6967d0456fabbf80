//! Core engine module - pure, deterministic, and testable
//!
//! This crate contains all the game rules and state management. It has
//! **no dependencies** on rendering, input devices or the file system:
//!
//! - **Deterministic**: the same seed and command sequence produce identical games
//! - **Testable**: every rule is reachable through the public command API
//! - **Portable**: drive it from a terminal, a GUI or a headless bot
//!
//! # Module Structure
//!
//! - [`grid`]: 10x22 occupancy matrix, line detection and row compaction
//! - [`pieces`]: spawn layouts, pivots and the SRS offset tables
//! - [`active`]: the active piece and collision checks
//! - [`rng`]: 7-bag randomizer with a six-piece lookahead
//! - [`scoring`]: stats, variable-goal leveling and the fall-speed curve
//! - [`engine`]: the phase controller and command API
//! - [`observe`]: events emitted at phase transitions
//! - [`snapshot`]: observable state for presentation layers
//! - [`save`]: versioned text snapshot codec
//!
//! # Game Rules
//!
//! - **7-Bag Randomizer**: every aligned run of seven draws holds each kind once
//! - **SRS Rotation**: rotation about a pivot block, then up to five offset kicks
//! - **Lock Down**: Classic, Extended (15 grants) or Infinite
//! - **Ghost Piece**: landing projection written into the grid as codes 11-17
//! - **Hold**: one swap per locked piece
//! - **Scoring**: 100/300/500/800 x level, 1 per soft-drop row, 2 per hard-drop row
//!
//! # Example
//!
//! ```
//! use line_clear_core::Engine;
//! use line_clear_types::Command;
//!
//! let mut engine = Engine::new(12345);
//! engine.start();
//!
//! engine.apply_command(Command::MoveRight);
//! engine.apply_command(Command::RotateCw);
//! engine.apply_command(Command::HardDrop);
//! engine.apply_command(Command::Tick);
//!
//! assert!(engine.score() > 0); // Hard drop awards points
//! assert!(engine.running());
//! ```
//!
//! # Timing
//!
//! The engine owns no clock. Call [`Engine::tick`] every
//! [`Engine::fall_speed_ms`] milliseconds while the game is running and
//! not paused: 1000ms at level 1, faster with every level.

pub mod active;
pub mod engine;
pub mod grid;
pub mod observe;
pub mod pieces;
pub mod rng;
pub mod save;
pub mod scoring;
pub mod snapshot;

pub use line_clear_types as types;

// Re-export commonly used types for convenience
pub use active::ActivePiece;
pub use engine::{Engine, Phase};
pub use grid::{Grid, GridCodes};
pub use observe::{EngineEvent, EventLog, GameOverReason, LogObserver, Observer};
pub use rng::Randomizer;
pub use save::{SaveError, SaveState};
pub use scoring::Stats;
pub use snapshot::{ActiveSnapshot, EngineSnapshot};
