//! File-system edges of the engine
//!
//! The core crate only turns state into text and back. This crate decides
//! where that text lives:
//!
//! - [`SaveStore`]: timestamp-named save files in one directory
//! - [`Leaderboard`]: the ordered score list, backed by a CSV file or memory

pub mod leaderboard;
pub mod save;

pub use leaderboard::{Entry, FileLeaderboard, Leaderboard, MemoryLeaderboard};
pub use save::SaveStore;
