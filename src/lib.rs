//! Line Clear (workspace facade crate).
//!
//! Re-exports the engine crates under one `line_clear::{core, store, types}`
//! path, plus environment configuration and the headless driver used by the
//! `line-clear` binary.

pub use line_clear_core as core;
pub use line_clear_store as store;
pub use line_clear_types as types;

pub mod config;
pub mod driver;
