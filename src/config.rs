//! Environment configuration
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `LINE_CLEAR_HOLD` | hold slot enabled (`1/0/true/false/on/off`) | on |
//! | `LINE_CLEAR_GHOST` | ghost projection enabled | on |
//! | `LINE_CLEAR_LOCK_DOWN` | `extended`, `infinite` or `classic` | extended |
//! | `LINE_CLEAR_SEED` | randomizer seed | from the clock |
//! | `LINE_CLEAR_SAVE_DIR` | directory for save files | none |
//! | `LINE_CLEAR_LEADERBOARD` | leaderboard CSV path | none |
//!
//! Unparseable values are logged and ignored.

use std::path::PathBuf;

use crate::types::{LockDown, Options};

pub const ENV_HOLD: &str = "LINE_CLEAR_HOLD";
pub const ENV_GHOST: &str = "LINE_CLEAR_GHOST";
pub const ENV_LOCK_DOWN: &str = "LINE_CLEAR_LOCK_DOWN";
pub const ENV_SEED: &str = "LINE_CLEAR_SEED";
pub const ENV_SAVE_DIR: &str = "LINE_CLEAR_SAVE_DIR";
pub const ENV_LEADERBOARD: &str = "LINE_CLEAR_LEADERBOARD";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineConfig {
    pub options: Options,
    pub seed: Option<u64>,
    pub save_dir: Option<PathBuf>,
    pub leaderboard: Option<PathBuf>,
}

impl EngineConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from any key lookup (the environment, a map in tests)
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| {
            get(key)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let mut options = Options::default();
        if let Some(v) = value(ENV_HOLD) {
            match parse_switch(&v) {
                Some(on) => options.hold_enabled = on,
                None => log::warn!("ignoring {ENV_HOLD}={v}: expected on/off"),
            }
        }
        if let Some(v) = value(ENV_GHOST) {
            match parse_switch(&v) {
                Some(on) => options.ghost_piece = on,
                None => log::warn!("ignoring {ENV_GHOST}={v}: expected on/off"),
            }
        }
        if let Some(v) = value(ENV_LOCK_DOWN) {
            match LockDown::from_str(&v) {
                Some(policy) => options.lock_down = policy,
                None => log::warn!("ignoring {ENV_LOCK_DOWN}={v}: expected extended/infinite/classic"),
            }
        }

        let seed = value(ENV_SEED).and_then(|v| {
            let parsed = v.parse().ok();
            if parsed.is_none() {
                log::warn!("ignoring {ENV_SEED}={v}: not an unsigned integer");
            }
            parsed
        });

        Self {
            options,
            seed,
            save_dir: value(ENV_SAVE_DIR).map(PathBuf::from),
            leaderboard: value(ENV_LEADERBOARD).map(PathBuf::from),
        }
    }
}

fn parse_switch(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
