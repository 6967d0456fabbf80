//! Timestamp-named save files
//!
//! Every save is a new file `save-<unix secs>.txt` in the store directory.
//! A second save in the same second gets a sequence suffix
//! (`save-<secs>-1.txt`, `save-<secs>-2.txt`, ...) instead of replacing the
//! first.
//! Loading goes through the engine's validating decoder, so a corrupt file
//! is reported and the running game is left alone.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};

use line_clear_core::{Engine, Observer};

const PREFIX: &str = "save-";
const SUFFIX: &str = ".txt";

/// A directory of save files
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the first save taken at `timestamp`
    pub fn path_for(&self, timestamp: u64) -> PathBuf {
        self.path_with_seq(timestamp, 0)
    }

    fn path_with_seq(&self, timestamp: u64, seq: u32) -> PathBuf {
        if seq == 0 {
            self.dir.join(format!("{PREFIX}{timestamp}{SUFFIX}"))
        } else {
            self.dir.join(format!("{PREFIX}{timestamp}-{seq}{SUFFIX}"))
        }
    }

    /// Save the engine stamped with the current time
    pub fn save<O: Observer>(&self, engine: &Engine<O>) -> Result<PathBuf> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow!("save: system clock before unix epoch: {}", e))?;
        self.save_at(engine, now.as_secs())
    }

    /// Save the engine with an explicit timestamp
    pub fn save_at<O: Observer>(&self, engine: &Engine<O>, timestamp: u64) -> Result<PathBuf> {
        let text = engine
            .save_snapshot(timestamp)
            .map_err(|e| anyhow!("save: encode failed: {}", e))?;

        fs::create_dir_all(&self.dir)
            .map_err(|e| anyhow!("save: create {} failed: {}", self.dir.display(), e))?;
        let mut seq = 0u32;
        let (path, mut file) = loop {
            let path = self.path_with_seq(timestamp, seq);
            match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => seq += 1,
                Err(e) => return Err(anyhow!("save: create {} failed: {}", path.display(), e)),
            }
        };
        file.write_all(text.as_bytes())
            .map_err(|e| anyhow!("save: write {} failed: {}", path.display(), e))?;

        log::info!("saved game to {}", path.display());
        Ok(path)
    }

    /// Replace the engine state with the file's. On error the engine is unchanged.
    pub fn load<O: Observer>(&self, path: &Path, engine: &mut Engine<O>) -> Result<()> {
        let text = fs::read_to_string(path)
            .map_err(|e| anyhow!("load: read {} failed: {}", path.display(), e))?;
        engine
            .load_snapshot(&text)
            .map_err(|e| anyhow!("load: {}: {}", path.display(), e))?;

        log::info!("loaded game from {}", path.display());
        Ok(())
    }

    /// The newest save file, by the timestamp in its name
    pub fn latest(&self) -> Result<Option<PathBuf>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(anyhow!("latest: read {} failed: {}", self.dir.display(), e)),
        };

        let mut newest: Option<((u64, u32), PathBuf)> = None;
        for entry in entries {
            let entry = entry.map_err(|e| anyhow!("latest: {}", e))?;
            let name = entry.file_name();
            let Some(key) = name.to_str().and_then(parse_save_name) else {
                continue;
            };
            if newest.as_ref().map_or(true, |(best, _)| key > *best) {
                newest = Some((key, entry.path()));
            }
        }
        Ok(newest.map(|(_, path)| path))
    }
}

/// Timestamp from a `save-<secs>.txt` or `save-<secs>-<seq>.txt` file name
pub fn parse_timestamp(name: &str) -> Option<u64> {
    parse_save_name(name).map(|(timestamp, _)| timestamp)
}

/// `(timestamp, sequence)` from a save file name; the first save has sequence 0
fn parse_save_name(name: &str) -> Option<(u64, u32)> {
    let stem = name.strip_prefix(PREFIX)?.strip_suffix(SUFFIX)?;
    match stem.split_once('-') {
        Some((secs, seq)) => {
            let seq: u32 = seq.parse().ok()?;
            if seq == 0 {
                return None;
            }
            Some((secs.parse().ok()?, seq))
        }
        None => Some((stem.parse().ok()?, 0)),
    }
}
