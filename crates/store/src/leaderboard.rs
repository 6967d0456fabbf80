//! Leaderboard - an ordered list of (initials, score) entries
//!
//! Two operations only: read every entry (lowest score first) and append
//! one. The file-backed board is a CSV with an `Initials,Score` header.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Result};

const HEADER: &str = "Initials,Score";

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    pub initials: String,
    pub score: u32,
}

pub trait Leaderboard {
    /// All entries, ascending by score; ties keep insertion order
    fn entries(&self) -> Result<Vec<Entry>>;

    fn append(&mut self, initials: &str, score: u32) -> Result<()>;

    /// Highest score, if any
    fn best(&self) -> Result<Option<Entry>> {
        Ok(self.entries()?.pop())
    }
}

/// Trimmed, uppercased initials. Rejects empty input and CSV separators.
pub fn normalize_initials(initials: &str) -> Result<String> {
    let trimmed = initials.trim();
    if trimmed.is_empty() {
        bail!("leaderboard: initials must not be empty");
    }
    if trimmed.contains([',', '\n', '\r']) {
        bail!("leaderboard: initials must not contain commas or line breaks");
    }
    Ok(trimmed.to_uppercase())
}

fn sorted(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.sort_by_key(|e| e.score);
    entries
}

/// CSV file on disk
#[derive(Debug, Clone)]
pub struct FileLeaderboard {
    path: PathBuf,
}

impl FileLeaderboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse(text: &str) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || (i == 0 && line.eq_ignore_ascii_case(HEADER)) {
                continue;
            }
            let (initials, score) = line
                .split_once(',')
                .ok_or_else(|| anyhow!("leaderboard: line {}: expected `initials,score`", i + 1))?;
            let score = score
                .trim()
                .parse()
                .map_err(|e| anyhow!("leaderboard: line {}: bad score: {}", i + 1, e))?;
            entries.push(Entry {
                initials: initials.trim().to_string(),
                score,
            });
        }
        Ok(entries)
    }
}

impl Leaderboard for FileLeaderboard {
    fn entries(&self) -> Result<Vec<Entry>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => bail!("leaderboard: read {} failed: {}", self.path.display(), e),
        };
        Ok(sorted(Self::parse(&text)?))
    }

    fn append(&mut self, initials: &str, score: u32) -> Result<()> {
        let initials = normalize_initials(initials)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow!("leaderboard: create {} failed: {}", parent.display(), e))?;
        }

        let fresh = !self.path.exists();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| anyhow!("leaderboard: open {} failed: {}", self.path.display(), e))?;
        if fresh {
            writeln!(file, "{HEADER}")?;
        }
        writeln!(file, "{initials},{score}")?;

        log::info!("leaderboard entry {initials} {score}");
        Ok(())
    }
}

/// In-memory board for tests and embedders without a file system
#[derive(Debug, Clone, Default)]
pub struct MemoryLeaderboard {
    entries: Vec<Entry>,
}

impl MemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Leaderboard for MemoryLeaderboard {
    fn entries(&self) -> Result<Vec<Entry>> {
        Ok(sorted(self.entries.clone()))
    }

    fn append(&mut self, initials: &str, score: u32) -> Result<()> {
        let initials = normalize_initials(initials)?;
        self.entries.push(Entry { initials, score });
        Ok(())
    }
}
