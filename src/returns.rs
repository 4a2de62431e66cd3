//! Episode return leaderboard
//!
//! Keeps the best episode returns of a run, sorted descending, and persists
//! them as JSON next to the run's other outputs.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;
use crate::sim::{EpisodeSummary, TerminationCause};

/// Maximum number of returns to keep
pub const MAX_RETURNS: usize = 10;

/// A single leaderboard entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnEntry {
    pub episode: u64,
    pub episode_return: f32,
    pub ticks: u64,
    pub asteroids_destroyed: u32,
    pub cause: TerminationCause,
}

impl From<&EpisodeSummary> for ReturnEntry {
    fn from(summary: &EpisodeSummary) -> Self {
        Self {
            episode: summary.episode,
            episode_return: summary.episode_return,
            ticks: summary.stats.ticks,
            asteroids_destroyed: summary.stats.asteroids_destroyed,
            cause: summary.cause,
        }
    }
}

/// Best-returns leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReturnBoard {
    pub entries: Vec<ReturnEntry>,
}

impl ReturnBoard {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a return would make the board
    pub fn qualifies(&self, episode_return: f32) -> bool {
        if !episode_return.is_finite() {
            return false;
        }
        if self.entries.len() < MAX_RETURNS {
            return true;
        }
        self.entries
            .last()
            .is_none_or(|e| episode_return > e.episode_return)
    }

    /// Record a finished episode.
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    pub fn add(&mut self, summary: &EpisodeSummary) -> Option<usize> {
        if !self.qualifies(summary.episode_return) {
            return None;
        }

        let entry = ReturnEntry::from(summary);
        // Ties keep the earlier episode ahead
        let pos = self
            .entries
            .iter()
            .position(|e| entry.episode_return > e.episode_return);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        self.entries.truncate(MAX_RETURNS);
        Some(rank)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&ReturnEntry> {
        self.entries.first()
    }

    /// Load a board from JSON; a missing file yields an empty board
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AgentError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No return board at {}, starting fresh", path.display());
            return Ok(Self::new());
        }
        let json = fs::read_to_string(path)?;
        let mut board: ReturnBoard = serde_json::from_str(&json)?;
        board.entries.retain(|e| e.episode_return.is_finite());
        board
            .entries
            .sort_by(|a, b| b.episode_return.total_cmp(&a.episode_return));
        board.entries.truncate(MAX_RETURNS);
        log::info!("Loaded {} returns from {}", board.entries.len(), path.display());
        Ok(board)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AgentError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        log::info!("Return board saved ({} entries)", self.entries.len());
        Ok(())
    }
}
