//! High score leaderboard system
//!
//! Persisted to a small JSON file, tracks the top 5 scores. Scores are the
//! displayed score (tenths of a second survived).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 5;

/// Length of a sanitized name
pub const NAME_LEN: usize = 3;

/// Error type for leaderboard persistence.
#[derive(Debug, thiserror::Error)]
pub enum HighScoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed high score file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Three uppercase alphanumeric characters
    pub name: String,
    pub score: u32,
}

/// High score leaderboard, sorted descending by score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HighScores {
    #[serde(default)]
    pub entries: Vec<HighScoreEntry>,
}

/// Arcade-style name: trimmed, uppercase, alphanumeric, exactly 3 chars
///
/// Short names are padded with `A`; empty input becomes `AAA`.
pub fn sanitize_name(name: &str) -> String {
    let mut cleaned: String = name
        .trim()
        .chars()
        .flat_map(char::to_uppercase)
        .filter(|c| c.is_alphanumeric())
        .take(NAME_LEN)
        .collect();
    while cleaned.chars().count() < NAME_LEN {
        cleaned.push('A');
    }
    cleaned
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u32) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, name: &str, score: u32) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            name: sanitize_name(name),
            score,
        };

        // Ties keep the older entry first
        let pos = self.entries.iter().position(|e| score > e.score);
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

        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u32> {
        self.entries.first().map(|e| e.score)
    }

    /// Re-establish ordering and size after loading foreign data
    fn normalize(&mut self) {
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_HIGH_SCORES);
        for entry in &mut self.entries {
            entry.name = sanitize_name(&entry.name);
        }
    }

    pub fn from_json(json: &str) -> Result<Self, HighScoreError> {
        let mut scores: HighScores = serde_json::from_str(json)?;
        scores.normalize();
        Ok(scores)
    }

    pub fn to_json(&self) -> Result<String, HighScoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read the leaderboard file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HighScoreError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load, or start fresh (and rewrite the file) when missing or corrupt
    pub fn load_or_reset(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(scores) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(err) => {
                if path.exists() {
                    log::warn!("Resetting high scores at {}: {}", path.display(), err);
                } else {
                    log::info!("No high scores found, starting fresh");
                }
                let fresh = Self::new();
                if let Err(err) = fresh.save(path) {
                    log::warn!("Could not write high scores: {}", err);
                }
                fresh
            }
        }
    }

    /// Write the leaderboard file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), HighScoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        log::info!("High scores saved ({} entries)", self.entries.len());
        Ok(())
    }
}
