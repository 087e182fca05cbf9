//! Local high-score list stored as JSON on disk.
//!
//! The file holds an object of storage keys; the records live under
//! [`STORAGE_KEY`] as a list in the order they were appended. Sorting by
//! score happens only when the list is displayed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::game::GameSummary;

pub const STORAGE_KEY: &str = "tetrisScores";
pub const SCORES_FILE_ENV: &str = "TETRIS_SCORES_FILE";
pub const DEFAULT_SCORES_FILE: &str = "tetris-scores.json";
pub const ANONYMOUS_PLAYER: &str = "Anonymous";

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("leaderboard encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRecord {
    /// Creation time in epoch milliseconds.
    pub id: i64,
    pub player_name: String,
    pub score: u32,
    pub level: u32,
    pub date: DateTime<Utc>,
}

impl ScoreRecord {
    pub fn new(player_name: &str, summary: &GameSummary) -> Self {
        let player_name = player_name.trim();
        Self {
            id: summary.finished_at.timestamp_millis(),
            player_name: if player_name.is_empty() {
                ANONYMOUS_PLAYER.to_string()
            } else {
                player_name.to_string()
            },
            score: summary.score,
            level: summary.level,
            date: summary.finished_at,
        }
    }
}

pub struct Leaderboard {
    path: PathBuf,
}

impl Leaderboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$TETRIS_SCORES_FILE`, falling back to `tetris-scores.json` in the
    /// working directory.
    pub fn from_env() -> Self {
        match std::env::var_os(SCORES_FILE_ENV) {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::new(DEFAULT_SCORES_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records in storage order. A missing or unreadable store is empty.
    pub fn load(&self) -> Vec<ScoreRecord> {
        let Some(value) = self.read_store().remove(STORAGE_KEY) else {
            return Vec::new();
        };
        match serde_json::from_value(value) {
            Ok(records) => records,
            Err(e) => {
                warn!("ignoring malformed {} in {}: {}", STORAGE_KEY, self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Highest score first. Ties keep storage order.
    pub fn ranked(&self) -> Vec<ScoreRecord> {
        let mut records = self.load();
        records.sort_by(|a, b| b.score.cmp(&a.score));
        records
    }

    pub fn append(&self, record: ScoreRecord) -> Result<(), LeaderboardError> {
        let mut store = self.read_store();
        let mut records = self.load();
        debug!(
            "saving score {} for {} to {}",
            record.score,
            record.player_name,
            self.path.display()
        );
        records.push(record);
        store.insert(STORAGE_KEY.to_string(), serde_json::to_value(records)?);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&Value::Object(store))?)?;
        Ok(())
    }

    fn read_store(&self) -> Map<String, Value> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Map::new(),
            Err(e) => {
                warn!("cannot read {}: {}", self.path.display(), e);
                return Map::new();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(Value::Object(store)) => store,
            Ok(_) | Err(_) => {
                warn!("{} is not a score store, treating it as empty", self.path.display());
                Map::new()
            }
        }
    }
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::from_env()
    }
}
