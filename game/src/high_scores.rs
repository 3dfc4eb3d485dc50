use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::host::GameMode;
use crate::persist;

pub const HIGH_SCORES_PATH_ENV: &str = "ARCADE_HIGH_SCORES_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u32,
    pub achieved_at: DateTime<Utc>,
}

/// Best score per mode, keyed by `GameMode::key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreTable {
    #[serde(default)]
    pub entries: BTreeMap<String, HighScoreEntry>,
}

impl HighScoreTable {
    pub fn best(&self, mode: GameMode) -> u32 {
        self.entries.get(mode.key()).map_or(0, |e| e.score)
    }

    /// Records `score` if it beats the stored best. Returns whether it did.
    pub fn offer(&mut self, mode: GameMode, score: u32, at: DateTime<Utc>) -> bool {
        if score == 0 || score <= self.best(mode) {
            return false;
        }
        self.entries.insert(
            mode.key().to_string(),
            HighScoreEntry {
                score,
                achieved_at: at,
            },
        );
        true
    }
}

#[derive(Debug, Clone)]
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn from_env() -> Self {
        if let Some(explicit) = std::env::var_os(HIGH_SCORES_PATH_ENV) {
            return Self::new(explicit);
        }
        Self::new(persist::user_file_path(
            "XDG_DATA_HOME",
            &[".local", "share"],
            "high_scores.json",
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> HighScoreTable {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    warn!(path = %self.path.display(), "high scores unreadable: {err}");
                }
                return HighScoreTable::default();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            warn!(path = %self.path.display(), "high scores corrupt, starting fresh: {err}");
            HighScoreTable::default()
        })
    }

    pub fn save(&self, table: &HighScoreTable) -> io::Result<()> {
        persist::ensure_parent(&self.path)?;
        let bytes = persist::to_json_bytes(table)?;
        persist::atomic_write(&self.path, &bytes)?;
        debug!(path = %self.path.display(), "high scores saved");
        Ok(())
    }
}
