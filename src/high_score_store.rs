use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

const STORE_VERSION: u8 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct HighScoreFile {
    version: u8,
    #[serde(rename = "highScore", alias = "high_score")]
    high_score: u32,
    #[serde(rename = "updatedAt", default)]
    updated_at: Option<String>,
}

/// JSON-file backed best score. Every I/O or parse failure is logged and
/// absorbed; callers only ever see a number.
pub struct HighScoreStore {
    file_path: PathBuf,
    best: u32,
}

impl HighScoreStore {
    pub fn new(file_path: PathBuf) -> Self {
        let best = load_best(&file_path);
        Self { file_path, best }
    }

    pub fn best(&self) -> u32 {
        self.best
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Saves when `score` beats the stored best. Returns whether it did.
    pub fn record(&mut self, score: u32) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        self.save();
        true
    }

    fn save(&self) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), %error, "failed to create high score dir");
                return;
            }
        }

        let payload = HighScoreFile {
            version: STORE_VERSION,
            high_score: self.best,
            updated_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    warn!(path = %self.file_path.display(), %error, "failed to write high score");
                }
            }
            Err(error) => {
                warn!(path = %self.file_path.display(), %error, "failed to serialize high score");
            }
        }
    }
}

fn load_best(path: &Path) -> u32 {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), %error, "failed to read high score");
            }
            return 0;
        }
    };
    match serde_json::from_str::<HighScoreFile>(&text) {
        Ok(file) if file.version == STORE_VERSION => file.high_score,
        Ok(file) => {
            warn!(path = %path.display(), version = file.version, "unsupported high score version");
            0
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to parse high score");
            0
        }
    }
}
