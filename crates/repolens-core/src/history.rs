use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::model::AnalysisResult;
use crate::store::{StoreError, load_json_or_default, save_json};

/// Denormalized snapshot of one completed analysis, appended on every
/// successful pipeline run. Entries are never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub repo_name: String,
    pub stars: u64,
    pub health_score: u8,
    pub maturity_level: String,
    #[serde(with = "time::serde::rfc3339")]
    pub analyzed_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub entries: Vec<HistoryEntry>,
}

pub fn history_path(data_dir: &Path) -> PathBuf {
    data_dir.join("history.json")
}

impl History {
    /// Missing file yields an empty history.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        load_json_or_default(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self)
    }

    /// Newest entries first.
    pub fn add_entry(&mut self, result: &AnalysisResult, now: OffsetDateTime) {
        self.entries.insert(
            0,
            HistoryEntry {
                repo_name: result.repo.full_name.clone(),
                stars: result.repo.stars,
                health_score: result.health_score,
                maturity_level: result.maturity_level.to_string(),
                analyzed_at: now,
            },
        );
    }

    pub fn remove(&mut self, index: usize) {
        if index < self.entries.len() {
            self.entries.remove(index);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
