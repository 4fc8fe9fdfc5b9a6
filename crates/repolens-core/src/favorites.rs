use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::store::{StoreError, load_json_or_default, save_json};

/// A bookmarked repository with usage tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Favorite {
    pub repo_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_used: OffsetDateTime,
    pub use_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Favorites {
    pub items: Vec<Favorite>,
}

pub fn favorites_path(data_dir: &Path) -> PathBuf {
    data_dir.join("favorites.json")
}

impl Favorites {
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        load_json_or_default(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        save_json(path, self)
    }

    /// Adds a repository, or bumps its usage when already present.
    pub fn add(&mut self, repo_name: &str, now: OffsetDateTime) {
        for item in &mut self.items {
            if item.repo_name == repo_name {
                item.use_count += 1;
                item.last_used = now;
                return;
            }
        }

        self.items.push(Favorite {
            repo_name: repo_name.to_string(),
            added_at: now,
            last_used: now,
            use_count: 1,
        });
    }

    pub fn remove(&mut self, repo_name: &str) {
        self.items.retain(|item| item.repo_name != repo_name);
    }

    pub fn is_favorite(&self, repo_name: &str) -> bool {
        self.items.iter().any(|item| item.repo_name == repo_name)
    }

    pub fn update_usage(&mut self, repo_name: &str, now: OffsetDateTime) {
        for item in &mut self.items {
            if item.repo_name == repo_name {
                item.use_count += 1;
                item.last_used = now;
                return;
            }
        }
    }

    pub fn top(&self, count: usize) -> Vec<&Favorite> {
        let mut sorted: Vec<&Favorite> = self.items.iter().collect();
        sorted.sort_by(|a, b| b.use_count.cmp(&a.use_count));
        sorted.truncate(count);
        sorted
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
