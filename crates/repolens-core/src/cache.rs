//! TTL-bounded cache of analysis results, one JSON file per repository
//! under `<data_dir>/cache/`. A cache failure is always treated as a miss.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::model::AnalysisResult;
use crate::store::{StoreError, save_json};

pub const DEFAULT_TTL_HOURS: u64 = 24;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub repo_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub cached_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    pub analysis: AnalysisResult,
}

#[derive(Debug, Clone)]
pub struct Cache {
    dir: PathBuf,
    ttl: Duration,
}

pub fn cache_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("cache")
}

fn entry_file_name(repo_name: &str) -> String {
    format!("{}.json", repo_name.replace('/', "_"))
}

impl Cache {
    pub fn new(dir: PathBuf, ttl_hours: u64) -> Self {
        Self {
            dir,
            ttl: Duration::hours(ttl_hours as i64),
        }
    }

    fn entry_path(&self, repo_name: &str) -> PathBuf {
        self.dir.join(entry_file_name(repo_name))
    }

    /// Returns the cached analysis when present and not expired.
    pub fn get(&self, repo_name: &str, now: OffsetDateTime) -> Option<AnalysisResult> {
        let path = self.entry_path(repo_name);
        if !path.exists() {
            return None;
        }

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to read cache entry");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to parse cache entry");
                return None;
            }
        };

        if entry.expires_at <= now {
            return None;
        }

        Some(entry.analysis)
    }

    pub fn put(
        &self,
        repo_name: &str,
        analysis: &AnalysisResult,
        now: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let entry = CacheEntry {
            repo_name: repo_name.to_string(),
            cached_at: now,
            expires_at: now + self.ttl,
            analysis: analysis.clone(),
        };
        save_json(&self.entry_path(repo_name), &entry)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::github::Repo;
    use crate::scoring::{BusRisk, MaturityLevel};

    use super::*;

    fn sample_result() -> AnalysisResult {
        let now = OffsetDateTime::now_utc();
        AnalysisResult {
            repo: Repo {
                name: "widget".to_string(),
                full_name: "acme/widget".to_string(),
                stars: 3,
                forks: 0,
                open_issues: 0,
                description: None,
                created_at: now,
                updated_at: now,
                pushed_at: now,
                watchers: 3,
                language: None,
                fork: false,
                archived: false,
                private: false,
                default_branch: "main".to_string(),
                html_url: "https://github.com/acme/widget".to_string(),
                clone_url: "https://github.com/acme/widget.git".to_string(),
            },
            commits: Vec::new(),
            contributors: Vec::new(),
            languages: BTreeMap::new(),
            file_tree: Vec::new(),
            health_score: 50,
            bus_factor: 0,
            bus_risk: BusRisk::Unknown,
            maturity_score: 0,
            maturity_level: MaturityLevel::Prototype,
        }
    }

    #[test]
    fn entry_file_name_mangles_slash() {
        assert_eq!(entry_file_name("acme/widget"), "acme_widget.json");
    }

    #[test]
    fn put_then_get_within_ttl_hits() {
        let temp = tempfile::tempdir().expect("temp dir");
        let cache = Cache::new(cache_dir(temp.path()), DEFAULT_TTL_HOURS);
        let now = OffsetDateTime::now_utc();

        cache.put("acme/widget", &sample_result(), now).expect("put");
        let hit = cache.get("acme/widget", now).expect("hit");
        assert_eq!(hit.repo.full_name, "acme/widget");
    }

    #[test]
    fn expired_entry_is_a_miss() {
        let temp = tempfile::tempdir().expect("temp dir");
        let cache = Cache::new(cache_dir(temp.path()), 1);
        let now = OffsetDateTime::now_utc();

        cache.put("acme/widget", &sample_result(), now).expect("put");
        assert!(cache.get("acme/widget", now + Duration::hours(2)).is_none());
    }

    #[test]
    fn missing_and_corrupt_entries_are_misses() {
        let temp = tempfile::tempdir().expect("temp dir");
        let dir = cache_dir(temp.path());
        let cache = Cache::new(dir.clone(), DEFAULT_TTL_HOURS);
        let now = OffsetDateTime::now_utc();

        assert!(cache.get("acme/widget", now).is_none());

        std::fs::create_dir_all(&dir).expect("cache dir");
        std::fs::write(dir.join("acme_widget.json"), "not json").expect("write");
        assert!(cache.get("acme/widget", now).is_none());
    }
}
