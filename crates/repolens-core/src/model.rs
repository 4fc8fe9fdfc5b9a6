use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::github::{Commit, Contributor, Repo, TreeEntry};
use crate::scoring::{BusRisk, MaturityLevel};

/// One complete analysis of a repository. Constructed only by a pipeline
/// after every fetch succeeded; never partially populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub repo: Repo,
    pub commits: Vec<Commit>,
    pub contributors: Vec<Contributor>,
    pub languages: BTreeMap<String, u64>,
    pub file_tree: Vec<TreeEntry>,
    pub health_score: u8,
    pub bus_factor: u32,
    pub bus_risk: BusRisk,
    pub maturity_score: u8,
    pub maturity_level: MaturityLevel,
}

impl AnalysisResult {
    pub fn primary_language(&self) -> &str {
        self.languages
            .iter()
            .max_by_key(|(_, bytes)| **bytes)
            .map(|(name, _)| name.as_str())
            .unwrap_or("Unknown")
    }
}

/// An ordered pair of analyses produced by the comparison pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareResult {
    pub left: AnalysisResult,
    pub right: AnalysisResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_language_picks_largest_byte_count() {
        let raw = r#"{
            "name": "x",
            "full_name": "o/x",
            "stargazers_count": 0,
            "forks_count": 0,
            "open_issues_count": 0,
            "created_at": "2020-01-01T00:00:00Z",
            "updated_at": "2020-01-01T00:00:00Z",
            "pushed_at": "2020-01-01T00:00:00Z",
            "watchers_count": 0,
            "default_branch": "main",
            "html_url": "https://github.com/o/x",
            "clone_url": "https://github.com/o/x.git"
        }"#;
        let repo: Repo = serde_json::from_str(raw).expect("repo json");

        let mut languages = BTreeMap::new();
        languages.insert("Rust".to_string(), 9000u64);
        languages.insert("Shell".to_string(), 120u64);

        let result = AnalysisResult {
            repo,
            commits: Vec::new(),
            contributors: Vec::new(),
            languages,
            file_tree: Vec::new(),
            health_score: 50,
            bus_factor: 0,
            bus_risk: BusRisk::Unknown,
            maturity_score: 0,
            maturity_level: MaturityLevel::Prototype,
        };

        assert_eq!(result.primary_language(), "Rust");
    }
}
