use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::github::{Commit, Contributor, Repo};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusRisk {
    Unknown,
    Low,
    Medium,
    High,
}

impl std::fmt::Display for BusRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unknown => "Unknown",
            Self::Low => "Low Risk",
            Self::Medium => "Medium Risk",
            Self::High => "High Risk",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaturityLevel {
    Prototype,
    Growing,
    Stable,
    ProductionReady,
}

impl std::fmt::Display for MaturityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Prototype => "Prototype",
            Self::Growing => "Growing",
            Self::Stable => "Stable",
            Self::ProductionReady => "Production-Ready",
        };
        f.write_str(label)
    }
}

fn days_since(value: OffsetDateTime) -> i64 {
    (OffsetDateTime::now_utc() - value).whole_days()
}

/// Overall repository health in 0..=100. Starts from a neutral base and
/// rewards recent pushes, commit volume, popularity, and a description.
pub fn health_score(repo: &Repo, commits: &[Commit]) -> u8 {
    let mut score: i32 = 50;

    score += match days_since(repo.pushed_at) {
        days if days <= 7 => 15,
        days if days <= 30 => 10,
        days if days <= 90 => 5,
        _ => 0,
    };

    score += match commits.len() {
        count if count >= 200 => 15,
        count if count >= 50 => 10,
        count if count >= 10 => 5,
        _ => 0,
    };

    score += match repo.stars {
        stars if stars >= 1000 => 10,
        stars if stars >= 100 => 5,
        stars if stars >= 10 => 2,
        _ => 0,
    };

    score += match repo.forks {
        forks if forks >= 100 => 5,
        forks if forks >= 10 => 2,
        _ => 0,
    };

    if repo.has_description() {
        score += 5;
    }

    score.clamp(0, 100) as u8
}

pub fn health_status(score: u8) -> &'static str {
    match score {
        80.. => "Excellent",
        60..=79 => "Good",
        40..=59 => "Fair",
        _ => "Poor",
    }
}

/// Bus factor: the smallest number of top contributors whose combined
/// commits exceed half of all commits. The risk label is derived from the
/// top contributor's share alone.
pub fn bus_factor(contributors: &[Contributor]) -> (u32, BusRisk) {
    let mut counts: Vec<u64> = contributors
        .iter()
        .map(|contributor| contributor.commits)
        .collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    let total: u64 = counts.iter().sum();
    if counts.is_empty() || total == 0 {
        return (0, BusRisk::Unknown);
    }

    let mut cumulative = 0u64;
    let mut factor = 0u32;
    for count in &counts {
        cumulative += count;
        factor += 1;
        if cumulative * 2 > total {
            break;
        }
    }

    let top_share = counts[0] as f64 / total as f64;
    let risk = if top_share > 0.7 {
        BusRisk::High
    } else if top_share > 0.4 {
        BusRisk::Medium
    } else {
        BusRisk::Low
    };

    (factor, risk)
}

/// Project maturity in 0..=100 from age, activity, community size,
/// popularity, releases, and documentation signals.
pub fn maturity(
    repo: &Repo,
    commit_count: usize,
    contributor_count: usize,
    has_releases: bool,
) -> (u8, MaturityLevel) {
    let mut score: i32 = 0;

    score += match days_since(repo.created_at) {
        age if age >= 730 => 25,
        age if age >= 365 => 15,
        age if age >= 180 => 8,
        _ => 0,
    };

    score += match commit_count {
        count if count >= 500 => 20,
        count if count >= 100 => 10,
        count if count >= 30 => 5,
        _ => 0,
    };

    score += match contributor_count {
        count if count >= 10 => 15,
        count if count >= 3 => 8,
        count if count >= 2 => 4,
        _ => 0,
    };

    score += match repo.stars {
        stars if stars >= 500 => 15,
        stars if stars >= 100 => 8,
        stars if stars >= 10 => 3,
        _ => 0,
    };

    score += match repo.forks {
        forks if forks >= 100 => 10,
        forks if forks >= 10 => 5,
        _ => 0,
    };

    if has_releases {
        score += 10;
    }

    if repo.has_description() {
        score += 5;
    }

    let score = score.clamp(0, 100) as u8;
    (score, maturity_level(score))
}

pub fn maturity_level(score: u8) -> MaturityLevel {
    match score {
        80.. => MaturityLevel::ProductionReady,
        60..=79 => MaturityLevel::Stable,
        40..=59 => MaturityLevel::Growing,
        _ => MaturityLevel::Prototype,
    }
}

/// Commit counts keyed by calendar date (UTC), for the activity chart.
pub fn commits_per_day(commits: &[Commit]) -> BTreeMap<String, u32> {
    let mut days = BTreeMap::new();
    for commit in commits {
        let key = crate::time::format_date(commit.commit.author.date);
        *days.entry(key).or_insert(0) += 1;
    }
    days
}

pub fn activity_level(commit_count: usize) -> &'static str {
    match commit_count {
        count if count > 500 => "Very High",
        count if count > 200 => "High",
        count if count > 50 => "Medium",
        _ => "Low",
    }
}
