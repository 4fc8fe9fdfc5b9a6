use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::{AnalysisResult, CompareResult};
use crate::scoring;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn label(self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Markdown => "Markdown",
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn write_file(path: PathBuf, contents: &str) -> Result<PathBuf, ExportError> {
    std::fs::write(&path, contents).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

pub fn export_analysis(
    result: &AnalysisResult,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    match format {
        ExportFormat::Json => write_file(
            dir.join("analysis.json"),
            &serde_json::to_string_pretty(result)?,
        ),
        ExportFormat::Markdown => {
            write_file(dir.join("analysis.md"), &analysis_markdown(result))
        }
    }
}

pub fn export_compare(
    result: &CompareResult,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    match format {
        ExportFormat::Json => write_file(
            dir.join("comparison.json"),
            &serde_json::to_string_pretty(result)?,
        ),
        ExportFormat::Markdown => {
            write_file(dir.join("comparison.md"), &compare_markdown(result))
        }
    }
}

fn analysis_markdown(result: &AnalysisResult) -> String {
    let repo = &result.repo;
    let mut out = String::new();

    let _ = writeln!(out, "# Analysis: {}", repo.full_name);
    let _ = writeln!(out);
    if let Some(description) = repo.description.as_deref().filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(out, "> {description}");
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "## Metrics");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Metric | Value |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| Stars | {} |", repo.stars);
    let _ = writeln!(out, "| Forks | {} |", repo.forks);
    let _ = writeln!(out, "| Open issues | {} |", repo.open_issues);
    let _ = writeln!(out, "| Commits (1 year) | {} |", result.commits.len());
    let _ = writeln!(out, "| Contributors | {} |", result.contributors.len());
    let _ = writeln!(
        out,
        "| Health score | {} ({}) |",
        result.health_score,
        scoring::health_status(result.health_score)
    );
    let _ = writeln!(
        out,
        "| Bus factor | {} ({}) |",
        result.bus_factor, result.bus_risk
    );
    let _ = writeln!(
        out,
        "| Maturity | {} ({}) |",
        result.maturity_level, result.maturity_score
    );
    let _ = writeln!(out, "| Primary language | {} |", result.primary_language());

    let _ = writeln!(out);
    let _ = writeln!(out, "## Languages");
    let _ = writeln!(out);
    if result.languages.is_empty() {
        let _ = writeln!(out, "No language data available.");
    } else {
        let total: u64 = result.languages.values().sum();
        let mut languages: Vec<(&String, &u64)> = result.languages.iter().collect();
        languages.sort_by(|a, b| b.1.cmp(a.1));
        for (name, bytes) in languages {
            let percent = if total > 0 {
                *bytes as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            let _ = writeln!(out, "- {name}: {percent:.1}%");
        }
    }

    out
}

fn compare_markdown(result: &CompareResult) -> String {
    let left = &result.left;
    let right = &result.right;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "# Comparison: {} vs {}",
        left.repo.full_name, right.repo.full_name
    );
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "| Metric | {} | {} |",
        left.repo.full_name, right.repo.full_name
    );
    let _ = writeln!(out, "|---|---|---|");
    let _ = writeln!(out, "| Stars | {} | {} |", left.repo.stars, right.repo.stars);
    let _ = writeln!(out, "| Forks | {} | {} |", left.repo.forks, right.repo.forks);
    let _ = writeln!(
        out,
        "| Commits (1 year) | {} | {} |",
        left.commits.len(),
        right.commits.len()
    );
    let _ = writeln!(
        out,
        "| Contributors | {} | {} |",
        left.contributors.len(),
        right.contributors.len()
    );
    let _ = writeln!(
        out,
        "| Health score | {} | {} |",
        left.health_score, right.health_score
    );
    let _ = writeln!(
        out,
        "| Bus factor | {} ({}) | {} ({}) |",
        left.bus_factor, left.bus_risk, right.bus_factor, right.bus_risk
    );
    let _ = writeln!(
        out,
        "| Maturity | {} ({}) | {} ({}) |",
        left.maturity_level, left.maturity_score, right.maturity_level, right.maturity_score
    );

    let _ = writeln!(out);
    let verdict = if left.maturity_score > right.maturity_score {
        format!("{} appears more mature and stable.", left.repo.full_name)
    } else if right.maturity_score > left.maturity_score {
        format!("{} appears more mature and stable.", right.repo.full_name)
    } else {
        "Both repositories are similarly mature.".to_string()
    };
    let _ = writeln!(out, "**Verdict:** {verdict}");

    out
}
