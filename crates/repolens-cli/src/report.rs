use anyhow::{Context, Result, bail};
use comfy_table::{Cell, ContentArrangement, Table};
use repolens_app::App;
use repolens_core::cache::{Cache, cache_dir};
use repolens_core::config::RepolensConfig;
use repolens_core::github::GithubClient;
use repolens_core::history::{History, history_path};
use repolens_core::model::AnalysisResult;
use repolens_core::sanitize::{RepoRef, sanitize_repo_input};
use repolens_core::scoring;

fn parse_reference(value: &str) -> Result<RepoRef> {
    let clean = sanitize_repo_input(value);
    if clean.is_empty() {
        bail!("repository must be in owner/repo format");
    }
    RepoRef::parse(&clean).map_err(Into::into)
}

fn build_cache(config: &RepolensConfig) -> Option<Cache> {
    if !config.cache.enabled {
        return None;
    }
    match repolens_core::paths::data_dir() {
        Ok(dir) => Some(Cache::new(cache_dir(&dir), config.cache.ttl_hours)),
        Err(error) => {
            tracing::warn!(%error, "cache disabled: no data directory");
            None
        }
    }
}

pub fn run_analyze(repo: &str, config: &RepolensConfig) -> Result<()> {
    let reference = parse_reference(repo)?;

    let client = GithubClient::from_env();
    let app = match build_cache(config) {
        Some(cache) => App::with_cache(&client, cache),
        None => App::new(&client),
    };

    eprintln!("Analyzing {reference}...");
    let result = app
        .analyze(&reference, true, |_| {})
        .with_context(|| format!("analysis of {reference} failed"))?;

    print_analysis(&result);
    Ok(())
}

pub fn run_compare(left: &str, right: &str, config: &RepolensConfig) -> Result<()> {
    let left_reference = parse_reference(left)?;
    let right_reference = parse_reference(right)?;

    let client = GithubClient::from_env();
    let app = match build_cache(config) {
        Some(cache) => App::with_cache(&client, cache),
        None => App::new(&client),
    };

    eprintln!("Comparing {left_reference} with {right_reference}...");
    let result = app.compare(&left_reference, &right_reference, |_| {})?;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "Metric".to_string(),
        result.left.repo.full_name.clone(),
        result.right.repo.full_name.clone(),
    ]);
    for (metric, left_value, right_value) in [
        (
            "Stars",
            result.left.repo.stars.to_string(),
            result.right.repo.stars.to_string(),
        ),
        (
            "Forks",
            result.left.repo.forks.to_string(),
            result.right.repo.forks.to_string(),
        ),
        (
            "Commits (1y)",
            result.left.commits.len().to_string(),
            result.right.commits.len().to_string(),
        ),
        (
            "Contributors",
            result.left.contributors.len().to_string(),
            result.right.contributors.len().to_string(),
        ),
        (
            "Health score",
            result.left.health_score.to_string(),
            result.right.health_score.to_string(),
        ),
        (
            "Bus factor",
            format!("{} ({})", result.left.bus_factor, result.left.bus_risk),
            format!("{} ({})", result.right.bus_factor, result.right.bus_risk),
        ),
        (
            "Maturity",
            format!(
                "{} ({})",
                result.left.maturity_level, result.left.maturity_score
            ),
            format!(
                "{} ({})",
                result.right.maturity_level, result.right.maturity_score
            ),
        ),
    ] {
        table.add_row(vec![
            Cell::new(metric),
            Cell::new(left_value),
            Cell::new(right_value),
        ]);
    }
    println!("{table}");

    Ok(())
}

pub fn run_history() -> Result<()> {
    let data_dir = repolens_core::paths::data_dir().context("failed to resolve data directory")?;
    let history = History::load(&history_path(&data_dir))?;

    if history.is_empty() {
        println!("No history yet. Analyze a repository to get started.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Repository", "Stars", "Health", "Maturity", "Analyzed"]);
    for entry in &history.entries {
        table.add_row(vec![
            Cell::new(entry.repo_name.as_str()),
            Cell::new(entry.stars),
            Cell::new(entry.health_score),
            Cell::new(entry.maturity_level.as_str()),
            Cell::new(repolens_core::time::format_date_minute(entry.analyzed_at)),
        ]);
    }
    println!("{table}");

    Ok(())
}

fn print_analysis(result: &AnalysisResult) {
    let repo = &result.repo;

    let mut info = Table::new();
    info.set_content_arrangement(ContentArrangement::Dynamic);
    info.set_header(vec!["Repository", repo.full_name.as_str()]);
    info.add_row(vec![
        Cell::new("Description"),
        Cell::new(repo.description.as_deref().unwrap_or("-")),
    ]);
    info.add_row(vec![Cell::new("Stars"), Cell::new(repo.stars)]);
    info.add_row(vec![Cell::new("Forks"), Cell::new(repo.forks)]);
    info.add_row(vec![Cell::new("Open issues"), Cell::new(repo.open_issues)]);
    info.add_row(vec![
        Cell::new("Default branch"),
        Cell::new(repo.default_branch.as_str()),
    ]);
    info.add_row(vec![
        Cell::new("Created"),
        Cell::new(repolens_core::time::format_date(repo.created_at)),
    ]);
    info.add_row(vec![
        Cell::new("Last push"),
        Cell::new(repolens_core::time::format_date(repo.pushed_at)),
    ]);
    println!("{info}");

    let mut metrics = Table::new();
    metrics.set_content_arrangement(ContentArrangement::Dynamic);
    metrics.set_header(vec!["Metric", "Value"]);
    metrics.add_row(vec![
        Cell::new("Health score"),
        Cell::new(format!(
            "{}/100 ({})",
            result.health_score,
            scoring::health_status(result.health_score)
        )),
    ]);
    metrics.add_row(vec![
        Cell::new("Bus factor"),
        Cell::new(format!("{} ({})", result.bus_factor, result.bus_risk)),
    ]);
    metrics.add_row(vec![
        Cell::new("Maturity"),
        Cell::new(format!(
            "{} ({})",
            result.maturity_level, result.maturity_score
        )),
    ]);
    metrics.add_row(vec![
        Cell::new("Commits (1y)"),
        Cell::new(result.commits.len()),
    ]);
    metrics.add_row(vec![
        Cell::new("Contributors"),
        Cell::new(result.contributors.len()),
    ]);
    metrics.add_row(vec![
        Cell::new("Activity"),
        Cell::new(scoring::activity_level(result.commits.len())),
    ]);
    metrics.add_row(vec![
        Cell::new("Primary language"),
        Cell::new(result.primary_language()),
    ]);
    println!("{metrics}");

    if !result.languages.is_empty() {
        let total: u64 = result.languages.values().sum();
        let mut languages: Vec<(&String, &u64)> = result.languages.iter().collect();
        languages.sort_by(|a, b| b.1.cmp(a.1));

        let mut table = Table::new();
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.set_header(vec!["Language", "Share"]);
        for (name, bytes) in languages {
            let percent = if total > 0 {
                *bytes as f64 / total as f64 * 100.0
            } else {
                0.0
            };
            table.add_row(vec![
                Cell::new(name.as_str()),
                Cell::new(format!("{percent:.1}%")),
            ]);
        }
        println!("{table}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reference_accepts_urls_and_plain_form() {
        assert_eq!(
            parse_reference("https://github.com/acme/widget/")
                .expect("url")
                .full_name(),
            "acme/widget"
        );
        assert_eq!(
            parse_reference("acme/widget").expect("plain").full_name(),
            "acme/widget"
        );
    }

    #[test]
    fn parse_reference_rejects_malformed_input() {
        assert!(parse_reference("not-a-repo").is_err());
        assert!(parse_reference("").is_err());
        assert!(parse_reference("a/b/c").is_err());
    }
}
