use repolens_core::github::{FetchError, RepoFetcher};
use repolens_core::model::{AnalysisResult, CompareResult};
use repolens_core::sanitize::RepoRef;
use repolens_core::scoring;
use thiserror::Error;

/// Stage names for the single-repository pipeline, in execution order.
pub const ANALYSIS_STAGES: [&str; 6] = [
    "Fetching repository",
    "Fetching commit history",
    "Fetching contributors",
    "Fetching languages and file tree",
    "Computing scores",
    "Assembling result",
];

/// Stage names for the comparison pipeline.
pub const COMPARE_STAGES: [&str; 2] = ["Analyzing first repository", "Analyzing second repository"];

pub const COMMIT_WINDOW_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareSide {
    Left,
    Right,
}

impl std::fmt::Display for CompareSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Left => "first",
            Self::Right => "second",
        })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch repository {repo}: {source}")]
    Repo {
        repo: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to fetch commits for {repo}: {source}")]
    Commits {
        repo: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to fetch contributors for {repo}: {source}")]
    Contributors {
        repo: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to fetch languages for {repo}: {source}")]
    Languages {
        repo: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to fetch file tree for {repo}: {source}")]
    FileTree {
        repo: String,
        #[source]
        source: FetchError,
    },
    #[error("failed to fetch {side} repository {repo}: {source}")]
    CompareSide {
        side: CompareSide,
        repo: String,
        #[source]
        source: FetchError,
    },
}

/// Runs the fail-fast analysis pipeline for one repository. `on_stage` is
/// invoked with the stage index after each stage succeeds; any fetch
/// failure aborts immediately and discards everything gathered so far.
pub fn run_analysis(
    fetcher: &dyn RepoFetcher,
    reference: &RepoRef,
    mut on_stage: impl FnMut(usize),
) -> Result<AnalysisResult, PipelineError> {
    let full_name = reference.full_name();

    let repo = fetcher
        .repo(&reference.owner, &reference.name)
        .map_err(|source| PipelineError::Repo {
            repo: full_name.clone(),
            source,
        })?;
    on_stage(0);

    let commits = fetcher
        .commits(&reference.owner, &reference.name, COMMIT_WINDOW_DAYS)
        .map_err(|source| PipelineError::Commits {
            repo: full_name.clone(),
            source,
        })?;
    on_stage(1);

    let contributors = fetcher
        .contributors(&reference.owner, &reference.name)
        .map_err(|source| PipelineError::Contributors {
            repo: full_name.clone(),
            source,
        })?;
    on_stage(2);

    let languages = fetcher
        .languages(&reference.owner, &reference.name)
        .map_err(|source| PipelineError::Languages {
            repo: full_name.clone(),
            source,
        })?;
    let file_tree = fetcher
        .file_tree(&reference.owner, &reference.name, &repo.default_branch)
        .map_err(|source| PipelineError::FileTree {
            repo: full_name.clone(),
            source,
        })?;
    on_stage(3);

    let health_score = scoring::health_score(&repo, &commits);
    let (bus_factor, bus_risk) = scoring::bus_factor(&contributors);
    // Releases are not fetched; the maturity heuristic treats them as absent.
    let (maturity_score, maturity_level) =
        scoring::maturity(&repo, commits.len(), contributors.len(), false);
    on_stage(4);

    let result = AnalysisResult {
        repo,
        commits,
        contributors,
        languages,
        file_tree,
        health_score,
        bus_factor,
        bus_risk,
        maturity_score,
        maturity_level,
    };
    on_stage(5);

    Ok(result)
}

/// Analyzes one comparison side. The repository fetch is fail-fast and the
/// error names the side; every later fetch degrades to an empty value.
fn analyze_side(
    fetcher: &dyn RepoFetcher,
    reference: &RepoRef,
    side: CompareSide,
) -> Result<AnalysisResult, PipelineError> {
    let full_name = reference.full_name();

    let repo = fetcher
        .repo(&reference.owner, &reference.name)
        .map_err(|source| PipelineError::CompareSide {
            side,
            repo: full_name.clone(),
            source,
        })?;

    let commits = fetcher
        .commits(&reference.owner, &reference.name, COMMIT_WINDOW_DAYS)
        .unwrap_or_else(|error| {
            tracing::warn!(repo = %full_name, %error, "comparison commit fetch degraded");
            Vec::new()
        });
    let contributors = fetcher
        .contributors(&reference.owner, &reference.name)
        .unwrap_or_else(|error| {
            tracing::warn!(repo = %full_name, %error, "comparison contributor fetch degraded");
            Vec::new()
        });
    let languages = fetcher
        .languages(&reference.owner, &reference.name)
        .unwrap_or_else(|error| {
            tracing::warn!(repo = %full_name, %error, "comparison language fetch degraded");
            Default::default()
        });
    let file_tree = fetcher
        .file_tree(&reference.owner, &reference.name, &repo.default_branch)
        .unwrap_or_else(|error| {
            tracing::warn!(repo = %full_name, %error, "comparison file tree fetch degraded");
            Vec::new()
        });

    let health_score = scoring::health_score(&repo, &commits);
    let (bus_factor, bus_risk) = scoring::bus_factor(&contributors);
    let (maturity_score, maturity_level) =
        scoring::maturity(&repo, commits.len(), contributors.len(), false);

    Ok(AnalysisResult {
        repo,
        commits,
        contributors,
        languages,
        file_tree,
        health_score,
        bus_factor,
        bus_risk,
        maturity_score,
        maturity_level,
    })
}

/// Runs two analysis sequences and pairs their results.
pub fn run_comparison(
    fetcher: &dyn RepoFetcher,
    left: &RepoRef,
    right: &RepoRef,
    mut on_stage: impl FnMut(usize),
) -> Result<CompareResult, PipelineError> {
    let left_result = analyze_side(fetcher, left, CompareSide::Left)?;
    on_stage(0);

    let right_result = analyze_side(fetcher, right, CompareSide::Right)?;
    on_stage(1);

    Ok(CompareResult {
        left: left_result,
        right: right_result,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    use repolens_core::github::{
        Commit, CommitAuthor, CommitDetail, Contributor, Repo, TreeEntry, TreeEntryKind,
    };
    use time::OffsetDateTime;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Step {
        Repo,
        Commits,
        Contributors,
        Languages,
        FileTree,
    }

    struct ScriptedFetcher {
        fail_at: Option<Step>,
        calls: Mutex<Vec<Step>>,
    }

    impl ScriptedFetcher {
        fn new(fail_at: Option<Step>) -> Self {
            Self {
                fail_at,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Step> {
            self.calls.lock().expect("calls lock").clone()
        }

        fn record(&self, step: Step) -> Result<(), FetchError> {
            self.calls.lock().expect("calls lock").push(step);
            if self.fail_at == Some(step) {
                return Err(FetchError::Status {
                    status: 500,
                    url: format!("https://api.github.com/{step:?}"),
                });
            }
            Ok(())
        }
    }

    fn sample_repo(full_name: &str) -> Repo {
        let now = OffsetDateTime::now_utc();
        Repo {
            name: full_name.split('/').next_back().unwrap_or("x").to_string(),
            full_name: full_name.to_string(),
            stars: 100,
            forks: 20,
            open_issues: 5,
            description: Some("sample".to_string()),
            created_at: now - time::Duration::days(400),
            updated_at: now,
            pushed_at: now,
            watchers: 100,
            language: Some("Rust".to_string()),
            fork: false,
            archived: false,
            private: false,
            default_branch: "main".to_string(),
            html_url: format!("https://github.com/{full_name}"),
            clone_url: format!("https://github.com/{full_name}.git"),
        }
    }

    impl RepoFetcher for ScriptedFetcher {
        fn repo(&self, owner: &str, name: &str) -> Result<Repo, FetchError> {
            self.record(Step::Repo)?;
            Ok(sample_repo(&format!("{owner}/{name}")))
        }

        fn commits(&self, _owner: &str, _name: &str, _days: u32) -> Result<Vec<Commit>, FetchError> {
            self.record(Step::Commits)?;
            Ok(vec![Commit {
                sha: "abc".to_string(),
                commit: CommitDetail {
                    author: CommitAuthor {
                        name: Some("dev".to_string()),
                        date: OffsetDateTime::now_utc(),
                    },
                },
            }])
        }

        fn contributors(&self, _owner: &str, _name: &str) -> Result<Vec<Contributor>, FetchError> {
            self.record(Step::Contributors)?;
            Ok(vec![Contributor {
                login: "dev".to_string(),
                commits: 10,
            }])
        }

        fn languages(
            &self,
            _owner: &str,
            _name: &str,
        ) -> Result<BTreeMap<String, u64>, FetchError> {
            self.record(Step::Languages)?;
            let mut languages = BTreeMap::new();
            languages.insert("Rust".to_string(), 1000u64);
            Ok(languages)
        }

        fn file_tree(
            &self,
            _owner: &str,
            _name: &str,
            _branch: &str,
        ) -> Result<Vec<TreeEntry>, FetchError> {
            self.record(Step::FileTree)?;
            Ok(vec![TreeEntry {
                path: "src/main.rs".to_string(),
                kind: TreeEntryKind::Blob,
                size: Some(100),
            }])
        }
    }

    fn reference(value: &str) -> RepoRef {
        RepoRef::parse(value).expect("valid reference")
    }

    #[test]
    fn analysis_assembles_a_complete_result() {
        let fetcher = ScriptedFetcher::new(None);
        let mut stages = Vec::new();

        let result = run_analysis(&fetcher, &reference("acme/widget"), |stage| {
            stages.push(stage)
        })
        .expect("analysis");

        assert_eq!(result.repo.full_name, "acme/widget");
        assert_eq!(result.commits.len(), 1);
        assert_eq!(result.contributors.len(), 1);
        assert_eq!(result.languages.len(), 1);
        assert_eq!(result.file_tree.len(), 1);
        assert_eq!(stages, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn analysis_failure_at_commits_aborts_before_later_fetches() {
        let fetcher = ScriptedFetcher::new(Some(Step::Commits));
        let mut stages = Vec::new();

        let error = run_analysis(&fetcher, &reference("acme/widget"), |stage| {
            stages.push(stage)
        })
        .expect_err("pipeline should fail");

        assert!(matches!(error, PipelineError::Commits { .. }));
        assert!(error.to_string().contains("commits"));
        assert_eq!(stages, vec![0]);
        assert_eq!(fetcher.calls(), vec![Step::Repo, Step::Commits]);
    }

    #[test]
    fn analysis_failure_at_file_tree_aborts_without_result() {
        let fetcher = ScriptedFetcher::new(Some(Step::FileTree));

        let error = run_analysis(&fetcher, &reference("acme/widget"), |_| {})
            .expect_err("pipeline should fail");

        assert!(matches!(error, PipelineError::FileTree { .. }));
        assert!(error.to_string().contains("file tree"));
    }

    #[test]
    fn analysis_failure_at_repo_makes_no_other_calls() {
        let fetcher = ScriptedFetcher::new(Some(Step::Repo));

        let error =
            run_analysis(&fetcher, &reference("acme/widget"), |_| {}).expect_err("should fail");

        assert!(matches!(error, PipelineError::Repo { .. }));
        assert_eq!(fetcher.calls(), vec![Step::Repo]);
    }

    #[test]
    fn comparison_degrades_contributor_failure_to_empty_side() {
        let fetcher = ScriptedFetcher::new(Some(Step::Contributors));

        let result = run_comparison(
            &fetcher,
            &reference("acme/widget"),
            &reference("acme/gadget"),
            |_| {},
        )
        .expect("comparison survives side fetch failure");

        assert_eq!(result.left.contributors.len(), 0);
        assert_eq!(result.left.bus_risk, repolens_core::scoring::BusRisk::Unknown);
        assert_eq!(result.right.contributors.len(), 0);
        assert_eq!(result.left.commits.len(), 1);
    }

    #[test]
    fn comparison_aborts_when_a_side_repo_fetch_fails() {
        let fetcher = ScriptedFetcher::new(Some(Step::Repo));
        let mut stages = Vec::new();

        let error = run_comparison(
            &fetcher,
            &reference("acme/widget"),
            &reference("acme/gadget"),
            |stage| stages.push(stage),
        )
        .expect_err("comparison should fail");

        assert!(matches!(
            error,
            PipelineError::CompareSide {
                side: CompareSide::Left,
                ..
            }
        ));
        assert!(error.to_string().contains("first repository acme/widget"));
        assert!(stages.is_empty());
    }

    #[test]
    fn comparison_emits_one_stage_per_completed_side() {
        let fetcher = ScriptedFetcher::new(None);
        let mut stages = Vec::new();

        run_comparison(
            &fetcher,
            &reference("acme/widget"),
            &reference("acme/gadget"),
            |stage| stages.push(stage),
        )
        .expect("comparison");

        assert_eq!(stages, vec![0, 1]);
    }
}
