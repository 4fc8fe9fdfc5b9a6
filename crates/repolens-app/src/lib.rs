pub mod pipeline;
pub mod progress;

use repolens_core::cache::Cache;
use repolens_core::github::RepoFetcher;
use repolens_core::model::{AnalysisResult, CompareResult};
use repolens_core::sanitize::RepoRef;
use time::OffsetDateTime;

use crate::pipeline::PipelineError;

/// Use-case facade over the fetcher and the optional result cache.
pub struct App<'a> {
    pub fetcher: &'a dyn RepoFetcher,
    cache: Option<Cache>,
}

impl<'a> App<'a> {
    pub fn new(fetcher: &'a dyn RepoFetcher) -> Self {
        Self {
            fetcher,
            cache: None,
        }
    }

    pub fn with_cache(fetcher: &'a dyn RepoFetcher, cache: Cache) -> Self {
        Self {
            fetcher,
            cache: Some(cache),
        }
    }

    /// Runs the analysis pipeline, consulting the cache first unless the
    /// caller asks for fresh data. Cache write failures are logged and
    /// otherwise ignored.
    pub fn analyze(
        &self,
        reference: &RepoRef,
        use_cache: bool,
        on_stage: impl FnMut(usize),
    ) -> Result<AnalysisResult, PipelineError> {
        let full_name = reference.full_name();

        if use_cache
            && let Some(cache) = &self.cache
            && let Some(hit) = cache.get(&full_name, OffsetDateTime::now_utc())
        {
            tracing::debug!(repo = %full_name, "analysis served from cache");
            return Ok(hit);
        }

        let result = pipeline::run_analysis(self.fetcher, reference, on_stage)?;

        if let Some(cache) = &self.cache
            && let Err(error) = cache.put(&full_name, &result, OffsetDateTime::now_utc())
        {
            tracing::warn!(repo = %full_name, %error, "failed to cache analysis");
        }

        Ok(result)
    }

    pub fn compare(
        &self,
        left: &RepoRef,
        right: &RepoRef,
        on_stage: impl FnMut(usize),
    ) -> Result<CompareResult, PipelineError> {
        pipeline::run_comparison(self.fetcher, left, right, on_stage)
    }
}
