use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use repolens_app::App;
use repolens_core::cache::Cache;
use repolens_core::github::RepoFetcher;
use repolens_core::model::{AnalysisResult, CompareResult};
use repolens_core::sanitize::RepoRef;

/// Everything a background pipeline run may tell the session. Each run is
/// stamped with a generation token; the session ignores events from any
/// run it is no longer waiting for.
#[derive(Debug)]
pub(crate) enum PipelineEvent {
    StageCompleted {
        token: u64,
        stage: usize,
    },
    AnalysisDone {
        token: u64,
        result: Result<AnalysisResult, String>,
    },
    CompareDone {
        token: u64,
        result: Result<CompareResult, String>,
    },
}

/// Spawns pipeline runs off the event loop. The production implementation
/// uses one thread per run; tests script the channel directly.
pub(crate) trait PipelineRunner: Send + Sync {
    fn spawn_analysis(
        &self,
        reference: RepoRef,
        token: u64,
        use_cache: bool,
    ) -> Receiver<PipelineEvent>;

    fn spawn_comparison(
        &self,
        left: RepoRef,
        right: RepoRef,
        token: u64,
    ) -> Receiver<PipelineEvent>;
}

pub(crate) struct SystemPipelineRunner {
    fetcher: Arc<dyn RepoFetcher>,
    cache: Option<Cache>,
}

impl SystemPipelineRunner {
    pub(crate) fn new(fetcher: Arc<dyn RepoFetcher>, cache: Option<Cache>) -> Self {
        Self { fetcher, cache }
    }

    fn build_app<'a>(fetcher: &'a dyn RepoFetcher, cache: Option<Cache>) -> App<'a> {
        match cache {
            Some(cache) => App::with_cache(fetcher, cache),
            None => App::new(fetcher),
        }
    }
}

impl PipelineRunner for SystemPipelineRunner {
    fn spawn_analysis(
        &self,
        reference: RepoRef,
        token: u64,
        use_cache: bool,
    ) -> Receiver<PipelineEvent> {
        let (sender, receiver) = mpsc::channel();
        let fetcher = Arc::clone(&self.fetcher);
        let cache = self.cache.clone();

        std::thread::spawn(move || {
            let app = Self::build_app(fetcher.as_ref(), cache);
            let stage_sender = sender.clone();
            let result = app.analyze(&reference, use_cache, |stage| {
                let _ = stage_sender.send(PipelineEvent::StageCompleted { token, stage });
            });
            let _ = sender.send(PipelineEvent::AnalysisDone {
                token,
                result: result.map_err(|error| error.to_string()),
            });
        });

        receiver
    }

    fn spawn_comparison(
        &self,
        left: RepoRef,
        right: RepoRef,
        token: u64,
    ) -> Receiver<PipelineEvent> {
        let (sender, receiver) = mpsc::channel();
        let fetcher = Arc::clone(&self.fetcher);
        let cache = self.cache.clone();

        std::thread::spawn(move || {
            let app = Self::build_app(fetcher.as_ref(), cache);
            let stage_sender = sender.clone();
            let result = app.compare(&left, &right, |stage| {
                let _ = stage_sender.send(PipelineEvent::StageCompleted { token, stage });
            });
            let _ = sender.send(PipelineEvent::CompareDone {
                token,
                result: result.map_err(|error| error.to_string()),
            });
        });

        receiver
    }
}
