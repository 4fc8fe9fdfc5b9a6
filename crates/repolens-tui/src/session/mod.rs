mod keys;
mod render;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

use anyhow::Result;
use repolens_app::pipeline::{ANALYSIS_STAGES, COMPARE_STAGES};
use repolens_app::progress::ProgressTracker;
use repolens_core::export::{self, ExportFormat};
use repolens_core::favorites::{Favorites, favorites_path};
use repolens_core::history::{History, history_path};
use repolens_core::model::{AnalysisResult, CompareResult};
use repolens_core::sanitize::RepoRef;
use time::OffsetDateTime;
use tui_input::Input;

use crate::compare_view::CompareViewState;
use crate::dashboard::DashboardState;
use crate::runner::{PipelineEvent, PipelineRunner};
use crate::theme::Theme;
use crate::tree::TreeViewState;
use crate::ui::loading::LoadingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UiExit {
    Quit,
}

/// Session states. Exactly one is active; `progress` is present iff the
/// state is a loading state, `dashboard` iff Dashboard/Tree, and
/// `compare_view` iff CompareResult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionState {
    Menu,
    Input,
    Loading,
    Dashboard,
    Tree,
    Settings,
    Help,
    History,
    CompareInput,
    CompareLoading,
    CompareResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareStep {
    First,
    Second,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AnalysisType {
    Quick,
    Detailed,
    Custom,
}

impl AnalysisType {
    pub(crate) const ALL: [Self; 3] = [Self::Quick, Self::Detailed, Self::Custom];

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Quick => "Quick",
            Self::Detailed => "Detailed",
            Self::Custom => "Custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HelpTopic {
    Shortcuts,
    GettingStarted,
    Features,
    Troubleshooting,
}

impl HelpTopic {
    pub(crate) const ALL: [Self; 4] = [
        Self::Shortcuts,
        Self::GettingStarted,
        Self::Features,
        Self::Troubleshooting,
    ];

    pub(crate) fn title(self) -> &'static str {
        match self {
            Self::Shortcuts => "Keyboard Shortcuts",
            Self::GettingStarted => "Getting Started",
            Self::Features => "Features",
            Self::Troubleshooting => "Troubleshooting",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SettingsTopic {
    Theme,
    Export,
    Token,
    Reset,
}

impl SettingsTopic {
    pub(crate) const ALL: [Self; 4] = [Self::Theme, Self::Export, Self::Token, Self::Reset];

    pub(crate) fn title(self) -> &'static str {
        match self {
            Self::Theme => "Theme",
            Self::Export => "Export",
            Self::Token => "GitHub Token",
            Self::Reset => "Reset to Defaults",
        }
    }
}

pub(crate) const MENU_ITEMS: [&str; 6] = [
    "Analyze Repository",
    "Compare Repositories",
    "History",
    "Settings",
    "Help",
    "Quit",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmenuKind {
    Analyze,
    Settings,
    Help,
}

impl SubmenuKind {
    fn items(self) -> &'static [&'static str] {
        match self {
            Self::Analyze => &["Quick", "Detailed", "Custom"],
            Self::Settings => &["Theme", "Export", "GitHub Token", "Reset to Defaults"],
            Self::Help => &[
                "Keyboard Shortcuts",
                "Getting Started",
                "Features",
                "Troubleshooting",
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    None,
    StartAnalyze(AnalysisType),
    OpenCompare,
    OpenHistory,
    OpenSettings(SettingsTopic),
    OpenHelp(HelpTopic),
    Quit,
}

#[derive(Debug)]
pub(crate) struct MenuState {
    cursor: usize,
    submenu: Option<(SubmenuKind, usize)>,
}

impl MenuState {
    fn new() -> Self {
        Self {
            cursor: 0,
            submenu: None,
        }
    }

    fn on_key(&mut self, key: crossterm::event::KeyEvent) -> MenuAction {
        use crate::keymap;

        if let Some((kind, cursor)) = &mut self.submenu {
            if keymap::is_back(key) {
                self.submenu = None;
                return MenuAction::None;
            }
            if keymap::is_up(key) {
                *cursor = cursor.saturating_sub(1);
                return MenuAction::None;
            }
            if keymap::is_down(key) {
                if *cursor + 1 < kind.items().len() {
                    *cursor += 1;
                }
                return MenuAction::None;
            }
            if keymap::is_confirm(key) {
                let action = match kind {
                    SubmenuKind::Analyze => MenuAction::StartAnalyze(AnalysisType::ALL[*cursor]),
                    SubmenuKind::Settings => MenuAction::OpenSettings(SettingsTopic::ALL[*cursor]),
                    SubmenuKind::Help => MenuAction::OpenHelp(HelpTopic::ALL[*cursor]),
                };
                self.submenu = None;
                return action;
            }
            return MenuAction::None;
        }

        if keymap::is_quit(key) {
            return MenuAction::Quit;
        }
        if keymap::is_up(key) {
            self.cursor = self.cursor.saturating_sub(1);
            return MenuAction::None;
        }
        if keymap::is_down(key) {
            if self.cursor + 1 < MENU_ITEMS.len() {
                self.cursor += 1;
            }
            return MenuAction::None;
        }
        if keymap::is_confirm(key) {
            return match self.cursor {
                0 => {
                    self.submenu = Some((SubmenuKind::Analyze, 0));
                    MenuAction::None
                }
                1 => MenuAction::OpenCompare,
                2 => MenuAction::OpenHistory,
                3 => {
                    self.submenu = Some((SubmenuKind::Settings, 0));
                    MenuAction::None
                }
                4 => {
                    self.submenu = Some((SubmenuKind::Help, 0));
                    MenuAction::None
                }
                _ => MenuAction::Quit,
            };
        }

        MenuAction::None
    }
}

/// Persistence and export collaborators consumed by the session. Failures
/// never roll back session state; they surface as transient status text.
pub(crate) trait SessionOps {
    fn load_history(&self) -> Result<History>;
    fn save_history(&self, history: &History) -> Result<()>;
    fn load_favorites(&self) -> Result<Favorites>;
    fn save_favorites(&self, favorites: &Favorites) -> Result<()>;
    fn export_analysis(&self, result: &AnalysisResult, format: ExportFormat) -> Result<PathBuf>;
    fn export_compare(&self, result: &CompareResult, format: ExportFormat) -> Result<PathBuf>;
}

pub(crate) struct SystemSessionOps {
    data_dir: PathBuf,
}

impl SystemSessionOps {
    pub(crate) fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }
}

impl SessionOps for SystemSessionOps {
    fn load_history(&self) -> Result<History> {
        Ok(History::load(&history_path(&self.data_dir))?)
    }

    fn save_history(&self, history: &History) -> Result<()> {
        Ok(history.save(&history_path(&self.data_dir))?)
    }

    fn load_favorites(&self) -> Result<Favorites> {
        Ok(Favorites::load(&favorites_path(&self.data_dir))?)
    }

    fn save_favorites(&self, favorites: &Favorites) -> Result<()> {
        Ok(favorites.save(&favorites_path(&self.data_dir))?)
    }

    fn export_analysis(&self, result: &AnalysisResult, format: ExportFormat) -> Result<PathBuf> {
        let dir = std::env::current_dir()?;
        Ok(export::export_analysis(result, format, &dir)?)
    }

    fn export_compare(&self, result: &CompareResult, format: ExportFormat) -> Result<PathBuf> {
        let dir = std::env::current_dir()?;
        Ok(export::export_compare(result, format, &dir)?)
    }
}

pub(crate) struct SessionFlow {
    theme: Theme,
    runner: Arc<dyn PipelineRunner>,
    state: SessionState,
    menu: MenuState,
    analysis_type: AnalysisType,
    primary_input: Input,
    compare_input_a: Input,
    compare_input_b: Input,
    compare_step: CompareStep,
    last_error: Option<String>,
    progress: Option<ProgressTracker>,
    loading: LoadingState,
    loading_label: String,
    dashboard: Option<DashboardState>,
    tree: Option<TreeViewState>,
    compare_view: Option<CompareViewState>,
    history: Option<History>,
    history_cursor: usize,
    help_topic: HelpTopic,
    settings_topic: SettingsTopic,
    events: Option<Receiver<PipelineEvent>>,
    active_token: Option<u64>,
    next_token: u64,
}

impl SessionFlow {
    pub(crate) fn new(runner: Arc<dyn PipelineRunner>, theme: Theme) -> Self {
        Self {
            theme,
            runner,
            state: SessionState::Menu,
            menu: MenuState::new(),
            analysis_type: AnalysisType::Quick,
            primary_input: Input::default(),
            compare_input_a: Input::default(),
            compare_input_b: Input::default(),
            compare_step: CompareStep::First,
            last_error: None,
            progress: None,
            loading: LoadingState::default(),
            loading_label: String::new(),
            dashboard: None,
            tree: None,
            compare_view: None,
            history: None,
            history_cursor: 0,
            help_topic: HelpTopic::Shortcuts,
            settings_topic: SettingsTopic::Theme,
            events: None,
            active_token: None,
            next_token: 1,
        }
    }

    pub(crate) fn should_drain_after_input(&self) -> bool {
        matches!(
            self.state,
            SessionState::Loading | SessionState::CompareLoading
        )
    }

    fn start_analysis(&mut self, reference: RepoRef, use_cache: bool) {
        let token = self.next_token;
        self.next_token += 1;
        self.active_token = Some(token);
        self.loading_label = reference.full_name();
        self.progress = Some(ProgressTracker::new(&ANALYSIS_STAGES));
        self.events = Some(self.runner.spawn_analysis(reference, token, use_cache));
        self.last_error = None;
        self.state = SessionState::Loading;
    }

    fn start_comparison(&mut self, left: RepoRef, right: RepoRef) {
        let token = self.next_token;
        self.next_token += 1;
        self.active_token = Some(token);
        self.loading_label = format!("{} vs {}", left.full_name(), right.full_name());
        self.progress = Some(ProgressTracker::new(&COMPARE_STAGES));
        self.events = Some(self.runner.spawn_comparison(left, right, token));
        self.last_error = None;
        self.state = SessionState::CompareLoading;
    }

    /// Soft cancellation: the background run keeps going, but dropping the
    /// receiver and forgetting the token guarantees its events are ignored.
    fn cancel_pipeline(&mut self) {
        self.events = None;
        self.active_token = None;
        self.progress = None;
    }

    fn fail_pipeline(&mut self, message: String) {
        let was_compare = self.state == SessionState::CompareLoading;
        self.cancel_pipeline();
        self.last_error = Some(message);
        if was_compare {
            self.compare_step = CompareStep::First;
            self.state = SessionState::CompareInput;
        } else {
            self.state = SessionState::Input;
        }
    }

    pub(crate) fn on_tick(&mut self, ops: &dyn SessionOps) {
        if self.should_drain_after_input() {
            self.loading.next_frame();
        }

        let mut events = Vec::new();
        let mut disconnected = false;
        if let Some(receiver) = &self.events {
            loop {
                match receiver.try_recv() {
                    Ok(event) => events.push(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
        }

        for event in events {
            self.apply_event(event, ops);
        }

        if disconnected && self.events.is_some() && self.active_token.is_some() {
            self.fail_pipeline("analysis worker ended unexpectedly".to_string());
        }

        let now = Instant::now();
        if let Some(dashboard) = &mut self.dashboard {
            dashboard.clear_expired_status(now);
        }
        if let Some(compare_view) = &mut self.compare_view {
            compare_view.clear_expired_status(now);
        }
    }

    fn apply_event(&mut self, event: PipelineEvent, ops: &dyn SessionOps) {
        match event {
            PipelineEvent::StageCompleted { token, .. } => {
                if Some(token) == self.active_token
                    && let Some(progress) = &mut self.progress
                {
                    progress.next_stage();
                }
            }
            PipelineEvent::AnalysisDone { token, result } => {
                if Some(token) != self.active_token || self.state != SessionState::Loading {
                    return;
                }
                self.cancel_pipeline();
                match result {
                    Ok(result) => self.finish_analysis(result, ops),
                    Err(message) => {
                        self.last_error = Some(message);
                        self.state = SessionState::Input;
                    }
                }
            }
            PipelineEvent::CompareDone { token, result } => {
                if Some(token) != self.active_token || self.state != SessionState::CompareLoading {
                    return;
                }
                self.cancel_pipeline();
                match result {
                    Ok(result) => {
                        self.compare_view = Some(CompareViewState::new(result));
                        self.last_error = None;
                        self.state = SessionState::CompareResult;
                    }
                    Err(message) => {
                        self.last_error = Some(message);
                        self.compare_step = CompareStep::First;
                        self.state = SessionState::CompareInput;
                    }
                }
            }
        }
    }

    fn finish_analysis(&mut self, result: AnalysisResult, ops: &dyn SessionOps) {
        let full_name = result.repo.full_name.clone();
        let now = OffsetDateTime::now_utc();
        let mut status = None;

        let mut history = self.load_history_via(ops);
        history.add_entry(&result, now);
        if let Err(error) = ops.save_history(&history) {
            tracing::warn!(%error, "failed to save history");
            status = Some(format!("warning: failed to save history: {error}"));
        }
        self.history = Some(history);

        let favorite = match ops.load_favorites() {
            Ok(mut favorites) => {
                let is_favorite = favorites.is_favorite(&full_name);
                if is_favorite {
                    favorites.update_usage(&full_name, now);
                    if let Err(error) = ops.save_favorites(&favorites) {
                        tracing::warn!(%error, "failed to save favorites");
                    }
                }
                is_favorite
            }
            Err(error) => {
                tracing::warn!(%error, "failed to load favorites");
                false
            }
        };

        let mut dashboard = DashboardState::new(result, favorite);
        if let Some(text) = status {
            dashboard.set_status(text, Instant::now());
        }
        self.dashboard = Some(dashboard);
        self.last_error = None;
        self.state = SessionState::Dashboard;
    }

    fn load_history_via(&self, ops: &dyn SessionOps) -> History {
        match ops.load_history() {
            Ok(history) => history,
            Err(error) => {
                tracing::warn!(%error, "failed to load history");
                History::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::mpsc::{self, Sender};

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use repolens_core::github::Repo;
    use repolens_core::scoring::{BusRisk, MaturityLevel};

    use super::*;

    #[derive(Default)]
    struct ScriptedRunner {
        analysis_calls: Mutex<Vec<(RepoRef, u64, bool)>>,
        comparison_calls: Mutex<Vec<(RepoRef, RepoRef, u64)>>,
        senders: Mutex<Vec<Sender<PipelineEvent>>>,
    }

    impl ScriptedRunner {
        fn analysis_call_count(&self) -> usize {
            self.analysis_calls.lock().expect("calls lock").len()
        }

        fn last_analysis_call(&self) -> (RepoRef, u64, bool) {
            self.analysis_calls
                .lock()
                .expect("calls lock")
                .last()
                .cloned()
                .expect("an analysis call")
        }

        fn comparison_call_count(&self) -> usize {
            self.comparison_calls.lock().expect("calls lock").len()
        }

        fn last_comparison_token(&self) -> u64 {
            self.comparison_calls
                .lock()
                .expect("calls lock")
                .last()
                .map(|(_, _, token)| *token)
                .expect("a comparison call")
        }

        fn send(&self, event: PipelineEvent) {
            let sender = self
                .senders
                .lock()
                .expect("senders lock")
                .last()
                .cloned()
                .expect("an active pipeline channel");
            let _ = sender.send(event);
        }
    }

    impl PipelineRunner for ScriptedRunner {
        fn spawn_analysis(
            &self,
            reference: RepoRef,
            token: u64,
            use_cache: bool,
        ) -> Receiver<PipelineEvent> {
            self.analysis_calls
                .lock()
                .expect("calls lock")
                .push((reference, token, use_cache));
            let (sender, receiver) = mpsc::channel();
            self.senders.lock().expect("senders lock").push(sender);
            receiver
        }

        fn spawn_comparison(
            &self,
            left: RepoRef,
            right: RepoRef,
            token: u64,
        ) -> Receiver<PipelineEvent> {
            self.comparison_calls
                .lock()
                .expect("calls lock")
                .push((left, right, token));
            let (sender, receiver) = mpsc::channel();
            self.senders.lock().expect("senders lock").push(sender);
            receiver
        }
    }

    #[derive(Default)]
    struct FakeOps {
        history: Mutex<History>,
        favorites: Mutex<Favorites>,
        history_saves: Mutex<usize>,
        favorite_saves: Mutex<usize>,
        exports: Mutex<Vec<ExportFormat>>,
        compare_exports: Mutex<Vec<ExportFormat>>,
    }

    impl SessionOps for FakeOps {
        fn load_history(&self) -> Result<History> {
            Ok(self.history.lock().expect("history lock").clone())
        }

        fn save_history(&self, history: &History) -> Result<()> {
            *self.history.lock().expect("history lock") = history.clone();
            *self.history_saves.lock().expect("saves lock") += 1;
            Ok(())
        }

        fn load_favorites(&self) -> Result<Favorites> {
            Ok(self.favorites.lock().expect("favorites lock").clone())
        }

        fn save_favorites(&self, favorites: &Favorites) -> Result<()> {
            *self.favorites.lock().expect("favorites lock") = favorites.clone();
            *self.favorite_saves.lock().expect("saves lock") += 1;
            Ok(())
        }

        fn export_analysis(
            &self,
            _result: &AnalysisResult,
            format: ExportFormat,
        ) -> Result<PathBuf> {
            self.exports.lock().expect("exports lock").push(format);
            Ok(PathBuf::from("analysis.json"))
        }

        fn export_compare(
            &self,
            _result: &CompareResult,
            format: ExportFormat,
        ) -> Result<PathBuf> {
            self.compare_exports
                .lock()
                .expect("exports lock")
                .push(format);
            Ok(PathBuf::from("comparison.json"))
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn sample_result(full_name: &str) -> AnalysisResult {
        let now = OffsetDateTime::now_utc();
        AnalysisResult {
            repo: Repo {
                name: full_name.split('/').next_back().unwrap_or("x").to_string(),
                full_name: full_name.to_string(),
                stars: 80,
                forks: 9,
                open_issues: 2,
                description: Some("sample".to_string()),
                created_at: now,
                updated_at: now,
                pushed_at: now,
                watchers: 80,
                language: Some("Rust".to_string()),
                fork: false,
                archived: false,
                private: false,
                default_branch: "main".to_string(),
                html_url: format!("https://github.com/{full_name}"),
                clone_url: format!("https://github.com/{full_name}.git"),
            },
            commits: Vec::new(),
            contributors: Vec::new(),
            languages: BTreeMap::new(),
            file_tree: Vec::new(),
            health_score: 70,
            bus_factor: 1,
            bus_risk: BusRisk::High,
            maturity_score: 50,
            maturity_level: MaturityLevel::Growing,
        }
    }

    fn sample_compare(left: &str, right: &str) -> CompareResult {
        CompareResult {
            left: sample_result(left),
            right: sample_result(right),
        }
    }

    fn new_flow(runner: &Arc<ScriptedRunner>) -> SessionFlow {
        let runner: Arc<dyn PipelineRunner> = Arc::clone(runner) as Arc<dyn PipelineRunner>;
        SessionFlow::new(runner, Theme::from_name(repolens_core::config::ThemeName::Dark))
    }

    fn open_input(flow: &mut SessionFlow, ops: &FakeOps) {
        let _ = flow.on_key(key(KeyCode::Enter), ops);
        let _ = flow.on_key(key(KeyCode::Enter), ops);
        assert_eq!(flow.state, SessionState::Input);
    }

    fn open_compare_input(flow: &mut SessionFlow, ops: &FakeOps) {
        let _ = flow.on_key(key(KeyCode::Down), ops);
        let _ = flow.on_key(key(KeyCode::Enter), ops);
        assert_eq!(flow.state, SessionState::CompareInput);
    }

    fn type_text(flow: &mut SessionFlow, ops: &FakeOps, text: &str) {
        for character in text.chars() {
            let _ = flow.on_key(key(KeyCode::Char(character)), ops);
        }
    }

    #[test]
    fn menu_analyze_submenu_selects_type_and_opens_input() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);

        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        assert_eq!(flow.state, SessionState::Menu);

        let _ = flow.on_key(key(KeyCode::Down), &ops);
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        assert_eq!(flow.state, SessionState::Input);
        assert_eq!(flow.analysis_type, AnalysisType::Detailed);
    }

    #[test]
    fn quit_from_menu_exits() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);

        assert_eq!(flow.on_key(key(KeyCode::Char('q')), &ops), Some(UiExit::Quit));
    }

    #[test]
    fn empty_input_enter_sets_validation_error_without_dispatch() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_input(&mut flow, &ops);

        let _ = flow.on_key(key(KeyCode::Enter), &ops);

        assert_eq!(flow.state, SessionState::Input);
        assert!(flow.last_error.is_some());
        assert_eq!(runner.analysis_call_count(), 0);
    }

    #[test]
    fn input_without_slash_stays_in_input_with_error() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_input(&mut flow, &ops);

        type_text(&mut flow, &ops, "not-a-repo");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);

        assert_eq!(flow.state, SessionState::Input);
        assert!(
            flow.last_error
                .as_deref()
                .is_some_and(|error| error.contains("owner/repo"))
        );
        assert_eq!(runner.analysis_call_count(), 0);
    }

    #[test]
    fn url_input_is_sanitized_before_dispatch() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_input(&mut flow, &ops);

        type_text(&mut flow, &ops, "https://github.com/acme/widget/");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);

        assert_eq!(flow.state, SessionState::Loading);
        let (reference, _, use_cache) = runner.last_analysis_call();
        assert_eq!(reference.full_name(), "acme/widget");
        assert!(use_cache);
    }

    #[test]
    fn successful_analysis_reaches_dashboard_and_appends_history() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_input(&mut flow, &ops);

        type_text(&mut flow, &ops, "octocat/Hello-World");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        assert_eq!(flow.state, SessionState::Loading);
        assert!(flow.progress.is_some());

        let (reference, token, _) = runner.last_analysis_call();
        assert_eq!(reference.full_name(), "octocat/Hello-World");

        runner.send(PipelineEvent::StageCompleted { token, stage: 0 });
        runner.send(PipelineEvent::StageCompleted { token, stage: 1 });
        flow.on_tick(&ops);
        let complete = flow
            .progress
            .as_ref()
            .expect("tracker while loading")
            .stages()
            .iter()
            .filter(|stage| stage.is_complete)
            .count();
        assert_eq!(complete, 2);

        runner.send(PipelineEvent::AnalysisDone {
            token,
            result: Ok(sample_result("octocat/Hello-World")),
        });
        flow.on_tick(&ops);

        assert_eq!(flow.state, SessionState::Dashboard);
        assert!(flow.progress.is_none());
        assert!(flow.last_error.is_none());
        assert_eq!(
            flow.dashboard
                .as_ref()
                .map(|dashboard| dashboard.data.repo.full_name.as_str()),
            Some("octocat/Hello-World")
        );

        let history = ops.history.lock().expect("history lock");
        assert_eq!(history.len(), 1);
        assert_eq!(history.entries[0].repo_name, "octocat/Hello-World");
    }

    #[test]
    fn failed_analysis_returns_to_input_with_error() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_input(&mut flow, &ops);

        type_text(&mut flow, &ops, "acme/widget");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        let (_, token, _) = runner.last_analysis_call();

        runner.send(PipelineEvent::AnalysisDone {
            token,
            result: Err("failed to fetch commits for acme/widget: 500".to_string()),
        });
        flow.on_tick(&ops);

        assert_eq!(flow.state, SessionState::Input);
        assert!(
            flow.last_error
                .as_deref()
                .is_some_and(|error| error.contains("commits"))
        );
        assert!(flow.progress.is_none());
        assert!(ops.history.lock().expect("history lock").is_empty());
    }

    #[test]
    fn stale_token_events_are_dropped() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_input(&mut flow, &ops);

        type_text(&mut flow, &ops, "acme/widget");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);

        runner.send(PipelineEvent::AnalysisDone {
            token: 999,
            result: Ok(sample_result("acme/widget")),
        });
        flow.on_tick(&ops);

        assert_eq!(flow.state, SessionState::Loading);
        assert!(flow.dashboard.is_none());
    }

    #[test]
    fn escape_during_loading_returns_to_menu_and_ignores_late_result() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_input(&mut flow, &ops);

        type_text(&mut flow, &ops, "acme/widget");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        let (_, token, _) = runner.last_analysis_call();

        let _ = flow.on_key(key(KeyCode::Esc), &ops);
        assert_eq!(flow.state, SessionState::Menu);
        assert!(flow.progress.is_none());

        // The abandoned worker finishes anyway; its message goes nowhere.
        runner.send(PipelineEvent::AnalysisDone {
            token,
            result: Ok(sample_result("acme/widget")),
        });
        flow.on_tick(&ops);

        assert_eq!(flow.state, SessionState::Menu);
        assert!(flow.dashboard.is_none());
        assert!(ops.history.lock().expect("history lock").is_empty());
    }

    #[test]
    fn compare_enter_on_empty_first_buffer_does_not_advance() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_compare_input(&mut flow, &ops);

        let _ = flow.on_key(key(KeyCode::Enter), &ops);

        assert_eq!(flow.state, SessionState::CompareInput);
        assert_eq!(flow.compare_step, CompareStep::First);
        assert_eq!(runner.comparison_call_count(), 0);
    }

    #[test]
    fn compare_flow_dispatches_after_both_inputs_and_shows_result() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_compare_input(&mut flow, &ops);

        type_text(&mut flow, &ops, "acme/widget");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        assert_eq!(flow.compare_step, CompareStep::Second);
        assert_eq!(runner.comparison_call_count(), 0);

        type_text(&mut flow, &ops, "acme/gadget");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        assert_eq!(flow.state, SessionState::CompareLoading);
        assert_eq!(runner.comparison_call_count(), 1);

        let token = runner.last_comparison_token();
        runner.send(PipelineEvent::CompareDone {
            token,
            result: Ok(sample_compare("acme/widget", "acme/gadget")),
        });
        flow.on_tick(&ops);

        assert_eq!(flow.state, SessionState::CompareResult);
        assert!(flow.compare_view.is_some());
    }

    #[test]
    fn compare_error_returns_to_first_input_with_error() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_compare_input(&mut flow, &ops);

        type_text(&mut flow, &ops, "acme/widget");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        type_text(&mut flow, &ops, "acme/gadget");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);

        let token = runner.last_comparison_token();
        runner.send(PipelineEvent::CompareDone {
            token,
            result: Err("failed to fetch first repository acme/widget: 404".to_string()),
        });
        flow.on_tick(&ops);

        assert_eq!(flow.state, SessionState::CompareInput);
        assert_eq!(flow.compare_step, CompareStep::First);
        assert!(flow.last_error.is_some());
    }

    #[test]
    fn compare_escape_from_second_step_returns_to_first() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_compare_input(&mut flow, &ops);

        type_text(&mut flow, &ops, "acme/widget");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        assert_eq!(flow.compare_step, CompareStep::Second);

        let _ = flow.on_key(key(KeyCode::Esc), &ops);
        assert_eq!(flow.compare_step, CompareStep::First);
        assert_eq!(flow.state, SessionState::CompareInput);

        let _ = flow.on_key(key(KeyCode::Esc), &ops);
        assert_eq!(flow.state, SessionState::Menu);
    }

    #[test]
    fn history_enter_reanalyzes_selected_entry() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        {
            let mut history = ops.history.lock().expect("history lock");
            history.add_entry(&sample_result("acme/widget"), OffsetDateTime::now_utc());
        }
        let mut flow = new_flow(&runner);

        let _ = flow.on_key(key(KeyCode::Down), &ops);
        let _ = flow.on_key(key(KeyCode::Down), &ops);
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        assert_eq!(flow.state, SessionState::History);

        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        assert_eq!(flow.state, SessionState::Loading);
        let (reference, _, _) = runner.last_analysis_call();
        assert_eq!(reference.full_name(), "acme/widget");
    }

    #[test]
    fn history_delete_and_clear_persist() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        {
            let mut history = ops.history.lock().expect("history lock");
            let now = OffsetDateTime::now_utc();
            history.add_entry(&sample_result("a/b"), now);
            history.add_entry(&sample_result("c/d"), now);
        }
        let mut flow = new_flow(&runner);
        let _ = flow.on_key(key(KeyCode::Down), &ops);
        let _ = flow.on_key(key(KeyCode::Down), &ops);
        let _ = flow.on_key(key(KeyCode::Enter), &ops);

        let _ = flow.on_key(key(KeyCode::Char('d')), &ops);
        assert_eq!(ops.history.lock().expect("history lock").len(), 1);

        let _ = flow.on_key(key(KeyCode::Char('c')), &ops);
        assert!(ops.history.lock().expect("history lock").is_empty());
        assert!(*ops.history_saves.lock().expect("saves lock") >= 2);
    }

    #[test]
    fn dashboard_tree_toggle_and_back() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        flow.dashboard = Some(DashboardState::new(sample_result("acme/widget"), false));
        flow.state = SessionState::Dashboard;

        let _ = flow.on_key(key(KeyCode::Char('f')), &ops);
        assert_eq!(flow.state, SessionState::Tree);
        assert!(flow.tree.is_some());

        let _ = flow.on_key(key(KeyCode::Esc), &ops);
        assert_eq!(flow.state, SessionState::Dashboard);
        assert!(flow.tree.is_none());
        assert!(flow.dashboard.is_some());
    }

    #[test]
    fn dashboard_refresh_dispatches_fresh_run_for_same_repo() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        flow.dashboard = Some(DashboardState::new(sample_result("acme/widget"), false));
        flow.state = SessionState::Dashboard;

        let _ = flow.on_key(key(KeyCode::Char('r')), &ops);

        assert_eq!(flow.state, SessionState::Loading);
        let (reference, _, use_cache) = runner.last_analysis_call();
        assert_eq!(reference.full_name(), "acme/widget");
        assert!(!use_cache);
    }

    #[test]
    fn dashboard_export_records_format() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        flow.dashboard = Some(DashboardState::new(sample_result("acme/widget"), false));
        flow.state = SessionState::Dashboard;

        let _ = flow.on_key(key(KeyCode::Char('e')), &ops);
        let _ = flow.on_key(key(KeyCode::Char('j')), &ops);

        assert_eq!(
            ops.exports.lock().expect("exports lock").as_slice(),
            &[ExportFormat::Json]
        );
        assert_eq!(flow.state, SessionState::Dashboard);
    }

    #[test]
    fn dashboard_favorite_toggle_saves_store() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        flow.dashboard = Some(DashboardState::new(sample_result("acme/widget"), false));
        flow.state = SessionState::Dashboard;

        let _ = flow.on_key(key(KeyCode::Char('b')), &ops);
        assert!(
            ops.favorites
                .lock()
                .expect("favorites lock")
                .is_favorite("acme/widget")
        );
        assert!(flow.dashboard.as_ref().is_some_and(|d| d.favorite));

        let _ = flow.on_key(key(KeyCode::Char('b')), &ops);
        assert!(
            !ops.favorites
                .lock()
                .expect("favorites lock")
                .is_favorite("acme/widget")
        );
    }

    #[test]
    fn dashboard_back_clears_result_and_buffer() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        flow.primary_input = Input::new("acme/widget".to_string());
        flow.dashboard = Some(DashboardState::new(sample_result("acme/widget"), false));
        flow.state = SessionState::Dashboard;

        let _ = flow.on_key(key(KeyCode::Esc), &ops);

        assert_eq!(flow.state, SessionState::Menu);
        assert!(flow.dashboard.is_none());
        assert!(flow.primary_input.value().is_empty());
    }

    #[test]
    fn compare_result_export_and_back() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        flow.compare_view = Some(CompareViewState::new(sample_compare("a/b", "c/d")));
        flow.state = SessionState::CompareResult;

        let _ = flow.on_key(key(KeyCode::Char('m')), &ops);
        assert_eq!(
            ops.compare_exports.lock().expect("exports lock").as_slice(),
            &[ExportFormat::Markdown]
        );

        let _ = flow.on_key(key(KeyCode::Esc), &ops);
        assert_eq!(flow.state, SessionState::Menu);
        assert!(flow.compare_view.is_none());
    }

    #[test]
    fn help_and_settings_escape_back_to_menu() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);

        for _ in 0..4 {
            let _ = flow.on_key(key(KeyCode::Down), &ops);
        }
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        assert_eq!(flow.state, SessionState::Help);
        assert_eq!(flow.help_topic, HelpTopic::Shortcuts);

        let _ = flow.on_key(key(KeyCode::Esc), &ops);
        assert_eq!(flow.state, SessionState::Menu);

        // The menu cursor is still on Help; move up one row to Settings.
        let _ = flow.on_key(key(KeyCode::Up), &ops);
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        let _ = flow.on_key(key(KeyCode::Down), &ops);
        let _ = flow.on_key(key(KeyCode::Enter), &ops);
        assert_eq!(flow.state, SessionState::Settings);
        assert_eq!(flow.settings_topic, SettingsTopic::Export);

        let _ = flow.on_key(key(KeyCode::Char('q')), &ops);
        assert_eq!(flow.state, SessionState::Menu);
    }

    #[test]
    fn worker_disconnect_without_result_fails_the_pipeline() {
        let runner = Arc::new(ScriptedRunner::default());
        let ops = FakeOps::default();
        let mut flow = new_flow(&runner);
        open_input(&mut flow, &ops);

        type_text(&mut flow, &ops, "acme/widget");
        let _ = flow.on_key(key(KeyCode::Enter), &ops);

        runner.senders.lock().expect("senders lock").pop();
        flow.on_tick(&ops);

        assert_eq!(flow.state, SessionState::Input);
        assert!(
            flow.last_error
                .as_deref()
                .is_some_and(|error| error.contains("unexpectedly"))
        );
    }
}
