use crossterm::event::{Event, KeyEvent};
use repolens_core::history::History;
use repolens_core::sanitize::{RepoRef, sanitize_repo_input};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use crate::compare_view::CompareAction;
use crate::dashboard::DashboardAction;
use crate::keymap;
use crate::tree::{TreeAction, TreeViewState};

use super::{
    CompareStep, MenuAction, SessionFlow, SessionOps, SessionState, UiExit,
};

impl SessionFlow {
    pub(crate) fn on_key(&mut self, key: KeyEvent, ops: &dyn SessionOps) -> Option<UiExit> {
        match self.state {
            SessionState::Menu => self.on_menu_key(key, ops),
            SessionState::Input => {
                self.on_input_key(key);
                None
            }
            SessionState::Loading => {
                if keymap::is_back(key) {
                    self.cancel_pipeline();
                    self.state = SessionState::Menu;
                }
                None
            }
            SessionState::CompareInput => {
                self.on_compare_input_key(key);
                None
            }
            SessionState::CompareLoading => {
                if keymap::is_back(key) {
                    self.cancel_pipeline();
                    self.compare_input_a.reset();
                    self.compare_input_b.reset();
                    self.compare_step = CompareStep::First;
                    self.state = SessionState::Menu;
                }
                None
            }
            SessionState::CompareResult => {
                self.on_compare_result_key(key, ops);
                None
            }
            SessionState::History => {
                self.on_history_key(key, ops);
                None
            }
            SessionState::Help | SessionState::Settings => {
                if keymap::is_back(key) || keymap::is_quit(key) {
                    self.state = SessionState::Menu;
                }
                None
            }
            SessionState::Dashboard => {
                self.on_dashboard_key(key, ops);
                None
            }
            SessionState::Tree => {
                let action = match &mut self.tree {
                    Some(tree) => tree.on_key(key),
                    None => TreeAction::Back,
                };
                if action == TreeAction::Back {
                    self.tree = None;
                    self.state = SessionState::Dashboard;
                }
                None
            }
        }
    }

    fn on_menu_key(&mut self, key: KeyEvent, ops: &dyn SessionOps) -> Option<UiExit> {
        match self.menu.on_key(key) {
            MenuAction::None => {}
            MenuAction::Quit => return Some(UiExit::Quit),
            MenuAction::StartAnalyze(analysis_type) => {
                self.analysis_type = analysis_type;
                self.primary_input.reset();
                self.last_error = None;
                self.state = SessionState::Input;
            }
            MenuAction::OpenCompare => {
                self.compare_input_a.reset();
                self.compare_input_b.reset();
                self.compare_step = CompareStep::First;
                self.last_error = None;
                self.state = SessionState::CompareInput;
            }
            MenuAction::OpenHistory => {
                self.history = Some(self.load_history_via(ops));
                self.history_cursor = 0;
                self.state = SessionState::History;
            }
            MenuAction::OpenSettings(topic) => {
                self.settings_topic = topic;
                self.state = SessionState::Settings;
            }
            MenuAction::OpenHelp(topic) => {
                self.help_topic = topic;
                self.state = SessionState::Help;
            }
        }
        None
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        if keymap::is_back(key) {
            self.primary_input.reset();
            self.last_error = None;
            self.state = SessionState::Menu;
            return;
        }

        if keymap::is_confirm(key) {
            let clean = sanitize_repo_input(self.primary_input.value());
            if clean.is_empty() {
                self.last_error =
                    Some("please enter a repository (owner/repo or GitHub URL)".to_string());
                return;
            }
            match RepoRef::parse(&clean) {
                Ok(reference) => {
                    self.primary_input = Input::new(clean);
                    self.start_analysis(reference, true);
                }
                Err(error) => {
                    self.last_error = Some(error.to_string());
                }
            }
            return;
        }

        let _ = self.primary_input.handle_event(&Event::Key(key));
    }

    fn on_compare_input_key(&mut self, key: KeyEvent) {
        if keymap::is_back(key) {
            match self.compare_step {
                CompareStep::Second => {
                    self.compare_step = CompareStep::First;
                }
                CompareStep::First => {
                    self.compare_input_a.reset();
                    self.compare_input_b.reset();
                    self.last_error = None;
                    self.state = SessionState::Menu;
                }
            }
            return;
        }

        if keymap::is_confirm(key) {
            match self.compare_step {
                CompareStep::First => {
                    let clean = sanitize_repo_input(self.compare_input_a.value());
                    if clean.is_empty() {
                        return;
                    }
                    match RepoRef::parse(&clean) {
                        Ok(_) => {
                            self.compare_input_a = Input::new(clean);
                            self.last_error = None;
                            self.compare_step = CompareStep::Second;
                        }
                        Err(error) => {
                            self.last_error = Some(error.to_string());
                        }
                    }
                }
                CompareStep::Second => {
                    let clean_a = sanitize_repo_input(self.compare_input_a.value());
                    let clean_b = sanitize_repo_input(self.compare_input_b.value());
                    if clean_b.is_empty() {
                        return;
                    }
                    let left = match RepoRef::parse(&clean_a) {
                        Ok(reference) => reference,
                        Err(error) => {
                            self.last_error = Some(format!("first repository: {error}"));
                            self.compare_step = CompareStep::First;
                            return;
                        }
                    };
                    let right = match RepoRef::parse(&clean_b) {
                        Ok(reference) => reference,
                        Err(error) => {
                            self.last_error = Some(format!("second repository: {error}"));
                            return;
                        }
                    };
                    self.compare_input_a = Input::new(clean_a);
                    self.compare_input_b = Input::new(clean_b);
                    self.start_comparison(left, right);
                }
            }
            return;
        }

        let buffer = match self.compare_step {
            CompareStep::First => &mut self.compare_input_a,
            CompareStep::Second => &mut self.compare_input_b,
        };
        let _ = buffer.handle_event(&Event::Key(key));
    }

    fn on_compare_result_key(&mut self, key: KeyEvent, ops: &dyn SessionOps) {
        let action = match &mut self.compare_view {
            Some(view) => view.on_key(key),
            None => CompareAction::Back,
        };

        match action {
            CompareAction::None => {}
            CompareAction::Back => {
                self.compare_view = None;
                self.compare_input_a.reset();
                self.compare_input_b.reset();
                self.compare_step = CompareStep::First;
                self.state = SessionState::Menu;
            }
            CompareAction::Export(format) => {
                let Some(view) = &mut self.compare_view else {
                    return;
                };
                let now = std::time::Instant::now();
                match ops.export_compare(&view.data, format) {
                    Ok(path) => {
                        view.set_status(format!("Exported to {}", path.display()), now);
                    }
                    Err(error) => {
                        tracing::warn!(%error, "comparison export failed");
                        view.set_status(format!("export failed: {error}"), now);
                    }
                }
            }
        }
    }

    fn on_history_key(&mut self, key: KeyEvent, ops: &dyn SessionOps) {
        if keymap::is_back(key) || keymap::is_quit(key) {
            self.state = SessionState::Menu;
            return;
        }

        let entry_count = self.history.as_ref().map(History::len).unwrap_or(0);

        if keymap::is_up(key) {
            self.history_cursor = self.history_cursor.saturating_sub(1);
            return;
        }
        if keymap::is_down(key) {
            if self.history_cursor + 1 < entry_count {
                self.history_cursor += 1;
            }
            return;
        }

        if keymap::is_confirm(key) {
            let repo_name = self
                .history
                .as_ref()
                .and_then(|history| history.entries.get(self.history_cursor))
                .map(|entry| entry.repo_name.clone());
            if let Some(repo_name) = repo_name
                && let Ok(reference) = RepoRef::parse(&repo_name)
            {
                self.primary_input = Input::new(repo_name);
                self.start_analysis(reference, true);
            }
            return;
        }

        if let crossterm::event::KeyCode::Char('d') = key.code {
            if let Some(history) = &mut self.history
                && self.history_cursor < history.len()
            {
                history.remove(self.history_cursor);
                if self.history_cursor >= history.len() && self.history_cursor > 0 {
                    self.history_cursor -= 1;
                }
                if let Err(error) = ops.save_history(history) {
                    tracing::warn!(%error, "failed to save history");
                }
            }
            return;
        }

        if let crossterm::event::KeyCode::Char('c') = key.code
            && let Some(history) = &mut self.history
        {
            history.clear();
            self.history_cursor = 0;
            if let Err(error) = ops.save_history(history) {
                tracing::warn!(%error, "failed to save history");
            }
        }
    }

    fn on_dashboard_key(&mut self, key: KeyEvent, ops: &dyn SessionOps) {
        let action = match &mut self.dashboard {
            Some(dashboard) => dashboard.on_key(key),
            None => DashboardAction::BackToMenu,
        };

        match action {
            DashboardAction::None => {}
            DashboardAction::BackToMenu => {
                self.dashboard = None;
                self.tree = None;
                self.primary_input.reset();
                self.state = SessionState::Menu;
            }
            DashboardAction::SwitchToTree => {
                if let Some(dashboard) = &self.dashboard {
                    self.tree = Some(TreeViewState::from_result(&dashboard.data));
                    self.state = SessionState::Tree;
                }
            }
            DashboardAction::Refresh => {
                let reference = self
                    .dashboard
                    .as_ref()
                    .and_then(|dashboard| RepoRef::parse(&dashboard.data.repo.full_name).ok());
                if let Some(reference) = reference {
                    self.dashboard = None;
                    self.tree = None;
                    self.start_analysis(reference, false);
                }
            }
            DashboardAction::Export(format) => {
                let Some(dashboard) = &mut self.dashboard else {
                    return;
                };
                let now = std::time::Instant::now();
                match ops.export_analysis(&dashboard.data, format) {
                    Ok(path) => {
                        dashboard.set_status(format!("Exported to {}", path.display()), now);
                    }
                    Err(error) => {
                        tracing::warn!(%error, "analysis export failed");
                        dashboard.set_status(format!("export failed: {error}"), now);
                    }
                }
            }
            DashboardAction::ToggleFavorite => self.toggle_favorite(ops),
        }
    }

    fn toggle_favorite(&mut self, ops: &dyn SessionOps) {
        let Some(dashboard) = &mut self.dashboard else {
            return;
        };
        let full_name = dashboard.data.repo.full_name.clone();
        let now = std::time::Instant::now();

        let mut favorites = match ops.load_favorites() {
            Ok(favorites) => favorites,
            Err(error) => {
                tracing::warn!(%error, "failed to load favorites");
                dashboard.set_status(format!("favorites unavailable: {error}"), now);
                return;
            }
        };

        let favored = if favorites.is_favorite(&full_name) {
            favorites.remove(&full_name);
            false
        } else {
            favorites.add(&full_name, time::OffsetDateTime::now_utc());
            true
        };

        match ops.save_favorites(&favorites) {
            Ok(()) => {
                dashboard.favorite = favored;
                let verb = if favored { "Added to" } else { "Removed from" };
                dashboard.set_status(format!("{verb} favorites"), now);
            }
            Err(error) => {
                tracing::warn!(%error, "failed to save favorites");
                dashboard.set_status(format!("failed to save favorites: {error}"), now);
            }
        }
    }
}
