mod compare_view;
mod dashboard;
mod history_view;
mod keymap;
mod runner;
mod session;
mod theme;
mod tree;
mod ui;

use std::io::{Stdout, stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use repolens_core::cache::{Cache, cache_dir};
use repolens_core::config::RepolensConfig;
use repolens_core::github::{GithubClient, RepoFetcher};

use crate::runner::{PipelineRunner, SystemPipelineRunner};
use crate::session::{SessionFlow, SessionOps, SystemSessionOps, UiExit};
use crate::theme::Theme;

const TICK_RATE: Duration = Duration::from_millis(120);

/// Runs the interactive session until the user quits.
pub fn run(config: &RepolensConfig) -> Result<()> {
    let data_dir = repolens_core::paths::data_dir().context("failed to resolve data directory")?;

    let fetcher: Arc<dyn RepoFetcher> = Arc::new(GithubClient::from_env());
    let cache = config
        .cache
        .enabled
        .then(|| Cache::new(cache_dir(&data_dir), config.cache.ttl_hours));
    let runner: Arc<dyn PipelineRunner> = Arc::new(SystemPipelineRunner::new(fetcher, cache));
    let ops = SystemSessionOps::new(data_dir);
    let theme = Theme::from_name(config.ui.theme);

    run_root(runner, &ops, theme)
}

fn run_root(runner: Arc<dyn PipelineRunner>, ops: &dyn SessionOps, theme: Theme) -> Result<()> {
    let mut session = TerminalSession::enter()?;
    let mut flow = SessionFlow::new(runner, theme);

    loop {
        session.draw(|frame| flow.render(frame))?;

        let has_event = event::poll(TICK_RATE).context("failed to poll terminal event")?;
        if !has_event {
            flow.on_tick(ops);
            continue;
        }

        let event = event::read().context("failed to read terminal event")?;
        let key = match event {
            Event::Resize(_, _) => {
                session.autoresize()?;
                continue;
            }
            Event::Key(key) if matches!(key.kind, KeyEventKind::Press) => key,
            _ => continue,
        };

        if is_ctrl_c(key) {
            return Ok(());
        }

        if let Some(UiExit::Quit) = flow.on_key(key, ops) {
            return Ok(());
        }

        if flow.should_drain_after_input() {
            flow.on_tick(ops);
        }
    }
}

pub(crate) struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    pub(crate) fn enter() -> Result<Self> {
        enable_raw_mode().context("failed to enable raw mode")?;

        if let Err(error) = {
            let mut out = stdout();
            execute!(out, EnterAlternateScreen, Hide).context("failed to enter alternate screen")
        } {
            let _ = disable_raw_mode();
            return Err(error);
        }

        let backend = CrosstermBackend::new(stdout());
        match Terminal::new(backend).context("failed to create terminal backend") {
            Ok(terminal) => Ok(Self { terminal }),
            Err(error) => {
                let mut out = stdout();
                let _ = execute!(out, Show, LeaveAlternateScreen);
                let _ = disable_raw_mode();
                Err(error)
            }
        }
    }

    pub(crate) fn draw<F>(&mut self, draw_fn: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame<'_>),
    {
        self.terminal
            .draw(draw_fn)
            .context("failed to render terminal")?;
        Ok(())
    }

    pub(crate) fn autoresize(&mut self) -> Result<()> {
        self.terminal
            .autoresize()
            .context("failed to autoresize terminal")?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(self.terminal.backend_mut(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

pub(crate) fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && key.code == crossterm::event::KeyCode::Char('c')
}

pub(crate) fn centered_rect(
    percent_x: u16,
    percent_y: u16,
    area: ratatui::layout::Rect,
) -> ratatui::layout::Rect {
    let pct_x = percent_x.min(100);
    let pct_y = percent_y.min(100);

    let [_, vertical, _] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - pct_y) / 2),
            Constraint::Percentage(pct_y),
            Constraint::Percentage((100 - pct_y) / 2),
        ])
        .areas(area);
    let [_, horizontal, _] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - pct_x) / 2),
            Constraint::Percentage(pct_x),
            Constraint::Percentage((100 - pct_x) / 2),
        ])
        .areas(vertical);
    horizontal
}
