use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span};
use repolens_core::export::ExportFormat;
use repolens_core::model::AnalysisResult;
use repolens_core::scoring;
use time::OffsetDateTime;

use crate::keymap;
use crate::theme::Theme;
use crate::ui::TransientStatus;
use crate::ui::text::{
    bar, compact_hint, key_hint_height, key_hint_paragraph, label_value_line, styled_line,
    wrapped_paragraph,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DashboardView {
    Overview,
    Repo,
    Languages,
    Activity,
    Contributors,
    Recruiter,
    ApiStatus,
}

const VIEWS: [DashboardView; 7] = [
    DashboardView::Overview,
    DashboardView::Repo,
    DashboardView::Languages,
    DashboardView::Activity,
    DashboardView::Contributors,
    DashboardView::Recruiter,
    DashboardView::ApiStatus,
];

impl DashboardView {
    fn title(self) -> &'static str {
        match self {
            Self::Overview => "Overview",
            Self::Repo => "Repo",
            Self::Languages => "Languages",
            Self::Activity => "Activity",
            Self::Contributors => "Contributors",
            Self::Recruiter => "Recruiter",
            Self::ApiStatus => "API",
        }
    }

    fn index(self) -> usize {
        VIEWS
            .iter()
            .position(|view| *view == self)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DashboardAction {
    None,
    BackToMenu,
    SwitchToTree,
    Refresh,
    Export(ExportFormat),
    ToggleFavorite,
}

#[derive(Debug)]
pub(crate) struct DashboardState {
    pub(crate) data: AnalysisResult,
    view: DashboardView,
    show_export: bool,
    status: Option<TransientStatus>,
    pub(crate) favorite: bool,
}

impl DashboardState {
    pub(crate) fn new(data: AnalysisResult, favorite: bool) -> Self {
        Self {
            data,
            view: DashboardView::Overview,
            show_export: false,
            status: None,
            favorite,
        }
    }

    pub(crate) fn set_status(&mut self, text: String, now: Instant) {
        self.status = Some(TransientStatus::new(text, now));
    }

    pub(crate) fn clear_expired_status(&mut self, now: Instant) {
        if self
            .status
            .as_ref()
            .is_some_and(|status| status.is_expired(now))
        {
            self.status = None;
        }
    }

    #[cfg(test)]
    pub(crate) fn view(&self) -> DashboardView {
        self.view
    }

    #[cfg(test)]
    pub(crate) fn export_panel_open(&self) -> bool {
        self.show_export
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> DashboardAction {
        if self.show_export {
            match key.code {
                KeyCode::Char('j') => return DashboardAction::Export(ExportFormat::Json),
                KeyCode::Char('m') => return DashboardAction::Export(ExportFormat::Markdown),
                KeyCode::Char('e') | KeyCode::Esc | KeyCode::Char('q') => {
                    self.show_export = false;
                }
                _ => {}
            }
            return DashboardAction::None;
        }

        match key.code {
            KeyCode::Char('e') => {
                self.show_export = true;
            }
            KeyCode::Char('f') => return DashboardAction::SwitchToTree,
            KeyCode::Char('r') => return DashboardAction::Refresh,
            KeyCode::Char('b') => return DashboardAction::ToggleFavorite,
            KeyCode::Char(digit @ '1'..='7') => {
                let index = digit as usize - '1' as usize;
                self.view = VIEWS[index];
            }
            _ if keymap::is_right(key) => {
                let next = (self.view.index() + 1).min(VIEWS.len() - 1);
                self.view = VIEWS[next];
            }
            _ if keymap::is_left(key) => {
                let previous = self.view.index().saturating_sub(1);
                self.view = VIEWS[previous];
            }
            KeyCode::Esc | KeyCode::Char('q') => {
                if self.view != DashboardView::Overview {
                    self.view = DashboardView::Overview;
                } else {
                    return DashboardAction::BackToMenu;
                }
            }
            _ => {}
        }

        DashboardAction::None
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>, theme: &Theme) {
        let area = frame.area();
        let key_text = compact_hint(
            area.width,
            "←→/hl: switch view    1-7: jump    e: export    f: file tree    r: refresh    b: favorite    q/Esc: back",
            "←→/hl: view    1-7: jump    e: export    f: tree    r: refresh    q: back",
            "hl view | e export | f tree | r refresh | q back",
        );
        let footer_height = key_hint_height(area.width, key_text);
        let status_height = if self.status.is_some() { 1 } else { 0 };
        let export_height = if self.show_export { 4 } else { 0 };

        let [tabs_area, body_area, status_area, export_area, footer_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(status_height),
                Constraint::Length(export_height),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        self.render_tabs(frame, theme, tabs_area);

        let (title, lines) = match self.view {
            DashboardView::Overview => ("Overview".to_string(), self.overview_lines(theme)),
            DashboardView::Repo => ("Repository Details".to_string(), self.repo_lines(theme)),
            DashboardView::Languages => ("Languages".to_string(), self.language_lines(theme)),
            DashboardView::Activity => (
                "Commit Activity (Last 30 Days)".to_string(),
                self.activity_lines(theme),
            ),
            DashboardView::Contributors => {
                ("Top Contributors".to_string(), self.contributor_lines(theme))
            }
            DashboardView::Recruiter => {
                ("Recruiter Summary".to_string(), self.recruiter_lines(theme))
            }
            DashboardView::ApiStatus => {
                ("GitHub API Status".to_string(), self.api_status_lines(theme))
            }
        };

        let header = format!("{} — {}", self.data.repo.full_name, title);
        frame.render_widget(
            wrapped_paragraph(ratatui::text::Text::from(lines))
                .block(theme.chrome(styled_line(header, theme.focus_prompt()))),
            body_area,
        );

        if let Some(status) = &self.status {
            frame.render_widget(
                wrapped_paragraph(styled_line(status.text.clone(), theme.success_prompt())),
                status_area,
            );
        }

        if self.show_export {
            frame.render_widget(
                wrapped_paragraph(ratatui::text::Text::from(vec![Line::from(
                    "[J] JSON    [M] Markdown",
                )]))
                .block(theme.chrome(styled_line("Export", theme.focus_prompt()))),
                export_area,
            );
        }

        frame.render_widget(
            key_hint_paragraph(key_text).block(theme.key_block()),
            footer_area,
        );
    }

    fn render_tabs(&self, frame: &mut Frame<'_>, theme: &Theme, area: ratatui::layout::Rect) {
        let mut spans = Vec::new();
        for (index, view) in VIEWS.iter().enumerate() {
            let label = format!(" {}:{} ", index + 1, view.title());
            if *view == self.view {
                spans.push(Span::styled(label, theme.tab_active()));
            } else {
                spans.push(Span::styled(label, theme.secondary_text()));
            }
            if index + 1 < VIEWS.len() {
                spans.push(Span::raw("│"));
            }
        }
        frame.render_widget(
            wrapped_paragraph(Line::from(spans)).block(theme.chrome("Views")),
            area,
        );
    }

    fn overview_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let data = &self.data;
        let mut lines = vec![
            label_value_line(
                "Health Score",
                format!(
                    "{}/100 ({})",
                    data.health_score,
                    scoring::health_status(data.health_score)
                ),
                theme.secondary_text(),
            ),
            label_value_line(
                "Bus Factor",
                format!("{} ({})", data.bus_factor, data.bus_risk),
                theme.secondary_text(),
            ),
            label_value_line(
                "Maturity",
                format!("{} ({})", data.maturity_level, data.maturity_score),
                theme.secondary_text(),
            ),
            label_value_line(
                "Primary Language",
                data.primary_language().to_string(),
                theme.secondary_text(),
            ),
        ];
        if self.favorite {
            lines.push(styled_line("★ Favorited", theme.success_prompt()));
        }
        lines.push(Line::from(""));
        lines.push(styled_line("Recent activity", theme.focus_prompt()));
        lines.extend(self.chart_lines(10));
        lines
    }

    fn repo_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let repo = &self.data.repo;
        vec![
            label_value_line("Name", repo.full_name.clone(), theme.secondary_text()),
            label_value_line(
                "Description",
                repo.description.clone().unwrap_or_else(|| "-".to_string()),
                theme.secondary_text(),
            ),
            label_value_line("Stars", repo.stars.to_string(), theme.secondary_text()),
            label_value_line("Forks", repo.forks.to_string(), theme.secondary_text()),
            label_value_line(
                "Open Issues",
                repo.open_issues.to_string(),
                theme.secondary_text(),
            ),
            label_value_line(
                "Created",
                repolens_core::time::format_date(repo.created_at),
                theme.secondary_text(),
            ),
            label_value_line(
                "Last Push",
                repolens_core::time::format_date(repo.pushed_at),
                theme.secondary_text(),
            ),
            label_value_line(
                "Default Branch",
                repo.default_branch.clone(),
                theme.secondary_text(),
            ),
            label_value_line("URL", repo.html_url.clone(), theme.secondary_text()),
        ]
    }

    fn language_lines(&self, _theme: &Theme) -> Vec<Line<'static>> {
        let languages = &self.data.languages;
        if languages.is_empty() {
            return vec![Line::from("No language data available")];
        }

        let total: u64 = languages.values().sum();
        let mut sorted: Vec<(&String, &u64)> = languages.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(a.1));

        sorted
            .into_iter()
            .map(|(name, bytes)| {
                let percent = if total > 0 {
                    *bytes as f64 / total as f64 * 100.0
                } else {
                    0.0
                };
                Line::from(format!(
                    "{name:<15} {} {percent:.1}%",
                    bar(*bytes, total, 20)
                ))
            })
            .collect()
    }

    fn chart_lines(&self, days: i64) -> Vec<Line<'static>> {
        let activity = scoring::commits_per_day(&self.data.commits);
        let now = OffsetDateTime::now_utc();

        let window: Vec<(String, u32)> = (0..days)
            .rev()
            .map(|offset| {
                let date = repolens_core::time::format_date(now - time::Duration::days(offset));
                let count = activity.get(&date).copied().unwrap_or(0);
                (date, count)
            })
            .collect();

        let max = window.iter().map(|(_, count)| *count).max().unwrap_or(0);
        window
            .into_iter()
            .map(|(date, count)| {
                Line::from(format!(
                    "{date} {} {count}",
                    bar(u64::from(count), u64::from(max), 20)
                ))
            })
            .collect()
    }

    fn activity_lines(&self, _theme: &Theme) -> Vec<Line<'static>> {
        let mut lines = self.chart_lines(30);
        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "Total Commits (1 year): {}",
            self.data.commits.len()
        )));
        lines
    }

    fn contributor_lines(&self, _theme: &Theme) -> Vec<Line<'static>> {
        let contributors = &self.data.contributors;
        if contributors.is_empty() {
            return vec![Line::from("No contributor data available")];
        }

        let max = contributors
            .iter()
            .map(|contributor| contributor.commits)
            .max()
            .unwrap_or(0);
        let mut lines: Vec<Line<'static>> = contributors
            .iter()
            .take(15)
            .enumerate()
            .map(|(index, contributor)| {
                Line::from(format!(
                    "{:>2}. {:<20} {} {}",
                    index + 1,
                    contributor.login,
                    bar(contributor.commits, max, 20),
                    contributor.commits
                ))
            })
            .collect();

        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "Total Contributors: {}",
            contributors.len()
        )));
        lines
    }

    fn recruiter_lines(&self, theme: &Theme) -> Vec<Line<'static>> {
        let data = &self.data;
        vec![
            label_value_line(
                "Repository",
                data.repo.full_name.clone(),
                theme.secondary_text(),
            ),
            label_value_line("Stars", data.repo.stars.to_string(), theme.secondary_text()),
            label_value_line("Forks", data.repo.forks.to_string(), theme.secondary_text()),
            label_value_line(
                "Commits (1y)",
                data.commits.len().to_string(),
                theme.secondary_text(),
            ),
            label_value_line(
                "Contributors",
                data.contributors.len().to_string(),
                theme.secondary_text(),
            ),
            label_value_line(
                "Maturity",
                format!("{} ({})", data.maturity_level, data.maturity_score),
                theme.secondary_text(),
            ),
            label_value_line(
                "Bus Factor",
                format!("{} - {}", data.bus_factor, data.bus_risk),
                theme.secondary_text(),
            ),
            label_value_line(
                "Activity",
                scoring::activity_level(data.commits.len()).to_string(),
                theme.secondary_text(),
            ),
            label_value_line(
                "Health Score",
                format!("{}/100", data.health_score),
                theme.secondary_text(),
            ),
        ]
    }

    fn api_status_lines(&self, _theme: &Theme) -> Vec<Line<'static>> {
        let data = &self.data;
        // Heuristic from the fetched data only; the session has no client handle.
        let mode = if data.repo.private || data.contributors.len() > 30 {
            "Authenticated (5000 req/hour)"
        } else {
            "Unauthenticated (60 req/hour)"
        };

        vec![
            Line::from(format!("Mode: {mode}")),
            Line::from(""),
            Line::from("Data fetched:"),
            Line::from(format!("  Commits (1 year): {}", data.commits.len())),
            Line::from(format!("  Contributors: {}", data.contributors.len())),
            Line::from(format!("  Languages: {}", data.languages.len())),
            Line::from(format!("  File tree entries: {}", data.file_tree.len())),
            Line::from(""),
            Line::from("Tip: set GITHUB_TOKEN for higher rate limits (5000/hour)"),
        ]
    }
}
