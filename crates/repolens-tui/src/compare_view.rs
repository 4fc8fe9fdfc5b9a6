use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::Line;
use repolens_core::export::ExportFormat;
use repolens_core::model::CompareResult;

use crate::theme::Theme;
use crate::ui::TransientStatus;
use crate::ui::text::{
    compact_hint, key_hint_height, key_hint_paragraph, styled_line, wrapped_paragraph,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompareAction {
    None,
    Back,
    Export(ExportFormat),
}

#[derive(Debug)]
pub(crate) struct CompareViewState {
    pub(crate) data: CompareResult,
    status: Option<TransientStatus>,
}

impl CompareViewState {
    pub(crate) fn new(data: CompareResult) -> Self {
        Self { data, status: None }
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

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> CompareAction {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => CompareAction::Back,
            KeyCode::Char('j') => CompareAction::Export(ExportFormat::Json),
            KeyCode::Char('m') => CompareAction::Export(ExportFormat::Markdown),
            _ => CompareAction::None,
        }
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>, theme: &Theme) {
        let area = frame.area();
        let key_text = compact_hint(
            area.width,
            "j: export JSON    m: export Markdown    q/Esc: back to menu",
            "j: JSON    m: Markdown    q/Esc: back",
            "j JSON | m Markdown | Esc back",
        );
        let footer_height = key_hint_height(area.width, key_text);
        let status_height = if self.status.is_some() { 1 } else { 0 };

        let [body_area, status_area, footer_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(8),
                Constraint::Length(status_height),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        let left = &self.data.left;
        let right = &self.data.right;
        let title = format!(
            "Comparison: {} vs {}",
            left.repo.full_name, right.repo.full_name
        );

        let mut lines = vec![
            Line::from(format!(
                "{:<20} │ {:<25} │ {:<25}",
                "Metric", left.repo.full_name, right.repo.full_name
            )),
            Line::from("─".repeat(76)),
            Line::from(format!(
                "{:<20} │ {:<25} │ {:<25}",
                "Stars", left.repo.stars, right.repo.stars
            )),
            Line::from(format!(
                "{:<20} │ {:<25} │ {:<25}",
                "Forks", left.repo.forks, right.repo.forks
            )),
            Line::from(format!(
                "{:<20} │ {:<25} │ {:<25}",
                "Commits (1y)",
                left.commits.len(),
                right.commits.len()
            )),
            Line::from(format!(
                "{:<20} │ {:<25} │ {:<25}",
                "Contributors",
                left.contributors.len(),
                right.contributors.len()
            )),
            Line::from(format!(
                "{:<20} │ {:<25} │ {:<25}",
                "Health Score", left.health_score, right.health_score
            )),
            Line::from(format!(
                "{:<20} │ {:<25} │ {:<25}",
                "Bus Factor",
                format!("{} ({})", left.bus_factor, left.bus_risk),
                format!("{} ({})", right.bus_factor, right.bus_risk)
            )),
            Line::from(format!(
                "{:<20} │ {:<25} │ {:<25}",
                "Maturity",
                format!("{} ({})", left.maturity_level, left.maturity_score),
                format!("{} ({})", right.maturity_level, right.maturity_score)
            )),
            Line::from(""),
        ];
        lines.push(styled_line(self.verdict(), theme.focus_prompt()));

        frame.render_widget(
            wrapped_paragraph(ratatui::text::Text::from(lines))
                .block(theme.chrome(styled_line(title, theme.focus_prompt()))),
            body_area,
        );

        if let Some(status) = &self.status {
            frame.render_widget(
                wrapped_paragraph(styled_line(status.text.clone(), theme.success_prompt())),
                status_area,
            );
        }

        frame.render_widget(
            key_hint_paragraph(key_text).block(theme.key_block()),
            footer_area,
        );
    }

    fn verdict(&self) -> String {
        let left = &self.data.left;
        let right = &self.data.right;
        if left.maturity_score > right.maturity_score {
            format!("{} appears more mature and stable.", left.repo.full_name)
        } else if right.maturity_score > left.maturity_score {
            format!("{} appears more mature and stable.", right.repo.full_name)
        } else {
            "Both repositories are similarly mature.".to_string()
        }
    }
}
