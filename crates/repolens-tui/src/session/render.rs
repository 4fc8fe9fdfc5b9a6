use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Margin, Rect};
use ratatui::text::{Line, Text};
use ratatui::widgets::{List, ListItem, ListState, Paragraph};
use tui_input::Input;

use crate::history_view::render_history;
use crate::ui::loading::stage_lines;
use crate::ui::modal::{ModalSpec, render_modal};
use crate::ui::text::{
    compact_hint, key_hint_height, key_hint_paragraph, styled_line, wrapped_paragraph,
};

use super::{CompareStep, MENU_ITEMS, SessionFlow, SessionState, SettingsTopic, SubmenuKind};

impl SessionFlow {
    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        match self.state {
            SessionState::Menu => self.render_menu(frame),
            SessionState::Input => self.render_input(frame),
            SessionState::Loading | SessionState::CompareLoading => self.render_loading(frame),
            SessionState::Dashboard => {
                if let Some(dashboard) = &self.dashboard {
                    dashboard.render(frame, &self.theme);
                }
            }
            SessionState::Tree => {
                if let Some(tree) = &self.tree {
                    tree.render(frame, &self.theme);
                }
            }
            SessionState::History => {
                render_history(frame, &self.theme, self.history.as_ref(), self.history_cursor);
            }
            SessionState::CompareInput => self.render_compare_input(frame),
            SessionState::CompareResult => {
                if let Some(view) = &self.compare_view {
                    view.render(frame, &self.theme);
                }
            }
            SessionState::Help => self.render_topic(frame, self.help_topic.title(), help_body(self)),
            SessionState::Settings => {
                self.render_topic(frame, self.settings_topic.title(), settings_body(self))
            }
        }
    }

    fn render_menu(&self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let key_text = compact_hint(
            area.width,
            "Enter: select    Up/Down or j/k: move    q: quit",
            "Enter: select    j/k: move    q: quit",
            "Enter select | j/k move | q quit",
        );
        let footer_height = key_hint_height(area.width, key_text);
        let [header, body, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(8),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        let header_text = Text::from(vec![
            Line::from("repolens"),
            Line::from("GitHub repository analyzer"),
            styled_line("Choose what you want to do", self.theme.focus_prompt()),
        ]);
        frame.render_widget(
            wrapped_paragraph(header_text).block(self.theme.chrome("Home")),
            header,
        );

        match &self.menu.submenu {
            Some((kind, cursor)) => {
                let title = match kind {
                    SubmenuKind::Analyze => "Analysis type",
                    SubmenuKind::Settings => "Settings",
                    SubmenuKind::Help => "Help topics",
                };
                self.render_list(frame, body, title, kind.items(), *cursor);
            }
            None => {
                self.render_list(frame, body, "Actions", &MENU_ITEMS, self.menu.cursor);
            }
        }

        frame.render_widget(
            key_hint_paragraph(key_text).block(self.theme.key_block()),
            footer,
        );
    }

    fn render_list(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        title: &str,
        items: &[&str],
        cursor: usize,
    ) {
        let items: Vec<ListItem<'_>> = items.iter().map(|item| ListItem::new(*item)).collect();
        let list = List::new(items)
            .block(
                self.theme
                    .chrome(styled_line(title.to_string(), self.theme.focus_prompt())),
            )
            .highlight_style(self.theme.list_highlight());

        let mut state = ListState::default();
        state.select(Some(cursor));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn render_input(&self, frame: &mut Frame<'_>) {
        let key_text = compact_hint(
            frame.area().width,
            "Type to edit    Enter: analyze    Ctrl+U: clear    Ctrl+W: delete word    Esc: back",
            "Type    Enter: analyze    Ctrl+U: clear    Esc: back",
            "Type | Enter analyze | Esc back",
        );
        let title = format!("Enter repository ({} analysis)", self.analysis_type.label());
        self.render_input_modal(frame, &title, &self.primary_input, None, key_text);
    }

    fn render_compare_input(&self, frame: &mut Frame<'_>) {
        let key_text = compact_hint(
            frame.area().width,
            "Type to edit    Enter: continue    Ctrl+U: clear    Esc: back",
            "Type    Enter: continue    Esc: back",
            "Type | Enter continue | Esc back",
        );

        let (title, buffer, context) = match self.compare_step {
            CompareStep::First => ("Enter first repository", &self.compare_input_a, None),
            CompareStep::Second => (
                "Enter second repository",
                &self.compare_input_b,
                Some(format!("First: {}", self.compare_input_a.value())),
            ),
        };
        self.render_input_modal(frame, title, buffer, context, key_text);
    }

    fn render_input_modal(
        &self,
        frame: &mut Frame<'_>,
        title: &str,
        input: &Input,
        context: Option<String>,
        key_text: &str,
    ) {
        let mut body = vec![Line::from("")];
        if let Some(context) = &context {
            body.push(styled_line(context.clone(), self.theme.secondary_text()));
        }

        let rendered = render_modal(
            frame,
            &self.theme,
            ModalSpec {
                title,
                title_style: Some(self.theme.focus_prompt()),
                body: Text::from(body),
                key_hint: Some(key_text),
                width_pct: 72,
                height_pct: 44,
            },
        );

        let inner = rendered.body_area.inner(Margin {
            vertical: 1,
            horizontal: 1,
        });
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        // Leave the context line (if any) in place and write the input
        // buffer below it, then the hint and error lines.
        let input_row = if context.is_some() { 2 } else { 1 };
        if inner.height <= input_row {
            return;
        }
        let input_area = Rect::new(
            inner.x,
            inner.y + input_row,
            inner.width,
            1,
        );
        let width = input_area.width as usize;
        let scroll = input.visual_scroll(width);
        frame.render_widget(
            Paragraph::new(format!("> {}", input.value())).scroll((0, scroll as u16)),
            input_area,
        );

        let mut extra_rows = Vec::new();
        extra_rows.push(styled_line(
            "Format: owner/repo or GitHub URL",
            self.theme.secondary_text(),
        ));
        if let Some(error) = &self.last_error {
            extra_rows.push(styled_line(
                format!("Error: {error}"),
                self.theme.error_prompt(),
            ));
        }
        let below_y = input_area.y + 2;
        let bottom = inner.y + inner.height;
        if below_y < bottom {
            let extra_area = Rect::new(inner.x, below_y, inner.width, bottom - below_y);
            frame.render_widget(wrapped_paragraph(Text::from(extra_rows)), extra_area);
        }

        if width > 2 {
            let visual = input.visual_cursor() + 2;
            let relative = visual.saturating_sub(scroll).min(width.saturating_sub(1));
            frame.set_cursor_position((input_area.x + relative as u16, input_area.y));
        }
    }

    fn render_loading(&self, frame: &mut Frame<'_>) {
        let heading = if self.state == SessionState::CompareLoading {
            format!(
                "{} Comparing {}...",
                self.loading.current_frame(),
                self.loading_label
            )
        } else {
            format!(
                "{} Analyzing {} ({} mode)...",
                self.loading.current_frame(),
                self.loading_label,
                self.analysis_type.label().to_uppercase()
            )
        };

        let mut body = vec![Line::from(heading), Line::from("")];
        if let Some(progress) = &self.progress {
            body.extend(stage_lines(progress, &self.theme));
            body.push(Line::from(""));
            body.push(styled_line(
                format!("{}s elapsed", progress.elapsed().as_secs()),
                self.theme.secondary_text(),
            ));
        }

        render_modal(
            frame,
            &self.theme,
            ModalSpec {
                title: "Working",
                title_style: Some(self.theme.focus_prompt()),
                body: Text::from(body),
                key_hint: Some("Esc: cancel"),
                width_pct: 72,
                height_pct: 56,
            },
        );
    }

    fn render_topic(&self, frame: &mut Frame<'_>, title: &str, body: String) {
        let area = frame.area();
        let key_text = "Esc/q: back to menu";
        let footer_height = key_hint_height(area.width, key_text);
        let [body_area, footer_area] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(6), Constraint::Length(footer_height)])
            .areas(area);

        frame.render_widget(
            wrapped_paragraph(body).block(
                self.theme
                    .chrome(styled_line(title.to_string(), self.theme.focus_prompt())),
            ),
            body_area,
        );
        frame.render_widget(
            key_hint_paragraph(key_text).block(self.theme.key_block()),
            footer_area,
        );
    }
}

fn help_body(flow: &SessionFlow) -> String {
    use super::HelpTopic;

    match flow.help_topic {
        HelpTopic::Shortcuts => "\
Main menu:
  Up/Down or j/k   Move
  Enter            Select
  q                Quit

Repository input:
  Enter            Start analysis
  Ctrl+U           Clear input
  Ctrl+W           Delete word
  Esc              Back to menu

Dashboard:
  Left/Right or h/l  Switch view
  1-7              Jump to view
  e                Toggle export panel
  j / m            Export JSON / Markdown (panel open)
  f                File tree
  r                Refresh
  b                Toggle favorite
  q/Esc            Back

File tree:
  Up/Down or j/k   Move
  Enter/Space      Toggle folder
  Esc              Back to dashboard

History:
  Enter            Re-analyze entry
  d                Delete entry
  c                Clear all
  q/Esc            Back"
            .to_string(),
        HelpTopic::GettingStarted => "\
1. Choose \"Analyze Repository\" from the main menu
2. Enter a repository as owner/repo (or paste a GitHub URL)
3. Wait for the analysis pipeline to finish
4. Browse the dashboard views and the file tree
5. Export results as JSON or Markdown if needed

Set the GITHUB_TOKEN environment variable for higher API
rate limits and access to private repositories."
            .to_string(),
        HelpTopic::Features => "\
Health score     - overall repository health (0-100)
Bus factor       - how concentrated the commit history is
Maturity level   - Prototype, Growing, Stable, Production-Ready
Languages        - byte-count breakdown per language
Activity         - commit chart for the last 30 days
Contributors     - top contributors by commit count
Comparison       - two repositories side by side
History          - previously analyzed repositories
Favorites        - bookmark repositories from the dashboard"
            .to_string(),
        HelpTopic::Troubleshooting => "\
Repository not found:
  Check the owner/repo spelling and that the repo is public.

Analysis fails or hangs:
  Check your network connection; the GitHub API may be rate
  limited. Unauthenticated clients get 60 requests/hour.

Rate limits:
  Set GITHUB_TOKEN to raise the limit to 5000 requests/hour."
            .to_string(),
    }
}

fn settings_body(flow: &SessionFlow) -> String {
    match flow.settings_topic {
        SettingsTopic::Theme => "\
The theme is read from ~/.config/repolens/config.toml:

  [ui]
  theme = \"dark\"    # dark | light | high-contrast

Theme changes take effect on the next start."
            .to_string(),
        SettingsTopic::Export => "\
Exports are written to the current working directory:

  analysis.json / analysis.md       (dashboard, e then j/m)
  comparison.json / comparison.md   (comparison view, j/m)"
            .to_string(),
        SettingsTopic::Token => "\
Create a personal access token on GitHub and export it:

  export GITHUB_TOKEN=...

Authenticated requests get 5000 requests/hour instead of 60
and can read private repositories you have access to."
            .to_string(),
        SettingsTopic::Reset => "\
Remove the config and data files to reset everything:

  ~/.config/repolens/config.toml
  ~/.repolens/history.json
  ~/.repolens/favorites.json
  ~/.repolens/cache/"
            .to_string(),
    }
}
