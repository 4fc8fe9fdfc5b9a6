use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::widgets::{List, ListItem, ListState};
use repolens_core::history::History;

use crate::theme::Theme;
use crate::ui::text::{compact_hint, key_hint_height, key_hint_paragraph, wrapped_paragraph};

pub(crate) fn render_history(
    frame: &mut Frame<'_>,
    theme: &Theme,
    history: Option<&History>,
    cursor: usize,
) {
    let area = frame.area();
    let key_text = compact_hint(
        area.width,
        "Up/Down or j/k: move    Enter: re-analyze    d: delete    c: clear all    Esc/q: back",
        "j/k: move    Enter: re-analyze    d: delete    Esc: back",
        "jk move | Enter analyze | d delete | Esc back",
    );
    let footer_height = key_hint_height(area.width, key_text);

    let [body_area, footer_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(footer_height)])
        .areas(area);

    let title = "Analysis History";
    let entries = history.map(|history| history.entries.as_slice()).unwrap_or(&[]);

    if entries.is_empty() {
        frame.render_widget(
            wrapped_paragraph("No history yet. Analyze a repository to get started!")
                .block(theme.chrome(title)),
            body_area,
        );
    } else {
        let items: Vec<ListItem<'_>> = entries
            .iter()
            .map(|entry| {
                ListItem::new(format!(
                    "{:<30} ★{:<7} ♥{:<4} {:<17} {}",
                    entry.repo_name,
                    entry.stars,
                    entry.health_score,
                    entry.maturity_level,
                    repolens_core::time::format_date_minute(entry.analyzed_at),
                ))
            })
            .collect();
        let list = List::new(items)
            .block(theme.chrome(title))
            .highlight_style(theme.list_highlight());

        let mut state = ListState::default();
        state.select(Some(cursor.min(entries.len().saturating_sub(1))));
        frame.render_stateful_widget(list, body_area, &mut state);
    }

    frame.render_widget(
        key_hint_paragraph(key_text).block(theme.key_block()),
        footer_area,
    );
}
