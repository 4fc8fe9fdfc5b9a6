use ratatui::layout::Alignment;
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};

pub(crate) fn wrapped_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    Paragraph::new(text).wrap(Wrap { trim: false })
}

pub(crate) fn key_hint_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    wrapped_paragraph(text).alignment(Alignment::Center)
}

pub(crate) fn key_hint_height(total_width: u16, text: &str) -> u16 {
    let content_width = total_width.saturating_sub(2).max(1) as usize;
    let lines = wrapped_line_count(text, content_width);
    lines.saturating_add(2).max(3)
}

pub(crate) fn compact_hint<'a>(
    width: u16,
    full: &'a str,
    medium: &'a str,
    compact: &'a str,
) -> &'a str {
    if width >= 110 {
        full
    } else if width >= 78 {
        medium
    } else {
        compact
    }
}

pub(crate) fn styled_line(message: impl Into<String>, style: Style) -> Line<'static> {
    Line::from(Span::styled(message.into(), style))
}

pub(crate) fn label_value_line(
    label: impl Into<String>,
    value: impl Into<String>,
    label_style: Style,
) -> Line<'static> {
    let label = label.into();
    Line::from(vec![
        Span::styled(format!("{label}: "), label_style),
        Span::raw(value.into()),
    ])
}

/// Fixed-width unicode bar for the chart views; always at least one cell
/// for a non-zero value.
pub(crate) fn bar(value: u64, max: u64, width: usize) -> String {
    if value == 0 || max == 0 {
        return String::new();
    }
    let cells = ((value as f64 / max as f64) * width as f64) as usize;
    "█".repeat(cells.max(1))
}

fn wrapped_line_count(text: &str, width: usize) -> u16 {
    if text.is_empty() {
        return 1;
    }

    let mut total = 0u16;
    for line in text.split('\n') {
        let chars = line.chars().count();
        let wrapped = if chars == 0 { 1 } else { chars.div_ceil(width) };
        total = total.saturating_add(wrapped as u16);
    }

    total.max(1)
}
