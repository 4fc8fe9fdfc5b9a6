use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Clear;

use crate::centered_rect;
use crate::theme::Theme;
use crate::ui::text::{key_hint_height, key_hint_paragraph, wrapped_paragraph};

pub(crate) struct ModalSpec<'a> {
    pub(crate) title: &'a str,
    pub(crate) title_style: Option<Style>,
    pub(crate) body: Text<'a>,
    pub(crate) key_hint: Option<&'a str>,
    pub(crate) width_pct: u16,
    pub(crate) height_pct: u16,
}

pub(crate) struct ModalRenderResult {
    pub(crate) body_area: Rect,
}

pub(crate) fn render_modal(
    frame: &mut Frame<'_>,
    theme: &Theme,
    spec: ModalSpec<'_>,
) -> ModalRenderResult {
    let area = centered_rect(spec.width_pct, spec.height_pct, frame.area());
    let title = if let Some(style) = spec.title_style {
        Line::from(Span::styled(spec.title.to_string(), style))
    } else {
        Line::from(spec.title.to_string())
    };

    let mut body_area = area;
    let key_area = spec.key_hint.map(|key_hint| {
        let footer_height = key_hint_height(area.width, key_hint);
        let [inner_body, inner_key] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(footer_height)])
            .areas(area);
        body_area = inner_body;
        inner_key
    });

    frame.render_widget(Clear, body_area);
    frame.render_widget(
        wrapped_paragraph(spec.body).block(theme.chrome(title)),
        body_area,
    );

    if let (Some(key_hint), Some(key_area)) = (spec.key_hint, key_area) {
        frame.render_widget(Clear, key_area);
        frame.render_widget(
            key_hint_paragraph(key_hint).block(theme.key_block()),
            key_area,
        );
    }

    ModalRenderResult { body_area }
}

