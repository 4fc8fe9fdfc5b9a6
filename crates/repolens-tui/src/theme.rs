use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders};
use repolens_core::config::ThemeName;

/// All styling flows from this value; it is built once at startup from the
/// config and threaded through every render function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Theme {
    pub(crate) accent: Color,
    pub(crate) success: Color,
    pub(crate) error: Color,
    pub(crate) secondary: Color,
    pub(crate) highlight: Color,
}

impl Theme {
    pub(crate) fn from_name(name: ThemeName) -> Self {
        match name {
            ThemeName::Dark => Self {
                accent: Color::Blue,
                success: Color::Green,
                error: Color::Red,
                secondary: Color::Gray,
                highlight: Color::Cyan,
            },
            ThemeName::Light => Self {
                accent: Color::Blue,
                success: Color::Green,
                error: Color::Red,
                secondary: Color::DarkGray,
                highlight: Color::LightBlue,
            },
            ThemeName::HighContrast => Self {
                accent: Color::White,
                success: Color::LightGreen,
                error: Color::LightRed,
                secondary: Color::White,
                highlight: Color::Yellow,
            },
        }
    }

    pub(crate) fn chrome<'a>(&self, title: impl Into<Line<'a>>) -> Block<'a> {
        Block::default().borders(Borders::ALL).title(title)
    }

    pub(crate) fn key_block(&self) -> Block<'static> {
        self.chrome("Keys")
    }

    pub(crate) fn focus_prompt(&self) -> Style {
        Style::default().fg(self.accent).add_modifier(Modifier::BOLD)
    }

    pub(crate) fn success_prompt(&self) -> Style {
        Style::default()
            .fg(self.success)
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn error_prompt(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    pub(crate) fn secondary_text(&self) -> Style {
        Style::default()
            .fg(self.secondary)
            .add_modifier(Modifier::DIM)
    }

    pub(crate) fn list_highlight(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    pub(crate) fn tab_active(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.accent)
            .add_modifier(Modifier::BOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn themes_differ_by_name() {
        assert_ne!(
            Theme::from_name(ThemeName::Dark),
            Theme::from_name(ThemeName::HighContrast)
        );
    }

    #[test]
    fn focus_prompt_uses_accent_bold() {
        let theme = Theme::from_name(ThemeName::Dark);
        let style = theme.focus_prompt();
        assert_eq!(style.fg, Some(Color::Blue));
        assert!(style.add_modifier.contains(Modifier::BOLD));
    }
}
