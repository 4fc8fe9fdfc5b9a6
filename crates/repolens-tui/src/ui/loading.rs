use ratatui::text::{Line, Span};
use repolens_app::progress::ProgressTracker;

use crate::theme::Theme;

const FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

/// Spinner frame cursor, advanced once per event-loop tick.
#[derive(Debug, Clone, Default)]
pub(crate) struct LoadingState {
    frame_index: usize,
}

impl LoadingState {
    pub(crate) fn next_frame(&mut self) {
        self.frame_index = (self.frame_index + 1) % FRAMES.len();
    }

    pub(crate) fn current_frame(&self) -> &'static str {
        FRAMES[self.frame_index]
    }
}

/// One line per pipeline stage: complete, active, or pending.
pub(crate) fn stage_lines(tracker: &ProgressTracker, theme: &Theme) -> Vec<Line<'static>> {
    tracker
        .stages()
        .into_iter()
        .map(|stage| {
            if stage.is_complete {
                Line::from(Span::styled(
                    format!("✓ {}", stage.name),
                    theme.success_prompt(),
                ))
            } else if stage.is_active {
                Line::from(Span::styled(
                    format!("▸ {}", stage.name),
                    theme.focus_prompt(),
                ))
            } else {
                Line::from(Span::styled(
                    format!("· {}", stage.name),
                    theme.secondary_text(),
                ))
            }
        })
        .collect()
}
