use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::Widget,
};

use crate::ui::Theme;

/// Status bar with keyboard hints on the left and status segments on the right
pub struct StatusBar<'a> {
    hints: Vec<(&'a str, &'a str)>,
    right: Vec<Span<'a>>,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            hints: Vec::new(),
            right: Vec::new(),
        }
    }

    /// Add keyboard hints as (key, description) pairs
    pub fn hints<I>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.hints = hints.into_iter().collect();
        self
    }

    /// Append a styled segment to the right side
    pub fn right(mut self, span: Span<'a>) -> Self {
        if !self.right.is_empty() {
            self.right.push(Span::styled(" │ ", Theme::status_bar()));
        }
        self.right.push(span);
        self
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Theme::status_bar());

        let right = Line::from(self.right);
        let right_width = right.width() as u16;
        let right_x = area.x + area.width.saturating_sub(right_width + 1);

        let mut spans = Vec::new();
        for (i, (key, desc)) in self.hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Theme::status_bar()));
            }
            spans.push(Span::styled(format!("[{}]", key), Theme::status_bar_key()));
            spans.push(Span::styled(format!(" {}", desc), Theme::status_bar()));
        }
        let hints = Line::from(spans);

        // Hints give way to the status segments on narrow terminals
        let hints_room = right_x.saturating_sub(area.x + 2);
        buf.set_line(area.x + 1, area.y, &hints, hints_room);

        if right_width > 0 && right_x > area.x {
            buf.set_line(right_x, area.y, &right, right_width);
        }
    }
}

/// Hints shown while browsing logs
pub fn log_viewer_hints() -> Vec<(&'static str, &'static str)> {
    vec![
        ("/", "Filter"),
        ("l", "Level"),
        ("G", "Latest"),
        ("r", "Reload"),
        ("?", "Help"),
        ("q", "Quit"),
    ]
}
