use ratatui::{
    Frame,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::{Layout, Theme};

/// (section, [(keys, description)])
const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/↓", "Scroll down"),
            ("k/↑", "Scroll up"),
            ("Ctrl+d", "Page down"),
            ("Ctrl+u", "Page up"),
            ("g/Home", "Go to oldest"),
            ("G/End", "Jump to latest (follow)"),
        ],
    ),
    (
        "Filtering",
        &[
            ("l / L", "Next / previous level"),
            ("/", "Filter text"),
            ("n", "Clear text filter"),
        ],
    ),
    (
        "Display",
        &[("t", "Toggle timestamps"), ("a", "Toggle attributes")],
    ),
    (
        "Service",
        &[
            ("r", "Reload from service"),
            ("C", "Clear all logs on service"),
        ],
    ),
    (
        "General",
        &[("?", "Toggle this help"), ("Esc", "Dismiss"), ("q", "Quit")],
    ),
];

/// Keybinding reference popup
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::centered_popup(frame.area(), 50, 28);
        frame.render_widget(Clear, popup_area);

        let mut lines = Vec::new();
        for (i, (section, keys)) in SECTIONS.iter().enumerate() {
            if i > 0 {
                lines.push(Line::from(""));
            }
            lines.push(Line::from(Span::styled(*section, Theme::text_highlight())));
            lines.extend(keys.iter().map(|(key, desc)| key_line(key, desc)));
        }

        let help = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::new().fg(Theme::ACCENT))
                .title(Span::styled(" Keybindings ", Theme::title())),
        );

        frame.render_widget(help, popup_area);
    }
}

fn key_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:>8}", key), Style::new().fg(Theme::SUCCESS)),
        Span::styled(format!("  {}", desc), Theme::text()),
    ])
}
