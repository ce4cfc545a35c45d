use ratatui::{
    Frame,
    layout::Alignment,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::ui::{Layout, Theme};

/// Confirmation popup for destructive actions
pub struct ConfirmDialog;

impl ConfirmDialog {
    pub fn render(frame: &mut Frame, title: &str, question: &str) {
        let popup_area = Layout::centered_popup(frame.area(), 52, 7);
        frame.render_widget(Clear, popup_area);

        let text = vec![
            Line::from(""),
            Line::from(Span::styled(question, Theme::text())),
            Line::from(""),
            Line::from(vec![
                Span::styled("[y]", Theme::text_highlight()),
                Span::styled(" Yes   ", Theme::text()),
                Span::styled("[n]", Theme::text_highlight()),
                Span::styled(" No", Theme::text()),
            ]),
        ];

        let dialog = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::error())
                    .title(Span::styled(format!(" {} ", title), Theme::error())),
            );

        frame.render_widget(dialog, popup_area);
    }
}
