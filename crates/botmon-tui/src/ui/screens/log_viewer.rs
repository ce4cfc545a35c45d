use botmon_logs::{FilterView, LogView, StoredRecord, SyncPhase};
use ratatui::{
    Frame,
    layout::{Alignment, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::UnicodeWidthStr;

use crate::app::AppState;
use crate::ui::components::{StatusBar, log_viewer_hints};
use crate::ui::format::{format_timestamp, truncate_to_width};
use crate::ui::{Layout, Theme};

/// Log viewer screen
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &AppState, view: &mut LogView) {
        let show_filter_bar = state.ui_state.search_active || !view.text_filter().is_empty();
        let areas = Layout::log_viewer(frame.area(), show_filter_bar);

        Self::render_header(frame, areas.header, state, view);
        if let Some(area) = areas.filter_bar {
            Self::render_filter_bar(frame, area, state, view);
        }
        Self::render_logs(frame, areas.logs, state, view);
        Self::render_status_bar(frame, areas.status_bar, state, view);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState, view: &LogView) {
        let level = view
            .level_filter()
            .map(|l| l.as_query().to_uppercase())
            .unwrap_or_else(|| "ALL".to_string());

        let phase_style = match view.phase() {
            SyncPhase::Streaming => Style::default().fg(Theme::SUCCESS),
            SyncPhase::Error => Theme::error(),
            _ => Theme::text_dim(),
        };
        let phase = if view.is_loading() {
            "loading…"
        } else {
            view.phase().label()
        };

        let title = Line::from(vec![
            Span::styled("botmon", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(state.service_url.clone(), Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled("level: ", Theme::text_dim()),
            Span::styled(level, Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(phase, phase_style),
        ]);

        let header = Paragraph::new(title).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_filter_bar(frame: &mut Frame, area: Rect, state: &AppState, view: &LogView) {
        let active = state.ui_state.search_active;
        let mut spans = vec![];

        if active {
            spans.push(Span::styled(
                " /",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(" Filter: ", Theme::text_dim()));
        }

        spans.push(Span::styled(
            view.text_filter().to_string(),
            Theme::text_highlight(),
        ));

        if active {
            spans.push(Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
            spans.push(Span::styled(
                "  [Enter] Keep  [Esc] Cancel",
                Theme::text_dim(),
            ));
        } else {
            spans.push(Span::styled("  [n] Clear  [/] Edit", Theme::text_dim()));
        }

        let filter_bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if active {
                    Theme::border_focused()
                } else {
                    Theme::border()
                })
                .title(Span::styled(" Filter ", Theme::title())),
        );

        frame.render_widget(filter_bar, area);
    }

    fn render_logs(frame: &mut Frame, area: Rect, state: &AppState, view: &mut LogView) {
        let inner_height = area.height.saturating_sub(2) as usize;
        // 2 for borders, 1 for the scrollbar
        let inner_width = area.width.saturating_sub(3) as usize;
        view.set_viewport_height(inner_height);

        let total = view.total_visible();
        let title = if view.text_filter().is_empty() {
            format!(" Logs ({}) ", total)
        } else {
            format!(" Logs ({} matching) ", total)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border())
            .title(Span::styled(title, Theme::title()));

        if total == 0 {
            let hint = if view.is_loading() {
                "Loading logs…"
            } else if view.total_buffered() > 0 {
                "No logs match the current filter"
            } else {
                "Waiting for logs…"
            };
            let empty = Paragraph::new(vec![Line::from(""), Line::from(hint)])
                .style(Theme::text_dim())
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let lines: Vec<Line> = view
            .visible_window()
            .iter()
            .map(|record| format_record_line(record, state, view.filter(), inner_width))
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);

        if total > inner_height {
            let max_offset = total.saturating_sub(inner_height);
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_offset)
                .position(view.scroll_offset().min(max_offset));

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, view: &LogView) {
        let counts = view.level_counts();

        let mut bar = StatusBar::new().hints(log_viewer_hints());

        if let Some(msg) = &state.ui_state.error_message {
            bar = bar.right(Span::styled(format!("⚠ {}", msg), Theme::error()));
        } else if let Some(err) = view.last_error() {
            bar = bar.right(Span::styled(format!("⚠ {}", err), Theme::error()));
        }

        bar = bar
            .right(Span::styled(
                format!(
                    "E:{} W:{} I:{}",
                    counts.error + counts.fatal,
                    counts.warn,
                    counts.info
                ),
                Theme::status_bar(),
            ))
            .right(Span::styled(
                format!("{} / {} logs", view.total_visible(), view.total_buffered()),
                Theme::status_bar(),
            ))
            .right(if view.pinned() {
                Span::styled("▼ FOLLOW", Theme::following())
            } else {
                Span::styled("‖ PAUSED", Theme::paused())
            });

        frame.render_widget(bar, area);
    }
}

/// Format a record as one display line: time, level, logger, message, attributes, caller
fn format_record_line(
    record: &StoredRecord,
    state: &AppState,
    filter: &FilterView,
    available_width: usize,
) -> Line<'static> {
    let mut spans = Vec::new();
    let mut prefix_width = 0;

    if state.ui_state.show_timestamps {
        let ts = format!("{} ", format_timestamp(&record.timestamp));
        prefix_width += ts.width();
        spans.push(Span::styled(ts, Theme::text_dim()));
    }

    let badge = format!("{} {} ", record.level.symbol(), record.level.as_str());
    prefix_width += badge.width();
    spans.push(Span::styled(badge, Theme::level_badge(record.level)));

    if let Some(logger) = &record.source_component {
        let logger = format!("[{}] ", logger);
        prefix_width += logger.width();
        spans.push(Span::styled(logger, Theme::logger()));
    }

    let message = truncate_to_width(
        &record.message,
        available_width.saturating_sub(prefix_width),
    );
    push_highlighted(&mut spans, &message, filter, Theme::message(record.level));

    if state.ui_state.show_attributes && !record.attributes.is_empty() {
        spans.push(Span::styled(
            format!(" {}", record.attributes_inline()),
            Theme::attributes(),
        ));
    }

    if let Some(caller) = &record.call_site {
        spans.push(Span::styled(format!(" ({})", caller), Theme::text_dim()));
    }

    Line::from(spans)
}

/// Split `text` into spans, highlighting text-filter matches
fn push_highlighted(spans: &mut Vec<Span<'static>>, text: &str, filter: &FilterView, base: Style) {
    let matches = filter.find_matches(text);
    if matches.is_empty() {
        spans.push(Span::styled(text.to_string(), base));
        return;
    }

    let mut last_end = 0;
    for (start, end) in matches {
        if start > last_end {
            spans.push(Span::styled(text[last_end..start].to_string(), base));
        }
        spans.push(Span::styled(text[start..end].to_string(), Theme::search_match()));
        last_end = end;
    }
    if last_end < text.len() {
        spans.push(Span::styled(text[last_end..].to_string(), base));
    }
}
