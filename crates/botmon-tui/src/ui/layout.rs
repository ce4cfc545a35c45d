use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Layout helper for consistent screen layouts
pub struct Layout;

/// Areas of the log viewer screen
pub struct LogViewerAreas {
    pub header: Rect,
    pub filter_bar: Option<Rect>,
    pub logs: Rect,
    pub status_bar: Rect,
}

impl Layout {
    /// Header, optional filter bar, log list, status bar
    pub fn log_viewer(area: Rect, show_filter_bar: bool) -> LogViewerAreas {
        let mut constraints = vec![Constraint::Length(3)];
        if show_filter_bar {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Min(1));
        constraints.push(Constraint::Length(1));

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        if show_filter_bar {
            LogViewerAreas {
                header: chunks[0],
                filter_bar: Some(chunks[1]),
                logs: chunks[2],
                status_bar: chunks[3],
            }
        } else {
            LogViewerAreas {
                header: chunks[0],
                filter_bar: None,
                logs: chunks[1],
                status_bar: chunks[2],
            }
        }
    }

    /// A popup of at most `width` x `height` centered in `area`
    pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width.saturating_sub(4));
        let height = height.min(area.height.saturating_sub(2));
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        Rect::new(x, y, width, height)
    }
}
