use botmon_types::LogLevel;
use ratatui::style::{Color, Modifier, Style};

/// Styles used by the log viewer
pub struct Theme;

impl Theme {
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;
    pub const ACCENT: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    pub const SUCCESS: Color = Color::Green;
    pub const WARNING: Color = Color::Yellow;
    pub const ERROR: Color = Color::Red;

    /// Background of the bottom bar
    const BAR_BG: Color = Color::DarkGray;

    fn bold(fg: Color) -> Style {
        Style::new().fg(fg).add_modifier(Modifier::BOLD)
    }

    fn on_bar(fg: Color) -> Style {
        Self::bold(fg).bg(Self::BAR_BG)
    }

    pub fn border() -> Style {
        Style::new().fg(Self::FG_DIM)
    }

    pub fn border_focused() -> Style {
        Style::new().fg(Self::HIGHLIGHT)
    }

    pub fn title() -> Style {
        Self::bold(Self::ACCENT)
    }

    pub fn text() -> Style {
        Style::new().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::new().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Self::bold(Self::HIGHLIGHT)
    }

    pub fn error() -> Style {
        Self::bold(Self::ERROR)
    }

    /// Text-filter hit inside a message
    pub fn search_match() -> Style {
        Self::bold(Color::Black).bg(Self::HIGHLIGHT)
    }

    pub fn level_badge(level: LogLevel) -> Style {
        Self::bold(level.color())
    }

    /// Warnings and errors tint the whole message
    pub fn message(level: LogLevel) -> Style {
        match level {
            LogLevel::Error | LogLevel::Fatal => Style::new().fg(Self::ERROR),
            LogLevel::Warn => Style::new().fg(Self::WARNING),
            LogLevel::Debug | LogLevel::Info => Self::text(),
        }
    }

    pub fn logger() -> Style {
        Self::bold(Color::Blue)
    }

    pub fn attributes() -> Style {
        Style::new().fg(Color::Magenta)
    }

    pub fn status_bar() -> Style {
        Style::new().fg(Self::FG_DIM).bg(Self::BAR_BG)
    }

    pub fn status_bar_key() -> Style {
        Self::on_bar(Self::HIGHLIGHT)
    }

    pub fn following() -> Style {
        Self::on_bar(Self::SUCCESS)
    }

    pub fn paused() -> Style {
        Self::on_bar(Self::WARNING)
    }
}
