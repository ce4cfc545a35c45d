use botmon_types::LogLevel;

use crate::config::KeyContext;

/// Next level filter in the cycle `all → debug → … → fatal → all`
pub fn cycle_level(current: Option<LogLevel>) -> Option<LogLevel> {
    match current {
        None => Some(LogLevel::ALL[0]),
        Some(level) => {
            let idx = LogLevel::ALL.iter().position(|l| *l == level)?;
            LogLevel::ALL.get(idx + 1).copied()
        }
    }
}

/// Previous level filter in the same cycle
pub fn cycle_level_back(current: Option<LogLevel>) -> Option<LogLevel> {
    match current {
        None => LogLevel::ALL.last().copied(),
        Some(level) => {
            let idx = LogLevel::ALL.iter().position(|l| *l == level)?;
            idx.checked_sub(1).map(|i| LogLevel::ALL[i])
        }
    }
}

/// UI-specific transient state
pub struct UiState {
    /// Is the text filter input active?
    pub search_active: bool,

    /// Current text filter input
    pub search_input: String,

    /// Text filter in effect before the input was opened
    pub search_previous: String,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Waiting for y/n on "clear all logs"
    pub confirm_clear: bool,

    /// Show timestamps in log viewer?
    pub show_timestamps: bool,

    /// Show structured attributes after the message?
    pub show_attributes: bool,

    /// Error message to display (if any)
    pub error_message: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            search_active: false,
            search_input: String::new(),
            search_previous: String::new(),
            help_visible: false,
            confirm_clear: false,
            show_timestamps: true,
            show_attributes: true,
            error_message: None,
        }
    }
}

/// Global application state
pub struct AppState {
    /// Service being tailed, shown in the header
    pub service_url: String,

    /// UI state
    pub ui_state: UiState,

    /// Whether app should quit
    pub should_quit: bool,

    /// Dirty flag for rendering - only render when true
    pub render_dirty: bool,
}

impl AppState {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
            ui_state: UiState::default(),
            should_quit: false,
            render_dirty: true,
        }
    }

    /// Keybinding context for the current modal state
    pub fn key_context(&self) -> KeyContext {
        if self.ui_state.confirm_clear {
            KeyContext::ConfirmClear
        } else if self.ui_state.search_active {
            KeyContext::FilterInput
        } else {
            KeyContext::LogViewer
        }
    }

    /// Show an error message
    pub fn show_error(&mut self, msg: String) {
        self.ui_state.error_message = Some(msg);
    }

    /// Dismiss the error message
    pub fn dismiss_error(&mut self) {
        self.ui_state.error_message = None;
    }

    /// Start text filter input, editing the filter currently in effect
    pub fn start_search(&mut self, current: &str) {
        self.ui_state.search_active = true;
        self.ui_state.search_previous = current.to_string();
        self.ui_state.search_input = current.to_string();
    }

    /// Leave the input and restore the filter that was in effect before.
    /// Returns the text filter to apply.
    pub fn cancel_search(&mut self) -> &str {
        self.ui_state.search_active = false;
        self.ui_state.search_input = std::mem::take(&mut self.ui_state.search_previous);
        &self.ui_state.search_input
    }

    /// Leave the input keeping what was typed
    pub fn apply_filter(&mut self) {
        self.ui_state.search_active = false;
        self.ui_state.search_previous.clear();
    }

    /// Clear the text filter
    pub fn clear_filter(&mut self) {
        self.ui_state.search_input.clear();
        self.ui_state.search_previous.clear();
    }

    /// Add a character to search input
    pub fn search_input_char(&mut self, c: char) {
        self.ui_state.search_input.push(c);
    }

    /// Remove last character from search input
    pub fn search_input_backspace(&mut self) {
        self.ui_state.search_input.pop();
    }

    pub fn request_clear(&mut self) {
        self.ui_state.confirm_clear = true;
    }

    pub fn resolve_clear(&mut self) {
        self.ui_state.confirm_clear = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_cycle_wraps_through_all() {
        let mut level = None;
        let mut seen = Vec::new();
        for _ in 0..6 {
            level = cycle_level(level);
            seen.push(level);
        }
        assert_eq!(
            seen,
            vec![
                Some(LogLevel::Debug),
                Some(LogLevel::Info),
                Some(LogLevel::Warn),
                Some(LogLevel::Error),
                Some(LogLevel::Fatal),
                None,
            ]
        );
    }

    #[test]
    fn test_level_cycle_back() {
        assert_eq!(cycle_level_back(None), Some(LogLevel::Fatal));
        assert_eq!(cycle_level_back(Some(LogLevel::Info)), Some(LogLevel::Debug));
        assert_eq!(cycle_level_back(Some(LogLevel::Debug)), None);
    }

    #[test]
    fn test_cancel_search_restores_previous_filter() {
        let mut state = AppState::new("http://localhost:8080");
        state.start_search("timeout");
        state.search_input_backspace();
        state.search_input_char('X');
        assert_eq!(state.ui_state.search_input, "timeouX");

        assert_eq!(state.cancel_search(), "timeout");
        assert!(!state.ui_state.search_active);
    }

    #[test]
    fn test_key_context_follows_modal_state() {
        let mut state = AppState::new("http://localhost:8080");
        assert_eq!(state.key_context(), KeyContext::LogViewer);

        state.start_search("");
        assert_eq!(state.key_context(), KeyContext::FilterInput);
        state.apply_filter();

        state.request_clear();
        assert_eq!(state.key_context(), KeyContext::ConfirmClear);
        state.resolve_clear();
        assert_eq!(state.key_context(), KeyContext::LogViewer);
    }
}
