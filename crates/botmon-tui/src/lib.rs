//! TUI components for botmon
//!
//! This crate provides the terminal user interface for botmon,
//! including state management, keybindings, event handling, and UI components.

pub mod app;
pub mod config;
pub mod tui;
pub mod ui;

pub use app::{Action, AppState, UiState, cycle_level, cycle_level_back};
pub use config::{KeyBinding, KeyBindings, KeyContext};
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{ConfirmDialog, HelpOverlay, StatusBar, log_viewer_hints};
pub use ui::format::{format_timestamp, plain_line};
pub use ui::screens::LogViewerScreen;
pub use ui::{Layout, Theme};
