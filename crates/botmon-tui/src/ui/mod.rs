pub mod components;
pub mod format;
mod layout;
pub mod screens;
mod theme;

pub use layout::{Layout, LogViewerAreas};
pub use theme::Theme;
