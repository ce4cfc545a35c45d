mod confirm_dialog;
mod help_overlay;
mod status_bar;

pub use confirm_dialog::ConfirmDialog;
pub use help_overlay::HelpOverlay;
pub use status_bar::{StatusBar, log_viewer_hints};
