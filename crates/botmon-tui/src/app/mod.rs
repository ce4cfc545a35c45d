mod action;
mod state;

pub use action::Action;
pub use state::{AppState, UiState, cycle_level, cycle_level_back};
