use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;

use crate::app::Action;

/// A key combination
///
/// For character keys the SHIFT modifier is dropped: terminals disagree on
/// whether `G` arrives with SHIFT set, and the character already encodes it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    pub fn new(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::NONE)
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self::with_modifiers(code, KeyModifiers::CONTROL)
    }

    pub fn char(c: char) -> Self {
        Self::new(KeyCode::Char(c))
    }

    pub fn from_event(event: &KeyEvent) -> Self {
        Self::with_modifiers(event.code, event.modifiers)
    }

    fn with_modifiers(code: KeyCode, mut modifiers: KeyModifiers) -> Self {
        if matches!(code, KeyCode::Char(_)) {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        Self { code, modifiers }
    }
}

/// Which part of the UI has the keyboard
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Global,
    LogViewer,
    FilterInput,
    ConfirmClear,
}

/// Key maps per context
pub struct KeyBindings {
    bindings: HashMap<KeyContext, HashMap<KeyBinding, Action>>,
}

impl KeyBindings {
    pub fn new() -> Self {
        use KeyBinding as K;

        let global = [
            (K::char('?'), Action::ToggleHelp),
            (K::new(KeyCode::Esc), Action::DismissError),
            (K::char('q'), Action::Quit),
            (K::ctrl(KeyCode::Char('c')), Action::Quit),
        ];

        // less-like navigation
        let log_viewer = [
            (K::char('j'), Action::ScrollDown(1)),
            (K::new(KeyCode::Down), Action::ScrollDown(1)),
            (K::char('k'), Action::ScrollUp(1)),
            (K::new(KeyCode::Up), Action::ScrollUp(1)),
            (K::ctrl(KeyCode::Char('d')), Action::PageDown),
            (K::new(KeyCode::PageDown), Action::PageDown),
            (K::ctrl(KeyCode::Char('u')), Action::PageUp),
            (K::new(KeyCode::PageUp), Action::PageUp),
            (K::char('g'), Action::ScrollToTop),
            (K::new(KeyCode::Home), Action::ScrollToTop),
            (K::char('G'), Action::JumpToLatest),
            (K::new(KeyCode::End), Action::JumpToLatest),
            (K::char('l'), Action::CycleLevel),
            (K::char('L'), Action::CycleLevelBack),
            (K::char('/'), Action::OpenSearch),
            (K::char('n'), Action::ClearFilter),
            (K::char('r'), Action::Reload),
            (K::char('C'), Action::RequestClear),
            (K::char('t'), Action::ToggleTimestamps),
            (K::char('a'), Action::ToggleAttributes),
        ];

        // Printable characters are handled in get_filter_input_action
        let filter_input = [
            (K::new(KeyCode::Enter), Action::ApplyFilter),
            (K::new(KeyCode::Esc), Action::CloseSearch),
            (K::ctrl(KeyCode::Char('c')), Action::CloseSearch),
            (K::new(KeyCode::Backspace), Action::SearchBackspace),
            (K::ctrl(KeyCode::Char('u')), Action::SearchClear),
        ];

        let confirm_clear = [
            (K::char('y'), Action::ConfirmClear),
            (K::char('Y'), Action::ConfirmClear),
            (K::char('n'), Action::CancelClear),
            (K::new(KeyCode::Esc), Action::CancelClear),
        ];

        let bindings = HashMap::from([
            (KeyContext::Global, HashMap::from(global)),
            (KeyContext::LogViewer, HashMap::from(log_viewer)),
            (KeyContext::FilterInput, HashMap::from(filter_input)),
            (KeyContext::ConfirmClear, HashMap::from(confirm_clear)),
        ]);

        Self { bindings }
    }

    /// Look up the action for a key event in the given context
    pub fn get_action(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        match context {
            KeyContext::FilterInput => self.get_filter_input_action(key),
            KeyContext::ConfirmClear => self.lookup(KeyContext::ConfirmClear, key),
            _ => self
                .lookup(context, key)
                .or_else(|| self.lookup(KeyContext::Global, key)),
        }
    }

    /// Bound keys first, then plain (or shifted) characters become input
    pub fn get_filter_input_action(&self, key: &KeyEvent) -> Option<Action> {
        self.lookup(KeyContext::FilterInput, key).or(match key.code {
            KeyCode::Char(c) if (key.modifiers - KeyModifiers::SHIFT).is_empty() => {
                Some(Action::SearchInput(c))
            }
            _ => None,
        })
    }

    fn lookup(&self, context: KeyContext, key: &KeyEvent) -> Option<Action> {
        self.bindings
            .get(&context)?
            .get(&KeyBinding::from_event(key))
            .cloned()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}
