//! Key bindings: arrows plus vim-style letters.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SlideLeft,
    SlideRight,
    SpinCw,
    SpinCcw,
    Pause,
    Restart,
    ToggleMusic,
    Quit,
    None,
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL {
        return match code {
            KeyCode::Char('c') => Action::Quit,
            _ => Action::None,
        };
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Char('m' | 'M') => Action::ToggleMusic,
        KeyCode::Left | KeyCode::Char('h') => Action::SlideLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::SlideRight,
        KeyCode::Up | KeyCode::Char('k') => Action::SpinCw,
        KeyCode::Down | KeyCode::Char('j') => Action::SpinCcw,
        _ => Action::None,
    }
}
