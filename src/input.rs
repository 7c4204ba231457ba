//! Keyboard handling for the dashboard.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Result of handling a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    /// Pause if running, resume if paused
    TogglePause,
    /// No action needed
    None,
}

/// Map a key press to a dashboard action.
///
/// - `q`, `Esc`, `Ctrl+C`: quit
/// - `Space`, `p`: pause / resume
pub fn handle_key_event(event: KeyEvent) -> KeyAction {
    // Windows reports both press and release
    if event.kind == KeyEventKind::Release {
        return KeyAction::None;
    }

    let KeyEvent {
        code, modifiers, ..
    } = event;

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('C') => KeyAction::Quit,
            _ => KeyAction::None,
        };
    }

    match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => KeyAction::TogglePause,
        _ => KeyAction::None,
    }
}
