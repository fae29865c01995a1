use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, InputMode};

/// Lines moved per PgUp/PgDn in the output pane.
const PAGE: usize = 10;

/// What the event loop should do after a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
    /// Hand the terminal to an attach backend for this session.
    Attach(String),
    /// Hand the terminal to the editor to compose input for this session.
    Compose(String),
}

pub fn handle_key_event(app: &mut App, key: KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::Continue;
    }

    if let (KeyCode::Char('c'), KeyModifiers::CONTROL) = (key.code, key.modifiers) {
        return KeyAction::Quit;
    }

    if matches!(app.mode, InputMode::Send { .. }) {
        handle_send_key(app, key);
        return KeyAction::Continue;
    }

    handle_normal_key(app, key)
}

fn handle_normal_key(app: &mut App, key: KeyEvent) -> KeyAction {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
        KeyCode::Enter | KeyCode::Char('v') => app.show_selected(),
        KeyCode::Char('s') => app.begin_send(),
        KeyCode::Char('S') => {
            if let Some(id) = app.selected_id() {
                return KeyAction::Compose(id);
            }
        }
        KeyCode::Char('d') => app.close_selected(),
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('a') => {
            if let Some(id) = app.selected_id() {
                return KeyAction::Attach(id);
            }
        }
        KeyCode::Char('o') => app.cycle_sort(),
        KeyCode::PageUp => app.scroll_output_up(PAGE),
        KeyCode::PageDown => app.scroll_output_down(PAGE),
        _ => {}
    }
    KeyAction::Continue
}

/// Typing into the send prompt. Enter submits, Esc cancels.
fn handle_send_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_send(),
        KeyCode::Enter => app.submit_send(),
        KeyCode::Backspace => {
            if let InputMode::Send { buffer, .. } = &mut app.mode {
                buffer.pop();
            }
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if let InputMode::Send { buffer, .. } = &mut app.mode {
                buffer.push(c);
            }
        }
        _ => {}
    }
}
