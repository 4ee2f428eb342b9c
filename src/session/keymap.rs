use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::interpreter::InlineFormat;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Format(InlineFormat),
    Undo,
    Redo,
    OpenFormatMenu,
}

/// What the host should do with a key event after the session saw it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyDisposition {
    /// The session acted on the key; the host must not apply its default.
    Handled,
    /// The host should open the format menu and still apply its default.
    OpenFormatMenu,
    Ignored,
}

impl KeyDisposition {
    pub fn suppresses_default(self) -> bool {
        self == KeyDisposition::Handled
    }
}

/// Control on most platforms, Command on macOS.
fn is_command_chord(modifiers: KeyModifiers) -> bool {
    modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER | KeyModifiers::META)
}

pub fn action_for(event: &KeyEvent) -> Option<KeyAction> {
    if event.kind == KeyEventKind::Release {
        return None;
    }
    match (event.code, event.modifiers) {
        (KeyCode::Char('/'), m) if !is_command_chord(m) && !m.contains(KeyModifiers::ALT) => {
            Some(KeyAction::OpenFormatMenu)
        }
        (KeyCode::Char(ch), m) if is_command_chord(m) => {
            let shift = m.contains(KeyModifiers::SHIFT) || ch.is_ascii_uppercase();
            match (ch.to_ascii_lowercase(), shift) {
                ('z', true) => Some(KeyAction::Redo),
                ('z', false) => Some(KeyAction::Undo),
                (_, true) => None,
                ('b', false) => Some(KeyAction::Format(InlineFormat::Bold)),
                ('i', false) => Some(KeyAction::Format(InlineFormat::Italic)),
                ('u', false) => Some(KeyAction::Format(InlineFormat::Underline)),
                ('d', false) => Some(KeyAction::Format(InlineFormat::Strikethrough)),
                _ => None,
            }
        }
        _ => None,
    }
}
