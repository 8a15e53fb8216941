//! Keyboard and pointer input mapping.
//!
//! Translates raw key names and mouse buttons into editor commands, so
//! the shell embedding the store only forwards events.

use crate::tools::ToolMode;

/// Modifier keys held during an input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// The platform command modifier (ctrl, or cmd on macOS).
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }

    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Pointer buttons the editor distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// An editor command produced from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    DeleteSelected,
    Undo,
    Redo,
    SetTool(ToolMode),
    Cancel,
}

/// Map a key press to an editor command, if it is bound to one.
///
/// Key names follow the web `KeyboardEvent.key` convention
/// ("Delete", "Escape", single characters for letters).
pub fn key_command(key: &str, modifiers: Modifiers) -> Option<KeyCommand> {
    match key {
        "Delete" | "Backspace" => Some(KeyCommand::DeleteSelected),
        "Escape" => Some(KeyCommand::Cancel),
        "z" | "Z" if modifiers.command() => Some(if modifiers.shift {
            KeyCommand::Redo
        } else {
            KeyCommand::Undo
        }),
        _ if !modifiers.any() => ToolMode::from_hotkey(key).map(KeyCommand::SetTool),
        _ => None,
    }
}

/// What a pointer drag on empty canvas should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragGesture {
    /// Sweep out a selection rectangle.
    SelectionBox,
    /// Translate the viewport.
    Pan,
}

/// Classify a drag that started on empty canvas.
///
/// A plain left drag selects; any modifier or other button pans.
pub fn classify_drag(button: MouseButton, modifiers: Modifiers) -> DragGesture {
    if button == MouseButton::Left && !modifiers.any() {
        DragGesture::SelectionBox
    } else {
        DragGesture::Pan
    }
}
