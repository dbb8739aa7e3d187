//! Keyboard shortcut registry and documentation.

use egui::{Key, Modifiers};

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, ctrl: bool, shift: bool, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        vec![
            Shortcut::new("Z", true, false, "Undo"),
            Shortcut::new("Z", true, true, "Redo"),
            Shortcut::new("Y", true, false, "Redo"),
            Shortcut::new("E", true, false, "Export to PNG"),
            Shortcut::new("C", true, true, "Copy edges"),
            Shortcut::new("L", true, false, "Lock / unlock"),
            Shortcut::new("P", false, false, "Pen"),
            Shortcut::new("E", false, false, "Eraser"),
            Shortcut::new("S", false, false, "Sign"),
        ]
    }
}

/// A shortcut fired this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Undo,
    Redo,
    Export,
    CopyEdges,
    ToggleLock,
    Pen,
    Eraser,
    Sign,
}

/// Consume the first matching shortcut from this frame's input.
///
/// Shifted variants are checked before their plain forms. Single-key tool
/// shortcuts are skipped while a text field has focus.
pub fn consume(ctx: &egui::Context) -> Option<ShortcutAction> {
    let ctrl_shift = Modifiers::COMMAND | Modifiers::SHIFT;
    let bindings = [
        (ctrl_shift, Key::Z, ShortcutAction::Redo),
        (ctrl_shift, Key::C, ShortcutAction::CopyEdges),
        (Modifiers::COMMAND, Key::Z, ShortcutAction::Undo),
        (Modifiers::COMMAND, Key::Y, ShortcutAction::Redo),
        (Modifiers::COMMAND, Key::E, ShortcutAction::Export),
        (Modifiers::COMMAND, Key::L, ShortcutAction::ToggleLock),
    ];
    let fired = ctx.input_mut(|i| {
        bindings
            .iter()
            .find(|(modifiers, key, _)| i.consume_key(*modifiers, *key))
            .map(|(_, _, action)| *action)
    });
    if fired.is_some() || ctx.wants_keyboard_input() {
        return fired;
    }

    let tools = [
        (Key::P, ShortcutAction::Pen),
        (Key::E, ShortcutAction::Eraser),
        (Key::S, ShortcutAction::Sign),
    ];
    ctx.input_mut(|i| {
        tools
            .iter()
            .find(|(key, _)| i.consume_key(Modifiers::NONE, *key))
            .map(|(_, action)| *action)
    })
}
