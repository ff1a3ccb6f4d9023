//! Keyboard bindings for editing commands.
//!
//! Keys resolve to a [`Command`]. Some commands act on state the
//! controller owns; the rest (undo, label switching, image navigation,
//! segmentation submit) need host data and are handed back to the caller.

use super::ToolMode;
use super::input::{Key, Modifiers};

/// Number of labels reachable through digit hotkeys (1-9).
pub const MAX_LABEL_HOTKEYS: usize = 9;

/// Something a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetMode(ToolMode),
    /// Enter assist mode, or leave it for drawing
    ToggleAssist,
    ToggleSegmentationMode,
    /// Move the selection one step; `dx`/`dy` are -1, 0 or 1
    Nudge { dx: f64, dy: f64, coarse: bool },
    DeleteSelected,
    Escape,
    /// Close the shape under construction
    FinishDrawing,
    Copy,
    Paste,
    ClearAll,

    // Host commands
    Undo,
    SubmitSegmentation,
    CycleLabel { backward: bool },
    /// Select the label at this 0-based index
    QuickLabel(usize),
    /// Previous (-1) or next (1) image
    NavigateImage(i32),
}

impl Command {
    /// Whether this command must be carried out by the host.
    pub fn is_delegated(&self) -> bool {
        matches!(
            self,
            Command::Undo
                | Command::SubmitSegmentation
                | Command::CycleLabel { .. }
                | Command::QuickLabel(_)
                | Command::NavigateImage(_)
        )
    }
}

/// Result of a key press.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeyOutcome {
    /// The controller carried out the command
    Handled(Command),
    /// The host should carry out the command
    Delegated(Command),
    /// Not bound, or not applicable in the current state
    Unbound,
}

/// Key assignments.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    pub toggle_assist: Key,
    pub draw_mode: Key,
    pub edit_mode: Key,
    /// Alternative to Delete
    pub delete: Key,
    pub clear_all: Key,
    pub toggle_segmentation: Key,
    pub submit: Key,
    pub previous_image: Key,
    pub next_image: Key,
    /// Hotkeys for labels by index; `None` leaves the slot unbound
    pub label_hotkeys: [Option<Key>; MAX_LABEL_HOTKEYS],
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            toggle_assist: Key::Char('`'),
            draw_mode: Key::Char('w'),
            edit_mode: Key::Char('q'),
            delete: Key::Char('e'),
            clear_all: Key::Char('k'),
            toggle_segmentation: Key::Char('r'),
            submit: Key::Space,
            previous_image: Key::Char('a'),
            next_image: Key::Char('d'),
            label_hotkeys: [
                Some(Key::Char('1')),
                Some(Key::Char('2')),
                Some(Key::Char('3')),
                Some(Key::Char('4')),
                Some(Key::Char('5')),
                Some(Key::Char('6')),
                Some(Key::Char('7')),
                Some(Key::Char('8')),
                Some(Key::Char('9')),
            ],
        }
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Command bound to `key` with `modifiers`, if any.
    pub fn command_for(&self, key: Key, modifiers: Modifiers) -> Option<Command> {
        let key = key.normalized();

        if modifiers.command() {
            return match key {
                Key::Char('c') => Some(Command::Copy),
                Key::Char('v') => Some(Command::Paste),
                Key::Char('z') => Some(Command::Undo),
                Key::Left | Key::Right | Key::Up | Key::Down => nudge(key, true),
                _ => None,
            };
        }

        match key {
            Key::Left | Key::Right | Key::Up | Key::Down => return nudge(key, false),
            Key::Tab => {
                return Some(Command::CycleLabel {
                    backward: modifiers.shift,
                });
            }
            Key::Escape => return Some(Command::Escape),
            Key::Enter => return Some(Command::FinishDrawing),
            Key::Delete => return Some(Command::DeleteSelected),
            // Shifted backtick
            Key::Char('~') => return Some(Command::ToggleAssist),
            _ => {}
        }

        if let Some(index) = self.label_index_for_key(key) {
            return Some(Command::QuickLabel(index));
        }

        let bound = [
            (self.toggle_assist, Command::ToggleAssist),
            (self.draw_mode, Command::SetMode(ToolMode::Draw)),
            (self.edit_mode, Command::SetMode(ToolMode::Edit)),
            (self.delete, Command::DeleteSelected),
            (self.clear_all, Command::ClearAll),
            (self.toggle_segmentation, Command::ToggleSegmentationMode),
            (self.submit, Command::SubmitSegmentation),
            (self.previous_image, Command::NavigateImage(-1)),
            (self.next_image, Command::NavigateImage(1)),
        ];
        bound
            .into_iter()
            .find(|(k, _)| k.normalized() == key)
            .map(|(_, command)| command)
    }

    /// Label index (0-based) for a hotkey, if any.
    pub fn label_index_for_key(&self, key: Key) -> Option<usize> {
        let key = key.normalized();
        self.label_hotkeys
            .iter()
            .position(|hotkey| hotkey.map(Key::normalized) == Some(key))
    }

    /// Hotkey for the label at `index`, if any.
    pub fn key_for_label_index(&self, index: usize) -> Option<Key> {
        self.label_hotkeys.get(index).copied().flatten()
    }

    pub fn set_label_key(&mut self, index: usize, key: Option<Key>) {
        if index < MAX_LABEL_HOTKEYS {
            self.label_hotkeys[index] = key;
        }
    }
}

fn nudge(key: Key, coarse: bool) -> Option<Command> {
    let (dx, dy) = match key {
        Key::Left => (-1.0, 0.0),
        Key::Right => (1.0, 0.0),
        Key::Up => (0.0, -1.0),
        Key::Down => (0.0, 1.0),
        _ => return None,
    };
    Some(Command::Nudge { dx, dy, coarse })
}
