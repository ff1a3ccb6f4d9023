//! Host-neutral input events.
//!
//! Positions are in screen (canvas) pixels; the controller maps them into
//! image space itself.

use crate::geometry::Point;

/// Input the controller responds to.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Mouse button pressed.
    MousePressed {
        button: MouseButton,
        position: Point,
        modifiers: Modifiers,
    },
    /// Mouse button released.
    MouseReleased {
        button: MouseButton,
        position: Point,
        modifiers: Modifiers,
    },
    /// Mouse moved.
    MouseMoved { position: Point, modifiers: Modifiers },
    /// Mouse wheel scrolled; positive `delta_y` scrolls down.
    MouseWheel { delta_y: f64, position: Point },
    /// Pointer left the canvas.
    MouseLeft,
    /// Keyboard key pressed.
    KeyPressed { key: Key, modifiers: Modifiers },
}

/// Mouse buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

/// Keyboard keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Delete,
    Tab,
    Space,
    Up,
    Down,
    Left,
    Right,
}

impl Key {
    /// Letters compare case-insensitively.
    pub fn normalized(self) -> Key {
        match self {
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }
}

/// Keyboard modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}
