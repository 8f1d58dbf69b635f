//! Platform-agnostic input events and per-frame input state.
//!
//! Window layers translate their native events into [`InputEvent`]s (see
//! [`winit::translate`]); the engine folds them into an [`InputState`] that
//! behaviours read during update.

pub mod winit;

use glam::Vec2;
use std::collections::{HashMap, HashSet};

/// Physical keyboard key identifier (US QWERTY position names)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum KeyCode {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,

    Digit0,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    Digit5,
    Digit6,
    Digit7,
    Digit8,
    Digit9,

    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,

    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,

    Space,
    Enter,
    Escape,
    Tab,
    Backspace,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    Other(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Started,
    Moved,
    Ended,
    Cancelled,
}

/// One input event as delivered by the window layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    Key { key: KeyCode, pressed: bool },
    MouseButton { button: MouseButton, pressed: bool },
    CursorMoved { position: Vec2 },
    Scroll { delta: Vec2 },
    Touch { id: u64, phase: TouchPhase, position: Vec2 },
}

/// Accumulated input for the current frame
#[derive(Debug, Default, Clone)]
pub struct InputState {
    keys: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,
    keys_released: HashSet<KeyCode>,
    buttons: HashSet<MouseButton>,
    buttons_pressed: HashSet<MouseButton>,
    /// `None` until the first cursor event
    cursor: Option<Vec2>,
    cursor_delta: Vec2,
    scroll: Vec2,
    touches: HashMap<u64, Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Key { key, pressed: true } => {
                if self.keys.insert(key) {
                    self.keys_pressed.insert(key);
                }
            }
            InputEvent::Key { key, pressed: false } => {
                if self.keys.remove(&key) {
                    self.keys_released.insert(key);
                }
            }
            InputEvent::MouseButton {
                button,
                pressed: true,
            } => {
                if self.buttons.insert(button) {
                    self.buttons_pressed.insert(button);
                }
            }
            InputEvent::MouseButton {
                button,
                pressed: false,
            } => {
                self.buttons.remove(&button);
            }
            InputEvent::CursorMoved { position } => {
                if let Some(previous) = self.cursor.replace(position) {
                    self.cursor_delta += position - previous;
                }
            }
            InputEvent::Scroll { delta } => self.scroll += delta,
            InputEvent::Touch {
                id,
                phase,
                position,
            } => match phase {
                TouchPhase::Started | TouchPhase::Moved => {
                    self.touches.insert(id, position);
                }
                TouchPhase::Ended | TouchPhase::Cancelled => {
                    self.touches.remove(&id);
                }
            },
        }
    }

    /// Clear the per-frame sets and accumulators
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.cursor_delta = Vec2::ZERO;
        self.scroll = Vec2::ZERO;
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }

    /// Pressed during this frame
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn is_key_released(&self, key: KeyCode) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn is_button_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn cursor(&self) -> Vec2 {
        self.cursor.unwrap_or(Vec2::ZERO)
    }

    pub fn cursor_delta(&self) -> Vec2 {
        self.cursor_delta
    }

    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn touches(&self) -> impl Iterator<Item = (u64, Vec2)> + '_ {
        self.touches.iter().map(|(id, position)| (*id, *position))
    }

    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }
}
