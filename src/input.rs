//! Keyboard state for the three game actions.

use std::collections::HashSet;

use winit::{
    event::{ElementState, KeyEvent},
    keyboard::{KeyCode, PhysicalKey},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Jump,
}

impl Key {
    pub fn from_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::ArrowLeft | KeyCode::KeyA => Some(Key::Left),
            KeyCode::ArrowRight | KeyCode::KeyD => Some(Key::Right),
            KeyCode::Space | KeyCode::ArrowUp | KeyCode::KeyW => Some(Key::Jump),
            _ => None,
        }
    }
}

/// "Is held" plus "went down this frame" for every [`Key`].
///
/// Press edges accumulate until [`end_frame`](Self::end_frame), so a tap that
/// starts and ends between two frames is still seen once.
#[derive(Clone, Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    pressed: HashSet<Key>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&mut self, key: Key) {
        if self.held.insert(key) {
            self.pressed.insert(key);
        }
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(key) = Key::from_code(code) else {
            return;
        };
        match event.state {
            ElementState::Pressed => self.press(key),
            ElementState::Released => self.release(key),
        }
    }

    /// Drops held keys, e.g. when the window loses focus mid-press.
    pub fn clear(&mut self) {
        self.held.clear();
        self.pressed.clear();
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn was_pressed(&self, key: Key) -> bool {
        self.pressed.contains(&key)
    }

    pub fn end_frame(&mut self) {
        self.pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_edge_lasts_one_frame() {
        let mut input = InputState::new();
        input.press(Key::Jump);
        input.press(Key::Jump);
        assert!(input.was_pressed(Key::Jump));
        input.end_frame();
        assert!(input.is_held(Key::Jump));
        assert!(!input.was_pressed(Key::Jump));
    }
}
