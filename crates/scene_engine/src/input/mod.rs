//! Input management system
//!
//! Polled input state. The windowing layer feeds raw events in through the
//! `handle_*` methods; consumers such as the camera controller read the state
//! once per frame, after which [`InputManager::end_frame`] clears the
//! per-frame deltas.

use crate::foundation::math::Vec2;
use std::collections::HashSet;

/// Input manager
#[derive(Debug, Clone, Default)]
pub struct InputManager {
    keys_down: HashSet<KeyCode>,
    buttons_down: HashSet<MouseButton>,
    mouse_position: Option<Vec2>,
    mouse_delta: Vec2,
    scroll_delta: f32,
}

impl InputManager {
    /// Create a new input manager
    pub fn new() -> Self {
        Self {
            mouse_delta: Vec2::zeros(),
            ..Default::default()
        }
    }

    /// Clear per-frame deltas; held keys and buttons persist
    pub fn end_frame(&mut self) {
        self.mouse_delta = Vec2::zeros();
        self.scroll_delta = 0.0;
    }

    /// Handle key input
    pub fn handle_key_input(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.keys_down.insert(key);
        } else {
            self.keys_down.remove(&key);
        }
    }

    /// Handle mouse button input
    pub fn handle_mouse_button(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            self.buttons_down.insert(button);
        } else {
            self.buttons_down.remove(&button);
        }
    }

    /// Handle mouse movement in widget pixels
    ///
    /// The first sample only records the position.
    pub fn handle_mouse_move(&mut self, x: f64, y: f64) {
        let position = Vec2::new(x as f32, y as f32);
        if let Some(previous) = self.mouse_position {
            self.mouse_delta += position - previous;
        }
        self.mouse_position = Some(position);
    }

    /// Handle scroll wheel input in notches, positive away from the user
    pub fn handle_scroll(&mut self, delta: f64) {
        self.scroll_delta += delta as f32;
    }

    /// Whether a key is held
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys_down.contains(&key)
    }

    /// Whether a mouse button is held
    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    /// Last known cursor position
    pub fn mouse_position(&self) -> Option<Vec2> {
        self.mouse_position
    }

    /// Cursor motion since the last `end_frame`
    pub fn mouse_delta(&self) -> Vec2 {
        self.mouse_delta
    }

    /// Scroll since the last `end_frame`
    pub fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }

    /// `+1`, `-1` or `0` from a pair of opposing keys
    pub fn axis(&self, positive: KeyCode, negative: KeyCode) -> f32 {
        f32::from(u8::from(self.is_key_down(positive))) - f32::from(u8::from(self.is_key_down(negative)))
    }
}

/// Key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// Left arrow
    Left,
    /// Right arrow
    Right,
    /// Up arrow
    Up,
    /// Down arrow
    Down,
    /// Page up
    PageUp,
    /// Page down
    PageDown,
    /// Left shift
    LeftShift,
    /// Escape
    Escape,
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Left mouse button
    Left,
    /// Right mouse button
    Right,
    /// Middle mouse button
    Middle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_and_button_state() {
        let mut input = InputManager::new();
        input.handle_key_input(KeyCode::Up, true);
        input.handle_mouse_button(MouseButton::Right, true);

        assert!(input.is_key_down(KeyCode::Up));
        assert!(input.is_button_down(MouseButton::Right));
        assert_eq!(input.axis(KeyCode::Up, KeyCode::Down), 1.0);

        input.handle_key_input(KeyCode::Up, false);
        assert!(!input.is_key_down(KeyCode::Up));
        assert_eq!(input.axis(KeyCode::Up, KeyCode::Down), 0.0);
    }

    #[test]
    fn test_mouse_delta_accumulates_until_end_frame() {
        let mut input = InputManager::new();
        input.handle_mouse_move(10.0, 10.0);
        assert_eq!(input.mouse_delta(), Vec2::zeros());

        input.handle_mouse_move(15.0, 12.0);
        input.handle_mouse_move(20.0, 11.0);
        input.handle_scroll(1.0);
        assert_eq!(input.mouse_delta(), Vec2::new(10.0, 1.0));
        assert_eq!(input.scroll_delta(), 1.0);

        input.end_frame();
        assert_eq!(input.mouse_delta(), Vec2::zeros());
        assert_eq!(input.scroll_delta(), 0.0);
        assert_eq!(input.mouse_position(), Some(Vec2::new(20.0, 11.0)));
    }
}
