//! Per-frame input snapshot.
//!
//! The host feeds raw events through the mutators during a frame, the scene
//! machine reads the query side in `update`, and the host then calls
//! [`InputState::end_frame`] to clear the edge-triggered state.

use std::collections::BTreeSet;

/// Keys the scenes react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    Escape,
    Backspace,
    Q,
    C,
    Shift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    keys_down: BTreeSet<Key>,
    keys_pressed: BTreeSet<Key>,
    keys_released: BTreeSet<Key>,
    buttons_down: BTreeSet<MouseButton>,
    buttons_pressed: BTreeSet<MouseButton>,
    buttons_released: BTreeSet<MouseButton>,
    cursor: (f64, f64),
    wheel: f64,
    typed: String,
    quit: bool,
    fps: f64,
    delta: f64,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    // -- queries --

    pub fn is_key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    pub fn is_key_just_pressed(&self, key: Key) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn is_key_just_released(&self, key: Key) -> bool {
        self.keys_released.contains(&key)
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    pub fn is_button_just_pressed(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn is_button_just_released(&self, button: MouseButton) -> bool {
        self.buttons_released.contains(&button)
    }

    /// Cursor position in viewport pixels.
    pub fn cursor(&self) -> (f64, f64) {
        self.cursor
    }

    /// Vertical wheel movement this frame, positive away from the user.
    pub fn wheel(&self) -> f64 {
        self.wheel
    }

    /// Characters typed this frame, in order.
    pub fn typed_chars(&self) -> &str {
        &self.typed
    }

    /// The window was asked to close.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Seconds since the previous frame.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    // -- mutators --

    /// Record a key transition. Repeated presses of a held key are ignored.
    pub fn key_event(&mut self, key: Key, pressed: bool) {
        if pressed {
            if self.keys_down.insert(key) {
                self.keys_pressed.insert(key);
            }
        } else if self.keys_down.remove(&key) {
            self.keys_released.insert(key);
        }
    }

    pub fn button_event(&mut self, button: MouseButton, pressed: bool) {
        if pressed {
            if self.buttons_down.insert(button) {
                self.buttons_pressed.insert(button);
            }
        } else if self.buttons_down.remove(&button) {
            self.buttons_released.insert(button);
        }
    }

    pub fn cursor_moved(&mut self, x: f64, y: f64) {
        self.cursor = (x, y);
    }

    pub fn scroll(&mut self, dy: f64) {
        self.wheel += dy;
    }

    pub fn text_typed(&mut self, text: &str) {
        self.typed.push_str(text);
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn set_timing(&mut self, fps: f64, delta: f64) {
        self.fps = fps;
        self.delta = delta;
    }

    /// Clear edge-triggered state. Held keys, held buttons, the cursor and
    /// the quit request carry over.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.keys_released.clear();
        self.buttons_pressed.clear();
        self.buttons_released.clear();
        self.wheel = 0.0;
        self.typed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_hold_release_cycle() {
        let mut input = InputState::new();
        input.key_event(Key::Enter, true);
        assert!(input.is_key_down(Key::Enter));
        assert!(input.is_key_just_pressed(Key::Enter));

        input.end_frame();
        // Auto-repeat while held.
        input.key_event(Key::Enter, true);
        assert!(input.is_key_down(Key::Enter));
        assert!(!input.is_key_just_pressed(Key::Enter));

        input.end_frame();
        input.key_event(Key::Enter, false);
        assert!(!input.is_key_down(Key::Enter));
        assert!(input.is_key_just_released(Key::Enter));

        input.end_frame();
        assert!(!input.is_key_just_released(Key::Enter));
    }

    #[test]
    fn release_without_press_is_ignored() {
        let mut input = InputState::new();
        input.button_event(MouseButton::Left, false);
        assert!(!input.is_button_just_released(MouseButton::Left));
    }

    #[test]
    fn buttons_track_edges() {
        let mut input = InputState::new();
        input.button_event(MouseButton::Right, true);
        assert!(input.is_button_just_pressed(MouseButton::Right));
        input.end_frame();
        assert!(input.is_button_down(MouseButton::Right));
        input.button_event(MouseButton::Right, false);
        assert!(input.is_button_just_released(MouseButton::Right));
        assert!(!input.is_button_down(MouseButton::Right));
    }

    #[test]
    fn wheel_and_text_reset_each_frame() {
        let mut input = InputState::new();
        input.scroll(1.0);
        input.scroll(0.5);
        input.text_typed("ab");
        input.text_typed("c");
        input.cursor_moved(10.0, 20.0);
        input.request_quit();
        assert_eq!(input.wheel(), 1.5);
        assert_eq!(input.typed_chars(), "abc");

        input.end_frame();
        assert_eq!(input.wheel(), 0.0);
        assert_eq!(input.typed_chars(), "");
        assert_eq!(input.cursor(), (10.0, 20.0));
        assert!(input.quit_requested());
    }

    #[test]
    fn timing_is_reported() {
        let mut input = InputState::new();
        input.set_timing(60.0, 1.0 / 60.0);
        assert_eq!(input.fps(), 60.0);
        assert!((input.delta() - 1.0 / 60.0).abs() < 1e-12);
    }
}
