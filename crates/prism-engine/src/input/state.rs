use std::collections::HashSet;

use super::types::{InputEvent, Key, KeyState};

/// Current input state for the window.
///
/// Answers the two polling queries the frame loop needs: "is this key held"
/// and "where is the pointer".
#[derive(Debug, Default)]
pub struct InputState {
    /// Whether the window is focused.
    pub focused: bool,

    /// Last pointer position in physical pixels; `None` until the pointer first
    /// enters. Leaving the window keeps the last position.
    pub pointer_pos: Option<(f64, f64)>,

    /// Set of currently held keys.
    pub keys_down: HashSet<Key>,
}

impl InputState {
    /// Applies one event. Returns `true` when it was a fresh key press
    /// (not a repeat of a key already held).
    pub fn apply_event(&mut self, ev: InputEvent) -> bool {
        match ev {
            InputEvent::Focused(f) => {
                self.focused = f;
                if !f {
                    // Releases are not delivered to unfocused windows.
                    self.keys_down.clear();
                }
                false
            }

            InputEvent::PointerMoved { x, y } => {
                self.pointer_pos = Some((x, y));
                false
            }

            // Last known position is kept for polling; only the flag changes.
            InputEvent::PointerLeft => false,

            InputEvent::Key { key, state, .. } => match state {
                KeyState::Pressed => self.keys_down.insert(key),
                KeyState::Released => {
                    self.keys_down.remove(&key);
                    false
                }
            },
        }
    }

    pub fn key_down(&self, key: Key) -> bool {
        self.keys_down.contains(&key)
    }

    /// Pointer position rounded to whole pixels, `(0, 0)` before the first move.
    pub fn pointer_pixels(&self) -> (i32, i32) {
        let (x, y) = self.pointer_pos.unwrap_or((0.0, 0.0));
        (x.round() as i32, y.round() as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, state: KeyState) -> InputEvent {
        InputEvent::Key { key, state, repeat: false }
    }

    #[test]
    fn press_then_release() {
        let mut s = InputState::default();
        assert!(s.apply_event(key(Key::ShiftRight, KeyState::Pressed)));
        assert!(s.key_down(Key::ShiftRight));
        assert!(!s.key_down(Key::ShiftLeft));

        s.apply_event(key(Key::ShiftRight, KeyState::Released));
        assert!(!s.key_down(Key::ShiftRight));
    }

    #[test]
    fn repeated_press_is_not_fresh() {
        let mut s = InputState::default();
        assert!(s.apply_event(key(Key::R, KeyState::Pressed)));
        assert!(!s.apply_event(key(Key::R, KeyState::Pressed)));
    }

    #[test]
    fn focus_loss_clears_held_keys() {
        let mut s = InputState::default();
        s.apply_event(key(Key::ShiftRight, KeyState::Pressed));
        s.apply_event(InputEvent::Focused(false));
        assert!(s.keys_down.is_empty());
        assert!(!s.focused);
    }

    #[test]
    fn pointer_rounds_to_pixels() {
        let mut s = InputState::default();
        assert_eq!(s.pointer_pixels(), (0, 0));
        s.apply_event(InputEvent::PointerMoved { x: 10.6, y: 3.2 });
        assert_eq!(s.pointer_pixels(), (11, 3));
        s.apply_event(InputEvent::PointerLeft);
        assert_eq!(s.pointer_pixels(), (11, 3));
    }

    #[test]
    fn pointer_position_survives_leaving_the_window() {
        let mut s = InputState::default();
        assert_eq!(s.pointer_pos, None);
        s.apply_event(InputEvent::PointerMoved { x: 4.0, y: 8.0 });
        s.apply_event(InputEvent::PointerLeft);
        assert_eq!(s.pointer_pos, Some((4.0, 8.0)));
    }
}
