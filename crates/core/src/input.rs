//! Per-frame input snapshot
//!
//! The host mutates an [`InputSnapshot`] from its event handlers between
//! frames. The runtime reads it once per frame, after which
//! [`InputSnapshot::end_frame`] clears the edge-triggered fields.

use serde::{Deserialize, Serialize};

/// Number of gamepad slots the console exposes.
pub const NUM_GAMEPADS: usize = 2;

/// Buttons of one console gamepad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GamepadButton {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
}

impl GamepadButton {
    pub const ALL: [GamepadButton; 6] = [
        GamepadButton::Up,
        GamepadButton::Down,
        GamepadButton::Left,
        GamepadButton::Right,
        GamepadButton::A,
        GamepadButton::B,
    ];
}

/// Held state of one gamepad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub button_a: bool,
    pub button_b: bool,
}

impl GamepadState {
    pub fn set(&mut self, button: GamepadButton, pressed: bool) {
        match button {
            GamepadButton::Up => self.up = pressed,
            GamepadButton::Down => self.down = pressed,
            GamepadButton::Left => self.left = pressed,
            GamepadButton::Right => self.right = pressed,
            GamepadButton::A => self.button_a = pressed,
            GamepadButton::B => self.button_b = pressed,
        }
    }

    pub fn is_pressed(&self, button: GamepadButton) -> bool {
        match button {
            GamepadButton::Up => self.up,
            GamepadButton::Down => self.down,
            GamepadButton::Left => self.left,
            GamepadButton::Right => self.right,
            GamepadButton::A => self.button_a,
            GamepadButton::B => self.button_b,
        }
    }

    /// Packed status byte: bit 0 up, 1 down, 2 left, 3 right, 4 A, 5 B.
    pub fn status(&self) -> u8 {
        GamepadButton::ALL
            .iter()
            .enumerate()
            .filter(|(_, button)| self.is_pressed(**button))
            .fold(0u8, |acc, (bit, _)| acc | (1 << bit))
    }
}

/// A single buffered key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyInput {
    /// ASCII `' '..='_'`, letters folded to uppercase
    Char(u8),
    Return,
    Backspace,
}

impl KeyInput {
    /// Build a character key, folding `a..=z` to uppercase.
    ///
    /// Only `' '..='_'` is accepted after folding, so backquote, braces, bar
    /// and tilde are rejected along with everything outside ASCII.
    pub fn from_char(c: char) -> Option<Self> {
        if !c.is_ascii() {
            return None;
        }
        let code = c.to_ascii_uppercase() as u8;
        if (b' '..=b'_').contains(&code) {
            Some(KeyInput::Char(code))
        } else {
            None
        }
    }

    /// Byte value as seen by the console: `'\n'` for return, `'\b'` for
    /// backspace.
    pub fn code(&self) -> u8 {
        match self {
            KeyInput::Char(c) => *c,
            KeyInput::Return => b'\n',
            KeyInput::Backspace => 0x08,
        }
    }
}

/// Touch or mouse pointer in virtual display coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TouchState {
    pub active: bool,
    pub x: i32,
    pub y: i32,
}

/// Input accumulated between two frames.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub gamepads: [GamepadState; NUM_GAMEPADS],
    pub key: Option<KeyInput>,
    pub pause: bool,
    pub touch: TouchState,
    #[serde(skip)]
    touch_release_pending: bool,
}

impl InputSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Press a gamepad button. Out-of-range players are ignored.
    pub fn press(&mut self, player: usize, button: GamepadButton) {
        if let Some(pad) = self.gamepads.get_mut(player) {
            pad.set(button, true);
        }
    }

    /// Release a gamepad button. Releasing an already released button is a no-op.
    pub fn release(&mut self, player: usize, button: GamepadButton) {
        if let Some(pad) = self.gamepads.get_mut(player) {
            pad.set(button, false);
        }
    }

    /// Replace the whole state of one gamepad, as polled from a device.
    pub fn set_gamepad(&mut self, player: usize, state: GamepadState) {
        if let Some(pad) = self.gamepads.get_mut(player) {
            *pad = state;
        }
    }

    /// Buffer a key press, overwriting any key not yet consumed.
    pub fn push_key(&mut self, key: KeyInput) {
        self.key = Some(key);
    }

    /// Buffer a typed character. Returns false if the character was not
    /// printable ASCII and was dropped.
    pub fn push_char(&mut self, c: char) -> bool {
        match KeyInput::from_char(c) {
            Some(key) => {
                self.push_key(key);
                true
            }
            None => false,
        }
    }

    pub fn request_pause(&mut self) {
        self.pause = true;
    }

    pub fn touch_pressed(&mut self, x: i32, y: i32) {
        self.touch = TouchState { active: true, x, y };
        self.touch_release_pending = false;
    }

    /// Move the pointer. The position is tracked even when not pressed, the
    /// way a mouse hovers.
    pub fn touch_moved(&mut self, x: i32, y: i32) {
        self.touch.x = x;
        self.touch.y = y;
    }

    /// Release the pointer. The release takes effect at the end of the
    /// current frame so a press and release within one frame is still seen.
    pub fn touch_released(&mut self) {
        if self.touch.active {
            self.touch_release_pending = true;
        }
    }

    /// Whether anything edge-triggered is waiting to be consumed.
    pub fn has_pending_edges(&self) -> bool {
        self.key.is_some() || self.pause || self.touch_release_pending
    }

    /// Clear edge-triggered state once the runtime has consumed the frame.
    /// Held buttons and the pointer position are kept.
    pub fn end_frame(&mut self) {
        self.key = None;
        self.pause = false;
        if self.touch_release_pending {
            self.touch.active = false;
            self.touch_release_pending = false;
        }
    }

    /// Drop everything, including held buttons, e.g. when focus is lost.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_starts_empty() {
        let snapshot = InputSnapshot::new();
        assert_eq!(snapshot.gamepads[0], GamepadState::default());
        assert_eq!(snapshot.key, None);
        assert!(!snapshot.pause);
        assert!(!snapshot.touch.active);
        assert!(!snapshot.has_pending_edges());
    }

    #[test]
    fn test_press_release_net_state() {
        let mut snapshot = InputSnapshot::new();
        snapshot.press(0, GamepadButton::Left);
        snapshot.press(0, GamepadButton::A);
        snapshot.release(0, GamepadButton::Left);
        snapshot.release(0, GamepadButton::Left);
        snapshot.press(1, GamepadButton::Down);

        assert!(!snapshot.gamepads[0].left);
        assert!(snapshot.gamepads[0].button_a);
        assert!(snapshot.gamepads[1].down);
        assert!(!snapshot.gamepads[1].button_a);
    }

    #[test]
    fn test_out_of_range_player_ignored() {
        let mut snapshot = InputSnapshot::new();
        snapshot.press(2, GamepadButton::A);
        assert_eq!(snapshot, InputSnapshot::new());
    }

    #[test]
    fn test_held_buttons_survive_end_frame() {
        let mut snapshot = InputSnapshot::new();
        snapshot.press(0, GamepadButton::Right);
        for _ in 0..5 {
            snapshot.end_frame();
            assert!(snapshot.gamepads[0].right);
        }
    }

    #[test]
    fn test_latest_key_wins() {
        let mut snapshot = InputSnapshot::new();
        assert!(snapshot.push_char('a'));
        assert!(snapshot.push_char('b'));
        assert_eq!(snapshot.key, Some(KeyInput::Char(b'B')));

        snapshot.push_key(KeyInput::Return);
        assert_eq!(snapshot.key.map(|k| k.code()), Some(b'\n'));

        snapshot.end_frame();
        assert_eq!(snapshot.key, None);
    }

    #[test]
    fn test_non_printable_chars_dropped() {
        let mut snapshot = InputSnapshot::new();
        assert!(!snapshot.push_char('\u{7f}'));
        assert!(!snapshot.push_char('é'));
        assert!(!snapshot.push_char('\t'));
        assert!(!snapshot.push_char('~'));
        assert!(!snapshot.push_char('`'));
        assert!(!snapshot.push_char('{'));
        assert_eq!(snapshot.key, None);
        assert!(snapshot.push_char('_'));
        assert_eq!(snapshot.key, Some(KeyInput::Char(b'_')));
        assert!(snapshot.push_char('z'));
        assert_eq!(snapshot.key, Some(KeyInput::Char(b'Z')));
    }

    #[test]
    fn test_pause_is_edge_triggered() {
        let mut snapshot = InputSnapshot::new();
        snapshot.request_pause();
        assert!(snapshot.pause);
        snapshot.end_frame();
        assert!(!snapshot.pause);
    }

    #[test]
    fn test_touch_release_is_deferred_to_end_of_frame() {
        let mut snapshot = InputSnapshot::new();
        snapshot.touch_pressed(10, 20);
        snapshot.touch_released();
        // Still visible for the frame in which it was pressed
        assert!(snapshot.touch.active);
        snapshot.end_frame();
        assert!(!snapshot.touch.active);
        assert_eq!((snapshot.touch.x, snapshot.touch.y), (10, 20));
    }

    #[test]
    fn test_touch_press_cancels_pending_release() {
        let mut snapshot = InputSnapshot::new();
        snapshot.touch_pressed(1, 1);
        snapshot.touch_released();
        snapshot.touch_pressed(2, 2);
        snapshot.end_frame();
        assert!(snapshot.touch.active);
    }

    #[test]
    fn test_gamepad_status_bits() {
        let mut pad = GamepadState::default();
        pad.set(GamepadButton::Up, true);
        pad.set(GamepadButton::B, true);
        assert_eq!(pad.status(), 0b10_0001);
    }
}
