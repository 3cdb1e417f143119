//! Input mapper
//!
//! Tracks which physical controls are currently held and resolves them to
//! console gamepad state using the controller profiles.

use crate::input::{ControllerProfile, InputSource, VirtualButton};
use nx_core::input::NUM_GAMEPADS;
use nx_core::logging::{log, LogCategory, LogLevel};
use nx_core::{GamepadState, InputSnapshot};
use std::collections::{HashMap, HashSet};

/// Axis deflection past which a stick counts as a pressed direction
pub const AXIS_THRESHOLD: i16 = 16384;

/// Held controls of one physical gamepad
#[derive(Debug, Default, Clone)]
struct PadInputs {
    buttons: HashSet<u8>,
    axes: HashMap<u8, i16>,
    hats: HashMap<u8, u8>,
}

/// Resolves virtual button states from physical inputs.
///
/// Keyboard keys apply to every player whose profile maps them; gamepad
/// device `n` drives player `n`.
pub struct InputMapper {
    pub profiles: [ControllerProfile; NUM_GAMEPADS],
    held_keys: HashSet<String>,
    pads: [PadInputs; NUM_GAMEPADS],
}

impl InputMapper {
    pub fn new() -> Self {
        Self::with_profiles(ControllerProfile::defaults())
    }

    pub fn with_profiles(profiles: [ControllerProfile; NUM_GAMEPADS]) -> Self {
        Self {
            profiles,
            held_keys: HashSet::new(),
            pads: Default::default(),
        }
    }

    pub fn get_profile(&self, player: usize) -> Option<&ControllerProfile> {
        self.profiles.get(player)
    }

    pub fn set_profile(&mut self, player: usize, profile: ControllerProfile) {
        if let Some(slot) = self.profiles.get_mut(player) {
            *slot = profile;
        }
    }

    /// Whether any profile maps the named key.
    pub fn is_mapped_key(&self, name: &str) -> bool {
        let source = InputSource::key(name);
        self.profiles
            .iter()
            .any(|p| p.buttons_for(&source).next().is_some())
    }

    /// Record a key press. Returns true if the key drives a gamepad button.
    pub fn key_down(&mut self, name: &str) -> bool {
        self.held_keys.insert(name.to_string());
        self.is_mapped_key(name)
    }

    /// Record a key release. Releasing a key that is not held is a no-op.
    pub fn key_up(&mut self, name: &str) -> bool {
        self.held_keys.remove(name);
        self.is_mapped_key(name)
    }

    pub fn gamepad_button(&mut self, device: usize, button: u8, pressed: bool) {
        let Some(pad) = self.pads.get_mut(device) else {
            log(LogCategory::Input, LogLevel::Trace, || {
                format!("Input: ignoring button {} of gamepad {}", button, device)
            });
            return;
        };
        if pressed {
            pad.buttons.insert(button);
        } else {
            pad.buttons.remove(&button);
        }
    }

    pub fn gamepad_axis(&mut self, device: usize, axis: u8, value: i16) {
        if let Some(pad) = self.pads.get_mut(device) {
            pad.axes.insert(axis, value);
        }
    }

    pub fn joystick_hat(&mut self, device: usize, hat: u8, mask: u8) {
        if let Some(pad) = self.pads.get_mut(device) {
            pad.hats.insert(hat, mask);
        }
    }

    /// Check if an input source is currently active for `player`
    pub fn is_source_active(&self, player: usize, source: &InputSource) -> bool {
        match source {
            InputSource::KeyboardKey(name) => self.held_keys.contains(name),
            InputSource::GamepadButton(button) => self
                .pads
                .get(player)
                .is_some_and(|pad| pad.buttons.contains(button)),
            InputSource::GamepadAxis { axis, direction } => {
                let value = self
                    .pads
                    .get(player)
                    .and_then(|pad| pad.axes.get(axis).copied())
                    .unwrap_or(0);
                match direction {
                    -1 => value < -AXIS_THRESHOLD,
                    1 => value > AXIS_THRESHOLD,
                    _ => false,
                }
            }
            InputSource::JoystickHat { hat, direction } => self
                .pads
                .get(player)
                .and_then(|pad| pad.hats.get(hat))
                .is_some_and(|mask| mask & direction != 0),
        }
    }

    /// Net state of one console gamepad: a button is held while any of its
    /// mapped sources is held.
    pub fn gamepad_state(&self, player: usize) -> GamepadState {
        let mut state = GamepadState::default();
        let Some(profile) = self.profiles.get(player) else {
            return state;
        };
        for button in VirtualButton::ALL {
            let held = profile
                .sources(button)
                .iter()
                .any(|source| self.is_source_active(player, source));
            state.set(button.into(), held);
        }
        state
    }

    /// Write both gamepads into the snapshot.
    pub fn apply_to(&self, snapshot: &mut InputSnapshot) {
        for player in 0..NUM_GAMEPADS {
            snapshot.set_gamepad(player, self.gamepad_state(player));
        }
    }

    /// Forget every held control, e.g. when the window loses focus.
    pub fn clear(&mut self) {
        self.held_keys.clear();
        self.pads = Default::default();
    }
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternate_keys_are_ored() {
        let mut mapper = InputMapper::new();
        mapper.key_down("Z");
        mapper.key_down("N");
        mapper.key_up("Z");
        // N still holds A
        assert!(mapper.gamepad_state(0).button_a);
        mapper.key_up("N");
        assert!(!mapper.gamepad_state(0).button_a);
    }

    #[test]
    fn test_release_is_idempotent() {
        let mut mapper = InputMapper::new();
        mapper.key_down("Left");
        mapper.key_up("Left");
        mapper.key_up("Left");
        assert_eq!(mapper.gamepad_state(0), GamepadState::default());
    }

    #[test]
    fn test_keys_route_to_their_player() {
        let mut mapper = InputMapper::new();
        assert!(mapper.key_down("E"));
        assert!(mapper.gamepad_state(1).up);
        assert!(!mapper.gamepad_state(0).up);
        assert!(!mapper.key_down("K"));
    }

    #[test]
    fn test_axis_threshold() {
        let mut mapper = InputMapper::new();
        mapper.gamepad_axis(0, 0, -AXIS_THRESHOLD);
        assert!(!mapper.gamepad_state(0).left);
        mapper.gamepad_axis(0, 0, -AXIS_THRESHOLD - 1);
        assert!(mapper.gamepad_state(0).left);
        mapper.gamepad_axis(0, 1, 20000);
        assert!(mapper.gamepad_state(0).down);
        // Device 0 does not drive player 2
        assert!(!mapper.gamepad_state(1).left);
    }

    #[test]
    fn test_hat_and_buttons() {
        let mut mapper = InputMapper::new();
        mapper.joystick_hat(1, 0, 1 | 2);
        mapper.gamepad_button(1, 1, true);
        let state = mapper.gamepad_state(1);
        assert!(state.up && state.right && state.button_b);
        assert!(!state.down);

        mapper.gamepad_button(1, 1, false);
        mapper.joystick_hat(1, 0, 0);
        assert_eq!(mapper.gamepad_state(1), GamepadState::default());
    }

    #[test]
    fn test_unknown_device_ignored() {
        let mut mapper = InputMapper::new();
        mapper.gamepad_button(5, 0, true);
        assert_eq!(mapper.gamepad_state(0), GamepadState::default());
        assert_eq!(mapper.gamepad_state(1), GamepadState::default());
    }

    #[test]
    fn test_apply_and_clear() {
        let mut mapper = InputMapper::new();
        let mut snapshot = InputSnapshot::new();
        mapper.key_down("Right");
        mapper.key_down("Q");
        mapper.apply_to(&mut snapshot);
        assert!(snapshot.gamepads[0].right);
        assert!(snapshot.gamepads[1].button_b);

        mapper.clear();
        mapper.apply_to(&mut snapshot);
        assert_eq!(snapshot.gamepads, [GamepadState::default(); 2]);
    }
}
