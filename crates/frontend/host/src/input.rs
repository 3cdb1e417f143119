//! Input device abstraction layer
//!
//! Physical inputs (keyboard keys, gamepad buttons, axes and hats) are mapped
//! to the buttons of the console's two virtual gamepads through
//! serializable controller profiles.

use nx_core::GamepadButton;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Source of an input (which device control)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSource {
    /// Keyboard key by name (e.g., "Z", "Up", "LeftShift")
    KeyboardKey(String),
    /// Gamepad button by SDL2 button ID
    GamepadButton(u8),
    /// Gamepad axis by ID and direction (-1 for negative, 1 for positive)
    GamepadAxis { axis: u8, direction: i8 },
    /// Joystick hat by ID and direction (bitmask: 1=up, 2=right, 4=down, 8=left)
    JoystickHat { hat: u8, direction: u8 },
}

impl InputSource {
    pub fn key(name: &str) -> Self {
        InputSource::KeyboardKey(name.to_string())
    }
}

/// Buttons of a console gamepad that physical inputs can be mapped to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VirtualButton {
    Up,
    Down,
    Left,
    Right,
    A,
    B,
}

impl VirtualButton {
    pub const ALL: [VirtualButton; 6] = [
        VirtualButton::Up,
        VirtualButton::Down,
        VirtualButton::Left,
        VirtualButton::Right,
        VirtualButton::A,
        VirtualButton::B,
    ];
}

impl From<VirtualButton> for GamepadButton {
    fn from(button: VirtualButton) -> Self {
        match button {
            VirtualButton::Up => GamepadButton::Up,
            VirtualButton::Down => GamepadButton::Down,
            VirtualButton::Left => GamepadButton::Left,
            VirtualButton::Right => GamepadButton::Right,
            VirtualButton::A => GamepadButton::A,
            VirtualButton::B => GamepadButton::B,
        }
    }
}

/// Controller profile that maps physical inputs to virtual buttons.
///
/// A button can have several sources; it is held while any of them is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerProfile {
    /// Profile name (e.g., "Keyboard (Player 1)")
    pub name: String,
    pub mappings: HashMap<VirtualButton, Vec<InputSource>>,
}

impl ControllerProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mappings: HashMap::new(),
        }
    }

    /// Add a source for `button`, keeping sources already mapped to it
    pub fn map(mut self, button: VirtualButton, source: InputSource) -> Self {
        let sources = self.mappings.entry(button).or_default();
        if !sources.contains(&source) {
            sources.push(source);
        }
        self
    }

    pub fn sources(&self, button: VirtualButton) -> &[InputSource] {
        self.mappings.get(&button).map_or(&[], Vec::as_slice)
    }

    /// Virtual buttons `source` is mapped to
    pub fn buttons_for<'a>(
        &'a self,
        source: &'a InputSource,
    ) -> impl Iterator<Item = VirtualButton> + 'a {
        VirtualButton::ALL
            .into_iter()
            .filter(move |b| self.sources(*b).contains(source))
    }

    /// Standard gamepad sources: D-pad on hat 0 and the left stick, A/B on
    /// buttons 0 and 1
    fn with_gamepad(self) -> Self {
        self.map(VirtualButton::Up, InputSource::JoystickHat { hat: 0, direction: 1 })
            .map(VirtualButton::Right, InputSource::JoystickHat { hat: 0, direction: 2 })
            .map(VirtualButton::Down, InputSource::JoystickHat { hat: 0, direction: 4 })
            .map(VirtualButton::Left, InputSource::JoystickHat { hat: 0, direction: 8 })
            .map(VirtualButton::Left, InputSource::GamepadAxis { axis: 0, direction: -1 })
            .map(VirtualButton::Right, InputSource::GamepadAxis { axis: 0, direction: 1 })
            .map(VirtualButton::Up, InputSource::GamepadAxis { axis: 1, direction: -1 })
            .map(VirtualButton::Down, InputSource::GamepadAxis { axis: 1, direction: 1 })
            .map(VirtualButton::A, InputSource::GamepadButton(0))
            .map(VirtualButton::B, InputSource::GamepadButton(1))
    }

    /// Player 1: arrow keys, Z/X with N/M as alternates
    pub fn player1_default() -> Self {
        Self::new("Player 1 (Default)")
            .map(VirtualButton::Up, InputSource::key("Up"))
            .map(VirtualButton::Down, InputSource::key("Down"))
            .map(VirtualButton::Left, InputSource::key("Left"))
            .map(VirtualButton::Right, InputSource::key("Right"))
            .map(VirtualButton::A, InputSource::key("Z"))
            .map(VirtualButton::B, InputSource::key("X"))
            .map(VirtualButton::A, InputSource::key("N"))
            .map(VirtualButton::B, InputSource::key("M"))
            .with_gamepad()
    }

    /// Player 2: E/S/D/F, Tab/Q with LeftShift/A as alternates
    pub fn player2_default() -> Self {
        Self::new("Player 2 (Default)")
            .map(VirtualButton::Up, InputSource::key("E"))
            .map(VirtualButton::Down, InputSource::key("D"))
            .map(VirtualButton::Left, InputSource::key("S"))
            .map(VirtualButton::Right, InputSource::key("F"))
            .map(VirtualButton::A, InputSource::key("Tab"))
            .map(VirtualButton::B, InputSource::key("Q"))
            .map(VirtualButton::A, InputSource::key("LeftShift"))
            .map(VirtualButton::B, InputSource::key("A"))
            .with_gamepad()
    }

    pub fn defaults() -> [ControllerProfile; 2] {
        [Self::player1_default(), Self::player2_default()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player1_profile() {
        let profile = ControllerProfile::player1_default();
        assert_eq!(profile.name, "Player 1 (Default)");
        assert!(profile.sources(VirtualButton::A).contains(&InputSource::key("Z")));
        assert!(profile.sources(VirtualButton::A).contains(&InputSource::key("N")));
        assert!(profile
            .sources(VirtualButton::Up)
            .contains(&InputSource::JoystickHat { hat: 0, direction: 1 }));
    }

    #[test]
    fn test_player2_profile_keys() {
        let profile = ControllerProfile::player2_default();
        let tab = InputSource::key("Tab");
        assert_eq!(profile.buttons_for(&tab).collect::<Vec<_>>(), vec![VirtualButton::A]);
        let a = InputSource::key("A");
        assert_eq!(profile.buttons_for(&a).collect::<Vec<_>>(), vec![VirtualButton::B]);
    }

    #[test]
    fn test_duplicate_mapping_ignored() {
        let profile = ControllerProfile::new("Custom")
            .map(VirtualButton::A, InputSource::GamepadButton(0))
            .map(VirtualButton::A, InputSource::GamepadButton(0));
        assert_eq!(profile.sources(VirtualButton::A).len(), 1);
        assert!(profile.sources(VirtualButton::B).is_empty());
    }

    #[test]
    fn test_profile_serialization() {
        let profile = ControllerProfile::player2_default();
        let json = serde_json::to_string(&profile).expect("Failed to serialize");
        let loaded: ControllerProfile = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(loaded, profile);
    }
}
