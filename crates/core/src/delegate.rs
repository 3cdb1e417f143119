//! Callbacks a core invokes on its host while a frame is running.
//!
//! Every method has a default body, so a host only implements the
//! capabilities it cares about. All calls happen synchronously from inside
//! [`crate::Core::update`] on the frame thread.

use crate::error::{CoreError, ProgramError};
use serde::{Deserialize, Serialize};

/// Keyboard requirements of the running program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyboardMode {
    #[default]
    Off,
    On,
    /// The program accepts keyboard input but also works without it
    Optional,
}

/// Input configuration requested by the running program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlsInfo {
    pub keyboard_mode: KeyboardMode,
    pub num_gamepads_enabled: u8,
    pub is_touch_enabled: bool,
    pub is_audio_enabled: bool,
}

impl ControlsInfo {
    /// Whether a host should show its text input, given whether the
    /// platform offers a software keyboard of its own.
    pub fn wants_text_input(&self, has_screen_keyboard: bool) -> bool {
        match self.keyboard_mode {
            KeyboardMode::On => true,
            KeyboardMode::Optional => !has_screen_keyboard,
            KeyboardMode::Off => false,
        }
    }
}

/// The core's in-memory virtual disk, as handed to the host for loading and
/// persisting.
pub trait DiskDrive {
    /// Replace the disk contents with the given text encoding.
    fn import_text(&mut self, text: &str) -> Result<(), CoreError>;

    /// Text encoding of the disk contents, or `None` if the disk is empty.
    fn export_text(&self) -> Option<String>;
}

/// Host capabilities the core calls back into.
pub trait CoreDelegate {
    /// The running program stopped with an error.
    fn interpreter_did_fail(&mut self, _error: &ProgramError) {}

    /// The virtual disk is about to be read.
    ///
    /// Return `false` if the disk is not ready yet. The core then waits
    /// until the host calls [`crate::runtime::Runtime::disk_loaded`].
    fn disk_drive_will_access(&mut self, _disk: &mut dyn DiskDrive) -> bool {
        true
    }

    /// A disk entry was saved and the disk image should be persisted.
    fn disk_drive_did_save(&mut self, _disk: &dyn DiskDrive) {}

    /// The program changed its keyboard, gamepad or touch configuration.
    fn controls_did_change(&mut self, _info: ControlsInfo) {}

    /// Persistent RAM is accessed for the first time; fill `destination`
    /// with previously stored contents, if any.
    fn persistent_ram_will_access(&mut self, _destination: &mut [u8]) {}

    /// Persistent RAM changed and should be stored.
    fn persistent_ram_did_change(&mut self, _data: &[u8]) {}
}

/// A delegate that accepts every disk access and ignores everything else.
#[derive(Debug, Default)]
pub struct NullDelegate;

impl CoreDelegate for NullDelegate {}
