//! Hosting primitives for the LowRes NX fantasy console runtime.
//!
//! The console itself (interpreter, video chip, virtual disk) sits behind the
//! [`Core`] trait. This crate provides what a host needs around it: the
//! per-frame [`input::InputSnapshot`], the [`delegate::CoreDelegate`]
//! callback protocol and the [`runtime::Runtime`] wrapper that drives one
//! core a frame at a time.

pub mod delegate;
pub mod error;
pub mod input;
pub mod logging;
pub mod runtime;

pub use delegate::{ControlsInfo, CoreDelegate, DiskDrive, KeyboardMode};
pub use error::{CoreError, ErrorCode, ProgramError, SourceLine};
pub use input::{GamepadButton, GamepadState, InputSnapshot, KeyInput};
pub use runtime::{Runtime, RuntimeState};

/// Width of the virtual display in pixels.
pub const DISPLAY_WIDTH: u32 = 160;
/// Height of the virtual display in pixels.
pub const DISPLAY_HEIGHT: u32 = 128;
/// Bytes per pixel of a rendered frame (RGBA8).
pub const BYTES_PER_PIXEL: usize = 4;

pub mod types {
    use super::{BYTES_PER_PIXEL, DISPLAY_HEIGHT, DISPLAY_WIDTH};
    use serde::{Deserialize, Serialize};

    /// An RGBA8 framebuffer of the virtual display.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Frame {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<u8>,
    }

    impl Frame {
        /// A black frame the size of the virtual display.
        pub fn new() -> Self {
            Self::with_size(DISPLAY_WIDTH, DISPLAY_HEIGHT)
        }

        pub fn with_size(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                pixels: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
            }
        }

        /// Bytes per row.
        pub fn stride(&self) -> usize {
            self.width as usize * BYTES_PER_PIXEL
        }

        /// RGBA of one pixel, or `None` outside the frame.
        pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
            if x >= self.width || y >= self.height {
                return None;
            }
            let i = y as usize * self.stride() + x as usize * BYTES_PER_PIXEL;
            let p = &self.pixels[i..i + BYTES_PER_PIXEL];
            Some([p[0], p[1], p[2], p[3]])
        }

        /// Pixels packed as 0xAARRGGBB, the layout most window backends blit.
        pub fn to_argb(&self) -> Vec<u32> {
            self.pixels
                .chunks_exact(BYTES_PER_PIXEL)
                .map(|p| {
                    (u32::from(p[3]) << 24)
                        | (u32::from(p[0]) << 16)
                        | (u32::from(p[1]) << 8)
                        | u32::from(p[2])
                })
                .collect()
        }
    }

    impl Default for Frame {
        fn default() -> Self {
            Self::new()
        }
    }
}

/// The console runtime, treated as a black box.
///
/// Implementations own the interpreter state, program memory, display and
/// virtual disk. A [`Runtime`] owns exactly one core and is the only thing
/// that calls into it.
pub trait Core {
    /// Parse and validate a program. Does not start execution.
    fn compile_program(&mut self, source: &str) -> Result<(), CoreError>;

    /// Called once before the first frame of a compiled program.
    fn will_run_program(&mut self, seconds_since_power_on: u64);

    /// Advance one frame with the given input, calling back into
    /// `delegate` as needed before returning. Must not block.
    fn update(&mut self, input: &InputSnapshot, delegate: &mut dyn CoreDelegate);

    /// Fill `buffer` with the current display as RGBA8 rows of `stride` bytes.
    fn render_screen(&self, buffer: &mut [u8], stride: usize);

    /// Load the virtual disk from its text encoding.
    fn disk_import(&mut self, text: &str) -> Result<(), CoreError>;

    /// Text encoding of the virtual disk, `None` if there is nothing to save.
    fn disk_export(&self) -> Option<String>;

    /// Resume a disk access that the delegate deferred.
    fn disk_loaded(&mut self);

    /// The error the current program stopped with, if any.
    fn exit_error(&self) -> Option<CoreError>;

    fn set_debug(&mut self, _enabled: bool) {}

    fn debug(&self) -> bool {
        false
    }

    /// Release all resources. Called at most once; no other call follows.
    fn shutdown(&mut self) {}
}
