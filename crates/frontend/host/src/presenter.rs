//! Presenter: connects a window or view to a runtime.
//!
//! The presenter turns host events into the input snapshot, drives the
//! runtime once per scheduler tick, hands the rendered frame to a
//! [`DisplaySurface`] and shows whatever the core reported during the frame.

use crate::error::HostError;
use crate::geometry::DisplayGeometry;
use crate::host_delegate::HostDelegate;
use crate::input_mapper::InputMapper;
use crate::scheduler::FrameScheduler;
use crate::settings::HostSettings;
use nx_core::logging::{log, LogCategory, LogLevel};
use nx_core::types::Frame;
use nx_core::{ControlsInfo, Core, InputSnapshot, KeyInput, KeyboardMode, Runtime};
use nx_core::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use std::cell::RefCell;
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

/// Joystick button that pauses the program, as on most pads' third button
pub const PAUSE_BUTTON: u8 = 2;

/// Events a host window delivers to the presenter.
///
/// Keys use the names of [`crate::input::InputSource::KeyboardKey`]
/// ("A".."Z", "Up", "Enter", "Backspace", "Escape", "Tab", "LeftShift").
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    KeyDown { key: String, ctrl: bool },
    KeyUp { key: String },
    /// Committed text from the platform's text input
    Text(String),
    PointerDown { x: f64, y: f64 },
    PointerMoved { x: f64, y: f64 },
    PointerUp,
    GamepadButton { device: usize, button: u8, pressed: bool },
    GamepadAxis { device: usize, axis: u8, value: i16 },
    JoystickHat { device: usize, hat: u8, mask: u8 },
    Resized { width: u32, height: u32 },
    FocusLost,
}

/// Where the presenter puts frames and messages.
pub trait DisplaySurface {
    /// Show a rendered frame of the virtual display
    fn present(&mut self, frame: &Frame);

    fn show_error(&mut self, _error: &HostError) {}

    /// Show or hide the text input (software keyboard)
    fn set_text_input(&mut self, _enabled: bool) {}

    /// The program is waiting for a disk file; answer with
    /// [`Presenter::resolve_disk`].
    fn request_disk(&mut self) {}

    /// Switch between windowed and fullscreen display
    fn set_fullscreen(&mut self, _enabled: bool) {}

    /// Whether the platform shows its own keyboard for text input
    fn has_screen_keyboard(&self) -> bool {
        false
    }

    /// Events received since the last call
    fn poll_events(&mut self) -> Vec<InputEvent> {
        Vec::new()
    }
}

pub struct Presenter<C: Core> {
    runtime: Rc<RefCell<Runtime<C>>>,
    delegate: Rc<RefCell<HostDelegate>>,
    input: InputSnapshot,
    mapper: InputMapper,
    geometry: DisplayGeometry,
    scheduler: FrameScheduler,
    settings: HostSettings,
    settings_path: Option<PathBuf>,
    frame: Frame,
    program_path: Option<PathBuf>,
    started: Instant,
    controls: ControlsInfo,
    text_input_active: bool,
    controls_dirty: bool,
    disk_requested: bool,
    fullscreen_dirty: bool,
    quit_requested: bool,
}

impl<C: Core> Presenter<C> {
    /// Attach to `runtime` and register as its delegate.
    pub fn new(runtime: Rc<RefCell<Runtime<C>>>, settings: HostSettings) -> Self {
        let delegate = Rc::new(RefCell::new(HostDelegate::new(
            settings.disk_file_name.clone(),
        )));
        runtime.borrow_mut().set_delegate(&delegate);

        let scale = settings.clamped_window_scale();
        let geometry = DisplayGeometry::fit(DISPLAY_WIDTH * scale, DISPLAY_HEIGHT * scale)
            .flipped(settings.flip_y);

        Self {
            runtime,
            delegate,
            input: InputSnapshot::new(),
            mapper: InputMapper::with_profiles(settings.controllers.clone()),
            geometry,
            scheduler: FrameScheduler::new(settings.frame_rate),
            fullscreen_dirty: settings.fullscreen,
            settings,
            settings_path: None,
            frame: Frame::new(),
            program_path: None,
            started: Instant::now(),
            controls: ControlsInfo::default(),
            text_input_active: false,
            controls_dirty: true,
            disk_requested: false,
            quit_requested: false,
        }
    }

    pub fn runtime(&self) -> &Rc<RefCell<Runtime<C>>> {
        &self.runtime
    }

    pub fn delegate(&self) -> &Rc<RefCell<HostDelegate>> {
        &self.delegate
    }

    pub fn input(&self) -> &InputSnapshot {
        &self.input
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> &HostSettings {
        &self.settings
    }

    /// Save settings changes (last program, fullscreen) to `path`.
    pub fn set_settings_path(&mut self, path: impl Into<PathBuf>) {
        self.settings_path = Some(path.into());
    }

    pub fn controls(&self) -> ControlsInfo {
        self.controls
    }

    pub fn program_path(&self) -> Option<&Path> {
        self.program_path.as_deref()
    }

    pub fn text_input_active(&self) -> bool {
        self.text_input_active
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    pub fn is_waiting_for_disk(&self) -> bool {
        self.runtime.borrow().is_waiting_for_disk()
    }

    /// Read and compile a program file.
    pub fn load_program(&mut self, path: &Path) -> Result<(), HostError> {
        let source = fs::read_to_string(path).map_err(|source| HostError::ProgramIo {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_source(&source, Some(path))
    }

    /// Compile `source` and start it. `program_path` locates the companion
    /// disk and persistent RAM files.
    pub fn load_source(&mut self, source: &str, program_path: Option<&Path>) -> Result<(), HostError> {
        self.delegate.borrow_mut().attach_program(program_path);
        self.program_path = program_path.map(Path::to_path_buf);
        self.input.reset();
        self.controls = ControlsInfo::default();
        self.controls_dirty = true;
        self.disk_requested = false;

        let mut runtime = self.runtime.borrow_mut();
        runtime.compile(source).map_err(HostError::Compile)?;
        runtime.will_run(self.started.elapsed().as_secs());
        drop(runtime);

        if let Some(path) = program_path {
            self.settings.last_program_path = Some(path.display().to_string());
            self.persist_settings();
        }
        log(LogCategory::Host, LogLevel::Info, || match program_path {
            Some(path) => format!("Host: running {}", path.display()),
            None => "Host: running program".to_string(),
        });
        Ok(())
    }

    /// Run the current program again from the start, re-reading its file
    /// when there is one.
    pub fn rerun(&mut self) -> Result<(), HostError> {
        if let Some(path) = self.program_path.clone() {
            return self.load_program(&path);
        }
        let source = self.runtime.borrow().source().map(str::to_string);
        match source {
            Some(source) => self.load_source(&source, None),
            None => Ok(()),
        }
    }

    /// Answer a deferred disk access with the file at `path`.
    ///
    /// The access is resumed even if the file cannot be read; the error is
    /// returned for display.
    pub fn resolve_disk(&mut self, path: impl Into<PathBuf>) -> Result<(), HostError> {
        let path = path.into();
        let mut delegate = self.delegate.borrow_mut();
        delegate.set_disk_path(&path);
        let result = match delegate.disk_mut().read_if_changed() {
            Ok(Some(text)) => self
                .runtime
                .borrow_mut()
                .disk_import(&text)
                .map_err(|e| HostError::DiskFormat {
                    path: path.clone(),
                    error: e.error,
                }),
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        drop(delegate);

        self.disk_requested = false;
        self.runtime.borrow_mut().disk_loaded();
        log(LogCategory::Disk, LogLevel::Info, || {
            format!("Host: disk resolved to {}", path.display())
        });
        result
    }

    /// Translate one host event into input state or a host action.
    pub fn handle_event(&mut self, event: InputEvent) -> Result<(), HostError> {
        match event {
            InputEvent::KeyDown { key, ctrl } => {
                if ctrl && matches!(key.as_str(), "D" | "F" | "R") {
                    return self.handle_hotkey(&key);
                }
                match key.as_str() {
                    "Escape" => {
                        self.quit_requested = true;
                        return Ok(());
                    }
                    "Enter" => {
                        self.input.push_key(KeyInput::Return);
                        self.input.request_pause();
                    }
                    "Backspace" => self.input.push_key(KeyInput::Backspace),
                    "P" if self.controls.keyboard_mode == KeyboardMode::Off => {
                        self.input.request_pause()
                    }
                    _ => {}
                }
                self.mapper.key_down(&key);
            }
            InputEvent::KeyUp { key } => {
                self.mapper.key_up(&key);
            }
            InputEvent::Text(text) => {
                for c in text.chars() {
                    if !self.input.push_char(c) {
                        log(LogCategory::Input, LogLevel::Trace, || {
                            format!("Input: dropped character {:?}", c)
                        });
                    }
                }
            }
            InputEvent::PointerDown { x, y } => {
                let (x, y) = self.geometry.map_point(x, y);
                self.input.touch_pressed(x, y);
            }
            InputEvent::PointerMoved { x, y } => {
                let (x, y) = self.geometry.map_point(x, y);
                self.input.touch_moved(x, y);
            }
            InputEvent::PointerUp => self.input.touch_released(),
            InputEvent::GamepadButton {
                device,
                button,
                pressed,
            } => {
                if pressed && button == PAUSE_BUTTON {
                    self.input.request_pause();
                }
                self.mapper.gamepad_button(device, button, pressed);
            }
            InputEvent::GamepadAxis {
                device,
                axis,
                value,
            } => self.mapper.gamepad_axis(device, axis, value),
            InputEvent::JoystickHat { device, hat, mask } => {
                self.mapper.joystick_hat(device, hat, mask)
            }
            InputEvent::Resized { width, height } => {
                self.geometry = DisplayGeometry::fit(width, height).flipped(self.settings.flip_y);
            }
            InputEvent::FocusLost => self.mapper.clear(),
        }
        self.mapper.apply_to(&mut self.input);
        Ok(())
    }

    fn handle_hotkey(&mut self, key: &str) -> Result<(), HostError> {
        match key {
            "D" => {
                let mut runtime = self.runtime.borrow_mut();
                let enabled = !runtime.debug();
                runtime.set_debug(enabled);
                log(LogCategory::Host, LogLevel::Info, || {
                    format!("Host: debug {}", if enabled { "on" } else { "off" })
                });
                Ok(())
            }
            "F" => {
                self.settings.fullscreen = !self.settings.fullscreen;
                self.fullscreen_dirty = true;
                self.persist_settings();
                Ok(())
            }
            "R" => self.rerun(),
            _ => Ok(()),
        }
    }

    fn persist_settings(&self) {
        let Some(path) = &self.settings_path else {
            return;
        };
        if let Err(e) = self.settings.save_to(path) {
            log(LogCategory::Host, LogLevel::Warn, || {
                format!("Host: failed to save settings: {}", e)
            });
        }
    }

    /// Advance one frame and present it.
    pub fn tick(&mut self, surface: &mut dyn DisplaySurface) -> ControlFlow<()> {
        self.mapper.apply_to(&mut self.input);
        self.runtime.borrow_mut().update(&self.input);
        self.input.end_frame();

        self.runtime.borrow().render_into(&mut self.frame);
        surface.present(&self.frame);

        self.flush_delegate(surface);

        if self.quit_requested {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }

    fn flush_delegate(&mut self, surface: &mut dyn DisplaySurface) {
        let (errors, controls, deferred) = {
            let mut delegate = self.delegate.borrow_mut();
            (
                delegate.take_errors(),
                delegate.take_controls_change(),
                delegate.is_disk_deferred(),
            )
        };

        for error in &errors {
            surface.show_error(error);
        }

        if let Some(info) = controls {
            log(LogCategory::Host, LogLevel::Debug, || {
                format!("Host: controls {:?}", info)
            });
            self.controls = info;
            self.controls_dirty = true;
        }
        if self.controls_dirty {
            self.controls_dirty = false;
            let wanted = self.controls.wants_text_input(surface.has_screen_keyboard());
            if wanted != self.text_input_active {
                self.text_input_active = wanted;
                surface.set_text_input(wanted);
            }
        }

        if self.fullscreen_dirty {
            self.fullscreen_dirty = false;
            surface.set_fullscreen(self.settings.fullscreen);
        }

        if deferred && !self.disk_requested {
            self.disk_requested = true;
            surface.request_disk();
        }
    }

    /// Drive the surface until the user quits or the presenter is shut down.
    pub fn run(&mut self, surface: &mut dyn DisplaySurface) {
        while self.scheduler.wait_for_next_tick() {
            for event in surface.poll_events() {
                if let Err(e) = self.handle_event(event) {
                    surface.show_error(&e);
                }
            }
            if self.tick(surface).is_break() {
                break;
            }
        }
        self.shutdown();
    }

    /// Stop the frame clock. Returns true only the first time.
    pub fn shutdown(&mut self) -> bool {
        let stopped = self.scheduler.invalidate();
        if stopped {
            log(LogCategory::Host, LogLevel::Info, || {
                format!(
                    "Host: stopped after {} frames ({:.1} fps)",
                    self.scheduler.ticks(),
                    self.scheduler.fps()
                )
            });
        }
        stopped
    }
}
