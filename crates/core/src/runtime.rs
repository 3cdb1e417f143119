//! Frame-driven wrapper around a single [`Core`].
//!
//! The runtime owns its core exclusively and is driven from one thread:
//! compile, `will_run`, then one `update` per frame tick. Delegate callbacks
//! made by the core during `update` pass through a bridge that locates
//! errors in the source, reports each failure at most once and tolerates a
//! delegate that has already been dropped.

use crate::delegate::{CoreDelegate, DiskDrive};
use crate::error::{CoreError, ProgramError};
use crate::input::InputSnapshot;
use crate::logging::{log, LogCategory, LogLevel};
use crate::types::Frame;
use crate::{ControlsInfo, Core};
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Lifecycle of the program loaded into the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuntimeState {
    /// No program compiled, or the last compile failed
    Idle,
    /// Compiled, waiting for `will_run`
    Ready,
    Running,
    /// The program stopped with an error; updates no longer advance the core
    Halted,
}

/// Owns one core and drives it a frame at a time.
pub struct Runtime<C: Core> {
    core: C,
    delegate: Option<Weak<RefCell<dyn CoreDelegate>>>,
    source: Option<String>,
    state: RuntimeState,
    failure: Option<CoreError>,
    waiting_for_disk: bool,
    frames: u64,
    shut_down: bool,
}

impl<C: Core> Runtime<C> {
    pub fn new(core: C) -> Self {
        Self {
            core,
            delegate: None,
            source: None,
            state: RuntimeState::Idle,
            failure: None,
            waiting_for_disk: false,
            frames: 0,
            shut_down: false,
        }
    }

    /// Register the delegate. Only a weak reference is kept: once the
    /// delegate is dropped the runtime carries on as if none were set.
    pub fn set_delegate<D: CoreDelegate + 'static>(&mut self, delegate: &Rc<RefCell<D>>) {
        let delegate: Rc<RefCell<dyn CoreDelegate>> = delegate.clone();
        self.delegate = Some(Rc::downgrade(&delegate));
    }

    pub fn clear_delegate(&mut self) {
        self.delegate = None;
    }

    pub fn has_delegate(&self) -> bool {
        self.delegate
            .as_ref()
            .is_some_and(|weak| weak.strong_count() > 0)
    }

    /// Compile `source`. On failure the error is located in the source and
    /// the runtime stays idle.
    pub fn compile(&mut self, source: &str) -> Result<(), ProgramError> {
        self.source = Some(source.to_string());
        self.failure = None;
        self.waiting_for_disk = false;
        self.frames = 0;

        match self.core.compile_program(source) {
            Ok(()) => {
                self.state = RuntimeState::Ready;
                log(LogCategory::Runtime, LogLevel::Info, || {
                    format!("Runtime: compiled program ({} bytes)", source.len())
                });
                Ok(())
            }
            Err(error) => {
                self.state = RuntimeState::Idle;
                let error = ProgramError::new(error, Some(source));
                log(LogCategory::Runtime, LogLevel::Warn, || {
                    format!("Runtime: compile failed: {}", error)
                });
                Err(error)
            }
        }
    }

    /// Seed time-dependent state before the first frame. Only the first call
    /// after a successful compile has an effect.
    pub fn will_run(&mut self, seconds_since_power_on: u64) {
        if self.state != RuntimeState::Ready {
            log(LogCategory::Runtime, LogLevel::Debug, || {
                format!("Runtime: will_run ignored in state {:?}", self.state)
            });
            return;
        }
        self.core.will_run_program(seconds_since_power_on);
        self.state = RuntimeState::Running;
    }

    /// Advance the core by one frame using `input`.
    ///
    /// Failures are reported once through the delegate; afterwards the core
    /// is no longer advanced but can still be rendered.
    pub fn update(&mut self, input: &InputSnapshot) {
        match self.state {
            RuntimeState::Idle | RuntimeState::Halted => return,
            RuntimeState::Ready => {
                log(LogCategory::Runtime, LogLevel::Warn, || {
                    "Runtime: update before will_run, starting at power-on time 0".to_string()
                });
                self.will_run(0);
            }
            RuntimeState::Running => {}
        }

        let delegate = self.delegate.as_ref().and_then(Weak::upgrade);
        let mut bridge = DelegateBridge {
            target: delegate.as_deref(),
            source: self.source.as_deref(),
            failure: &mut self.failure,
            waiting_for_disk: &mut self.waiting_for_disk,
        };

        self.core.update(input, &mut bridge);

        if bridge.failure.is_none() {
            if let Some(error) = self.core.exit_error() {
                bridge.report_failure(error);
            }
        }

        self.frames += 1;
        if let Some(error) = self.failure {
            self.state = RuntimeState::Halted;
            log(LogCategory::Runtime, LogLevel::Info, || {
                format!("Runtime: halted after {} frames: {}", self.frames, error)
            });
        }
    }

    /// Render the current display into a new frame.
    pub fn render_frame(&self) -> Frame {
        let mut frame = Frame::new();
        self.render_into(&mut frame);
        frame
    }

    /// Render into an existing frame, reusing its buffer.
    pub fn render_into(&self, frame: &mut Frame) {
        let stride = frame.stride();
        self.core.render_screen(&mut frame.pixels, stride);
    }

    /// Load the virtual disk outside of a frame, e.g. after the user picked
    /// a disk file.
    pub fn disk_import(&mut self, text: &str) -> Result<(), ProgramError> {
        self.core
            .disk_import(text)
            .map_err(|e| ProgramError::new(e, Some(text)))
    }

    pub fn disk_export(&self) -> Option<String> {
        self.core.disk_export()
    }

    /// Resume a disk access the delegate deferred.
    pub fn disk_loaded(&mut self) {
        if !self.waiting_for_disk {
            log(LogCategory::Disk, LogLevel::Debug, || {
                "Runtime: disk_loaded without a deferred access".to_string()
            });
        }
        self.waiting_for_disk = false;
        self.core.disk_loaded();
    }

    /// Whether a disk access was deferred and not yet resumed.
    pub fn is_waiting_for_disk(&self) -> bool {
        self.waiting_for_disk
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.core.set_debug(enabled);
    }

    pub fn debug(&self) -> bool {
        self.core.debug()
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    /// The failure the current program stopped with.
    pub fn failure(&self) -> Option<ProgramError> {
        self.failure
            .map(|error| ProgramError::new(error, self.source.as_deref()))
    }

    /// Source of the last compiled program.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    /// Frames advanced since the last compile.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn core(&self) -> &C {
        &self.core
    }

    /// JSON summary for debug overlays and logs.
    pub fn debug_state(&self) -> Value {
        json!({
            "state": self.state,
            "frames": self.frames,
            "failure": self.failure.map(|e| e.to_string()),
            "waiting_for_disk": self.waiting_for_disk,
            "debug": self.core.debug(),
            "has_delegate": self.has_delegate(),
        })
    }

    /// Release the core. Consumes the runtime so nothing can be called on
    /// it afterwards.
    pub fn teardown(mut self) {
        self.shutdown_core();
    }

    fn shutdown_core(&mut self) {
        if !self.shut_down {
            self.shut_down = true;
            self.core.shutdown();
            log(LogCategory::Runtime, LogLevel::Debug, || {
                "Runtime: core shut down".to_string()
            });
        }
    }
}

impl<C: Core> Drop for Runtime<C> {
    fn drop(&mut self) {
        self.shutdown_core();
    }
}

/// The delegate handed to the core for the duration of one frame.
struct DelegateBridge<'a> {
    target: Option<&'a RefCell<dyn CoreDelegate + 'static>>,
    source: Option<&'a str>,
    failure: &'a mut Option<CoreError>,
    waiting_for_disk: &'a mut bool,
}

impl DelegateBridge<'_> {
    fn with_target<R>(&mut self, default: R, f: impl FnOnce(&mut dyn CoreDelegate) -> R) -> R {
        let Some(target) = self.target else {
            return default;
        };
        match target.try_borrow_mut() {
            Ok(mut delegate) => f(&mut *delegate),
            Err(_) => {
                log(LogCategory::Delegate, LogLevel::Error, || {
                    "Delegate: re-entrant callback dropped".to_string()
                });
                default
            }
        }
    }

    fn report_failure(&mut self, error: CoreError) {
        if self.failure.is_some() {
            return;
        }
        *self.failure = Some(error);
        let located = ProgramError::new(error, self.source);
        log(LogCategory::Delegate, LogLevel::Debug, || {
            format!("Delegate: interpreter failed: {}", located)
        });
        self.with_target((), |d| d.interpreter_did_fail(&located));
    }
}

impl CoreDelegate for DelegateBridge<'_> {
    fn interpreter_did_fail(&mut self, error: &ProgramError) {
        self.report_failure(error.error);
    }

    fn disk_drive_will_access(&mut self, disk: &mut dyn DiskDrive) -> bool {
        let ready = self.with_target(true, |d| d.disk_drive_will_access(disk));
        if !ready {
            *self.waiting_for_disk = true;
            log(LogCategory::Disk, LogLevel::Info, || {
                "Delegate: disk access deferred".to_string()
            });
        }
        ready
    }

    fn disk_drive_did_save(&mut self, disk: &dyn DiskDrive) {
        self.with_target((), |d| d.disk_drive_did_save(disk));
    }

    fn controls_did_change(&mut self, info: ControlsInfo) {
        log(LogCategory::Delegate, LogLevel::Debug, || {
            format!("Delegate: controls changed: {:?}", info)
        });
        self.with_target((), |d| d.controls_did_change(info));
    }

    fn persistent_ram_will_access(&mut self, destination: &mut [u8]) {
        self.with_target((), |d| d.persistent_ram_will_access(destination));
    }

    fn persistent_ram_did_change(&mut self, data: &[u8]) {
        self.with_target((), |d| d.persistent_ram_did_change(data));
    }
}
