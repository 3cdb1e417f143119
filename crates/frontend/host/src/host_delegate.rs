//! The presenter's side of the core callbacks.
//!
//! Callbacks arrive synchronously while the runtime updates a frame, so
//! anything the user has to see is queued here and flushed by the presenter
//! after the frame.

use crate::disk::{DiskStore, PersistentRamStore};
use crate::error::HostError;
use nx_core::logging::{log, LogCategory, LogLevel};
use nx_core::{ControlsInfo, CoreDelegate, DiskDrive, ProgramError};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct HostDelegate {
    disk_file_name: String,
    disk: DiskStore,
    ram: PersistentRamStore,
    controls: Option<ControlsInfo>,
    disk_deferred: bool,
    errors: Vec<HostError>,
}

impl HostDelegate {
    pub fn new(disk_file_name: impl Into<String>) -> Self {
        Self {
            disk_file_name: disk_file_name.into(),
            disk: DiskStore::new(),
            ram: PersistentRamStore::new(),
            controls: None,
            disk_deferred: false,
            errors: Vec::new(),
        }
    }

    /// Point the disk and persistent RAM files at a program's directory.
    /// A program without a file gets no companion files.
    pub fn attach_program(&mut self, program_path: Option<&Path>) {
        match program_path {
            Some(path) => {
                self.disk = DiskStore::for_program(path, &self.disk_file_name);
                self.ram = PersistentRamStore::for_program(path);
            }
            None => {
                self.disk = DiskStore::new();
                self.ram = PersistentRamStore::new();
            }
        }
        self.controls = None;
        self.disk_deferred = false;
    }

    pub fn set_disk_path(&mut self, path: impl Into<PathBuf>) {
        self.disk.set_path(path);
        self.disk_deferred = false;
    }

    pub fn disk(&self) -> &DiskStore {
        &self.disk
    }

    pub fn disk_mut(&mut self) -> &mut DiskStore {
        &mut self.disk
    }

    /// Whether a disk access was deferred because no disk file is known.
    pub fn is_disk_deferred(&self) -> bool {
        self.disk_deferred
    }

    pub fn take_errors(&mut self) -> Vec<HostError> {
        std::mem::take(&mut self.errors)
    }

    /// The controls requested since the last call, if they changed.
    pub fn take_controls_change(&mut self) -> Option<ControlsInfo> {
        self.controls.take()
    }

    fn push_error(&mut self, error: HostError) {
        log(LogCategory::Host, LogLevel::Warn, || format!("Host: {}", error));
        self.errors.push(error);
    }
}

impl CoreDelegate for HostDelegate {
    fn interpreter_did_fail(&mut self, error: &ProgramError) {
        self.push_error(HostError::Runtime(error.clone()));
    }

    fn disk_drive_will_access(&mut self, disk: &mut dyn DiskDrive) -> bool {
        if !self.disk.has_path() {
            self.disk_deferred = true;
            return false;
        }
        match self.disk.read_if_changed() {
            Ok(Some(text)) => {
                if let Err(error) = disk.import_text(&text) {
                    let path = self.disk.path().map(Path::to_path_buf).unwrap_or_default();
                    self.push_error(HostError::DiskFormat { path, error });
                }
            }
            Ok(None) => {}
            Err(e) => self.push_error(e),
        }
        true
    }

    fn disk_drive_did_save(&mut self, disk: &dyn DiskDrive) {
        let Some(text) = disk.export_text() else {
            return;
        };
        if let Err(e) = self.disk.write(&text) {
            self.push_error(e);
        }
    }

    fn controls_did_change(&mut self, info: ControlsInfo) {
        self.controls = Some(info);
    }

    fn persistent_ram_will_access(&mut self, destination: &mut [u8]) {
        if let Err(e) = self.ram.load_into(destination) {
            self.push_error(e);
        }
    }

    fn persistent_ram_did_change(&mut self, data: &[u8]) {
        if let Err(e) = self.ram.save(data) {
            self.push_error(e);
        }
    }
}
