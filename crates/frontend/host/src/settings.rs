use crate::disk::DEFAULT_DISK_FILE_NAME;
use crate::error::SettingsError;
use crate::input::ControllerProfile;
use crate::scheduler::FrameRate;
use nx_core::logging::{log, LogCategory, LogLevel};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Largest integer scale of the virtual display for the initial window
pub const MAX_WINDOW_SCALE: u32 = 16;

fn default_disk_file_name() -> String {
    DEFAULT_DISK_FILE_NAME.to_string()
}

fn default_log_spec() -> String {
    "warn".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSettings {
    #[serde(default = "ControllerProfile::defaults")]
    pub controllers: [ControllerProfile; 2],
    #[serde(default)]
    pub frame_rate: FrameRate,
    #[serde(default = "default_disk_file_name")]
    pub disk_file_name: String,
    #[serde(default)]
    pub last_program_path: Option<String>,
    pub window_scale: u32,
    /// Start fullscreen; Ctrl+F toggles and saves it
    pub fullscreen: bool,
    /// Pointer coordinates have a bottom-left origin
    #[serde(default)]
    pub flip_y: bool,
    /// Logging levels, e.g. "warn,disk=debug"
    #[serde(default = "default_log_spec")]
    pub log: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            controllers: ControllerProfile::defaults(),
            frame_rate: FrameRate::default(),
            disk_file_name: default_disk_file_name(),
            last_program_path: None,
            window_scale: 4,
            fullscreen: false,
            flip_y: false,
            log: default_log_spec(),
        }
    }
}

impl HostSettings {
    /// Get the config file path relative to the executable
    pub fn config_path() -> PathBuf {
        let mut path = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));
        path.push("config.json");
        path
    }

    /// Load settings from config.json, falling back to defaults on error
    pub fn load() -> Self {
        let path = Self::config_path();
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(SettingsError::Io { .. }) => {
                // File doesn't exist or can't be read, use defaults
                Self::default()
            }
            Err(e) => {
                log(LogCategory::Host, LogLevel::Warn, || {
                    format!("Settings: {}. Using defaults.", e)
                });
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save settings to config.json immediately
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `window_scale` limited to `1..=MAX_WINDOW_SCALE`
    pub fn clamped_window_scale(&self) -> u32 {
        self.window_scale.clamp(1, MAX_WINDOW_SCALE)
    }

    /// Apply the log spec, then an `NX_LOG` override if set.
    pub fn apply_logging(&self) {
        let config = nx_core::logging::LogConfig::global();
        let mut rejected = config.apply_spec(&self.log);
        if let Ok(spec) = std::env::var("NX_LOG") {
            rejected.extend(config.apply_spec(&spec));
        }
        for entry in rejected {
            log(LogCategory::Host, LogLevel::Warn, || {
                format!("Settings: unknown log setting '{}'", entry)
            });
        }
    }
}
