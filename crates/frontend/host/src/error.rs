//! Errors a host surfaces to the user.

use nx_core::{CoreError, ProgramError};
use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum HostError {
    /// The program did not compile
    #[error("{0}")]
    Compile(ProgramError),

    /// The running program stopped with an error
    #[error("{0}")]
    Runtime(ProgramError),

    #[error("Could not access {}: {source}", .path.display())]
    DiskIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The disk file exists but the core rejected its contents
    #[error("Could not load disk {}: {error}", .path.display())]
    DiskFormat { path: PathBuf, error: CoreError },

    #[error("Could not open program {}: {source}", .path.display())]
    ProgramIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl HostError {
    /// The located program error, for compile and runtime failures.
    pub fn program_error(&self) -> Option<&ProgramError> {
        match self {
            HostError::Compile(e) | HostError::Runtime(e) => Some(e),
            _ => None,
        }
    }

    /// Disk and file problems do not stop the program.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HostError::Compile(_) | HostError::Runtime(_))
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use nx_core::ErrorCode;

    #[test]
    fn test_compile_error_text_carries_line() {
        let source = "A = 1\nB = 2\nPRINT X$ + 1\n";
        let position = source.find("X$").unwrap();
        let err = HostError::Compile(ProgramError::new(
            CoreError::new(ErrorCode::TypeMismatch, position),
            Some(source),
        ));
        assert_eq!(err.to_string(), "Error in line 3: Type Mismatch\nPRINT X$ + 1");
        assert!(err.is_fatal());
        assert_eq!(err.program_error().and_then(|e| e.line_number()), Some(3));
    }

    #[test]
    fn test_disk_io_is_not_fatal() {
        let err = HostError::DiskIo {
            path: PathBuf::from("/nowhere/Disk.nx"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("Disk.nx"));
        assert!(err.program_error().is_none());
    }
}
