//! Files a program keeps next to its source: the virtual disk and the
//! persistent RAM image.

use crate::error::HostError;
use nx_core::logging::{log, LogCategory, LogLevel};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Default name of the virtual disk file in a program's directory
pub const DEFAULT_DISK_FILE_NAME: &str = "Disk.nx";

/// Extension of persistent RAM files, stored as `<program stem>.dat`
pub const PERSISTENT_RAM_EXTENSION: &str = "dat";

fn disk_io(path: &Path) -> impl FnOnce(io::Error) -> HostError + '_ {
    move |source| HostError::DiskIo {
        path: path.to_path_buf(),
        source,
    }
}

/// Companion disk file of a program.
///
/// The file is re-imported only when its modification time is strictly
/// newer than that of the last import, or of our own last write.
#[derive(Debug, Default, Clone)]
pub struct DiskStore {
    path: Option<PathBuf>,
    last_import: Option<SystemTime>,
}

impl DiskStore {
    /// A store without a path. Disk accesses are deferred until one is set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            last_import: None,
        }
    }

    /// Disk file `file_name` in the directory of `program_path`
    pub fn for_program(program_path: &Path, file_name: &str) -> Self {
        let dir = program_path.parent().unwrap_or_else(|| Path::new("."));
        Self::at(dir.join(file_name))
    }

    /// Point the store at another file. The next read imports it.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
        self.last_import = None;
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn has_path(&self) -> bool {
        self.path.is_some()
    }

    pub fn last_import(&self) -> Option<SystemTime> {
        self.last_import
    }

    /// Read the disk file if it changed since it was last imported.
    ///
    /// A missing file reads as unchanged, as does a store without a path.
    pub fn read_if_changed(&mut self) -> Result<Option<String>, HostError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(None);
        };

        let modified = match fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log(LogCategory::Disk, LogLevel::Debug, || {
                    format!("Disk: {} does not exist yet", path.display())
                });
                return Ok(None);
            }
            Err(e) => return Err(disk_io(path)(e)),
        };

        if self.last_import.is_some_and(|mark| modified <= mark) {
            log(LogCategory::Disk, LogLevel::Trace, || {
                format!("Disk: {} unchanged", path.display())
            });
            return Ok(None);
        }

        let text = fs::read_to_string(path).map_err(disk_io(path))?;
        self.last_import = Some(modified);
        log(LogCategory::Disk, LogLevel::Info, || {
            format!("Disk: imported {} ({} bytes)", path.display(), text.len())
        });
        Ok(Some(text))
    }

    /// Write the exported disk text verbatim. The write's own modification
    /// time becomes the import mark so it is not read back.
    pub fn write(&mut self, text: &str) -> Result<(), HostError> {
        let Some(path) = self.path.as_deref() else {
            log(LogCategory::Disk, LogLevel::Warn, || {
                "Disk: save without a disk file, dropped".to_string()
            });
            return Ok(());
        };

        fs::write(path, text).map_err(disk_io(path))?;
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(disk_io(path))?;
        self.last_import = Some(modified);
        log(LogCategory::Disk, LogLevel::Info, || {
            format!("Disk: saved {} ({} bytes)", path.display(), text.len())
        });
        Ok(())
    }
}

/// Persistent RAM image of a program.
#[derive(Debug, Default, Clone)]
pub struct PersistentRamStore {
    path: Option<PathBuf>,
}

impl PersistentRamStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// `<stem>.dat` next to the program
    pub fn for_program(program_path: &Path) -> Self {
        Self::at(program_path.with_extension(PERSISTENT_RAM_EXTENSION))
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy the stored image into `destination`. Returns the number of bytes
    /// loaded; a missing file loads nothing.
    pub fn load_into(&self, destination: &mut [u8]) -> Result<usize, HostError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(0);
        };
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(disk_io(path)(e)),
        };
        let len = data.len().min(destination.len());
        destination[..len].copy_from_slice(&data[..len]);
        log(LogCategory::Disk, LogLevel::Debug, || {
            format!("Disk: loaded {} bytes of persistent RAM", len)
        });
        Ok(len)
    }

    pub fn save(&self, data: &[u8]) -> Result<(), HostError> {
        match self.path.as_deref() {
            Some(path) => fs::write(path, data).map_err(disk_io(path)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("nx_disk_test_{}", name));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(path: &Path, modified: SystemTime) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
    }

    #[test]
    fn test_companion_paths() {
        let program = Path::new("/games/space/invaders.nx");
        let disk = DiskStore::for_program(program, DEFAULT_DISK_FILE_NAME);
        assert_eq!(disk.path(), Some(Path::new("/games/space/Disk.nx")));
        let ram = PersistentRamStore::for_program(program);
        assert_eq!(ram.path(), Some(Path::new("/games/space/invaders.dat")));
    }

    #[test]
    fn test_reimport_only_when_strictly_newer() {
        let dir = test_dir("reimport");
        let path = dir.join("Disk.nx");
        fs::write(&path, "ONE").unwrap();
        let base = SystemTime::now() - Duration::from_secs(100);
        touch(&path, base);

        let mut store = DiskStore::at(&path);
        assert_eq!(store.read_if_changed().unwrap().as_deref(), Some("ONE"));
        assert_eq!(store.read_if_changed().unwrap(), None);

        // Same mtime is not newer
        fs::write(&path, "TWO").unwrap();
        touch(&path, base);
        assert_eq!(store.read_if_changed().unwrap(), None);

        touch(&path, base + Duration::from_secs(1));
        assert_eq!(store.read_if_changed().unwrap().as_deref(), Some("TWO"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_own_write_is_not_reimported() {
        let dir = test_dir("own_write");
        let mut store = DiskStore::at(dir.join("Disk.nx"));
        store.write("SAVED").unwrap();
        assert!(store.last_import().is_some());
        assert_eq!(store.read_if_changed().unwrap(), None);
        assert_eq!(fs::read_to_string(dir.join("Disk.nx")).unwrap(), "SAVED");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_reads_nothing() {
        let dir = test_dir("missing");
        let mut store = DiskStore::at(dir.join("Disk.nx"));
        assert_eq!(store.read_if_changed().unwrap(), None);
        assert_eq!(DiskStore::new().read_if_changed().unwrap(), None);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = test_dir("bad_dir");
        let mut store = DiskStore::at(dir.join("gone").join("Disk.nx"));
        let err = store.write("X").unwrap_err();
        assert!(matches!(err, HostError::DiskIo { .. }));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_persistent_ram_round_trip() {
        let dir = test_dir("ram");
        let store = PersistentRamStore::at(dir.join("game.dat"));

        let mut buffer = [0xAAu8; 8];
        assert_eq!(store.load_into(&mut buffer).unwrap(), 0);
        assert_eq!(buffer, [0xAA; 8]);

        store.save(&[1, 2, 3]).unwrap();
        assert_eq!(store.load_into(&mut buffer).unwrap(), 3);
        assert_eq!(buffer[..4], [1, 2, 3, 0xAA]);

        fs::remove_dir_all(&dir).unwrap();
    }
}
