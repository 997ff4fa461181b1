use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::error::{Error, Result};

/// Storage for the identifier of the managed process, one slot per service.
///
/// A missing record is a normal outcome and reads as `None`.
pub trait PidStore: Send + Sync {
    /// Read the stored pid of `name`.
    ///
    /// # Errors
    /// Returns an error if the record exists but cannot be read or parsed.
    fn read(&self, name: &str) -> Result<Option<u32>>;

    /// Store `pid` for `name`, replacing any previous record.
    ///
    /// # Errors
    /// Returns an error if the record cannot be written.
    fn write(&self, name: &str, pid: u32) -> Result<()>;

    /// Remove the record of `name`. Removing a missing record is fine.
    ///
    /// # Errors
    /// Returns an error if an existing record cannot be removed.
    fn delete(&self, name: &str) -> Result<()>;

    /// Where the record of `name` lives, for humans.
    fn location(&self, name: &str) -> String;
}

/// Pid files under a run directory, `<dir>/<name>.pid`.
#[derive(Debug, Clone)]
pub struct FilePidStore {
    dir: PathBuf,
}

impl FilePidStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.pid"))
    }

    fn record_error(path: &Path, source: std::io::Error) -> Error {
        Error::Record {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl PidStore for FilePidStore {
    fn read(&self, name: &str) -> Result<Option<u32>> {
        let path = self.path(name);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            // Part of the run directory is a plain file, so no record can exist.
            Err(err) if err.raw_os_error() == Some(libc::ENOTDIR) => return Ok(None),
            Err(err) => return Err(Self::record_error(&path, err)),
        };

        match text.trim().parse::<u32>() {
            Ok(pid) if pid > 0 => Ok(Some(pid)),
            _ => Err(Self::record_error(
                &path,
                std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!("not a process id: {:?}", text.trim()),
                ),
            )),
        }
    }

    fn write(&self, name: &str, pid: u32) -> Result<()> {
        let path = self.path(name);
        std::fs::create_dir_all(&self.dir).map_err(|err| Self::record_error(&path, err))?;
        std::fs::write(&path, format!("{pid}\n")).map_err(|err| Self::record_error(&path, err))?;

        tracing::debug!("Wrote pid {pid} to {path:?}");
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.path(name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Removed {path:?}");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Self::record_error(&path, err)),
        }
    }

    fn location(&self, name: &str) -> String {
        self.path(name).display().to_string()
    }
}

/// Process records kept in memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryPidStore {
    records: Mutex<HashMap<String, u32>>,
}

impl MemoryPidStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, HashMap<String, u32>> {
        // A panic while holding the guard cannot leave the map half-written.
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl PidStore for MemoryPidStore {
    fn read(&self, name: &str) -> Result<Option<u32>> {
        Ok(self.records().get(name).copied())
    }

    fn write(&self, name: &str, pid: u32) -> Result<()> {
        self.records().insert(name.to_owned(), pid);
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.records().remove(name);
        Ok(())
    }

    fn location(&self, name: &str) -> String {
        format!("memory:{name}.pid")
    }
}
