use crate::common::TEMP_FILE_SUFFIX;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Destination a store snapshot is persisted to.
///
/// Implementations are called from the durability worker, one call at a
/// time per destination.
pub trait StorageBackend: Send + Sync {
    /// Reads the last persisted snapshot. `None` means nothing was ever
    /// written, which opens as an empty store.
    fn load(&self) -> StoreResult<Option<String>>;

    /// Replaces the persisted snapshot. Readers must never observe a
    /// partially written snapshot.
    fn store(&self, snapshot: &str) -> StoreResult<()>;

    /// Human readable name of the destination, for logs.
    fn describe(&self) -> String;
}

/// Persists snapshots to a single JSON file.
///
/// Each write goes to a sibling temp file which is fsynced and then renamed
/// over the target.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileBackend { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|it| it.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(TEMP_FILE_SUFFIX);
        self.path.with_file_name(name)
    }
}

impl StorageBackend for FileBackend {
    fn load(&self) -> StoreResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No file at {}, starting empty", self.path.display());
                Ok(None)
            }
            Err(err) => {
                log::error!("Failed to read {}: {}", self.path.display(), err);
                Err(StoreError::new_with_cause(
                    &format!("Failed to read {}", self.path.display()),
                    ErrorKind::IOError,
                    err.into(),
                ))
            }
        }
    }

    fn store(&self, snapshot: &str) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|it| !it.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = self.temp_path();
        let written = (|| -> std::io::Result<()> {
            let mut file = File::create(&temp_path)?;
            file.write_all(snapshot.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp_path, &self.path)
        })();

        written.map_err(|err| {
            log::error!("Failed to write {}: {}", self.path.display(), err);
            let _ = fs::remove_file(&temp_path);
            StoreError::new_with_cause(
                &format!("Failed to write {}", self.path.display()),
                ErrorKind::DurabilityError,
                err.into(),
            )
        })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Keeps the last snapshot in memory. Used when no file is configured.
#[derive(Default)]
pub struct InMemoryBackend {
    snapshot: Mutex<Option<String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        InMemoryBackend::default()
    }

    /// Starts from an existing snapshot, as if it had been loaded from disk.
    pub fn with_snapshot(snapshot: &str) -> Self {
        InMemoryBackend {
            snapshot: Mutex::new(Some(snapshot.to_string())),
        }
    }

    pub fn snapshot(&self) -> Option<String> {
        self.snapshot.lock().clone()
    }
}

impl StorageBackend for InMemoryBackend {
    fn load(&self) -> StoreResult<Option<String>> {
        Ok(self.snapshot.lock().clone())
    }

    fn store(&self, snapshot: &str) -> StoreResult<()> {
        *self.snapshot.lock() = Some(snapshot.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
