//! Configuration of a memory store.

use crate::collection::{model_not_found, IncludeResolver, ModelDefinition};
use crate::common::{atomic, Atomic, LockExt};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::MatchOptions;
use crate::store::StorageBackend;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Settings shared by a store and everything it hands out.
///
/// Cloning is cheap; all clones see the same settings. The destination and
/// the include resolver can only be set before the store is opened.
///
/// # Examples
///
/// ```rust,ignore
/// use memstore::MemoryStoreBuilder;
///
/// let store = MemoryStoreBuilder::new()
///     .file("/tmp/db.json")
///     .define_model(ModelDefinition::new("User"))
///     .open()?;
/// ```
#[derive(Clone)]
pub struct StoreConfig {
    inner: Arc<StoreConfigInner>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        StoreConfig {
            inner: Arc::new(StoreConfigInner::new()),
        }
    }

    /// Persists to the given JSON file. Stores configured with the same
    /// file share their state.
    pub fn set_file_path(&self, path: &Path) -> StoreResult<()> {
        self.inner.set_file_path(path)
    }

    pub fn file_path(&self) -> Option<PathBuf> {
        self.inner.file_path.get().cloned()
    }

    /// Persists through a custom backend instead of a file.
    pub fn set_backend(&self, backend: Arc<dyn StorageBackend>) -> StoreResult<()> {
        self.inner.set_backend(backend)
    }

    pub fn backend(&self) -> Option<Arc<dyn StorageBackend>> {
        self.inner.backend.get().cloned()
    }

    pub fn set_include_resolver(&self, resolver: Arc<dyn IncludeResolver>) -> StoreResult<()> {
        self.inner.set_include_resolver(resolver)
    }

    pub fn include_resolver(&self) -> Option<Arc<dyn IncludeResolver>> {
        self.inner.include_resolver.get().cloned()
    }

    /// Switches the compatibility behaviour of `neq` against incomparable
    /// values. Defaults to the `legacy_neq` feature.
    pub fn set_legacy_neq(&self, enabled: bool) {
        self.inner.legacy_neq.store(enabled, Ordering::Relaxed);
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            legacy_neq: self.inner.legacy_neq.load(Ordering::Relaxed),
        }
    }

    /// Attaches a model, replacing an earlier definition of the same name.
    pub fn define_model(&self, model: ModelDefinition) {
        log::debug!(
            "Attaching model {} to collection {}",
            model.name(),
            model.collection_name()
        );
        self.inner
            .models
            .write_with(|models| models.insert(model.name().to_string(), model));
    }

    /// Looks up an attached model.
    ///
    /// # Errors
    ///
    /// Returns `ModelNotFound` when no model of that name is attached.
    pub fn model(&self, name: &str) -> StoreResult<ModelDefinition> {
        self.inner
            .models
            .read_with(|models| models.get(name).cloned())
            .ok_or_else(|| model_not_found(name))
    }

    pub fn model_names(&self) -> Vec<String> {
        self.inner
            .models
            .read_with(|models| models.keys().cloned().collect())
    }

    pub(crate) fn mark_configured(&self) {
        self.inner.configured.store(true, Ordering::Relaxed);
    }
}

struct StoreConfigInner {
    configured: AtomicBool,
    file_path: OnceLock<PathBuf>,
    backend: OnceLock<Arc<dyn StorageBackend>>,
    include_resolver: OnceLock<Arc<dyn IncludeResolver>>,
    legacy_neq: AtomicBool,
    models: Atomic<IndexMap<String, ModelDefinition>>,
}

impl StoreConfigInner {
    fn new() -> Self {
        StoreConfigInner {
            configured: AtomicBool::new(false),
            file_path: OnceLock::new(),
            backend: OnceLock::new(),
            include_resolver: OnceLock::new(),
            legacy_neq: AtomicBool::new(MatchOptions::default().legacy_neq),
            models: atomic(IndexMap::new()),
        }
    }

    fn ensure_not_configured(&self, setting: &str) -> StoreResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after the store is opened", setting);
            return Err(StoreError::new(
                &format!("{} cannot be changed after the store is opened", setting),
                ErrorKind::ValidationError,
            ));
        }
        Ok(())
    }

    fn set_file_path(&self, path: &Path) -> StoreResult<()> {
        self.ensure_not_configured("File path")?;
        if path.as_os_str().is_empty() {
            log::error!("File path cannot be empty");
            return Err(StoreError::new(
                "File path cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        if self.backend.get().is_some() {
            return Err(destination_conflict());
        }
        self.file_path
            .set(path.to_path_buf())
            .map_err(|_| already_set("File path"))
    }

    fn set_backend(&self, backend: Arc<dyn StorageBackend>) -> StoreResult<()> {
        self.ensure_not_configured("Backend")?;
        if self.file_path.get().is_some() {
            return Err(destination_conflict());
        }
        self.backend
            .set(backend)
            .map_err(|_| already_set("Backend"))
    }

    fn set_include_resolver(&self, resolver: Arc<dyn IncludeResolver>) -> StoreResult<()> {
        self.ensure_not_configured("Include resolver")?;
        self.include_resolver
            .set(resolver)
            .map_err(|_| already_set("Include resolver"))
    }
}

fn destination_conflict() -> StoreError {
    log::error!("A store persists either to a file or to a backend, not both");
    StoreError::new(
        "A store persists either to a file or to a backend, not both",
        ErrorKind::ValidationError,
    )
}

fn already_set(setting: &str) -> StoreError {
    log::error!("{} is already set", setting);
    StoreError::new(
        &format!("{} is already set", setting),
        ErrorKind::ValidationError,
    )
}
