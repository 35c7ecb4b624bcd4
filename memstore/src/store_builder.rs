use crate::collection::{IncludeResolver, ModelDefinition};
use crate::errors::{StoreError, StoreResult};
use crate::memory_store::MemoryStore;
use crate::store::StorageBackend;
use crate::store_config::StoreConfig;
use std::path::Path;
use std::sync::Arc;

/// Builder for a [MemoryStore].
///
/// Setters can be chained freely; the first invalid setting is kept and
/// returned by [MemoryStoreBuilder::open].
#[derive(Default)]
pub struct MemoryStoreBuilder {
    error: Option<StoreError>,
    config: StoreConfig,
}

impl MemoryStoreBuilder {
    pub fn new() -> Self {
        MemoryStoreBuilder {
            error: None,
            config: StoreConfig::new(),
        }
    }

    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_file_path(path.as_ref()) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn backend(mut self, backend: Arc<dyn StorageBackend>) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_backend(backend) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn include_resolver(mut self, resolver: Arc<dyn IncludeResolver>) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_include_resolver(resolver) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn define_model(self, model: ModelDefinition) -> Self {
        self.config.define_model(model);
        self
    }

    /// Overrides the `legacy_neq` feature default for this store.
    pub fn legacy_neq(self, enabled: bool) -> Self {
        self.config.set_legacy_neq(enabled);
        self
    }

    pub fn open(self) -> StoreResult<MemoryStore> {
        if let Some(error) = self.error {
            return Err(error);
        }
        MemoryStore::open(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::store::InMemoryBackend;

    #[test]
    fn test_open_in_memory() {
        let store = MemoryStoreBuilder::new()
            .define_model(ModelDefinition::new("User"))
            .legacy_neq(false)
            .open()
            .unwrap();
        assert!(!store.config().match_options().legacy_neq);
        assert_eq!(store.config().model_names(), vec!["User"]);
        assert_eq!(store.destination().unwrap(), "memory");
    }

    #[test]
    fn test_first_error_wins() {
        let result = MemoryStoreBuilder::new()
            .file("")
            .backend(Arc::new(InMemoryBackend::new()))
            .open();
        let err = result.err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert_eq!(err.message(), "File path cannot be empty");
    }

    #[test]
    fn test_file_and_backend_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let result = MemoryStoreBuilder::new()
            .file(dir.path().join("db.json"))
            .backend(Arc::new(InMemoryBackend::new()))
            .open();
        assert!(result.is_err());
    }

    #[test]
    fn test_open_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        let store = MemoryStoreBuilder::new().file(&path).open().unwrap();
        assert!(store.destination().unwrap().contains("db.json"));
    }
}
