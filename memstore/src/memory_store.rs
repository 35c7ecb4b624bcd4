//! The public face of the store.

use crate::collection::{
    DeleteResult, Document, DocumentId, FindOptions, ModelDefinition, Persisted, ReadOperations,
    UpdateResult, UpsertResult, WriteOperations,
};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Predicate;
use crate::store::{shared_for_file, CollectionView, InMemoryBackend, SharedStore, StoreState};
use crate::store_builder::MemoryStoreBuilder;
use crate::store_config::StoreConfig;
use itertools::Itertools;
use parking_lot::RwLock;
use std::sync::Arc;

/// An embedded document store keeping every collection in memory and
/// persisting a snapshot of all of them after each mutation.
///
/// Reads never wait for disk. Each mutation is applied in memory before the
/// call returns and its snapshot is queued for the backing destination; the
/// returned [Persisted] tells when that write finished.
///
/// Clones share the same store.
///
/// # Examples
///
/// ```rust,ignore
/// use memstore::{doc, MemoryStore};
/// use memstore::collection::{FindOptions, ModelDefinition};
/// use memstore::filter::field;
///
/// let store = MemoryStore::builder()
///     .file("users.json")
///     .define_model(ModelDefinition::new("User"))
///     .open()?;
///
/// let id = store.create("User", doc! { name: "John", vip: true })?.wait()?;
/// let vips = store.all("User", &FindOptions::new().where_clause(field("vip").eq(true)))?;
/// store.close()?;
/// ```
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn builder() -> MemoryStoreBuilder {
        MemoryStoreBuilder::new()
    }

    /// Opens a store on the destination named by `config`. Without a file
    /// or backend the store persists to memory only.
    pub(crate) fn open(config: StoreConfig) -> StoreResult<MemoryStore> {
        let shared = match (config.file_path(), config.backend()) {
            (Some(path), _) => shared_for_file(&path)?,
            (None, Some(backend)) => Arc::new(SharedStore::open(backend)?),
            (None, None) => Arc::new(SharedStore::open(Arc::new(InMemoryBackend::new()))?),
        };
        config.mark_configured();
        log::debug!("Memory store opened on {}", shared.describe());

        Ok(MemoryStore {
            inner: Arc::new(MemoryStoreInner {
                config,
                shared: RwLock::new(Some(shared)),
            }),
        })
    }

    /// Attaches a model. Its collection is created on first write.
    pub fn define(&self, model: ModelDefinition) -> StoreResult<()> {
        self.inner.shared()?;
        self.inner.config.define_model(model);
        Ok(())
    }

    pub fn config(&self) -> StoreConfig {
        self.inner.config.clone()
    }

    /// Name of the backing destination.
    pub fn destination(&self) -> StoreResult<String> {
        Ok(self.inner.shared()?.describe())
    }

    /// Stores a new document and returns its id.
    ///
    /// # Errors
    ///
    /// `DuplicateEntry` when the document carries an id already in use.
    pub fn create(&self, model: &str, data: Document) -> StoreResult<Persisted<DocumentId>> {
        self.inner.write(model, |writes| Ok(writes.create(data)?.0))
    }

    /// Merges `data` into the document with the same id, or creates it.
    pub fn save(&self, model: &str, data: Document) -> StoreResult<Persisted<UpsertResult>> {
        self.inner.write(model, |writes| writes.save(data))
    }

    pub fn find_by_id(&self, model: &str, id: &DocumentId) -> StoreResult<Option<Document>> {
        self.inner.read(model, |reads| reads.find_by_id(id))
    }

    pub fn exists(&self, model: &str, id: &DocumentId) -> StoreResult<bool> {
        self.inner.read(model, |reads| Ok(reads.exists(id)))
    }

    pub fn count(&self, model: &str, predicate: Option<&Predicate>) -> StoreResult<usize> {
        self.inner.read(model, |reads| reads.count(predicate))
    }

    /// Runs a query.
    pub fn all(&self, model: &str, options: &FindOptions) -> StoreResult<Vec<Document>> {
        self.inner.read(model, |reads| reads.find(options))
    }

    pub fn destroy(&self, model: &str, id: &DocumentId) -> StoreResult<Persisted<DeleteResult>> {
        self.inner.write(model, |writes| Ok(writes.destroy(id)))
    }

    /// Removes the matches of `predicate`, or every document without one.
    pub fn destroy_all(
        &self,
        model: &str,
        predicate: Option<&Predicate>,
    ) -> StoreResult<Persisted<DeleteResult>> {
        self.inner.write(model, |writes| writes.destroy_all(predicate))
    }

    /// Merges `data` into an existing document.
    ///
    /// # Errors
    ///
    /// `NotFound` when there is no document with that id.
    pub fn update_attributes(
        &self,
        model: &str,
        id: &DocumentId,
        data: Document,
    ) -> StoreResult<Persisted<Document>> {
        self.inner
            .write(model, |writes| writes.update_attributes(id, data))
    }

    pub fn update_all(
        &self,
        model: &str,
        predicate: Option<&Predicate>,
        data: &Document,
    ) -> StoreResult<Persisted<UpdateResult>> {
        self.inner
            .write(model, |writes| writes.update_all(predicate, data))
    }

    pub fn update_or_create(
        &self,
        model: &str,
        data: Document,
    ) -> StoreResult<Persisted<UpsertResult>> {
        self.inner.write(model, |writes| writes.save(data))
    }

    pub fn replace_by_id(
        &self,
        model: &str,
        id: &DocumentId,
        data: Document,
    ) -> StoreResult<Persisted<Document>> {
        self.inner.write(model, |writes| writes.replace_by_id(id, data))
    }

    pub fn replace_or_create(
        &self,
        model: &str,
        data: Document,
    ) -> StoreResult<Persisted<UpsertResult>> {
        self.inner.write(model, |writes| writes.replace_or_create(data))
    }

    /// Returns the first match of `options`, creating `data` when nothing
    /// matches. The flag is `true` when a document was created.
    pub fn find_or_create(
        &self,
        model: &str,
        options: &FindOptions,
        data: Document,
    ) -> StoreResult<Persisted<(Document, bool)>> {
        self.inner
            .write(model, |writes| writes.find_or_create(options, data))
    }

    /// Updates the single match of `predicate` or creates `data`.
    pub fn upsert_with_where(
        &self,
        model: &str,
        predicate: &Predicate,
        data: Document,
    ) -> StoreResult<Persisted<UpsertResult>> {
        self.inner
            .write(model, |writes| writes.upsert_with_where(predicate, data))
    }

    /// Empties the collections of the named models, or of every attached
    /// model, and restarts their sequences.
    ///
    /// # Errors
    ///
    /// `MigrationError` naming every requested model that is not attached.
    /// Nothing is reset in that case.
    pub fn automigrate(&self, models: Option<&[&str]>) -> StoreResult<Persisted<()>> {
        let attached = self.inner.config.model_names();
        let names: Vec<String> = match models {
            None => attached,
            Some(requested) => {
                let unknown = requested
                    .iter()
                    .filter(|name| !attached.iter().any(|it| it.as_str() == **name))
                    .join(" ");
                if !unknown.is_empty() {
                    log::error!("Cannot migrate models not attached to this store: {}", unknown);
                    return Err(StoreError::new(
                        &format!("Cannot migrate models not attached to this store: {}", unknown),
                        ErrorKind::MigrationError,
                    ));
                }
                requested.iter().map(|it| it.to_string()).collect()
            }
        };

        let definitions = names
            .iter()
            .map(|name| self.inner.config.model(name))
            .collect::<StoreResult<Vec<ModelDefinition>>>()?;
        let shared = self.inner.shared()?;
        let config = &self.inner.config;
        let ((), ack) = shared.mutate(|state| {
            for model in definitions.iter() {
                WriteOperations::new(state, model, config).reset();
            }
            Ok(())
        })?;
        log::debug!("Migrated {}", names.iter().join(", "));
        Ok(Persisted::new((), ack))
    }

    /// Releases this handle on the backing destination. Queued writes still
    /// complete; any further call fails with `StoreAlreadyClosed`.
    pub fn close(&self) -> StoreResult<()> {
        match self.inner.shared.write().take() {
            Some(shared) => {
                log::debug!("Closing memory store on {}", shared.describe());
                Ok(())
            }
            None => Err(already_closed()),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.shared.read().is_none()
    }
}

struct MemoryStoreInner {
    config: StoreConfig,
    shared: RwLock<Option<Arc<SharedStore>>>,
}

impl MemoryStoreInner {
    fn shared(&self) -> StoreResult<Arc<SharedStore>> {
        self.shared.read().clone().ok_or_else(already_closed)
    }

    fn read<R>(
        &self,
        model: &str,
        f: impl FnOnce(&ReadOperations) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let model = self.config.model(model)?;
        let shared = self.shared()?;
        shared.read(|state: &StoreState| {
            let reads = ReadOperations::new(CollectionView::new(state, &model), &self.config);
            f(&reads)
        })
    }

    fn write<R>(
        &self,
        model: &str,
        f: impl FnOnce(&mut WriteOperations) -> StoreResult<R>,
    ) -> StoreResult<Persisted<R>> {
        let model = self.config.model(model)?;
        let shared = self.shared()?;
        let (value, ack) = shared.mutate(|state| {
            let mut writes = WriteOperations::new(state, &model, &self.config);
            f(&mut writes)
        })?;
        Ok(Persisted::new(value, ack))
    }
}

fn already_closed() -> StoreError {
    log::error!("Memory store is already closed");
    StoreError::new("Memory store is already closed", ErrorKind::StoreAlreadyClosed)
}
