use super::read_operations::{coerce_predicate, ReadOperations};
use crate::collection::{
    DeleteResult, Document, DocumentId, FindOptions, ModelDefinition, UpdateResult, UpsertResult,
};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Predicate;
use crate::store::{CollectionStore, StoreState};
use crate::store_config::StoreConfig;

/// Mutating operations of one collection.
///
/// Every operation runs against the state it was given and either applies
/// completely or fails before touching it. Returned documents are in the
/// form later reads produce.
pub(crate) struct WriteOperations<'a> {
    store: CollectionStore<'a>,
    model: &'a ModelDefinition,
    config: &'a StoreConfig,
}

impl<'a> WriteOperations<'a> {
    pub(crate) fn new(
        state: &'a mut StoreState,
        model: &'a ModelDefinition,
        config: &'a StoreConfig,
    ) -> Self {
        WriteOperations {
            store: CollectionStore::new(state, model),
            model,
            config,
        }
    }

    fn reads(&self) -> ReadOperations<'_> {
        ReadOperations::new(self.store.view(), self.config)
    }

    pub(crate) fn create(&mut self, document: Document) -> StoreResult<(DocumentId, Document)> {
        let (id, document) = self.store.create(document)?;
        Ok((id, self.model.coerce_document(document)))
    }

    /// Merges into the document with the same id, or creates it.
    pub(crate) fn save(&mut self, data: Document) -> StoreResult<UpsertResult> {
        match self.model.get_id_value(&data)? {
            Some(id) if self.store.view().exists(&id) => {
                let (document, _) = self.store.put(&id, &data)?;
                Ok(UpsertResult {
                    document: self.model.coerce_document(document),
                    is_new_instance: false,
                })
            }
            _ => {
                let (_, document) = self.create(data)?;
                Ok(UpsertResult {
                    document,
                    is_new_instance: true,
                })
            }
        }
    }

    /// Merges `data` into an existing document. The id in `data` is
    /// ignored in favour of `id`.
    pub(crate) fn update_attributes(
        &mut self,
        id: &DocumentId,
        mut data: Document,
    ) -> StoreResult<Document> {
        if !self.store.view().exists(id) {
            log::error!(
                "Could not update attributes, {} with id {} does not exist",
                self.model.name(),
                id
            );
            return Err(StoreError::new(
                &format!(
                    "Could not update attributes, {} with id {} does not exist",
                    self.model.name(),
                    id
                ),
                ErrorKind::NotFound,
            ));
        }

        self.model.set_id_value(&mut data, id)?;
        let (document, _) = self.store.put(id, &data)?;
        Ok(self.model.coerce_document(document))
    }

    /// Merges `data` into every match. Ids are never changed.
    pub(crate) fn update_all(
        &mut self,
        predicate: Option<&Predicate>,
        data: &Document,
    ) -> StoreResult<UpdateResult> {
        let ids = self.matching_ids(predicate)?;
        let mut update = data.clone();
        for id_name in self.model.id_names() {
            update.remove(&id_name);
        }

        for id in ids.iter() {
            self.store.put(id, &update)?;
        }
        log::debug!("Updated {} documents of {}", ids.len(), self.model.name());
        Ok(UpdateResult { count: ids.len() })
    }

    /// Replaces the document with `data`, which must exist.
    pub(crate) fn replace_by_id(&mut self, id: &DocumentId, data: Document) -> StoreResult<Document> {
        if !self.store.view().exists(id) {
            log::error!(
                "Could not replace, {} with id {} does not exist",
                self.model.name(),
                id
            );
            return Err(StoreError::new(
                &format!(
                    "Could not replace, {} with id {} does not exist",
                    self.model.name(),
                    id
                ),
                ErrorKind::NotFound,
            ));
        }
        let document = self.store.replace(id, data)?;
        Ok(self.model.coerce_document(document))
    }

    /// Replaces the document with the same id, or creates it.
    pub(crate) fn replace_or_create(&mut self, data: Document) -> StoreResult<UpsertResult> {
        match self.model.get_id_value(&data)? {
            Some(id) if self.store.view().exists(&id) => Ok(UpsertResult {
                document: self.replace_by_id(&id, data)?,
                is_new_instance: false,
            }),
            _ => {
                let (_, document) = self.create(data)?;
                Ok(UpsertResult {
                    document,
                    is_new_instance: true,
                })
            }
        }
    }

    /// Returns the first match of `options`, or creates `data` when there
    /// is none. The flag tells whether a document was created.
    pub(crate) fn find_or_create(
        &mut self,
        options: &FindOptions,
        data: Document,
    ) -> StoreResult<(Document, bool)> {
        let first = self
            .reads()
            .find(&options.clone().limit(1))?
            .into_iter()
            .next();
        match first {
            Some(found) => Ok((found, false)),
            None => {
                let (_, document) = self.create(data)?;
                Ok((document, true))
            }
        }
    }

    /// Updates the single match of `predicate`, or creates `data` when
    /// nothing matches.
    ///
    /// # Errors
    ///
    /// Fails without changes when more than one document matches.
    pub(crate) fn upsert_with_where(
        &mut self,
        predicate: &Predicate,
        data: Document,
    ) -> StoreResult<UpsertResult> {
        let ids = self.matching_ids(Some(predicate))?;
        match ids.as_slice() {
            [] => {
                let (_, document) = self.create(data)?;
                Ok(UpsertResult {
                    document,
                    is_new_instance: true,
                })
            }
            [id] => Ok(UpsertResult {
                document: self.update_attributes(id, data)?,
                is_new_instance: false,
            }),
            _ => {
                log::error!(
                    "{} documents of {} match, upsert needs at most one",
                    ids.len(),
                    self.model.name()
                );
                Err(StoreError::new(
                    &format!(
                        "{} documents of {} match, upsert needs at most one",
                        ids.len(),
                        self.model.name()
                    ),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }

    pub(crate) fn destroy(&mut self, id: &DocumentId) -> DeleteResult {
        let count = usize::from(self.store.delete(id));
        DeleteResult { count }
    }

    pub(crate) fn destroy_all(&mut self, predicate: Option<&Predicate>) -> StoreResult<DeleteResult> {
        let predicate = predicate.map(|it| coerce_predicate(self.model, it.clone()));
        let options = self.config.match_options();
        let count = self.store.delete_all(predicate.as_ref(), &options)?;
        log::debug!("Destroyed {} documents of {}", count, self.model.name());
        Ok(DeleteResult { count })
    }

    pub(crate) fn reset(&mut self) {
        self.store.reset();
    }

    fn matching_ids(&self, predicate: Option<&Predicate>) -> StoreResult<Vec<DocumentId>> {
        let options = FindOptions {
            predicate: predicate.cloned(),
            ..FindOptions::default()
        };
        let mut ids = Vec::new();
        for document in self.reads().find_skipping_includes(&options)? {
            if let Some(id) = self.model.get_id_value(&document)? {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}
