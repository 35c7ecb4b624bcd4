use crate::collection::{Document, DocumentId, ModelDefinition};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::{MatchOptions, Predicate};
use crate::store::StoreState;

/// Read access to the records of one model's collection.
///
/// Records are kept serialized; every read parses them again and applies
/// the model's declared types, so callers always get independent copies.
pub(crate) struct CollectionView<'a> {
    state: &'a StoreState,
    model: &'a ModelDefinition,
}

impl<'a> CollectionView<'a> {
    pub(crate) fn new(state: &'a StoreState, model: &'a ModelDefinition) -> Self {
        CollectionView { state, model }
    }

    pub(crate) fn model(&self) -> &ModelDefinition {
        self.model
    }

    pub(crate) fn get(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        let key = self.model.coerce_id(id.clone()).key();
        self.state
            .record(self.model.collection_name(), &key)
            .map(|text| decode(self.model, text))
            .transpose()
    }

    pub(crate) fn exists(&self, id: &DocumentId) -> bool {
        let key = self.model.coerce_id(id.clone()).key();
        self.state.record(self.model.collection_name(), &key).is_some()
    }

    /// Every document of the collection, in storage order.
    pub(crate) fn documents(&self) -> StoreResult<Vec<Document>> {
        self.state
            .records(self.model.collection_name())
            .map(|(_, text)| decode(self.model, text))
            .collect()
    }

    pub(crate) fn count(
        &self,
        predicate: Option<&Predicate>,
        options: &MatchOptions,
    ) -> StoreResult<usize> {
        match predicate.filter(|it| !it.is_empty()) {
            None => Ok(self.state.record_count(self.model.collection_name())),
            Some(predicate) => Ok(self
                .documents()?
                .iter()
                .filter(|doc| predicate.matches(doc, options))
                .count()),
        }
    }
}

/// Write access to the records and sequence of one model's collection.
///
/// Operations either succeed completely or leave the state untouched.
pub(crate) struct CollectionStore<'a> {
    state: &'a mut StoreState,
    model: &'a ModelDefinition,
}

impl<'a> CollectionStore<'a> {
    pub(crate) fn new(state: &'a mut StoreState, model: &'a ModelDefinition) -> Self {
        state.init_collection(model.collection_name());
        CollectionStore { state, model }
    }

    pub(crate) fn view(&self) -> CollectionView<'_> {
        CollectionView::new(self.state, self.model)
    }

    /// Stores a new document, assigning the next sequence value when the
    /// document carries no id.
    pub(crate) fn create(&mut self, mut document: Document) -> StoreResult<(DocumentId, Document)> {
        let supplied = self.model.get_id_value(&document)?;
        if let Some(id) = &supplied {
            if self.view().exists(id) {
                log::error!("Duplicate entry for {} with id {}", self.model.name(), id);
                return Err(StoreError::new(
                    &format!("Duplicate entry for {} with id {}", self.model.name(), id),
                    ErrorKind::DuplicateEntry,
                ));
            }
        }

        let current = self.state.sequence(self.model.collection_name());
        let id = match &supplied {
            Some(id) => id.clone(),
            None => self.model.coerce_id(DocumentId::Number(current)),
        };
        self.model.set_id_value(&mut document, &id)?;
        let serialized = encode(&document)?;

        self.state.advance_sequence(
            self.model.collection_name(),
            supplied.as_ref().and_then(DocumentId::numeric_value),
        )?;
        self.state
            .put_record(self.model.collection_name(), id.key(), serialized);
        log::debug!("Created {} {}", self.model.name(), id);
        Ok((id, document))
    }

    /// Merges `data` over the stored document with the same id, or stores
    /// it as is when there is none. Returns the stored form and whether it
    /// is new.
    pub(crate) fn put(&mut self, id: &DocumentId, data: &Document) -> StoreResult<(Document, bool)> {
        let (mut document, is_new) = match self.view().get(id)? {
            Some(mut existing) => {
                existing.merge(data);
                (existing, false)
            }
            None => (data.clone(), true),
        };
        self.model.set_id_value(&mut document, id)?;
        self.write(id, &document)?;
        Ok((document, is_new))
    }

    /// Replaces the stored document with `data`.
    pub(crate) fn replace(&mut self, id: &DocumentId, data: Document) -> StoreResult<Document> {
        let mut document = data;
        self.model.set_id_value(&mut document, id)?;
        self.write(id, &document)?;
        Ok(document)
    }

    pub(crate) fn delete(&mut self, id: &DocumentId) -> bool {
        let key = self.model.coerce_id(id.clone()).key();
        self.state.remove_record(self.model.collection_name(), &key).is_some()
    }

    /// Removes every matching document, or the whole collection when no
    /// predicate is given. Returns the number removed.
    pub(crate) fn delete_all(
        &mut self,
        predicate: Option<&Predicate>,
        options: &MatchOptions,
    ) -> StoreResult<usize> {
        let predicate = match predicate.filter(|it| !it.is_empty()) {
            None => return Ok(self.state.clear_records(self.model.collection_name())),
            Some(predicate) => predicate,
        };

        let mut doomed = Vec::new();
        for (key, text) in self.state.records(self.model.collection_name()) {
            if predicate.matches(&decode(self.model, text)?, options) {
                doomed.push(key.clone());
            }
        }
        for key in doomed.iter() {
            self.state.remove_record(self.model.collection_name(), key);
        }
        Ok(doomed.len())
    }

    /// Empties the collection and restarts its sequence.
    pub(crate) fn reset(&mut self) {
        log::debug!("Resetting collection {}", self.model.collection_name());
        self.state.reset_collection(self.model.collection_name());
    }

    fn write(&mut self, id: &DocumentId, document: &Document) -> StoreResult<()> {
        let key = self.model.coerce_id(id.clone()).key();
        let serialized = encode(document)?;
        self.state.put_record(self.model.collection_name(), key, serialized);
        Ok(())
    }
}

fn encode(document: &Document) -> StoreResult<String> {
    Ok(serde_json::to_string(&document.to_json())?)
}

fn decode(model: &ModelDefinition, text: &str) -> StoreResult<Document> {
    let json: serde_json::Value = serde_json::from_str(text).map_err(|err| {
        log::error!("Malformed record in {}: {}", model.collection_name(), err);
        StoreError::new(
            &format!("Malformed record in {}: {}", model.collection_name(), err),
            ErrorKind::EncodingError,
        )
    })?;
    Ok(model.coerce_document(Document::from_json(&json)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::FieldType;
    use crate::common::Value;
    use crate::doc;
    use crate::filter::field;

    fn user() -> ModelDefinition {
        ModelDefinition::new("User").property("birthday", FieldType::Date)
    }

    #[test]
    fn test_create_assigns_sequence_ids() {
        let mut state = StoreState::new();
        let model = user();
        let mut store = CollectionStore::new(&mut state, &model);

        let (first, _) = store.create(doc! { name: "John" }).unwrap();
        let (second, doc) = store.create(doc! { name: "Paul" }).unwrap();
        assert_eq!(first, DocumentId::Number(1));
        assert_eq!(second, DocumentId::Number(2));
        assert_eq!(doc.get("id"), Some(&Value::I64(2)));
    }

    #[test]
    fn test_supplied_id_moves_sequence() {
        let mut state = StoreState::new();
        let model = user();
        let mut store = CollectionStore::new(&mut state, &model);

        store.create(doc! { id: 10, name: "George" }).unwrap();
        let (next, _) = store.create(doc! { name: "Ringo" }).unwrap();
        assert_eq!(next, DocumentId::Number(11));
    }

    #[test]
    fn test_sequence_stops_at_i64_max() {
        let mut state = StoreState::new();
        let model = user();
        let mut store = CollectionStore::new(&mut state, &model);

        let err = store.create(doc! { id: (i64::MAX), name: "Pete" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
        assert!(!store.view().exists(&DocumentId::Number(i64::MAX)));

        store.create(doc! { id: (i64::MAX - 1), name: "Stuart" }).unwrap();
        let (last, _) = store.create(doc! { name: "Brian" }).unwrap();
        assert_eq!(last, DocumentId::Number(i64::MAX));

        let err = store.create(doc! { name: "Billy" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
        assert_eq!(store.view().count(None, &MatchOptions::default()).unwrap(), 2);
    }

    #[test]
    fn test_duplicate_id_leaves_state_untouched() {
        let mut state = StoreState::new();
        let model = user();
        let mut store = CollectionStore::new(&mut state, &model);
        store.create(doc! { id: 1, name: "John" }).unwrap();
        drop(store);
        let before = state.clone();

        let mut store = CollectionStore::new(&mut state, &model);
        let err = store.create(doc! { id: 1, name: "Paul" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DuplicateEntry);
        drop(store);
        assert_eq!(state, before);
    }

    #[test]
    fn test_reads_apply_declared_types() {
        let mut state = StoreState::new();
        let model = user();
        let mut store = CollectionStore::new(&mut state, &model);
        let (id, _) = store
            .create(doc! { name: "John", birthday: "1980-12-08T00:00:00.000Z" })
            .unwrap();

        let doc = store.view().get(&id).unwrap().unwrap();
        assert!(doc.get("birthday").is_some_and(|it| it.is_date()));
        assert!(store.view().get(&DocumentId::from("1")).unwrap().is_some());
        assert!(store.view().get(&DocumentId::Number(9)).unwrap().is_none());
    }

    #[test]
    fn test_put_merges_and_is_idempotent() {
        let mut state = StoreState::new();
        let model = user();
        let mut store = CollectionStore::new(&mut state, &model);
        let (id, _) = store.create(doc! { name: "John", vip: true }).unwrap();

        let (merged, is_new) = store.put(&id, &doc! { vip: false, seq: 1 }).unwrap();
        assert!(!is_new);
        assert_eq!(merged, doc! { name: "John", vip: false, id: 1, seq: 1 });

        let before = store.view().get(&id).unwrap();
        store.put(&id, &merged).unwrap();
        assert_eq!(store.view().get(&id).unwrap(), before);

        let (_, is_new) = store.put(&DocumentId::Number(7), &doc! { name: "Ringo" }).unwrap();
        assert!(is_new);
    }

    #[test]
    fn test_replace_drops_old_fields() {
        let mut state = StoreState::new();
        let model = user();
        let mut store = CollectionStore::new(&mut state, &model);
        let (id, _) = store.create(doc! { name: "John", vip: true }).unwrap();

        store.replace(&id, doc! { name: "Johnny" }).unwrap();
        let doc = store.view().get(&id).unwrap().unwrap();
        assert_eq!(doc, doc! { name: "Johnny", id: 1 });
    }

    #[test]
    fn test_delete_and_delete_all() {
        let mut state = StoreState::new();
        let model = user();
        let mut store = CollectionStore::new(&mut state, &model);
        for seq in 0..4 {
            store.create(doc! { seq: seq }).unwrap();
        }

        assert!(store.delete(&DocumentId::Number(1)));
        assert!(!store.delete(&DocumentId::Number(1)));

        let options = MatchOptions::default();
        let removed = store
            .delete_all(Some(&field("seq").gte(2)), &options)
            .unwrap();
        assert_eq!(removed, 2);
        assert_eq!(store.view().count(None, &options).unwrap(), 1);
        assert_eq!(store.delete_all(None, &options).unwrap(), 1);
        assert!(store.view().documents().unwrap().is_empty());
    }

    #[test]
    fn test_count_and_documents() {
        let mut state = StoreState::new();
        let model = user();
        let mut store = CollectionStore::new(&mut state, &model);
        store.create(doc! { vip: true }).unwrap();
        store.create(doc! { vip: false }).unwrap();
        store.create(doc! { vip: true }).unwrap();

        let options = MatchOptions::default();
        let view = store.view();
        assert_eq!(view.count(Some(&field("vip").eq(true)), &options).unwrap(), 2);
        let ids: Vec<_> = view
            .documents()
            .unwrap()
            .iter()
            .map(|doc| doc.get("id").cloned())
            .collect();
        assert_eq!(ids, vec![Some(Value::from(1)), Some(Value::from(2)), Some(Value::from(3))]);
    }

    #[test]
    fn test_reset_restarts_sequence() {
        let mut state = StoreState::new();
        let model = user();
        let mut store = CollectionStore::new(&mut state, &model);
        store.create(doc! { name: "John" }).unwrap();
        store.reset();
        let (id, _) = store.create(doc! { name: "Paul" }).unwrap();
        assert_eq!(id, DocumentId::Number(1));
    }

    #[test]
    fn test_aliased_models_share_collection() {
        let mut state = StoreState::new();
        let person = ModelDefinition::new("Person").collection("people");
        let author = ModelDefinition::new("Author").collection("people");

        CollectionStore::new(&mut state, &person)
            .create(doc! { name: "John" })
            .unwrap();
        let (id, _) = CollectionStore::new(&mut state, &author)
            .create(doc! { name: "Paul" })
            .unwrap();
        assert_eq!(id, DocumentId::Number(2));
        assert_eq!(state.record_count("people"), 2);
    }
}
