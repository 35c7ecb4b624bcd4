use crate::collection::{Document, DocumentId, FindOptions, ModelDefinition};
use crate::common::stream::{project_documents, sort_documents};
use crate::common::SortSpec;
use crate::errors::StoreResult;
use crate::filter::{MatchOptions, Predicate};
use crate::geo::{apply_near, extract_near};
use crate::store::CollectionView;
use crate::store_config::StoreConfig;

/// Query side of one collection.
pub(crate) struct ReadOperations<'a> {
    view: CollectionView<'a>,
    config: &'a StoreConfig,
    match_options: MatchOptions,
}

impl<'a> ReadOperations<'a> {
    pub(crate) fn new(view: CollectionView<'a>, config: &'a StoreConfig) -> Self {
        ReadOperations {
            view,
            config,
            match_options: config.match_options(),
        }
    }

    pub(crate) fn find_by_id(&self, id: &DocumentId) -> StoreResult<Option<Document>> {
        self.view.get(id)
    }

    pub(crate) fn exists(&self, id: &DocumentId) -> bool {
        self.view.exists(id)
    }

    pub(crate) fn count(&self, predicate: Option<&Predicate>) -> StoreResult<usize> {
        let predicate = predicate.map(|it| coerce_predicate(self.view.model(), it.clone()));
        self.view.count(predicate.as_ref(), &self.match_options)
    }

    /// Runs the full query, relation includes included.
    pub(crate) fn find(&self, options: &FindOptions) -> StoreResult<Vec<Document>> {
        let page = self.find_skipping_includes(options)?;
        match &options.include {
            None => Ok(page),
            Some(include) => match self.config.include_resolver() {
                Some(resolver) => resolver.resolve(self.view.model().name(), page, include),
                None => {
                    log::warn!(
                        "Query on {} asks for includes {} but no resolver is configured",
                        self.view.model().name(),
                        include
                    );
                    Ok(page)
                }
            },
        }
    }

    /// Runs the query pipeline: sort, near, match, project, paginate.
    ///
    /// Order clauses and near clauses are validated before any record is
    /// read, so a malformed query never returns a partial result.
    pub(crate) fn find_skipping_includes(&self, options: &FindOptions) -> StoreResult<Vec<Document>> {
        let model = self.view.model();
        let id_names = model.id_names();

        let sort_spec = if options.order.is_empty() {
            SortSpec::ascending(&id_names)
        } else {
            SortSpec::parse(&options.order)?
        };
        let predicate = options
            .predicate
            .as_ref()
            .filter(|it| !it.is_empty())
            .map(|it| coerce_predicate(model, it.clone()));
        let near = match &predicate {
            Some(predicate) => extract_near(predicate)?,
            None => None,
        };

        let mut documents = self.view.documents()?;
        log::debug!(
            "Scanning {} documents of {}",
            documents.len(),
            model.collection_name()
        );

        sort_documents(&mut documents, &sort_spec);
        if let Some(near) = &near {
            documents = apply_near(documents, near);
        }
        if let Some(predicate) = &predicate {
            documents.retain(|doc| predicate.matches(doc, &self.match_options));
        }
        if let Some(selection) = &options.fields {
            documents = project_documents(documents, selection, &id_names);
        }

        Ok(paginate(documents, options.skip, options.limit))
    }
}

/// Applies the model's declared types to the literals of a where clause.
pub(crate) fn coerce_predicate(model: &ModelDefinition, predicate: Predicate) -> Predicate {
    predicate.coerce_with(&|path, value| model.coerce_field(path, value))
}

fn paginate(documents: Vec<Document>, skip: Option<usize>, limit: Option<usize>) -> Vec<Document> {
    let skipped = documents.into_iter().skip(skip.unwrap_or(0));
    match limit {
        Some(limit) if limit > 0 => skipped.take(limit).collect(),
        _ => skipped.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{FieldSelection, FieldType, IncludeResolver};
    use crate::common::{date_value, Value};
    use crate::doc;
    use crate::errors::ErrorKind;
    use crate::filter::{field, or};
    use crate::geo::{DistanceUnit, NearClause};
    use crate::store::{CollectionStore, StoreState};
    use std::sync::Arc;

    fn user() -> ModelDefinition {
        ModelDefinition::new("User")
            .property("seq", FieldType::Number)
            .property("birthday", FieldType::Date)
    }

    fn seeded(model: &ModelDefinition) -> StoreState {
        let mut state = StoreState::new();
        let mut store = CollectionStore::new(&mut state, model);
        let rows = [
            doc! { seq: 0, name: "John Lennon", vip: true, birthday: "1980-12-08T00:00:00.000Z" },
            doc! { seq: 1, name: "Paul McCartney", vip: true, birthday: "1942-06-18T00:00:00.000Z" },
            doc! { seq: 2, name: "George Harrison", vip: false, birthday: "1943-02-25T00:00:00.000Z" },
            doc! { seq: 3, name: "Ringo Starr", vip: false, birthday: "1940-07-07T00:00:00.000Z" },
            doc! { seq: 4, name: "Pete Best", birthday: "1941-11-24T00:00:00.000Z" },
            doc! { seq: 5, name: "Stuart Sutcliffe", vip: true, birthday: "1940-06-23T00:00:00.000Z" },
        ];
        for row in rows {
            store.create(row).unwrap();
        }
        state
    }

    fn names(documents: &[Document]) -> Vec<String> {
        documents
            .iter()
            .filter_map(|doc| doc.get("name").and_then(|it| it.as_str()).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_default_order_is_by_id() {
        let model = user();
        let state = seeded(&model);
        let config = StoreConfig::new();
        let reads = ReadOperations::new(CollectionView::new(&state, &model), &config);

        let found = reads.find(&FindOptions::new()).unwrap();
        let seqs: Vec<Option<i64>> = found.iter().map(|d| d.get("seq").and_then(Value::as_i64)).collect();
        assert_eq!(seqs, vec![Some(0), Some(1), Some(2), Some(3), Some(4), Some(5)]);
    }

    #[test]
    fn test_multi_key_order_with_missing_values_last() {
        let model = user();
        let state = seeded(&model);
        let config = StoreConfig::new();
        let reads = ReadOperations::new(CollectionView::new(&state, &model), &config);

        let found = reads
            .find(&FindOptions::new().order("vip ASC, seq DESC"))
            .unwrap();
        assert_eq!(
            names(&found),
            vec![
                "Ringo Starr",
                "George Harrison",
                "Stuart Sutcliffe",
                "Paul McCartney",
                "John Lennon",
                "Pete Best"
            ]
        );
    }

    #[test]
    fn test_invalid_order_fails_before_scan() {
        let model = user();
        let state = seeded(&model);
        let config = StoreConfig::new();
        let reads = ReadOperations::new(CollectionView::new(&state, &model), &config);

        let err = reads.find(&FindOptions::new().order("seq UP")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidSortOrder);
    }

    #[test]
    fn test_string_date_bounds_are_coerced() {
        let model = user();
        let state = seeded(&model);
        let config = StoreConfig::new();
        let reads = ReadOperations::new(CollectionView::new(&state, &model), &config);

        let predicate = field("birthday")
            .gte("1940-07-01T00:00:00.000Z")
            .and(field("birthday").lte("1942-12-31T00:00:00.000Z"));
        let found = reads.find(&FindOptions::new().where_clause(predicate)).unwrap();
        assert_eq!(names(&found), vec!["Paul McCartney", "Ringo Starr", "Pete Best"]);
        assert!(found[0].get("birthday").is_some_and(|it| it.is_date()));
    }

    #[test]
    fn test_projection_and_pagination() {
        let model = user();
        let state = seeded(&model);
        let config = StoreConfig::new();
        let reads = ReadOperations::new(CollectionView::new(&state, &model), &config);

        let options = FindOptions::new()
            .fields(FieldSelection::include(&["name"]))
            .skip(1)
            .limit(2);
        let found = reads.find(&options).unwrap();
        assert_eq!(found, vec![
            doc! { name: "Paul McCartney", id: 2 },
            doc! { name: "George Harrison", id: 3 },
        ]);

        let all = reads.find(&FindOptions::new().limit(0)).unwrap();
        assert_eq!(all.len(), 6);
        let past_end = reads.find(&FindOptions::new().skip(10)).unwrap();
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_like_and_or() {
        let model = user();
        let state = seeded(&model);
        let config = StoreConfig::new();
        let reads = ReadOperations::new(CollectionView::new(&state, &model), &config);

        let like = field("name").like("%St%").unwrap();
        let found = reads.find(&FindOptions::new().where_clause(like)).unwrap();
        assert_eq!(names(&found), vec!["Ringo Starr", "Stuart Sutcliffe"]);

        let none = field("name").like("M%XY").unwrap();
        assert!(reads.find(&FindOptions::new().where_clause(none)).unwrap().is_empty());

        let either = or(vec![field("seq").eq(0), field("seq").eq("5")]);
        assert_eq!(reads.count(Some(&either)).unwrap(), 2);
    }

    #[test]
    fn test_two_near_clauses_fail() {
        let model = user();
        let state = seeded(&model);
        let config = StoreConfig::new();
        let reads = ReadOperations::new(CollectionView::new(&state, &model), &config);

        let predicate = or(vec![
            field("home").near(NearClause::new("53.40,-2.99")),
            field("work").near(NearClause::new("51.50,-0.12")),
        ]);
        let err = reads
            .find(&FindOptions::new().where_clause(predicate))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn test_near_orders_nearest_first() {
        let model = ModelDefinition::new("Place");
        let mut state = StoreState::new();
        let mut store = CollectionStore::new(&mut state, &model);
        store.create(doc! { name: "far", location: { lat: 53.48, lng: (-2.24) } }).unwrap();
        store.create(doc! { name: "near", location: { lat: 53.405, lng: (-2.985) } }).unwrap();
        store.create(doc! { name: "nowhere" }).unwrap();
        store.create(doc! { name: "close", location: { lat: 53.41, lng: (-2.98) } }).unwrap();

        let config = StoreConfig::new();
        let reads = ReadOperations::new(CollectionView::new(&state, &model), &config);
        let clause = NearClause::new("53.40, -2.99")
            .max_distance(10000.0)
            .unit(DistanceUnit::Meters);
        let found = reads
            .find(&FindOptions::new().where_clause(field("location").near(clause)))
            .unwrap();
        assert_eq!(names(&found), vec!["near", "close"]);
    }

    struct TaggingResolver;

    impl IncludeResolver for TaggingResolver {
        fn resolve(
            &self,
            model: &str,
            documents: Vec<Document>,
            include: &serde_json::Value,
        ) -> StoreResult<Vec<Document>> {
            documents
                .into_iter()
                .map(|mut doc| {
                    doc.put("included", format!("{}:{}", model, include))?;
                    Ok(doc)
                })
                .collect()
        }
    }

    #[test]
    fn test_include_goes_to_resolver() {
        let model = user();
        let state = seeded(&model);
        let config = StoreConfig::new();
        config.set_include_resolver(Arc::new(TaggingResolver)).unwrap();
        let reads = ReadOperations::new(CollectionView::new(&state, &model), &config);

        let options = FindOptions::new()
            .limit(1)
            .include(serde_json::json!("posts"));
        let found = reads.find(&options).unwrap();
        assert_eq!(found[0].get("included"), Some(&Value::from("User:\"posts\"")));
        assert!(reads.find_skipping_includes(&options).unwrap()[0]
            .get("included")
            .is_none());
    }

    #[test]
    fn test_include_without_resolver_passes_through() {
        let model = user();
        let state = seeded(&model);
        let config = StoreConfig::new();
        let reads = ReadOperations::new(CollectionView::new(&state, &model), &config);
        let options = FindOptions::new().include(serde_json::json!("posts"));
        assert_eq!(reads.find(&options).unwrap().len(), 6);
    }

    #[test]
    fn test_first_match_and_by_id() {
        let model = user();
        let state = seeded(&model);
        let config = StoreConfig::new();
        let reads = ReadOperations::new(CollectionView::new(&state, &model), &config);

        let found = reads
            .find(&FindOptions::new().where_clause(field("vip").eq(false)).limit(1))
            .unwrap();
        assert_eq!(found[0].get("name"), Some(&Value::from("George Harrison")));
        assert!(reads
            .find(&FindOptions::new().where_clause(field("seq").gt(99)))
            .unwrap()
            .is_empty());
        assert!(reads.exists(&DocumentId::Number(6)));
        assert_eq!(
            reads.find_by_id(&DocumentId::Number(1)).unwrap().and_then(|d| d.get("birthday").cloned()),
            Some(date_value(345081600000))
        );
    }
}
