use crate::collection::{Document, FieldSelection};
use crate::common::FIELD_SEPARATOR;

/// Projects every document of a page onto the selected fields.
///
/// Id fields always survive the projection so results can still be
/// addressed by id.
pub(crate) fn project_documents(
    documents: Vec<Document>,
    selection: &FieldSelection,
    id_names: &[String],
) -> Vec<Document> {
    documents
        .into_iter()
        .map(|doc| project(doc, selection, id_names))
        .collect()
}

pub(crate) fn project(doc: Document, selection: &FieldSelection, id_names: &[String]) -> Document {
    let is_id = |key: &str| id_names.iter().any(|id| id == key);
    match selection {
        FieldSelection::Include(fields) => {
            let mut projected: Document = doc
                .iter()
                .filter(|(key, _)| is_id(key) || fields.iter().any(|f| f == *key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();

            // nested selections such as "address.city"
            for field in fields.iter().filter(|f| f.contains(FIELD_SEPARATOR)) {
                if doc.contains_key(field) {
                    continue;
                }
                if let Some(value) = doc.get_path(field) {
                    if let Err(err) = projected.put(field, value.clone()) {
                        log::warn!("Skipping projected field {}: {}", field, err);
                    }
                }
            }
            projected
        }
        FieldSelection::Exclude(fields) => doc
            .iter()
            .filter(|(key, _)| is_id(key) || !fields.iter().any(|f| f == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}
