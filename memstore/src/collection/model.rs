use crate::collection::{Document, DocumentId};
use crate::common::{date_from_millis, parse_date, Value, DEFAULT_ID_NAME};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use indexmap::IndexMap;

/// Declared type of a model property.
///
/// Documents are stored as JSON text, which loses dates and lets numbers
/// and booleans arrive as strings. The declared type restores them on read
/// and normalizes where-clause literals before they are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    Object,
    Array,
    Any,
}

impl FieldType {
    /// Applies the read-side coercion for this type.
    ///
    /// `null` is never coerced and values that cannot be converted are
    /// returned unchanged.
    pub fn coerce(&self, value: Value) -> Value {
        if value.is_null() {
            return value;
        }

        match self {
            FieldType::Date => match &value {
                Value::String(s) => parse_date(s).map(Value::Date).unwrap_or(value),
                Value::I64(_) | Value::F64(_) => value
                    .as_f64()
                    .and_then(|ms| date_from_millis(ms as i64))
                    .map(Value::Date)
                    .unwrap_or(value),
                _ => value,
            },
            FieldType::Number => match &value {
                Value::String(_) | Value::Bool(_) | Value::Date(_) => {
                    match value.to_number() {
                        Some(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                            Value::I64(n as i64)
                        }
                        Some(n) => Value::F64(n),
                        None => value,
                    }
                }
                _ => value,
            },
            FieldType::Boolean => match &value {
                Value::Bool(_) => value,
                Value::String(s) if s.eq_ignore_ascii_case("true") => Value::Bool(true),
                Value::String(s) if s.eq_ignore_ascii_case("false") => Value::Bool(false),
                other => Value::Bool(other.is_truthy()),
            },
            FieldType::String => match &value {
                Value::I64(_) | Value::F64(_) | Value::Bool(_) | Value::Date(_) => {
                    Value::String(value.to_text())
                }
                _ => value,
            },
            FieldType::Object | FieldType::Array | FieldType::Any => value,
        }
    }
}

/// Per-model settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelSettings {
    /// Alternate collection name. Models sharing an alias share a collection.
    pub collection: Option<String>,
}

/// Metadata the store needs about one model: its id properties, the
/// declared property types and the collection it lives in.
///
/// # Examples
///
/// ```rust,ignore
/// let user = ModelDefinition::new("User")
///     .property("name", FieldType::String)
///     .property("birthday", FieldType::Date)
///     .collection("people");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    name: String,
    id_properties: Vec<(String, FieldType)>,
    properties: IndexMap<String, FieldType>,
    settings: ModelSettings,
}

impl ModelDefinition {
    /// Creates a model with a numeric `id` property.
    pub fn new(name: &str) -> Self {
        ModelDefinition {
            name: name.to_string(),
            id_properties: Vec::new(),
            properties: IndexMap::new(),
            settings: ModelSettings::default(),
        }
    }

    /// Declares an id property. The first declared id is the one records
    /// are keyed by; all of them take part in the default order.
    pub fn id(mut self, name: &str, field_type: FieldType) -> Self {
        self.id_properties.push((name.to_string(), field_type));
        self.properties.insert(name.to_string(), field_type);
        self
    }

    pub fn property(mut self, name: &str, field_type: FieldType) -> Self {
        self.properties.insert(name.to_string(), field_type);
        self
    }

    pub fn collection(mut self, alias: &str) -> Self {
        self.settings.collection = Some(alias.to_string());
        self
    }

    pub fn settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The collection backing this model.
    pub fn collection_name(&self) -> &str {
        self.settings.collection.as_deref().unwrap_or(&self.name)
    }

    pub fn id_names(&self) -> Vec<String> {
        if self.id_properties.is_empty() {
            vec![DEFAULT_ID_NAME.to_string()]
        } else {
            self.id_properties.iter().map(|(name, _)| name.clone()).collect()
        }
    }

    pub fn id_name(&self) -> String {
        self.id_properties
            .first()
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| DEFAULT_ID_NAME.to_string())
    }

    fn id_type(&self) -> FieldType {
        self.id_properties
            .first()
            .map(|(_, field_type)| *field_type)
            .unwrap_or(FieldType::Number)
    }

    pub fn property_type(&self, path: &str) -> Option<FieldType> {
        self.properties.get(path).copied()
    }

    /// Reads the id from a document. An absent or null id yields `None`.
    pub fn get_id_value(&self, document: &Document) -> StoreResult<Option<DocumentId>> {
        match document.get(&self.id_name()) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => DocumentId::from_value(value).map(|id| Some(self.coerce_id(id))),
        }
    }

    /// Writes the id into a document, coerced to the declared id type.
    pub fn set_id_value(&self, document: &mut Document, id: &DocumentId) -> StoreResult<()> {
        let id = self.coerce_id(id.clone());
        document.put(&self.id_name(), id.to_value())
    }

    /// Converts an id to the declared id type where that is lossless.
    pub fn coerce_id(&self, id: DocumentId) -> DocumentId {
        match (self.id_type(), id) {
            (FieldType::Number, DocumentId::String(s)) => match s.trim().parse::<i64>() {
                Ok(n) => DocumentId::Number(n),
                Err(_) => DocumentId::String(s),
            },
            (FieldType::String, DocumentId::Number(n)) => DocumentId::String(n.to_string()),
            (_, id) => id,
        }
    }

    /// Applies the declared property types to a freshly read document.
    pub fn coerce_document(&self, mut document: Document) -> Document {
        for (path, field_type) in self.properties.iter() {
            if *field_type == FieldType::Any {
                continue;
            }
            if let Some(value) = document.get_mut(path) {
                *value = field_type.coerce(value.take());
            }
        }
        document
    }

    /// Coerces a where-clause literal compared against `path`.
    pub fn coerce_field(&self, path: &str, value: Value) -> Value {
        match self.property_type(path) {
            Some(field_type) => match value {
                Value::Array(items) if field_type != FieldType::Array => Value::Array(
                    items.into_iter().map(|it| field_type.coerce(it)).collect(),
                ),
                other => field_type.coerce(other),
            },
            None => value,
        }
    }
}

/// Resolves relation includes for a page of query results.
///
/// The store does not know about relations; when a query carries an
/// `include` clause the page is handed to this collaborator as is.
pub trait IncludeResolver: Send + Sync {
    fn resolve(
        &self,
        model: &str,
        documents: Vec<Document>,
        include: &serde_json::Value,
    ) -> StoreResult<Vec<Document>>;
}

/// Error raised when an operation names a model that was never defined.
pub(crate) fn model_not_found(name: &str) -> StoreError {
    log::error!("Model {} is not attached to this store", name);
    StoreError::new(
        &format!("Model {} is not attached to this store", name),
        ErrorKind::ModelNotFound,
    )
}
