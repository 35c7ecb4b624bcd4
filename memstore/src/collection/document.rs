use crate::collection::FieldSelection;
use crate::common::{Value, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use indexmap::IndexMap;
use smallvec::SmallVec;
use std::fmt::{Debug, Display};

type PathSegments<'a> = SmallVec<[&'a str; 4]>;

/// Represents one stored record.
///
/// A document is an insertion-ordered mapping from field name to [Value].
/// Nested documents are addressed with dotted paths, so `get_path("a.b")`
/// reads field `b` of the nested document under `a`. A numeric path segment
/// indexes into an array (`"tags.0"`).
///
/// Documents are stored serialized and handed out as independent copies, so
/// mutating a document returned by a query never touches the store.
#[derive(Clone, PartialEq, Default)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Checks if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of top level entries.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`.
    ///
    /// A dotted key writes into nested documents, creating them on the way
    /// when they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the key, or any segment of a dotted key, is empty.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("user.name", "Alice")?;
    /// assert_eq!(doc.get_path("user.name"), Some(&Value::from("Alice")));
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> StoreResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(StoreError::new(
                "Document does not support empty key",
                ErrorKind::ValidationError,
            ));
        }

        let value = value.into();
        if key.contains(FIELD_SEPARATOR) {
            let splits: PathSegments = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.data.insert(key.to_string(), value);
            Ok(())
        }
    }

    /// Returns the top level value stored under `key`.
    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Returns the value at a dotted path, or `None` when any segment is
    /// missing. A top level key that itself contains the separator wins
    /// over the nested interpretation.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(path) {
            return Some(value);
        }
        if !path.contains(FIELD_SEPARATOR) {
            return None;
        }

        let mut segments = path.split(FIELD_SEPARATOR);
        let first = segments.next()?;
        let mut current = self.data.get(first)?;
        for segment in segments {
            current = match current {
                Value::Document(doc) => doc.get(segment)?,
                Value::Array(items) => {
                    let index = segment.parse::<usize>().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Checks if a top level key exists in the document.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Removes a top level key, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    /// Top level field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Shallow merge: every field of `update` overwrites the field of the
    /// same name in this document; fields absent from `update` are kept.
    pub fn merge(&mut self, update: &Document) {
        for (key, value) in update.data.iter() {
            self.data.insert(key.clone(), value.clone());
        }
    }

    /// A copy holding only the selected fields. The `id_names` fields are
    /// always kept.
    pub fn project(&self, selection: &FieldSelection, id_names: &[String]) -> Document {
        crate::common::stream::project(self.clone(), selection, id_names)
    }

    /// Converts the document to a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<String, serde_json::Value>>();
        serde_json::Value::Object(map)
    }

    /// Builds a document from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns an error when `json` is not an object.
    pub fn from_json(json: &serde_json::Value) -> StoreResult<Document> {
        match json {
            serde_json::Value::Object(map) => Ok(Document::from(map.clone())),
            other => {
                log::error!("Expected a JSON object for a document, found {}", other);
                Err(StoreError::new(
                    "A document must be a JSON object",
                    ErrorKind::EncodingError,
                ))
            }
        }
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> StoreResult<()> {
        let key = splits[0];
        if key.is_empty() {
            log::error!("Document does not support empty key segment");
            return Err(StoreError::new(
                "Document does not support empty key segment",
                ErrorKind::ValidationError,
            ));
        }

        if splits.len() == 1 {
            self.data.insert(key.to_string(), value);
            return Ok(());
        }

        let mut nested = match self.data.get(key) {
            Some(Value::Document(doc)) => doc.clone(),
            _ => Document::new(),
        };
        nested.deep_put(&splits[1..], value)?;
        self.data.insert(key.to_string(), Value::Document(nested));
        Ok(())
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Document {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        Document {
            data: map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
        }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

/// Strips the quotes `stringify!` leaves around string literal keys.
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] from literal key/value pairs.
///
/// ```ignore
/// let doc = doc! {
///     name: "John",
///     address: { city: "Liverpool" },
///     tags: ["a", "b"],
///     born: (date_value(0)),
/// };
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
