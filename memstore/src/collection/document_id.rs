use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use std::fmt::Display;

/// The identifier of a stored document.
///
/// Ids are either numeric (generated from the collection's sequence counter
/// or supplied by the caller) or free-form strings. Both render to the same
/// string key space, so `Number(5)` and `String("5")` address the same record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentId {
    Number(i64),
    String(String),
}

impl DocumentId {
    /// Reads an id from a document value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidId` for nulls, composite values and numbers that are
    /// fractional or outside the `i64` range.
    pub fn from_value(value: &Value) -> StoreResult<DocumentId> {
        match value {
            Value::I64(n) => Ok(DocumentId::Number(*n)),
            Value::F64(_) => match value.as_i64() {
                Some(n) => Ok(DocumentId::Number(n)),
                None => {
                    log::error!("Id {} is not a 64-bit integer", value);
                    Err(StoreError::new(
                        &format!("Invalid id {}", value),
                        ErrorKind::InvalidId,
                    ))
                }
            },
            Value::String(s) if !s.is_empty() => Ok(DocumentId::String(s.clone())),
            other => {
                log::error!("Value {} of type {} cannot be an id", other, other.type_name());
                Err(StoreError::new(
                    &format!("Invalid id {}", other),
                    ErrorKind::InvalidId,
                ))
            }
        }
    }

    /// The key the document is stored under.
    pub fn key(&self) -> String {
        match self {
            DocumentId::Number(n) => n.to_string(),
            DocumentId::String(s) => s.clone(),
        }
    }

    /// Numeric reading of the id, used for sequence bookkeeping. String ids
    /// holding an integer count as numeric.
    pub fn numeric_value(&self) -> Option<i64> {
        match self {
            DocumentId::Number(n) => Some(*n),
            DocumentId::String(s) => s.trim().parse::<i64>().ok(),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            DocumentId::Number(n) => Value::I64(*n),
            DocumentId::String(s) => Value::String(s.clone()),
        }
    }
}

impl Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl From<i64> for DocumentId {
    fn from(value: i64) -> Self {
        DocumentId::Number(value)
    }
}

impl From<i32> for DocumentId {
    fn from(value: i32) -> Self {
        DocumentId::Number(value as i64)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        DocumentId::String(value.to_string())
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        DocumentId::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_value() {
        assert_eq!(DocumentId::from_value(&Value::I64(3)).unwrap(), DocumentId::Number(3));
        assert_eq!(DocumentId::from_value(&Value::F64(3.0)).unwrap(), DocumentId::Number(3));
        assert_eq!(
            DocumentId::from_value(&Value::from("abc")).unwrap(),
            DocumentId::from("abc")
        );
    }

    #[test]
    fn test_from_value_rejects_bad_ids() {
        for value in [
            Value::Null,
            Value::F64(1.5),
            Value::F64(1e20),
            Value::F64(f64::INFINITY),
            Value::from(""),
            Value::Bool(true),
        ] {
            let err = DocumentId::from_value(&value).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidId);
        }
    }

    #[test]
    fn test_key_space_is_shared() {
        assert_eq!(DocumentId::Number(5).key(), DocumentId::from("5").key());
        assert_eq!(DocumentId::from("5").numeric_value(), Some(5));
        assert_eq!(DocumentId::from("x5").numeric_value(), None);
    }
}
